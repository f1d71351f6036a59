//! HTTP request handlers
//!
//! Handlers only extract the identifier and hand it to the
//! [`Resolver`](crate::service::Resolver). Per-request failures are logged
//! here and answered with a bare status code, never an error page.
//!
//! Query strings are read as raw pairs rather than a typed struct so that a
//! repeated `id` does not reject the request; the first value is used.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, warn};

use crate::error::ResolveError;
use crate::model::IdParams;
use crate::state::AppState;

/// Renders the landing page
///
/// # Query Parameters
///
/// - `id` (optional) - song identifier whose external reference is rendered
///   into the page
///
/// # Example Request
///
/// `GET /?id=hometown`
///
/// # Response
///
/// - **200 OK** - rendered `index` view
/// - **404 Not Found** - `id` given but unknown, empty body
pub async fn index(State(state): State<AppState>, Query(pairs): Query<Vec<(String, String)>>) -> Response {
    let params = IdParams::from_pairs(pairs);

    match state.resolver.index(params.id.as_deref()).await {
        Ok(rendered) => Html(rendered.body).into_response(),
        Err(err) => failure(err),
    }
}

/// Renders the song page
///
/// This handler:
/// 1. Takes `song_id` from the path
/// 2. Looks the record up and renders the `song` view
/// 3. Leaves one `songId` click increment running in the background
///
/// # Path Parameters
///
/// - `song_id` - public song identifier
///
/// # Response
///
/// - **200 OK** - rendered `song` view
/// - **404 Not Found** - unknown song, empty body
/// - **500 Internal Server Error** - store or template failure, empty body
pub async fn song_page(State(state): State<AppState>, Path(song_id): Path<String>) -> Response {
    match state.resolver.song_page(&song_id).await {
        // Dropping the handle leaves the increment running detached
        Ok(rendered) => Html(rendered.body).into_response(),
        Err(err) => failure(err),
    }
}

/// `/s/` with no identifier
///
/// # Response
///
/// - **400 Bad Request** - always, empty body; the store is not touched
pub async fn song_page_without_id(State(state): State<AppState>) -> Response {
    match state.resolver.song_page("").await {
        Ok(rendered) => Html(rendered.body).into_response(),
        Err(err) => failure(err),
    }
}

/// Redirects to the streaming provider
///
/// # Query Parameters
///
/// - `id` - external reference appended verbatim to the redirect base
///
/// # Example Request
///
/// `GET /spotify?id=4PkWff16v14sACvFBrKtI0`
///
/// # Response
///
/// - **302 Found** - `Location` is the redirect base followed by `id`
/// - **400 Bad Request** - `id` cannot be carried in a `Location` header
///   (control characters); nothing is counted
pub async fn spotify_redirect(State(state): State<AppState>, Query(pairs): Query<Vec<(String, String)>>) -> Response {
    let params = IdParams::from_pairs(pairs);

    match state.resolver.redirect(params.id.as_deref().unwrap_or_default()) {
        Ok(redirected) => (StatusCode::FOUND, [(header::LOCATION, redirected.location)]).into_response(),
        Err(err) => failure(err),
    }
}

/// Logs a per-request failure and turns it into its bare status response
fn failure(err: ResolveError) -> Response {
    match &err {
        ResolveError::InvalidInput => warn!("No id given"),
        ResolveError::InvalidTarget(target) => warn!(%target, "Refusing redirect to an invalid Location"),
        ResolveError::NotFound(id) => warn!(song_id = %id, "No song found"),
        ResolveError::Store(source) => error!(error = %source, "Record store failure"),
        ResolveError::Render(source) => error!(error = %source, "Rendering failed"),
    }
    err.into_response()
}
