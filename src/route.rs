//! Route definitions
//!
//! Maps HTTP paths onto the resolution service entry points.

use axum::routing::get;
use axum::Router;

use crate::handler::{index, song_page, song_page_without_id, spotify_redirect};
use crate::state::AppState;

/// Creates the application router
///
/// # Route Definitions
///
/// - `GET /` - Landing page, optionally resolving `?id=`
/// - `GET /s/{song_id}` - Song page, counts a `songId` click
/// - `GET /spotify?id=` - 302 to the streaming provider, counts a `spotifyId` click
///
/// # Example Usage
///
/// ```no_run
/// # use std::{sync::Arc, time::Duration};
/// # use songlink::{config::BackendKind, database::init_db, renderer::TemplateRenderer};
/// # use songlink::{route::create_app, service::Resolver, state::AppState, store};
/// # let db = Arc::new(init_db("data.db").unwrap());
/// # let renderer = TemplateRenderer::from_dir(std::path::Path::new("static")).unwrap();
/// let resolver = Resolver::new(
///     store::open(BackendKind::Document, db),
///     Arc::new(renderer),
///     "https://open.spotify.com/intl-de/track/",
///     Duration::from_secs(5),
/// );
/// let app = create_app(AppState::new(resolver));
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/s/", get(song_page_without_id))
        .route("/s/{song_id}", get(song_page))
        .route("/spotify", get(spotify_redirect))
        .with_state(state)
}
