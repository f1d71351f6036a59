//! Error types for every layer of the resolver
//!
//! Store and renderer errors stay independent of HTTP. Only [`ResolveError`],
//! the service boundary error, knows how to turn itself into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors reported by a [`RecordStore`](crate::store::RecordStore) backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matches the identifier
    #[error("no record for id `{0}`")]
    NotFound(String),

    /// Out-of-band insert of an identifier that is already present
    #[error("record `{0}` already exists")]
    AlreadyExists(String),

    /// The backend keeps no access counters
    #[error("backend does not track clicks")]
    Unsupported,

    /// Connection, transaction or storage failure inside the backend
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored document could not be decoded
    #[error("corrupt record `{id}`: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The blocking worker running the operation panicked or was cancelled
    #[error("store task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

macro_rules! backend_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Backend(err.to_string())
                }
            }
        )*
    };
}

backend_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Errors reported by a [`ViewRenderer`](crate::renderer::ViewRenderer)
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown view `{0}`")]
    UnknownView(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write view: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-request failure at the resolution service boundary
///
/// The client only ever sees a status code with an empty body; the detail
/// goes to the log.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("missing identifier")]
    InvalidInput,

    #[error("redirect target `{0}` is not a valid Location header")]
    InvalidTarget(String),

    #[error("unknown identifier `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ResolveError::NotFound(id),
            other => ResolveError::Store(other),
        }
    }
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::InvalidInput | ResolveError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
            ResolveError::Store(_) | ResolveError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Fatal errors raised while the process is starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("record store unavailable: {0}")]
    BackendUnavailable(#[source] StoreError),

    #[error("failed to compile view `{view}`: {source}")]
    TemplateCompileFailed {
        view: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to seed records: {0}")]
    Seed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
