//! Application state shared across all request handlers
//!
//! Built once at startup and cloned into every handler. Everything inside is
//! either immutable or safe for concurrent use.

use crate::service::Resolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
}

impl AppState {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }
}
