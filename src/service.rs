//! Resolution service
//!
//! Bridges the two access channels to the record store and the view renderer:
//!
//! - song page: validate id, look the record up, render `song`, count
//! - redirect: build the target from the raw id, count
//!
//! Counting is fire-and-forget. It is spawned only after the render or redirect
//! has been produced, is bounded by a timeout, and reports failures to the log.
//! It never changes the response.

use axum::http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::model::{Channel, ViewPayload};
use crate::renderer::{ViewRenderer, INDEX_VIEW, SONG_VIEW};
use crate::store::RecordStore;

/// A rendered page plus the detached click increment it triggered
#[derive(Debug)]
pub struct Rendered {
    pub body: Vec<u8>,
    /// `None` when nothing is counted for this request
    pub counter: Option<JoinHandle<()>>,
}

/// A redirect target plus the detached click increment it triggered
#[derive(Debug)]
pub struct Redirected {
    pub target: String,
    /// `target` already validated as a `Location` header value
    pub location: HeaderValue,
    pub counter: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn RecordStore>,
    renderer: Arc<dyn ViewRenderer>,
    redirect_base: Arc<str>,
    counter_timeout: Duration,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn RecordStore>,
        renderer: Arc<dyn ViewRenderer>,
        redirect_base: &str,
        counter_timeout: Duration,
    ) -> Self {
        Self {
            store,
            renderer,
            redirect_base: Arc::from(redirect_base),
            counter_timeout,
        }
    }

    /// Landing page. With an id, the record's external reference is rendered
    /// into the `index` view; without one the view gets an empty payload.
    pub async fn index(&self, id: Option<&str>) -> Result<Rendered, ResolveError> {
        let payload = match id.filter(|id| !id.is_empty()) {
            Some(id) => {
                debug!(song_id = %id, "Resolving index link");
                let record = self.store.lookup(id).await?;
                ViewPayload::from(&record)
            }
            None => ViewPayload::default(),
        };

        let body = self.render(INDEX_VIEW, &payload)?;
        Ok(Rendered { body, counter: None })
    }

    /// Song-page channel
    ///
    /// An empty id is rejected before the store is touched. A hit renders the
    /// `song` view, then counts one `songId` click in the background.
    pub async fn song_page(&self, id: &str) -> Result<Rendered, ResolveError> {
        if id.is_empty() {
            return Err(ResolveError::InvalidInput);
        }
        debug!(song_id = %id, "Resolving song page");

        let record = self.store.lookup(id).await?;
        let body = self.render(SONG_VIEW, &ViewPayload::from(&record))?;
        let counter = self.count_in_background(id, Channel::SongId);

        Ok(Rendered { body, counter })
    }

    /// Redirect channel
    ///
    /// The target is built straight from the client-supplied id without a
    /// store lookup, so raw track ids work whether or not a record exists.
    /// The `spotifyId` counter is then bumped for whichever record carries
    /// that external reference.
    ///
    /// # Arguments
    ///
    /// * `id` - external reference as sent by the client, appended verbatim
    ///
    /// # Returns
    ///
    /// * `Ok(Redirected)` - target and `Location` value; counting has started
    /// * `Err(InvalidTarget)` - the target is not a valid header value (e.g. the
    ///   id decodes to a control character); nothing is counted
    pub fn redirect(&self, id: &str) -> Result<Redirected, ResolveError> {
        let target = format!("{}{}", self.redirect_base, id);

        // Location must be valid before anything is counted
        let location = HeaderValue::try_from(target.as_str())
            .map_err(|_| ResolveError::InvalidTarget(target.escape_debug().to_string()))?;
        debug!(spotify_id = %id, %target, "Issuing redirect");

        let counter = if id.is_empty() {
            None
        } else {
            self.count_in_background(id, Channel::SpotifyId)
        };

        Ok(Redirected {
            target,
            location,
            counter,
        })
    }

    fn render(&self, view: &str, payload: &ViewPayload) -> Result<Vec<u8>, ResolveError> {
        let mut body = Vec::new();
        self.renderer.render(view, &mut body, payload)?;
        Ok(body)
    }

    /// Spawns a detached, time-bounded counter increment
    ///
    /// Dropping the returned handle does not cancel the task. The timeout only
    /// stops waiting: a redb write already handed to the blocking pool keeps
    /// running and may still commit after the task has given up.
    fn count_in_background(&self, id: &str, channel: Channel) -> Option<JoinHandle<()>> {
        if !self.store.tracks_clicks() {
            return None;
        }

        let store = Arc::clone(&self.store);
        let id = id.to_owned();
        let limit = self.counter_timeout;

        Some(tokio::spawn(async move {
            match tokio::time::timeout(limit, store.increment_counter(&id, channel)).await {
                Ok(Ok(())) => debug!(%id, counter = channel.counter_field(), "Registered click"),
                Ok(Err(err)) => warn!(%id, %channel, error = %err, "Register click failed"),
                Err(_) => warn!(
                    %id,
                    %channel,
                    timeout_ms = limit.as_millis() as u64,
                    "Stopped waiting for click increment, it may still be applied"
                ),
            }
        }))
    }
}
