//! Single-slot presentation sink for search results.
//!
//! Searches may overlap. Each one takes a [`Ticket`] when it starts and the
//! slot only accepts a result if no later-started search has already
//! published, so the most recent request wins regardless of completion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::SearchError;
use crate::spotify::Album;

/// Sequence number handed out when a search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// What is currently on display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub seq: u64,
    pub query: String,
    pub albums: Vec<Album>,
    /// Failure of the search that produced this presentation, if any.
    pub error: Option<String>,
}

#[derive(Default)]
pub struct PresentationSlot {
    issued: AtomicU64,
    current: Mutex<Option<Presentation>>,
}

impl PresentationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publish a finished search. Returns false if a newer search already
    /// published. A failed search keeps the previously displayed albums and
    /// records the error.
    pub fn publish(
        &self,
        ticket: Ticket,
        query: &str,
        outcome: &Result<Vec<Album>, SearchError>,
    ) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(shown) = current.as_ref() {
            if shown.seq > ticket.0 {
                tracing::debug!(query, stale = ticket.0, shown = shown.seq, "dropping stale search result");
                return false;
            }
        }

        let (albums, error) = match outcome {
            Ok(albums) => (albums.clone(), None),
            Err(e) => (
                current.as_ref().map(|p| p.albums.clone()).unwrap_or_default(),
                Some(e.to_string()),
            ),
        };
        *current = Some(Presentation {
            seq: ticket.0,
            query: query.to_string(),
            albums,
            error,
        });
        true
    }

    pub fn current(&self) -> Option<Presentation> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
