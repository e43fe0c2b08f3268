//! Lazy walk over the provider's cursor-paginated events feed.
//!
//! [`EventsPaginator`] holds at most one page of records. A page is only
//! requested once every record of the previous page has been handed out,
//! so each record reaches the caller before the next network call.

use std::collections::VecDeque;

use super::{EventsPage, EventsProvider};
use crate::error::GatewayError;

#[derive(Debug)]
enum Position {
    NotStarted,
    Cursor(String),
    Exhausted,
}

/// Finite, non-restartable sequence of raw feed records starting at a
/// watermark.
///
/// Termination rule: a page without a `next` cursor ends the sequence
/// once its records are drained. A page with zero records but a `next`
/// cursor is followed, not treated as the end.
#[derive(Debug)]
pub struct EventsPaginator<'a> {
    provider: &'a dyn EventsProvider,
    watermark: String,
    position: Position,
    buffer: VecDeque<serde_json::Value>,
    pages_fetched: usize,
}

impl<'a> EventsPaginator<'a> {
    /// Creates a paginator that starts at `watermark` on first advance.
    #[must_use]
    pub fn new(provider: &'a dyn EventsProvider, watermark: impl Into<String>) -> Self {
        Self {
            provider,
            watermark: watermark.into(),
            position: Position::NotStarted,
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    /// Number of pages requested so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Advances to the next record, fetching a page only when the buffer
    /// is empty.
    ///
    /// Returns `Ok(None)` once the feed is exhausted. After an error the
    /// sequence is exhausted as well.
    ///
    /// # Errors
    ///
    /// Propagates provider errors from the page fetch.
    pub async fn next(&mut self) -> Result<Option<serde_json::Value>, GatewayError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            let page = match std::mem::replace(&mut self.position, Position::Exhausted) {
                Position::NotStarted => self.provider.fetch_changed_since(&self.watermark).await?,
                Position::Cursor(cursor) => self.provider.fetch_page(&cursor).await?,
                Position::Exhausted => return Ok(None),
            };
            self.pages_fetched = self.pages_fetched.saturating_add(1);
            self.accept(page);
        }
    }

    fn accept(&mut self, page: EventsPage) {
        tracing::debug!(
            records = page.results.len(),
            has_next = page.next.is_some(),
            "feed page received"
        );
        if let Some(next) = page.next {
            self.position = Position::Cursor(next);
        }
        self.buffer.extend(page.results);
    }
}
