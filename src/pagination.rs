//! Cursor tracking for paginated provider listings.

use crate::error::{IntegrationError, Result};
use std::collections::HashSet;

/// Follows a provider's pagination cursor and fails when it stops advancing.
///
/// A listing ends when the provider omits the cursor. A cursor that was
/// already followed means the listing would never terminate.
#[derive(Debug)]
pub struct CursorGuard {
    listing: String,
    seen: HashSet<String>,
    pages: usize,
}

impl CursorGuard {
    pub fn new(listing: impl Into<String>) -> Self {
        Self {
            listing: listing.into(),
            seen: HashSet::new(),
            pages: 0,
        }
    }

    /// Records a fetched page and returns the cursor of the next one, if any.
    pub fn advance(&mut self, next: Option<String>) -> Result<Option<String>> {
        self.pages += 1;
        let Some(cursor) = next.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        if !self.seen.insert(cursor.clone()) {
            return Err(IntegrationError::PaginationError(format!(
                "{} repeated cursor '{}' after {} pages",
                self.listing, cursor, self.pages
            )));
        }
        Ok(Some(cursor))
    }

    /// Pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }
}
