//! Dispatch table from URL to the matching site handler.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::SiteHandler;

/// Ordered set of registered handlers.
///
/// Registration rejects duplicates by name; overlapping URL matches are
/// permitted and resolved by first-match order. Lookup is a linear scan over
/// the in-memory list, with no caching.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn SiteHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler, failing with [`Error::DuplicateHandler`] when one
    /// of the same name is already present.
    pub fn register(&mut self, handler: Arc<dyn SiteHandler>) -> Result<()> {
        if self.handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(Error::DuplicateHandler(handler.name().to_string()));
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// First registered handler matching the URL, or
    /// [`Error::NoHandler`].
    pub fn resolve(&self, url: &str) -> Result<Arc<dyn SiteHandler>> {
        self.find(url)
            .ok_or_else(|| Error::NoHandler(url.to_string()))
    }

    /// Like [`resolve`](Self::resolve) but without the error, for
    /// known-host probes.
    pub fn find(&self, url: &str) -> Option<Arc<dyn SiteHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.matches_url(url))
            .cloned()
    }

    /// Like [`find`](Self::find) but restricted to handlers that own their
    /// domain. Candidate delegation goes through this, so shape-matching
    /// fallback handlers never swallow another handler's candidates.
    pub fn find_delegate(&self, url: &str) -> Option<Arc<dyn SiteHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.owns_domain() && handler.matches_url(url))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Display names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }
}
