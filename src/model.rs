//! Value objects shared across handlers, resolvers and the acquire flow.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Identity of a discoverable mod package.
///
/// Produced by the [`SiteHandler`](crate::handler::SiteHandler) that matched
/// the origin URL and treated as immutable afterwards: update checks build a
/// second instance and compare by value, they never mutate the original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModMetadata {
    /// Display name of the handler that produced this record.
    pub handler_name: String,
    /// Canonical item URL, reduced of any trailing disambiguation suffix.
    pub origin_url: String,
    /// Mod name as published on the origin page.
    pub name: String,
    /// Host-specific stable identifier extracted from the origin URL.
    pub product_id: String,
    /// Free-form version string in whatever format the host uses.
    /// Update detection compares this with exact string equality.
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    /// Filesystem destination; `None` until the mod has been downloaded.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

impl ModMetadata {
    /// Returns a copy with `local_path` set.
    pub fn with_local_path(mut self, path: PathBuf) -> Self {
        self.local_path = Some(path);
        self
    }
}

/// One discovered download link on a source page.
///
/// Transient per resolve call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadCandidate {
    /// Anchor text, or the owning handler's name when the text is missing
    /// or is itself a URL.
    pub display_name: String,
    /// Always a well-formed absolute URL; malformed anchors are dropped
    /// during parsing and never become candidates.
    pub url: String,
    /// True when some registered handler matches `url`.
    pub known_host: bool,
}

/// Result of fetching one page, passed explicitly through the parsing
/// pipeline and owned solely by the call that fetched it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
}

impl FetchedPage {
    pub fn new(url: Url, html: String) -> Self {
        Self { url, html }
    }
}
