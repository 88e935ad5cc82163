//! Typed failures for the resolve/download pipeline.

use std::path::PathBuf;

/// Errors produced by the core. Secondary page fields (author, dates) degrade
/// with documented fallbacks instead of surfacing here; identity fields and
/// transfer failures always do.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered handler matches the URL.
    #[error("no handler matches URL: {0}")]
    NoHandler(String),

    /// A handler with the same name is already registered.
    #[error("handler '{0}' is already registered")]
    DuplicateHandler(String),

    /// Network/transport failure while fetching a page or API resource.
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A required structural element is absent from a fetched page.
    #[error("failed to parse page {url}: {what}")]
    Parse { url: String, what: String },

    /// The source page exposed no usable download links.
    #[error("no download candidates found on {0}")]
    NoCandidates(String),

    /// The chosen candidate points at a host nothing in the core can handle.
    #[error("unsupported download host: {0}")]
    UnsupportedHost(String),

    /// A host resolver's expected markup element is missing (site layout
    /// changed). Never silently replaced with a guessed URL.
    #[error("download anchor '{selector}' not found on {url}")]
    SelectorNotFound { url: String, selector: String },

    /// Candidate delegation exceeded the recursion bound.
    #[error("too many redirections while resolving {0}")]
    TooManyRedirections(String),

    /// Streaming transfer failed mid-download.
    #[error("transfer from {url} failed")]
    Transfer {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Local filesystem failure while writing the downloaded file.
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
