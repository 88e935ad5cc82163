//! Site handlers: one strategy object per supported origin family.
//!
//! A handler owns URL matching, metadata retrieval, candidate discovery and
//! update comparison for its family. Handlers are stateless; every page
//! fetch produces an explicit [`FetchedPage`] that flows through the calls
//! that need it.

mod direct;
mod forum;
mod registry;
mod spacedock;

use async_trait::async_trait;

use crate::acquire::{DownloadContext, Outcome};
use crate::error::Result;
use crate::http::HttpClient;
use crate::model::{DownloadCandidate, FetchedPage, ModMetadata};
use crate::parse::file_name_from_url;

pub use direct::DirectFileHandler;
pub use forum::ForumHandler;
pub use registry::HandlerRegistry;
pub use spacedock::SpaceDockHandler;

/// File types we download as plain files when a link carries no richer
/// metadata: common archives plus the ecosystem's own formats.
pub const KNOWN_ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "craft", "sfs", "cfg"];

/// True when the URL's final path segment ends in one of
/// [`KNOWN_ARCHIVE_EXTENSIONS`].
pub fn has_known_extension(url: &str) -> bool {
    let name = file_name_from_url(url);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            KNOWN_ARCHIVE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteHandler: Send + Sync {
    /// Display name; also the registry's uniqueness key.
    fn name(&self) -> &'static str;

    /// Authority match plus a path-shape check separating item pages from
    /// index pages. Never errors: a malformed URL is simply not a match.
    fn matches_url(&self, url: &str) -> bool;

    /// Whether [`matches_url`](Self::matches_url) identifies this handler's
    /// own site rather than a file shape. Fallback handlers return `false`
    /// and never receive delegated candidates: delegation replaces the
    /// delegating page's metadata, so it is reserved for origins that carry
    /// richer metadata than the page that linked them.
    fn owns_domain(&self) -> bool {
        true
    }

    /// Fetches the item page (exactly one fetch) and extracts the mod's
    /// identity. Fails with `Error::Parse` when a required field's source
    /// node is absent; identity fields are never defaulted.
    async fn fetch_metadata(
        &self,
        http: &HttpClient,
        url: &str,
    ) -> Result<(ModMetadata, FetchedPage)>;

    /// Discovers download candidates on an already-fetched page. May
    /// legitimately be empty; the caller maps that to
    /// `Error::NoCandidates`.
    fn list_candidates(
        &self,
        page: &FetchedPage,
        registry: &HandlerRegistry,
    ) -> Vec<DownloadCandidate>;

    /// Routes the chosen candidate to bytes on disk. `depth` counts
    /// handler-to-handler delegations already performed.
    async fn download(
        &self,
        ctx: &DownloadContext,
        meta: ModMetadata,
        candidate: &DownloadCandidate,
        depth: usize,
    ) -> Result<Outcome>;

    /// Re-fetches metadata from the origin URL and compares versions by
    /// exact string equality. Fetch or parse failures propagate; they are
    /// never read as "no update".
    async fn check_for_update(&self, http: &HttpClient, old: &ModMetadata) -> Result<bool> {
        let (fresh, _page) = self.fetch_metadata(http, &old.origin_url).await?;
        Ok(fresh.version != old.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_known_extension() {
        assert!(has_known_extension("https://host.example/files/mod.zip"));
        assert!(has_known_extension("https://host.example/files/mod.RAR"));
        assert!(has_known_extension("https://host.example/ship.craft?dl=1"));
        assert!(!has_known_extension("https://host.example/files/mod.exe"));
        assert!(!has_known_extension("https://host.example/files/"));
        assert!(!has_known_extension("https://host.example/.zip"));
    }
}
