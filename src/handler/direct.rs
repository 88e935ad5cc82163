//! Handler for bare archive links handed to the tool directly.
//!
//! There is nothing to scrape: identity is synthesized from the URL itself
//! and the single candidate is the URL. The handler matches by file shape,
//! not by site, so it never receives delegated candidates; archive links
//! discovered on other handlers' pages are those handlers' direct
//! transfers.

use async_trait::async_trait;
use url::Url;

use crate::acquire::{self, DownloadContext, Outcome};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::model::{DownloadCandidate, FetchedPage, ModMetadata};
use crate::parse::file_name_from_url;

use super::{HandlerRegistry, SiteHandler, has_known_extension};

pub struct DirectFileHandler;

impl DirectFileHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirectFileHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteHandler for DirectFileHandler {
    fn name(&self) -> &'static str {
        "Direct Link"
    }

    fn matches_url(&self, url: &str) -> bool {
        Url::parse(url).is_ok() && has_known_extension(url)
    }

    /// Matches by file shape, not by site. An archive candidate discovered
    /// on another handler's page is that handler's direct transfer, with its
    /// metadata kept; it must not delegate here.
    fn owns_domain(&self) -> bool {
        false
    }

    /// No fetch happens here. The file name stands in for the mod name and
    /// the version stays empty, which makes update checks report a change
    /// as soon as the origin ever serves a versioned page instead.
    async fn fetch_metadata(
        &self,
        _http: &HttpClient,
        url: &str,
    ) -> Result<(ModMetadata, FetchedPage)> {
        let parsed = Url::parse(url).map_err(|_| Error::Parse {
            url: url.to_string(),
            what: "not an absolute URL".to_string(),
        })?;

        let file_name = file_name_from_url(url);
        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _ext)| stem)
            .unwrap_or(&file_name);

        let meta = ModMetadata {
            handler_name: self.name().to_string(),
            origin_url: url.to_string(),
            name: stem.to_string(),
            product_id: stem.to_string(),
            version: String::new(),
            author: String::new(),
            created_at: None,
            updated_at: None,
            local_path: None,
        };

        Ok((meta, FetchedPage::new(parsed, String::new())))
    }

    fn list_candidates(
        &self,
        page: &FetchedPage,
        _registry: &HandlerRegistry,
    ) -> Vec<DownloadCandidate> {
        let url = page.url.to_string();
        vec![DownloadCandidate {
            display_name: file_name_from_url(&url),
            url,
            known_host: true,
        }]
    }

    #[tracing::instrument(skip(self, ctx, meta))]
    async fn download(
        &self,
        ctx: &DownloadContext,
        meta: ModMetadata,
        candidate: &DownloadCandidate,
        _depth: usize,
    ) -> Result<Outcome> {
        let file_name = file_name_from_url(&candidate.url);
        acquire::transfer(ctx, meta, &candidate.url, &file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::NullProgress;
    use crate::resolver::ResolverSet;
    use crate::runtime::RealRuntime;
    use reqwest::Client;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_matches_archive_links_only() {
        let handler = DirectFileHandler::new();
        assert!(handler.matches_url("https://host.example/files/mod.zip"));
        assert!(handler.matches_url("https://host.example/ship.craft"));
        assert!(!handler.matches_url("https://host.example/threads/123-mod"));
        assert!(!handler.matches_url("not a url.zip"));
    }

    #[tokio::test]
    async fn test_metadata_synthesized_from_url() {
        let handler = DirectFileHandler::new();
        let http = HttpClient::new(Client::new());
        let (meta, page) = handler
            .fetch_metadata(&http, "https://host.example/files/ExampleMod-1.0.zip")
            .await
            .unwrap();

        assert_eq!(meta.handler_name, "Direct Link");
        assert_eq!(meta.name, "ExampleMod-1.0");
        assert_eq!(meta.product_id, "ExampleMod-1.0");
        assert_eq!(meta.version, "");
        assert_eq!(meta.origin_url, "https://host.example/files/ExampleMod-1.0.zip");
        assert!(page.html.is_empty());

        let registry = HandlerRegistry::new();
        let candidates = handler.list_candidates(&page, &registry);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "ExampleMod-1.0.zip");
        assert!(candidates[0].known_host);
    }

    #[tokio::test]
    async fn test_download_streams_file() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/files/mod.zip")
            .with_status(200)
            .with_body("archive bytes")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let ctx = DownloadContext {
            http: HttpClient::new(Client::new()),
            registry: Arc::new(HandlerRegistry::new()),
            resolvers: Arc::new(ResolverSet::new(vec![])),
            runtime: Arc::new(RealRuntime),
            download_dir: dir.path().to_path_buf(),
            selector: Arc::new(|_: &[DownloadCandidate]| -> Option<usize> { None }),
            progress: Arc::new(NullProgress),
        };

        let handler = DirectFileHandler::new();
        let file_url = format!("{}/files/mod.zip", url);
        let http = HttpClient::new(Client::new());
        let (meta, _page) = handler.fetch_metadata(&http, &file_url).await.unwrap();
        let candidate = DownloadCandidate {
            display_name: "mod.zip".into(),
            url: file_url,
            known_host: true,
        };

        let outcome = handler.download(&ctx, meta, &candidate, 0).await.unwrap();
        mock.assert_async().await;
        match outcome {
            Outcome::Downloaded(meta) => {
                let path = meta.local_path.unwrap();
                assert_eq!(path, dir.path().join("mod.zip"));
                assert_eq!(std::fs::read_to_string(path).unwrap(), "archive bytes");
            }
            Outcome::Declined => panic!("expected a download"),
        }
    }
}
