//! SpaceDock release-site handler.
//!
//! SpaceDock is the friendly case: a stable JSON API per mod, versioned
//! releases, and a download path for each release. No scraping involved.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use url::Url;

use crate::acquire::{self, DownloadContext, Outcome};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::model::{DownloadCandidate, FetchedPage, ModMetadata};

use super::{HandlerRegistry, SiteHandler};

const DEFAULT_HOST: &str = "spacedock.info";

/// Payload of `/api/mod/<id>`; only the fields the core consumes.
#[derive(Debug, Deserialize)]
struct SpaceDockMod {
    name: String,
    #[serde(default)]
    author: String,
    /// Newest release first, per the API contract.
    #[serde(default)]
    versions: Vec<SpaceDockVersion>,
}

#[derive(Debug, Deserialize)]
struct SpaceDockVersion {
    friendly_version: String,
    download_path: String,
    #[serde(default)]
    created: Option<String>,
}

pub struct SpaceDockHandler {
    host: String,
}

impl SpaceDockHandler {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    /// Points the handler at a different authority, for tests against a
    /// local server.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Numeric mod identifier from an item URL (`/mod/<id>[/<slug>]`).
    fn product_id(&self, url: &Url) -> Option<String> {
        let mut segments = url.path_segments()?;
        if segments.next()? != "mod" {
            return None;
        }
        let id = segments.next()?;
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Download paths also start with /mod/<id>; those are files, not
        // item pages.
        if segments.any(|segment| segment == "download") {
            return None;
        }
        Some(id.to_string())
    }
}

impl Default for SpaceDockHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteHandler for SpaceDockHandler {
    fn name(&self) -> &'static str {
        "SpaceDock"
    }

    fn matches_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        parsed.authority().eq_ignore_ascii_case(&self.host) && self.product_id(&parsed).is_some()
    }

    #[tracing::instrument(skip(self, http))]
    async fn fetch_metadata(
        &self,
        http: &HttpClient,
        url: &str,
    ) -> Result<(ModMetadata, FetchedPage)> {
        let parsed_url = Url::parse(url).map_err(|_| Error::Parse {
            url: url.to_string(),
            what: "not an absolute URL".to_string(),
        })?;
        let id = self.product_id(&parsed_url).ok_or_else(|| Error::Parse {
            url: url.to_string(),
            what: "mod id in URL path".to_string(),
        })?;

        let api_url = format!(
            "{}://{}/api/mod/{}",
            parsed_url.scheme(),
            parsed_url.authority(),
            id
        );
        let body = http.get_text(&api_url).await?;
        let info: SpaceDockMod = serde_json::from_str(&body).map_err(|_| Error::Parse {
            url: api_url.clone(),
            what: "mod JSON".to_string(),
        })?;

        let latest = info.versions.first().ok_or_else(|| Error::Parse {
            url: api_url.clone(),
            what: "versions list".to_string(),
        })?;

        let meta = ModMetadata {
            handler_name: self.name().to_string(),
            origin_url: format!(
                "{}://{}/mod/{}",
                parsed_url.scheme(),
                parsed_url.authority(),
                id
            ),
            name: info.name.clone(),
            product_id: id,
            version: latest.friendly_version.clone(),
            author: info.author.clone(),
            created_at: info.versions.last().and_then(|v| parse_release_date(v)),
            updated_at: parse_release_date(latest),
            local_path: None,
        };

        // The raw API payload stands in for page content so candidate
        // listing can work from the same fetch.
        Ok((meta, FetchedPage::new(parsed_url, body)))
    }

    fn list_candidates(
        &self,
        page: &FetchedPage,
        _registry: &HandlerRegistry,
    ) -> Vec<DownloadCandidate> {
        let Ok(info) = serde_json::from_str::<SpaceDockMod>(&page.html) else {
            return Vec::new();
        };

        info.versions
            .first()
            .and_then(|latest| {
                let url = page.url.join(&latest.download_path).ok()?;
                Some(DownloadCandidate {
                    display_name: format!("{} {}", info.name, latest.friendly_version),
                    url: url.to_string(),
                    known_host: false,
                })
            })
            .into_iter()
            .collect()
    }

    #[tracing::instrument(skip(self, ctx, meta))]
    async fn download(
        &self,
        ctx: &DownloadContext,
        meta: ModMetadata,
        candidate: &DownloadCandidate,
        _depth: usize,
    ) -> Result<Outcome> {
        // Release downloads have no file-name path segment; name the archive
        // after the mod and its version instead.
        let file_name = format!(
            "{}-{}.zip",
            sanitize_file_stem(&meta.name),
            sanitize_file_stem(&meta.version)
        );
        acquire::transfer(ctx, meta, &candidate.url, &file_name).await
    }
}

fn parse_release_date(version: &SpaceDockVersion) -> Option<NaiveDateTime> {
    let raw = version.created.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.naive_utc())
}

fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::Outcome;
    use crate::download::NullProgress;
    use crate::resolver::ResolverSet;
    use crate::runtime::RealRuntime;
    use reqwest::Client;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn api_body() -> &'static str {
        r#"{
            "name": "Example Mod",
            "author": "AuthorName",
            "versions": [
                {
                    "friendly_version": "2.1",
                    "download_path": "/mod/1234/Example Mod/download/2.1",
                    "created": "2021-04-01T10:30:00+00:00"
                },
                {
                    "friendly_version": "1.0",
                    "download_path": "/mod/1234/Example Mod/download/1.0",
                    "created": "2021-03-03T09:00:00+00:00"
                }
            ]
        }"#
    }

    #[test]
    fn test_matches_url_item_pages_only() {
        let handler = SpaceDockHandler::new();
        assert!(handler.matches_url("https://spacedock.info/mod/1234"));
        assert!(handler.matches_url("https://spacedock.info/mod/1234/Example-Mod"));
        assert!(!handler.matches_url("https://spacedock.info/browse"));
        assert!(!handler.matches_url("https://spacedock.info/mod/abc"));
        assert!(!handler.matches_url("https://spacedock.info/mod/1234/Example/download/1.0"));
        assert!(!handler.matches_url("https://other.example.com/mod/1234"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_from_api() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let host = Url::parse(&url).unwrap().authority().to_string();

        let mock = server
            .mock("GET", "/api/mod/1234")
            .with_status(200)
            .with_body(api_body())
            .create_async()
            .await;

        let handler = SpaceDockHandler::with_host(&host);
        let http = HttpClient::new(Client::new());
        let (meta, page) = handler
            .fetch_metadata(&http, &format!("{}/mod/1234/Example-Mod", url))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(meta.handler_name, "SpaceDock");
        assert_eq!(meta.origin_url, format!("{}/mod/1234", url));
        assert_eq!(meta.name, "Example Mod");
        assert_eq!(meta.product_id, "1234");
        assert_eq!(meta.version, "2.1");
        assert_eq!(meta.author, "AuthorName");
        assert_eq!(
            meta.created_at.unwrap().format("%Y-%m-%d").to_string(),
            "2021-03-03"
        );
        assert_eq!(
            meta.updated_at.unwrap().format("%Y-%m-%d").to_string(),
            "2021-04-01"
        );

        let registry = HandlerRegistry::new();
        let candidates = handler.list_candidates(&page, &registry);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "Example Mod 2.1");
        assert!(candidates[0].url.ends_with("/download/2.1"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_no_versions_fails() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let host = Url::parse(&url).unwrap().authority().to_string();

        let _mock = server
            .mock("GET", "/api/mod/1234")
            .with_status(200)
            .with_body(r#"{"name": "Empty Mod", "author": "x", "versions": []}"#)
            .create_async()
            .await;

        let handler = SpaceDockHandler::with_host(&host);
        let http = HttpClient::new(Client::new());
        let result = handler
            .fetch_metadata(&http, &format!("{}/mod/1234", url))
            .await;
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[tokio::test]
    async fn test_download_names_archive_after_mod_and_version() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let file_mock = server
            .mock("GET", "/mod/1234/Example%20Mod/download/2.1")
            .with_status(200)
            .with_body("release bytes")
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

        let handler = SpaceDockHandler::new();
        let meta = ModMetadata {
            name: "Example Mod".into(),
            version: "2.1".into(),
            ..Default::default()
        };
        let candidate = DownloadCandidate {
            display_name: "Example Mod 2.1".into(),
            url: format!("{}/mod/1234/Example%20Mod/download/2.1", url),
            known_host: false,
        };

        let outcome = handler.download(&ctx, meta, &candidate, 0).await.unwrap();
        file_mock.assert_async().await;
        match outcome {
            Outcome::Downloaded(meta) => {
                assert_eq!(
                    meta.local_path.unwrap(),
                    dir.path().join("Example_Mod-2.1.zip")
                );
            }
            Outcome::Declined => panic!("expected a download"),
        }
    }
}
