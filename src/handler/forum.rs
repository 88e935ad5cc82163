//! Forum-style site handler.
//!
//! The forum is the richest and least structured origin: mods are threads,
//! metadata is scraped out of the first post, and download links are
//! whatever the author pasted into it. Candidates pointing at another known
//! handler's domain are delegated entirely, because the forum itself carries
//! no reliable version information for third-party files.

use async_trait::async_trait;
use log::debug;
use url::Url;

use crate::acquire::{self, DownloadContext, Outcome, Route, MAX_DELEGATION_DEPTH};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::model::{DownloadCandidate, FetchedPage, ModMetadata};
use crate::parse::forum::{extract_post_links, parse_mod_page};
use crate::parse::{file_name_from_url, reduce_to_plain_url};

use super::{HandlerRegistry, SiteHandler};

const DEFAULT_HOST: &str = "forum.kerbalspaceprogram.com";

/// Handler for the KSP forum's release threads.
pub struct ForumHandler {
    host: String,
}

impl ForumHandler {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    /// Points the handler at a different authority, for tests against a
    /// local server.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for ForumHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteHandler for ForumHandler {
    fn name(&self) -> &'static str {
        "KSP Forum"
    }

    fn matches_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        // Item pages live under /threads/; everything else on the forum is
        // an index or member page.
        parsed.authority().eq_ignore_ascii_case(&self.host)
            && parsed
                .path_segments()
                .is_some_and(|mut segments| segments.any(|segment| segment == "threads"))
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

        let html = http.get_text(url).await?;
        let page = FetchedPage::new(parsed_url, html);
        let parsed = parse_mod_page(&page)?;

        let meta = ModMetadata {
            handler_name: self.name().to_string(),
            origin_url: reduce_to_plain_url(url),
            name: parsed.name,
            product_id: parsed.product_id,
            version: parsed.version,
            author: parsed.author,
            created_at: parsed.created_at,
            updated_at: parsed.updated_at,
            local_path: None,
        };
        Ok((meta, page))
    }

    fn list_candidates(
        &self,
        page: &FetchedPage,
        registry: &HandlerRegistry,
    ) -> Vec<DownloadCandidate> {
        extract_post_links(&page.html)
            .into_iter()
            .filter_map(|link| {
                // Only well-formed absolute http(s) links become candidates.
                let parsed = Url::parse(&link.href).ok()?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return None;
                }

                let known = registry.find(&link.href);
                let display_name = match &known {
                    Some(handler) if link.text.is_empty() || link.text.contains("://") => {
                        handler.name().to_string()
                    }
                    _ if link.text.is_empty() => link.href.clone(),
                    _ => link.text,
                };

                Some(DownloadCandidate {
                    display_name,
                    url: link.href,
                    known_host: known.is_some(),
                })
            })
            .collect()
    }

    #[tracing::instrument(skip(self, ctx, meta))]
    async fn download(
        &self,
        ctx: &DownloadContext,
        meta: ModMetadata,
        candidate: &DownloadCandidate,
        depth: usize,
    ) -> Result<Outcome> {
        match acquire::classify(&candidate.url, &ctx.registry, &ctx.resolvers) {
            Route::Delegate(delegate) => {
                if depth >= MAX_DELEGATION_DEPTH {
                    return Err(Error::TooManyRedirections(candidate.url.clone()));
                }
                // The delegate tracks versions for its own domain; its
                // metadata replaces ours wholesale.
                debug!(
                    "delegating {} to '{}' (depth {})",
                    candidate.url,
                    delegate.name(),
                    depth + 1
                );
                acquire::acquire_from(ctx, &candidate.url, depth + 1).await
            }
            Route::DirectFile => {
                let file_name = file_name_from_url(&candidate.url);
                acquire::transfer(ctx, meta, &candidate.url, &file_name).await
            }
            Route::HostResolver(resolver) => {
                let direct = resolver.resolve_direct_url(&ctx.http, &candidate.url).await?;
                let file_name = resolver.suggest_file_name(&direct);
                acquire::transfer(ctx, meta, &direct, &file_name).await
            }
            Route::Unsupported => Err(Error::UnsupportedHost(candidate.url.clone())),
        }
    }
}
