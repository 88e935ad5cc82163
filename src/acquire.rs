//! The resolve-then-download flow.
//!
//! Caller hands over a URL; the registry picks a handler; the handler
//! produces metadata and candidates; one candidate is chosen (automatically
//! when it is the only one, otherwise through the caller's selection
//! prompt); the candidate is routed by [`classify`] and streamed to the
//! download directory. A candidate pointing at another known handler's
//! domain delegates the whole flow to that handler, bounded by
//! [`MAX_DELEGATION_DEPTH`].

use futures_util::future::BoxFuture;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

use crate::download::{self, ProgressSink};
use crate::error::{Error, Result};
use crate::handler::{HandlerRegistry, SiteHandler, has_known_extension};
use crate::http::HttpClient;
use crate::model::{DownloadCandidate, ModMetadata};
use crate::resolver::{HostResolver, ResolverSet};
use crate::runtime::Runtime;

/// Hard bound on handler-to-handler delegation, guarding against
/// pathological link cycles between item pages.
pub const MAX_DELEGATION_DEPTH: usize = 3;

/// Terminal result of an acquire flow. Declining the selection prompt is a
/// non-error outcome: the caller chose not to download.
#[derive(Debug)]
pub enum Outcome {
    Downloaded(ModMetadata),
    Declined,
}

/// External selection prompt. Invoked only when more than one candidate was
/// discovered; returns the index of the chosen candidate or `None` when the
/// caller declines.
pub trait CandidateSelector: Send + Sync {
    fn select(&self, candidates: &[DownloadCandidate]) -> Option<usize>;
}

impl<F> CandidateSelector for F
where
    F: Fn(&[DownloadCandidate]) -> Option<usize> + Send + Sync,
{
    fn select(&self, candidates: &[DownloadCandidate]) -> Option<usize> {
        self(candidates)
    }
}

/// Everything a download needs, bundled so handlers can route candidates
/// without owning any of it.
#[derive(Clone)]
pub struct DownloadContext {
    pub http: HttpClient,
    pub registry: Arc<HandlerRegistry>,
    pub resolvers: Arc<ResolverSet>,
    pub runtime: Arc<dyn Runtime>,
    pub download_dir: PathBuf,
    pub selector: Arc<dyn CandidateSelector>,
    pub progress: Arc<dyn ProgressSink>,
}

/// Where a chosen candidate goes next. Evaluated in fixed order: a known
/// handler wins over a bare file transfer, a recognized archive extension
/// wins over a host resolver, and anything else is a hard stop.
pub enum Route {
    /// The candidate's domain belongs to a registered site handler (possibly
    /// the one that produced it); re-run the whole flow against that
    /// handler. Shape-matching fallback handlers are not delegation targets.
    Delegate(Arc<dyn SiteHandler>),
    /// The URL is itself a known file type; transfer it directly.
    DirectFile,
    /// A registered host resolver knows how to find the file behind this
    /// landing page.
    HostResolver(Arc<dyn HostResolver>),
    /// Nothing in the core can handle this candidate.
    Unsupported,
}

/// Classifies a candidate URL for routing.
pub fn classify(url: &str, registry: &HandlerRegistry, resolvers: &ResolverSet) -> Route {
    if let Some(handler) = registry.find_delegate(url) {
        return Route::Delegate(handler);
    }
    if has_known_extension(url) {
        return Route::DirectFile;
    }
    if let Some(resolver) = resolvers.find(url) {
        return Route::HostResolver(resolver);
    }
    Route::Unsupported
}

/// Runs the full flow for a URL: resolve handler, fetch metadata, discover
/// and choose a candidate, download.
#[tracing::instrument(skip(ctx))]
pub async fn acquire(ctx: &DownloadContext, url: &str) -> Result<Outcome> {
    acquire_from(ctx, url, 0).await
}

/// Flow entry point at a given delegation depth. Boxed because handlers
/// re-enter it when they delegate a candidate.
pub fn acquire_from<'a>(
    ctx: &'a DownloadContext,
    url: &'a str,
    depth: usize,
) -> BoxFuture<'a, Result<Outcome>> {
    Box::pin(async move {
        let handler = ctx.registry.resolve(url)?;
        debug!("'{}' handles {}", handler.name(), url);

        let (meta, page) = handler.fetch_metadata(&ctx.http, url).await?;
        let candidates = handler.list_candidates(&page, &ctx.registry);
        if candidates.is_empty() {
            return Err(Error::NoCandidates(url.to_string()));
        }

        let index = if candidates.len() == 1 {
            0
        } else {
            match ctx.selector.select(&candidates) {
                Some(index) if index < candidates.len() => index,
                _ => {
                    info!("selection declined for {}", url);
                    return Ok(Outcome::Declined);
                }
            }
        };

        handler.download(ctx, meta, &candidates[index], depth).await
    })
}

/// Re-fetches metadata for a previously acquired mod and reports whether the
/// origin now carries a different version string.
#[tracing::instrument(skip(http, registry, old), fields(url = %old.origin_url))]
pub async fn check_for_update(
    http: &HttpClient,
    registry: &HandlerRegistry,
    old: &ModMetadata,
) -> Result<bool> {
    let handler = registry.resolve(&old.origin_url)?;
    handler.check_for_update(http, old).await
}

/// Streams `url` into `<download_dir>/<file_name>` and stamps the metadata
/// with the local path. The destination file's existence is the success
/// signal.
pub(crate) async fn transfer(
    ctx: &DownloadContext,
    meta: ModMetadata,
    url: &str,
    file_name: &str,
) -> Result<Outcome> {
    let dest = ctx.download_dir.join(file_name);
    download::download_to(
        ctx.runtime.as_ref(),
        &ctx.http,
        url,
        &dest,
        ctx.progress.as_ref(),
    )
    .await?;

    if !ctx.runtime.exists(&dest) {
        return Err(Error::Io {
            path: dest,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "downloaded file missing after transfer",
            ),
        });
    }

    Ok(Outcome::Downloaded(meta.with_local_path(dest)))
}
