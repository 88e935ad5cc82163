use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use reqwest::Client;

use modfetch::acquire::{self, CandidateSelector, DownloadContext, Outcome};
use modfetch::download::ProgressSink;
use modfetch::handler::{
    DirectFileHandler, ForumHandler, HandlerRegistry, SpaceDockHandler,
};
use modfetch::http::HttpClient;
use modfetch::model::{DownloadCandidate, ModMetadata};
use modfetch::resolver::ResolverSet;
use modfetch::runtime::{RealRuntime, Runtime};

/// modfetch - locate and retrieve mod packages
///
/// Points at a mod's page on a supported site, extracts its metadata and
/// download links, and streams the chosen archive to disk.
///
/// Examples:
///   modfetch add https://forum.kerbalspaceprogram.com/threads/12345-Example
#[derive(Parser, Debug)]
#[command(author, version = env!("MODFETCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory downloads are written to (defaults to ~/Downloads/mods)
    #[arg(
        long = "download-dir",
        short = 'd',
        env = "MODFETCH_DOWNLOAD_DIR",
        value_name = "PATH",
        global = true
    )]
    pub download_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch a mod's metadata and download its archive
    Add(AddArgs),

    /// Show a mod's metadata and download candidates without downloading
    Info(InfoArgs),

    /// Check whether a newer version than the given one is published
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// URL of the mod's page
    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// URL of the mod's page
    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// URL of the mod's page
    #[arg(value_name = "URL")]
    pub url: String,

    /// Version string recorded when the mod was last fetched
    #[arg(long, value_name = "VERSION")]
    pub version: String,
}

/// Handlers in routing order: site-specific handlers first, the bare
/// archive-link fallback last.
fn default_registry() -> Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(ForumHandler::new()))?;
    registry.register(Arc::new(SpaceDockHandler::new()))?;
    registry.register(Arc::new(DirectFileHandler::new()))?;
    Ok(registry)
}

fn default_download_dir(runtime: &dyn Runtime) -> Result<PathBuf> {
    let home = runtime
        .home_dir()
        .context("could not determine the home directory")?;
    Ok(home.join("Downloads").join("mods"))
}

/// Numbered prompt on stderr, answer read from stdin. An empty line or
/// anything that is not an in-range number declines.
struct StdinSelector;

impl CandidateSelector for StdinSelector {
    fn select(&self, candidates: &[DownloadCandidate]) -> Option<usize> {
        let mut err = std::io::stderr();
        let _ = writeln!(err, "Multiple download links found:");
        for (i, candidate) in candidates.iter().enumerate() {
            let _ = writeln!(err, "  [{}] {} ({})", i + 1, candidate.display_name, candidate.url);
        }
        let _ = write!(err, "Pick one (1-{}, empty to cancel): ", candidates.len());
        let _ = err.flush();

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        let choice: usize = line.trim().parse().ok()?;
        choice.checked_sub(1).filter(|i| *i < candidates.len())
    }
}

/// Logs transfer progress in ten-percent steps when the total size is known.
struct LogProgress {
    last_percent: AtomicU64,
}

impl LogProgress {
    fn new() -> Self {
        Self {
            last_percent: AtomicU64::new(0),
        }
    }
}

impl ProgressSink for LogProgress {
    fn transferred(&self, bytes: u64, total: Option<u64>) {
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };
        let percent = bytes * 100 / total;
        let last = self.last_percent.load(Ordering::Relaxed);
        if percent >= last + 10 || percent == 100 && last < 100 {
            self.last_percent.store(percent, Ordering::Relaxed);
            info!("downloaded {}% ({} of {} bytes)", percent, bytes, total);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = Arc::new(RealRuntime);

    let download_dir = match cli.download_dir {
        Some(dir) => dir,
        None => default_download_dir(runtime.as_ref())?,
    };

    let http = HttpClient::new(Client::new());
    let registry = Arc::new(default_registry()?);

    match cli.command {
        Commands::Add(args) => {
            let ctx = DownloadContext {
                http,
                registry: registry.clone(),
                resolvers: Arc::new(ResolverSet::default_set()),
                runtime,
                download_dir,
                selector: Arc::new(StdinSelector),
                progress: Arc::new(LogProgress::new()),
            };
            match acquire::acquire(&ctx, &args.url).await? {
                Outcome::Downloaded(meta) => {
                    if let Some(path) = &meta.local_path {
                        println!("{} saved to {}", meta.name, path.display());
                    }
                }
                Outcome::Declined => println!("download cancelled"),
            }
        }
        Commands::Info(args) => {
            let handler = registry.resolve(&args.url)?;
            let (meta, page) = handler.fetch_metadata(&http, &args.url).await?;
            println!("handler:    {}", meta.handler_name);
            println!("name:       {}", meta.name);
            println!("version:    {}", meta.version);
            println!("author:     {}", meta.author);
            println!("product id: {}", meta.product_id);
            println!("origin:     {}", meta.origin_url);
            if let Some(created) = meta.created_at {
                println!("created:    {}", created);
            }
            if let Some(updated) = meta.updated_at {
                println!("updated:    {}", updated);
            }
            for candidate in handler.list_candidates(&page, &registry) {
                let marker = if candidate.known_host { "*" } else { " " };
                println!("link: {marker} {} ({})", candidate.display_name, candidate.url);
            }
        }
        Commands::Check(args) => {
            let recorded = ModMetadata {
                origin_url: args.url.clone(),
                version: args.version.clone(),
                ..Default::default()
            };
            if acquire::check_for_update(&http, &registry, &recorded).await? {
                println!("update available (recorded version: {})", args.version);
            } else {
                println!("up to date ({})", args.version);
            }
        }
    }
    Ok(())
}
