//! Streaming file transfer with progress reporting.

use log::debug;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Receives incremental transfer progress. Implementations must not block
/// the transfer meaningfully; marshaling to another execution context is the
/// caller's responsibility.
pub trait ProgressSink: Send + Sync {
    /// Called after each received chunk with the running byte count and the
    /// total size when the server announced one.
    fn transferred(&self, bytes: u64, total: Option<u64>);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn transferred(&self, bytes: u64, total: Option<u64>) {
        self(bytes, total)
    }
}

/// Discards all progress updates.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn transferred(&self, _bytes: u64, _total: Option<u64>) {}
}

/// Streams `url` to `dest`, creating the parent directory first.
///
/// The transfer is a single attempt with no integrity validation of the
/// received bytes; callers treat the existence of `dest` as the success
/// signal.
#[tracing::instrument(skip(runtime, http, progress))]
pub async fn download_to(
    runtime: &dyn Runtime,
    http: &HttpClient,
    url: &str,
    dest: &Path,
    progress: &dyn ProgressSink,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent).map_err(|e| Error::Io {
            path: parent.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
    }

    let mut response = http.get_stream(url).await?;
    let total = response.content_length();

    let mut writer = runtime.create_file(dest).map_err(|e| Error::Io {
        path: dest.to_path_buf(),
        source: std::io::Error::other(e),
    })?;

    let mut transferred: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(|source| Error::Transfer {
        url: url.to_string(),
        source,
    })? {
        writer.write_all(&chunk).map_err(|source| Error::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        transferred += chunk.len() as u64;
        progress.transferred(transferred, total);
    }
    writer.flush().map_err(|source| Error::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    debug!(
        "Downloaded {:.2} MB from {}",
        transferred as f64 / (1024.0 * 1024.0),
        url
    );

    Ok(transferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use reqwest::Client;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test_log::test(tokio::test)]
    async fn test_download_to_writes_file() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/mod.zip")
            .with_status(200)
            .with_body("archive bytes")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("mods").join("mod.zip");
        let http = HttpClient::new(Client::new());

        let bytes = download_to(
            &RealRuntime,
            &http,
            &format!("{}/mod.zip", url),
            &dest,
            &NullProgress,
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 13);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "archive bytes");
    }

    #[test_log::test(tokio::test)]
    async fn test_download_to_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/mod.zip")
            .with_status(200)
            .with_header("content-length", "5")
            .with_body("12345")
            .create_async()
            .await;

        let mut runtime = MockRuntime::new();
        runtime.expect_create_dir_all().returning(|_| Ok(()));
        runtime
            .expect_create_file()
            .returning(|_| Ok(Box::new(std::io::sink())));

        let updates: Mutex<Vec<(u64, Option<u64>)>> = Mutex::new(Vec::new());
        let sink = |bytes: u64, total: Option<u64>| {
            updates.lock().unwrap().push((bytes, total));
        };

        let http = HttpClient::new(Client::new());
        download_to(
            &runtime,
            &http,
            &format!("{}/mod.zip", url),
            &PathBuf::from("mods/mod.zip"),
            &sink,
        )
        .await
        .unwrap();

        let seen = updates.lock().unwrap();
        assert!(!seen.is_empty());
        let (bytes, total) = *seen.last().unwrap();
        assert_eq!(bytes, 5);
        assert_eq!(total, Some(5));
    }

    #[tokio::test]
    async fn test_download_to_not_found_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/mod.zip")
            .with_status(404)
            .create_async()
            .await;

        let runtime = MockRuntime::new_with_dirs();
        let http = HttpClient::new(Client::new());
        let result = download_to(
            &runtime,
            &http,
            &format!("{}/mod.zip", url),
            &PathBuf::from("mods/mod.zip"),
            &NullProgress,
        )
        .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(Error::Fetch { .. })));
    }

    impl MockRuntime {
        fn new_with_dirs() -> Self {
            let mut runtime = MockRuntime::new();
            runtime.expect_create_dir_all().returning(|_| Ok(()));
            runtime
        }
    }
}
