//! Thin wrapper around `reqwest::Client`.
//!
//! Every operation is a single attempt: the sites this tool talks to offer no
//! API contract worth retrying against, and a transient failure is a terminal
//! failure for the call.

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// HTTP client shared by handlers, resolvers and the downloader.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and returns the response body as text.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;

        response.text().await.map_err(|source| Error::Fetch {
            url: url.to_string(),
            source,
        })
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;

        response.json::<T>().await.map_err(|source| Error::Fetch {
            url: url.to_string(),
            source,
        })
    }

    /// Starts a GET request and hands the open response back for streaming.
    /// The status line is checked here; reading the body is the caller's job.
    #[tracing::instrument(skip(self))]
    pub async fn get_stream(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET (stream) {}...", url);

        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })
    }
}
