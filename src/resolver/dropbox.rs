//! Dropbox share link resolver.
//!
//! Dropbox needs no landing page fetch: flipping the `dl` query parameter to
//! `1` turns a share page into a direct download.

use async_trait::async_trait;
use url::Url;

use super::HostResolver;
use crate::error::{Error, Result};
use crate::http::HttpClient;

pub struct DropboxResolver {
    hosts: Vec<String>,
}

impl DropboxResolver {
    pub fn new() -> Self {
        Self {
            hosts: vec!["www.dropbox.com".to_string(), "dropbox.com".to_string()],
        }
    }
}

impl Default for DropboxResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostResolver for DropboxResolver {
    fn name(&self) -> &'static str {
        "Dropbox"
    }

    fn matches_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self
                .hosts
                .iter()
                .any(|host| parsed.authority().eq_ignore_ascii_case(host)),
            Err(_) => false,
        }
    }

    #[tracing::instrument(skip(self, _http))]
    async fn resolve_direct_url(&self, _http: &HttpClient, page_url: &str) -> Result<String> {
        let mut parsed = Url::parse(page_url).map_err(|_| Error::UnsupportedHost(page_url.to_string()))?;

        let retained: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| key != "dl")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = parsed.query_pairs_mut();
            pairs.clear();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("dl", "1");
        }

        Ok(parsed.to_string())
    }
}
