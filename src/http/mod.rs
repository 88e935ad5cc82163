//! HTTP access for page fetches, API lookups and file transfers.

mod client;

pub use client::HttpClient;
