//! Extraction of metadata and download links from fetched page content.
//!
//! Everything in here is synchronous and operates on an already-fetched
//! [`FetchedPage`](crate::model::FetchedPage); the parsed HTML document never
//! outlives a single extraction call.

pub mod dates;
pub mod forum;

/// Strips the disambiguation suffix from an item URL.
///
/// Forum item URLs carry a slug after the numeric identifier
/// (`.../threads/12345-Some-Mod-1-0`); the canonical identity of the item is
/// everything up to the first hyphen of the final path segment
/// (`.../threads/12345`). URLs whose final segment has no hyphen are already
/// canonical and come back unchanged.
pub fn reduce_to_plain_url(url: &str) -> String {
    let Some(slash) = url.rfind('/') else {
        return url.to_string();
    };
    let (base, last) = url.split_at(slash + 1);
    match last.find('-') {
        Some(hyphen) => format!("{}{}", base, &last[..hyphen]),
        None => url.to_string(),
    }
}

/// Extracts the host-specific stable identifier from an item's detail link:
/// the token of the final path segment before its first hyphen.
pub fn product_id_from_link(href: &str) -> Option<String> {
    let trimmed = href.trim_end_matches('/');
    let last = trimmed.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    let id = last.split('-').next().unwrap_or(last);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Derives a local file name from a URL: the final path segment with any
/// query string or fragment truncated.
pub fn file_name_from_url(url: &str) -> String {
    let no_fragment = url.split('#').next().unwrap_or(url);
    let no_query = no_fragment.split('?').next().unwrap_or(no_fragment);
    no_query
        .rsplit('/')
        .next()
        .unwrap_or(no_query)
        .to_string()
}
