//! Forum thread page extraction.
//!
//! The forum renders mod releases as threads; the first post carries
//! everything we can know about the mod. Selectors target that first post.
//! The title node is the single hard failure: without it there is no
//! identity to build a record from. Author and timestamp nodes degrade
//! gracefully when missing, since the page layout around them shifts more
//! often than the title block does.

use chrono::NaiveDateTime;
use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::model::FetchedPage;
use crate::parse::dates::parse_flexible_date;
use crate::parse::product_id_from_link;

const TITLE_SELECTOR: &str = "#pagetitle h1 span a";
const AUTHOR_SELECTOR: &str = "#posts li:first-of-type a.username";
const CREATED_SELECTOR: &str = "#posts li:first-of-type span.date";
const UPDATED_SELECTOR: &str = "#posts li:first-of-type blockquote.lastedit";
const LINK_SELECTOR: &str = "#posts li:first-of-type blockquote.postcontent a[href]";

/// Fields extracted from one forum thread page.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModPage {
    pub name: String,
    /// Content of the first bracketed token of the title, empty when the
    /// title carries no bracketed tag.
    pub version: String,
    pub product_id: String,
    pub author: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// One raw anchor from the first post body, before any validity filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub text: String,
    pub href: String,
}

/// Extracts mod identity fields from a fetched thread page.
///
/// Fails with [`Error::Parse`] when the title node or its detail link is
/// absent; identity fields are never fabricated.
pub fn parse_mod_page(page: &FetchedPage) -> Result<ParsedModPage> {
    let document = Html::parse_document(&page.html);
    let title_selector = Selector::parse(TITLE_SELECTOR).expect("valid title selector");
    let author_selector = Selector::parse(AUTHOR_SELECTOR).expect("valid author selector");
    let created_selector = Selector::parse(CREATED_SELECTOR).expect("valid created selector");
    let updated_selector = Selector::parse(UPDATED_SELECTOR).expect("valid updated selector");

    let title = document
        .select(&title_selector)
        .next()
        .ok_or_else(|| Error::Parse {
            url: page.url.to_string(),
            what: "title node".to_string(),
        })?;

    let name = element_text(&title);
    let detail_link = title.value().attr("href").ok_or_else(|| Error::Parse {
        url: page.url.to_string(),
        what: "title detail link".to_string(),
    })?;
    let product_id = product_id_from_link(detail_link).ok_or_else(|| Error::Parse {
        url: page.url.to_string(),
        what: "product id in title detail link".to_string(),
    })?;

    let author = document
        .select(&author_selector)
        .next()
        .map(|node| element_text(&node))
        .unwrap_or_default();

    let created_at = document
        .select(&created_selector)
        .next()
        .map(|node| parse_flexible_date(&element_text(&node)));
    let updated_at = document
        .select(&updated_selector)
        .next()
        .map(|node| parse_flexible_date(&element_text(&node)));

    Ok(ParsedModPage {
        version: first_bracketed_token(&name),
        name,
        product_id,
        author,
        created_at,
        updated_at,
    })
}

/// Collects every anchor from the first post body, unfiltered. Candidate
/// validity (absolute URL, scheme) is decided by the caller.
pub fn extract_post_links(html: &str) -> Vec<RawLink> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse(LINK_SELECTOR).expect("valid link selector");

    document
        .select(&link_selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            Some(RawLink {
                text: element_text(&anchor),
                href: href.to_string(),
            })
        })
        .collect()
}

/// Content of the first `[...]` token of a title, typically the game version
/// the release targets. Empty when the title has no bracketed tag.
fn first_bracketed_token(title: &str) -> String {
    let Some(open) = title.find('[') else {
        return String::new();
    };
    match title[open + 1..].find(']') {
        Some(close) => title[open + 1..open + 1 + close].to_string(),
        None => String::new(),
    }
}

fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(html: &str) -> FetchedPage {
        FetchedPage::new(
            Url::parse("https://forum.example.com/threads/12345-Example-Mod-1-0").unwrap(),
            html.to_string(),
        )
    }

    fn thread_html() -> String {
        r##"
        <html><body>
          <div id="pagetitle">
            <h1><span><a href="/threads/12345-Example-Mod-1-0">[1.0] Example Mod</a></span></h1>
          </div>
          <ol id="posts">
            <li>
              <div><span class="date">March 3rd, 2021</span></div>
              <div>
                <a class="username" href="/members/7-author">  AuthorName </a>
                <blockquote class="postcontent">
                  Download: <a href="https://files.example.com/example-mod.zip">Primary mirror</a>
                  also at <a href="https://www.mediafire.com/file/abc/example">MediaFire</a>
                  and a <a href="relative/link">broken one</a>
                </blockquote>
                <blockquote class="lastedit">Last edited by AuthorName; March 5th, 2021 at 1:15 PM</blockquote>
              </div>
            </li>
            <li>
              <blockquote class="postcontent"><a href="https://other.example.com/reply-link">reply</a></blockquote>
            </li>
          </ol>
        </body></html>
        "##
        .to_string()
    }

    #[test]
    fn test_parse_mod_page_extracts_identity() {
        let parsed = parse_mod_page(&page(&thread_html())).unwrap();
        assert_eq!(parsed.name, "[1.0] Example Mod");
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.product_id, "12345");
        assert_eq!(parsed.author, "AuthorName");
    }

    #[test]
    fn test_parse_mod_page_dates() {
        let parsed = parse_mod_page(&page(&thread_html())).unwrap();
        let created = parsed.created_at.unwrap();
        assert_eq!(created.format("%Y-%m-%d").to_string(), "2021-03-03");
        let updated = parsed.updated_at.unwrap();
        assert_eq!(updated.format("%Y-%m-%d %H:%M").to_string(), "2021-03-05 13:15");
    }

    #[test]
    fn test_parse_mod_page_missing_title_is_hard_failure() {
        let html = "<html><body><div id='posts'></div></body></html>";
        let result = parse_mod_page(&page(html));
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_parse_mod_page_missing_author_degrades() {
        let html = r##"
        <html><body>
          <div id="pagetitle"><h1><span><a href="/threads/42-Mod">Mod</a></span></h1></div>
          <ol id="posts"><li></li></ol>
        </body></html>"##;
        let parsed = parse_mod_page(&page(html)).unwrap();
        assert_eq!(parsed.author, "");
        assert_eq!(parsed.version, "");
        assert!(parsed.created_at.is_none());
        assert!(parsed.updated_at.is_none());
    }

    #[test]
    fn test_extract_post_links_first_post_only() {
        let links = extract_post_links(&thread_html());
        let hrefs: Vec<&str> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://files.example.com/example-mod.zip",
                "https://www.mediafire.com/file/abc/example",
                "relative/link",
            ]
        );
        assert_eq!(links[0].text, "Primary mirror");
    }

    #[test]
    fn test_extract_post_links_empty_page() {
        assert!(extract_post_links("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_first_bracketed_token() {
        assert_eq!(first_bracketed_token("[1.12.5] Great Mod"), "1.12.5");
        assert_eq!(first_bracketed_token("No tag here"), "");
        assert_eq!(first_bracketed_token("[unclosed"), "");
    }
}
