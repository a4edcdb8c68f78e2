// src/crawl/links.rs
// =============================================================================
// Extracts followable links from an HTML page.
//
// We use the `scraper` crate to find every <a href> in the document and the
// `url` crate to resolve relative links against the page URL. Only http(s)
// links survive; anchors, mailto:, tel: and javascript: links are dropped.
// Fragments are stripped so page#a and page#b dedup to one fetch.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Extracts all followable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL of the page (for resolving relative links)
//
// Returns: absolute URLs, fragments removed, in document order
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .collect()
}

// Resolves a link (possibly relative) to an absolute http(s) URL
//
// Examples (base = "https://example.com/page"):
//   "/docs"               -> Some("https://example.com/docs")
//   "https://other.com"   -> Some("https://other.com/")
//   "#section"            -> None
//   "mailto:a@b.c"        -> None
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// Host of `url`, if it parses and has one
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://shop.test/catalog/index.html";

    #[test]
    fn test_resolve_link_cases() {
        let base = Url::parse(PAGE).unwrap();
        let cases = [
            ("item?id=7", Some("https://shop.test/catalog/item?id=7")),
            ("../cart", Some("https://shop.test/cart")),
            ("//cdn.shop.test/app", Some("https://cdn.shop.test/app")),
            ("http://Partner.TEST", Some("http://partner.test/")),
            ("  /help  ", Some("https://shop.test/help")),
            ("/faq#returns", Some("https://shop.test/faq")),
            ("#top", None),
            ("", None),
            ("tel:+15550100", None),
            ("mailto:sales@shop.test", None),
            ("javascript:history.back()", None),
            ("data:text/plain,hi", None),
            ("ftp://mirror.shop.test/pub", None),
        ];
        for (href, expected) in cases {
            assert_eq!(
                resolve_link(&base, href).as_deref(),
                expected,
                "href {:?}",
                href
            );
        }
    }

    #[test]
    fn test_extract_keeps_document_order_and_repeats() {
        let html = r##"
            <html><body>
              <nav><a href="/b">B</a><a>no href</a></nav>
              <main>
                <a href="/a#x">A</a>
                <a href="/b">B again</a>
                <area href="/map">
                <a href="#local">skip</a>
              </main>
            </body></html>
        "##;
        let links = extract_links(html, PAGE);
        assert_eq!(
            links,
            vec![
                "https://shop.test/b",
                "https://shop.test/a",
                "https://shop.test/b",
            ]
        );
    }

    #[test]
    fn test_extract_from_page_without_links() {
        assert!(extract_links("<p>plain text</p>", PAGE).is_empty());
        assert!(extract_links("", PAGE).is_empty());
    }

    #[test]
    fn test_extract_with_unparseable_page_url() {
        let html = r#"<a href="https://shop.test/">home</a>"#;
        assert!(extract_links(html, "/relative/only").is_empty());
    }

    #[test]
    fn test_host_of_ignores_port_and_path() {
        assert_eq!(host_of("http://127.0.0.1:4000/x?y").as_deref(), Some("127.0.0.1"));
        assert_eq!(host_of(PAGE).as_deref(), Some("shop.test"));
        assert_eq!(host_of("mailto:a@shop.test"), None);
        assert_eq!(host_of("shop.test/no-scheme"), None);
    }
}
