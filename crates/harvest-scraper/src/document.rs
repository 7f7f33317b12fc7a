//! DOM queries over a fetched HTML document.
//!
//! Only the three queries the category scraper needs are supported: the text
//! of the first element matching a CSS selector, the text content of the
//! body, and anchor `href`s containing a marker substring. Text follows DOM
//! `textContent`: text nodes are concatenated as-is, so inline markup never
//! splits a phrase, and comments are not text.

use std::sync::LazyLock;

use scraper::{ElementRef, Html};

use crate::fetcher::{Extraction, Selector};

static BODY: LazyLock<scraper::Selector> =
    LazyLock::new(|| scraper::Selector::parse("body").expect("valid body selector"));
static ANCHOR: LazyLock<scraper::Selector> =
    LazyLock::new(|| scraper::Selector::parse("a[href]").expect("valid anchor selector"));

/// A parsed CSS selector, e.g. `h1.title.page-title`.
#[derive(Debug, Clone)]
pub struct ElementSelector {
    source: String,
    css: scraper::Selector,
}

impl PartialEq for ElementSelector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ElementSelector {}

impl std::str::FromStr for ElementSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("selector must be non-empty".to_string());
        }
        let css =
            scraper::Selector::parse(s).map_err(|e| format!("invalid selector '{s}': {e}"))?;
        Ok(Self {
            source: s.to_owned(),
            css,
        })
    }
}

/// A fetched page: its HTML and the URL it was loaded from.
///
/// The HTML is re-parsed per query; the parsed tree is not `Send`.
#[derive(Debug, Clone)]
pub struct Document {
    url: Option<reqwest::Url>,
    html: String,
}

impl Document {
    #[must_use]
    pub fn parse(html: impl Into<String>, url: &str) -> Self {
        Self {
            url: reqwest::Url::parse(url).ok(),
            html: html.into(),
        }
    }

    #[must_use]
    pub fn extract(&self, selector: &Selector) -> Extraction {
        match selector {
            Selector::ElementText(element) => Extraction::Text(self.element_text(element)),
            Selector::BodyText => Extraction::Text(Some(self.body_text())),
            Selector::LinkHrefs { href_contains } => {
                Extraction::Links(self.link_hrefs(href_contains))
            }
        }
    }

    /// Trimmed text of the first matching element, `None` if there is no
    /// match or its text is blank.
    #[must_use]
    pub fn element_text(&self, selector: &ElementSelector) -> Option<String> {
        let tree = Html::parse_document(&self.html);
        let text = text_content(tree.select(&selector.css).next()?);
        let text = text.trim().to_owned();
        (!text.is_empty()).then_some(text)
    }

    /// Text content of `<body>` with whitespace runs collapsed to one space.
    #[must_use]
    pub fn body_text(&self) -> String {
        let tree = Html::parse_document(&self.html);
        let raw: String = match tree.select(&BODY).next() {
            Some(body) => text_content(body),
            None => text_content(tree.root_element()),
        };
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// `href`s of anchors whose attribute contains `marker`, resolved against
    /// the document URL, in document order.
    #[must_use]
    pub fn link_hrefs(&self, marker: &str) -> Vec<String> {
        let tree = Html::parse_document(&self.html);
        let links: Vec<String> = tree
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| href.contains(marker))
            .map(|href| self.resolve(href))
            .collect();
        links
    }

    fn resolve(&self, href: &str) -> String {
        self.url
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map_or_else(|| href.to_owned(), |u| u.to_string())
    }
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
