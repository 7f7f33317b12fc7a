//! Page URLs for numbered category listings.
//!
//! Page 1 is the category URL exactly as configured. Every later page adds a
//! page-number query parameter:
//!
//! ```text
//! https://www.caris.com.tr/index.php?route=product/category&path=38
//! https://www.caris.com.tr/index.php?route=product/category&path=38&page=2
//! ```
//!
//! The query is edited as text rather than through `Url::query_pairs_mut`,
//! which would re-encode existing pairs (`product/category` becomes
//! `product%2Fcategory`).

use crate::error::ScraperError;

/// Validates that `base_url` is an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidCategoryUrl`] otherwise.
pub fn validate_category_url(base_url: &str) -> Result<(), ScraperError> {
    let parsed = reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidCategoryUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ScraperError::InvalidCategoryUrl {
            url: base_url.to_owned(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}

/// Builds the URL for `page` (1-based) of the listing at `base_url`.
///
/// Any existing `page_param` pair in the base URL is replaced, and a
/// `#fragment` is dropped on pages after the first.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidCategoryUrl`] if `base_url` is not an
/// absolute `http`/`https` URL.
pub fn page_url(base_url: &str, page: usize, page_param: &str) -> Result<String, ScraperError> {
    validate_category_url(base_url)?;
    if page <= 1 {
        return Ok(base_url.to_owned());
    }

    let without_fragment = base_url.split('#').next().unwrap_or(base_url);
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, query),
        None => (without_fragment, ""),
    };

    let needle = format!("{page_param}=");
    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with(needle.as_str()) && *pair != page_param)
        .collect();
    let page_pair = format!("{page_param}={page}");
    pairs.push(&page_pair);

    Ok(format!("{path}?{}", pairs.join("&")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARIS: &str = "https://www.caris.com.tr/index.php?route=product/category&path=38";

    #[test]
    fn first_page_is_base_url_verbatim() {
        assert_eq!(page_url(CARIS, 1, "page").unwrap(), CARIS);
    }

    #[test]
    fn later_pages_append_page_param() {
        assert_eq!(
            page_url(CARIS, 2, "page").unwrap(),
            format!("{CARIS}&page=2")
        );
        assert_eq!(
            page_url(CARIS, 17, "page").unwrap(),
            format!("{CARIS}&page=17")
        );
    }

    #[test]
    fn base_without_query_gets_question_mark() {
        assert_eq!(
            page_url("https://shop.example.com/c/sofas", 3, "p").unwrap(),
            "https://shop.example.com/c/sofas?p=3"
        );
    }

    #[test]
    fn existing_page_param_is_replaced() {
        assert_eq!(
            page_url("https://shop.example.com/c?page=1&sort=asc", 4, "page").unwrap(),
            "https://shop.example.com/c?sort=asc&page=4"
        );
    }

    #[test]
    fn similarly_named_params_survive() {
        assert_eq!(
            page_url("https://shop.example.com/c?pagesize=50", 2, "page").unwrap(),
            "https://shop.example.com/c?pagesize=50&page=2"
        );
    }

    #[test]
    fn fragment_is_dropped() {
        assert_eq!(
            page_url("https://shop.example.com/c?x=1#top", 2, "page").unwrap(),
            "https://shop.example.com/c?x=1&page=2"
        );
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = page_url("/index.php?route=product/category", 2, "page").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidCategoryUrl { .. }));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = validate_category_url("ftp://shop.example.com/c").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidCategoryUrl { ref reason, .. } if reason.contains("ftp")));
    }
}
