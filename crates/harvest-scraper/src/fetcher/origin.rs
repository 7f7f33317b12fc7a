//! URL origin and domain extraction.

/// Extracts the scheme+host(+port) origin from a URL.
///
/// Given `"https://www.caris.com.tr/index.php?route=product/category"`,
/// returns `"https://www.caris.com.tr"`. Unparseable input falls back to the
/// first three `/`-separated segments.
#[must_use]
pub fn extract_origin(url: &str) -> String {
    reqwest::Url::parse(url).map_or_else(
        |e| {
            tracing::warn!(
                url,
                error = %e,
                "could not parse URL, falling back to string split for origin extraction"
            );
            url.trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
