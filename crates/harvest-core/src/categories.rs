use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How a category listing page is laid out: where the title lives, what
/// marks the end of the listing, and how product links are recognised.
///
/// Defaults match the Caris storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingProfile {
    /// `tag.class.class` selector of the element holding the category title.
    pub title_selector: String,
    /// Phrase in the page body that means the listing has run out.
    pub end_sentinel: String,
    /// Substring an anchor `href` must contain to be considered a product link.
    pub product_link_marker: String,
    /// Regex with one capture group yielding the numeric product id.
    pub product_id_pattern: String,
    /// Query parameter carrying the page number on pages after the first.
    pub page_param: String,
}

impl Default for ListingProfile {
    fn default() -> Self {
        Self {
            title_selector: "h1.title.page-title".to_string(),
            end_sentinel: "Your shopping cart is empty!".to_string(),
            product_link_marker: "product_id".to_string(),
            product_id_pattern: r"product_id=(\d+)".to_string(),
            page_param: "page".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySource {
    pub url: String,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    #[serde(default)]
    pub listing: ListingProfile,
    pub categories: Vec<CategorySource>,
}

/// Load and validate the category source list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let categories_file: CategoriesFile = serde_yaml::from_str(&content)?;

    validate_categories(&categories_file)?;

    Ok(categories_file)
}

fn validate_categories(categories_file: &CategoriesFile) -> Result<(), ConfigError> {
    if categories_file.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category must be listed".to_string(),
        ));
    }

    let mut seen_urls = HashSet::new();
    for category in &categories_file.categories {
        let url = category.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "category url must be non-empty".to_string(),
            ));
        }
        if !seen_urls.insert(url.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category url: '{url}'"
            )));
        }
    }

    validate_listing(&categories_file.listing)
}

/// Check that a listing profile can actually drive extraction.
///
/// # Errors
///
/// Returns `ConfigError::Validation` when the id pattern does not compile or
/// does not have exactly one capture group, or a required field is blank.
pub fn validate_listing(listing: &ListingProfile) -> Result<(), ConfigError> {
    let re = Regex::new(&listing.product_id_pattern).map_err(|e| {
        ConfigError::Validation(format!(
            "product_id_pattern '{}' does not compile: {e}",
            listing.product_id_pattern
        ))
    })?;
    // captures_len counts the implicit whole-match group.
    if re.captures_len() != 2 {
        return Err(ConfigError::Validation(format!(
            "product_id_pattern '{}' must contain exactly one capture group",
            listing.product_id_pattern
        )));
    }

    for (field, value) in [
        ("title_selector", &listing.title_selector),
        ("end_sentinel", &listing.end_sentinel),
        ("product_link_marker", &listing.product_link_marker),
        ("page_param", &listing.page_param),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "listing.{field} must be non-empty"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
