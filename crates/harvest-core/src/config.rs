use crate::app_config::{AppConfig, Environment, RendererKind};
use crate::ConfigError;

/// Desktop browser UA; some storefronts serve degraded listings to bots.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;
    use std::str::FromStr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, raw: &str| -> Result<u64, ConfigError> {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_u64(var, &or_default(var, default))
    };

    let to_usize = |var: &str, value: u64| -> Result<usize, ConfigError> {
        usize::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let to_u32 = |var: &str, value: u64| -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("HARVEST_ENV", "development"))?;
    let log_level = or_default("HARVEST_LOG_LEVEL", "info");

    let categories_path = PathBuf::from(or_default(
        "HARVEST_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let dataset_dir = PathBuf::from(or_default("HARVEST_DATASET_DIR", "./output"));
    let consolidated_path = PathBuf::from(or_default(
        "HARVEST_CONSOLIDATED_PATH",
        "./consolidated-products.json",
    ));
    let registry_path = PathBuf::from(or_default("HARVEST_REGISTRY_PATH", "./categories.json"));
    let products_input_path = PathBuf::from(or_default(
        "HARVEST_PRODUCTS_INPUT_PATH",
        "./productsraw.json",
    ));
    let products_output_path = PathBuf::from(or_default(
        "HARVEST_PRODUCTS_OUTPUT_PATH",
        "./products.json",
    ));

    // Unset means requests have no overall timeout.
    let scraper_request_timeout_secs = match lookup("HARVEST_SCRAPER_REQUEST_TIMEOUT_SECS") {
        Ok(raw) => Some(parse_u64("HARVEST_SCRAPER_REQUEST_TIMEOUT_SECS", &raw)?),
        Err(_) => None,
    };
    if scraper_request_timeout_secs == Some(0) {
        return Err(ConfigError::InvalidEnvVar {
            var: "HARVEST_SCRAPER_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }

    let scraper_user_agent = or_default("HARVEST_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_page_delay_ms = parse_num("HARVEST_SCRAPER_PAGE_DELAY_MS", "500")?;
    let scraper_page_jitter_ms = parse_num("HARVEST_SCRAPER_PAGE_JITTER_MS", "500")?;
    let scraper_max_pages = to_usize(
        "HARVEST_SCRAPER_MAX_PAGES",
        parse_num("HARVEST_SCRAPER_MAX_PAGES", "200")?,
    )?;
    if scraper_max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HARVEST_SCRAPER_MAX_PAGES".to_string(),
            reason: "page limit must be greater than zero".to_string(),
        });
    }
    let scraper_max_retries = to_u32(
        "HARVEST_SCRAPER_MAX_RETRIES",
        parse_num("HARVEST_SCRAPER_MAX_RETRIES", "0")?,
    )?;
    let scraper_retry_backoff_base_secs =
        parse_num("HARVEST_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;
    let scraper_max_concurrent_categories = to_usize(
        "HARVEST_SCRAPER_MAX_CONCURRENT_CATEGORIES",
        parse_num("HARVEST_SCRAPER_MAX_CONCURRENT_CATEGORIES", "1")?,
    )?;

    let renderer_raw = or_default("HARVEST_SCRAPER_RENDERER", "http");
    let scraper_renderer =
        RendererKind::from_str(renderer_raw.trim()).map_err(|reason| ConfigError::InvalidEnvVar {
            var: "HARVEST_SCRAPER_RENDERER".to_string(),
            reason,
        })?;
    let chrome_bin = or_default("HARVEST_CHROME_BIN", "chromium");

    let enrich_program = or_default("HARVEST_ENRICH_PROGRAM", "uv");
    let enrich_args = or_default("HARVEST_ENRICH_ARGS", "run python ./parallel_scraper.py")
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    let enrich_batch_delay_ms = parse_num("HARVEST_ENRICH_BATCH_DELAY_MS", "2000")?;

    Ok(AppConfig {
        env,
        log_level,
        categories_path,
        dataset_dir,
        consolidated_path,
        registry_path,
        products_input_path,
        products_output_path,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_page_delay_ms,
        scraper_page_jitter_ms,
        scraper_max_pages,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_max_concurrent_categories,
        scraper_renderer,
        chrome_bin,
        enrich_program,
        enrich_args,
        enrich_batch_delay_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than the three
/// known environment names.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HARVEST_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
