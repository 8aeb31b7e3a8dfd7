use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{fmt, time::Duration};

use crate::RegistryError;

const DEFAULT_LOGIN_URL: &str = "https://www.linkedin.com/login";
const DEFAULT_ROUTES: &str = "linkedin=LinkedInCrawler";
const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 5;

/// Process-wide settings, read once at startup.
///
/// Values come from (lowest to highest precedence) built-in defaults, an
/// optional `config/default` file and the process environment. Keys are the
/// upper-cased field names, e.g. `LINKEDIN_USERNAME`.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub linkedin_login_url: String,
    pub linkedin_username: String,
    pub linkedin_password: String,
    /// Sqlite connection string. Records are printed to stdout when unset.
    pub database_url: Option<String>,
    pub page_load_timeout_secs: u64,
    pub browser_headless: bool,
    pub chromium_remote_debugging_url: Option<String>,
    /// Comma separated `domain=CrawlerName` pairs.
    pub crawler_routes: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("linkedin_login_url", DEFAULT_LOGIN_URL)?
            .set_default("linkedin_username", "")?
            .set_default("linkedin_password", "")?
            .set_default("page_load_timeout_secs", DEFAULT_PAGE_LOAD_TIMEOUT_SECS)?
            .set_default("browser_headless", true)?
            .set_default("crawler_routes", DEFAULT_ROUTES)?
            .add_source(File::with_name("config/default").required(false))
            // Env values stay strings so credentials such as "007" are kept verbatim;
            // numeric and boolean fields are converted on deserialization.
            .add_source(Environment::default().ignore_empty(true))
            .build()?
            .try_deserialize()
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    /// Parses `crawler_routes` into `(domain, crawler)` pairs, keeping their order.
    pub fn routes(&self) -> Result<Vec<(String, String)>, RegistryError> {
        self.crawler_routes
            .split(',')
            .map(str::trim)
            .filter(|route| !route.is_empty())
            .map(|route| match route.split_once('=') {
                Some((domain, crawler)) if !domain.trim().is_empty() && !crawler.trim().is_empty() => {
                    Ok((domain.trim().to_string(), crawler.trim().to_string()))
                }
                _ => Err(RegistryError::InvalidRoute(route.to_string())),
            })
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            linkedin_login_url: DEFAULT_LOGIN_URL.to_string(),
            linkedin_username: String::new(),
            linkedin_password: String::new(),
            database_url: None,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            browser_headless: true,
            chromium_remote_debugging_url: None,
            crawler_routes: DEFAULT_ROUTES.to_string(),
        }
    }
}

// Credentials stay out of logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("linkedin_login_url", &self.linkedin_login_url)
            .field("linkedin_username", &self.linkedin_username)
            .field("linkedin_password", &"********")
            .field("database_url", &self.database_url)
            .field("page_load_timeout_secs", &self.page_load_timeout_secs)
            .field("browser_headless", &self.browser_headless)
            .field(
                "chromium_remote_debugging_url",
                &self.chromium_remote_debugging_url,
            )
            .field("crawler_routes", &self.crawler_routes)
            .finish()
    }
}
