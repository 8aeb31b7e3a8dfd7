use std::time::Duration;

/// Raised while building the routing table. These are programming errors
/// and are expected to abort startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid domain {0:?}: expected a bare name such as \"linkedin\"")]
    InvalidDomain(String),
    #[error("Invalid crawler type {0:?}: no crawler with that name is known")]
    InvalidCrawlerType(String),
    #[error("Invalid route {0:?}: expected <domain>=<crawler>")]
    InvalidRoute(String),
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("URL must be a non-empty string")]
    InvalidUrl,
    #[error("Failed to build crawler {crawler} for {url}: {source}")]
    Construction {
        crawler: &'static str,
        url: String,
        #[source]
        source: CrawlerError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("Improperly configured: {0}")]
    Configuration(String),
    #[error("Timed out after {timeout:?} waiting for {url} to load")]
    PageLoadTimeout { url: String, timeout: Duration },
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::error::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
