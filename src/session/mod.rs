mod chromium;

pub use chromium::ChromiumLauncher;

use crate::CrawlerError;
use std::time::Duration;

/// A single browser tab owned by one crawler for the duration of one
/// extraction. Sessions are stateful and never shared between crawlers.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), CrawlerError>;
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), CrawlerError>;
    async fn click(&self, selector: &str) -> Result<(), CrawlerError>;

    /// Waits until `selector` is present on the current page.
    ///
    /// Fails with [`CrawlerError::PageLoadTimeout`] once `timeout` expires.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), CrawlerError>;

    async fn page_source(&self) -> Result<String, CrawlerError>;
    async fn close(&self) -> Result<(), CrawlerError>;
}

#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, CrawlerError>;
}
