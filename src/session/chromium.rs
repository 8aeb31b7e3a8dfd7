use super::{BrowserLauncher, BrowserSession};
use crate::{CrawlerError, Settings};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CHROME_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--log-level=3",
    "--disable-popup-blocking",
    "--disable-notifications",
    "--disable-extensions",
    "--disable-background-networking",
    "--ignore-certificate-errors",
];

fn browser_err(e: impl std::fmt::Display) -> CrawlerError {
    CrawlerError::Browser(e.to_string())
}

/// Takes the first element of a lookup. Only an empty result means the
/// element is missing; lookup failures stay browser errors.
fn first_match<T, E: std::fmt::Display>(
    selector: &str,
    found: Result<Vec<T>, E>,
) -> Result<T, CrawlerError> {
    found
        .map_err(browser_err)?
        .into_iter()
        .next()
        .ok_or_else(|| CrawlerError::ElementNotFound(selector.to_string()))
}

/// DevTools event loop of one browser, aborted when dropped.
struct EventLoop(JoinHandle<()>);

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Starts one private Chromium per session, or opens a fresh tab on a remote
/// DevTools endpoint when one is configured.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    remote_url: Option<String>,
}

impl ChromiumLauncher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            headless: settings.browser_headless,
            remote_url: settings.chromium_remote_debugging_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, CrawlerError> {
        let (browser, mut handler) = match &self.remote_url {
            Some(url) => {
                info!("Connecting to remote Chrome instance at {}", url);
                Browser::connect(url).await.map_err(browser_err)?
            }
            None => {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(REQUEST_TIMEOUT);
                if !self.headless {
                    builder = builder.with_head();
                }
                for arg in CHROME_ARGS {
                    builder = builder.arg(*arg);
                }
                Browser::launch(builder.build().map_err(browser_err)?)
                    .await
                    .map_err(browser_err)?
            }
        };

        let events = EventLoop(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        }));

        let page = browser.new_page("about:blank").await.map_err(browser_err)?;
        debug!("Browser session started");

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            page,
            events,
            remote: self.remote_url.is_some(),
        }))
    }
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    events: EventLoop,
    remote: bool,
}

impl ChromiumSession {
    async fn current_url(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<(), CrawlerError> {
        debug!("Visit {}", url);
        self.page.goto(url).await.map_err(browser_err)?;
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), CrawlerError> {
        first_match(selector, self.page.find_elements(selector).await)?
            .type_str(text)
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), CrawlerError> {
        first_match(selector, self.page.find_elements(selector).await)?
            .click()
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), CrawlerError> {
        let present = async {
            while self.page.find_element(selector).await.is_err() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, present).await {
            Ok(()) => Ok(()),
            Err(_) => Err(CrawlerError::PageLoadTimeout {
                url: self.current_url().await,
                timeout,
            }),
        }
    }

    async fn page_source(&self) -> Result<String, CrawlerError> {
        self.page.content().await.map_err(browser_err)
    }

    async fn close(&self) -> Result<(), CrawlerError> {
        let mut closed = self.page.clone().close().await.map_err(browser_err);
        if !self.remote {
            let mut browser = self.browser.lock().await;
            let shutdown = match browser.close().await {
                Ok(_) => browser.wait().await.map(|_| ()).map_err(browser_err),
                Err(e) => Err(browser_err(e)),
            };
            closed = closed.and(shutdown);
        }
        // The event loop must outlive the close handshake above.
        self.events.0.abort();
        debug!("Browser session closed");
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_lookup_is_element_not_found() {
        assert_eq!(first_match("#a", Ok::<_, String>(vec![1, 2])).unwrap(), 1);
        assert!(matches!(
            first_match("#a", Ok::<Vec<u8>, String>(vec![])),
            Err(CrawlerError::ElementNotFound(s)) if s == "#a"
        ));
        assert!(matches!(
            first_match("#a", Err::<Vec<u8>, _>("connection closed")),
            Err(CrawlerError::Browser(s)) if s == "connection closed"
        ));
    }

    #[tokio::test]
    async fn dropped_event_loop_is_aborted() {
        let events = EventLoop(tokio::spawn(futures::future::pending::<()>()));
        let task = events.0.abort_handle();
        drop(events);

        tokio::time::timeout(Duration::from_secs(1), async {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("event loop still running");
    }
}
