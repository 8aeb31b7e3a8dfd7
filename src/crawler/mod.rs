pub mod authenticated;

use crate::{session::BrowserLauncher, sink::Sink, CrawlerError, Settings};
use std::{collections::BTreeMap, sync::Arc};

pub use authenticated::{run_in_session, AuthenticatedCrawler};

/// Extracts information from the pages of one site.
///
/// Instances are created per dispatch and must not be reused across links.
#[async_trait::async_trait]
pub trait Crawler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches `link`, extracts what the site offers and emits it. Nothing is
    /// returned; every failure is propagated to the caller.
    async fn extract_information(&self, link: &str, params: &Params) -> Result<(), CrawlerError>;
}

/// A crawler that the dispatcher knows how to build.
pub trait CrawlerType: Crawler + Sized + 'static {
    const NAME: &'static str;

    /// Must stay cheap: sessions are acquired inside `extract_information`.
    fn build(ctx: &CrawlerContext) -> Result<Self, CrawlerError>;
}

/// Collaborators shared by every crawler built from the same dispatcher.
#[derive(Clone)]
pub struct CrawlerContext {
    pub settings: Arc<Settings>,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub sink: Arc<dyn Sink>,
}

impl CrawlerContext {
    pub fn new(
        settings: Arc<Settings>,
        launcher: Arc<dyn BrowserLauncher>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            settings,
            launcher,
            sink,
        }
    }
}

/// Extra keyword arguments passed along with the link.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn user(&self) -> Option<&str> {
        self.get("user")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::{session::testing::ScriptedLauncher, sink::testing::MemorySink};

    pub fn context() -> (CrawlerContext, ScriptedLauncher, Arc<MemorySink>) {
        context_with(Settings::default(), ScriptedLauncher::default())
    }

    pub fn context_with(
        settings: Settings,
        launcher: ScriptedLauncher,
    ) -> (CrawlerContext, ScriptedLauncher, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let ctx = CrawlerContext::new(
            Arc::new(settings),
            Arc::new(launcher.clone()),
            sink.clone(),
        );
        (ctx, launcher, sink)
    }
}
