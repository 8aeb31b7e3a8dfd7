use super::Params;
use crate::{
    session::{BrowserLauncher, BrowserSession},
    CrawlerError,
};
use tracing::warn;

/// A crawler that works inside a browser session and may have to sign in
/// before it can see the page.
#[async_trait::async_trait]
pub trait AuthenticatedCrawler: Send + Sync {
    fn launcher(&self) -> &dyn BrowserLauncher;

    /// Signs in on `session`. Sites without authentication keep the default.
    ///
    /// Implementations return [`CrawlerError::Configuration`] when the
    /// credentials they need are missing.
    async fn login(&self, _session: &dyn BrowserSession) -> Result<(), CrawlerError> {
        Ok(())
    }

    async fn extract(
        &self,
        session: &dyn BrowserSession,
        link: &str,
        params: &Params,
    ) -> Result<(), CrawlerError>;
}

/// Acquires a session, runs `login` then `extract` on it, and closes it on
/// every exit path. An extraction error takes precedence over a close error.
pub async fn run_in_session<C>(crawler: &C, link: &str, params: &Params) -> Result<(), CrawlerError>
where
    C: AuthenticatedCrawler + ?Sized,
{
    let session = crawler.launcher().launch().await?;

    let result = async {
        crawler.login(session.as_ref()).await?;
        crawler.extract(session.as_ref(), link, params).await
    }
    .await;

    match (result, session.close().await) {
        (Err(e), Err(close)) => {
            warn!("Failed to close browser session after error: {}", close);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(close)) => {
            warn!("Failed to close browser session: {}", close);
            Ok(())
        }
        (Ok(()), Ok(())) => Ok(()),
    }
}
