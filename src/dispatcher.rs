//! Routes a URL to the crawler registered for its domain.
//!
//! Routes are kept in registration order and the first matching route wins.
//! Registering the same domain twice is allowed: the later route is kept but
//! is shadowed by the earlier one and never matches.

use crate::{
    crawler::{Crawler, CrawlerContext, CrawlerType},
    linkedin::LinkedInCrawler,
    CrawlerError, DispatchError, RegistryError,
};
use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

type Factory =
    Box<dyn Fn(&CrawlerContext) -> Result<Box<dyn Crawler>, CrawlerError> + Send + Sync>;

struct Route {
    domain: String,
    pattern: Regex,
    crawler: &'static str,
    factory: Factory,
}

pub struct Dispatcher {
    ctx: CrawlerContext,
    routes: Vec<Route>,
}

fn factory_of<C: CrawlerType>() -> Factory {
    Box::new(
        |ctx: &CrawlerContext| -> Result<Box<dyn Crawler>, CrawlerError> {
            Ok(Box::new(C::build(ctx)?))
        },
    )
}

/// Crawlers that can be registered by name, e.g. from configuration.
fn builtin(name: &str) -> Option<(&'static str, Factory)> {
    if name == LinkedInCrawler::NAME || name == "linkedin" {
        Some((LinkedInCrawler::NAME, factory_of::<LinkedInCrawler>()))
    } else {
        None
    }
}

/// Compiles a bare domain into `^https://(www\.)?<domain>\.com/.*$`, ignoring case.
pub fn domain_pattern(domain: &str) -> Result<Regex, RegistryError> {
    let invalid = domain.trim().is_empty()
        || domain.contains("://")
        || domain.contains('/')
        || domain.chars().any(char::is_whitespace)
        || domain.to_lowercase().starts_with("www.")
        || domain.to_lowercase().ends_with(".com");
    if invalid {
        return Err(RegistryError::InvalidDomain(domain.to_string()));
    }

    Ok(RegexBuilder::new(&format!(
        r"^https://(www\.)?{}\.com/.*$",
        regex::escape(domain)
    ))
    .case_insensitive(true)
    .build()?)
}

impl Dispatcher {
    pub fn new(ctx: CrawlerContext) -> Self {
        Self {
            ctx,
            routes: Vec::new(),
        }
    }

    /// Builds a dispatcher from `(domain, crawler name)` pairs, failing on the
    /// first invalid one.
    pub fn from_routes<I, D, N>(ctx: CrawlerContext, routes: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (D, N)>,
        D: AsRef<str>,
        N: AsRef<str>,
    {
        let mut dispatcher = Self::new(ctx);
        for (domain, name) in routes {
            dispatcher.register_named(domain.as_ref(), name.as_ref())?;
        }
        Ok(dispatcher)
    }

    pub fn register<C: CrawlerType>(&mut self, domain: &str) -> Result<(), RegistryError> {
        self.push(domain, C::NAME, factory_of::<C>())
    }

    /// Registers a crawler given by name. Unknown names are rejected.
    pub fn register_named(&mut self, domain: &str, name: &str) -> Result<(), RegistryError> {
        let (crawler, factory) =
            builtin(name).ok_or_else(|| RegistryError::InvalidCrawlerType(name.to_string()))?;
        self.push(domain, crawler, factory)
    }

    pub fn register_with<F>(
        &mut self,
        domain: &str,
        crawler: &'static str,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&CrawlerContext) -> Result<Box<dyn Crawler>, CrawlerError> + Send + Sync + 'static,
    {
        self.push(domain, crawler, Box::new(factory))
    }

    fn push(
        &mut self,
        domain: &str,
        crawler: &'static str,
        factory: Factory,
    ) -> Result<(), RegistryError> {
        let pattern = domain_pattern(domain)?;

        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.domain.eq_ignore_ascii_case(domain))
        {
            warn!(
                "Domain {} is already routed to {}; {} will never be used for it",
                domain, existing.crawler, crawler
            );
        }

        info!(
            "Registered crawler {} for domain pattern: {}",
            crawler,
            pattern.as_str()
        );
        self.routes.push(Route {
            domain: domain.to_string(),
            pattern,
            crawler,
            factory,
        });
        Ok(())
    }

    /// Returns a fresh crawler for the first route matching `url`, or `None`
    /// when no route matches.
    pub fn get_crawler(&self, url: &str) -> Result<Option<Box<dyn Crawler>>, DispatchError> {
        if url.trim().is_empty() {
            return Err(DispatchError::InvalidUrl);
        }

        let Some(route) = self.routes.iter().find(|r| r.pattern.is_match(url)) else {
            warn!("No crawler found for URL: {}", url);
            return Ok(None);
        };

        debug!("Dispatch {} to {}", url, route.crawler);
        match (route.factory)(&self.ctx) {
            Ok(crawler) => Ok(Some(crawler)),
            Err(source) => {
                error!("Error processing URL {}: {}", url, source);
                Err(DispatchError::Construction {
                    crawler: route.crawler,
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    pub fn patterns(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.routes.iter().map(|r| (r.pattern.as_str(), r.crawler))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{testing::context, Params};
    use pretty_assertions::assert_eq;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct First;
    struct Second;

    macro_rules! noop_crawler {
        ($ty:ident, $name:expr) => {
            #[async_trait::async_trait]
            impl Crawler for $ty {
                fn name(&self) -> &'static str {
                    $name
                }

                async fn extract_information(
                    &self,
                    _link: &str,
                    _params: &Params,
                ) -> Result<(), CrawlerError> {
                    Ok(())
                }
            }

            impl CrawlerType for $ty {
                const NAME: &'static str = $name;

                fn build(_ctx: &CrawlerContext) -> Result<Self, CrawlerError> {
                    Ok($ty)
                }
            }
        };
    }

    noop_crawler!(First, "First");
    noop_crawler!(Second, "Second");

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(context().0)
    }

    fn crawler_name(d: &Dispatcher, url: &str) -> Option<&'static str> {
        d.get_crawler(url).unwrap().map(|c| c.name())
    }

    #[test]
    fn match_with_and_without_www_in_any_case() {
        let mut d = dispatcher();
        d.register::<First>("example").unwrap();

        for url in [
            "https://example.com/x",
            "https://www.example.com/x",
            "HTTPS://WWW.EXAMPLE.COM/X",
            "https://Example.com/",
        ] {
            assert_eq!(crawler_name(&d, url), Some("First"), "{}", url);
        }
    }

    #[test]
    fn alphanumeric_domains_match_their_own_urls() {
        for domain in ["a", "linkedin", "Medium", "x9", "42"] {
            let mut d = dispatcher();
            d.register::<First>(domain).unwrap();
            assert_eq!(crawler_name(&d, &format!("https://{}.com/path", domain)), Some("First"));
            assert_eq!(
                crawler_name(&d, &format!("https://www.{}.com/path", domain.to_uppercase())),
                Some("First")
            );
        }
    }

    #[test]
    fn no_match_outside_the_exact_domain() {
        let mut d = dispatcher();
        d.register::<First>("example").unwrap();

        for url in [
            "https://notexample.com/x",
            "https://example.com.evil.org/x",
            "https://example.org/x",
            "https://sub.example.com/x",
            "https://example.com",
            "http://example.com/x",
            "ftp://example.com/x",
            " https://example.com/x",
            "https://wwwexample.com/x",
        ] {
            assert_eq!(crawler_name(&d, url), None, "{}", url);
        }
    }

    #[test]
    fn substring_domains_do_not_collide() {
        let mut d = dispatcher();
        d.register::<First>("link").unwrap();
        d.register::<Second>("linkedin").unwrap();

        assert_eq!(crawler_name(&d, "https://notlink.com/x"), None);
        assert_eq!(crawler_name(&d, "https://link.com/x"), Some("First"));
        assert_eq!(crawler_name(&d, "https://www.linkedin.com/in/x/"), Some("Second"));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let mut d = dispatcher();
        d.register::<First>("a.b").unwrap();

        assert_eq!(crawler_name(&d, "https://a.b.com/x"), Some("First"));
        assert_eq!(crawler_name(&d, "https://axb.com/x"), None);
    }

    #[test]
    fn first_registration_wins_for_duplicate_domain() {
        let mut d = dispatcher();
        d.register::<First>("example").unwrap();
        d.register::<Second>("EXAMPLE").unwrap();

        assert_eq!(d.len(), 2);
        assert_eq!(crawler_name(&d, "https://example.com/x"), Some("First"));
    }

    #[test]
    fn reject_invalid_domains() {
        let mut d = dispatcher();
        for domain in ["", "  ", "https://example", "www.example", "example.com", "ex ample", "a/b"] {
            assert!(
                matches!(d.register::<First>(domain), Err(RegistryError::InvalidDomain(_))),
                "{:?}",
                domain
            );
        }
        assert!(d.is_empty());
    }

    #[test]
    fn reject_unknown_crawler_name() {
        let mut d = dispatcher();
        assert!(matches!(
            d.register_named("x", "NotACrawler"),
            Err(RegistryError::InvalidCrawlerType(name)) if name == "NotACrawler"
        ));
        assert!(d.is_empty());
    }

    #[test]
    fn register_builtin_by_name() {
        let mut d = dispatcher();
        d.register_named("linkedin", "LinkedInCrawler").unwrap();
        d.register_named("lnkd", "linkedin").unwrap();

        assert_eq!(
            crawler_name(&d, "https://www.linkedin.com/in/x/"),
            Some("LinkedInCrawler")
        );
        assert_eq!(crawler_name(&d, "https://lnkd.com/x"), Some("LinkedInCrawler"));
    }

    #[test]
    fn from_routes_keeps_order_and_fails_fast() {
        let d = Dispatcher::from_routes(context().0, [("linkedin", "LinkedInCrawler")]).unwrap();
        assert_eq!(
            d.patterns().collect::<Vec<_>>(),
            vec![(r"^https://(www\.)?linkedin\.com/.*$", "LinkedInCrawler")]
        );

        let err = Dispatcher::from_routes(
            context().0,
            [("linkedin", "LinkedInCrawler"), ("x", "Nope")],
        )
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::InvalidCrawlerType(_)));
    }

    #[test]
    fn empty_url_is_invalid() {
        let mut d = dispatcher();
        d.register::<First>("example").unwrap();

        assert!(matches!(d.get_crawler(""), Err(DispatchError::InvalidUrl)));
        assert!(matches!(d.get_crawler("   "), Err(DispatchError::InvalidUrl)));
    }

    #[test]
    fn no_routes_means_not_found() {
        let d = dispatcher();
        assert!(d.get_crawler("https://www.linkedin.com/in/x/").unwrap().is_none());
    }

    #[test]
    fn fresh_instance_per_dispatch() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();

        let mut d = dispatcher();
        d.register_with("example", "First", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(First) as Box<dyn Crawler>)
        })
        .unwrap();

        d.get_crawler("https://example.com/a").unwrap().unwrap();
        d.get_crawler("https://example.com/a").unwrap().unwrap();
        d.get_crawler("https://other.com/a").unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn construction_failure_is_reported_with_url() {
        let mut d = dispatcher();
        d.register_with("example", "Broken", |_| {
            Err(CrawlerError::Configuration("no account".to_string()))
        })
        .unwrap();

        match d.get_crawler("https://example.com/a") {
            Err(DispatchError::Construction { crawler, url, source }) => {
                assert_eq!(crawler, "Broken");
                assert_eq!(url, "https://example.com/a");
                assert!(matches!(source, CrawlerError::Configuration(_)));
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.map(|c| c.name()))),
        }
    }
}
