use crate::{
    crawler::{run_in_session, AuthenticatedCrawler, Crawler, CrawlerContext, CrawlerType, Params},
    linkedin::LinkedInProfile,
    session::{BrowserLauncher, BrowserSession},
    sink::{Record, Sink},
    utils::collapse_whitespace,
    CrawlerError,
};
use itertools::Itertools;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

const USERNAME_INPUT: &str = "#username";
const PASSWORD_INPUT: &str = "#password";
const SUBMIT_BUTTON: &str = ".login__form_action_container button";
const READY: &str = "body";

const E: &str = "Invalid selector";
lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect(E);
    static ref NAME: Selector = Selector::parse("h1").expect(E);
    static ref HEADLINE: Selector = Selector::parse("div.text-body-medium").expect(E);
    static ref LOCATION: Selector = Selector::parse("span.text-body-small.inline").expect(E);
    static ref SECTION: Selector = Selector::parse("section").expect(E);
    static ref ABOUT_ANCHOR: Selector = Selector::parse("#about").expect(E);
    static ref EXPERIENCE_ANCHOR: Selector = Selector::parse("#experience").expect(E);
    static ref EDUCATION_ANCHOR: Selector = Selector::parse("#education").expect(E);
    static ref ABOUT_TEXT: Selector =
        Selector::parse(r#"div.inline-show-more-text span[aria-hidden="true"]"#).expect(E);
    static ref LIST_ITEM: Selector = Selector::parse("li.artdeco-list__item").expect(E);
    static ref ITEM_TITLE: Selector =
        Selector::parse(r#"div.t-bold span[aria-hidden="true"]"#).expect(E);
}

pub struct LinkedInCrawler {
    launcher: Arc<dyn BrowserLauncher>,
    sink: Arc<dyn Sink>,
    login_url: String,
    username: String,
    password: String,
    page_load_timeout: Duration,
}

impl LinkedInCrawler {
    pub fn parse_profile(doc: &Html) -> LinkedInProfile {
        let about = section(doc, &ABOUT_ANCHOR)
            .and_then(|s| s.select(&ABOUT_TEXT).next())
            .and_then(text);

        LinkedInProfile {
            name: first_text(doc, &NAME),
            headline: first_text(doc, &HEADLINE),
            location: first_text(doc, &LOCATION),
            about,
            experience: list_titles(doc, &EXPERIENCE_ANCHOR),
            education: list_titles(doc, &EDUCATION_ANCHOR),
            page_title: first_text(doc, &TITLE),
        }
    }
}

fn text(el: ElementRef<'_>) -> Option<String> {
    let s = collapse_whitespace(&el.text().collect::<String>());
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector).next().and_then(text)
}

/// Profile sections are `<section>`s holding an anchor element with a known id.
fn section<'a>(doc: &'a Html, anchor: &Selector) -> Option<ElementRef<'a>> {
    doc.select(&SECTION)
        .find(|s| s.select(anchor).next().is_some())
}

// Grouped positions repeat their title in a nested list, hence the dedup.
fn list_titles(doc: &Html, anchor: &Selector) -> Vec<String> {
    section(doc, anchor)
        .map(|s| {
            s.select(&LIST_ITEM)
                .filter_map(|li| li.select(&ITEM_TITLE).next())
                .filter_map(text)
                .dedup()
                .collect()
        })
        .unwrap_or_default()
}

impl CrawlerType for LinkedInCrawler {
    const NAME: &'static str = "LinkedInCrawler";

    fn build(ctx: &CrawlerContext) -> Result<Self, CrawlerError> {
        Ok(LinkedInCrawler {
            launcher: ctx.launcher.clone(),
            sink: ctx.sink.clone(),
            login_url: ctx.settings.linkedin_login_url.clone(),
            username: ctx.settings.linkedin_username.clone(),
            password: ctx.settings.linkedin_password.clone(),
            page_load_timeout: ctx.settings.page_load_timeout(),
        })
    }
}

#[async_trait::async_trait]
impl Crawler for LinkedInCrawler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn extract_information(&self, link: &str, params: &Params) -> Result<(), CrawlerError> {
        run_in_session(self, link, params).await
    }
}

#[async_trait::async_trait]
impl AuthenticatedCrawler for LinkedInCrawler {
    fn launcher(&self) -> &dyn BrowserLauncher {
        self.launcher.as_ref()
    }

    async fn login(&self, session: &dyn BrowserSession) -> Result<(), CrawlerError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(CrawlerError::Configuration(
                "LinkedIn scraper requires a valid account to perform extraction".to_string(),
            ));
        }

        session.goto(&self.login_url).await?;
        session.type_into(USERNAME_INPUT, &self.username).await?;
        session.type_into(PASSWORD_INPUT, &self.password).await?;
        session.click(SUBMIT_BUTTON).await?;
        debug!("Logged in to LinkedIn as {}", self.username);
        Ok(())
    }

    async fn extract(
        &self,
        session: &dyn BrowserSession,
        link: &str,
        params: &Params,
    ) -> Result<(), CrawlerError> {
        session.goto(link).await?;
        session.wait_for(READY, self.page_load_timeout).await?;
        let html = session.page_source().await?;

        let profile = {
            let doc = Html::parse_document(&html);
            Self::parse_profile(&doc)
        };

        if profile.is_empty() {
            warn!("Empty profile extracted: {}", link);
        } else {
            debug!("Extracted profile from {}\n{}", link, profile);
        }

        let record = Record::new(self.name(), link, params.user(), &profile)?;
        self.sink.store(record).await?;
        info!("Stored profile from {}", link);
        Ok(())
    }
}
