mod sqlite;

pub use sqlite::SqliteSink;

use crate::CrawlerError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One extraction result, as handed over by a crawler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Name of the crawler that produced the record.
    pub source: &'static str,
    pub link: String,
    pub user: Option<String>,
    pub extracted_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Record {
    pub fn new<T: Serialize>(
        source: &'static str,
        link: &str,
        user: Option<&str>,
        payload: &T,
    ) -> Result<Self, CrawlerError> {
        Ok(Self {
            source,
            link: link.trim().to_string(),
            user: user.map(ToString::to_string),
            extracted_at: Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn store(&self, record: Record) -> Result<(), CrawlerError>;
}

/// Pretty-prints every record as JSON on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

#[async_trait::async_trait]
impl Sink for StdoutSink {
    async fn store(&self, record: Record) -> Result<(), CrawlerError> {
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}
