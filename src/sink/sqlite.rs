use super::{Record, Sink};
use crate::{utils, CrawlerError};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::str::FromStr;

const TABLE: &str = "records";

/// Appends records to a single sqlite table, creating it on first use.
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub async fn connect(url: &str) -> Result<SqliteSink, CrawlerError> {
        let opt = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;

        if !utils::is_table_exists(&pool, TABLE).await? {
            tracing::debug!("Create table {}", TABLE);
            let query = format!(
                r#"
                    CREATE TABLE {} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        source TEXT NOT NULL,
                        link TEXT NOT NULL,
                        user TEXT,
                        extracted_at DATETIME,
                        payload TEXT
                    )
                "#,
                TABLE
            );
            sqlx::query(&query).execute(&pool).await?;
        } else {
            tracing::debug!("Use table {}", TABLE);
        }

        Ok(SqliteSink { pool })
    }

    pub async fn count(&self) -> Result<u32, CrawlerError> {
        let query = format!("SELECT COUNT(*) FROM {}", TABLE);
        Ok(sqlx::query(&query)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?)
    }
}

#[async_trait::async_trait]
impl Sink for SqliteSink {
    async fn store(&self, record: Record) -> Result<(), CrawlerError> {
        let query = format!(
            "INSERT INTO {} (source, link, user, extracted_at, payload) VALUES (?, ?, ?, ?, ?)",
            TABLE
        );
        sqlx::query(&query)
            .bind(record.source)
            .bind(record.link)
            .bind(record.user)
            .bind(record.extracted_at)
            .bind(serde_json::to_string(&record.payload)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
