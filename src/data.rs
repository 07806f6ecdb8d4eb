use crate::record::CollectedRecord;
use crate::{utils, CollectorError, ResultTable, TableSink};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Books keyed by title. Distribution columns stay NULL for records that were
/// not enriched.
pub struct BookTable {
    name: String,
    pool: SqlitePool,
}

impl BookTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        let query = format!(
            r#"
                CREATE TABLE {} (
                    id TEXT PRIMARY KEY,
                    created_at DATETIME,
                    rating REAL,
                    rating_count INTEGER,
                    author TEXT,
                    link TEXT,
                    rating_5 INTEGER,
                    rating_4 INTEGER,
                    rating_3 INTEGER,
                    rating_2 INTEGER,
                    rating_1 INTEGER
                )
            "#,
            self.name
        );
        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn contains(&self, title: &str) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT 1 FROM {} WHERE id = ?", self.name);
        Ok(sqlx::query(&query)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.name);
        sqlx::query(&query).fetch_one(&self.pool).await?.try_get(0)
    }

    async fn insert(&self, record: &CollectedRecord) -> Result<(), sqlx::Error> {
        let book = record.accepted();
        let distribution = record.rating_distribution();
        let stars = |level: u8| distribution.map(|d| to_i64(d.get(level)));

        let query = format!(
            r#"INSERT INTO {} (
                id, created_at, rating, rating_count, author, link,
                rating_5, rating_4, rating_3, rating_2, rating_1
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.name
        );
        sqlx::query(&query)
            .bind(book.title())
            .bind(utils::get_now())
            .bind(book.rating_value())
            .bind(to_i64(book.rating_count()))
            .bind(book.author())
            .bind(book.detail_link())
            .bind(stars(5))
            .bind(stars(4))
            .bind(stars(3))
            .bind(stars(2))
            .bind(stars(1))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Stores the result table into `<name>.db`, table `<name>_results`. Titles
/// already stored by an earlier run are left untouched.
pub struct SqliteSink {
    pub name: String,
    pub results: BookTable,
}

impl SqliteSink {
    pub async fn new(name: &str) -> Result<SqliteSink, CollectorError> {
        let opt = SqliteConnectOptions::new()
            .filename(format!("{}.db", name))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let results = BookTable {
            name: format!("{}_results", name),
            pool,
        };

        if utils::is_table_exists(results.pool(), results.name()).await? {
            tracing::debug!("Use table {}", results.name());
        } else {
            tracing::debug!("Create table {}", results.name());
            results.create().await?;
        }

        Ok(SqliteSink {
            name: name.to_string(),
            results,
        })
    }
}

#[async_trait::async_trait]
impl TableSink for SqliteSink {
    async fn write(&self, table: &ResultTable) -> Result<(), CollectorError> {
        let mut skipped = 0;
        for record in table.records() {
            if self.results.contains(record.title()).await? {
                tracing::debug!("Already stored: {}", record.title());
                skipped += 1;
                continue;
            }
            self.results.insert(record).await?;
        }
        tracing::debug!(
            "{} rows in {} ({} already stored)",
            self.results.count().await?,
            self.results.name(),
            skipped
        );
        Ok(())
    }
}
