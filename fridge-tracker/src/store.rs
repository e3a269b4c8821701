use crate::types::{Item, Result, TrackerError, WastedItem};
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use fridge_core::EXPIRATION_DATE_FORMAT;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        expiration_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wasted_items (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL,
        name TEXT NOT NULL,
        expiration_date TEXT NOT NULL,
        date_chucked TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS recipes (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        recipe_name TEXT NOT NULL,
        brief_description TEXT NOT NULL,
        main_ingredients TEXT NOT NULL,
        estimated_cooking_time TEXT NOT NULL,
        difficulty_level TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS recipe_meta (
        id INTEGER PRIMARY KEY CHECK (id = 0),
        last_updated TEXT,
        fridge_items TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profile (
        id INTEGER PRIMARY KEY CHECK (id = 0),
        username TEXT NOT NULL,
        daily_calorie_intake INTEGER NOT NULL
    )
    "#,
];

/// Handle on the SQLite database shared by every store.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone)]
pub struct FridgeStore {
    db: SqlitePool,
}

impl FridgeStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // One connection: in-memory databases are per-connection, and the
        // CLI never issues concurrent writes.
        let mut pool_options = SqlitePoolOptions::new().max_connections(1);
        if is_memory_url(database_url) {
            // recycling the connection would drop the database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let db = pool_options.connect_with(options).await?;

        let store = Self { db };
        store.init_schema().await?;

        info!("Opened fridge database: {}", database_url);
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.db).await?;
        }
        debug!("Schema ready ({} tables)", SCHEMA.len());
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Stored timestamps keep millisecond precision.
pub(crate) fn truncate_timestamp(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(3)
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    truncate_timestamp(timestamp).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(EXPIRATION_DATE_FORMAT).to_string()
}

pub(crate) fn parse_stored_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, EXPIRATION_DATE_FORMAT)
        .map_err(|e| TrackerError::Corrupt(format!("expiration date {:?}: {}", text, e)))
}

pub(crate) fn parse_stored_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TrackerError::Corrupt(format!("timestamp {:?}: {}", text, e)))
}

pub(crate) fn parse_stored_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| TrackerError::Corrupt(format!("item id {:?}: {}", text, e)))
}

pub(crate) fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let id: String = row.try_get("id")?;
    let expiration_date: String = row.try_get("expiration_date")?;
    Ok(Item {
        id: parse_stored_id(&id)?,
        name: row.try_get("name")?,
        expiration_date: parse_stored_date(&expiration_date)?,
    })
}

pub(crate) fn wasted_item_from_row(row: &SqliteRow) -> Result<WastedItem> {
    let date_chucked: String = row.try_get("date_chucked")?;
    Ok(WastedItem {
        item: item_from_row(row)?,
        date_chucked: parse_stored_timestamp(&date_chucked)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn memory_urls_are_recognised() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://fridge?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://fridge.db"));
    }

    #[test]
    fn timestamps_are_written_with_milliseconds() {
        let at = Utc.with_ymd_and_hms(2024, 4, 3, 7, 0, 0).unwrap() + chrono::Duration::nanoseconds(123_456_789);
        let text = format_timestamp(at);
        assert_eq!(text, "2024-04-03T07:00:00.123Z");
        assert_eq!(parse_stored_timestamp(&text).unwrap(), truncate_timestamp(at));
    }

    #[tokio::test]
    async fn in_memory_store_keeps_its_schema() {
        let store = FridgeStore::in_memory().await.unwrap();
        let tables = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(tables, SCHEMA.len() as i64);
    }
}
