use crate::store::{format_date, format_timestamp, item_from_row, truncate_timestamp, FridgeStore};
use crate::types::{Item, ItemId, Result, TrackerError, WastedItem};
use chrono::{DateTime, Utc};
use fridge_core::parse_expiration_date;
use tracing::{debug, info};
use uuid::Uuid;

/// The canonical list of items currently in the fridge.
///
/// Names are unique ignoring case; items keep the order they were added in.
#[derive(Clone)]
pub struct Inventory {
    store: FridgeStore,
}

impl Inventory {
    pub fn new(store: FridgeStore) -> Self {
        Self { store }
    }

    /// Adds an item, or returns `Ok(None)` if one with the same name
    /// (ignoring case) is already stored.
    pub async fn add_item(&self, name: &str, expiration_date: &str) -> Result<Option<Item>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::EmptyName);
        }
        let expiration_date = parse_expiration_date(expiration_date).map_err(|_| TrackerError::InvalidDate {
            input: expiration_date.to_string(),
        })?;

        let mut tx = self.store.pool().begin().await?;

        let existing = sqlx::query_scalar::<_, String>("SELECT name FROM items")
            .fetch_all(&mut *tx)
            .await?;
        let lowered = name.to_lowercase();
        if existing.iter().any(|other| other.to_lowercase() == lowered) {
            debug!("Skipping duplicate item: {}", name);
            return Ok(None);
        }

        let item = Item {
            id: Uuid::new_v4(),
            name: name.to_string(),
            expiration_date,
        };
        insert_item(&mut tx, &item).await?;
        tx.commit().await?;

        info!("Added {} (expires {}) with ID: {}", item.name, item.expiration_date, item.id);
        Ok(Some(item))
    }

    pub async fn remove_item(&self, id: ItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.store.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(TrackerError::ItemNotFound { id });
        }
        info!("Removed item {}", id);
        Ok(())
    }

    pub async fn clear_items(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM items")
            .execute(self.store.pool())
            .await?;
        info!("Cleared {} items", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query("SELECT id, name, expiration_date FROM items ORDER BY seq")
            .fetch_all(self.store.pool())
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Replaces the whole inventory, keeping the given order.
    pub async fn replace_items(&self, items: &[Item]) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        write_items(&mut tx, items).await?;
        tx.commit().await?;

        info!("Replaced inventory with {} items", items.len());
        Ok(())
    }

    /// Moves an item into the waste history, stamped with `now`.
    ///
    /// Both writes happen in one transaction: the item is never in both
    /// places, or in neither.
    pub async fn chuck_item(&self, id: ItemId, now: DateTime<Utc>) -> Result<WastedItem> {
        let mut tx = self.store.pool().begin().await?;

        let row = sqlx::query("SELECT id, name, expiration_date FROM items WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TrackerError::ItemNotFound { id })?;
        let item = item_from_row(&row)?;

        let wasted = WastedItem::chucked(item, truncate_timestamp(now));
        sqlx::query(
            r#"
            INSERT INTO wasted_items (id, name, expiration_date, date_chucked)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(wasted.item.id.to_string())
        .bind(&wasted.item.name)
        .bind(format_date(wasted.item.expiration_date))
        .bind(format_timestamp(wasted.date_chucked))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Chucked {} ({})", wasted.item.name, id);
        Ok(wasted)
    }
}

/// Replaces the contents of the items table inside `tx`.
pub(crate) async fn write_items(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, items: &[Item]) -> Result<()> {
    sqlx::query("DELETE FROM items").execute(&mut **tx).await?;
    for item in items {
        insert_item(tx, item).await?;
    }
    Ok(())
}

async fn insert_item(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, item: &Item) -> Result<()> {
    sqlx::query("INSERT INTO items (id, name, expiration_date) VALUES (?1, ?2, ?3)")
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(format_date(item.expiration_date))
        .execute(&mut **tx)
        .await?;
    Ok(())
}
