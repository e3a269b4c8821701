use crate::store::{format_date, format_timestamp, wasted_item_from_row, FridgeStore};
use crate::types::{Result, WasteStats, WastedItem};
use chrono::{Local, TimeZone};
use tracing::info;

/// Append-only log of chucked items.
///
/// Entries are added by [`crate::Inventory::chuck_item`]; this type only
/// reads, clears or restores the log.
#[derive(Clone)]
pub struct WasteHistory {
    store: FridgeStore,
}

impl WasteHistory {
    pub fn new(store: FridgeStore) -> Self {
        Self { store }
    }

    pub async fn list_wasted(&self) -> Result<Vec<WastedItem>> {
        let rows = sqlx::query(
            "SELECT id, name, expiration_date, date_chucked FROM wasted_items ORDER BY seq",
        )
        .fetch_all(self.store.pool())
        .await?;

        rows.iter().map(wasted_item_from_row).collect()
    }

    pub async fn clear_wasted(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM wasted_items")
            .execute(self.store.pool())
            .await?;
        info!("Cleared {} wasted items", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Replaces the whole log. Timestamps are stored with millisecond
    /// precision, the same as entries written by `chuck_item`.
    pub async fn replace_wasted(&self, wasted_items: &[WastedItem]) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        write_wasted(&mut tx, wasted_items).await?;
        tx.commit().await?;

        info!("Replaced waste history with {} entries", wasted_items.len());
        Ok(())
    }

    /// Recomputed from the full history on every call.
    pub async fn waste_report_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<WasteStats> {
        let wasted_items = self.list_wasted().await?;
        Ok(fridge_core::aggregate_in(&wasted_items, tz))
    }

    pub async fn waste_report(&self) -> Result<WasteStats> {
        self.waste_report_in(&Local).await
    }
}

pub(crate) async fn write_wasted(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    wasted_items: &[WastedItem],
) -> Result<()> {
    sqlx::query("DELETE FROM wasted_items").execute(&mut **tx).await?;
    for wasted in wasted_items {
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
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
