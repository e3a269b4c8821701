use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type ItemId = Uuid;

/// One food item currently in the fridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub expiration_date: NaiveDate,
}

impl Item {
    pub fn new(name: impl Into<String>, expiration_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            expiration_date,
        }
    }
}

/// An item that was thrown away, kept in the waste history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastedItem {
    #[serde(flatten)]
    pub item: Item,
    pub date_chucked: DateTime<Utc>,
}

impl WastedItem {
    pub fn chucked(item: Item, date_chucked: DateTime<Utc>) -> Self {
        Self { item, date_chucked }
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationKind {
    Expired,
    ExpiringSoon,
    Fresh,
}

impl ExpirationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationKind::Expired => "expired",
            ExpirationKind::ExpiringSoon => "expiring",
            ExpirationKind::Fresh => "fresh",
        }
    }
}

impl std::fmt::Display for ExpirationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived on every query, never stored.
///
/// `is_expired` and `is_expiring_soon` are never both true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationStatus {
    pub is_expired: bool,
    pub is_expiring_soon: bool,
    pub days_until_expiration: i64,
}

impl ExpirationStatus {
    pub fn kind(&self) -> ExpirationKind {
        if self.is_expired {
            ExpirationKind::Expired
        } else if self.is_expiring_soon {
            ExpirationKind::ExpiringSoon
        } else {
            ExpirationKind::Fresh
        }
    }
}

/// Report-time statistics over the waste history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteStats {
    pub total_wasted: usize,
    /// Keyed by `YYYY-MM`.
    pub waste_by_month: BTreeMap<String, usize>,
    /// Exact, case-sensitive name match.
    pub common_wasted_items: BTreeMap<String, usize>,
    /// Newest first, at most ten entries.
    pub recent_waste: Vec<WastedItem>,
}

/// The three buckets produced by [`crate::categorize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorized {
    pub expired: Vec<Item>,
    pub expiring_soon: Vec<Item>,
    pub fresh: Vec<Item>,
}

impl Categorized {
    pub fn len(&self) -> usize {
        self.expired.len() + self.expiring_soon.len() + self.fresh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wasted_item_serializes_flat_with_camel_case_keys() {
        let item = Item::new("Milk", NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        let wasted = WastedItem::chucked(item.clone(), Utc.with_ymd_and_hms(2024, 1, 5, 18, 0, 0).unwrap());

        let value = serde_json::to_value(&wasted).unwrap();
        assert_eq!(value["name"], "Milk");
        assert_eq!(value["expirationDate"], "2024-01-03");
        assert_eq!(value["id"], item.id.to_string());
        assert!(value.get("item").is_none());

        let back: WastedItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, wasted);
    }
}
