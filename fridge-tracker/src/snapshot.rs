use crate::types::{Item, Profile, Result, TrackerError, WastedItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Whole-state export used for backup and restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub wasted_items: Vec<WastedItem>,
    #[serde(default)]
    pub profile: Profile,
}

impl Snapshot {
    pub fn new(items: Vec<Item>, wasted_items: Vec<WastedItem>, profile: Profile) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            items,
            wasted_items,
            profile,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot of this or any older version.
    ///
    /// Version 0 inventories stored bare item names with no dates; those
    /// cannot be restored and come back empty.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(TrackerError::InvalidInput("snapshot must be a JSON object".to_string()));
        }

        let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if version > u64::from(SNAPSHOT_VERSION) {
            return Err(TrackerError::UnsupportedSnapshot {
                found: u32::try_from(version).unwrap_or(u32::MAX),
                supported: SNAPSHOT_VERSION,
            });
        }

        if version == 0 {
            let legacy_items = value
                .get("items")
                .and_then(Value::as_array)
                .is_some_and(|items| items.first().is_some_and(Value::is_string));
            if legacy_items {
                warn!("Dropping legacy name-only inventory from version 0 snapshot");
                value["items"] = Value::Array(Vec::new());
            }
            value["version"] = Value::from(SNAPSHOT_VERSION);
        }

        Ok(serde_json::from_value(value)?)
    }
}
