use chrono::{Datelike, Local, TimeZone};

use crate::defs::{WasteStats, WastedItem};

/// Upper bound on `WasteStats::recent_waste`.
pub const RECENT_WASTE_LIMIT: usize = 10;

/// Aggregates the waste history, grouping months in the local time zone.
pub fn aggregate(wasted_items: &[WastedItem]) -> WasteStats {
    aggregate_in(wasted_items, &Local)
}

/// Aggregates the waste history, grouping months in `tz`.
pub fn aggregate_in<Tz: TimeZone>(wasted_items: &[WastedItem], tz: &Tz) -> WasteStats {
    if wasted_items.is_empty() {
        return WasteStats::default();
    }

    let mut stats = WasteStats {
        total_wasted: wasted_items.len(),
        ..WasteStats::default()
    };

    for wasted in wasted_items {
        let local = wasted.date_chucked.with_timezone(tz).naive_local();
        let month_key = format!("{:04}-{:02}", local.year(), local.month());
        *stats.waste_by_month.entry(month_key).or_insert(0) += 1;
        *stats
            .common_wasted_items
            .entry(wasted.name().to_string())
            .or_insert(0) += 1;
    }

    // sort_by is stable, so equal timestamps keep their history order
    let mut recent = wasted_items.to_vec();
    recent.sort_by(|a, b| b.date_chucked.cmp(&a.date_chucked));
    recent.truncate(RECENT_WASTE_LIMIT);
    stats.recent_waste = recent;

    stats
}

impl WasteStats {
    /// Most frequently wasted names, highest count first, ties by name.
    pub fn top_wasted(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .common_wasted_items
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }

    pub fn months_descending(&self) -> Vec<(&str, usize)> {
        self.waste_by_month
            .iter()
            .rev()
            .map(|(month, count)| (month.as_str(), *count))
            .collect()
    }
}
