//! Expiration classification and waste statistics for a household fridge.
//!
//! Everything here is pure: callers pass plain data (and today's date) in
//! and get plain data back.

pub mod defs;
pub mod expiration;
pub mod waste;

pub use defs::{Categorized, ExpirationKind, ExpirationStatus, Item, ItemId, WasteStats, WastedItem};
pub use expiration::{
    EXPIRATION_DATE_FORMAT, EXPIRING_SOON_DAYS, categorize, classify, classify_now, format_message,
    parse_expiration_date, today,
};
pub use waste::{RECENT_WASTE_LIMIT, aggregate, aggregate_in};
