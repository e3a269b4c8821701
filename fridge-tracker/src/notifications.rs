use crate::types::{ExpirationKind, Item};
use chrono::NaiveDate;
use fridge_core::{categorize, format_message};
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Receives expiration notices for display.
pub trait NotificationSink {
    fn notify(&mut self, message: &str, dedupe_key: &str, severity: ExpirationKind);
}

/// Sink that writes notices to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, message: &str, dedupe_key: &str, severity: ExpirationKind) {
        match severity {
            ExpirationKind::Expired => error!(key = dedupe_key, "{}", message),
            _ => warn!(key = dedupe_key, "{}", message),
        }
    }
}

/// Sink that prints notices for the command line.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&mut self, message: &str, _dedupe_key: &str, severity: ExpirationKind) {
        let marker = match severity {
            ExpirationKind::Expired => "[expired] ",
            ExpirationKind::ExpiringSoon => "[expiring]",
            ExpirationKind::Fresh => "[fresh]   ",
        };
        println!("{} {}", marker, message);
    }
}

pub fn dedupe_key(item: &Item, kind: ExpirationKind) -> String {
    format!("{}-{}", kind.as_str(), item.id)
}

/// Delivers expired and expiring-soon notices at most once per item and
/// status kind.
///
/// A key stays suppressed until its item disappears from the inventory or
/// moves to another status kind, at which point it is forgotten.
#[derive(Debug, Default)]
pub struct Notifier {
    notified: HashSet<String>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one notification cycle and returns how many notices were delivered.
    pub fn check<S: NotificationSink + ?Sized>(&mut self, items: &[Item], today: NaiveDate, sink: &mut S) -> usize {
        let categorized = categorize(items, today);

        let pending: Vec<(&Item, ExpirationKind)> = categorized
            .expired
            .iter()
            .map(|item| (item, ExpirationKind::Expired))
            .chain(categorized.expiring_soon.iter().map(|item| (item, ExpirationKind::ExpiringSoon)))
            .collect();

        let current: HashSet<String> = pending.iter().map(|(item, kind)| dedupe_key(item, *kind)).collect();
        self.notified.retain(|key| current.contains(key));

        let mut delivered = 0;
        for (item, kind) in pending {
            let key = dedupe_key(item, kind);
            if self.notified.contains(&key) {
                continue;
            }
            let message = format_message(item, today);
            sink.notify(&message, &key, kind);
            self.notified.insert(key);
            delivered += 1;
        }

        debug!("Notification cycle over {} items delivered {}", items.len(), delivered);
        delivered
    }

    pub fn is_notified(&self, key: &str) -> bool {
        self.notified.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<(String, String, ExpirationKind)>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&mut self, message: &str, dedupe_key: &str, severity: ExpirationKind) {
            self.delivered.push((message.to_string(), dedupe_key.to_string(), severity));
        }
    }

    fn date(s: &str) -> NaiveDate {
        fridge_core::parse_expiration_date(s).unwrap()
    }

    #[test]
    fn delivers_expired_and_expiring_but_not_fresh() {
        let today = date("2024-05-10");
        let items = vec![
            Item::new("Milk", date("2024-05-08")),
            Item::new("Eggs", date("2024-05-11")),
            Item::new("Rice", date("2025-01-01")),
        ];
        let mut sink = RecordingSink::default();

        let delivered = Notifier::new().check(&items, today, &mut sink);

        assert_eq!(delivered, 2);
        assert_eq!(sink.delivered[0].0, "Milk expired 2 days ago");
        assert_eq!(sink.delivered[0].1, format!("expired-{}", items[0].id));
        assert_eq!(sink.delivered[0].2, ExpirationKind::Expired);
        assert_eq!(sink.delivered[1].0, "Eggs expires in 1 day");
        assert_eq!(sink.delivered[1].1, format!("expiring-{}", items[1].id));
    }

    #[test]
    fn repeats_are_suppressed_within_the_same_kind() {
        let today = date("2024-05-10");
        let items = vec![Item::new("Milk", date("2024-05-08"))];
        let mut notifier = Notifier::new();
        let mut sink = RecordingSink::default();

        assert_eq!(notifier.check(&items, today, &mut sink), 1);
        assert_eq!(notifier.check(&items, today, &mut sink), 0);
        assert_eq!(notifier.check(&items, date("2024-05-11"), &mut sink), 0);
        assert_eq!(sink.delivered.len(), 1);
    }

    #[test]
    fn kind_change_resets_suppression() {
        let items = vec![Item::new("Yogurt", date("2024-05-10"))];
        let mut notifier = Notifier::new();
        let mut sink = RecordingSink::default();

        notifier.check(&items, date("2024-05-09"), &mut sink);
        notifier.check(&items, date("2024-05-11"), &mut sink);

        assert_eq!(sink.delivered.len(), 2);
        assert_eq!(sink.delivered[0].2, ExpirationKind::ExpiringSoon);
        assert_eq!(sink.delivered[1].2, ExpirationKind::Expired);
        assert!(!notifier.is_notified(&dedupe_key(&items[0], ExpirationKind::ExpiringSoon)));
    }

    #[test]
    fn log_sink_takes_the_same_notices() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let today = date("2024-05-10");
        let items = vec![
            Item::new("Milk", date("2024-05-08")),
            Item::new("Eggs", date("2024-05-12")),
        ];
        let mut notifier = Notifier::new();

        assert_eq!(notifier.check(&items, today, &mut LogSink), 2);
        assert!(notifier.is_notified(&dedupe_key(&items[0], ExpirationKind::Expired)));
        assert!(notifier.is_notified(&dedupe_key(&items[1], ExpirationKind::ExpiringSoon)));
        assert_eq!(notifier.check(&items, today, &mut LogSink), 0);
    }

    #[test]
    fn removed_items_are_forgotten() {
        let today = date("2024-05-10");
        let items = vec![Item::new("Milk", date("2024-05-08"))];
        let mut notifier = Notifier::new();
        let mut sink = RecordingSink::default();

        notifier.check(&items, today, &mut sink);
        assert_eq!(notifier.check(&[], today, &mut sink), 0);
        assert!(!notifier.is_notified(&dedupe_key(&items[0], ExpirationKind::Expired)));
        assert_eq!(notifier.check(&items, today, &mut sink), 1);
    }
}
