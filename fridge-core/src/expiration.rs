use chrono::{Local, NaiveDate};

use crate::defs::{Categorized, ExpirationStatus, Item};

/// Items expiring within this many days (inclusive) count as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

pub const EXPIRATION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Classifies an expiration date against `today`.
///
/// Both sides are calendar dates, so time of day never matters and a
/// same-day expiration yields `0`.
pub fn classify(expiration_date: NaiveDate, today: NaiveDate) -> ExpirationStatus {
    let days_until_expiration = expiration_date.signed_duration_since(today).num_days();

    ExpirationStatus {
        is_expired: days_until_expiration < 0,
        is_expiring_soon: (0..=EXPIRING_SOON_DAYS).contains(&days_until_expiration),
        days_until_expiration,
    }
}

/// Same as [`classify`] with today taken from the local clock.
pub fn classify_now(expiration_date: NaiveDate) -> ExpirationStatus {
    classify(expiration_date, today())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Stable partition of `items` into expired, expiring-soon and fresh.
pub fn categorize(items: &[Item], today: NaiveDate) -> Categorized {
    let mut categorized = Categorized::default();

    for item in items {
        let status = classify(item.expiration_date, today);
        if status.is_expired {
            categorized.expired.push(item.clone());
        } else if status.is_expiring_soon {
            categorized.expiring_soon.push(item.clone());
        } else {
            categorized.fresh.push(item.clone());
        }
    }

    categorized
}

/// Human-readable expiration notice, always based on a fresh classification.
pub fn format_message(item: &Item, today: NaiveDate) -> String {
    let status = classify(item.expiration_date, today);

    if status.is_expired {
        let days_past = status.days_until_expiration.abs();
        return format!("{} expired {} {} ago", item.name, days_past, day_word(days_past));
    }

    if status.is_expiring_soon {
        if status.days_until_expiration == 0 {
            return format!("{} expires today!", item.name);
        }
        let days = status.days_until_expiration;
        return format!("{} expires in {} {}", item.name, days, day_word(days));
    }

    format!("{} is fresh", item.name)
}

fn day_word(days: i64) -> &'static str {
    if days == 1 { "day" } else { "days" }
}

/// Strict `YYYY-MM-DD` parse, meant for item creation.
pub fn parse_expiration_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), EXPIRATION_DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::ExpirationKind;
    use chrono::Days;

    fn date(s: &str) -> NaiveDate {
        parse_expiration_date(s).unwrap()
    }

    fn item(name: &str, expiration_date: NaiveDate) -> Item {
        Item::new(name, expiration_date)
    }

    #[test]
    fn same_day_is_expiring_soon_not_expired() {
        let today = date("2024-05-10");
        let status = classify(today, today);
        assert_eq!(status.days_until_expiration, 0);
        assert!(status.is_expiring_soon);
        assert!(!status.is_expired);
    }

    #[test]
    fn window_includes_three_days_but_not_four() {
        let today = date("2024-05-10");

        let three = classify(today + Days::new(3), today);
        assert!(three.is_expiring_soon);
        assert!(!three.is_expired);

        let four = classify(today + Days::new(4), today);
        assert_eq!(four.days_until_expiration, 4);
        assert!(!four.is_expiring_soon);
        assert!(!four.is_expired);
    }

    #[test]
    fn yesterday_is_expired() {
        let today = date("2024-05-10");
        let status = classify(today - Days::new(1), today);
        assert!(status.is_expired);
        assert!(!status.is_expiring_soon);
        assert_eq!(status.days_until_expiration, -1);
    }

    #[test]
    fn classification_spans_month_and_year_boundaries() {
        assert_eq!(classify(date("2025-01-02"), date("2024-12-30")).days_until_expiration, 3);
        assert_eq!(classify(date("2024-02-28"), date("2024-03-01")).days_until_expiration, -2);
    }

    #[test]
    fn categorize_is_a_stable_lossless_partition() {
        let today = date("2024-05-10");
        let items = vec![
            item("Milk", date("2024-05-09")),
            item("Eggs", date("2024-05-20")),
            item("Cheese", date("2024-05-10")),
            item("Yogurt", date("2024-04-01")),
            item("Butter", date("2024-05-13")),
            item("Ham", date("2024-05-14")),
        ];

        let categorized = categorize(&items, today);
        assert_eq!(categorized.len(), items.len());

        let names = |bucket: &[Item]| bucket.iter().map(|i| i.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&categorized.expired), vec!["Milk", "Yogurt"]);
        assert_eq!(names(&categorized.expiring_soon), vec!["Cheese", "Butter"]);
        assert_eq!(names(&categorized.fresh), vec!["Eggs", "Ham"]);

        for i in &categorized.expired {
            assert!(classify(i.expiration_date, today).is_expired);
        }
        for i in &categorized.expiring_soon {
            let status = classify(i.expiration_date, today);
            assert!(status.is_expiring_soon && !status.is_expired);
        }
        for i in &categorized.fresh {
            let status = classify(i.expiration_date, today);
            assert!(!status.is_expired && !status.is_expiring_soon);
        }
    }

    #[test]
    fn classify_now_reads_the_local_clock() {
        let far = today() + Days::new(30);
        assert_eq!(classify_now(far).kind(), ExpirationKind::Fresh);

        let past = today() - Days::new(30);
        assert_eq!(classify_now(past).kind(), ExpirationKind::Expired);
    }

    #[test]
    fn categorize_empty_input() {
        let categorized = categorize(&[], date("2024-05-10"));
        assert!(categorized.is_empty());
    }

    #[test]
    fn messages_pluralize_days() {
        let today = date("2024-05-10");
        assert_eq!(format_message(&item("Milk", date("2024-05-11")), today), "Milk expires in 1 day");
        assert_eq!(format_message(&item("Milk", date("2024-05-12")), today), "Milk expires in 2 days");
        assert_eq!(format_message(&item("Milk", date("2024-05-10")), today), "Milk expires today!");
        assert_eq!(format_message(&item("Milk", date("2024-05-09")), today), "Milk expired 1 day ago");
        assert_eq!(format_message(&item("Milk", date("2024-05-05")), today), "Milk expired 5 days ago");
        assert_eq!(format_message(&item("Milk", date("2024-06-01")), today), "Milk is fresh");
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        assert!(parse_expiration_date("2024-02-30").is_err());
        assert!(parse_expiration_date("tomorrow").is_err());
        assert_eq!(parse_expiration_date(" 2024-02-29 ").unwrap(), date("2024-02-29"));
    }
}
