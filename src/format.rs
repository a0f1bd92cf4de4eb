//! Human-readable renderings of link timestamps and URLs.

use chrono::{DateTime, Utc};

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Time left until `expires_at`, e.g. "in 3 hours", or "Expired".
pub fn format_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = expires_at - now;
    if diff.num_milliseconds() < 0 {
        return "Expired".to_string();
    }

    let hours = diff.num_hours();
    let days = hours / 24;
    if days > 0 {
        return format!("in {days} day{}", plural(days));
    }
    if hours > 0 {
        return format!("in {hours} hour{}", plural(hours));
    }

    let minutes = diff.num_minutes();
    format!("in {minutes} min{}", plural(minutes))
}

/// Age of `created_at`: "just now", "5m ago", "3h ago", "2d ago", then "Jan 5".
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - created_at;
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        created_at.format("%b %-d").to_string()
    }
}

/// Cut `url` to `max_len` characters, marking the cut with "...".
pub fn truncate_url(url: &str, max_len: usize) -> String {
    if url.chars().count() <= max_len {
        return url.to_string();
    }
    let mut truncated: String = url.chars().take(max_len).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_expiry() {
        let now = now();
        assert_eq!(format_expiry(now - Duration::seconds(1), now), "Expired");
        assert_eq!(format_expiry(now + Duration::days(3), now), "in 3 days");
        assert_eq!(format_expiry(now + Duration::hours(25), now), "in 1 day");
        assert_eq!(format_expiry(now + Duration::hours(5), now), "in 5 hours");
        assert_eq!(format_expiry(now + Duration::minutes(61), now), "in 1 hour");
        assert_eq!(format_expiry(now + Duration::minutes(30), now), "in 30 mins");
        assert_eq!(format_expiry(now + Duration::seconds(90), now), "in 1 min");
        assert_eq!(format_expiry(now, now), "in 0 min");
    }

    #[test]
    fn test_format_age() {
        let now = now();
        assert_eq!(format_age(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_age(now - Duration::days(2), now), "2d ago");
        assert_eq!(
            format_age(Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap(), now),
            "Jan 5"
        );
    }

    #[test]
    fn test_truncate_url() {
        assert_eq!(truncate_url("https://a.io", 50), "https://a.io");
        assert_eq!(truncate_url("https://example.com/long", 11), "https://exa...");
        assert_eq!(truncate_url("héllo", 2), "hé...");
    }
}
