//! Time utilities: best-effort parsing of page date text into UTC instants.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::text::normalize;

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("weekday regex")
});
static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal regex"));
static MERIDIEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)\s*([ap])\.?m\.?\b").expect("meridiem regex"));

const DATE_FORMATS: &[&str] = &[
    "%B %d %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
];

const TIME_FORMATS: &[&str] = &[
    " %I:%M%p",
    " %I:%M:%S%p",
    " %I%p",
    " %H:%M",
    " %H:%M:%S",
];

static DATETIME_FORMATS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut out = vec!["%Y-%m-%dT%H:%M:%S".to_string(), "%Y-%m-%dT%H:%M".to_string()];
    for d in DATE_FORMATS {
        for t in TIME_FORMATS {
            out.push(format!("{d}{t}"));
        }
    }
    out
});

/// Parse free-form date text (as rendered by a trade-history page) into UTC.
///
/// Text carrying its own offset (RFC 3339 / RFC 2822) is taken as-is; anything
/// zone-less is interpreted in `tz`. Unparseable input yields `None`.
pub fn parse_timestamp(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let text = normalize(text);
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&text) {
        return Some(dt.with_timezone(&Utc));
    }

    let cleaned = clean_date_text(&text);
    let naive = parse_naive(&cleaned)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// ISO-8601 with milliseconds and a `Z` suffix (`2024-01-01T00:00:00.000Z`).
pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an IANA timezone name (e.g. "Europe/Berlin").
pub fn parse_tz(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}

fn clean_date_text(text: &str) -> String {
    let s = WEEKDAY_RE.replace(text, "");
    let s = ORDINAL_RE.replace_all(&s, "$1");
    let s = MERIDIEM_RE.replace_all(&s, "${1}${2}M");
    let s = s.replace([',', '@'], " ").replace(" at ", " ");
    normalize(&s)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
