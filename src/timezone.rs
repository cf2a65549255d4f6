//! Timezone abbreviation resolution and offset arithmetic for the
//! time-of-day conversion path.
//!
//! Grounded on the time converter's `TIMEZONE_ABBREVIATIONS` table and
//! `detect_timezone_from_text`/`format_utc_offset` helpers, generalized from
//! a single Tauri command into a pure library function.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Abbreviation to IANA zone id. Ambiguous abbreviations (CST, IST) resolve
/// to the most common reading, matching the teacher's documented defaults.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("EST", "America/New_York"),
    ("EDT", "America/New_York"),
    ("PST", "America/Los_Angeles"),
    ("PDT", "America/Los_Angeles"),
    ("CST", "America/Chicago"),
    ("CDT", "America/Chicago"),
    ("MST", "America/Denver"),
    ("MDT", "America/Denver"),
    ("GMT", "Europe/London"),
    ("UTC", "UTC"),
    ("CET", "Europe/Paris"),
    ("CEST", "Europe/Paris"),
    ("JST", "Asia/Tokyo"),
    ("KST", "Asia/Seoul"),
    ("IST", "Asia/Kolkata"),
    ("AEST", "Australia/Sydney"),
    ("AEDT", "Australia/Sydney"),
    ("NZST", "Pacific/Auckland"),
    ("NZDT", "Pacific/Auckland"),
    ("WAT", "Africa/Lagos"),
    ("SAST", "Africa/Johannesburg"),
    ("BRT", "America/Sao_Paulo"),
    ("ART", "America/Argentina/Buenos_Aires"),
];

pub struct TimeResult {
    pub hours: u32,
    pub minutes: u32,
    pub zone_label: String,
}

/// Resolves an abbreviation (case-insensitive) or a bare IANA id to a `Tz`.
pub fn resolve_zone(name: &str) -> Option<Tz> {
    let upper = name.trim().to_ascii_uppercase();
    if let Some((_, iana)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == upper) {
        return iana.parse().ok();
    }
    name.trim().parse().ok()
}

/// Converts a naive `HH:MM` time in `from_zone` into `to_zone`, anchored to
/// today's date. `None` if either zone can't be resolved.
pub fn convert_timezone(hour: u32, minute: u32, from_zone: &str, to_zone: &str) -> Option<TimeResult> {
    let from_tz = resolve_zone(from_zone)?;
    let to_tz = resolve_zone(to_zone)?;

    let today = Utc::now().date_naive();
    let naive_time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let naive_dt = NaiveDate::from_ymd_opt(today.year(), today.month(), today.day())?.and_time(naive_time);

    let source_dt = from_tz.from_local_datetime(&naive_dt).single()?;
    let target_dt = source_dt.with_timezone(&to_tz);

    Some(TimeResult {
        hours: target_dt.hour(),
        minutes: target_dt.minute(),
        zone_label: to_zone.to_string(),
    })
}

/// Formats an hour/minute pair as `"HH:MM"` (24-hour) or `"H:MM AM/PM"`
/// (12-hour), matching `UserSettings::is_12hr`.
pub fn format_clock(hours: u32, minutes: u32, is_12hr: bool) -> String {
    if is_12hr {
        let period = if hours >= 12 { "PM" } else { "AM" };
        let display_hour = match hours % 12 {
            0 => 12,
            h => h,
        };
        format!("{display_hour}:{minutes:02} {period}")
    } else {
        format!("{hours:02}:{minutes:02}")
    }
}

/// Formats a signed UTC offset in seconds as `"GMT+N"` / `"GMT-N"` (whole
/// hours only; spec's "auto" zone label is coarse by design).
pub fn format_gmt_offset(offset_seconds: i32) -> String {
    let hours = offset_seconds / 3600;
    if hours >= 0 {
        format!("GMT+{hours}")
    } else {
        format!("GMT{hours}")
    }
}

/// Resolves `"auto"` to a `GMT±N` label using the local machine's current
/// UTC offset. The reverse mapping from offset to zone name is ambiguous
/// (many zones share the same offset), so a coarse `GMT±N` label is the
/// documented, deliberately imprecise answer.
pub fn resolve_auto_zone_label() -> String {
    let local_offset = chrono::Local::now().offset().local_minus_utc();
    format_gmt_offset(local_offset)
}

/// Multi-strategy timezone detection over free text: IANA id, abbreviation,
/// then city/keyword — in that priority order.
pub fn detect_timezone_from_text(text: &str) -> Option<String> {
    let text_lower = text.to_lowercase();

    if let Ok(re) = regex::Regex::new(r"\b([A-Z][a-zA-Z_]+/[A-Z][a-zA-Z_]+)\b") {
        if let Some(caps) = re.captures(text) {
            let candidate = caps.get(1)?.as_str();
            if candidate.parse::<Tz>().is_ok() {
                return Some(candidate.to_string());
            }
        }
    }

    for (abbr, iana) in ABBREVIATIONS {
        let pattern = format!(r"\b{}\b", abbr.to_lowercase());
        if let Ok(re) = regex::Regex::new(&pattern) {
            if re.is_match(&text_lower) {
                return Some((*iana).to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn est_to_pst_is_three_hours_behind() {
        let r = convert_timezone(15, 30, "EST", "PST").unwrap();
        assert_eq!((r.hours, r.minutes), (12, 30));
    }

    #[test]
    fn detects_abbreviation_in_free_text() {
        assert_eq!(
            detect_timezone_from_text("3:30 PM EST"),
            Some("America/New_York".to_string())
        );
    }

    #[test]
    fn formats_gmt_offsets() {
        assert_eq!(format_gmt_offset(3600 * 5), "GMT+5");
        assert_eq!(format_gmt_offset(-3600 * 8), "GMT-8");
        assert_eq!(format_gmt_offset(0), "GMT+0");
    }

    #[test]
    fn formats_clock_in_12hr_and_24hr() {
        assert_eq!(format_clock(12, 30, true), "12:30 PM");
        assert_eq!(format_clock(0, 5, true), "12:05 AM");
        assert_eq!(format_clock(15, 30, true), "3:30 PM");
        assert_eq!(format_clock(15, 30, false), "15:30");
    }
}
