//! Selection-text conversion detector: finds at most one conversion implied
//! by a short piece of free text and the user's configured target units.
//!
//! Generalizes the unit converter's lax `RE_PATTERN_1/2/3` number+unit
//! capture style (match loosely, then validate by lookup rather than by a
//! rigid per-unit regex) from five hard-coded categories to the full
//! dimension set, and folds in the time converter's zone detection for the
//! timezone path.

use chrono::Timelike;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::convert::{self, get_default_target_unit};
use crate::currency::{detect_currency, extract_currency_symbol, extract_number, LocaleHints};
use crate::error::ConvertError;
use crate::registry::{self, Dimension};
use crate::settings::UserSettings;
use crate::timezone;

/// A single detected conversion, ready to display except for the currency
/// path, which still needs an async rate lookup from the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// A single-unit conversion, already formatted (e.g. `"3.05 m"`).
    Unit(String),
    /// A harmonized dimensions-3D conversion, one formatted string per axis.
    Dimensions([String; 3]),
    /// A converted time-of-day, already formatted (e.g. `"12:30 GMT-8"`).
    Timezone(String),
    /// A currency amount plus codes; the caller must resolve the rate.
    CurrencyPending { amount: f64, from: String, to: String },
}

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

static DIMENSIONS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(-?\d+(?:\.\d+)?)\s*([a-zA-Z°'\x{00b2}\x{00b3}]*)\s*[x\x{00d7}]\s*(-?\d+(?:\.\d+)?)\s*([a-zA-Z°'\x{00b2}\x{00b3}]*)\s*[x\x{00d7}]\s*(-?\d+(?:\.\d+)?)\s*([a-zA-Z°'\x{00b2}\x{00b3}]+)",
    )
    .unwrap()
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)?\s*([A-Za-z/_]{2,})?\b").unwrap());

const DIMENSION_ORDER: &[Dimension] = &[
    Dimension::Length,
    Dimension::Torque,
    Dimension::Area,
    Dimension::Speed,
    Dimension::Acceleration,
    Dimension::FlowRate,
    Dimension::Pressure,
    Dimension::Temperature,
    Dimension::Volume,
    Dimension::Weight,
];

/// Finds at most one conversion in `text` given the user's settings. The
/// caller is responsible for rejecting multi-line input before calling.
pub fn find_conversion(text: &str, settings: &UserSettings) -> Option<Conversion> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(conv) = try_dimensions(trimmed, settings) {
        return Some(conv);
    }
    if let Some(conv) = try_currency(trimmed, settings) {
        return Some(conv);
    }
    if let Some(conv) = try_timezone(trimmed, settings) {
        return Some(conv);
    }
    for &dim in DIMENSION_ORDER {
        if let Some(conv) = try_single_unit(trimmed, dim, settings) {
            return Some(conv);
        }
    }
    log::debug!("{}", ConvertError::NoMatch);
    None
}

/// Captures up to three whitespace-delimited words after a number and
/// returns the canonical unit for the longest prefix that resolves, mirroring
/// the unit converter's "match loosely, validate by lookup" style.
fn capture_unit_after(text: &str, start: usize) -> Option<&'static str> {
    let rest = &text[start..];
    let mut word_bounds: Vec<(usize, usize)> = Vec::new();
    let mut chars = rest.char_indices().peekable();
    while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        let word_start = idx;
        let mut word_end = idx;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            word_end = i + c.len_utf8();
            chars.next();
        }
        word_bounds.push((word_start, word_end));
        if word_bounds.len() == 3 {
            break;
        }
    }

    for take in (1..=word_bounds.len()).rev() {
        let first_start = word_bounds[0].0;
        let last_end = word_bounds[take - 1].1;
        let candidate = &rest[first_start..last_end];
        if let Some(unit) = registry::canonicalize(candidate) {
            return Some(unit);
        }
    }
    None
}

fn try_single_unit(text: &str, dim: Dimension, settings: &UserSettings) -> Option<Conversion> {
    let m = NUMBER_RE.find(text)?;
    let value: f64 = m.as_str().parse().ok()?;
    let unit = capture_unit_after(text, m.end())?;
    if registry::dimension_of(unit)? != dim {
        log::trace!("{}", ConvertError::DimensionMismatch);
        return None;
    }

    // lb/torque ambiguity: a bare "lb" is weight; "lb-ft"/"lb.in"/etc. already
    // canonicalize straight to the torque codes via the registry's alias
    // table, so dimension_of(unit) alone resolves the ambiguity here.
    convert_single_axis(value, unit, settings)
}

fn convert_single_axis(value: f64, unit: &str, settings: &UserSettings) -> Option<Conversion> {
    let dim = registry::dimension_of(unit)?;
    let target = get_default_target_unit(unit, settings)?;

    let converted = if dim == Dimension::Temperature {
        convert::convert_temperature(value, unit, &target)?
    } else {
        convert::convert(value, unit, &target)?
    };

    let (display_value, display_unit) = if dim == Dimension::Temperature {
        (converted, target.clone())
    } else {
        convert::get_best_unit(converted, dim, &target, Some(unit))
    };

    if display_unit == unit && (display_value - value).abs() < 0.01 {
        return None;
    }

    Some(Conversion::Unit(convert::format_result(display_value, &display_unit)))
}

fn try_dimensions(text: &str, settings: &UserSettings) -> Option<Conversion> {
    let caps = DIMENSIONS_RE.captures(text)?;
    let whole = caps.get(0)?;
    if (whole.as_str().len() as f64) < 0.8 * (text.len() as f64) {
        return None;
    }

    let shared_unit_raw = caps.get(6)?.as_str();
    let values: [f64; 3] = [
        caps.get(1)?.as_str().parse().ok()?,
        caps.get(3)?.as_str().parse().ok()?,
        caps.get(5)?.as_str().parse().ok()?,
    ];
    let unit_raws = [
        if caps.get(2).map(|m| !m.as_str().is_empty()).unwrap_or(false) {
            caps.get(2)?.as_str()
        } else {
            shared_unit_raw
        },
        if caps.get(4).map(|m| !m.as_str().is_empty()).unwrap_or(false) {
            caps.get(4)?.as_str()
        } else {
            shared_unit_raw
        },
        shared_unit_raw,
    ];

    let dim = registry::dimension_of(registry::canonicalize(unit_raws[0])?)?;
    let target = get_default_target_unit(registry::canonicalize(unit_raws[0])?, settings)?;

    let mut axis_converted = [0.0_f64; 3];
    let axis_units_owned: Vec<String> = {
        let mut v = Vec::with_capacity(3);
        for i in 0..3 {
            let source_unit = registry::canonicalize(unit_raws[i])?;
            if registry::dimension_of(source_unit)? != dim {
                return None;
            }
            let converted = convert::convert(values[i], source_unit, &target)?;
            let (value, unit) = convert::get_best_unit(converted, dim, &target, Some(source_unit));
            axis_converted[i] = value;
            v.push(unit);
        }
        v
    };
    let axis_units: [&str; 3] = [
        axis_units_owned[0].as_str(),
        axis_units_owned[1].as_str(),
        axis_units_owned[2].as_str(),
    ];

    let harmonized_unit = convert::harmonize_axes(axis_units, &target);
    let mut results = [String::new(), String::new(), String::new()];
    for i in 0..3 {
        let rebased = if axis_units[i] == harmonized_unit {
            axis_converted[i]
        } else {
            convert::convert(values[i], registry::canonicalize(unit_raws[i])?, &harmonized_unit)?
        };
        results[i] = convert::format_result(rebased, &harmonized_unit);
    }

    Some(Conversion::Dimensions(results))
}

fn try_currency(text: &str, settings: &UserSettings) -> Option<Conversion> {
    let symbol = extract_currency_symbol(text);
    if symbol.is_empty() {
        return None;
    }
    let hints = LocaleHints::default();
    let from = detect_currency(&symbol, &hints).or_else(|| {
        log::debug!("{}", ConvertError::UnknownCurrency(symbol.clone()));
        None
    })?;
    let amount = extract_number(text)?;

    let to = settings.currency_unit.to_ascii_uppercase();
    if from.eq_ignore_ascii_case(&to) {
        return None;
    }

    Some(Conversion::CurrencyPending { amount, from, to })
}

fn try_timezone(text: &str, settings: &UserSettings) -> Option<Conversion> {
    let caps = TIME_RE.captures(text)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }

    if let Some(ampm) = caps.get(3) {
        let is_pm = ampm.as_str().eq_ignore_ascii_case("pm");
        hour %= 12;
        if is_pm {
            hour += 12;
        }
    }

    let source_zone = caps
        .get(4)
        .map(|m| m.as_str().to_string())
        .or_else(|| timezone::detect_timezone_from_text(text))?;

    let target_zone = if settings.timezone_unit == "auto" {
        timezone::resolve_auto_zone_label()
    } else {
        settings.timezone_unit.clone()
    };

    if source_zone.eq_ignore_ascii_case(&target_zone) {
        return None;
    }

    if settings.timezone_unit == "auto" {
        let from_tz = timezone::resolve_zone(&source_zone)?;
        let local_offset = chrono::Local::now().offset().local_minus_utc();
        let naive = chrono::NaiveTime::from_hms_opt(hour, minute, 0)?;
        let today = chrono::Utc::now().date_naive();
        let naive_dt = today.and_time(naive);
        let source_dt = chrono::TimeZone::from_local_datetime(&from_tz, &naive_dt).single()?;
        let shifted = source_dt.naive_utc() + chrono::Duration::seconds(local_offset as i64);
        let label = timezone::format_gmt_offset(local_offset);
        let clock = timezone::format_clock(shifted.time().hour(), shifted.time().minute(), settings.is_12hr);
        return Some(Conversion::Timezone(format!("{clock} {label}")));
    }

    let result = timezone::convert_timezone(hour, minute, &source_zone, &target_zone)?;
    let clock = timezone::format_clock(result.hours, result.minutes, settings.is_12hr);
    Some(Conversion::Timezone(format!("{clock} {}", result.zone_label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> UserSettings {
        UserSettings::default()
    }

    #[test]
    fn detects_feet_to_meters() {
        let conv = find_conversion("10 ft", &settings()).unwrap();
        assert_eq!(conv, Conversion::Unit("3.05 m".to_string()));
    }

    #[test]
    fn detects_fahrenheit_to_celsius() {
        let conv = find_conversion("72 F", &settings()).unwrap();
        assert_eq!(conv, Conversion::Unit("22.22 \u{00b0}C".to_string()));
    }

    #[test]
    fn nanometer_stays_length_while_capital_nm_is_torque() {
        let mut s = settings();
        s.torque_unit = "lbft".to_string();
        assert!(matches!(find_conversion("500 nm", &s), Some(Conversion::Unit(_))));
        let conv = find_conversion("500 Nm", &s).unwrap();
        assert!(matches!(conv, Conversion::Unit(_)));
    }

    #[test]
    fn space_separated_lb_ft_is_torque_not_weight() {
        let mut s = settings();
        s.torque_unit = "Nm".to_string();
        let conv = find_conversion("5 lb ft", &s).unwrap();
        match conv {
            Conversion::Unit(rendered) => assert!(rendered.ends_with("N\u{22c5}m")),
            other => panic!("expected a torque unit conversion, got {other:?}"),
        }
    }

    #[test]
    fn suppresses_no_op_conversion() {
        let mut s = settings();
        s.length_unit = "m".to_string();
        assert_eq!(find_conversion("5 m", &s), None);
    }

    #[test]
    fn detects_dimensions_triple_with_per_axis_units_and_imperial_target() {
        let mut s = settings();
        s.length_unit = "ft".to_string();
        let conv = find_conversion("6m \u{d7} 4m \u{d7} 2.5m", &s).unwrap();
        match conv {
            Conversion::Dimensions(results) => {
                assert_eq!(results, ["19.69 ft", "13.12 ft", "8.2 ft"]);
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn detects_dimensions_triple_in_feet_converted_to_meters() {
        let conv = find_conversion("10 x 5 x 3 feet", &settings()).unwrap();
        match conv {
            Conversion::Dimensions(results) => {
                assert!(results.iter().all(|r| r.ends_with(" m")));
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn detects_dimensions_triple_with_shared_unit() {
        let conv = find_conversion("2 x 3 x 4 m", &settings()).unwrap();
        match conv {
            Conversion::Dimensions(results) => {
                assert_eq!(results, ["2 m", "3 m", "4 m"]);
            }
            other => panic!("expected dimensions, got {other:?}"),
        }
    }

    #[test]
    fn detects_currency_pending() {
        let mut s = settings();
        s.currency_unit = "EUR".to_string();
        let conv = find_conversion("$100", &s).unwrap();
        assert_eq!(
            conv,
            Conversion::CurrencyPending {
                amount: 100.0,
                from: "USD".to_string(),
                to: "EUR".to_string(),
            }
        );
    }

    #[test]
    fn suppresses_currency_when_target_equals_source() {
        let mut s = settings();
        s.currency_unit = "USD".to_string();
        assert_eq!(find_conversion("USD 100", &s), None);
    }

    #[test]
    fn detects_timezone_conversion() {
        let mut s = settings();
        s.timezone_unit = "PST".to_string();
        let conv = find_conversion("3:30 PM EST", &s).unwrap();
        assert_eq!(conv, Conversion::Timezone("12:30 PM PST".to_string()));
    }

    #[test]
    fn detects_timezone_conversion_in_24hr_mode() {
        let mut s = settings();
        s.timezone_unit = "PST".to_string();
        s.is_12hr = false;
        let conv = find_conversion("3:30 PM EST", &s).unwrap();
        assert_eq!(conv, Conversion::Timezone("12:30 PST".to_string()));
    }
}
