//! Currency symbol/code extraction, locale-tolerant number parsing, and
//! ambiguous-symbol disambiguation.
//!
//! Grounded on the currency service's `parse_natural_input`/`parse_fuzzy_amount`
//! (regex-captured prefix/number/suffix, token-to-code match arms), generalized
//! into the full disambiguation cascade and the six-step locale number parser.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]?\d[\d.,' ]*\d|[+-]?\d").unwrap());

static KNOWN_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "USD", "EUR", "GBP", "JPY", "CNY", "AUD", "CAD", "CHF", "INR", "KRW", "MXN", "BRL", "ZAR",
        "SGD", "HKD", "SEK", "NOK", "DKK", "NZD", "RUB", "TRY", "PLN", "THB", "IDR", "MYR", "PHP",
        "VND", "AED", "SAR", "ILS", "EGP", "NGN", "ARS", "CLP", "COP", "PEN",
    ]
    .into_iter()
    .collect()
});

/// Ambiguous symbols map to every currency that plausibly uses them; the
/// disambiguator in `detect_currency` picks among these.
static SYMBOL_CANDIDATES: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("$", vec!["USD", "CAD", "AUD", "NZD", "HKD", "SGD", "MXN"]),
        ("\u{a3}", vec!["GBP"]),
        ("\u{20ac}", vec!["EUR"]),
        ("\u{a5}", vec!["JPY", "CNY"]),
        ("\u{20b9}", vec!["INR"]),
        ("\u{20a9}", vec!["KRW"]),
        ("\u{20bd}", vec!["RUB"]),
        ("\u{20ba}", vec!["TRY"]),
        ("R$", vec!["BRL"]),
        ("R", vec!["ZAR", "BRL"]),
        ("kr", vec!["SEK", "NOK", "DKK"]),
    ])
});

/// Display symbol per code, for codes whose symbol differs from the code
/// itself; looked up by `format_currency` to append a trailing symbol.
static CODE_SYMBOL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("USD", "$"),
        ("CAD", "$"),
        ("AUD", "$"),
        ("NZD", "$"),
        ("HKD", "$"),
        ("SGD", "$"),
        ("MXN", "$"),
        ("GBP", "\u{a3}"),
        ("EUR", "\u{20ac}"),
        ("JPY", "\u{a5}"),
        ("CNY", "\u{a5}"),
        ("INR", "\u{20b9}"),
        ("KRW", "\u{20a9}"),
        ("RUB", "\u{20bd}"),
        ("TRY", "\u{20ba}"),
        ("BRL", "R$"),
        ("ZAR", "R"),
        ("SEK", "kr"),
        ("NOK", "kr"),
        ("DKK", "kr"),
    ])
});

static COUNTRY_DEFAULT_CURRENCY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("US", "USD"),
        ("GB", "GBP"),
        ("CA", "CAD"),
        ("AU", "AUD"),
        ("NZ", "NZD"),
        ("JP", "JPY"),
        ("CN", "CNY"),
        ("IN", "INR"),
        ("SG", "SGD"),
        ("HK", "HKD"),
        ("CH", "CHF"),
        ("KR", "KRW"),
        ("RU", "RUB"),
        ("TR", "TRY"),
        ("BR", "BRL"),
        ("ZA", "ZAR"),
        ("DE", "EUR"),
        ("FR", "EUR"),
        ("ES", "EUR"),
        ("IT", "EUR"),
        ("NL", "EUR"),
    ])
});

static TLD_DEFAULT_CURRENCY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("us", "USD"),
        ("uk", "GBP"),
        ("ca", "CAD"),
        ("au", "AUD"),
        ("nz", "NZD"),
        ("jp", "JPY"),
        ("cn", "CNY"),
        ("in", "INR"),
        ("sg", "SGD"),
        ("hk", "HKD"),
        ("ch", "CHF"),
        ("kr", "KRW"),
        ("ru", "RUB"),
        ("tr", "TRY"),
        ("br", "BRL"),
        ("za", "ZAR"),
        ("de", "EUR"),
        ("fr", "EUR"),
    ])
});

/// Page-locale signals the disambiguator falls back through, in order.
#[derive(Debug, Clone, Default)]
pub struct LocaleHints<'a> {
    pub country_code: Option<&'a str>,
    pub language: Option<&'a str>,
    pub tld: Option<&'a str>,
}

/// Extracts a currency symbol or code from free text: a standalone
/// case-insensitive three-letter known code wins outright; otherwise strips
/// digits, whitespace, commas, periods, and apostrophes and takes everything
/// up to the first parenthesis.
pub fn extract_currency_symbol(text: &str) -> String {
    if let Ok(re) = Regex::new(r"\b([A-Za-z]{3})\b") {
        for caps in re.captures_iter(text) {
            let token = caps.get(1).unwrap().as_str().to_ascii_uppercase();
            if KNOWN_CODES.contains(token.as_str()) {
                return token;
            }
        }
    }

    let up_to_paren = text.split('(').next().unwrap_or(text);
    up_to_paren
        .chars()
        .filter(|c| !c.is_ascii_digit() && !c.is_whitespace() && *c != ',' && *c != '.' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses a locale-tolerant number, disambiguating `.`/`,` as thousands vs.
/// decimal separator per the documented six-step algorithm.
pub fn extract_number(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    let cleaned: String = m.as_str().chars().filter(|&c| c != '\'' && c != ' ').collect();

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');

    let normalized = if has_dot && has_comma {
        let last_dot = cleaned.rfind('.').unwrap();
        let last_comma = cleaned.rfind(',').unwrap();
        if last_dot > last_comma {
            cleaned.replace(',', "")
        } else {
            let without_dots = cleaned.replace('.', "");
            let comma_pos = without_dots.rfind(',').unwrap();
            format!("{}.{}", &without_dots[..comma_pos], &without_dots[comma_pos + 1..])
        }
    } else if has_comma {
        let comma_pos = cleaned.rfind(',').unwrap();
        let after = &cleaned[comma_pos + 1..];
        if after.len() == 2 && after.chars().all(|c| c.is_ascii_digit()) {
            format!("{}.{}", &cleaned[..comma_pos], after)
        } else {
            cleaned.replace(',', "")
        }
    } else if has_dot {
        let dot_count = cleaned.matches('.').count();
        if dot_count > 1 {
            let last_dot = cleaned.rfind('.').unwrap();
            let before = cleaned[..last_dot].replace('.', "");
            format!("{}.{}", before, &cleaned[last_dot + 1..])
        } else {
            let dot_pos = cleaned.find('.').unwrap();
            let before = &cleaned[..dot_pos];
            let after = &cleaned[dot_pos + 1..];
            if before.len() >= 4 && after.len() == 3 {
                format!("{}{}", before, after)
            } else {
                cleaned.clone()
            }
        }
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok()
}

/// Resolves a symbol or code to a currency code via the documented
/// cascade: direct known code, then page country code, then USD+English,
/// then TLD map, then first candidate.
pub fn detect_currency(symbol_or_code: &str, hints: &LocaleHints) -> Option<String> {
    let trimmed = symbol_or_code.trim();
    let upper = trimmed.to_ascii_uppercase();
    if upper.len() == 3 && KNOWN_CODES.contains(upper.as_str()) {
        return Some(upper);
    }

    let candidates = SYMBOL_CANDIDATES.get(trimmed)?;
    if candidates.len() == 1 {
        return Some(candidates[0].to_string());
    }

    if let Some(country) = hints.country_code {
        if let Some(code) = COUNTRY_DEFAULT_CURRENCY.get(country.to_ascii_uppercase().as_str()) {
            if candidates.contains(code) {
                return Some((*code).to_string());
            }
        }
    }

    if candidates.contains(&"USD") {
        let is_english = hints
            .language
            .map(|l| l.to_ascii_lowercase().starts_with("en"))
            .unwrap_or(false);
        if is_english {
            return Some("USD".to_string());
        }
    }

    if let Some(tld) = hints.tld {
        if let Some(code) = TLD_DEFAULT_CURRENCY.get(tld.to_ascii_lowercase().as_str()) {
            if candidates.contains(code) {
                return Some((*code).to_string());
            }
        }
    }

    candidates.first().map(|c| c.to_string())
}

fn add_thousands_separators(digits: &str, group_sep: char) -> String {
    let chars: Vec<char> = digits.chars().rev().collect();
    let mut out = String::new();
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(group_sep);
        }
        out.push(*ch);
    }
    out.chars().rev().collect()
}

/// Group and decimal separators for a BCP-47-ish locale tag (`"en-US"`,
/// `"de-DE"`, …). Unrecognized locales fall back to the `en-US` convention.
fn locale_separators(locale: &str) -> (char, char) {
    let lang = locale.split(['-', '_']).next().unwrap_or(locale).to_ascii_lowercase();
    match lang.as_str() {
        "de" | "es" | "it" | "pl" | "nl" | "ru" | "tr" | "pt" => ('.', ','),
        "fr" => (' ', ','),
        _ => (',', '.'),
    }
}

/// The display symbol for `code`, if it has one distinct from the code itself.
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    CODE_SYMBOL.get(code.to_ascii_uppercase().as_str()).copied()
}

/// Multiplies an amount by a rate using exact decimal arithmetic, the way
/// the currency service's `triangulate` does, rather than compounding f64
/// rounding error before display formatting.
pub fn convert_amount(amount: f64, rate: f64) -> Option<Decimal> {
    let amount = Decimal::try_from(amount).ok()?;
    let rate = Decimal::try_from(rate).ok()?;
    amount.checked_mul(rate)
}

/// Formats `"NNN.NN CCC SYM"`: two fraction digits, thousands grouped and
/// decimal-separated per `locale`, uppercased code, and a trailing display
/// symbol when the code has one distinct from itself.
pub fn format_currency(amount: Decimal, code: &str, locale: &str) -> String {
    let code = code.to_ascii_uppercase();
    let (group_sep, decimal_sep) = locale_separators(locale);

    let rounded = amount.round_dp(2).abs();
    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    // `round_dp(2)` fixes the scale at 2, so `Display` always renders exactly
    // two fraction digits ("85" -> "85.00"), which a numeric `{:02}` format
    // spec on `Decimal` itself is not guaranteed to do.
    let rendered = rounded.to_string();
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut out = format!(
        "{}{}{}{} {}",
        sign,
        add_thousands_separators(whole, group_sep),
        decimal_sep,
        fraction,
        code
    );
    if let Some(symbol) = currency_symbol(&code) {
        out.push(' ');
        out.push_str(symbol);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_thousands_vs_decimal_comma() {
        assert_eq!(extract_number("1,234"), Some(1234.0));
        assert_eq!(extract_number("1,23"), Some(1.23));
    }

    #[test]
    fn extracts_decimal_dot_without_quadruple_prefix() {
        assert_eq!(extract_number("1.234"), Some(1.234));
    }

    #[test]
    fn extracts_thousands_only_dot() {
        assert_eq!(extract_number("1234.567"), Some(1234567.0));
    }

    #[test]
    fn strips_all_but_last_dot_for_repeated_dots() {
        assert_eq!(extract_number("1.2.3"), Some(12.3));
        assert_eq!(extract_number("1.234.567"), Some(1234.567));
    }

    #[test]
    fn extracts_european_thousands_and_decimal() {
        assert_eq!(extract_number("1.234,56"), Some(1234.56));
        assert_eq!(extract_number("1,234.56"), Some(1234.56));
    }

    #[test]
    fn symbol_extraction_prefers_known_three_letter_code() {
        assert_eq!(extract_currency_symbol("100 USD"), "USD");
        assert_eq!(extract_currency_symbol("$100"), "$");
    }

    #[test]
    fn disambiguates_dollar_sign_via_country_hint() {
        let hints = LocaleHints {
            country_code: Some("CA"),
            ..Default::default()
        };
        assert_eq!(detect_currency("$", &hints), Some("CAD".to_string()));
    }

    #[test]
    fn disambiguates_dollar_sign_via_english_language_fallback() {
        let hints = LocaleHints {
            language: Some("en-GB"),
            ..Default::default()
        };
        assert_eq!(detect_currency("$", &hints), Some("USD".to_string()));
    }

    #[test]
    fn formats_amount_with_en_us_grouping_and_trailing_symbol() {
        assert_eq!(
            format_currency(Decimal::new(12345, 1), "eur", "en-US"),
            "1,234.50 EUR \u{20ac}"
        );
    }

    #[test]
    fn formats_amount_with_european_locale_separators() {
        assert_eq!(
            format_currency(Decimal::new(12345, 1), "eur", "de-DE"),
            "1.234,50 EUR \u{20ac}"
        );
    }

    #[test]
    fn omits_trailing_symbol_for_codes_without_one() {
        assert_eq!(format_currency(Decimal::new(1000, 2), "chf", "en-US"), "10.00 CHF");
    }

    #[test]
    fn converts_cold_cache_scenario_amount_to_exact_decimal() {
        let converted = convert_amount(100.0, 0.85).unwrap();
        assert_eq!(format_currency(converted, "eur", "en-US"), "85.00 EUR \u{20ac}");
    }
}
