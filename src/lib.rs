pub mod convert;
pub mod currency;
pub mod detector;
pub mod error;
pub mod rate_cache;
pub mod registry;
pub mod settings;
pub mod timezone;

pub use convert::{convert, convert_temperature, format_result, get_best_unit};
pub use detector::{find_conversion, Conversion};
pub use error::ConvertError;
pub use rate_cache::{RateCacheConfig, RateCacheError, RateCacheService, RateResult};
pub use registry::{Dimension, Unit};
pub use settings::UserSettings;

/// Combines a detected currency conversion with its resolved rate and
/// renders the final display string, the way C2/C3 finish formatting once
/// C4 has detected a candidate and C5 has resolved its rate. `locale` drives
/// `format_currency`'s grouping (e.g. `"en-US"`, `"de-DE"`). Returns `None`
/// if `pending` is not a `Conversion::CurrencyPending`.
pub fn format_currency_conversion(pending: &Conversion, rate: &RateResult, locale: &str) -> Option<String> {
    match pending {
        Conversion::CurrencyPending { amount, to, .. } => {
            let converted = currency::convert_amount(*amount, rate.rate)?;
            Some(currency::format_currency(converted, to, locale))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_resolved_currency_conversion_end_to_end() {
        let settings = UserSettings {
            currency_unit: "EUR".to_string(),
            ..UserSettings::default()
        };
        let pending = find_conversion("$100", &settings).unwrap();
        let rate = RateResult {
            rate: 0.85,
            used_fallback: false,
            from_cache: false,
            stale: false,
        };
        assert_eq!(
            format_currency_conversion(&pending, &rate, "en-US"),
            Some("85.00 EUR \u{20ac}".to_string())
        );
    }

    #[test]
    fn returns_none_for_a_non_currency_conversion() {
        let conv = Conversion::Unit("3.05 m".to_string());
        let rate = RateResult {
            rate: 1.0,
            used_fallback: false,
            from_cache: false,
            stale: false,
        };
        assert_eq!(format_currency_conversion(&conv, &rate, "en-US"), None);
    }
}
