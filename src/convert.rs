//! Unit conversion and auto-scaling (display-unit selection).
//!
//! Generalizes the unit converter's `convert_value`/`format_number` helpers
//! from five ad-hoc categories to the full registry-driven dimension set.

use crate::registry::{self, Dimension, HopDirection};
use crate::settings::UserSettings;

const MAX_HOPS: u8 = 6;

/// Converts `value` from `from` to `to`. `None` if either unit is unknown or
/// they belong to different dimensions (temperature must go through
/// `convert_temperature`).
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let from_dim = registry::dimension_of(from)?;
    let to_dim = registry::dimension_of(to)?;
    if from_dim != to_dim || matches!(from_dim, Dimension::Temperature) {
        return None;
    }
    let from_factor = registry::ratio(from)?;
    let to_factor = registry::ratio(to)?;
    let base = value * from_factor;
    Some(base / to_factor)
}

/// Temperature conversion via the documented two-step path through Celsius.
pub fn convert_temperature(value: f64, from: &str, to: &str) -> Option<f64> {
    let celsius = match from {
        "c" => value,
        "f" => (value - 32.0) * 5.0 / 9.0,
        "k" => value - 273.15,
        _ => return None,
    };
    Some(match to {
        "c" => celsius,
        "f" => celsius * 9.0 / 5.0 + 32.0,
        "k" => celsius + 273.15,
        _ => return None,
    })
}

/// Picks a human-friendly display unit for `value` (already expressed in
/// `default_unit`) by walking the registry's ordered hop chain. Re-derives
/// the value from the original base quantity at each hop rather than
/// compounding an already-scaled value. Stops early if the next hop would
/// land back on `source_unit` (the unit the user originally entered).
pub fn get_best_unit(
    value: f64,
    dim: Dimension,
    default_unit: &str,
    source_unit: Option<&str>,
) -> (f64, String) {
    let Some(base_factor) = registry::ratio(default_unit) else {
        return (value, default_unit.to_string());
    };
    let base_value = value * base_factor;

    let mut current_unit = default_unit.to_string();
    let mut current_value = value;

    for _ in 0..MAX_HOPS {
        let rules = registry::scaling_rules(dim, &current_unit);
        let hop = rules.iter().find(|r| match r.direction {
            HopDirection::Up => current_value >= r.threshold,
            HopDirection::Down => current_value < r.threshold,
        });

        let Some(rule) = hop else { break };
        if Some(rule.target) == source_unit {
            break;
        }
        let Some(target_factor) = registry::ratio(rule.target) else {
            break;
        };
        current_value = base_value / target_factor;
        current_unit = rule.target.to_string();
    }

    (current_value, current_unit)
}

/// Rounds half-away-from-zero to two decimals and appends the unit's display name.
pub fn format_result(value: f64, unit: &str) -> String {
    format!("{} {}", round_2(value), registry::display_name(unit))
}

fn round_2(value: f64) -> String {
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let rounded = if value.is_sign_negative() && rounded != 0.0 {
        -rounded
    } else {
        rounded
    };

    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Looks up the user's configured target unit for the dimension that
/// `source_unit` belongs to, falling back to the registry default when the
/// dimension can't be resolved.
pub fn get_default_target_unit(source_unit: &str, settings: &UserSettings) -> Option<String> {
    let dim = registry::dimension_of(source_unit)?;
    let configured = match dim {
        Dimension::Length => &settings.length_unit,
        Dimension::Weight => &settings.weight_unit,
        Dimension::Temperature => &settings.temperature_unit,
        Dimension::Volume => &settings.volume_unit,
        Dimension::Area => &settings.area_unit,
        Dimension::Speed => &settings.speed_unit,
        Dimension::Acceleration => &settings.acceleration_unit,
        Dimension::FlowRate => &settings.flow_rate_unit,
        Dimension::Torque => &settings.torque_unit,
        Dimension::Pressure => &settings.pressure_unit,
        Dimension::Timezone | Dimension::Currency => return None,
    };
    Some(configured.clone())
}

/// Harmonizes the three axes of a dimensions-3D conversion: if all three
/// independently prefer the same non-target unit, use it; otherwise fall
/// back to the user's configured target unit.
pub fn harmonize_axes(axis_units: [&str; 3], target_unit: &str) -> String {
    if axis_units[0] == axis_units[1] && axis_units[1] == axis_units[2] {
        axis_units[0].to_string()
    } else {
        target_unit.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_within_tolerance() {
        for (from, to) in [("ft", "m"), ("kg", "lb"), ("l", "gal"), ("pa", "psi")] {
            let v = convert(1.0, from, to).unwrap();
            let back = convert(v, to, from).unwrap();
            assert!((back - 1.0).abs() < 1e-9, "{from}->{to}->{from} = {back}");
        }
    }

    #[test]
    fn cross_consistency_holds() {
        // convert(x, u, v) == convert(x, u, w) * ratio(v) / ratio(w) for any third unit w.
        let x = 7.5;
        let via_w = convert(x, "kg", "g").unwrap() * registry::ratio("g").unwrap() / registry::ratio("lb").unwrap();
        let direct = convert(x, "kg", "lb").unwrap();
        assert!((via_w - direct).abs() < 1e-6);
    }

    #[test]
    fn temperature_round_trips() {
        let f = convert_temperature(100.0, "c", "f").unwrap();
        let c = convert_temperature(f, "f", "c").unwrap();
        assert!((c - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ten_feet_to_meters() {
        let v = convert(10.0, "ft", "m").unwrap();
        assert_eq!(format_result(v, "m"), "3.05 m");
    }

    #[test]
    fn seventy_two_f_to_c() {
        let v = convert_temperature(72.0, "f", "c").unwrap();
        assert_eq!(format_result(v, "c"), "22.22 \u{00b0}C");
    }

    #[test]
    fn auto_sizes_small_length_down_to_millimeters() {
        let (v, unit) = get_best_unit(0.001, Dimension::Length, "m", None);
        assert_eq!(unit, "mm");
        assert_eq!(format_result(v, &unit), "1 mm");
    }

    #[test]
    fn auto_sizer_does_not_hop_back_to_source_unit() {
        // 5000 m would normally auto-size up to km, but the user entered km
        // in the first place, so the hop back to km must be suppressed.
        let (value, unit) = get_best_unit(5000.0, Dimension::Length, "m", Some("km"));
        assert_eq!(unit, "m");
        assert_eq!(value, 5000.0);
    }

    #[test]
    fn pressure_prefers_bar_over_kilopascal_above_threshold() {
        let (_, unit) = get_best_unit(150_000.0, Dimension::Pressure, "pa", None);
        assert_eq!(unit, "bar");
        let (_, unit) = get_best_unit(5_000.0, Dimension::Pressure, "pa", None);
        assert_eq!(unit, "kpa");
    }

    #[test]
    fn gallon_chain_hops_through_quart_pint_and_stops_at_cup() {
        let (value, unit) = get_best_unit(0.1, Dimension::Volume, "gal", None);
        assert_eq!(unit, "cup");
        assert!((value - 1.6).abs() < 1e-3);
    }

    #[test]
    fn gallon_chain_falls_all_the_way_to_fluid_ounces() {
        let (_, unit) = get_best_unit(0.01, Dimension::Volume, "gal", None);
        assert_eq!(unit, "floz");
    }

    #[test]
    fn harmonization_prefers_unanimous_axis_unit() {
        assert_eq!(harmonize_axes(["cm", "cm", "cm"], "m"), "cm");
        assert_eq!(harmonize_axes(["cm", "m", "cm"], "m"), "m");
    }
}
