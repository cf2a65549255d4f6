//! Static tables backing every dimension: canonical units, their base-unit
//! factors, surface-form aliases, display names, and auto-sizing hop rules.
//!
//! Mirrors the `UNIT_REGISTRY: Lazy<HashMap<...>>` pattern the unit converter
//! used for five categories, generalized to the full dimension set.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub type Unit = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Weight,
    Temperature,
    Volume,
    Area,
    Speed,
    Acceleration,
    FlowRate,
    Torque,
    Pressure,
    Timezone,
    Currency,
}

#[derive(Debug, Clone, Copy)]
pub struct UnitInfo {
    pub dimension: Dimension,
    /// Multiply a value in this unit by this factor to get the value in the
    /// dimension's base unit. The base unit itself has `base_factor = 1.0`.
    pub base_factor: f64,
    pub display_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
pub struct ScalingRule {
    pub threshold: f64,
    pub direction: HopDirection,
    pub target: &'static str,
}

macro_rules! unit {
    ($map:expr, $code:expr, $dim:expr, $factor:expr, $name:expr) => {
        $map.insert(
            $code,
            UnitInfo {
                dimension: $dim,
                base_factor: $factor,
                display_name: $name,
            },
        );
    };
}

static UNITS: Lazy<HashMap<&'static str, UnitInfo>> = Lazy::new(|| {
    use Dimension::*;
    let mut m = HashMap::new();

    // Length, base: meter
    unit!(m, "m", Length, 1.0, "m");
    unit!(m, "cm", Length, 0.01, "cm");
    unit!(m, "mm", Length, 0.001, "mm");
    unit!(m, "um", Length, 0.000_001, "\u{00b5}m");
    unit!(m, "nm", Length, 0.000_000_001, "nm");
    unit!(m, "km", Length, 1000.0, "km");
    unit!(m, "in", Length, 0.0254, "in");
    unit!(m, "ft", Length, 0.3048, "ft");
    unit!(m, "yd", Length, 0.9144, "yd");
    unit!(m, "mi", Length, 1609.344, "mi");

    // Weight, base: kilogram
    unit!(m, "kg", Weight, 1.0, "kg");
    unit!(m, "g", Weight, 0.001, "g");
    unit!(m, "mg", Weight, 0.000_001, "mg");
    unit!(m, "lb", Weight, 0.453_592, "lb");
    unit!(m, "oz", Weight, 0.028_349_5, "oz");
    unit!(m, "t", Weight, 1000.0, "t");

    // Temperature units are additive-formula only; registered here so
    // `dimension_of`/`canonicalize` still resolve them, but `ratio` is
    // meaningless for them and callers must use `convert::convert_temperature`.
    unit!(m, "c", Temperature, 1.0, "\u{00b0}C");
    unit!(m, "f", Temperature, 1.0, "\u{00b0}F");
    unit!(m, "k", Temperature, 1.0, "K");

    // Volume, base: liter
    unit!(m, "l", Volume, 1.0, "L");
    unit!(m, "ml", Volume, 0.001, "mL");
    unit!(m, "gal", Volume, 3.785_41, "gal");
    unit!(m, "qt", Volume, 0.946_353, "qt");
    unit!(m, "pt", Volume, 0.473_176, "pt");
    unit!(m, "cup", Volume, 0.236_588, "cup");
    unit!(m, "floz", Volume, 0.029_573_5, "fl oz");
    unit!(m, "tbsp", Volume, 0.014_786_8, "tbsp");
    unit!(m, "tsp", Volume, 0.004_928_92, "tsp");

    // Area, base: square meter
    unit!(m, "m2", Area, 1.0, "m\u{00b2}");
    unit!(m, "cm2", Area, 0.0001, "cm\u{00b2}");
    unit!(m, "mm2", Area, 0.000_001, "mm\u{00b2}");
    unit!(m, "km2", Area, 1_000_000.0, "km\u{00b2}");
    unit!(m, "ft2", Area, 0.092_903_0, "ft\u{00b2}");
    unit!(m, "in2", Area, 0.000_645_16, "in\u{00b2}");
    unit!(m, "acre", Area, 4046.856_42, "acre");

    // Speed, base: meter/second
    unit!(m, "ms", Speed, 1.0, "m/s");
    unit!(m, "kmh", Speed, 1.0 / 3.6, "km/h");
    unit!(m, "mph", Speed, 0.447_04, "mph");
    unit!(m, "fts", Speed, 0.3048, "ft/s");
    unit!(m, "kn", Speed, 0.514_444, "kn");
    unit!(m, "mach", Speed, 343.0, "Mach");

    // Acceleration, base: meter/second^2
    unit!(m, "ms2", Acceleration, 1.0, "m/s\u{00b2}");
    unit!(m, "fts2", Acceleration, 0.3048, "ft/s\u{00b2}");
    unit!(m, "gforce", Acceleration, 9.806_65, "g");

    // Flow rate, base: liter/minute
    unit!(m, "lmin", FlowRate, 1.0, "L/min");
    unit!(m, "mls", FlowRate, 0.06, "mL/s");
    unit!(m, "m3h", FlowRate, 16.666_7, "m\u{00b3}/h");
    unit!(m, "galmin", FlowRate, 3.785_41, "gal/min");
    unit!(m, "cfm", FlowRate, 28.316_8, "CFM");
    unit!(m, "cfs", FlowRate, 1699.01, "CFS");

    // Torque, base: newton-meter. Canonical code is case-sensitive ("Nm");
    // see `canonicalize` for the nm/Nm disambiguation.
    unit!(m, "Nm", Torque, 1.0, "N\u{22c5}m");
    unit!(m, "lbft", Torque, 1.355_82, "lb\u{22c5}ft");
    unit!(m, "lbin", Torque, 0.112_985, "lb\u{22c5}in");
    unit!(m, "kgm", Torque, 9.806_65, "kgf\u{22c5}m");
    unit!(m, "ozin", Torque, 0.007_061_55, "oz\u{22c5}in");

    // Pressure, base: pascal
    unit!(m, "pa", Pressure, 1.0, "Pa");
    unit!(m, "kpa", Pressure, 1000.0, "kPa");
    unit!(m, "mpa", Pressure, 1_000_000.0, "MPa");
    unit!(m, "bar", Pressure, 100_000.0, "bar");
    unit!(m, "mbar", Pressure, 100.0, "mbar");
    unit!(m, "psi", Pressure, 6894.76, "psi");
    unit!(m, "atm", Pressure, 101_325.0, "atm");
    unit!(m, "mmhg", Pressure, 133.322, "mmHg");
    unit!(m, "inhg", Pressure, 3386.39, "inHg");
    unit!(m, "torr", Pressure, 133.322, "torr");
    unit!(m, "psf", Pressure, 47.880_3, "psf");

    m
});

/// Surface-form aliases, already lowercased and whitespace-collapsed at the
/// point of comparison (see `canonicalize`). The `nm`/`Nm` pair is
/// deliberately absent here; it is resolved case-sensitively before this
/// table is ever consulted.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut a = HashMap::new();
    let mut add = |aliases: &[&'static str], canon: &'static str| {
        for s in aliases {
            a.insert(*s, canon);
        }
    };

    add(&["m", "meter", "meters", "metre", "metres"], "m");
    add(&["cm", "centimeter", "centimeters", "centimetre", "centimetres"], "cm");
    add(&["mm", "millimeter", "millimeters", "millimetre", "millimetres"], "mm");
    add(&["um", "micron", "microns", "micrometer", "micrometers"], "um");
    add(&["km", "kilometer", "kilometers", "kilometre", "kilometres"], "km");
    add(&["in", "inch", "inches", "\""], "in");
    add(&["ft", "foot", "feet", "'"], "ft");
    add(&["yd", "yard", "yards"], "yd");
    add(&["mi", "mile", "miles"], "mi");

    add(&["kg", "kilogram", "kilograms"], "kg");
    add(&["g", "gram", "grams"], "g");
    add(&["mg", "milligram", "milligrams"], "mg");
    add(&["lb", "lbs", "pound", "pounds"], "lb");
    add(&["oz", "ounce", "ounces"], "oz");
    add(&["t", "tonne", "tonnes", "metric ton", "metric tons"], "t");

    add(&["c", "celsius", "\u{00b0}c"], "c");
    add(&["f", "fahrenheit", "\u{00b0}f"], "f");
    add(&["k", "kelvin"], "k");

    add(&["l", "liter", "liters", "litre", "litres"], "l");
    add(&["ml", "milliliter", "milliliters", "millilitre", "millilitres"], "ml");
    add(&["gal", "gallon", "gallons"], "gal");
    add(&["qt", "quart", "quarts"], "qt");
    add(&["pt", "pint", "pints"], "pt");
    add(&["cup", "cups"], "cup");
    add(&["fl oz", "floz", "fluid ounce", "fluid ounces"], "floz");
    add(&["tbsp", "tablespoon", "tablespoons"], "tbsp");
    add(&["tsp", "teaspoon", "teaspoons"], "tsp");

    add(&["m2", "m\u{00b2}", "square meter", "square meters", "sq m"], "m2");
    add(&["cm2", "cm\u{00b2}", "square centimeter", "square centimeters"], "cm2");
    add(&["mm2", "mm\u{00b2}", "square millimeter", "square millimeters"], "mm2");
    add(&["km2", "km\u{00b2}", "square kilometer", "square kilometers"], "km2");
    add(&["ft2", "ft\u{00b2}", "square foot", "square feet", "sq ft"], "ft2");
    add(&["in2", "in\u{00b2}", "square inch", "square inches"], "in2");
    add(&["acre", "acres"], "acre");

    add(&["m/s", "ms", "meters/second", "meters per second"], "ms");
    add(&["km/h", "kmh", "kph", "kilometers/hour", "kilometers per hour"], "kmh");
    add(&["mph", "miles/hour", "miles per hour"], "mph");
    add(&["ft/s", "fts", "feet/second", "feet per second"], "fts");
    add(&["kn", "knot", "knots"], "kn");
    add(&["mach"], "mach");

    add(&["m/s2", "m/s\u{00b2}", "ms2", "meters/second squared"], "ms2");
    add(&["ft/s2", "ft/s\u{00b2}", "fts2", "feet/second squared"], "fts2");
    add(&["g-force", "gforce"], "gforce");

    add(&["l/min", "lmin", "liters/minute", "liters per minute"], "lmin");
    add(&["ml/s", "mls", "milliliters/second"], "mls");
    add(&["m3/h", "m3h", "m\u{00b3}/h", "cubic meters/hour"], "m3h");
    add(&["gal/min", "galmin", "gallons/minute", "gpm"], "galmin");
    add(&["cfm"], "cfm");
    add(&["cfs"], "cfs");

    add(
        &[
            "lb\u{00b7}ft", "lb-ft", "lb.ft", "lbft", "lb ft", "lb foot", "lb feet",
            "ft-lb", "ft.lb", "ftlb",
        ],
        "lbft",
    );
    add(&["lb\u{00b7}in", "lb-in", "lb.in", "lbin", "lb in", "lb inch"], "lbin");
    add(&["kg\u{00b7}m", "kg-m", "kg.m", "kgm", "kgf\u{00b7}m", "kgfm"], "kgm");
    add(&["oz\u{00b7}in", "oz-in", "oz.in", "ozin"], "ozin");

    add(&["pa", "pascal", "pascals"], "pa");
    add(&["kpa", "kilopascal", "kilopascals"], "kpa");
    add(&["mpa", "megapascal", "megapascals"], "mpa");
    add(&["bar"], "bar");
    add(&["mbar", "millibar", "millibars"], "mbar");
    add(&["psi"], "psi");
    add(&["atm", "atmosphere", "atmospheres"], "atm");
    add(&["mmhg", "mm hg"], "mmhg");
    add(&["inhg", "in hg"], "inhg");
    add(&["torr"], "torr");
    add(&["psf"], "psf");

    a
});

static SCALING_RULES: Lazy<HashMap<(&'static str, &'static str), Vec<ScalingRule>>> = Lazy::new(|| {
    use HopDirection::*;
    let mut r: HashMap<(&'static str, &'static str), Vec<ScalingRule>> = HashMap::new();
    let mut set = |dim, unit, rules: Vec<ScalingRule>| {
        r.insert((dim, unit), rules);
    };
    let rule = |threshold: f64, direction: HopDirection, target: &'static str| ScalingRule {
        threshold,
        direction,
        target,
    };

    set("length", "m", vec![rule(1.0, Down, "cm"), rule(1000.0, Up, "km")]);
    set("length", "cm", vec![rule(1.0, Down, "mm")]);
    set("length", "ft", vec![rule(1.0, Down, "in"), rule(5280.0, Up, "mi")]);
    set("length", "yd", vec![rule(1.0, Down, "ft")]);

    set("weight", "kg", vec![rule(1.0, Down, "g"), rule(1000.0, Up, "t")]);
    set("weight", "lb", vec![rule(1.0, Down, "oz")]);

    set("volume", "l", vec![rule(1.0, Down, "ml")]);
    set("volume", "gal", vec![rule(1.0, Down, "qt")]);
    set("volume", "qt", vec![rule(1.0, Down, "pt")]);
    set("volume", "pt", vec![rule(1.0, Down, "cup")]);
    set("volume", "cup", vec![rule(1.0, Down, "floz")]);

    set("area", "m2", vec![rule(1.0, Down, "cm2"), rule(1_000_000.0, Up, "km2")]);
    set("area", "cm2", vec![rule(1.0, Down, "mm2")]);
    set("area", "ft2", vec![rule(1.0, Down, "in2"), rule(43560.0, Up, "acre")]);

    set("speed", "ms", vec![rule(50.0, Up, "kmh")]);

    set("pressure", "pa", vec![rule(100_000.0, Up, "bar"), rule(1000.0, Up, "kpa")]);
    set("pressure", "bar", vec![rule(0.01, Down, "kpa")]);

    r
});

/// Resolve a surface-form token to its canonical unit code.
///
/// Case-insensitive and whitespace-collapsing for every unit except the
/// `nm`/`Nm` pair, which is resolved from the *original* casing of `raw`
/// before any lowercasing happens, per the registry's documented exception.
pub fn canonicalize(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    if trimmed == "nm" {
        return Some("nm");
    }
    if trimmed == "Nm" || trimmed == "NM" {
        return Some("Nm");
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    ALIASES.get(collapsed.as_str()).copied()
}

pub fn dimension_of(unit: &str) -> Option<Dimension> {
    UNITS.get(unit).map(|u| u.dimension)
}

/// `None` for temperature units, which have no multiplicative base factor.
pub fn ratio(unit: &str) -> Option<f64> {
    let info = UNITS.get(unit)?;
    if matches!(info.dimension, Dimension::Temperature) {
        return None;
    }
    Some(info.base_factor)
}

pub fn display_name(unit: &str) -> String {
    UNITS
        .get(unit)
        .map(|u| u.display_name.to_string())
        .unwrap_or_else(|| unit.to_string())
}

fn dimension_key(dim: Dimension) -> &'static str {
    use Dimension::*;
    match dim {
        Length => "length",
        Weight => "weight",
        Temperature => "temperature",
        Volume => "volume",
        Area => "area",
        Speed => "speed",
        Acceleration => "acceleration",
        FlowRate => "flow_rate",
        Torque => "torque",
        Pressure => "pressure",
        Timezone => "timezone",
        Currency => "currency",
    }
}

pub fn scaling_rules(dim: Dimension, source_unit: &str) -> &'static [ScalingRule] {
    static EMPTY: &[ScalingRule] = &[];
    SCALING_RULES
        .get(&(dimension_key(dim), source_unit))
        .map(|v| v.as_slice())
        .unwrap_or(EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_handles_long_forms_case_insensitively() {
        assert_eq!(canonicalize("Kilometers"), Some("km"));
        assert_eq!(canonicalize("  FEET "), Some("ft"));
        assert_eq!(canonicalize("Fluid Ounces"), Some("floz"));
    }

    #[test]
    fn nm_and_nm_torque_are_case_disambiguated() {
        assert_eq!(canonicalize("nm"), Some("nm"));
        assert_eq!(canonicalize("Nm"), Some("Nm"));
        assert_eq!(dimension_of("nm"), Some(Dimension::Length));
        assert_eq!(dimension_of("Nm"), Some(Dimension::Torque));
    }

    #[test]
    fn space_and_long_form_lb_torque_aliases_resolve_to_torque() {
        for alias in ["lb ft", "lb foot", "lb feet", "lb in", "lb inch"] {
            let canon = canonicalize(alias).unwrap_or_else(|| panic!("no alias for {alias}"));
            assert_ne!(canon, "lb", "{alias} canonicalized as weight, not torque");
            assert_eq!(dimension_of(canon), Some(Dimension::Torque));
        }
    }

    #[test]
    fn every_registered_unit_has_a_display_name() {
        for (code, info) in UNITS.iter() {
            assert!(!info.display_name.is_empty(), "missing display name for {code}");
        }
    }

    #[test]
    fn base_unit_has_ratio_one() {
        assert_eq!(ratio("m"), Some(1.0));
        assert_eq!(ratio("kg"), Some(1.0));
        assert_eq!(ratio("l"), Some(1.0));
    }
}
