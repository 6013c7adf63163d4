//! CSS units and the conversion table between compatible ones.
//!
//! Units are open-ended (`10fribbles` is a perfectly good Sass number), so
//! they are kept as strings.  The known units fall into families (length,
//! angle, time, frequency, resolution); numbers whose units belong to the
//! same family can be added, compared, and converted.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The dimension a known unit measures.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum UnitFamily {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
}

/// Factors that convert each known unit to its family's canonical unit
/// (`px`, `deg`, `ms`, `Hz`, `dppx`).
static CONVERSIONS: Lazy<HashMap<&'static str, (UnitFamily, f64)>> = Lazy::new(|| {
    use UnitFamily::*;
    let mut m = HashMap::new();
    m.insert("px", (Length, 1.0));
    m.insert("pt", (Length, 96.0 / 72.0));
    m.insert("pc", (Length, 16.0));
    m.insert("in", (Length, 96.0));
    m.insert("cm", (Length, 96.0 / 2.54));
    m.insert("mm", (Length, 96.0 / 25.4));
    m.insert("q", (Length, 96.0 / 101.6));
    m.insert("deg", (Angle, 1.0));
    m.insert("grad", (Angle, 0.9));
    m.insert("rad", (Angle, 180.0 / std::f64::consts::PI));
    m.insert("turn", (Angle, 360.0));
    m.insert("s", (Time, 1000.0));
    m.insert("ms", (Time, 1.0));
    m.insert("hz", (Frequency, 1.0));
    m.insert("khz", (Frequency, 1000.0));
    m.insert("dppx", (Resolution, 1.0));
    m.insert("dpi", (Resolution, 1.0 / 96.0));
    m.insert("dpcm", (Resolution, 2.54 / 96.0));
    m
});

fn lookup(unit: &str) -> Option<(UnitFamily, f64)> {
    CONVERSIONS.get(unit.to_ascii_lowercase().as_str()).copied()
}

/// The family a unit belongs to, if it is a known convertible unit.
pub fn family(unit: &str) -> Option<UnitFamily> {
    lookup(unit).map(|(f, _)| f)
}

/// The factor that converts a quantity in `from` to a quantity in `to`.
///
/// Returns `None` when the units are unrelated.  Identical units always
/// convert with factor 1, even unknown ones.
pub fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    if from.eq_ignore_ascii_case(to) {
        return Some(1.0);
    }
    let (family_from, factor_from) = lookup(from)?;
    let (family_to, factor_to) = lookup(to)?;
    if family_from != family_to {
        return None;
    }
    Some(factor_from / factor_to)
}

/// Whether two units can be converted into one another.
pub fn compatible(a: &str, b: &str) -> bool {
    conversion_factor(a, b).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion() {
        assert_eq!(conversion_factor("px", "px"), Some(1.0));
        assert_eq!(conversion_factor("fribble", "fribble"), Some(1.0));
    }

    #[test]
    fn length_conversions() {
        assert_eq!(conversion_factor("in", "px"), Some(96.0));
        assert_eq!(conversion_factor("pc", "pt"), Some(12.0));
        let cm_to_mm = conversion_factor("cm", "mm").unwrap();
        assert!((cm_to_mm - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cross_family_is_incompatible() {
        assert_eq!(conversion_factor("px", "deg"), None);
        assert_eq!(conversion_factor("s", "px"), None);
        assert!(!compatible("px", "fribble"));
    }

    #[test]
    fn time_and_angle() {
        assert_eq!(conversion_factor("s", "ms"), Some(1000.0));
        assert_eq!(conversion_factor("turn", "deg"), Some(360.0));
    }

    #[test]
    fn case_insensitive_units() {
        assert_eq!(conversion_factor("PX", "px"), Some(1.0));
        assert_eq!(family("KHZ"), Some(UnitFamily::Frequency));
    }
}
