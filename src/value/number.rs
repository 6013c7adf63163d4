//! Numbers with units.
//!
//! A Sass number is a float together with numerator and denominator unit
//! lists; `10px`, `3`, and `0.5em/s` are all numbers.  Multiplication and
//! division do unit algebra with cancellation; addition and comparison
//! convert through the table in [`crate::unit`].

use std::cmp::Ordering;
use std::rc::Rc;

use float_cmp::approx_eq;

use crate::unit;

/// Two numbers are equal if they agree to within this, after unit coercion.
pub const NEAR_EQUAL: f64 = 1e-11;

#[derive(Debug, Clone)]
pub struct Number {
    pub value: f64,
    pub numer: Vec<String>,
    pub denom: Vec<String>,
    /// When this number came from a literal `a/b`, the operands, so the
    /// shorthand form can be emitted verbatim (`font: 12px/16px`).
    pub as_slash: Option<Rc<(Number, Number)>>,
}

impl Number {
    pub fn new(value: f64) -> Number {
        Number {
            value,
            numer: Vec::new(),
            denom: Vec::new(),
            as_slash: None,
        }
    }

    pub fn with_unit(value: f64, unit: &str) -> Number {
        Number {
            value,
            numer: vec![unit.to_string()],
            denom: Vec::new(),
            as_slash: None,
        }
    }

    pub fn is_unitless(&self) -> bool {
        self.numer.is_empty() && self.denom.is_empty()
    }

    pub fn is_int(&self) -> bool {
        self.value.is_finite() && (self.value - self.value.round()).abs() < NEAR_EQUAL
    }

    pub fn to_int(&self) -> Option<i64> {
        if self.is_int() {
            Some(self.value.round() as i64)
        } else {
            None
        }
    }

    /// The unit as printed: `px`, `px*em`, `px/s`, or `` for unitless.
    pub fn unit_str(&self) -> String {
        let numer = self.numer.join("*");
        if self.denom.is_empty() {
            numer
        } else if numer.is_empty() {
            format!("/{}", self.denom.join("*"))
        } else {
            format!("{}/{}", numer, self.denom.join("*"))
        }
    }

    fn strip_slash(mut self) -> Number {
        self.as_slash = None;
        self
    }

    /// The factor converting this number's units into `numer`/`denom`.
    ///
    /// `None` when the unit signatures are incompatible.
    fn conversion_to(&self, numer: &[String], denom: &[String]) -> Option<f64> {
        if self.numer.len() != numer.len() || self.denom.len() != denom.len() {
            return None;
        }
        let mut factor = 1.0;
        let mut theirs: Vec<&String> = numer.iter().collect();
        for mine in &self.numer {
            let i = theirs
                .iter()
                .position(|t| unit::compatible(mine, t))?;
            factor *= unit::conversion_factor(mine, theirs.remove(i))?;
        }
        let mut theirs: Vec<&String> = denom.iter().collect();
        for mine in &self.denom {
            let i = theirs
                .iter()
                .position(|t| unit::compatible(mine, t))?;
            factor /= unit::conversion_factor(mine, theirs.remove(i))?;
        }
        Some(factor)
    }

    /// This number re-expressed in another number's units.
    pub fn coerced_to(&self, other: &Number) -> Option<Number> {
        if self.is_unitless() {
            let mut n = other.clone().strip_slash();
            n.value = self.value;
            return Some(n);
        }
        if other.is_unitless() {
            return Some(self.clone().strip_slash());
        }
        let factor = self.conversion_to(&other.numer, &other.denom)?;
        Some(Number {
            value: self.value * factor,
            numer: other.numer.clone(),
            denom: other.denom.clone(),
            as_slash: None,
        })
    }

    pub fn add(&self, other: &Number) -> Result<Number, (String, String)> {
        self.combine(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Number) -> Result<Number, (String, String)> {
        self.combine(other, |a, b| a - b)
    }

    /// Modulo with the sign of the right-hand side, as the original defines
    /// it; `x % 0` is NaN.
    pub fn rem(&self, other: &Number) -> Result<Number, (String, String)> {
        self.combine(other, |a, b| {
            if b == 0.0 {
                f64::NAN
            } else {
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else {
                    r
                }
            }
        })
    }

    fn combine(
        &self,
        other: &Number,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Number, (String, String)> {
        let coerced = other
            .coerced_to(self)
            .ok_or_else(|| (self.unit_str(), other.unit_str()))?;
        let mut result = if self.is_unitless() {
            let mut n = other.clone().strip_slash();
            n.value = self.value;
            n
        } else {
            self.clone().strip_slash()
        };
        result.value = op(result.value, coerced.value);
        Ok(result)
    }

    pub fn mul(&self, other: &Number) -> Number {
        let mut result = Number {
            value: self.value * other.value,
            numer: self.numer.clone(),
            denom: self.denom.clone(),
            as_slash: None,
        };
        result.numer.extend(other.numer.iter().cloned());
        result.denom.extend(other.denom.iter().cloned());
        result.cancel_units();
        result
    }

    /// Division; a zero divisor yields a signed infinity (or NaN for 0/0).
    pub fn div(&self, other: &Number) -> Number {
        let mut result = Number {
            value: self.value / other.value,
            numer: self.numer.clone(),
            denom: self.denom.clone(),
            as_slash: None,
        };
        result.numer.extend(other.denom.iter().cloned());
        result.denom.extend(other.numer.iter().cloned());
        result.cancel_units();
        result
    }

    pub fn neg(&self) -> Number {
        let mut n = self.clone().strip_slash();
        n.value = -n.value;
        n
    }

    /// Removes numerator/denominator pairs of convertible units, folding the
    /// conversion factor into the value.
    fn cancel_units(&mut self) {
        let mut denom = std::mem::take(&mut self.denom);
        let mut kept_numer = Vec::new();
        for numer_unit in std::mem::take(&mut self.numer) {
            match denom
                .iter()
                .position(|d| unit::compatible(&numer_unit, d))
            {
                Some(i) => {
                    if let Some(factor) = unit::conversion_factor(&numer_unit, &denom[i]) {
                        self.value *= factor;
                    }
                    denom.remove(i);
                }
                None => kept_numer.push(numer_unit),
            }
        }
        self.numer = kept_numer;
        self.denom = denom;
    }

    pub fn eq_value(&self, other: &Number) -> bool {
        match other.coerced_to(self) {
            Some(coerced) => {
                approx_eq!(f64, self.value, coerced.value, epsilon = NEAR_EQUAL)
                    || (self.value.is_nan() && coerced.value.is_nan())
            }
            None => false,
        }
    }

    pub fn cmp_value(&self, other: &Number) -> Result<Ordering, (String, String)> {
        let coerced = other
            .coerced_to(self)
            .ok_or_else(|| (self.unit_str(), other.unit_str()))?;
        Ok(self
            .value
            .partial_cmp(&coerced.value)
            .unwrap_or(Ordering::Equal))
    }

    /// Whether the number is representable as plain CSS (a single numerator
    /// unit at most, no denominators).
    pub fn is_valid_css(&self) -> bool {
        self.numer.len() <= 1 && self.denom.is_empty()
    }

    pub fn to_css_string(&self, precision: usize, compressed: bool) -> Result<String, String> {
        if let Some(slash) = &self.as_slash {
            let lhs = slash.0.to_css_string(precision, compressed)?;
            let rhs = slash.1.to_css_string(precision, compressed)?;
            return Ok(format!("{}/{}", lhs, rhs));
        }
        if !self.is_valid_css() {
            return Err(format!(
                "{}{} isn't a valid CSS value",
                format_double(self.value, precision),
                self.unit_str()
            ));
        }
        let mut s = format_double(self.value, precision);
        if compressed && s.starts_with("0.") {
            s.remove(0);
        } else if compressed && s.starts_with("-0.") {
            s.remove(1);
        }
        s.push_str(&self.numer.join(""));
        Ok(s)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

/// Formats a double at the given precision, trimming trailing zeros.
pub fn format_double(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_multiplication_and_division() {
        let a = Number::with_unit(10.0, "px");
        let b = a.mul(&Number::new(2.0));
        assert_eq!(b.value, 20.0);
        assert_eq!(b.unit_str(), "px");

        let c = b.div(&Number::new(4.0));
        assert_eq!(c.value, 5.0);
        assert_eq!(c.unit_str(), "px");
    }

    #[test]
    fn division_cancels_units() {
        let a = Number::with_unit(10.0, "px");
        let b = Number::with_unit(2.0, "px");
        let c = a.div(&b);
        assert!(c.is_unitless());
        assert_eq!(c.value, 5.0);
    }

    #[test]
    fn division_converts_while_cancelling() {
        let a = Number::with_unit(1.0, "in");
        let b = Number::with_unit(8.0, "px");
        let c = a.div(&b);
        assert!(c.is_unitless());
        assert_eq!(c.value, 12.0);
    }

    #[test]
    fn addition_converts_units() {
        let a = Number::with_unit(1.0, "in");
        let b = Number::with_unit(6.0, "pt");
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.unit_str(), "in");
        assert!((sum.value - 1.0833333333).abs() < 1e-9);
    }

    #[test]
    fn incompatible_units_error() {
        let a = Number::with_unit(1.0, "px");
        let b = Number::with_unit(1.0, "deg");
        assert!(a.add(&b).is_err());
        assert!(a.cmp_value(&b).is_err());
    }

    #[test]
    fn modulo_takes_divisor_sign() {
        let a = Number::new(-5.0);
        let b = Number::new(3.0);
        assert_eq!(a.rem(&b).unwrap().value, 1.0);
        let a = Number::new(5.0);
        let b = Number::new(-3.0);
        assert_eq!(a.rem(&b).unwrap().value, -1.0);
        assert!(Number::new(5.0).rem(&Number::new(0.0)).unwrap().value.is_nan());
    }

    #[test]
    fn near_equal_comparison() {
        let a = Number::new(1.0);
        let b = Number::new(1.0 + 1e-13);
        assert!(a.eq_value(&b));
        let c = Number::new(1.0 + 1e-9);
        assert!(!a.eq_value(&c));
    }

    #[test]
    fn formats_at_precision() {
        assert_eq!(format_double(5.0, 10), "5");
        assert_eq!(format_double(1.0 / 3.0, 5), "0.33333");
        assert_eq!(format_double(2.50, 10), "2.5");
        assert_eq!(format_double(-0.0, 10), "0");
        assert_eq!(format_double(f64::INFINITY, 10), "Infinity");
        assert_eq!(format_double(f64::NAN, 10), "NaN");
    }

    #[test]
    fn css_validity() {
        let a = Number::with_unit(1.0, "px").mul(&Number::with_unit(1.0, "em"));
        assert!(!a.is_valid_css());
        assert!(a.to_css_string(10, false).is_err());
        let b = Number::with_unit(1.0, "px");
        assert_eq!(b.to_css_string(10, false).unwrap(), "1px");
    }

    #[test]
    fn compressed_drops_leading_zero() {
        let n = Number::new(0.5);
        assert_eq!(n.to_css_string(10, true).unwrap(), ".5");
        let n = Number::new(-0.5);
        assert_eq!(n.to_css_string(10, true).unwrap(), "-.5");
    }
}
