//! SassScript operator semantics.
//!
//! Binary and unary operations on values.  These return `ErrorKind` rather
//! than a full error; the evaluator attaches the span and backtrace.

use std::rc::Rc;

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::color::Color;
use crate::error::ErrorKind;
use crate::value::{Number, QuoteKind, Value};

/// Applies a (non-short-circuiting) binary operator.
pub fn binary_op(
    op: BinaryOperator,
    lhs: Value,
    rhs: Value,
    allows_slash: bool,
    precision: usize,
) -> Result<Value, ErrorKind> {
    use BinaryOperator::*;
    match op {
        Eq => Ok(Value::Bool(lhs == rhs)),
        Ne => Ok(Value::Bool(lhs != rhs)),
        Lt | Le | Gt | Ge => compare(op, &lhs, &rhs),
        Plus => add(lhs, rhs, precision),
        Minus => subtract(lhs, rhs, precision),
        Times => multiply(lhs, rhs, precision),
        Div => divide(lhs, rhs, allows_slash, precision),
        Rem => modulo(lhs, rhs),
        And | Or => unreachable!("short-circuit operators are evaluated in place"),
    }
}

pub fn unary_op(op: UnaryOperator, operand: Value, precision: usize) -> Result<Value, ErrorKind> {
    match (op, operand) {
        (UnaryOperator::Not, operand) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOperator::Minus, Value::Number(n)) => Ok(Value::Number(n.neg())),
        (UnaryOperator::Minus, other) => Ok(Value::String(
            format!("-{}", css_text(&other, precision)?),
            QuoteKind::None,
        )),
        (UnaryOperator::Plus, Value::Number(n)) => Ok(Value::Number(n)),
        (UnaryOperator::Plus, other) => Ok(Value::String(
            format!("+{}", css_text(&other, precision)?),
            QuoteKind::None,
        )),
        (UnaryOperator::Div, other) => Ok(Value::String(
            format!("/{}", css_text(&other, precision)?),
            QuoteKind::None,
        )),
    }
}

fn compare(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, ErrorKind> {
    use std::cmp::Ordering;
    let (a, b) = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        _ => {
            return Err(ErrorKind::UndefinedOperation(format!(
                "{:?} {} {:?}",
                lhs.type_name(),
                op.symbol(),
                rhs.type_name()
            )))
        }
    };
    let ordering = a
        .cmp_value(b)
        .map_err(|(u1, u2)| ErrorKind::IncompatibleUnits(u1, u2))?;
    let result = match op {
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::Le => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::Ge => ordering != Ordering::Less,
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn add(lhs: Value, rhs: Value, precision: usize) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .add(&b)
            .map(Value::Number)
            .map_err(|(u1, u2)| ErrorKind::IncompatibleUnits(u1, u2)),
        (Value::Color(a), Value::Color(b)) => Ok(Value::Color(a.add(&b))),
        (Value::Color(c), Value::Number(n)) | (Value::Number(n), Value::Color(c)) => {
            if !n.is_unitless() {
                return Err(ErrorKind::UndefinedOperation(format!(
                    "cannot add {} to a color",
                    n.unit_str()
                )));
            }
            Ok(Value::Color(Color::new_rgba(
                c.red() + n.value,
                c.green() + n.value,
                c.blue() + n.value,
                c.alpha(),
            )))
        }
        (Value::String(a, quote), rhs) => {
            Ok(Value::String(format!("{}{}", a, concat_text(&rhs, precision)?), quote))
        }
        (lhs, Value::String(b, quote)) => {
            Ok(Value::String(format!("{}{}", concat_text(&lhs, precision)?, b), quote))
        }
        (lhs @ Value::List { .. }, _) | (_, lhs @ Value::List { .. }) => Err(
            ErrorKind::UndefinedOperation(format!("+ is not defined for {}", lhs.type_name())),
        ),
        (lhs, rhs) => Err(ErrorKind::UndefinedOperation(format!(
            "{} + {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn subtract(lhs: Value, rhs: Value, precision: usize) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .sub(&b)
            .map(Value::Number)
            .map_err(|(u1, u2)| ErrorKind::IncompatibleUnits(u1, u2)),
        (Value::Color(a), Value::Color(b)) => Ok(Value::Color(Color::new_rgba(
            a.red() - b.red(),
            a.green() - b.green(),
            a.blue() - b.blue(),
            a.alpha(),
        ))),
        (Value::Color(c), Value::Number(n)) => Ok(Value::Color(Color::new_rgba(
            c.red() - n.value,
            c.green() - n.value,
            c.blue() - n.value,
            c.alpha(),
        ))),
        // Identifier arithmetic degrades to joined text, as the original
        // does for `a - b`.
        (lhs, rhs) => Ok(Value::String(
            format!(
                "{}-{}",
                css_text(&lhs, precision)?,
                css_text(&rhs, precision)?
            ),
            QuoteKind::None,
        )),
    }
}

fn multiply(lhs: Value, rhs: Value, _precision: usize) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(&b))),
        (lhs, rhs) => Err(ErrorKind::UndefinedOperation(format!(
            "{} * {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn divide(
    lhs: Value,
    rhs: Value,
    allows_slash: bool,
    precision: usize,
) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let mut result = a.div(&b);
            if allows_slash {
                result.as_slash = Some(Rc::new((a, b)));
            }
            Ok(Value::Number(result))
        }
        (lhs, rhs) => Ok(Value::String(
            format!(
                "{}/{}",
                css_text(&lhs, precision)?,
                css_text(&rhs, precision)?
            ),
            QuoteKind::None,
        )),
    }
}

fn modulo(lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .rem(&b)
            .map(Value::Number)
            .map_err(|(u1, u2)| ErrorKind::IncompatibleUnits(u1, u2)),
        (lhs, rhs) => Err(ErrorKind::UndefinedOperation(format!(
            "{} % {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

/// Text for string concatenation: quoted strings contribute their contents
/// without quotes.
fn concat_text(value: &Value, precision: usize) -> Result<String, ErrorKind> {
    match value {
        Value::String(text, _) => Ok(text.clone()),
        other => css_text(other, precision),
    }
}

fn css_text(value: &Value, precision: usize) -> Result<String, ErrorKind> {
    match value {
        Value::String(text, _) => Ok(text.clone()),
        other => other
            .to_css_string(precision, false)
            .map_err(ErrorKind::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ListSeparator;

    fn num(v: f64) -> Value {
        Value::Number(Number::new(v))
    }

    fn px(v: f64) -> Value {
        Value::Number(Number::with_unit(v, "px"))
    }

    fn op(op: BinaryOperator, lhs: Value, rhs: Value) -> Value {
        binary_op(op, lhs, rhs, false, 10).unwrap()
    }

    #[test]
    fn arithmetic_with_units() {
        let v = op(BinaryOperator::Times, px(10.0), num(2.0));
        let v = binary_op(BinaryOperator::Div, v, num(4.0), false, 10).unwrap();
        match v {
            Value::Number(n) => {
                assert_eq!(n.value, 5.0);
                assert_eq!(n.unit_str(), "px");
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn string_concatenation_keeps_lhs_quoting() {
        let v = op(
            BinaryOperator::Plus,
            Value::String("a".into(), QuoteKind::Quoted),
            Value::String("b".into(), QuoteKind::None),
        );
        assert_eq!(v, Value::String("ab".into(), QuoteKind::Quoted));
        match &v {
            Value::String(_, QuoteKind::Quoted) => {}
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn color_plus_color_is_componentwise() {
        let a = Value::Color(Color::new_rgba(10.0, 20.0, 30.0, 1.0));
        let b = Value::Color(Color::new_rgba(1.0, 2.0, 3.0, 1.0));
        match op(BinaryOperator::Plus, a, b) {
            Value::Color(c) => assert_eq!(c.rgba_bytes(), [11, 22, 33, 255]),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn list_addition_is_an_error() {
        let list = Value::List {
            items: vec![num(1.0)],
            separator: ListSeparator::Space,
            bracketed: false,
        };
        assert!(binary_op(BinaryOperator::Plus, list, num(1.0), false, 10).is_err());
    }

    #[test]
    fn slash_preserved_only_when_allowed() {
        let v = binary_op(BinaryOperator::Div, px(12.0), px(16.0), true, 10).unwrap();
        match v {
            Value::Number(n) => {
                assert!(n.as_slash.is_some());
                assert_eq!(n.to_css_string(10, false).unwrap(), "12px/16px");
            }
            other => panic!("{:?}", other),
        }
        let v = binary_op(BinaryOperator::Div, px(12.0), num(4.0), false, 10).unwrap();
        match v {
            Value::Number(n) => {
                assert!(n.as_slash.is_none());
                assert_eq!(n.value, 3.0);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn division_by_zero_gives_infinity() {
        let v = binary_op(BinaryOperator::Div, num(1.0), num(0.0), false, 10).unwrap();
        match v {
            Value::Number(n) => assert!(n.value.is_infinite() && n.value > 0.0),
            other => panic!("{:?}", other),
        }
        let v = binary_op(BinaryOperator::Div, num(-1.0), num(0.0), false, 10).unwrap();
        match v {
            Value::Number(n) => assert!(n.value.is_infinite() && n.value < 0.0),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn comparisons_convert_units() {
        let v = op(BinaryOperator::Lt, Value::Number(Number::with_unit(1.0, "in")), px(100.0));
        assert_eq!(v, Value::Bool(true));
        assert!(binary_op(
            BinaryOperator::Lt,
            px(1.0),
            Value::Number(Number::with_unit(1.0, "s")),
            false,
            10
        )
        .is_err());
    }

    #[test]
    fn not_inverts_truthiness() {
        assert_eq!(
            unary_op(UnaryOperator::Not, Value::Null, 10).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            unary_op(UnaryOperator::Not, num(0.0), 10).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn unary_minus_on_identifier_prefixes() {
        let v = unary_op(
            UnaryOperator::Minus,
            Value::String("foo".into(), QuoteKind::None),
            10,
        )
        .unwrap();
        assert_eq!(v, Value::String("-foo".into(), QuoteKind::None));
    }
}
