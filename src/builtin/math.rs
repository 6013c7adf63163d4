//! Number functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{Number, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("abs", abs);
    m.insert("ceil", ceil);
    m.insert("floor", floor);
    m.insert("round", round);
    m.insert("min", min);
    m.insert("max", max);
    m.insert("percentage", percentage);
    m.insert("random", random);
}

fn map_value(n: Number, f: impl Fn(f64) -> f64) -> Value {
    let mut result = n;
    result.value = f(result.value);
    result.as_slash = None;
    Value::Number(result)
}

fn abs(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(map_value(n, f64::abs))
}

fn ceil(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(map_value(n, f64::ceil))
}

fn floor(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(map_value(n, f64::floor))
}

fn round(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(map_value(n, f64::round))
}

fn min(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    extremum(args, std::cmp::Ordering::Less)
}

fn max(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    extremum(args, std::cmp::Ordering::Greater)
}

fn extremum(args: CallArgs, keep: std::cmp::Ordering) -> SassResult<Value> {
    if args.positional.is_empty() {
        return Err(args.error("at least one argument must be passed"));
    }
    let mut best: Option<Number> = None;
    for value in &args.positional {
        let n = match value {
            Value::Number(n) => n.clone(),
            other => return Err(args.type_error("numbers", "a number", other)),
        };
        best = Some(match best {
            None => n,
            Some(current) => {
                let ordering = n
                    .cmp_value(&current)
                    .map_err(|(u1, u2)| {
                        args.error(format!("incompatible units {} and {}", u1, u2))
                    })?;
                if ordering == keep {
                    n
                } else {
                    current
                }
            }
        });
    }
    Ok(Value::Number(best.expect("non-empty")))
}

fn percentage(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    if !n.is_unitless() {
        return Err(args.error(format!(
            "$number: expected a unitless number, got {}{}",
            n.value,
            n.unit_str()
        )));
    }
    Ok(Value::Number(Number::with_unit(n.value * 100.0, "%")))
}

fn random(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    match args.take(0, "limit") {
        None => Ok(Value::Number(Number::new(evaluator.random_float()))),
        Some(Value::Number(limit)) => {
            let limit_int = limit
                .to_int()
                .filter(|v| *v >= 1)
                .ok_or_else(|| {
                    args.error(format!(
                        "$limit: {} is not a positive integer",
                        limit.value
                    ))
                })?;
            Ok(Value::Number(Number::new(
                evaluator.random_int(limit_int) as f64,
            )))
        }
        Some(other) => Err(args.type_error("limit", "a number", &other)),
    }
}
