//! String functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{Number, QuoteKind, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("str-length", str_length);
    m.insert("str-insert", str_insert);
    m.insert("str-index", str_index);
    m.insert("str-slice", str_slice);
    m.insert("to-upper-case", to_upper_case);
    m.insert("to-lower-case", to_lower_case);
    m.insert("quote", quote);
    m.insert("unquote", unquote);
    m.insert("unique-id", unique_id);
}

fn str_length(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (s, _) = args.take_string(0, "string")?;
    Ok(Value::Number(Number::new(s.chars().count() as f64)))
}

fn str_insert(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let (s, q) = args.take_string(0, "string")?;
    let (insert, _) = args.take_string(1, "insert")?;
    let index = args.take_number(2, "index")?;
    let raw = index
        .to_int()
        .ok_or_else(|| args.error(format!("$index: {} is not an integer", index.value)))?;

    let chars: Vec<char> = s.chars().collect();
    // Index 1 is before the first character; negative counts from the end,
    // -1 being after the last character.
    let at = if raw > 0 {
        ((raw - 1) as usize).min(chars.len())
    } else if raw < 0 {
        let from_end = ((-raw) - 1) as usize;
        chars.len().saturating_sub(from_end)
    } else {
        0
    };
    let mut result: String = chars[..at].iter().collect();
    result.push_str(&insert);
    result.extend(chars[at..].iter());
    Ok(Value::String(result, q))
}

fn str_index(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let (s, _) = args.take_string(0, "string")?;
    let (substring, _) = args.take_string(1, "substring")?;
    match s.find(&substring) {
        Some(byte_idx) => {
            let char_idx = s[..byte_idx].chars().count() + 1;
            Ok(Value::Number(Number::new(char_idx as f64)))
        }
        None => Ok(Value::Null),
    }
}

fn str_slice(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let (s, q) = args.take_string(0, "string")?;
    let start = args.take_number(1, "start-at")?;
    let end = match args.take(2, "end-at") {
        Some(Value::Number(n)) => n,
        Some(other) => return Err(args.type_error("end-at", "a number", &other)),
        None => Number::new(-1.0),
    };

    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let norm = |raw: i64, default_for_zero: i64| -> i64 {
        if raw == 0 {
            default_for_zero
        } else if raw < 0 {
            (len + raw + 1).max(1)
        } else {
            raw
        }
    };
    let start = norm(
        start
            .to_int()
            .ok_or_else(|| args.error("$start-at: expected an integer"))?,
        1,
    );
    let end = norm(
        end.to_int()
            .ok_or_else(|| args.error("$end-at: expected an integer"))?,
        0,
    )
    .min(len);

    if start > end || start > len {
        return Ok(Value::String(String::new(), q));
    }
    let result: String = chars[(start - 1) as usize..end as usize].iter().collect();
    Ok(Value::String(result, q))
}

fn to_upper_case(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (s, q) = args.take_string(0, "string")?;
    Ok(Value::String(s.to_ascii_uppercase(), q))
}

fn to_lower_case(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (s, q) = args.take_string(0, "string")?;
    Ok(Value::String(s.to_ascii_lowercase(), q))
}

fn quote(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    match args.take_required(0, "string")? {
        Value::String(s, _) => Ok(Value::String(s, QuoteKind::Quoted)),
        other => Ok(Value::String(other.inspect(10), QuoteKind::Quoted)),
    }
}

fn unquote(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    match args.take_required(0, "string")? {
        Value::String(s, _) => Ok(Value::String(s, QuoteKind::None)),
        other => Ok(Value::String(other.inspect(10), QuoteKind::None)),
    }
}

fn unique_id(args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(0)?;
    Ok(Value::String(evaluator.unique_id(), QuoteKind::None))
}
