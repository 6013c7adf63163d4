//! List functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{ListSeparator, Number, QuoteKind, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("length", length);
    m.insert("nth", nth);
    m.insert("set-nth", set_nth);
    m.insert("join", join);
    m.insert("append", append);
    m.insert("zip", zip);
    m.insert("index", index);
    m.insert("list-separator", list_separator);
    m.insert("is-bracketed", is_bracketed);
}

/// Resolves a 1-based (possibly negative) Sass index into a vec index.
fn resolve_index(args: &CallArgs, n: &Number, len: usize) -> SassResult<usize> {
    let raw = n
        .to_int()
        .ok_or_else(|| args.error(format!("$n: {} is not an integer", n.value)))?;
    if raw == 0 {
        return Err(args.error("$n: List index may not be 0"));
    }
    let idx = if raw < 0 {
        let from_end = (-raw) as usize;
        if from_end > len {
            return Err(args.error(format!(
                "$n: invalid index {} for a list with {} elements",
                raw, len
            )));
        }
        len - from_end
    } else {
        (raw - 1) as usize
    };
    if idx >= len {
        return Err(args.error(format!(
            "$n: invalid index {} for a list with {} elements",
            raw, len
        )));
    }
    Ok(idx)
}

fn length(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let list = args.take_required(0, "list")?;
    Ok(Value::Number(Number::new(list.as_list().len() as f64)))
}

fn nth(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let list = args.take_required(0, "list")?.as_list();
    let n = args.take_number(1, "n")?;
    let idx = resolve_index(&args, &n, list.len())?;
    Ok(list[idx].clone())
}

fn set_nth(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let original = args.take_required(0, "list")?;
    let n = args.take_number(1, "n")?;
    let value = args.take_required(2, "value")?;
    let mut items = original.as_list();
    let idx = resolve_index(&args, &n, items.len())?;
    items[idx] = value;
    Ok(Value::List {
        items,
        separator: match original.separator() {
            ListSeparator::Undecided => ListSeparator::Space,
            sep => sep,
        },
        bracketed: matches!(&original, Value::List { bracketed: true, .. }),
    })
}

fn separator_arg(args: &CallArgs, value: &Value) -> SassResult<Option<ListSeparator>> {
    match value {
        Value::String(s, _) => match s.as_str() {
            "auto" => Ok(None),
            "comma" => Ok(Some(ListSeparator::Comma)),
            "space" => Ok(Some(ListSeparator::Space)),
            _ => Err(args.error("$separator: must be \"space\", \"comma\", or \"auto\"")),
        },
        other => Err(args.type_error("separator", "a string", other)),
    }
}

fn join(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(4)?;
    let list1 = args.take_required(0, "list1")?;
    let list2 = args.take_required(1, "list2")?;
    let separator = match args.take(2, "separator") {
        Some(v) => separator_arg(&args, &v)?,
        None => None,
    };
    let bracketed = match args.take(3, "bracketed") {
        Some(Value::String(s, _)) if s == "auto" => {
            matches!(&list1, Value::List { bracketed: true, .. })
        }
        Some(v) => v.is_truthy(),
        None => matches!(&list1, Value::List { bracketed: true, .. }),
    };

    let separator = separator.unwrap_or_else(|| match list1.separator() {
        ListSeparator::Undecided => match list2.separator() {
            ListSeparator::Undecided => ListSeparator::Space,
            sep => sep,
        },
        sep => sep,
    });

    let mut items = list1.as_list();
    items.extend(list2.as_list());
    Ok(Value::List {
        items,
        separator,
        bracketed,
    })
}

fn append(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let list = args.take_required(0, "list")?;
    let value = args.take_required(1, "val")?;
    let separator = match args.take(2, "separator") {
        Some(v) => separator_arg(&args, &v)?,
        None => None,
    };
    let separator = separator.unwrap_or_else(|| match list.separator() {
        ListSeparator::Undecided => ListSeparator::Space,
        sep => sep,
    });
    let bracketed = matches!(&list, Value::List { bracketed: true, .. });
    let mut items = list.as_list();
    items.push(value);
    Ok(Value::List {
        items,
        separator,
        bracketed,
    })
}

fn zip(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    let lists: Vec<Vec<Value>> = args.positional.iter().map(Value::as_list).collect();
    let shortest = lists.iter().map(Vec::len).min().unwrap_or(0);
    let items = (0..shortest)
        .map(|i| Value::List {
            items: lists.iter().map(|l| l[i].clone()).collect(),
            separator: ListSeparator::Space,
            bracketed: false,
        })
        .collect();
    Ok(Value::List {
        items,
        separator: ListSeparator::Comma,
        bracketed: false,
    })
}

fn index(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let list = args.take_required(0, "list")?.as_list();
    let value = args.take_required(1, "value")?;
    match list.iter().position(|v| *v == value) {
        Some(i) => Ok(Value::Number(Number::new((i + 1) as f64))),
        None => Ok(Value::Null),
    }
}

fn list_separator(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let list = args.take_required(0, "list")?;
    Ok(Value::String(
        list.separator().name().to_string(),
        QuoteKind::None,
    ))
}

fn is_bracketed(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let list = args.take_required(0, "list")?;
    Ok(Value::Bool(matches!(
        list,
        Value::List { bracketed: true, .. }
    )))
}
