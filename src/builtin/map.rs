//! Map functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{ListSeparator, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("map-get", map_get);
    m.insert("map-has-key", map_has_key);
    m.insert("map-keys", map_keys);
    m.insert("map-values", map_values);
    m.insert("map-merge", map_merge);
    m.insert("map-remove", map_remove);
}

fn map_get(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let map = args.take_map(0, "map")?;
    let key = args.take_required(1, "key")?;
    Ok(map.get(&key).cloned().unwrap_or(Value::Null))
}

fn map_has_key(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let map = args.take_map(0, "map")?;
    let key = args.take_required(1, "key")?;
    Ok(Value::Bool(map.contains_key(&key)))
}

fn map_keys(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let map = args.take_map(0, "map")?;
    Ok(Value::List {
        items: map.keys(),
        separator: ListSeparator::Comma,
        bracketed: false,
    })
}

fn map_values(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let map = args.take_map(0, "map")?;
    Ok(Value::List {
        items: map.values(),
        separator: ListSeparator::Comma,
        bracketed: false,
    })
}

fn map_merge(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let map1 = args.take_map(0, "map1")?;
    let map2 = args.take_map(1, "map2")?;
    Ok(Value::Map(map1.merge(&map2)))
}

fn map_remove(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    let mut map = args.take_map(0, "map")?;
    for key in args.rest_from(1) {
        map.remove(&key);
    }
    Ok(Value::Map(map))
}
