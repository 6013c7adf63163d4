//! Introspection functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::common::Ident;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{QuoteKind, SassMap, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("type-of", type_of);
    m.insert("unit", unit);
    m.insert("unitless", unitless);
    m.insert("comparable", comparable);
    m.insert("feature-exists", feature_exists);
    m.insert("variable-exists", variable_exists);
    m.insert("global-variable-exists", global_variable_exists);
    m.insert("function-exists", function_exists);
    m.insert("mixin-exists", mixin_exists);
    m.insert("inspect", inspect);
    m.insert("call", call);
    m.insert("keywords", keywords);
    m.insert("get-function", get_function);
    m.insert("content-exists", content_exists);
    m.insert("if", if_function);
}

/// Features this implementation reports as present.
const FEATURES: &[&str] = &[
    "global-variable-shadowing",
    "extend-selector-pseudoclass",
    "units-level-3",
    "at-error",
    "custom-property",
];

fn type_of(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let value = args.take_required(0, "value")?;
    Ok(Value::String(value.type_name().to_string(), QuoteKind::None))
}

fn unit(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(Value::String(n.unit_str(), QuoteKind::Quoted))
}

fn unitless(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let n = args.take_number(0, "number")?;
    Ok(Value::Bool(n.is_unitless()))
}

fn comparable(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let n1 = args.take_number(0, "number1")?;
    let n2 = args.take_number(1, "number2")?;
    Ok(Value::Bool(n1.coerced_to(&n2).is_some()))
}

fn feature_exists(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (feature, _) = args.take_string(0, "feature")?;
    Ok(Value::Bool(FEATURES.contains(&feature.as_str())))
}

fn variable_exists(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (name, _) = args.take_string(0, "name")?;
    Ok(Value::Bool(evaluator.variable_exists(&Ident::new(&name))))
}

fn global_variable_exists(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (name, _) = args.take_string(0, "name")?;
    Ok(Value::Bool(
        evaluator.global_variable_exists(&Ident::new(&name)),
    ))
}

fn function_exists(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (name, _) = args.take_string(0, "name")?;
    Ok(Value::Bool(evaluator.function_exists(&Ident::new(&name))))
}

fn mixin_exists(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let (name, _) = args.take_string(0, "name")?;
    Ok(Value::Bool(evaluator.mixin_exists(&Ident::new(&name))))
}

fn inspect(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let value = args.take_required(0, "value")?;
    Ok(Value::String(
        value.inspect(evaluator.precision()),
        QuoteKind::None,
    ))
}

fn call(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    let function = args.take_required(0, "function")?;
    let rest = CallArgs {
        positional: args.rest_from(1),
        named: args.named.clone(),
        separator: args.separator,
        span: args.span,
    };
    let function = match function {
        Value::Function(f) => f,
        // Calling by name is the legacy form.
        Value::String(name, _) => evaluator
            .get_function_value(&Ident::new(&name))
            .ok_or_else(|| args.error(format!("function {}() not found", name)))?,
        other => return Err(args.type_error("function", "a function reference", &other)),
    };
    evaluator.call_sass_function(function, rest)
}

fn keywords(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    match args.take_required(0, "args")? {
        Value::ArgList(arglist) => {
            let map: SassMap = arglist
                .keywords
                .iter()
                .map(|(k, v)| {
                    (
                        Value::String(k.to_string(), QuoteKind::None),
                        v.clone(),
                    )
                })
                .collect();
            Ok(Value::Map(map))
        }
        other => Err(args.type_error("args", "an argument list", &other)),
    }
}

fn get_function(mut args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let (name, _) = args.take_string(0, "name")?;
    let _css = args.take(1, "css").map_or(false, |v| v.is_truthy());
    let function = evaluator
        .get_function_value(&Ident::new(&name))
        .ok_or_else(|| args.error(format!("function {}() not found", name)))?;
    Ok(Value::Function(function))
}

fn content_exists(args: CallArgs, evaluator: &mut Evaluator) -> SassResult<Value> {
    args.max_args(0)?;
    Ok(Value::Bool(evaluator.content_exists()))
}

/// `if()` with eagerly evaluated arguments; the evaluator special-cases the
/// lazy form before arguments are evaluated, so this is only reached via
/// `call()`.
fn if_function(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let condition = args.take_required(0, "condition")?;
    let if_true = args.take_required(1, "if-true")?;
    let if_false = args.take_required(2, "if-false")?;
    Ok(if condition.is_truthy() {
        if_true
    } else {
        if_false
    })
}
