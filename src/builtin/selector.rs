//! Selector functions.
//!
//! Selectors cross the value boundary as strings or lists of strings; the
//! results use the canonical nested-list form (a comma list of space lists
//! of simple-selector strings).

use std::collections::HashMap;

use super::BuiltinFn;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::selector::{
    extend_selector_list, list_is_superselector, resolve_parent_selectors, unify_lists,
    ComplexComponent, Extension, SelectorList, SelectorParser,
};
use crate::value::{ListSeparator, QuoteKind, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("selector-nest", selector_nest);
    m.insert("selector-append", selector_append);
    m.insert("selector-extend", selector_extend);
    m.insert("selector-replace", selector_replace);
    m.insert("selector-unify", selector_unify);
    m.insert("is-superselector", is_superselector);
    m.insert("simple-selectors", simple_selectors);
    m.insert("selector-parse", selector_parse);
}

/// Renders a selector argument (string, or list of strings) to text.
fn selector_text(args: &CallArgs, value: &Value) -> SassResult<String> {
    fn flatten(value: &Value) -> Option<String> {
        match value {
            Value::String(s, _) => Some(s.clone()),
            Value::Number(n) => n.to_css_string(10, false).ok(),
            Value::List { items, separator, .. } => {
                let joiner = match separator {
                    ListSeparator::Comma => ", ",
                    _ => " ",
                };
                let parts: Vec<String> =
                    items.iter().map(flatten).collect::<Option<_>>()?;
                Some(parts.join(joiner))
            }
            _ => None,
        }
    }
    flatten(value).ok_or_else(|| args.type_error("selector", "a valid selector", value))
}

fn parse_selector_arg(args: &CallArgs, value: &Value) -> SassResult<SelectorList> {
    let text = selector_text(args, value)?;
    SelectorParser::parse_from_text(&text).map_err(|e| e.with_span(args.span))
}

/// The nested-list value form of a selector, as `&` and the `selector-*`
/// functions expose it.
pub fn selector_as_value(list: &SelectorList) -> Value {
    selector_value(list)
}

/// The nested-list value form of a selector.
fn selector_value(list: &SelectorList) -> Value {
    let complexes = list
        .components
        .iter()
        .map(|complex| {
            let items = complex
                .components
                .iter()
                .map(|component| {
                    let text = match component {
                        ComplexComponent::Compound(c) => c.to_string(),
                        ComplexComponent::Combinator(c) => c.symbol().to_string(),
                    };
                    Value::String(text, QuoteKind::None)
                })
                .collect();
            Value::List {
                items,
                separator: ListSeparator::Space,
                bracketed: false,
            }
        })
        .collect();
    Value::List {
        items: complexes,
        separator: ListSeparator::Comma,
        bracketed: false,
    }
}

fn selector_nest(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    if args.positional.is_empty() {
        return Err(args.error("$selectors: At least one selector must be passed"));
    }
    let mut result: Option<SelectorList> = None;
    for value in &args.positional {
        let list = parse_selector_arg(&args, value)?;
        result = Some(match result {
            None => {
                if list.contains_parent() {
                    return Err(args.error("Parent selectors aren't allowed here"));
                }
                list
            }
            Some(parent) => resolve_parent_selectors(&list, Some(&parent), true)
                .map_err(|_| args.error("invalid parent selector"))?,
        });
    }
    Ok(selector_value(&result.expect("non-empty")))
}

fn selector_append(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    if args.positional.is_empty() {
        return Err(args.error("$selectors: At least one selector must be passed"));
    }
    let mut result: Option<SelectorList> = None;
    for value in &args.positional {
        let list = parse_selector_arg(&args, value)?;
        result = Some(match result {
            None => list,
            Some(acc) => {
                let mut combined = Vec::new();
                for complex1 in &acc.components {
                    for complex2 in &list.components {
                        let first = complex2.components.first();
                        let rest_simples = match first {
                            Some(ComplexComponent::Compound(c)) => c.components.clone(),
                            _ => {
                                return Err(args.error(format!(
                                    "can't append {} to {}",
                                    complex2, complex1
                                )))
                            }
                        };
                        let mut components = complex1.components.clone();
                        match components.last_mut() {
                            Some(ComplexComponent::Compound(last)) => {
                                last.components.extend(rest_simples);
                            }
                            _ => {
                                return Err(args.error(format!(
                                    "can't append {} to {}",
                                    complex2, complex1
                                )))
                            }
                        }
                        components.extend(complex2.components[1..].iter().cloned());
                        combined.push(crate::selector::ComplexSelector::new(components));
                    }
                }
                SelectorList::new(combined)
            }
        });
    }
    Ok(selector_value(&result.expect("non-empty")))
}

/// Builds the extensions equivalent to `@extend $extendee { $extender }`.
fn extensions_for(
    args: &CallArgs,
    extendee: &SelectorList,
    extender: &SelectorList,
) -> SassResult<Vec<Extension>> {
    let mut extensions = Vec::new();
    for target_complex in &extendee.components {
        let target = match target_complex.components.as_slice() {
            [ComplexComponent::Compound(compound)] => compound.clone(),
            _ => return Err(args.error("complex selectors may not be extended")),
        };
        for extender_complex in &extender.components {
            extensions.push(Extension::new(
                target.clone(),
                extender_complex.clone(),
                args.span,
                true,
                None,
            ));
        }
    }
    Ok(extensions)
}

fn selector_extend(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let selector = args.take_required(0, "selector")?;
    let extendee = args.take_required(1, "extendee")?;
    let extender = args.take_required(2, "extender")?;
    let selector = parse_selector_arg(&args, &selector)?;
    let extendee = parse_selector_arg(&args, &extendee)?;
    let extender = parse_selector_arg(&args, &extender)?;

    let extensions = extensions_for(&args, &extendee, &extender)?;
    let result = extend_selector_list(&selector, None, &extensions)?;
    Ok(selector_value(&result))
}

fn selector_replace(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let selector = args.take_required(0, "selector")?;
    let original = args.take_required(1, "original")?;
    let replacement = args.take_required(2, "replacement")?;
    let selector = parse_selector_arg(&args, &selector)?;
    let original = parse_selector_arg(&args, &original)?;
    let replacement = parse_selector_arg(&args, &replacement)?;

    let extensions = extensions_for(&args, &original, &replacement)?;
    let extended = extend_selector_list(&selector, None, &extensions)?;
    // Replacement keeps only the results where the original is gone.
    let originals: Vec<_> = original
        .components
        .iter()
        .filter_map(|c| c.components.first())
        .filter_map(ComplexComponent::as_compound)
        .flat_map(|c| c.components.iter().cloned())
        .collect();
    let replaced: Vec<_> = extended
        .components
        .into_iter()
        .filter(|complex| {
            !complex
                .components
                .iter()
                .filter_map(ComplexComponent::as_compound)
                .any(|compound| originals.iter().any(|s| compound.components.contains(s)))
        })
        .collect();
    Ok(selector_value(&SelectorList::new(replaced)))
}

fn selector_unify(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let selector1 = args.take_required(0, "selector1")?;
    let selector2 = args.take_required(1, "selector2")?;
    let list1 = parse_selector_arg(&args, &selector1)?;
    let list2 = parse_selector_arg(&args, &selector2)?;
    let unified = unify_lists(&list1, &list2);
    if unified.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(selector_value(&unified))
    }
}

fn is_superselector(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let sup = args.take_required(0, "super")?;
    let sub = args.take_required(1, "sub")?;
    let sup = parse_selector_arg(&args, &sup)?;
    let sub = parse_selector_arg(&args, &sub)?;
    Ok(Value::Bool(list_is_superselector(&sup, &sub)))
}

fn simple_selectors(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let selector = args.take_required(0, "selector")?;
    let list = parse_selector_arg(&args, &selector)?;
    let compound = match list.components.as_slice() {
        [complex] => match complex.components.as_slice() {
            [ComplexComponent::Compound(compound)] => compound.clone(),
            _ => return Err(args.error("$selector: expected a compound selector")),
        },
        _ => return Err(args.error("$selector: expected a compound selector")),
    };
    Ok(Value::List {
        items: compound
            .components
            .iter()
            .map(|s| Value::String(s.to_string(), QuoteKind::None))
            .collect(),
        separator: ListSeparator::Comma,
        bracketed: false,
    })
}

fn selector_parse(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let selector = args.take_required(0, "selector")?;
    let list = parse_selector_arg(&args, &selector)?;
    Ok(selector_value(&list))
}
