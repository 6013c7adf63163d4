//! Fully evaluated SassScript values.

use indexmap::IndexMap;

use crate::color::Color;
use crate::common::Ident;
use crate::environment::SassFunction;

pub mod map;
pub mod number;

pub use map::SassMap;
pub use number::Number;

/// How list items are joined when the list is serialized.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ListSeparator {
    Space,
    Comma,
    Slash,
    /// Not yet determined (empty and single-element lists).
    Undecided,
}

impl ListSeparator {
    pub fn join_str(self, compressed: bool) -> &'static str {
        match self {
            ListSeparator::Comma => {
                if compressed {
                    ","
                } else {
                    ", "
                }
            }
            ListSeparator::Slash => "/",
            _ => " ",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListSeparator::Comma => "comma",
            ListSeparator::Slash => "slash",
            _ => "space",
        }
    }
}

/// Whether a string value carries quotes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QuoteKind {
    Quoted,
    None,
}

/// The value bound to a rest parameter: the leftover positional arguments
/// plus any keyword arguments the callee did not name.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgList {
    pub values: Vec<Value>,
    pub keywords: IndexMap<Ident, Value>,
    pub separator: ListSeparator,
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Color(Color),
    String(String, QuoteKind),
    List {
        items: Vec<Value>,
        separator: ListSeparator,
        bracketed: bool,
    },
    Map(SassMap),
    Function(SassFunction),
    ArgList(ArgList),
}

impl Value {
    /// `false` and `null` are falsy; everything else, including `0` and the
    /// empty string, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The name `type-of()` reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Color(_) => "color",
            Value::String(..) => "string",
            Value::List { .. } => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::ArgList(_) => "arglist",
        }
    }

    /// The items this value has when treated as a list.
    ///
    /// Every value is a one-element list of itself; maps are lists of
    /// `(key value)` pairs.
    pub fn as_list(&self) -> Vec<Value> {
        match self {
            Value::List { items, .. } => items.clone(),
            Value::ArgList(args) => args.values.clone(),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| Value::List {
                    items: vec![k.clone(), v.clone()],
                    separator: ListSeparator::Space,
                    bracketed: false,
                })
                .collect(),
            other => vec![other.clone()],
        }
    }

    pub fn separator(&self) -> ListSeparator {
        match self {
            Value::List { separator, .. } => *separator,
            Value::ArgList(args) => args.separator,
            Value::Map(_) => ListSeparator::Comma,
            _ => ListSeparator::Space,
        }
    }

    /// The representation `inspect()` and `@debug` show; never fails.
    pub fn inspect(&self, precision: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if let Some(slash) = &n.as_slash {
                    format!(
                        "{}/{}",
                        Value::Number(slash.0.clone()).inspect(precision),
                        Value::Number(slash.1.clone()).inspect(precision)
                    )
                } else {
                    format!("{}{}", number::format_double(n.value, precision), n.unit_str())
                }
            }
            Value::Color(c) => c.to_css_string(false),
            Value::String(text, QuoteKind::Quoted) => serialize_quoted(text),
            Value::String(text, QuoteKind::None) => text.clone(),
            Value::List {
                items,
                separator,
                bracketed,
            } => {
                let inner = items
                    .iter()
                    .map(|v| {
                        // Nested comma lists need parens to survive re-parsing.
                        let needs_parens = *separator == ListSeparator::Comma
                            && matches!(
                                v,
                                Value::List {
                                    separator: ListSeparator::Comma,
                                    bracketed: false,
                                    ..
                                }
                            );
                        let s = v.inspect(precision);
                        if needs_parens {
                            format!("({})", s)
                        } else {
                            s
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(separator.join_str(false));
                if *bracketed {
                    format!("[{}]", inner)
                } else if items.is_empty() {
                    "()".to_string()
                } else if items.len() == 1 && *separator == ListSeparator::Comma {
                    format!("({},)", inner)
                } else {
                    inner
                }
            }
            Value::Map(map) => {
                let inner = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(precision), v.inspect(precision)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", inner)
            }
            Value::Function(f) => format!("get-function(\"{}\")", f.name()),
            Value::ArgList(args) => args
                .values
                .iter()
                .map(|v| v.inspect(precision))
                .collect::<Vec<_>>()
                .join(args.separator.join_str(false)),
        }
    }

    /// Serializes for CSS output; `Err` carries a message for values that
    /// are not representable in CSS.
    pub fn to_css_string(&self, precision: usize, compressed: bool) -> Result<String, String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => n.to_css_string(precision, compressed),
            Value::Color(c) => Ok(c.to_css_string(compressed)),
            Value::String(text, QuoteKind::Quoted) => Ok(serialize_quoted(text)),
            Value::String(text, QuoteKind::None) => Ok(text.clone()),
            Value::List {
                items,
                separator,
                bracketed,
            } => {
                let rendered: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_invisible())
                    .map(|v| v.to_css_string(precision, compressed))
                    .collect::<Result<_, _>>()?;
                if rendered.is_empty() && !bracketed {
                    return Err("() isn't a valid CSS value".to_string());
                }
                let inner = rendered.join(separator.join_str(compressed));
                if *bracketed {
                    Ok(format!("[{}]", inner))
                } else {
                    Ok(inner)
                }
            }
            Value::Map(_) => Err(format!(
                "{} isn't a valid CSS value",
                self.inspect(precision)
            )),
            Value::Function(f) => Err(format!(
                "get-function(\"{}\") isn't a valid CSS value",
                f.name()
            )),
            Value::ArgList(args) => {
                let rendered: Vec<String> = args
                    .values
                    .iter()
                    .filter(|v| !v.is_invisible())
                    .map(|v| v.to_css_string(precision, compressed))
                    .collect::<Result<_, _>>()?;
                Ok(rendered.join(args.separator.join_str(compressed)))
            }
        }
    }

    /// Values that produce no CSS output at all.
    pub fn is_invisible(&self) -> bool {
        match self {
            Value::Null => true,
            Value::List {
                items, bracketed, ..
            } => !bracketed && items.iter().all(Value::is_invisible),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality: numbers compare up to unit conversion and
    /// `NEAR_EQUAL`; strings compare by content regardless of quoting;
    /// lists require matching separator and brackets.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.eq_value(b),
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::String(a, _), Value::String(b, _)) => a == b,
            (
                Value::List {
                    items: a,
                    separator: sa,
                    bracketed: ba,
                },
                Value::List {
                    items: b,
                    separator: sb,
                    bracketed: bb,
                },
            ) => sa == sb && ba == bb && a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Map(a), Value::List { items, .. })
            | (Value::List { items, .. }, Value::Map(a)) => a.is_empty() && items.is_empty(),
            (Value::Function(a), Value::Function(b)) => a.name() == b.name(),
            (Value::ArgList(a), Value::ArgList(b)) => a == b,
            (Value::ArgList(a), other) | (other, Value::ArgList(a)) => {
                let as_list = Value::List {
                    items: a.values.clone(),
                    separator: a.separator,
                    bracketed: false,
                };
                &as_list == other
            }
            _ => false,
        }
    }
}

/// Serializes a quoted string, choosing the quote character that avoids
/// escaping where possible.
pub fn serialize_quoted(text: &str) -> String {
    let has_double = text.contains('"');
    let has_single = text.contains('\'');
    let quote = if has_double && !has_single { '\'' } else { '"' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
            out.push(c);
        } else if (c as u32) < 0x20 || c as u32 == 0x7f {
            // CSS hex escape, with the trailing space terminator.
            out.push_str(&format!("\\{:x} ", c as u32));
        } else {
            out.push(c);
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comma_list(items: Vec<Value>) -> Value {
        Value::List {
            items,
            separator: ListSeparator::Comma,
            bracketed: false,
        }
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(Number::new(0.0)).is_truthy());
        assert!(Value::String(String::new(), QuoteKind::Quoted).is_truthy());
    }

    #[test]
    fn string_equality_ignores_quotes() {
        let quoted = Value::String("abc".to_string(), QuoteKind::Quoted);
        let raw = Value::String("abc".to_string(), QuoteKind::None);
        assert_eq!(quoted, raw);
    }

    #[test]
    fn list_equality_requires_separator_match() {
        let a = comma_list(vec![Value::Bool(true)]);
        let b = Value::List {
            items: vec![Value::Bool(true)],
            separator: ListSeparator::Space,
            bracketed: false,
        };
        assert_ne!(a, b);
    }

    #[test]
    fn quote_choice() {
        assert_eq!(serialize_quoted("plain"), "\"plain\"");
        assert_eq!(serialize_quoted("it's"), "\"it's\"");
        assert_eq!(serialize_quoted("say \"hi\""), "'say \"hi\"'");
        assert_eq!(serialize_quoted("both '\""), "\"both '\\\"\"");
    }

    #[test]
    fn nonprintable_escapes() {
        assert_eq!(serialize_quoted("a\u{1}b"), "\"a\\1 b\"");
    }

    #[test]
    fn inspect_round_trippable_forms() {
        assert_eq!(Value::Null.inspect(10), "null");
        assert_eq!(comma_list(vec![]).inspect(10), "()");
        let single = comma_list(vec![Value::Number(Number::new(1.0))]);
        assert_eq!(single.inspect(10), "(1,)");
        let mut map = SassMap::new();
        map.insert(
            Value::String("a".into(), QuoteKind::None),
            Value::Number(Number::new(1.0)),
        );
        assert_eq!(Value::Map(map).inspect(10), "(a: 1)");
    }

    #[test]
    fn null_is_invisible_in_css() {
        let list = Value::List {
            items: vec![Value::Null, Value::Number(Number::new(1.0))],
            separator: ListSeparator::Space,
            bracketed: false,
        };
        assert_eq!(list.to_css_string(10, false).unwrap(), "1");
        assert!(Value::Null.is_invisible());
    }

    #[test]
    fn map_is_not_css() {
        let mut map = SassMap::new();
        map.insert(Value::Bool(true), Value::Bool(false));
        assert!(Value::Map(map).to_css_string(10, false).is_err());
    }
}
