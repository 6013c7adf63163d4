//! Evaluated call arguments.
//!
//! [`CallArgs`] is what a callable actually receives: evaluated positional
//! values plus an insertion-ordered keyword map.  Builtins consume from it
//! by position-or-name; user callables are bound to their parameter lists
//! by the evaluator.

use codemap::Span;
use indexmap::IndexMap;

use crate::common::Ident;
use crate::error::{ErrorKind, SassError, SassResult};
use crate::value::{ListSeparator, Value};

#[derive(Debug, Clone)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: IndexMap<Ident, Value>,
    /// The separator of the caller's rest argument, if one was spread.
    pub separator: ListSeparator,
    pub span: Span,
}

impl CallArgs {
    pub fn new(span: Span) -> CallArgs {
        CallArgs {
            positional: Vec::new(),
            named: IndexMap::new(),
            separator: ListSeparator::Comma,
            span,
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_args(&self, max: usize) -> SassResult<()> {
        if self.len() > max {
            return Err(SassError::new(
                ErrorKind::InvalidValue(format!(
                    "wrong number of arguments ({} for {})",
                    self.len(),
                    max
                )),
                self.span,
            ));
        }
        Ok(())
    }

    /// Takes the argument at `position` or named `name`, if present.
    pub fn take(&mut self, position: usize, name: &str) -> Option<Value> {
        if position < self.positional.len() {
            return Some(self.positional[position].clone());
        }
        self.named.shift_remove(&Ident::new(name))
    }

    pub fn take_required(&mut self, position: usize, name: &str) -> SassResult<Value> {
        self.take(position, name).ok_or_else(|| {
            SassError::new(ErrorKind::MissingArgument(name.to_string()), self.span)
        })
    }

    pub fn take_or(&mut self, position: usize, name: &str, default: Value) -> Value {
        self.take(position, name).unwrap_or(default)
    }

    /// All positional arguments from `from` on, for variadic builtins.
    pub fn rest_from(&self, from: usize) -> Vec<Value> {
        self.positional.iter().skip(from).cloned().collect()
    }

    /// Rejects leftover keyword arguments the callee did not consume.
    pub fn assert_no_leftovers(&self) -> SassResult<()> {
        if let Some((name, _)) = self.named.first() {
            return Err(SassError::new(
                ErrorKind::InvalidValue(format!("no parameter named ${}", name)),
                self.span,
            ));
        }
        Ok(())
    }
}

// Typed accessors shared by the builtin implementations.
impl CallArgs {
    pub fn take_number(&mut self, position: usize, name: &str) -> SassResult<crate::value::Number> {
        match self.take_required(position, name)? {
            Value::Number(n) => Ok(n),
            other => Err(self.type_error(name, "a number", &other)),
        }
    }

    pub fn take_color(&mut self, position: usize, name: &str) -> SassResult<crate::color::Color> {
        match self.take_required(position, name)? {
            Value::Color(c) => Ok(c),
            other => Err(self.type_error(name, "a color", &other)),
        }
    }

    pub fn take_string(&mut self, position: usize, name: &str) -> SassResult<(String, crate::value::QuoteKind)> {
        match self.take_required(position, name)? {
            Value::String(s, q) => Ok((s, q)),
            other => Err(self.type_error(name, "a string", &other)),
        }
    }

    pub fn take_map(&mut self, position: usize, name: &str) -> SassResult<crate::value::SassMap> {
        match self.take_required(position, name)? {
            Value::Map(m) => Ok(m),
            Value::List { items, .. } if items.is_empty() => Ok(crate::value::SassMap::new()),
            other => Err(self.type_error(name, "a map", &other)),
        }
    }

    pub fn type_error(&self, name: &str, expected: &str, got: &Value) -> Box<SassError> {
        SassError::new(
            ErrorKind::TypeMismatch(format!(
                "${}: {} is not {}",
                name,
                got.inspect(10),
                expected
            )),
            self.span,
        )
    }

    pub fn error(&self, message: impl Into<String>) -> Box<SassError> {
        SassError::new(ErrorKind::InvalidValue(message.into()), self.span)
    }
}
