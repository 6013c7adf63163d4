//! Built-in SassScript functions.
//!
//! Grouped by namespace the way the reference implementation groups them;
//! all are exposed under their classic global names.  Each function takes
//! the evaluated [`CallArgs`] and the evaluator (for the RNG, environment
//! queries, and `call()`).

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::Value;

mod color;
mod list;
mod map;
mod math;
mod meta;
mod selector;
mod string;

pub use selector::selector_as_value;

pub type BuiltinFn = fn(CallArgs, &mut Evaluator) -> SassResult<Value>;

/// The global function table.
pub static GLOBAL_FUNCTIONS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
    math::register(&mut m);
    color::register(&mut m);
    list::register(&mut m);
    map::register(&mut m);
    string::register(&mut m);
    meta::register(&mut m);
    selector::register(&mut m);
    m
});

pub fn lookup(name: &str) -> Option<BuiltinFn> {
    GLOBAL_FUNCTIONS.get(name).copied()
}
