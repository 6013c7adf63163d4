//! Compile Sass stylesheets to CSS.
//!
//! This crate compiles the Sass stylesheet language, both the
//! brace-delimited SCSS dialect and the whitespace-sensitive indented
//! dialect, into plain CSS, with optional source maps.  It implements the
//! full semantic pipeline: parsing, `@import`/`@use` resolution, SassScript
//! evaluation against lexically scoped environments, `@extend` resolution
//! with selector weaving, CSS-tree flattening, and serialization in four
//! output styles.
//!
//! # Basic usage
//!
//! * Create a [`Compiler`], optionally configured with [`Options`].
//! * Call [`Compiler::compile_path`] or [`Compiler::compile_string`].
//! * Read the CSS text (and source map, warnings, and included files) from
//!   the [`CompileResult`].
//!
//! ```no_run
//! use rsass::{Compiler, Options, OutputStyle};
//!
//! fn main() -> Result<(), rsass::CompileError> {
//!     let compiler = Compiler::with_options(
//!         Options::default().with_style(OutputStyle::Expanded),
//!     );
//!     let result = compiler.compile_path("styles/main.scss")?;
//!     print!("{}", result.css);
//!     Ok(())
//! }
//! ```
//!
//! # Extending the compiler
//!
//! Two traits let the embedding application participate in compilation:
//!
//! * [`Importer`] resolves `@import`/`@use` URLs before the file system is
//!   consulted: for virtual file systems, in-memory sources, or remapping.
//! * [`HostFunction`] exposes an application function to SassScript.
//!
//! Compilations are synchronous and single-threaded; a compiler instance
//! shares no state with any other, so callers that want concurrency simply
//! use one compiler per thread.

#![warn(nonstandard_style, rust_2018_idioms, unused)]
#![warn(trivial_casts, trivial_numeric_casts)]

pub use crate::api::{
    Compiler, CompileError, CompileResult, HostFunction, Options, OutputStyle, SourceMapMode,
};
pub use crate::color::Color;
pub use crate::environment::SassFunction;
pub use crate::error::{ErrorKind, SassError, SassResult};
pub use crate::eval::CallArgs;
pub use crate::importer::{Importer, ImporterResult};
pub use crate::session::Warning;
pub use crate::source::Syntax;
pub use crate::value::{ArgList, ListSeparator, Number, QuoteKind, SassMap, Value};

#[macro_use]
pub mod log;

mod api;
mod ast;
mod builtin;
mod color;
mod common;
mod css_tree;
mod cssize;
mod emitter;
mod environment;
mod error;
mod eval;
mod importer;
mod indented;
mod limits;
mod media;
mod parse;
mod scanner;
mod selector;
mod session;
mod source;
mod srcmap;
mod unit;
mod value;

#[doc(hidden)]
pub mod doctest_only {
    pub use crate::eval::CallArgs;
    pub use crate::selector::{
        list_is_superselector, unify_lists, SelectorList, SelectorParser,
    };
    pub use crate::value::number::format_double;
}
