//! Error types.
//!
//! All failures surface as a [`SassError`]: a tagged [`ErrorKind`], the span
//! of the offending source, and the Sass backtrace at the point of throwing.
//! Errors are not caught inside evaluation; a parser error aborts parsing and
//! an evaluator error aborts the compile.

use std::fmt;

use codemap::Span;
use serde_json::json;
use thiserror::Error;

use crate::source::Sources;

/// One frame of the Sass backtrace.
///
/// A frame is pushed for every mixin include, function call, `@content`
/// invocation, and dynamic import.
#[derive(Debug, Clone)]
pub struct Trace {
    /// What was entered: a mixin or function name, or `@import`.
    pub name: String,
    /// Where the call site is.
    pub span: Span,
}

/// The different kinds of failure a compilation can produce.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("incompatible units {0} and {1}")]
    IncompatibleUnits(String, String),

    #[error("division by zero")]
    ZeroDivision,

    #[error("undefined operation: {0}")]
    UndefinedOperation(String),

    #[error("missing argument ${0}")]
    MissingArgument(String),

    #[error("the target selector {0} was not found")]
    UnsatisfiedExtend(String),

    #[error("you may not @extend selectors across media queries")]
    ExtendAcrossMedia,

    #[error("invalid parent selector for {0}")]
    InvalidParent(String),

    #[error("top-level selectors may not contain the parent selector \"&\"")]
    TopLevelParent,

    #[error("too much recursion (exceeded depth {0})")]
    RecursionLimit(usize),

    /// A user `@error` or a failure reported by a host function.
    #[error("{0}")]
    Custom(String),

    #[error("{0}")]
    Io(String),
}

impl ErrorKind {
    /// The short label used when formatting the error for the user.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Syntax(_) => "Syntax",
            ErrorKind::TypeMismatch(_) => "TypeMismatch",
            ErrorKind::InvalidValue(_) => "InvalidValue",
            ErrorKind::IncompatibleUnits(..) => "IncompatibleUnits",
            ErrorKind::ZeroDivision => "ZeroDivision",
            ErrorKind::UndefinedOperation(_) => "UndefinedOperation",
            ErrorKind::MissingArgument(_) => "MissingArgument",
            ErrorKind::UnsatisfiedExtend(_) => "UnsatisfiedExtend",
            ErrorKind::ExtendAcrossMedia => "ExtendAcrossMedia",
            ErrorKind::InvalidParent(_) => "InvalidParent",
            ErrorKind::TopLevelParent => "TopLevelParent",
            ErrorKind::RecursionLimit(_) => "RecursionLimit",
            ErrorKind::Custom(_) => "Error",
            ErrorKind::Io(_) => "IO",
        }
    }
}

/// A fatal compilation error.
#[derive(Debug, Clone)]
pub struct SassError {
    kind: ErrorKind,
    span: Option<Span>,
    traces: Vec<Trace>,
}

pub type SassResult<T> = Result<T, Box<SassError>>;

impl SassError {
    pub fn new(kind: ErrorKind, span: Span) -> Box<SassError> {
        Box::new(SassError {
            kind,
            span: Some(span),
            traces: Vec::new(),
        })
    }

    /// An error with no position, e.g. a failure before any source is loaded.
    pub fn raw(kind: ErrorKind) -> Box<SassError> {
        Box::new(SassError {
            kind,
            span: None,
            traces: Vec::new(),
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Attaches the evaluator's call stack; the innermost frame last.
    pub fn with_traces(mut self: Box<Self>, traces: Vec<Trace>) -> Box<Self> {
        if self.traces.is_empty() {
            self.traces = traces;
        }
        self
    }

    /// Fills in a span if the error was raised without one.
    pub fn with_span(mut self: Box<Self>, span: Span) -> Box<Self> {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// The user-visible rendering, with the backtrace and source position.
    pub fn format(&self, sources: &Sources, unicode: bool) -> String {
        let arrow = if unicode { "╷" } else { "|" };
        let mut out = format!("{}: {}\n", self.kind.label(), self.kind);
        for trace in self.traces.iter().rev() {
            let loc = sources.look_up(trace.span);
            out.push_str(&format!(
                "   {} {}, from line {} of {}\n",
                arrow,
                trace.name,
                loc.begin.line + 1,
                loc.file.name(),
            ));
        }
        if let Some(span) = self.span {
            let loc = sources.look_up(span);
            out.push_str(&format!(
                "  on line {} column {} of {}\n",
                loc.begin.line + 1,
                loc.begin.column + 1,
                loc.file.name(),
            ));
        }
        out
    }

    /// The structured JSON form exposed to embedders.
    pub fn to_json(&self, sources: &Sources, unicode: bool) -> serde_json::Value {
        let traces: Vec<serde_json::Value> = self
            .traces
            .iter()
            .map(|trace| {
                let loc = sources.look_up(trace.span);
                json!({
                    "path": loc.file.name(),
                    "line": loc.begin.line + 1,
                    "column": loc.begin.column + 1,
                    "content": trace.name,
                })
            })
            .collect();
        json!({
            "status": 1,
            "what": format!("{}", self.kind),
            "traces": traces,
            "formatted": self.format(sources, unicode),
        })
    }
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.kind)
    }
}

impl std::error::Error for SassError {}

impl From<std::io::Error> for Box<SassError> {
    fn from(e: std::io::Error) -> Box<SassError> {
        SassError::raw(ErrorKind::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_position() {
        let mut sources = Sources::new();
        let file = sources.add("in.scss".to_string(), "a { b: $x; }".to_string());
        let err = SassError::new(
            ErrorKind::Custom("undefined variable $x".to_string()),
            file.span.subspan(7, 9),
        );
        let text = err.format(&sources, false);
        assert!(text.starts_with("Error: undefined variable $x"));
        assert!(text.contains("on line 1 column 8 of in.scss"));
    }

    #[test]
    fn json_form_carries_status_and_traces() {
        let mut sources = Sources::new();
        let file = sources.add("in.scss".to_string(), "@include m;".to_string());
        let err = SassError::new(ErrorKind::ZeroDivision, file.span.subspan(0, 8)).with_traces(
            vec![Trace {
                name: "m".to_string(),
                span: file.span.subspan(0, 8),
            }],
        );
        let v = err.to_json(&sources, false);
        assert_eq!(v["status"], 1);
        assert_eq!(v["traces"].as_array().map(|t| t.len()), Some(1));
    }
}
