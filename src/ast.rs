//! The abstract syntax tree.
//!
//! Statements, expressions, and interpolations are tagged sums, one enum per
//! family, traversed with `match`.  Every node carries the span it was
//! parsed from; spans index into the compilation's [`crate::source::Sources`]
//! and outlive the tree.

use std::path::PathBuf;
use std::rc::Rc;

use codemap::Span;
use indexmap::IndexMap;

use crate::color::Color;
use crate::common::Ident;
use crate::value::ListSeparator;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub stmts: Vec<Stmt>,
    pub span: Span,
    /// The absolute path this sheet was loaded from, if it came from a file.
    pub path: Option<PathBuf>,
}

/// A sequence of literal text and embedded `#{…}` expressions.
///
/// Each embedded expression keeps its own span so evaluation errors point at
/// the `#{` that produced them.
#[derive(Debug, Clone)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

impl Interpolation {
    pub fn new(span: Span) -> Interpolation {
        Interpolation {
            parts: Vec::new(),
            span,
        }
    }

    pub fn literal(text: impl Into<String>, span: Span) -> Interpolation {
        Interpolation {
            parts: vec![InterpolationPart::Literal(text.into())],
            span,
        }
    }

    pub fn push_str(&mut self, text: &str) {
        if let Some(InterpolationPart::Literal(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(InterpolationPart::Literal(text.to_string()));
        }
    }

    pub fn push_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.push_str(c.encode_utf8(&mut buf));
    }

    pub fn push_expr(&mut self, expr: Expr) {
        self.parts.push(InterpolationPart::Expr(expr));
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The text, if no expression is embedded.
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [] => Some(""),
            [InterpolationPart::Literal(text)] => Some(text),
            _ => None,
        }
    }
}

/// Binary SassScript operators, lowest precedence first.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Times,
    Div,
    Rem,
}

impl BinaryOperator {
    /// Higher binds tighter.
    pub fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 0,
            And => 1,
            Eq | Ne => 2,
            Lt | Le | Gt | Ge => 3,
            Plus | Minus => 4,
            Times | Div | Rem => 5,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Or => "or",
            And => "and",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Div => "/",
            Rem => "%",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Div,
    Not,
}

/// A SassScript expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Number {
        value: f64,
        unit: Option<String>,
        span: Span,
    },
    /// A hex color literal.
    Color { value: Color, span: Span },
    /// Quoted strings, identifiers, and raw interpolated text alike.
    String {
        contents: Interpolation,
        quoted: bool,
        span: Span,
    },
    Bool { value: bool, span: Span },
    Null { span: Span },
    List {
        items: Vec<Expr>,
        separator: ListSeparator,
        bracketed: bool,
        span: Span,
    },
    Map {
        pairs: Vec<(Expr, Expr)>,
        span: Span,
    },
    Variable {
        name: Ident,
        namespace: Option<Ident>,
        span: Span,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// Whether a `/` here may be emitted literally instead of dividing
        /// (`font: 12px/16px`).
        allows_slash: bool,
        span: Span,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
        span: Span,
    },
    FunctionCall {
        name: Ident,
        namespace: Option<Ident>,
        args: ArgumentInvocation,
        span: Span,
    },
    Paren { inner: Box<Expr>, span: Span },
    /// `&` used in an expression; evaluates to the parent selector as a
    /// list, or `null` at the root.
    ParentSelector { span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. }
            | Expr::Color { span, .. }
            | Expr::String { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::List { span, .. }
            | Expr::Map { span, .. }
            | Expr::Variable { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::Paren { span, .. }
            | Expr::ParentSelector { span } => *span,
        }
    }
}

/// The arguments at a call site.
///
/// Keyword order is preserved so diagnostics match the user's source.
#[derive(Debug, Clone)]
pub struct ArgumentInvocation {
    pub positional: Vec<Expr>,
    pub keywords: IndexMap<Ident, Expr>,
    pub rest: Option<Box<Expr>>,
    pub keyword_rest: Option<Box<Expr>>,
    pub span: Span,
}

impl ArgumentInvocation {
    pub fn empty(span: Span) -> ArgumentInvocation {
        ArgumentInvocation {
            positional: Vec::new(),
            keywords: IndexMap::new(),
            rest: None,
            keyword_rest: None,
            span,
        }
    }
}

/// One declared parameter of a function or mixin.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Ident,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ParameterList {
    pub params: Vec<Parameter>,
    pub rest: Option<Ident>,
    pub span: Span,
}

impl ParameterList {
    pub fn empty(span: Span) -> ParameterList {
        ParameterList {
            params: Vec::new(),
            rest: None,
            span,
        }
    }
}

/// A `@function` or `@mixin` definition.
#[derive(Debug, Clone)]
pub struct CallableDecl {
    pub name: Ident,
    pub params: ParameterList,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `name: value`, optionally with a nested-property body.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: Interpolation,
    pub value: Option<Expr>,
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// An at-rule the compiler has no special handling for.
#[derive(Debug, Clone)]
pub struct UnknownAtRule {
    pub name: String,
    pub value: Option<Interpolation>,
    /// `None` for childless rules terminated by `;`.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MediaRule {
    pub query: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SupportsRule {
    pub condition: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AtRootRule {
    pub query: Option<Interpolation>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct KeyframesRule {
    /// Includes any vendor prefix, e.g. `-webkit-keyframes`.
    pub name: String,
    pub prelude: Interpolation,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfRule {
    /// `@if` plus any `@else if` clauses, in order.
    pub clauses: Vec<(Expr, Vec<Stmt>)>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForRule {
    pub var: Ident,
    pub from: Expr,
    pub to: Expr,
    /// `to` rather than `through`.
    pub exclusive: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EachRule {
    pub vars: Vec<Ident>,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileRule {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub params: ParameterList,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IncludeRule {
    pub name: Ident,
    pub namespace: Option<Ident>,
    pub args: ArgumentInvocation,
    pub content: Option<ContentBlock>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContentRule {
    pub args: ArgumentInvocation,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: Ident,
    pub namespace: Option<Ident>,
    pub value: Expr,
    /// `!default`
    pub guarded: bool,
    /// `!global`
    pub global: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnRule {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExtendRule {
    pub selector: Interpolation,
    pub optional: bool,
    pub span: Span,
}

/// `@warn`, `@error`, or `@debug`.
#[derive(Debug, Clone)]
pub struct DiagnosticRule {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportRule {
    pub imports: Vec<ImportArg>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ImportArg {
    /// Left in the output as a plain CSS `@import`.
    Static(StaticImport),
    /// Resolved through the importer chain and spliced in.
    Dynamic(DynamicImport),
}

#[derive(Debug, Clone)]
pub struct StaticImport {
    pub url: Interpolation,
    /// Trailing media queries or supports conditions, verbatim.
    pub modifiers: Option<Interpolation>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct DynamicImport {
    pub url: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum UseNamespace {
    /// Derived from the file stem.
    Default,
    /// `as *`.
    Global,
    Named(String),
}

#[derive(Debug, Clone)]
pub struct UseRule {
    pub url: String,
    pub namespace: UseNamespace,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForwardRule {
    pub url: String,
    pub prefix: Option<String>,
    pub show: Option<Vec<Ident>>,
    pub hide: Option<Vec<Ident>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LoudComment {
    pub text: Interpolation,
    pub span: Span,
}

/// A statement; the nodes with side effects on the output tree.
#[derive(Debug, Clone)]
pub enum Stmt {
    StyleRule(StyleRule),
    Declaration(Declaration),
    UnknownAtRule(UnknownAtRule),
    Media(MediaRule),
    Supports(SupportsRule),
    AtRoot(AtRootRule),
    Keyframes(KeyframesRule),
    If(IfRule),
    For(ForRule),
    Each(EachRule),
    While(WhileRule),
    FunctionDecl(Rc<CallableDecl>),
    MixinDecl(Rc<CallableDecl>),
    Include(IncludeRule),
    Content(ContentRule),
    VariableDecl(VariableDecl),
    Return(ReturnRule),
    Extend(ExtendRule),
    Warn(DiagnosticRule),
    Error(DiagnosticRule),
    Debug(DiagnosticRule),
    Import(ImportRule),
    Use(UseRule),
    Forward(ForwardRule),
    LoudComment(LoudComment),
}
