//! The lowered CSS tree.
//!
//! The evaluator produces this tree; after evaluation it contains only
//! plain-CSS constructs (rules, declarations, at-rules); every Sass-only
//! statement has been executed away.  `cssize` then flattens it to CSS's
//! nesting model and the emitter serializes it.

use codemap::Span;

use crate::media::CssMediaQuery;
use crate::selector::SelectorList;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct CssRule {
    pub selector: SelectorList,
    pub body: Vec<CssStmt>,
    pub span: Span,
    /// Source nesting depth, for the `nested` output style.
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct CssDecl {
    pub name: String,
    pub value: Value,
    pub value_span: Span,
    pub span: Span,
    /// Custom properties (`--x`) keep their value text verbatim.
    pub custom: bool,
}

#[derive(Debug, Clone)]
pub struct CssMediaRule {
    pub queries: Vec<CssMediaQuery>,
    pub body: Vec<CssStmt>,
    pub span: Span,
}

/// The `(with: …)`/`(without: …)` clause of `@at-root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRootQuery {
    /// True for `with`, false for `without`.
    pub include: bool,
    pub names: Vec<String>,
}

impl AtRootQuery {
    /// The default query: `(without: rule)`.
    pub fn default_query() -> AtRootQuery {
        AtRootQuery {
            include: false,
            names: vec!["rule".to_string()],
        }
    }

    pub fn excludes_name(&self, name: &str) -> bool {
        if self.include {
            !self.names.iter().any(|n| n == name || n == "all")
        } else {
            self.names.iter().any(|n| n == name || n == "all")
        }
    }

    pub fn excludes_style_rules(&self) -> bool {
        self.excludes_name("rule")
    }

    pub fn excludes_media(&self) -> bool {
        self.excludes_name("media")
    }
}

#[derive(Debug, Clone)]
pub enum CssStmt {
    Rule(CssRule),
    Decl(CssDecl),
    Media(CssMediaRule),
    Supports {
        condition: String,
        body: Vec<CssStmt>,
        span: Span,
    },
    /// A block of `@keyframes`; its children are keyframe blocks.
    Keyframes {
        /// Includes any vendor prefix.
        name: String,
        prelude: String,
        body: Vec<CssStmt>,
        span: Span,
    },
    KeyframeBlock {
        selector: String,
        body: Vec<CssStmt>,
        span: Span,
    },
    UnknownAt {
        name: String,
        prelude: Option<String>,
        body: Option<Vec<CssStmt>>,
        span: Span,
    },
    /// A plain CSS `@import` left in the output.
    Import {
        url: String,
        modifiers: Option<String>,
        span: Span,
    },
    Comment {
        text: String,
        span: Span,
    },
    /// Pre-cssize marker hoisting its body out of the excluded wrappers.
    AtRoot {
        query: AtRootQuery,
        body: Vec<CssStmt>,
        span: Span,
    },
}

impl CssStmt {
    /// Whether the statement produces no output at all.
    pub fn is_invisible(&self) -> bool {
        match self {
            CssStmt::Rule(rule) => {
                rule.selector.is_invisible() || rule.body.iter().all(CssStmt::is_invisible)
            }
            CssStmt::Media(media) => media.body.iter().all(CssStmt::is_invisible),
            CssStmt::Supports { body, .. } => body.iter().all(CssStmt::is_invisible),
            CssStmt::Keyframes { .. } => false,
            CssStmt::KeyframeBlock { .. } => false,
            CssStmt::UnknownAt { .. } => false,
            CssStmt::Decl(_) | CssStmt::Import { .. } | CssStmt::Comment { .. } => false,
            CssStmt::AtRoot { body, .. } => body.iter().all(CssStmt::is_invisible),
        }
    }
}
