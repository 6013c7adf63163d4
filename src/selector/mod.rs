//! The selector model.
//!
//! Selectors form a layered composite: a [`SelectorList`] is a
//! comma-separated list of [`ComplexSelector`]s, each an alternation of
//! [`CompoundSelector`]s and [`Combinator`]s, and a compound is a run of
//! [`SimpleSelector`]s matching one element.  Selectors are immutable value
//! types; parent resolution and extension build new ones.  They hash and
//! compare structurally so the extension engine can key tables on them.

use std::fmt;
use std::hash::{Hash, Hasher};

mod extend;
mod parse;
mod resolve;
mod superselector;
mod unify;
mod weave;

pub use extend::{check_unsatisfied, extend_selector_list, Extension};
pub use parse::{parse_selector, SelectorParser};
pub use resolve::{resolve_parent_selectors, ParentError};
pub use superselector::{complex_is_superselector, list_is_superselector};
pub use unify::{unify_complex, unify_compound, unify_lists};
pub use weave::weave;

/// The namespace part of a type or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// No namespace written: `elem`.
    None,
    /// Explicit empty namespace: `|elem`.
    Empty,
    /// Any namespace: `*|elem`.
    Any,
    Named(String),
}

impl Namespace {
    fn prefix(&self) -> String {
        match self {
            Namespace::None => String::new(),
            Namespace::Empty => "|".to_string(),
            Namespace::Any => "*|".to_string(),
            Namespace::Named(ns) => format!("{}|", ns),
        }
    }

    /// Unification of namespaces, where `*|` and an unwritten namespace
    /// accept anything.
    pub fn unify(&self, other: &Namespace) -> Option<Namespace> {
        match (self, other) {
            (a, b) if a == b => Some(a.clone()),
            (Namespace::None, other) | (other, Namespace::None) => Some(other.clone()),
            (Namespace::Any, other) | (other, Namespace::Any) => Some(other.clone()),
            _ => None,
        }
    }
}

/// The operator of an attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOp {
    Equal,
    Includes,
    Dash,
    Prefix,
    Suffix,
    Contains,
}

impl AttrOp {
    fn symbol(self) -> &'static str {
        match self {
            AttrOp::Equal => "=",
            AttrOp::Includes => "~=",
            AttrOp::Dash => "|=",
            AttrOp::Prefix => "^=",
            AttrOp::Suffix => "$=",
            AttrOp::Contains => "*=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    pub namespace: Namespace,
    pub name: String,
    pub op: Option<AttrOp>,
    /// The value exactly as written, including quotes if any.
    pub value: Option<String>,
    /// A case-sensitivity modifier (`i` or `s`).
    pub modifier: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PseudoSelector {
    pub name: String,
    /// `::before` rather than `:hover`.
    pub is_element: bool,
    /// A non-selector argument (`2n+1` of `:nth-child(2n+1)`).
    pub argument: Option<String>,
    /// A selector argument (`:not(.a)`, `:is(a, b)`).
    pub selector: Option<Box<SelectorList>>,
}

impl PseudoSelector {
    /// The name with any vendor prefix stripped, lowercased.
    pub fn normalized_name(&self) -> String {
        let lower = self.name.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix('-') {
            match rest.find('-') {
                Some(i) => rest[i + 1..].to_string(),
                None => lower,
            }
        } else {
            lower
        }
    }
}

/// A selector matching one aspect of one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Universal(Namespace),
    Type { namespace: Namespace, name: String },
    Id(String),
    Class(String),
    Placeholder(String),
    Attribute(AttributeSelector),
    Pseudo(PseudoSelector),
    /// `&`, with an optional suffix (`&-foo`); removed by parent resolution.
    Parent { suffix: Option<String> },
}

impl SimpleSelector {
    /// Whether only one selector of this kind can match a given element.
    pub fn is_unique(&self) -> bool {
        match self {
            SimpleSelector::Id(_) => true,
            SimpleSelector::Pseudo(p) => p.is_element,
            _ => false,
        }
    }

    /// Appends a parent-reference suffix (`&-foo`), when this selector kind
    /// admits one.
    pub fn add_suffix(&self, suffix: &str) -> Option<SimpleSelector> {
        match self {
            SimpleSelector::Type { namespace, name } => Some(SimpleSelector::Type {
                namespace: namespace.clone(),
                name: format!("{}{}", name, suffix),
            }),
            SimpleSelector::Id(name) => Some(SimpleSelector::Id(format!("{}{}", name, suffix))),
            SimpleSelector::Class(name) => {
                Some(SimpleSelector::Class(format!("{}{}", name, suffix)))
            }
            SimpleSelector::Placeholder(name) => {
                Some(SimpleSelector::Placeholder(format!("{}{}", name, suffix)))
            }
            SimpleSelector::Pseudo(p) if p.argument.is_none() && p.selector.is_none() => {
                Some(SimpleSelector::Pseudo(PseudoSelector {
                    name: format!("{}{}", p.name, suffix),
                    is_element: p.is_element,
                    argument: None,
                    selector: None,
                }))
            }
            _ => None,
        }
    }

    /// The specificity contribution, in units of [`SPECIFICITY_BASE`].
    pub fn max_specificity(&self) -> i32 {
        match self {
            SimpleSelector::Universal(_) => 0,
            SimpleSelector::Type { .. } => 1,
            SimpleSelector::Id(_) => SPECIFICITY_BASE * SPECIFICITY_BASE,
            SimpleSelector::Parent { .. } => 0,
            SimpleSelector::Pseudo(p) => {
                if p.normalized_name() == "where" {
                    0
                } else if let Some(selector) = &p.selector {
                    selector
                        .components
                        .iter()
                        .map(ComplexSelector::max_specificity)
                        .max()
                        .unwrap_or(0)
                } else if p.is_element {
                    1
                } else {
                    SPECIFICITY_BASE
                }
            }
            _ => SPECIFICITY_BASE,
        }
    }

    pub fn min_specificity(&self) -> i32 {
        match self {
            SimpleSelector::Pseudo(p) if p.selector.is_some() => {
                if p.normalized_name() == "where" {
                    0
                } else {
                    p.selector
                        .as_ref()
                        .map(|s| {
                            s.components
                                .iter()
                                .map(ComplexSelector::min_specificity)
                                .min()
                                .unwrap_or(0)
                        })
                        .unwrap_or(0)
                }
            }
            other => other.max_specificity(),
        }
    }
}

pub const SPECIFICITY_BASE: i32 = 1000;

/// A juxtaposition of simple selectors that must all match one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CompoundSelector {
    pub components: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn new(components: Vec<SimpleSelector>) -> CompoundSelector {
        CompoundSelector { components }
    }

    pub fn single(simple: SimpleSelector) -> CompoundSelector {
        CompoundSelector {
            components: vec![simple],
        }
    }

    pub fn max_specificity(&self) -> i32 {
        self.components.iter().map(SimpleSelector::max_specificity).sum()
    }

    pub fn min_specificity(&self) -> i32 {
        self.components.iter().map(SimpleSelector::min_specificity).sum()
    }

    /// Placeholders never produce output.
    pub fn is_invisible(&self) -> bool {
        self.components
            .iter()
            .any(|s| matches!(s, SimpleSelector::Placeholder(_)))
    }

    pub fn has_parent(&self) -> bool {
        self.components.iter().any(|s| {
            matches!(s, SimpleSelector::Parent { .. })
                || matches!(s, SimpleSelector::Pseudo(p)
                    if p.selector.as_ref().map_or(false, |sel| sel.contains_parent()))
        })
    }
}

/// One of the four CSS combinators, descendant excluded; a descendant
/// relationship is the absence of a combinator between two compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    Child,
    NextSibling,
    FollowingSibling,
}

impl Combinator {
    pub fn symbol(self) -> char {
        match self {
            Combinator::Child => '>',
            Combinator::NextSibling => '+',
            Combinator::FollowingSibling => '~',
        }
    }
}

/// Either a compound selector or a combinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplexComponent {
    Compound(CompoundSelector),
    Combinator(Combinator),
}

impl ComplexComponent {
    pub fn as_compound(&self) -> Option<&CompoundSelector> {
        match self {
            ComplexComponent::Compound(c) => Some(c),
            ComplexComponent::Combinator(_) => None,
        }
    }

    pub fn as_combinator(&self) -> Option<Combinator> {
        match self {
            ComplexComponent::Combinator(c) => Some(*c),
            ComplexComponent::Compound(_) => None,
        }
    }
}

/// A sequence of compound selectors joined by combinators.
#[derive(Debug, Clone, Eq)]
pub struct ComplexSelector {
    pub components: Vec<ComplexComponent>,
    /// Whether the selector was written after a line break in a list; only
    /// affects output formatting.
    pub line_break: bool,
}

impl ComplexSelector {
    pub fn new(components: Vec<ComplexComponent>) -> ComplexSelector {
        ComplexSelector {
            components,
            line_break: false,
        }
    }

    pub fn max_specificity(&self) -> i32 {
        self.components
            .iter()
            .filter_map(ComplexComponent::as_compound)
            .map(CompoundSelector::max_specificity)
            .sum()
    }

    pub fn min_specificity(&self) -> i32 {
        self.components
            .iter()
            .filter_map(ComplexComponent::as_compound)
            .map(CompoundSelector::min_specificity)
            .sum()
    }

    pub fn is_invisible(&self) -> bool {
        self.components
            .iter()
            .filter_map(ComplexComponent::as_compound)
            .any(CompoundSelector::is_invisible)
    }

    pub fn contains_parent(&self) -> bool {
        self.components
            .iter()
            .filter_map(ComplexComponent::as_compound)
            .any(CompoundSelector::has_parent)
    }

    /// Whether the sequence neither begins nor ends with a combinator.
    pub fn is_bounded(&self) -> bool {
        !self.components.is_empty()
            && matches!(self.components.first(), Some(ComplexComponent::Compound(_)))
            && matches!(self.components.last(), Some(ComplexComponent::Compound(_)))
    }
}

impl PartialEq for ComplexSelector {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Hash for ComplexSelector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

/// A comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorList {
    pub components: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(components: Vec<ComplexSelector>) -> SelectorList {
        SelectorList { components }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains_parent(&self) -> bool {
        self.components.iter().any(ComplexSelector::contains_parent)
    }

    pub fn is_invisible(&self) -> bool {
        self.components.is_empty()
            || self.components.iter().all(ComplexSelector::is_invisible)
    }

    /// Drops complex selectors containing placeholders.
    pub fn without_placeholders(&self) -> SelectorList {
        SelectorList {
            components: self
                .components
                .iter()
                .filter(|c| !c.is_invisible())
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Universal(ns) => write!(f, "{}*", ns.prefix()),
            SimpleSelector::Type { namespace, name } => {
                write!(f, "{}{}", namespace.prefix(), name)
            }
            SimpleSelector::Id(name) => write!(f, "#{}", name),
            SimpleSelector::Class(name) => write!(f, ".{}", name),
            SimpleSelector::Placeholder(name) => write!(f, "%{}", name),
            SimpleSelector::Attribute(attr) => {
                write!(f, "[{}{}", attr.namespace.prefix(), attr.name)?;
                if let (Some(op), Some(value)) = (attr.op, &attr.value) {
                    write!(f, "{}{}", op.symbol(), value)?;
                    if let Some(modifier) = attr.modifier {
                        write!(f, " {}", modifier)?;
                    }
                }
                write!(f, "]")
            }
            SimpleSelector::Pseudo(p) => {
                write!(f, ":{}{}", if p.is_element { ":" } else { "" }, p.name)?;
                match (&p.argument, &p.selector) {
                    (Some(arg), Some(sel)) => write!(f, "({} of {})", arg, sel),
                    (Some(arg), None) => write!(f, "({})", arg),
                    (None, Some(sel)) => write!(f, "({})", sel),
                    (None, None) => Ok(()),
                }
            }
            SimpleSelector::Parent { suffix } => {
                write!(f, "&{}", suffix.as_deref().unwrap_or(""))
            }
        }
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for simple in &self.components {
            write!(f, "{}", simple)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match component {
                ComplexComponent::Compound(compound) => write!(f, "{}", compound)?,
                ComplexComponent::Combinator(c) => write!(f, "{}", c.symbol())?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, complex) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", complex)?;
        }
        Ok(())
    }
}
