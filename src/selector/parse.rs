//! The selector parser.
//!
//! Parses a comma-separated list of complex selectors, alternating compound
//! and combinator productions.  Parent references (`&`) and placeholders
//! (`%foo`) are only admitted when the calling context enables them;
//! selector arguments of pseudo-classes recurse into this parser.

use codemap::Span;

use crate::error::{ErrorKind, SassError, SassResult};
use crate::limits::MAX_NESTING_DEPTH;
use crate::scanner::Scanner;

use super::{
    AttrOp, AttributeSelector, Combinator, ComplexComponent, ComplexSelector, CompoundSelector,
    Namespace, PseudoSelector, SelectorList, SimpleSelector,
};

/// Pseudo-class names whose argument is itself a selector.
const SELECTOR_PSEUDO_CLASSES: &[&str] = &[
    "not", "matches", "is", "any", "where", "current", "has", "host", "host-context",
];

/// Pseudo-element names whose argument is a selector.
const SELECTOR_PSEUDO_ELEMENTS: &[&str] = &["slotted"];

pub struct SelectorParser<'a> {
    scanner: Scanner<'a>,
    allows_parent: bool,
    allows_placeholder: bool,
    /// Depth of selector-argument pseudo recursion.
    nesting: usize,
}

impl<'a> SelectorParser<'a> {
    pub fn new(
        text: &'a str,
        span: Span,
        allows_parent: bool,
        allows_placeholder: bool,
    ) -> SelectorParser<'a> {
        SelectorParser {
            scanner: Scanner::synthetic(text, span),
            allows_parent,
            allows_placeholder,
            nesting: 0,
        }
    }

    /// Parses a selector from bare text, for tests and the `selector-*`
    /// functions, which have no meaningful span of their own.
    pub fn parse_from_text(text: &str) -> SassResult<SelectorList> {
        let mut map = codemap::CodeMap::new();
        let file = map.add_file("<selector>".to_string(), text.to_string());
        SelectorParser::new(file.source(), file.span, true, true).parse()
    }

    pub fn parse(mut self) -> SassResult<SelectorList> {
        let list = self.parse_list()?;
        self.skip_whitespace();
        if !self.scanner.is_done() {
            return Err(self.scanner.error("expected selector"));
        }
        Ok(list)
    }

    fn parse_list(&mut self) -> SassResult<SelectorList> {
        let mut components = Vec::new();
        loop {
            self.skip_whitespace();
            let mut complex = self.parse_complex()?;
            // A line break before the selector is a formatting hint only.
            complex.line_break = false;
            components.push(complex);
            self.skip_whitespace();
            if !self.scanner.scan_char(',') {
                break;
            }
        }
        Ok(SelectorList::new(components))
    }

    fn parse_complex(&mut self) -> SassResult<ComplexSelector> {
        let mut components: Vec<ComplexComponent> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.scanner.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    self.scanner.next_char();
                    components.push(ComplexComponent::Combinator(Combinator::Child));
                }
                Some('+') => {
                    self.scanner.next_char();
                    components.push(ComplexComponent::Combinator(Combinator::NextSibling));
                }
                Some('~') => {
                    self.scanner.next_char();
                    components.push(ComplexComponent::Combinator(
                        Combinator::FollowingSibling,
                    ));
                }
                _ => {
                    let compound = self.parse_compound()?;
                    components.push(ComplexComponent::Compound(compound));
                }
            }
        }
        if components.is_empty() {
            return Err(self.scanner.error("expected selector"));
        }
        Ok(ComplexSelector::new(components))
    }

    fn parse_compound(&mut self) -> SassResult<CompoundSelector> {
        let mut components = vec![self.parse_simple()?];
        while let Some(c) = self.scanner.peek() {
            if matches!(c, '.' | '#' | '%' | '[' | ':' | '&' | '*' | '|')
                || is_name_start(c)
            {
                components.push(self.parse_simple()?);
            } else {
                break;
            }
        }
        Ok(CompoundSelector::new(components))
    }

    fn parse_simple(&mut self) -> SassResult<SimpleSelector> {
        match self.scanner.peek() {
            Some('.') => {
                self.scanner.next_char();
                Ok(SimpleSelector::Class(self.expect_identifier()?))
            }
            Some('#') => {
                self.scanner.next_char();
                Ok(SimpleSelector::Id(self.expect_identifier()?))
            }
            Some('%') => {
                self.scanner.next_char();
                let name = self.expect_identifier()?;
                if !self.allows_placeholder {
                    return Err(self
                        .scanner
                        .error("placeholder selectors aren't allowed here"));
                }
                Ok(SimpleSelector::Placeholder(name))
            }
            Some('&') => {
                self.scanner.next_char();
                if !self.allows_parent {
                    return Err(self.scanner.error("parent selectors aren't allowed here"));
                }
                let suffix = self.scan_identifier_like();
                Ok(SimpleSelector::Parent {
                    suffix: if suffix.is_empty() {
                        None
                    } else {
                        Some(suffix)
                    },
                })
            }
            Some('[') => self.parse_attribute(),
            Some(':') => self.parse_pseudo(),
            _ => self.parse_type_or_universal(),
        }
    }

    /// `*`, `ns|name`, `*|*`, `|name`, or a bare type name.
    fn parse_type_or_universal(&mut self) -> SassResult<SimpleSelector> {
        if self.scanner.scan_char('*') {
            if self.scanner.scan_char('|') {
                if self.scanner.scan_char('*') {
                    return Ok(SimpleSelector::Universal(Namespace::Any));
                }
                let name = self.expect_identifier()?;
                return Ok(SimpleSelector::Type {
                    namespace: Namespace::Any,
                    name,
                });
            }
            return Ok(SimpleSelector::Universal(Namespace::None));
        }
        if self.scanner.scan_char('|') {
            if self.scanner.scan_char('*') {
                return Ok(SimpleSelector::Universal(Namespace::Empty));
            }
            let name = self.expect_identifier()?;
            return Ok(SimpleSelector::Type {
                namespace: Namespace::Empty,
                name,
            });
        }

        let name = self.expect_identifier()?;
        // `ns|elem`, but not `[a|=b]`-style operators: a lone `|`.
        if self.scanner.peek() == Some('|') && self.scanner.peek_at(1) != Some('=') {
            self.scanner.next_char();
            if self.scanner.scan_char('*') {
                return Ok(SimpleSelector::Universal(Namespace::Named(name)));
            }
            let elem = self.expect_identifier()?;
            return Ok(SimpleSelector::Type {
                namespace: Namespace::Named(name),
                name: elem,
            });
        }
        Ok(SimpleSelector::Type {
            namespace: Namespace::None,
            name,
        })
    }

    fn parse_attribute(&mut self) -> SassResult<SimpleSelector> {
        self.scanner.expect_char('[')?;
        self.skip_whitespace();

        let (namespace, name) = if self.scanner.scan_char('|') {
            (Namespace::Empty, self.expect_identifier()?)
        } else if self.scanner.scan("*|") {
            (Namespace::Any, self.expect_identifier()?)
        } else {
            let first = self.expect_identifier()?;
            if self.scanner.peek() == Some('|') && self.scanner.peek_at(1) != Some('=') {
                self.scanner.next_char();
                (Namespace::Named(first), self.expect_identifier()?)
            } else {
                (Namespace::None, first)
            }
        };
        self.skip_whitespace();

        let op = if self.scanner.scan_char(']') {
            return Ok(SimpleSelector::Attribute(AttributeSelector {
                namespace,
                name,
                op: None,
                value: None,
                modifier: None,
            }));
        } else if self.scanner.scan("~=") {
            AttrOp::Includes
        } else if self.scanner.scan("|=") {
            AttrOp::Dash
        } else if self.scanner.scan("^=") {
            AttrOp::Prefix
        } else if self.scanner.scan("$=") {
            AttrOp::Suffix
        } else if self.scanner.scan("*=") {
            AttrOp::Contains
        } else if self.scanner.scan_char('=') {
            AttrOp::Equal
        } else {
            return Err(self.scanner.error("expected attribute operator or \"]\""));
        };
        self.skip_whitespace();

        let value = match self.scanner.peek() {
            Some(q @ ('"' | '\'')) => {
                self.scanner.next_char();
                let mut text = String::new();
                text.push(q);
                loop {
                    match self.scanner.next_char() {
                        None => return Err(self.scanner.error("unterminated attribute value")),
                        Some(c) if c == q => break,
                        Some('\\') => {
                            text.push('\\');
                            if let Some(c) = self.scanner.next_char() {
                                text.push(c);
                            }
                        }
                        Some(c) => text.push(c),
                    }
                }
                text.push(q);
                text
            }
            _ => self.expect_identifier()?,
        };
        self.skip_whitespace();

        let modifier = match self.scanner.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.scanner.next_char();
                self.skip_whitespace();
                Some(c)
            }
            _ => None,
        };
        self.scanner.expect_char(']')?;
        Ok(SimpleSelector::Attribute(AttributeSelector {
            namespace,
            name,
            op: Some(op),
            value: Some(value),
            modifier,
        }))
    }

    fn parse_pseudo(&mut self) -> SassResult<SimpleSelector> {
        self.scanner.expect_char(':')?;
        let is_element = self.scanner.scan_char(':');
        let name = self.expect_identifier()?;

        if !self.scanner.scan_char('(') {
            return Ok(SimpleSelector::Pseudo(PseudoSelector {
                name,
                is_element,
                argument: None,
                selector: None,
            }));
        }
        self.skip_whitespace();

        let normalized = PseudoSelector {
            name: name.clone(),
            is_element,
            argument: None,
            selector: None,
        }
        .normalized_name();

        let takes_selector = if is_element {
            SELECTOR_PSEUDO_ELEMENTS.contains(&normalized.as_str())
        } else {
            SELECTOR_PSEUDO_CLASSES.contains(&normalized.as_str())
        };

        let (argument, selector) = if takes_selector {
            let inner = self.parse_nested_list()?;
            (None, Some(Box::new(inner)))
        } else if matches!(normalized.as_str(), "nth-child" | "nth-last-child") {
            // `<an+b> [of <selector>]`
            let mut arg = String::new();
            loop {
                match self.scanner.peek() {
                    None => return Err(self.scanner.error("expected \")\"")),
                    Some(')') => break,
                    Some(c) if c.is_whitespace() => {
                        // Stop before a possible `of` clause.
                        let state = self.scanner.state();
                        self.skip_whitespace();
                        if self.scanner.scan_ignore_case("of")
                            && self.scanner.peek().map_or(false, char::is_whitespace)
                        {
                            self.skip_whitespace();
                            let inner = self.parse_nested_list()?;
                            self.skip_whitespace();
                            self.scanner.expect_char(')')?;
                            return Ok(SimpleSelector::Pseudo(PseudoSelector {
                                name,
                                is_element,
                                argument: Some(arg.trim().to_string()),
                                selector: Some(Box::new(inner)),
                            }));
                        }
                        self.scanner.restore(state);
                        self.scanner.next_char();
                        arg.push(' ');
                    }
                    Some(c) => {
                        self.scanner.next_char();
                        arg.push(c);
                    }
                }
            }
            (Some(arg.trim().to_string()), None)
        } else {
            // Raw argument, balanced to the matching close paren.
            let mut depth = 1usize;
            let mut arg = String::new();
            loop {
                match self.scanner.peek() {
                    None => return Err(self.scanner.error("expected \")\"")),
                    Some('(') => {
                        depth += 1;
                        arg.push('(');
                        self.scanner.next_char();
                    }
                    Some(')') => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        arg.push(')');
                        self.scanner.next_char();
                    }
                    Some(c) => {
                        arg.push(c);
                        self.scanner.next_char();
                    }
                }
            }
            (Some(arg.trim().to_string()), None)
        };

        self.skip_whitespace();
        self.scanner.expect_char(')')?;
        Ok(SimpleSelector::Pseudo(PseudoSelector {
            name,
            is_element,
            argument,
            selector,
        }))
    }

    /// A selector list inside a pseudo argument, bounded in depth.
    fn parse_nested_list(&mut self) -> SassResult<SelectorList> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING_DEPTH {
            return Err(SassError::new(
                ErrorKind::RecursionLimit(MAX_NESTING_DEPTH),
                self.scanner.current_span(),
            ));
        }
        let list = self.parse_list();
        self.nesting -= 1;
        list
    }

    fn expect_identifier(&mut self) -> SassResult<String> {
        let name = self.scan_identifier_like();
        if name.is_empty() {
            return Err(self.scanner.error("expected identifier"));
        }
        Ok(name)
    }

    /// An identifier, permitting leading hyphens as CSS does.
    fn scan_identifier_like(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.scanner.peek() {
            if is_name(c) {
                name.push(c);
                self.scanner.next_char();
            } else if c == '\\' {
                // Pass escapes through verbatim.
                name.push(c);
                self.scanner.next_char();
                if let Some(escaped) = self.scanner.next_char() {
                    name.push(escaped);
                }
            } else {
                break;
            }
        }
        name
    }

    fn skip_whitespace(&mut self) {
        loop {
            self.scanner.scan_while(char::is_whitespace);
            if self.scanner.scan("/*") {
                while !self.scanner.is_done() && !self.scanner.scan("*/") {
                    self.scanner.next_char();
                }
            } else {
                break;
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_name(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}

/// Parses with a caller-supplied span and context flags, reporting failures
/// as selector errors at that span.
pub fn parse_selector(
    text: &str,
    span: Span,
    allows_parent: bool,
    allows_placeholder: bool,
) -> SassResult<SelectorList> {
    SelectorParser::new(text, span, allows_parent, allows_placeholder)
        .parse()
        .map_err(|e| -> Box<SassError> { e.with_span(span) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SelectorList {
        SelectorParser::parse_from_text(s).unwrap()
    }

    #[test]
    fn parses_compound_runs() {
        let list = parse("a.b#c");
        assert_eq!(list.to_string(), "a.b#c");
        assert_eq!(list.components.len(), 1);
        assert_eq!(list.components[0].components.len(), 1);
    }

    #[test]
    fn parses_combinators() {
        assert_eq!(parse("a > b + c ~ d e").to_string(), "a > b + c ~ d e");
    }

    #[test]
    fn parses_lists() {
        let list = parse("a, .b, #c");
        assert_eq!(list.components.len(), 3);
    }

    #[test]
    fn complex_selectors_are_bounded_after_parsing() {
        for s in ["a b", "a > b", "a + b.c"] {
            let list = parse(s);
            for complex in &list.components {
                assert!(complex.is_bounded(), "{} not bounded", s);
            }
        }
    }

    #[test]
    fn parses_parent_with_suffix() {
        let list = parse("&-suffix");
        match &list.components[0].components[0] {
            ComplexComponent::Compound(c) => match &c.components[0] {
                SimpleSelector::Parent { suffix } => {
                    assert_eq!(suffix.as_deref(), Some("-suffix"));
                }
                other => panic!("expected parent, got {:?}", other),
            },
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn parses_attribute_forms() {
        assert_eq!(parse("[href]").to_string(), "[href]");
        assert_eq!(parse("[href^=\"https\"]").to_string(), "[href^=\"https\"]");
        assert_eq!(parse("[lang|=en]").to_string(), "[lang|=en]");
        assert_eq!(parse("[title=x i]").to_string(), "[title=x i]");
    }

    #[test]
    fn parses_pseudo_selectors() {
        assert_eq!(parse(":hover").to_string(), ":hover");
        assert_eq!(parse("::before").to_string(), "::before");
        assert_eq!(parse(":nth-child(2n+1)").to_string(), ":nth-child(2n+1)");
        assert_eq!(parse(":not(.a, .b)").to_string(), ":not(.a, .b)");
        assert_eq!(
            parse(":nth-child(2n of .x)").to_string(),
            ":nth-child(2n of .x)"
        );
        assert_eq!(parse("::slotted(.a)").to_string(), "::slotted(.a)");
    }

    #[test]
    fn placeholder_flag_enforced() {
        let mut map = codemap::CodeMap::new();
        let file = map.add_file("t".to_string(), "%x".to_string());
        let result = SelectorParser::new(file.source(), file.span, true, false).parse();
        assert!(result.is_err());
    }

    #[test]
    fn namespaces() {
        assert_eq!(parse("svg|circle").to_string(), "svg|circle");
        assert_eq!(parse("*|a").to_string(), "*|a");
        assert_eq!(parse("|b").to_string(), "|b");
        assert_eq!(parse("svg|*").to_string(), "svg|*");
    }
}
