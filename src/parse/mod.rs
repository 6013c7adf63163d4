//! The stylesheet parser.
//!
//! A recursive-descent parser over the SCSS grammar.  The indented dialect
//! is rewritten to SCSS ahead of time (see [`crate::indented`]), so this is
//! the only stylesheet grammar implementation.  Ambiguous productions
//! (declaration vs. style rule) are resolved by speculation: the scanner
//! position is snapshotted, the declaration interpretation is attempted,
//! and the snapshot restored when it fails.

mod expression;

use std::path::PathBuf;
use std::rc::Rc;

use codemap::Span;

use crate::ast::{
    ArgumentInvocation, AtRootRule, CallableDecl, ContentBlock, ContentRule, Declaration,
    DiagnosticRule, DynamicImport, EachRule, Expr, ExtendRule, ForRule, ForwardRule, IfRule,
    ImportArg, ImportRule, IncludeRule, Interpolation, KeyframesRule, LoudComment, MediaRule,
    Parameter, ParameterList, ReturnRule, StaticImport, Stmt, StyleRule, Stylesheet,
    SupportsRule, UnknownAtRule, UseNamespace, UseRule, VariableDecl, WhileRule,
};
use crate::common::Ident;
use crate::error::{ErrorKind, SassError, SassResult};
use crate::importer::is_plain_css_import;
use crate::limits::MAX_NESTING_DEPTH;
use crate::scanner::Scanner;
use crate::source::Syntax;
use crate::value::ListSeparator;

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    #[allow(dead_code)]
    syntax: Syntax,
    nesting: usize,
}

/// Parses one source file into a stylesheet.
pub fn parse_stylesheet(
    text: &str,
    span: Span,
    syntax: Syntax,
    path: Option<PathBuf>,
) -> SassResult<Stylesheet> {
    let mut parser = Parser {
        scanner: Scanner::new(text, span),
        syntax,
        nesting: 0,
    };
    let stmts = parser.parse_statements(false)?;
    Ok(Stylesheet { stmts, span, path })
}

impl<'a> Parser<'a> {
    fn enter_nested(&mut self) -> SassResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING_DEPTH {
            return Err(SassError::new(
                ErrorKind::RecursionLimit(MAX_NESTING_DEPTH),
                self.scanner.current_span(),
            ));
        }
        Ok(())
    }

    fn leave_nested(&mut self) {
        self.nesting -= 1;
    }

    /// Statements up to EOF or a closing brace.
    fn parse_statements(&mut self, until_brace: bool) -> SassResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_whitespace_and_silent_comments();
            match self.scanner.peek() {
                None => {
                    if until_brace {
                        return Err(self.scanner.error("expected \"}\""));
                    }
                    break;
                }
                Some('}') if until_brace => break,
                Some('}') => return Err(self.scanner.error("unexpected \"}\"")),
                Some(';') => {
                    self.scanner.next_char();
                }
                Some('/') if self.scanner.peek_at(1) == Some('*') => {
                    stmts.push(Stmt::LoudComment(self.parse_loud_comment()?));
                }
                Some('$') => stmts.push(self.parse_variable_declaration(None)?),
                Some('@') => {
                    if let Some(stmt) = self.parse_at_rule(!until_brace)? {
                        stmts.push(stmt);
                    }
                }
                _ => {
                    // A namespaced variable assignment (`ns.$x: …`) also
                    // begins with an identifier.
                    if let Some(stmt) = self.try_namespaced_variable()? {
                        stmts.push(stmt);
                        continue;
                    }
                    stmts.push(self.parse_declaration_or_style_rule(!until_brace)?);
                }
            }
        }
        Ok(stmts)
    }

    fn parse_block(&mut self) -> SassResult<Vec<Stmt>> {
        self.scanner.expect_char('{')?;
        self.enter_nested()?;
        let stmts = self.parse_statements(true)?;
        self.scanner.expect_char('}')?;
        self.leave_nested();
        Ok(stmts)
    }

    // ---- comments & whitespace ------------------------------------------

    fn skip_whitespace_and_silent_comments(&mut self) {
        loop {
            self.scanner.scan_while(char::is_whitespace);
            if self.scanner.peek() == Some('/') && self.scanner.peek_at(1) == Some('/') {
                self.scanner.scan_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    /// Whitespace only; silent comments are not valid inside values.
    fn skip_whitespace(&mut self) {
        self.scanner.scan_while(char::is_whitespace);
    }

    fn parse_loud_comment(&mut self) -> SassResult<LoudComment> {
        let start = self.scanner.position();
        self.scanner.scan("/*");
        let mut text = Interpolation::new(self.scanner.current_span());
        text.push_str("/*");
        loop {
            match self.scanner.peek() {
                None => return Err(self.scanner.error("unterminated comment")),
                Some('*') if self.scanner.peek_at(1) == Some('/') => {
                    self.scanner.next_char();
                    self.scanner.next_char();
                    text.push_str("*/");
                    break;
                }
                Some('#') if self.scanner.peek_at(1) == Some('{') => {
                    let expr = self.parse_interpolated_expr()?;
                    text.push_expr(expr);
                }
                Some(c) => {
                    self.scanner.next_char();
                    text.push_char(c);
                }
            }
        }
        let span = self.scanner.span_from(start);
        text.span = span;
        Ok(LoudComment { text, span })
    }

    // ---- identifiers -----------------------------------------------------

    /// A plain (non-interpolated) CSS identifier.
    fn parse_identifier(&mut self) -> SassResult<String> {
        let mut name = String::new();
        if self.scanner.peek() == Some('-') {
            name.push('-');
            self.scanner.next_char();
            if self.scanner.peek() == Some('-') {
                name.push('-');
                self.scanner.next_char();
            }
        }
        match self.scanner.peek() {
            Some(c) if is_name_start(c) => {}
            _ => return Err(self.scanner.error("expected identifier")),
        }
        name.push_str(self.scanner.scan_while(is_name));
        Ok(name)
    }

    fn scan_plain_identifier(&mut self) -> Option<String> {
        let state = self.scanner.state();
        match self.parse_identifier() {
            Ok(name) => Some(name),
            Err(_) => {
                self.scanner.restore(state);
                None
            }
        }
    }

    /// `$name`.
    fn parse_variable_name(&mut self) -> SassResult<Ident> {
        self.scanner.expect_char('$')?;
        Ok(Ident::new(&self.parse_identifier()?))
    }

    // ---- variable declarations ------------------------------------------

    fn parse_variable_declaration(&mut self, namespace: Option<Ident>) -> SassResult<Stmt> {
        let start = self.scanner.position();
        let name = self.parse_variable_name()?;
        self.skip_whitespace();
        self.scanner.expect_char(':')?;
        self.skip_whitespace();
        let value = self.parse_expression()?;

        let mut guarded = false;
        let mut global = false;
        loop {
            self.skip_whitespace();
            if self.scanner.scan_char('!') {
                let flag = self.parse_identifier()?;
                match flag.as_str() {
                    "default" => guarded = true,
                    "global" => global = true,
                    other => {
                        return Err(self
                            .scanner
                            .error(format!("invalid flag \"!{}\"", other)))
                    }
                }
            } else {
                break;
            }
        }
        self.expect_statement_end()?;
        Ok(Stmt::VariableDecl(VariableDecl {
            name,
            namespace,
            value,
            guarded,
            global,
            span: self.scanner.span_from(start),
        }))
    }

    /// `ns.$var: value;`; speculative, since `ns` could open a selector.
    fn try_namespaced_variable(&mut self) -> SassResult<Option<Stmt>> {
        let state = self.scanner.state();
        let name = match self.scan_plain_identifier() {
            Some(name) => name,
            None => return Ok(None),
        };
        if self.scanner.peek() == Some('.') && self.scanner.peek_at(1) == Some('$') {
            self.scanner.next_char();
            let stmt = self.parse_variable_declaration(Some(Ident::new(&name)))?;
            return Ok(Some(stmt));
        }
        self.scanner.restore(state);
        Ok(None)
    }

    fn expect_statement_end(&mut self) -> SassResult<()> {
        self.skip_whitespace();
        match self.scanner.peek() {
            None | Some('}') => Ok(()),
            Some(';') => {
                self.scanner.next_char();
                Ok(())
            }
            _ => Err(self.scanner.error("expected \";\"")),
        }
    }

    // ---- declaration vs. style rule -------------------------------------

    fn parse_declaration_or_style_rule(&mut self, at_root: bool) -> SassResult<Stmt> {
        if !at_root {
            let state = self.scanner.state();
            match self.try_parse_declaration() {
                Ok(Some(decl)) => return Ok(decl),
                Ok(None) | Err(_) => self.scanner.restore(state),
            }
        }
        self.parse_style_rule()
    }

    /// `Ok(None)` means "this is a style rule"; `Err` only for real syntax
    /// errors inside an unambiguous declaration.
    fn try_parse_declaration(&mut self) -> SassResult<Option<Stmt>> {
        let start = self.scanner.position();
        let name = match self.parse_interpolated_identifier()? {
            Some(name) => name,
            None => return Ok(None),
        };
        let custom = name.as_plain().map_or(false, |n| n.starts_with("--"));
        self.skip_whitespace();
        if !self.scanner.scan_char(':') {
            return Ok(None);
        }
        // `a::before` and friends: a second colon means selector.
        if self.scanner.peek() == Some(':') {
            return Ok(None);
        }

        if custom {
            self.skip_whitespace();
            let value = self.parse_custom_property_value()?;
            self.expect_statement_end()?;
            return Ok(Some(Stmt::Declaration(Declaration {
                name,
                value: Some(value),
                body: None,
                span: self.scanner.span_from(start),
            })));
        }

        self.skip_whitespace();
        // Nested properties: `font: { family: serif; }`.
        if self.scanner.peek() == Some('{') {
            let body = self.parse_block()?;
            return Ok(Some(Stmt::Declaration(Declaration {
                name,
                value: None,
                body: Some(body),
                span: self.scanner.span_from(start),
            })));
        }

        let mut value = self.parse_expression()?;
        self.skip_whitespace();
        if self.scanner.peek() == Some('!') {
            let excl_start = self.scanner.position();
            self.scanner.next_char();
            let flag = self.parse_identifier()?;
            if flag.eq_ignore_ascii_case("important") {
                let flag_span = self.scanner.span_from(excl_start);
                let span = value.span().merge(flag_span);
                value = Expr::List {
                    items: vec![
                        value,
                        Expr::String {
                            contents: Interpolation::literal("!important", flag_span),
                            quoted: false,
                            span: flag_span,
                        },
                    ],
                    separator: ListSeparator::Space,
                    bracketed: false,
                    span,
                };
            } else {
                return Err(self.scanner.error(format!("invalid flag \"!{}\"", flag)));
            }
        }
        self.skip_whitespace();
        match self.scanner.peek() {
            Some('{') => {
                // A block here is either nested properties with a leading
                // value (`font: 12px { … }`) or a style rule whose selector
                // happened to parse as name-colon-value (`a:hover { … }`).
                // Identifier-shaped values could continue a selector, so
                // they make this a style rule.
                if could_be_selector(&value) {
                    return Ok(None);
                }
                let body = self.parse_block()?;
                Ok(Some(Stmt::Declaration(Declaration {
                    name,
                    value: Some(value),
                    body: Some(body),
                    span: self.scanner.span_from(start),
                })))
            }
            None | Some(';') | Some('}') => {
                self.expect_statement_end()?;
                Ok(Some(Stmt::Declaration(Declaration {
                    name,
                    value: Some(value),
                    body: None,
                    span: self.scanner.span_from(start),
                })))
            }
            _ => Ok(None),
        }
    }

    /// The raw value of a custom property, preserved verbatim (modulo
    /// interpolation).
    fn parse_custom_property_value(&mut self) -> SassResult<Expr> {
        let start = self.scanner.position();
        let mut contents = Interpolation::new(self.scanner.current_span());
        let mut brace_depth = 0usize;
        let mut paren_depth = 0usize;
        loop {
            match self.scanner.peek() {
                None => break,
                Some(';') if brace_depth == 0 && paren_depth == 0 => break,
                Some('}') if brace_depth == 0 => break,
                Some('{') => {
                    brace_depth += 1;
                    contents.push_char('{');
                    self.scanner.next_char();
                }
                Some('}') => {
                    brace_depth -= 1;
                    contents.push_char('}');
                    self.scanner.next_char();
                }
                Some('(') => {
                    paren_depth += 1;
                    contents.push_char('(');
                    self.scanner.next_char();
                }
                Some(')') => {
                    paren_depth = paren_depth.saturating_sub(1);
                    contents.push_char(')');
                    self.scanner.next_char();
                }
                Some('#') if self.scanner.peek_at(1) == Some('{') => {
                    let expr = self.parse_interpolated_expr()?;
                    contents.push_expr(expr);
                }
                Some(c) => {
                    contents.push_char(c);
                    self.scanner.next_char();
                }
            }
        }
        let span = self.scanner.span_from(start);
        contents.span = span;
        Ok(Expr::String {
            contents,
            quoted: false,
            span,
        })
    }

    // ---- style rules -----------------------------------------------------

    fn parse_style_rule(&mut self) -> SassResult<Stmt> {
        let start = self.scanner.position();
        let selector = self.parse_interpolation_until_brace()?;
        if selector.is_empty() {
            return Err(self.scanner.error("expected selector"));
        }
        let body = self.parse_block()?;
        Ok(Stmt::StyleRule(StyleRule {
            selector,
            body,
            span: self.scanner.span_from(start),
        }))
    }

    /// Raw interpolated text up to (not including) `{`; quoted strings pass
    /// through and trailing whitespace is trimmed.
    fn parse_interpolation_until_brace(&mut self) -> SassResult<Interpolation> {
        let start = self.scanner.position();
        let mut interp = Interpolation::new(self.scanner.current_span());
        loop {
            match self.scanner.peek() {
                None => return Err(self.scanner.error("expected \"{\"")),
                Some('{') => break,
                Some('}') | Some(';') => {
                    return Err(self.scanner.error("expected \"{\""));
                }
                Some('#') if self.scanner.peek_at(1) == Some('{') => {
                    let expr = self.parse_interpolated_expr()?;
                    interp.push_expr(expr);
                }
                Some(q @ ('"' | '\'')) => {
                    self.scanner.next_char();
                    interp.push_char(q);
                    loop {
                        match self.scanner.next_char() {
                            None => return Err(self.scanner.error("unterminated string")),
                            Some(c) if c == q => {
                                interp.push_char(c);
                                break;
                            }
                            Some('\\') => {
                                interp.push_char('\\');
                                if let Some(c) = self.scanner.next_char() {
                                    interp.push_char(c);
                                }
                            }
                            Some(c) => interp.push_char(c),
                        }
                    }
                }
                Some('/') if self.scanner.peek_at(1) == Some('/') => {
                    self.scanner.scan_while(|c| c != '\n');
                }
                Some('/') if self.scanner.peek_at(1) == Some('*') => {
                    self.scanner.scan("/*");
                    while !self.scanner.is_done() && !self.scanner.scan("*/") {
                        self.scanner.next_char();
                    }
                }
                Some(c) => {
                    self.scanner.next_char();
                    // Collapse newlines; the selector parser has no use for
                    // them beyond the line-break formatting hint.
                    interp.push_char(if c == '\n' { ' ' } else { c });
                }
            }
        }
        let mut interp = trim_interpolation(interp);
        interp.span = self.scanner.span_from(start);
        Ok(interp)
    }

    /// Raw interpolated text until `{`, `;`, or `}` at top level.
    fn parse_interpolation_until_statement_end(&mut self) -> SassResult<Interpolation> {
        let start = self.scanner.position();
        let mut interp = Interpolation::new(self.scanner.current_span());
        let mut paren_depth = 0usize;
        loop {
            match self.scanner.peek() {
                None => break,
                Some('{') if paren_depth == 0 => break,
                Some(';') | Some('}') if paren_depth == 0 => break,
                Some('(') => {
                    paren_depth += 1;
                    interp.push_char('(');
                    self.scanner.next_char();
                }
                Some(')') => {
                    paren_depth = paren_depth.saturating_sub(1);
                    interp.push_char(')');
                    self.scanner.next_char();
                }
                Some('#') if self.scanner.peek_at(1) == Some('{') => {
                    let expr = self.parse_interpolated_expr()?;
                    interp.push_expr(expr);
                }
                Some(c) => {
                    self.scanner.next_char();
                    interp.push_char(if c == '\n' { ' ' } else { c });
                }
            }
        }
        let mut interp = trim_interpolation(interp);
        interp.span = self.scanner.span_from(start);
        Ok(interp)
    }

    /// An interpolated identifier, or `None` if the input can't start one.
    fn parse_interpolated_identifier(&mut self) -> SassResult<Option<Interpolation>> {
        let start = self.scanner.position();
        let mut interp = Interpolation::new(self.scanner.current_span());
        let mut any = false;
        loop {
            match self.scanner.peek() {
                Some('#') if self.scanner.peek_at(1) == Some('{') => {
                    let expr = self.parse_interpolated_expr()?;
                    interp.push_expr(expr);
                    any = true;
                }
                Some(c) if is_name(c) || (!any && c == '-') => {
                    self.scanner.next_char();
                    interp.push_char(c);
                    any = true;
                }
                _ => break,
            }
        }
        if !any {
            return Ok(None);
        }
        let span = self.scanner.span_from(start);
        interp.span = span;
        Ok(Some(interp))
    }

    /// `#{expression}`.
    fn parse_interpolated_expr(&mut self) -> SassResult<Expr> {
        self.scanner.scan("#{");
        self.skip_whitespace();
        let expr = self.parse_expression()?;
        self.skip_whitespace();
        self.scanner.expect_char('}')?;
        Ok(expr)
    }

    // ---- at-rules --------------------------------------------------------

    fn parse_at_rule(&mut self, at_root: bool) -> SassResult<Option<Stmt>> {
        let start = self.scanner.position();
        self.scanner.expect_char('@')?;
        let name = self.parse_identifier()?;

        match name.as_str() {
            "use" => self.parse_use(start).map(Some),
            "forward" => self.parse_forward(start).map(Some),
            "import" => self.parse_import(start).map(Some),
            "mixin" => self.parse_callable_decl(start, true).map(Some),
            "function" => self.parse_callable_decl(start, false).map(Some),
            "include" => self.parse_include(start).map(Some),
            "content" => {
                let args = if self.scanner.peek() == Some('(') {
                    self.parse_argument_invocation()?
                } else {
                    ArgumentInvocation::empty(self.scanner.current_span())
                };
                self.expect_statement_end()?;
                Ok(Some(Stmt::Content(ContentRule {
                    args,
                    span: self.scanner.span_from(start),
                })))
            }
            "return" => {
                self.skip_whitespace();
                let value = self.parse_expression()?;
                self.expect_statement_end()?;
                Ok(Some(Stmt::Return(ReturnRule {
                    value,
                    span: self.scanner.span_from(start),
                })))
            }
            "if" => self.parse_if(start).map(Some),
            "else" => Err(SassError::new(
                ErrorKind::Syntax("@else without matching @if".to_string()),
                self.scanner.span_from(start),
            )),
            "each" => self.parse_each(start).map(Some),
            "for" => self.parse_for(start).map(Some),
            "while" => {
                self.skip_whitespace();
                let cond = self.parse_expression()?;
                let body = self.parse_block_after_whitespace()?;
                Ok(Some(Stmt::While(WhileRule {
                    cond,
                    body,
                    span: self.scanner.span_from(start),
                })))
            }
            "extend" => {
                self.skip_whitespace();
                let mut selector = self.parse_interpolation_until_statement_end()?;
                let mut optional = false;
                if let Some(plain) = selector.as_plain() {
                    if let Some(stripped) = plain.strip_suffix("!optional") {
                        let text = stripped.trim_end().to_string();
                        let span = selector.span;
                        selector = Interpolation::literal(text, span);
                        optional = true;
                    }
                }
                self.expect_statement_end()?;
                Ok(Some(Stmt::Extend(ExtendRule {
                    selector,
                    optional,
                    span: self.scanner.span_from(start),
                })))
            }
            "media" => {
                self.skip_whitespace();
                let query = self.parse_interpolation_until_brace()?;
                let body = self.parse_block()?;
                Ok(Some(Stmt::Media(MediaRule {
                    query,
                    body,
                    span: self.scanner.span_from(start),
                })))
            }
            "supports" => {
                self.skip_whitespace();
                let condition = self.parse_interpolation_until_brace()?;
                let body = self.parse_block()?;
                Ok(Some(Stmt::Supports(SupportsRule {
                    condition,
                    body,
                    span: self.scanner.span_from(start),
                })))
            }
            "at-root" => self.parse_at_root(start).map(Some),
            "warn" | "error" | "debug" => {
                self.skip_whitespace();
                let value = self.parse_expression()?;
                self.expect_statement_end()?;
                let rule = DiagnosticRule {
                    value,
                    span: self.scanner.span_from(start),
                };
                Ok(Some(match name.as_str() {
                    "warn" => Stmt::Warn(rule),
                    "error" => Stmt::Error(rule),
                    _ => Stmt::Debug(rule),
                }))
            }
            "charset" => {
                self.skip_whitespace();
                // Consume and drop the charset string.
                let _ = self.parse_interpolation_until_statement_end()?;
                self.expect_statement_end()?;
                Ok(None)
            }
            _ if name == "keyframes" || name.ends_with("-keyframes") => {
                self.skip_whitespace();
                let prelude = self.parse_interpolation_until_brace()?;
                let body = self.parse_block()?;
                Ok(Some(Stmt::Keyframes(KeyframesRule {
                    name,
                    prelude,
                    body,
                    span: self.scanner.span_from(start),
                })))
            }
            _ => {
                let _ = at_root;
                self.skip_whitespace();
                let value = self.parse_interpolation_until_statement_end()?;
                let value = if value.is_empty() { None } else { Some(value) };
                self.skip_whitespace();
                let body = if self.scanner.peek() == Some('{') {
                    Some(self.parse_block()?)
                } else {
                    self.expect_statement_end()?;
                    None
                };
                Ok(Some(Stmt::UnknownAtRule(UnknownAtRule {
                    name,
                    value,
                    body,
                    span: self.scanner.span_from(start),
                })))
            }
        }
    }

    fn parse_block_after_whitespace(&mut self) -> SassResult<Vec<Stmt>> {
        self.skip_whitespace();
        self.parse_block()
    }

    fn parse_quoted_url(&mut self) -> SassResult<String> {
        self.skip_whitespace();
        let quote = match self.scanner.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.scanner.error("expected string")),
        };
        self.scanner.next_char();
        let mut url = String::new();
        loop {
            match self.scanner.next_char() {
                None => return Err(self.scanner.error("unterminated string")),
                Some(c) if c == quote => break,
                Some(c) => url.push(c),
            }
        }
        Ok(url)
    }

    fn parse_use(&mut self, start: usize) -> SassResult<Stmt> {
        let url = self.parse_quoted_url()?;
        self.skip_whitespace();
        let namespace = if self.scanner.scan_ignore_case("as") {
            self.skip_whitespace();
            if self.scanner.scan_char('*') {
                UseNamespace::Global
            } else {
                UseNamespace::Named(self.parse_identifier()?)
            }
        } else {
            UseNamespace::Default
        };
        self.expect_statement_end()?;
        Ok(Stmt::Use(UseRule {
            url,
            namespace,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_forward(&mut self, start: usize) -> SassResult<Stmt> {
        let url = self.parse_quoted_url()?;
        let mut prefix = None;
        let mut show = None;
        let mut hide = None;
        loop {
            self.skip_whitespace();
            if self.scanner.scan_ignore_case("as") {
                self.skip_whitespace();
                let p = self.parse_identifier()?;
                self.scanner.expect_char('*')?;
                prefix = Some(p);
            } else if self.scanner.scan_ignore_case("show") {
                show = Some(self.parse_member_list()?);
            } else if self.scanner.scan_ignore_case("hide") {
                hide = Some(self.parse_member_list()?);
            } else {
                break;
            }
        }
        self.expect_statement_end()?;
        Ok(Stmt::Forward(ForwardRule {
            url,
            prefix,
            show,
            hide,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_member_list(&mut self) -> SassResult<Vec<Ident>> {
        let mut members = Vec::new();
        loop {
            self.skip_whitespace();
            if self.scanner.scan_char('$') {
                members.push(Ident::new(&self.parse_identifier()?));
            } else {
                members.push(Ident::new(&self.parse_identifier()?));
            }
            self.skip_whitespace();
            if !self.scanner.scan_char(',') {
                break;
            }
        }
        Ok(members)
    }

    fn parse_import(&mut self, start: usize) -> SassResult<Stmt> {
        let mut imports = Vec::new();
        loop {
            self.skip_whitespace();
            let arg_start = self.scanner.position();
            if self.scanner.scan_ignore_case("url(") {
                // `url(...)` imports always stay plain CSS.
                let mut url = String::from("url(");
                let mut depth = 1;
                while depth > 0 {
                    match self.scanner.next_char() {
                        None => return Err(self.scanner.error("expected \")\"")),
                        Some('(') => {
                            depth += 1;
                            url.push('(');
                        }
                        Some(')') => {
                            depth -= 1;
                            url.push(')');
                        }
                        Some(c) => url.push(c),
                    }
                }
                let span = self.scanner.span_from(arg_start);
                let modifiers = self.parse_import_modifiers()?;
                imports.push(ImportArg::Static(StaticImport {
                    url: Interpolation::literal(url, span),
                    modifiers,
                    span,
                }));
            } else {
                let url = self.parse_quoted_url()?;
                let span = self.scanner.span_from(arg_start);
                let modifiers = self.parse_import_modifiers()?;
                if modifiers.is_some() || is_plain_css_import(&url) {
                    imports.push(ImportArg::Static(StaticImport {
                        url: Interpolation::literal(format!("\"{}\"", url), span),
                        modifiers,
                        span,
                    }));
                } else {
                    imports.push(ImportArg::Dynamic(DynamicImport { url, span }));
                }
            }
            self.skip_whitespace();
            if !self.scanner.scan_char(',') {
                break;
            }
        }
        self.expect_statement_end()?;
        Ok(Stmt::Import(ImportRule {
            imports,
            span: self.scanner.span_from(start),
        }))
    }

    /// Trailing media queries of a static import, raw.
    fn parse_import_modifiers(&mut self) -> SassResult<Option<Interpolation>> {
        self.skip_whitespace();
        match self.scanner.peek() {
            None | Some(';') | Some('}') | Some(',') => Ok(None),
            _ => {
                let interp = self.parse_interpolation_until_statement_end()?;
                if interp.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(interp))
                }
            }
        }
    }

    fn parse_callable_decl(&mut self, start: usize, is_mixin: bool) -> SassResult<Stmt> {
        self.skip_whitespace();
        let name = Ident::new(&self.parse_identifier()?);
        self.skip_whitespace();
        let params = if self.scanner.peek() == Some('(') {
            self.parse_parameter_list()?
        } else if is_mixin {
            ParameterList::empty(self.scanner.current_span())
        } else {
            return Err(self.scanner.error("expected \"(\""));
        };
        let body = self.parse_block_after_whitespace()?;
        let decl = Rc::new(CallableDecl {
            name,
            params,
            body,
            span: self.scanner.span_from(start),
        });
        Ok(if is_mixin {
            Stmt::MixinDecl(decl)
        } else {
            Stmt::FunctionDecl(decl)
        })
    }

    fn parse_parameter_list(&mut self) -> SassResult<ParameterList> {
        let start = self.scanner.position();
        self.scanner.expect_char('(')?;
        let mut params = Vec::new();
        let mut rest = None;
        loop {
            self.skip_whitespace();
            if self.scanner.scan_char(')') {
                break;
            }
            let name = self.parse_variable_name()?;
            self.skip_whitespace();
            if self.scanner.scan("...") {
                rest = Some(name);
                self.skip_whitespace();
                self.scanner.expect_char(')')?;
                break;
            }
            let default = if self.scanner.scan_char(':') {
                self.skip_whitespace();
                Some(self.parse_expression_until_comma()?)
            } else {
                None
            };
            params.push(Parameter { name, default });
            self.skip_whitespace();
            if !self.scanner.scan_char(',') {
                self.scanner.expect_char(')')?;
                break;
            }
        }
        Ok(ParameterList {
            params,
            rest,
            span: self.scanner.span_from(start),
        })
    }

    fn parse_include(&mut self, start: usize) -> SassResult<Stmt> {
        self.skip_whitespace();
        let first = Ident::new(&self.parse_identifier()?);
        let (namespace, name) = if self.scanner.scan_char('.') {
            (Some(first), Ident::new(&self.parse_identifier()?))
        } else {
            (None, first)
        };
        self.skip_whitespace();
        let args = if self.scanner.peek() == Some('(') {
            self.parse_argument_invocation()?
        } else {
            ArgumentInvocation::empty(self.scanner.current_span())
        };
        self.skip_whitespace();

        let content_params = if self.scanner.scan_ignore_case("using") {
            self.skip_whitespace();
            Some(self.parse_parameter_list()?)
        } else {
            None
        };
        self.skip_whitespace();

        let content = if self.scanner.peek() == Some('{') {
            let block_start = self.scanner.position();
            let body = self.parse_block()?;
            Some(ContentBlock {
                params: content_params
                    .unwrap_or_else(|| ParameterList::empty(self.scanner.current_span())),
                body,
                span: self.scanner.span_from(block_start),
            })
        } else {
            if content_params.is_some() {
                return Err(self.scanner.error("expected \"{\""));
            }
            self.expect_statement_end()?;
            None
        };

        Ok(Stmt::Include(IncludeRule {
            name,
            namespace,
            args,
            content,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_if(&mut self, start: usize) -> SassResult<Stmt> {
        self.skip_whitespace();
        let cond = self.parse_expression()?;
        let body = self.parse_block_after_whitespace()?;
        let mut clauses = vec![(cond, body)];
        let mut else_body = None;

        loop {
            let state = self.scanner.state();
            self.skip_whitespace_and_silent_comments();
            if !self.scanner.scan("@else") {
                self.scanner.restore(state);
                break;
            }
            self.skip_whitespace();
            if self.scanner.scan("if") && self.scanner.peek().map_or(false, char::is_whitespace)
            {
                self.skip_whitespace();
                let cond = self.parse_expression()?;
                let body = self.parse_block_after_whitespace()?;
                clauses.push((cond, body));
            } else {
                let body = self.parse_block_after_whitespace()?;
                else_body = Some(body);
                break;
            }
        }

        Ok(Stmt::If(IfRule {
            clauses,
            else_body,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_each(&mut self, start: usize) -> SassResult<Stmt> {
        self.skip_whitespace();
        let mut vars = vec![self.parse_variable_name()?];
        loop {
            self.skip_whitespace();
            if self.scanner.scan_char(',') {
                self.skip_whitespace();
                vars.push(self.parse_variable_name()?);
            } else {
                break;
            }
        }
        self.skip_whitespace();
        if !self.scanner.scan_ignore_case("in") {
            return Err(self.scanner.error("expected \"in\""));
        }
        self.skip_whitespace();
        let iterable = self.parse_expression()?;
        let body = self.parse_block_after_whitespace()?;
        Ok(Stmt::Each(EachRule {
            vars,
            iterable,
            body,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_for(&mut self, start: usize) -> SassResult<Stmt> {
        self.skip_whitespace();
        let var = self.parse_variable_name()?;
        self.skip_whitespace();
        if !self.scanner.scan_ignore_case("from") {
            return Err(self.scanner.error("expected \"from\""));
        }
        self.skip_whitespace();
        let from = self.parse_expression_until_keyword(&["to", "through"])?;
        self.skip_whitespace();
        let exclusive = if self.scanner.scan_ignore_case("through") {
            false
        } else if self.scanner.scan_ignore_case("to") {
            true
        } else {
            return Err(self.scanner.error("expected \"to\" or \"through\""));
        };
        self.skip_whitespace();
        let to = self.parse_expression()?;
        let body = self.parse_block_after_whitespace()?;
        Ok(Stmt::For(ForRule {
            var,
            from,
            to,
            exclusive,
            body,
            span: self.scanner.span_from(start),
        }))
    }

    fn parse_at_root(&mut self, start: usize) -> SassResult<Stmt> {
        self.skip_whitespace();
        match self.scanner.peek() {
            Some('(') => {
                let query = self.parse_interpolation_until_brace()?;
                let body = self.parse_block()?;
                Ok(Stmt::AtRoot(AtRootRule {
                    query: Some(query),
                    body,
                    span: self.scanner.span_from(start),
                }))
            }
            Some('{') => {
                let body = self.parse_block()?;
                Ok(Stmt::AtRoot(AtRootRule {
                    query: None,
                    body,
                    span: self.scanner.span_from(start),
                }))
            }
            _ => {
                // `@at-root .sel { … }` shorthand wraps a single style rule.
                let rule = self.parse_style_rule()?;
                Ok(Stmt::AtRoot(AtRootRule {
                    query: None,
                    body: vec![rule],
                    span: self.scanner.span_from(start),
                }))
            }
        }
    }
}

// Thin scanner facade shared with the expression parser submodule.
impl<'a> Parser<'a> {
    pub(crate) fn position(&self) -> usize {
        self.scanner.position()
    }

    pub(crate) fn save(&self) -> crate::scanner::ScannerState {
        self.scanner.state()
    }

    pub(crate) fn restore(&mut self, state: crate::scanner::ScannerState) {
        self.scanner.restore(state);
    }

    pub(crate) fn peek_char(&self) -> Option<char> {
        self.scanner.peek()
    }

    pub(crate) fn peek_char_at(&self, n: usize) -> Option<char> {
        self.scanner.peek_at(n)
    }

    pub(crate) fn advance(&mut self) {
        self.scanner.next_char();
    }

    pub(crate) fn scan_char(&mut self, c: char) -> bool {
        self.scanner.scan_char(c)
    }

    pub(crate) fn scan_str(&mut self, s: &str) -> bool {
        self.scanner.scan(s)
    }

    /// Whitespace and comments are insignificant inside expressions.
    pub(crate) fn skip_ws(&mut self) {
        loop {
            self.scanner.scan_while(char::is_whitespace);
            if self.scanner.peek() == Some('/') && self.scanner.peek_at(1) == Some('/') {
                self.scanner.scan_while(|c| c != '\n');
            } else if self.scanner.peek() == Some('/') && self.scanner.peek_at(1) == Some('*') {
                self.scanner.scan("/*");
                while !self.scanner.is_done() && !self.scanner.scan("*/") {
                    self.scanner.next_char();
                }
            } else {
                break;
            }
        }
    }

    pub(crate) fn span_from(&self, start: usize) -> Span {
        self.scanner.span_from(start)
    }

    pub(crate) fn error_here(&self, message: &str) -> Box<SassError> {
        self.scanner.error(message)
    }

    pub(crate) fn expect_char_here(&mut self, c: char) -> SassResult<()> {
        self.scanner.expect_char(c)
    }

    pub(crate) fn scan_digits(&mut self) -> &'a str {
        self.scanner.scan_while(|c| c.is_ascii_digit())
    }

    pub(crate) fn scan_while_hex(&mut self) -> String {
        self.scanner
            .scan_while(|c| c.is_ascii_hexdigit())
            .to_string()
    }

    pub(crate) fn parse_dollar_name(&mut self) -> SassResult<Ident> {
        self.parse_variable_name()
    }

    pub(crate) fn parse_interp_expr(&mut self) -> SassResult<Expr> {
        self.parse_interpolated_expr()
    }

    pub(crate) fn parse_interp_identifier(&mut self) -> SassResult<Interpolation> {
        match self.parse_interpolated_identifier()? {
            Some(interp) => Ok(interp),
            None => Err(self.scanner.error("expected identifier")),
        }
    }

    pub(crate) fn parse_plain_identifier(&mut self) -> SassResult<String> {
        self.parse_identifier()
    }

    /// The identifier at the cursor, without consuming it.
    pub(crate) fn peek_word(&self) -> String {
        self.scanner
            .rest()
            .chars()
            .take_while(|&c| is_name(c))
            .collect()
    }

    pub(crate) fn consume_word(&mut self, word: &str) {
        for _ in word.chars() {
            self.scanner.next_char();
        }
    }
}

/// Whether an expression parsed as a declaration value could instead be the
/// continuation of a selector (`a:hover`, `x:first-child y`).
fn could_be_selector(expr: &Expr) -> bool {
    match expr {
        Expr::String { quoted: false, .. } => true,
        Expr::List {
            items,
            bracketed: false,
            ..
        } => items.iter().all(could_be_selector),
        _ => false,
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

/// Trims literal whitespace from both ends of an interpolation.
fn trim_interpolation(mut interp: Interpolation) -> Interpolation {
    use crate::ast::InterpolationPart;
    if let Some(InterpolationPart::Literal(first)) = interp.parts.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(InterpolationPart::Literal(last)) = interp.parts.last_mut() {
        *last = last.trim_end().to_string();
    }
    interp
        .parts
        .retain(|p| !matches!(p, InterpolationPart::Literal(s) if s.is_empty()));
    interp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Sources;

    fn parse(source: &str) -> Stylesheet {
        let mut sources = Sources::new();
        let file = sources.add("test.scss".to_string(), source.to_string());
        let text: &'static str = Box::leak(file.source().to_string().into_boxed_str());
        parse_stylesheet(text, file.span, Syntax::Scss, None).unwrap()
    }

    fn parse_err(source: &str) -> Box<SassError> {
        let mut sources = Sources::new();
        let file = sources.add("test.scss".to_string(), source.to_string());
        let text: &'static str = Box::leak(file.source().to_string().into_boxed_str());
        parse_stylesheet(text, file.span, Syntax::Scss, None).unwrap_err()
    }

    #[test]
    fn parses_nested_style_rules() {
        let sheet = parse("a { b { color: red; } }");
        assert_eq!(sheet.stmts.len(), 1);
        match &sheet.stmts[0] {
            Stmt::StyleRule(rule) => {
                assert_eq!(rule.selector.as_plain(), Some("a"));
                match &rule.body[0] {
                    Stmt::StyleRule(inner) => {
                        assert_eq!(inner.selector.as_plain(), Some("b"));
                        assert!(matches!(inner.body[0], Stmt::Declaration(_)));
                    }
                    other => panic!("expected nested rule, got {:?}", other),
                }
            }
            other => panic!("expected style rule, got {:?}", other),
        }
    }

    #[test]
    fn distinguishes_pseudo_selector_from_declaration() {
        let sheet = parse("a { x:hover { y: 1; } }");
        match &sheet.stmts[0] {
            Stmt::StyleRule(rule) => {
                assert!(
                    matches!(&rule.body[0], Stmt::StyleRule(inner)
                        if inner.selector.as_plain() == Some("x:hover")),
                    "got {:?}",
                    rule.body[0]
                );
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_variable_declarations_with_flags() {
        let sheet = parse("$a: 1 !default;\n$b: 2 !global;");
        match (&sheet.stmts[0], &sheet.stmts[1]) {
            (Stmt::VariableDecl(a), Stmt::VariableDecl(b)) => {
                assert!(a.guarded && !a.global);
                assert!(b.global && !b.guarded);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_mixin_and_include() {
        let sheet = parse("@mixin m($a, $b: 2) { x: $a; } a { @include m(1); }");
        assert!(matches!(&sheet.stmts[0], Stmt::MixinDecl(d) if d.params.params.len() == 2));
        match &sheet.stmts[1] {
            Stmt::StyleRule(rule) => {
                assert!(matches!(&rule.body[0], Stmt::Include(i) if i.args.positional.len() == 1));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_control_flow() {
        let sheet = parse(
            "@if 1 == 1 { a { b: c; } } @else if 2 > 1 { d { e: f; } } @else { g { h: i; } }",
        );
        match &sheet.stmts[0] {
            Stmt::If(rule) => {
                assert_eq!(rule.clauses.len(), 2);
                assert!(rule.else_body.is_some());
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_for_bounds() {
        let sheet = parse("@for $i from 1 through 3 { a { b: $i; } } @for $j from 1 to 3 { c { d: $j; } }");
        assert!(matches!(&sheet.stmts[0], Stmt::For(f) if !f.exclusive));
        assert!(matches!(&sheet.stmts[1], Stmt::For(f) if f.exclusive));
    }

    #[test]
    fn parses_each_with_destructuring() {
        let sheet = parse("@each $k, $v in (a: 1) { x { y: $v; } }");
        assert!(matches!(&sheet.stmts[0], Stmt::Each(e) if e.vars.len() == 2));
    }

    #[test]
    fn parses_extend_with_optional_flag() {
        let sheet = parse("a { @extend .b !optional; @extend .c; }");
        match &sheet.stmts[0] {
            Stmt::StyleRule(rule) => {
                assert!(matches!(&rule.body[0], Stmt::Extend(e)
                    if e.optional && e.selector.as_plain() == Some(".b")));
                assert!(matches!(&rule.body[1], Stmt::Extend(e) if !e.optional));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn import_classification() {
        let sheet = parse("@import \"foo.css\", \"partial\", url(bar);");
        match &sheet.stmts[0] {
            Stmt::Import(rule) => {
                assert!(matches!(&rule.imports[0], ImportArg::Static(_)));
                assert!(matches!(&rule.imports[1], ImportArg::Dynamic(d) if d.url == "partial"));
                assert!(matches!(&rule.imports[2], ImportArg::Static(_)));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn import_with_media_stays_static() {
        let sheet = parse("@import \"foo\" screen;");
        match &sheet.stmts[0] {
            Stmt::Import(rule) => {
                assert!(matches!(&rule.imports[0], ImportArg::Static(s)
                    if s.modifiers.is_some()));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_use_and_forward() {
        let sheet = parse("@use \"a\" as b;\n@forward \"c\" show d, e;");
        assert!(matches!(&sheet.stmts[0], Stmt::Use(u)
            if matches!(&u.namespace, UseNamespace::Named(n) if n == "b")));
        assert!(matches!(&sheet.stmts[1], Stmt::Forward(f)
            if f.show.as_ref().map(|s| s.len()) == Some(2)));
    }

    #[test]
    fn parses_media_and_keyframes() {
        let sheet = parse("@media print { a { b: c; } } @keyframes spin { from { x: 0; } }");
        assert!(matches!(&sheet.stmts[0], Stmt::Media(m) if m.query.as_plain() == Some("print")));
        match &sheet.stmts[1] {
            Stmt::Keyframes(k) => {
                assert_eq!(k.prelude.as_plain(), Some("spin"));
                assert!(matches!(&k.body[0], Stmt::StyleRule(r)
                    if r.selector.as_plain() == Some("from")));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_custom_properties_verbatim() {
        let sheet = parse("a { --x: { raw }; }");
        match &sheet.stmts[0] {
            Stmt::StyleRule(rule) => match &rule.body[0] {
                Stmt::Declaration(decl) => {
                    assert_eq!(decl.name.as_plain(), Some("--x"));
                    match decl.value.as_ref().unwrap() {
                        Expr::String { contents, .. } => {
                            assert_eq!(contents.as_plain(), Some("{ raw }"));
                        }
                        other => panic!("{:?}", other),
                    }
                }
                other => panic!("{:?}", other),
            },
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn parses_nested_properties() {
        let sheet = parse("a { font: { family: serif; } }");
        match &sheet.stmts[0] {
            Stmt::StyleRule(rule) => {
                assert!(matches!(&rule.body[0], Stmt::Declaration(d)
                    if d.value.is_none() && d.body.is_some()));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn unclosed_block_is_an_error() {
        let err = parse_err("a { b: c;");
        assert!(matches!(err.kind(), ErrorKind::Syntax(_)));
    }

    #[test]
    fn stray_else_is_an_error() {
        let err = parse_err("@else { }");
        assert!(format!("{}", err.kind()).contains("@else"));
    }

    #[test]
    fn namespaced_variable_assignment() {
        let sheet = parse("lib.$x: 1;");
        assert!(matches!(&sheet.stmts[0], Stmt::VariableDecl(v)
            if v.namespace.as_ref().map(|n| n.as_str()) == Some("lib")));
    }
}
