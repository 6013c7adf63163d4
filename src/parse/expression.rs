//! The SassScript expression parser.
//!
//! Precedence climbing over the operator table in
//! [`crate::ast::BinaryOperator`], with the Sass-specific wrinkles: space-
//! and comma-separated lists as containers, `-` serving as sign, operator,
//! and identifier character, and `/` doubling as the shorthand separator in
//! values like `font: 12px/16px`.

use super::Parser;
use crate::ast::{
    ArgumentInvocation, BinaryOperator, Expr, Interpolation, UnaryOperator,
};
use crate::color::Color;
use crate::common::Ident;
use crate::error::SassResult;
use crate::value::ListSeparator;

impl<'a> Parser<'a> {
    /// A full expression: a comma-separated list of space lists.
    pub(crate) fn parse_expression(&mut self) -> SassResult<Expr> {
        self.parse_expression_with_stops(&[])
    }

    pub(crate) fn parse_expression_until_keyword(&mut self, stops: &[&str]) -> SassResult<Expr> {
        self.parse_space_list(stops)
    }

    /// One comma-list element, for argument lists.
    pub(crate) fn parse_expression_until_comma(&mut self) -> SassResult<Expr> {
        self.parse_space_list(&[])
    }

    fn parse_expression_with_stops(&mut self, stops: &[&str]) -> SassResult<Expr> {
        let start = self.position();
        let first = self.parse_space_list(stops)?;
        self.skip_ws();
        if self.peek_char() != Some(',') {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.scan_char(',') {
            self.skip_ws();
            if self.at_expression_end() {
                break;
            }
            items.push(self.parse_space_list(stops)?);
            self.skip_ws();
        }
        let span = self.span_from(start);
        Ok(Expr::List {
            items,
            separator: ListSeparator::Comma,
            bracketed: false,
            span,
        })
    }

    fn parse_space_list(&mut self, stops: &[&str]) -> SassResult<Expr> {
        let start = self.position();
        let first = self.parse_binary(0, stops)?;
        let mut items = vec![first];
        loop {
            self.skip_ws();
            if self.at_expression_end() || self.peek_char() == Some(',') {
                break;
            }
            if self.next_word_is(stops) {
                break;
            }
            if !self.can_start_operand() {
                break;
            }
            items.push(self.parse_binary(0, stops)?);
        }
        if items.len() == 1 {
            return Ok(items.into_iter().next().expect("one item"));
        }
        let span = self.span_from(start);
        Ok(Expr::List {
            items,
            separator: ListSeparator::Space,
            bracketed: false,
            span,
        })
    }

    fn parse_binary(&mut self, min_prec: u8, stops: &[&str]) -> SassResult<Expr> {
        let start = self.position();
        let mut lhs = self.parse_unary(stops)?;
        loop {
            let op = match self.peek_binary_operator(min_prec, stops) {
                Some(op) => op,
                None => break,
            };
            self.skip_ws();
            let rhs = self.parse_binary(op.precedence() + 1, stops)?;
            let allows_slash =
                op == BinaryOperator::Div && slash_operable(&lhs) && slash_operable(&rhs);
            let span = self.span_from(start);
            lhs = Expr::BinaryOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                allows_slash,
                span,
            };
        }
        Ok(lhs)
    }

    /// Consumes and returns the next binary operator if one applies at this
    /// precedence; leaves the scanner untouched otherwise.
    fn peek_binary_operator(&mut self, min_prec: u8, stops: &[&str]) -> Option<BinaryOperator> {
        let state = self.save();
        let before = self.position();
        self.skip_ws();
        let had_space = self.position() > before;

        let op = match self.peek_char() {
            Some('=') if self.peek_char_at(1) == Some('=') => {
                self.advance();
                self.advance();
                Some(BinaryOperator::Eq)
            }
            Some('!') if self.peek_char_at(1) == Some('=') => {
                self.advance();
                self.advance();
                Some(BinaryOperator::Ne)
            }
            Some('<') => {
                self.advance();
                Some(if self.scan_char('=') {
                    BinaryOperator::Le
                } else {
                    BinaryOperator::Lt
                })
            }
            Some('>') => {
                self.advance();
                Some(if self.scan_char('=') {
                    BinaryOperator::Ge
                } else {
                    BinaryOperator::Gt
                })
            }
            // `a - b` and `2-1` are arithmetic; `a -b` starts a new
            // space-list item.  `+` follows the same rule.
            Some(c @ ('+' | '-')) => {
                let next = self.peek_char_at(1);
                let binary = if !had_space {
                    true
                } else {
                    next.map_or(false, char::is_whitespace)
                };
                if binary {
                    self.advance();
                    Some(if c == '+' {
                        BinaryOperator::Plus
                    } else {
                        BinaryOperator::Minus
                    })
                } else {
                    None
                }
            }
            Some('*') => {
                self.advance();
                Some(BinaryOperator::Times)
            }
            Some('/') => {
                self.advance();
                Some(BinaryOperator::Div)
            }
            Some('%') => {
                self.advance();
                Some(BinaryOperator::Rem)
            }
            Some(c) if c == 'a' || c == 'A' || c == 'o' || c == 'O' => {
                let word = self.peek_word();
                if word.eq_ignore_ascii_case("and") && !self.word_in(stops, &word) {
                    self.consume_word(&word);
                    Some(BinaryOperator::And)
                } else if word.eq_ignore_ascii_case("or") && !self.word_in(stops, &word) {
                    self.consume_word(&word);
                    Some(BinaryOperator::Or)
                } else {
                    None
                }
            }
            _ => None,
        };

        match op {
            Some(op) if op.precedence() >= min_prec => Some(op),
            _ => {
                self.restore(state);
                None
            }
        }
    }

    fn parse_unary(&mut self, stops: &[&str]) -> SassResult<Expr> {
        let start = self.position();
        match self.peek_char() {
            Some('-') => {
                let next = self.peek_char_at(1);
                if next.map_or(false, |c| c.is_ascii_digit() || c == '.') {
                    return self.parse_number();
                }
                if next.map_or(false, |c| {
                    c == '$' || c == '(' || c == '#' || is_ident_start(c)
                }) {
                    self.advance();
                    let operand = self.parse_unary(stops)?;
                    return Ok(Expr::UnaryOp {
                        op: UnaryOperator::Minus,
                        operand: Box::new(operand),
                        span: self.span_from(start),
                    });
                }
                self.parse_primary(stops)
            }
            Some('+') => {
                let next = self.peek_char_at(1);
                if next.map_or(false, |c| c.is_ascii_digit() || c == '.') {
                    return self.parse_number();
                }
                self.advance();
                self.skip_ws();
                let operand = self.parse_unary(stops)?;
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Plus,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            Some('/') => {
                self.advance();
                self.skip_ws();
                let operand = self.parse_unary(stops)?;
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Div,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            Some(c) if (c == 'n' || c == 'N') && self.peek_word().eq_ignore_ascii_case("not") => {
                let word = self.peek_word();
                self.consume_word(&word);
                self.skip_ws();
                let operand = self.parse_unary(stops)?;
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                    span: self.span_from(start),
                })
            }
            _ => self.parse_primary(stops),
        }
    }

    fn parse_primary(&mut self, _stops: &[&str]) -> SassResult<Expr> {
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some('.') if self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                self.parse_number()
            }
            Some('$') => self.parse_variable_ref(),
            Some('"') | Some('\'') => self.parse_quoted_string(),
            Some('#') => {
                if self.peek_char_at(1) == Some('{') {
                    self.parse_identifier_like_operand()
                } else {
                    self.parse_hex_color_or_string()
                }
            }
            Some('(') => self.parse_paren_or_map(),
            Some('[') => self.parse_bracketed_list(),
            Some('&') => {
                let start = self.position();
                self.advance();
                Ok(Expr::ParentSelector {
                    span: self.span_from(start),
                })
            }
            Some(c) if is_ident_start(c) || c == '-' => self.parse_identifier_like_operand(),
            _ => Err(self.error_here("expected expression")),
        }
    }

    fn parse_number(&mut self) -> SassResult<Expr> {
        let start = self.position();
        let mut text = String::new();
        if self.peek_char() == Some('-') || self.peek_char() == Some('+') {
            if self.peek_char() == Some('-') {
                text.push('-');
            }
            self.advance();
        }
        text.push_str(self.scan_digits());
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            self.advance();
            text.push('.');
            text.push_str(self.scan_digits());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let next = self.peek_char_at(1);
            let exponent = match next {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self
                    .peek_char_at(2)
                    .map_or(false, |c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent {
                text.push('e');
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    if self.peek_char() == Some('-') {
                        text.push('-');
                    }
                    self.advance();
                }
                text.push_str(self.scan_digits());
            }
        }

        let value: f64 = text
            .parse()
            .map_err(|_| self.error_here("invalid number"))?;

        let unit = if self.scan_char('%') {
            Some("%".to_string())
        } else if self.peek_char().map_or(false, is_ident_start) {
            Some(self.scan_unit())
        } else {
            None
        };
        Ok(Expr::Number {
            value,
            unit,
            span: self.span_from(start),
        })
    }

    /// A unit identifier; `-` is included only when followed by another
    /// name character that is not a digit, so `1px-2px` stays arithmetic.
    fn scan_unit(&mut self) -> String {
        let mut unit = String::new();
        loop {
            match self.peek_char() {
                Some(c) if is_ident_start(c) => {
                    unit.push(c);
                    self.advance();
                }
                Some('-') => {
                    match self.peek_char_at(1) {
                        Some(c) if is_ident_start(c) => {
                            unit.push('-');
                            self.advance();
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        unit
    }

    fn parse_variable_ref(&mut self) -> SassResult<Expr> {
        let start = self.position();
        let name = self.parse_dollar_name()?;
        Ok(Expr::Variable {
            name,
            namespace: None,
            span: self.span_from(start),
        })
    }

    fn parse_quoted_string(&mut self) -> SassResult<Expr> {
        let start = self.position();
        let quote = self.peek_char().expect("caller checked");
        self.advance();
        let mut contents = Interpolation::new(self.span_from(start));
        loop {
            match self.peek_char() {
                None => return Err(self.error_here("unterminated string")),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('#') if self.peek_char_at(1) == Some('{') => {
                    let expr = self.parse_interp_expr()?;
                    contents.push_expr(expr);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        None => return Err(self.error_here("unterminated string")),
                        Some('\n') => {
                            self.advance();
                        }
                        Some(c) if c.is_ascii_hexdigit() => {
                            let mut code = String::new();
                            while code.len() < 6
                                && self.peek_char().map_or(false, |c| c.is_ascii_hexdigit())
                            {
                                code.push(self.peek_char().expect("checked"));
                                self.advance();
                            }
                            // An optional space terminates the escape.
                            if self.peek_char() == Some(' ') {
                                self.advance();
                            }
                            let value = u32::from_str_radix(&code, 16).unwrap_or(0xfffd);
                            contents.push_char(
                                char::from_u32(value).unwrap_or('\u{fffd}'),
                            );
                        }
                        Some(c) => {
                            contents.push_char(c);
                            self.advance();
                        }
                    }
                }
                Some(c) => {
                    contents.push_char(c);
                    self.advance();
                }
            }
        }
        let span = self.span_from(start);
        contents.span = span;
        Ok(Expr::String {
            contents,
            quoted: true,
            span,
        })
    }

    fn parse_hex_color_or_string(&mut self) -> SassResult<Expr> {
        let start = self.position();
        self.advance(); // '#'
        let digits = self.scan_while_hex();
        if matches!(digits.len(), 3 | 4 | 6 | 8) {
            if let Some(color) = Color::from_hex(&digits) {
                // Not followed by more name characters (e.g. `#abcdef0g`).
                if !self.peek_char().map_or(false, is_ident_char) {
                    return Ok(Expr::Color {
                        value: color,
                        span: self.span_from(start),
                    });
                }
            }
        }
        // `#foo` and other non-color tokens become unquoted strings.
        let mut text = format!("#{}", digits);
        while let Some(c) = self.peek_char() {
            if is_ident_char(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let span = self.span_from(start);
        Ok(Expr::String {
            contents: Interpolation::literal(text, span),
            quoted: false,
            span,
        })
    }

    fn parse_paren_or_map(&mut self) -> SassResult<Expr> {
        let start = self.position();
        self.advance(); // '('
        self.skip_ws();
        if self.scan_char(')') {
            return Ok(Expr::List {
                items: Vec::new(),
                separator: ListSeparator::Undecided,
                bracketed: false,
                span: self.span_from(start),
            });
        }

        let first = self.parse_space_list(&[])?;
        self.skip_ws();

        if self.scan_char(':') {
            self.skip_ws();
            let value = self.parse_space_list(&[])?;
            let mut pairs = vec![(first, value)];
            loop {
                self.skip_ws();
                if !self.scan_char(',') {
                    break;
                }
                self.skip_ws();
                if self.peek_char() == Some(')') {
                    break;
                }
                let key = self.parse_space_list(&[])?;
                self.skip_ws();
                self.expect_char_here(':')?;
                self.skip_ws();
                let value = self.parse_space_list(&[])?;
                pairs.push((key, value));
            }
            self.expect_char_here(')')?;
            return Ok(Expr::Map {
                pairs,
                span: self.span_from(start),
            });
        }

        if self.peek_char() == Some(',') {
            let mut items = vec![first];
            while self.scan_char(',') {
                self.skip_ws();
                if self.peek_char() == Some(')') {
                    break;
                }
                items.push(self.parse_space_list(&[])?);
                self.skip_ws();
            }
            self.expect_char_here(')')?;
            return Ok(Expr::List {
                items,
                separator: ListSeparator::Comma,
                bracketed: false,
                span: self.span_from(start),
            });
        }

        self.expect_char_here(')')?;
        Ok(Expr::Paren {
            inner: Box::new(first),
            span: self.span_from(start),
        })
    }

    fn parse_bracketed_list(&mut self) -> SassResult<Expr> {
        let start = self.position();
        self.advance(); // '['
        self.skip_ws();
        let mut items = Vec::new();
        let mut separator = ListSeparator::Undecided;
        while self.peek_char() != Some(']') {
            if self.peek_char().is_none() {
                return Err(self.error_here("expected \"]\""));
            }
            items.push(self.parse_space_list(&[])?);
            self.skip_ws();
            if self.scan_char(',') {
                separator = ListSeparator::Comma;
                self.skip_ws();
            }
        }
        self.advance(); // ']'
        if separator == ListSeparator::Undecided && items.len() > 1 {
            separator = ListSeparator::Space;
        }
        Ok(Expr::List {
            items,
            separator,
            bracketed: true,
            span: self.span_from(start),
        })
    }

    /// Identifiers and everything that starts like one: keywords, unquoted
    /// strings, function calls, namespaced references, `url(...)`.
    fn parse_identifier_like_operand(&mut self) -> SassResult<Expr> {
        let start = self.position();
        let contents = self.parse_interp_identifier()?;
        let span = self.span_from(start);

        if let Some(plain) = contents.as_plain() {
            let plain = plain.to_string();
            match plain.to_ascii_lowercase().as_str() {
                "true" => return Ok(Expr::Bool { value: true, span }),
                "false" => return Ok(Expr::Bool { value: false, span }),
                "null" => return Ok(Expr::Null { span }),
                _ => {}
            }

            if self.peek_char() == Some('(') {
                let lower = plain.to_ascii_lowercase();
                if lower == "url" {
                    return self.parse_raw_call(&plain, start);
                }
                if matches!(lower.as_str(), "calc" | "clamp" | "element" | "expression") {
                    return self.parse_raw_call(&plain, start);
                }
                let args = self.parse_argument_invocation()?;
                return Ok(Expr::FunctionCall {
                    name: Ident::new(&plain),
                    namespace: None,
                    args,
                    span: self.span_from(start),
                });
            }

            // `ns.$var` or `ns.fn(...)`.
            if self.peek_char() == Some('.') {
                if self.peek_char_at(1) == Some('$') {
                    self.advance();
                    let name = self.parse_dollar_name()?;
                    return Ok(Expr::Variable {
                        name,
                        namespace: Some(Ident::new(&plain)),
                        span: self.span_from(start),
                    });
                }
                if self.peek_char_at(1).map_or(false, is_ident_start) {
                    let state = self.save();
                    self.advance();
                    if let Ok(fn_name) = self.parse_plain_identifier() {
                        if self.peek_char() == Some('(') {
                            let args = self.parse_argument_invocation()?;
                            return Ok(Expr::FunctionCall {
                                name: Ident::new(&fn_name),
                                namespace: Some(Ident::new(&plain)),
                                args,
                                span: self.span_from(start),
                            });
                        }
                    }
                    self.restore(state);
                }
            }
        }

        Ok(Expr::String {
            contents,
            quoted: false,
            span,
        })
    }

    /// `url(...)`, `calc(...)` and friends: the argument text is preserved
    /// verbatim, interpolation aside.
    fn parse_raw_call(&mut self, name: &str, start: usize) -> SassResult<Expr> {
        let mut contents = Interpolation::new(self.span_from(start));
        contents.push_str(name);
        contents.push_char('(');
        self.advance(); // '('
        let mut depth = 1usize;
        loop {
            match self.peek_char() {
                None => return Err(self.error_here("expected \")\"")),
                Some('(') => {
                    depth += 1;
                    contents.push_char('(');
                    self.advance();
                }
                Some(')') => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        contents.push_char(')');
                        break;
                    }
                    contents.push_char(')');
                }
                Some('#') if self.peek_char_at(1) == Some('{') => {
                    let expr = self.parse_interp_expr()?;
                    contents.push_expr(expr);
                }
                Some(c) => {
                    contents.push_char(c);
                    self.advance();
                }
            }
        }
        let span = self.span_from(start);
        contents.span = span;
        Ok(Expr::String {
            contents,
            quoted: false,
            span,
        })
    }

    pub(crate) fn parse_argument_invocation(&mut self) -> SassResult<ArgumentInvocation> {
        let start = self.position();
        self.expect_char_here('(')?;
        let mut invocation = ArgumentInvocation::empty(self.span_from(start));
        loop {
            self.skip_ws();
            if self.scan_char(')') {
                break;
            }

            if self.peek_char() == Some('$') {
                let state = self.save();
                let name = self.parse_dollar_name()?;
                self.skip_ws();
                if self.scan_char(':') {
                    self.skip_ws();
                    let value = self.parse_expression_until_comma()?;
                    invocation.keywords.insert(name, value);
                    self.skip_ws();
                    if !self.scan_char(',') {
                        self.expect_char_here(')')?;
                        break;
                    }
                    continue;
                }
                self.restore(state);
            }

            let expr = self.parse_expression_until_comma()?;
            self.skip_ws();
            if self.scan_str("...") {
                if invocation.rest.is_none() {
                    invocation.rest = Some(Box::new(expr));
                } else {
                    invocation.keyword_rest = Some(Box::new(expr));
                }
            } else if !invocation.keywords.is_empty() {
                return Err(self.error_here("positional arguments must come before keyword arguments"));
            } else {
                invocation.positional.push(expr);
            }

            self.skip_ws();
            if !self.scan_char(',') {
                self.expect_char_here(')')?;
                break;
            }
        }
        invocation.span = self.span_from(start);
        Ok(invocation)
    }

    // ---- small scanner facade -------------------------------------------
    //
    // Expression parsing lives in its own file; these thin wrappers keep
    // the scanner field private to the parser module.

    fn at_expression_end(&mut self) -> bool {
        matches!(
            self.peek_char(),
            None | Some(';') | Some('}') | Some('{') | Some(')') | Some(']') | Some(':')
                | Some('!')
        )
    }

    fn can_start_operand(&mut self) -> bool {
        match self.peek_char() {
            Some(c) => {
                c.is_ascii_digit()
                    || is_ident_start(c)
                    || matches!(c, '$' | '"' | '\'' | '#' | '(' | '[' | '+' | '-' | '.' | '&'
                        | '/')
            }
            None => false,
        }
    }

    fn next_word_is(&mut self, stops: &[&str]) -> bool {
        if stops.is_empty() {
            return false;
        }
        let word = self.peek_word();
        self.word_in(stops, &word)
    }

    fn word_in(&self, stops: &[&str], word: &str) -> bool {
        stops.iter().any(|s| s.eq_ignore_ascii_case(word))
    }
}

fn slash_operable(expr: &Expr) -> bool {
    match expr {
        Expr::Number { .. } => true,
        Expr::BinaryOp {
            op: BinaryOperator::Div,
            allows_slash,
            ..
        } => *allows_slash,
        _ => false,
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

pub(crate) fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}
