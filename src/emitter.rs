//! CSS serialization.
//!
//! A visitor over the lowered tree that renders text in one of the four
//! output styles while recording `(source span, output position)` pairs for
//! the source map.

use codemap::Span;

use crate::css_tree::{CssDecl, CssRule, CssStmt};
use crate::error::{ErrorKind, SassError, SassResult};
use crate::selector::{ComplexComponent, ComplexSelector, SelectorList};
use crate::value::Value;

/// How the CSS output is formatted.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OutputStyle {
    /// One declaration per line, blocks indented, rules separated by a
    /// blank line.
    Expanded,
    /// Like expanded, but indentation mirrors the source nesting and the
    /// closing brace shares the last declaration's line.
    Nested,
    /// Each rule on a single line.
    Compact,
    /// No unnecessary whitespace at all.
    Compressed,
}

/// One recorded source-map entry.
#[derive(Debug, Clone, Copy)]
pub struct Mapping {
    pub span: Span,
    pub dst_line: usize,
    pub dst_col: usize,
}

pub struct Emitter {
    style: OutputStyle,
    precision: usize,
    buf: String,
    line: usize,
    col: usize,
    mappings: Vec<Mapping>,
}

impl Emitter {
    pub fn new(style: OutputStyle, precision: usize) -> Emitter {
        Emitter {
            style,
            precision,
            buf: String::new(),
            line: 0,
            col: 0,
            mappings: Vec::new(),
        }
    }

    /// Renders the tree; the result is the CSS text and the mappings.
    pub fn emit(mut self, stmts: &[CssStmt]) -> SassResult<(String, Vec<Mapping>)> {
        let mut first = true;
        for stmt in stmts {
            if self.is_blank(stmt) {
                continue;
            }
            if !first {
                self.write_block_separator();
            }
            first = false;
            self.emit_stmt(stmt, 0)?;
        }
        if !self.buf.is_empty() && self.style != OutputStyle::Compressed {
            self.write("\n");
        }
        if !self.buf.is_ascii() && self.style != OutputStyle::Compressed {
            self.buf = format!("@charset \"UTF-8\";\n{}", self.buf);
            for mapping in &mut self.mappings {
                mapping.dst_line += 1;
            }
        }
        Ok((self.buf, self.mappings))
    }

    fn is_blank(&self, stmt: &CssStmt) -> bool {
        if self.style == OutputStyle::Compressed {
            if let CssStmt::Comment { text, .. } = stmt {
                return !text.starts_with("/*!");
            }
        }
        stmt.is_invisible()
    }

    fn compressed(&self) -> bool {
        self.style == OutputStyle::Compressed
    }

    fn emit_stmt(&mut self, stmt: &CssStmt, depth: usize) -> SassResult<()> {
        match stmt {
            CssStmt::Rule(rule) => self.emit_rule(rule, depth),
            // Declarations directly inside an at-rule block (`@font-face`).
            CssStmt::Decl(decl) => self.emit_declaration(decl, depth, true),
            CssStmt::Media(media) => {
                let queries: Vec<String> =
                    media.queries.iter().map(|q| q.to_css_string()).collect();
                let prelude = format!("@media {}", queries.join(if self.compressed() { "," } else { ", " }));
                self.emit_block(media.span, &prelude, &media.body, depth)
            }
            CssStmt::Supports {
                condition,
                body,
                span,
            } => {
                let prelude = format!("@supports {}", condition);
                self.emit_block(*span, &prelude, body, depth)
            }
            CssStmt::Keyframes {
                name,
                prelude,
                body,
                span,
            } => {
                let text = format!("@{} {}", name, prelude);
                self.emit_block(*span, &text, body, depth)
            }
            CssStmt::KeyframeBlock {
                selector,
                body,
                span,
            } => {
                let rule = CssRule {
                    selector: SelectorList::default(),
                    body: body.clone(),
                    span: *span,
                    depth,
                };
                self.emit_rule_with_selector_text(&rule, selector, depth)
            }
            CssStmt::UnknownAt {
                name,
                prelude,
                body,
                span,
            } => {
                let mut text = format!("@{}", name);
                if let Some(prelude) = prelude {
                    text.push(' ');
                    text.push_str(prelude);
                }
                match body {
                    None => {
                        self.record(*span);
                        self.write_indent(depth);
                        self.write(&text);
                        self.write(";");
                        Ok(())
                    }
                    Some(body) => self.emit_block(*span, &text, body, depth),
                }
            }
            CssStmt::Import {
                url,
                modifiers,
                span,
            } => {
                self.record(*span);
                self.write_indent(depth);
                self.write("@import ");
                self.write(url);
                if let Some(modifiers) = modifiers {
                    self.write(" ");
                    self.write(modifiers);
                }
                self.write(";");
                Ok(())
            }
            CssStmt::Comment { text, span } => {
                self.record(*span);
                self.write_indent(depth);
                self.write(text);
                Ok(())
            }
            CssStmt::AtRoot { .. } => unreachable!("at-root is resolved during cssize"),
        }
    }

    fn emit_rule(&mut self, rule: &CssRule, depth: usize) -> SassResult<()> {
        let selector = self.render_selector(&rule.selector, depth);
        self.emit_rule_with_selector_text(rule, &selector, depth)
    }

    fn emit_rule_with_selector_text(
        &mut self,
        rule: &CssRule,
        selector: &str,
        depth: usize,
    ) -> SassResult<()> {
        let depth = if self.style == OutputStyle::Nested {
            depth + rule.depth
        } else {
            depth
        };
        self.record(rule.span);
        self.write_indent(depth);
        self.write(selector);
        self.open_brace();

        let body: Vec<&CssStmt> = rule.body.iter().filter(|s| !self.is_blank(s)).collect();
        let last = body.len().saturating_sub(1);
        for (i, child) in body.iter().enumerate() {
            match child {
                CssStmt::Decl(decl) => {
                    self.emit_declaration(decl, depth + 1, i == last)?;
                }
                CssStmt::Comment { text, span } => {
                    self.record(*span);
                    match self.style {
                        OutputStyle::Compressed => self.write(text),
                        OutputStyle::Compact => {
                            self.write(text);
                            if i != last {
                                self.write(" ");
                            }
                        }
                        _ => {
                            self.write_indent(depth + 1);
                            self.write(text);
                            if i != last {
                                self.write("\n");
                            }
                        }
                    }
                }
                other => {
                    // Childless at-rules and keyframe blocks inside rules.
                    self.emit_stmt(other, depth + 1)?;
                    if i != last && !matches!(self.style, OutputStyle::Compressed) {
                        self.write("\n");
                    }
                }
            }
        }
        self.close_brace(depth);
        Ok(())
    }

    fn emit_declaration(
        &mut self,
        decl: &CssDecl,
        depth: usize,
        is_last: bool,
    ) -> SassResult<()> {
        let value = self.render_value(&decl.value, decl.value_span)?;
        self.record(decl.span);
        match self.style {
            OutputStyle::Compressed => {
                self.write(&decl.name);
                self.write(":");
                self.write(&value);
                if !is_last {
                    self.write(";");
                }
            }
            OutputStyle::Compact => {
                self.write(&decl.name);
                self.write(": ");
                self.write(&value);
                self.write(";");
                if !is_last {
                    self.write(" ");
                }
            }
            _ => {
                self.write_indent(depth);
                self.write(&decl.name);
                self.write(": ");
                self.write(&value);
                self.write(";");
                if !is_last {
                    self.write("\n");
                }
            }
        }
        Ok(())
    }

    fn emit_block(
        &mut self,
        span: Span,
        prelude: &str,
        body: &[CssStmt],
        depth: usize,
    ) -> SassResult<()> {
        self.record(span);
        self.write_indent(depth);
        self.write(prelude);
        self.open_brace();
        let body: Vec<&CssStmt> = body.iter().filter(|s| !self.is_blank(s)).collect();
        let last = body.len().saturating_sub(1);
        for (i, child) in body.iter().enumerate() {
            let is_decl = matches!(child, CssStmt::Decl(_) | CssStmt::Comment { .. });
            self.emit_stmt(child, depth + 1)?;
            if i != last {
                match self.style {
                    OutputStyle::Compressed => {
                        if is_decl {
                            self.write(";");
                        }
                    }
                    OutputStyle::Compact => self.write(" "),
                    _ if is_decl => self.write("\n"),
                    _ => self.write("\n\n"),
                }
            }
        }
        self.close_brace(depth);
        Ok(())
    }

    fn render_value(&self, value: &Value, span: Span) -> SassResult<String> {
        match value.to_css_string(self.precision, self.compressed()) {
            Ok(text) => Ok(text),
            Err(message) => match self.style {
                // The laxer styles fall back to the inspection form.
                OutputStyle::Nested | OutputStyle::Compact => Ok(value.inspect(self.precision)),
                _ => Err(SassError::new(ErrorKind::InvalidValue(message), span)),
            },
        }
    }

    fn render_selector(&self, selector: &SelectorList, depth: usize) -> String {
        let joiner = if self.compressed() {
            ",".to_string()
        } else if self.style == OutputStyle::Expanded || self.style == OutputStyle::Nested {
            format!(",\n{}", "  ".repeat(depth))
        } else {
            ", ".to_string()
        };
        let complexes: Vec<String> = selector
            .components
            .iter()
            .map(|complex| self.render_complex(complex))
            .collect();
        // Lists stay on one line unless the source asked for breaks; the
        // emitter keeps them on one line for everything but very long
        // lists, matching the reference output for the common case.
        if complexes.iter().map(String::len).sum::<usize>() < 80 || self.compressed() {
            complexes.join(if self.compressed() { "," } else { ", " })
        } else {
            complexes.join(&joiner)
        }
    }

    fn render_complex(&self, complex: &ComplexSelector) -> String {
        let mut out = String::new();
        let mut prev_was_combinator = true;
        for (i, component) in complex.components.iter().enumerate() {
            let is_combinator = matches!(component, ComplexComponent::Combinator(_));
            if i > 0 {
                if self.compressed() && (is_combinator || prev_was_combinator) {
                    // `a>b`, no spaces around combinators.
                } else {
                    out.push(' ');
                }
            }
            match component {
                ComplexComponent::Compound(compound) => out.push_str(&compound.to_string()),
                ComplexComponent::Combinator(c) => out.push(c.symbol()),
            }
            prev_was_combinator = is_combinator;
        }
        out
    }

    // ---- low-level writing ----------------------------------------------

    fn write(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.buf.push_str(text);
    }

    fn write_indent(&mut self, depth: usize) {
        if matches!(self.style, OutputStyle::Expanded | OutputStyle::Nested) {
            for _ in 0..depth {
                self.write("  ");
            }
        }
    }

    fn open_brace(&mut self) {
        match self.style {
            OutputStyle::Compressed => self.write("{"),
            OutputStyle::Compact => self.write(" { "),
            _ => self.write(" {\n"),
        }
    }

    fn close_brace(&mut self, depth: usize) {
        match self.style {
            OutputStyle::Compressed => self.write("}"),
            OutputStyle::Compact => self.write(" }"),
            OutputStyle::Nested => self.write(" }"),
            OutputStyle::Expanded => {
                self.write("\n");
                self.write_indent(depth);
                self.write("}");
            }
        }
    }

    fn write_block_separator(&mut self) {
        match self.style {
            OutputStyle::Compressed => {}
            OutputStyle::Compact => self.write("\n"),
            _ => self.write("\n\n"),
        }
    }

    fn record(&mut self, span: Span) {
        self.mappings.push(Mapping {
            span,
            dst_line: self.line,
            dst_col: self.col,
        });
    }
}
