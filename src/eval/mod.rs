//! The evaluator.
//!
//! Walks the AST with a current environment frame and three stacks (call
//! stack, selector stack, media stack), executing every Sass construct and
//! emitting a lowered CSS tree.  After a successful walk no control-flow,
//! callable, assignment, or SassScript node remains: only plain CSS.

mod bind;
mod ops;

pub use bind::CallArgs;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use codemap::Span;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ast::{
    ArgumentInvocation, CallableDecl, ContentBlock, Expr, ImportArg, Interpolation,
    InterpolationPart, ParameterList, Stmt, Stylesheet, UseNamespace,
};
use crate::builtin;
use crate::color::Color;
use crate::common::Ident;
use crate::css_tree::{AtRootQuery, CssDecl, CssMediaRule, CssRule, CssStmt};
use crate::environment::{Env, MixinDef, Module, SassFunction};
use crate::error::{ErrorKind, SassError, SassResult, Trace};
use crate::importer::{FileImporter, ImportCache, Importer, ImporterResult};
use crate::limits::MAX_CALL_DEPTH;
use crate::media::{merge_query_lists, parse_media_query_list, CssMediaQuery};
use crate::parse::parse_stylesheet;
use crate::selector::{
    parse_selector, resolve_parent_selectors, ComplexComponent, Extension, ParentError,
    SelectorList,
};
use crate::session::{Session, Warning};
use crate::source::{Sources, Syntax};
use crate::value::{ArgList, ListSeparator, QuoteKind, SassMap, Value};

/// Host-function and importer plumbing handed in by the driver.
pub struct EvalConfig {
    pub precision: usize,
    pub include_paths: Vec<PathBuf>,
    pub importers: Vec<Rc<dyn Importer>>,
    pub functions: Vec<Rc<dyn crate::api::HostFunction>>,
    pub random_seed: Option<u64>,
}

/// What evaluation produces, before CSS transforms run.
pub struct EvalOutput {
    pub stmts: Vec<CssStmt>,
    pub extensions: Vec<Extension>,
    pub included_files: Vec<PathBuf>,
}

/// Result of one statement: either fall through or unwind to the nearest
/// function call with a value.
enum Flow {
    Normal,
    Return(Value),
}

/// A namespace bound by `@use`.
#[derive(Clone)]
enum ModuleRef {
    User(Module),
    /// A `sass:` builtin module; functions resolve against the global table.
    Builtin(String),
}

pub struct Evaluator<'a> {
    sources: &'a mut Sources,
    session: &'a mut Session,
    precision: usize,
    importers: Vec<Rc<dyn Importer>>,
    file_importer: FileImporter,
    host_functions: HashMap<Ident, Rc<dyn crate::api::HostFunction>>,
    cache: ImportCache,

    env: Env,
    selector_stack: Vec<Rc<SelectorList>>,
    media_stack: Vec<Vec<CssMediaQuery>>,
    call_stack: Vec<Trace>,
    content_stack: Vec<(ContentBlock, Env)>,
    extensions: Vec<Extension>,

    modules: HashMap<PathBuf, Module>,
    namespaces: HashMap<Ident, ModuleRef>,

    /// Prefix for nested property declarations.
    declaration_name: Option<String>,
    in_function: bool,
    in_keyframes: bool,
    in_unknown_at_rule: bool,

    current_path: Option<PathBuf>,
    rng: SmallRng,
}

impl<'a> Evaluator<'a> {
    pub fn new(sources: &'a mut Sources, session: &'a mut Session, config: EvalConfig) -> Self {
        let host_functions = config
            .functions
            .iter()
            .map(|f| (Ident::new(f.name()), f.clone()))
            .collect();
        Evaluator {
            sources,
            session,
            precision: config.precision,
            importers: config.importers,
            file_importer: FileImporter::new(config.include_paths),
            host_functions,
            cache: ImportCache::new(),
            env: Env::new_root(),
            selector_stack: Vec::new(),
            media_stack: Vec::new(),
            call_stack: Vec::new(),
            content_stack: Vec::new(),
            extensions: Vec::new(),
            modules: HashMap::new(),
            namespaces: HashMap::new(),
            declaration_name: None,
            in_function: false,
            in_keyframes: false,
            in_unknown_at_rule: false,
            current_path: None,
            rng: match config.random_seed {
                Some(seed) => SmallRng::seed_from_u64(seed),
                None => SmallRng::from_entropy(),
            },
        }
    }

    /// Evaluates an entry-point stylesheet.
    pub fn run(mut self, sheet: &Stylesheet) -> SassResult<EvalOutput> {
        if let Some(path) = &sheet.path {
            self.cache.record_included(path);
            self.current_path = Some(path.clone());
        }
        let mut out = Vec::new();
        match self.eval_stmts(&sheet.stmts, &mut out)? {
            Flow::Normal => {}
            Flow::Return(_) => {
                return Err(SassError::new(
                    ErrorKind::Syntax("@return may only be used within a function".to_string()),
                    sheet.span,
                ))
            }
        }
        Ok(EvalOutput {
            stmts: out,
            extensions: self.extensions,
            included_files: self.cache.included_files().to_vec(),
        })
    }

    // ---- statement walk --------------------------------------------------

    fn eval_stmts(&mut self, stmts: &[Stmt], out: &mut Vec<CssStmt>) -> SassResult<Flow> {
        for stmt in stmts {
            match self.eval_stmt(stmt, out)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_stmt(&mut self, stmt: &Stmt, out: &mut Vec<CssStmt>) -> SassResult<Flow> {
        match stmt {
            Stmt::StyleRule(rule) => self.visit_style_rule(rule, out),
            Stmt::Declaration(decl) => self.visit_declaration(decl, out),
            Stmt::UnknownAtRule(rule) => {
                let prelude = match &rule.value {
                    Some(interp) => {
                        let text = self.eval_interpolation(interp)?;
                        if text.is_empty() {
                            None
                        } else {
                            Some(text)
                        }
                    }
                    None => None,
                };
                let body = match &rule.body {
                    None => None,
                    Some(stmts) => {
                        let saved = self.in_unknown_at_rule;
                        self.in_unknown_at_rule = true;
                        let mut body = Vec::new();
                        let flow = self.scoped(|ev| ev.eval_stmts(stmts, &mut body));
                        self.in_unknown_at_rule = saved;
                        flow?;
                        Some(body)
                    }
                };
                out.push(CssStmt::UnknownAt {
                    name: rule.name.clone(),
                    prelude,
                    body,
                    span: rule.span,
                });
                Ok(Flow::Normal)
            }
            Stmt::Media(rule) => {
                let text = self.eval_interpolation(&rule.query)?;
                let queries = parse_media_query_list(&text, rule.span)?;
                let merged = match self.media_stack.last() {
                    Some(outer) => merge_query_lists(outer, &queries),
                    None => Some(queries),
                };
                match merged {
                    None => {
                        // Unsatisfiable nested query: the body still runs
                        // for its side effects but emits nothing.
                        let mut discarded = Vec::new();
                        self.scoped(|ev| ev.eval_stmts(&rule.body, &mut discarded))?;
                    }
                    Some(queries) => {
                        self.media_stack.push(queries.clone());
                        let mut body = Vec::new();
                        let flow = self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body));
                        self.media_stack.pop();
                        flow?;
                        out.push(CssStmt::Media(CssMediaRule {
                            queries,
                            body,
                            span: rule.span,
                        }));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Supports(rule) => {
                let condition = self.eval_interpolation(&rule.condition)?;
                let mut body = Vec::new();
                self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body))?;
                out.push(CssStmt::Supports {
                    condition,
                    body,
                    span: rule.span,
                });
                Ok(Flow::Normal)
            }
            Stmt::AtRoot(rule) => {
                let query = match &rule.query {
                    None => AtRootQuery::default_query(),
                    Some(interp) => {
                        let text = self.eval_interpolation(interp)?;
                        parse_at_root_query(&text, rule.span)?
                    }
                };
                let saved_selectors = if query.excludes_style_rules() {
                    Some(std::mem::take(&mut self.selector_stack))
                } else {
                    None
                };
                let saved_media = if query.excludes_media() {
                    Some(std::mem::take(&mut self.media_stack))
                } else {
                    None
                };
                let mut body = Vec::new();
                let result = self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body));
                if let Some(stack) = saved_selectors {
                    self.selector_stack = stack;
                }
                if let Some(stack) = saved_media {
                    self.media_stack = stack;
                }
                result?;
                out.push(CssStmt::AtRoot {
                    query,
                    body,
                    span: rule.span,
                });
                Ok(Flow::Normal)
            }
            Stmt::Keyframes(rule) => {
                let prelude = self.eval_interpolation(&rule.prelude)?;
                let saved = self.in_keyframes;
                self.in_keyframes = true;
                let mut body = Vec::new();
                let result = self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body));
                self.in_keyframes = saved;
                result?;
                out.push(CssStmt::Keyframes {
                    name: rule.name.clone(),
                    prelude,
                    body,
                    span: rule.span,
                });
                Ok(Flow::Normal)
            }
            Stmt::If(rule) => {
                for (cond, body) in &rule.clauses {
                    if self.eval_expr(cond)?.is_truthy() {
                        return self.scoped_stmts(body, out);
                    }
                }
                if let Some(body) = &rule.else_body {
                    return self.scoped_stmts(body, out);
                }
                Ok(Flow::Normal)
            }
            Stmt::For(rule) => self.visit_for(rule, out),
            Stmt::Each(rule) => self.visit_each(rule, out),
            Stmt::While(rule) => {
                while self.eval_expr(&rule.cond)?.is_truthy() {
                    match self.scoped_stmts(&rule.body, out)? {
                        Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FunctionDecl(decl) => {
                self.env.define_fn(
                    decl.name.clone(),
                    SassFunction::UserDefined {
                        decl: decl.clone(),
                        env: self.env.clone(),
                    },
                );
                Ok(Flow::Normal)
            }
            Stmt::MixinDecl(decl) => {
                self.env.define_mixin(
                    decl.name.clone(),
                    MixinDef {
                        decl: decl.clone(),
                        env: self.env.clone(),
                    },
                );
                Ok(Flow::Normal)
            }
            Stmt::Include(rule) => self.visit_include(rule, out),
            Stmt::Content(rule) => self.visit_content(rule, out),
            Stmt::VariableDecl(decl) => {
                let value = self.eval_expr(&decl.value)?;
                if let Some(ns) = &decl.namespace {
                    let module = self.namespaces.get(ns).cloned().ok_or_else(|| {
                        SassError::new(
                            ErrorKind::Custom(format!(
                                "there is no module with the namespace \"{}\"",
                                ns
                            )),
                            decl.span,
                        )
                    })?;
                    match module {
                        ModuleRef::User(module) => {
                            if !module.set_var(decl.name.clone(), value) {
                                return Err(SassError::new(
                                    ErrorKind::Custom(format!(
                                        "undefined variable: \"{}.${}\"",
                                        ns, decl.name
                                    )),
                                    decl.span,
                                ));
                            }
                        }
                        ModuleRef::Builtin(_) => {
                            return Err(SassError::new(
                                ErrorKind::Custom(
                                    "cannot modify built-in variable".to_string(),
                                ),
                                decl.span,
                            ))
                        }
                    }
                } else if decl.guarded {
                    if decl.global {
                        let global = self.env.global();
                        let unset = global
                            .get_var(&decl.name)
                            .map_or(true, |v| v.is_null());
                        if unset {
                            global.define_var(decl.name.clone(), value);
                        }
                    } else {
                        self.env.set_var_default(decl.name.clone(), value);
                    }
                } else if decl.global {
                    self.env.set_var_global(decl.name.clone(), value);
                } else {
                    self.env.set_var(decl.name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(rule) => {
                if !self.in_function {
                    return Err(SassError::new(
                        ErrorKind::Syntax(
                            "@return may only be used within a function".to_string(),
                        ),
                        rule.span,
                    ));
                }
                let value = self.eval_expr(&rule.value)?;
                Ok(Flow::Return(value))
            }
            Stmt::Extend(rule) => self.visit_extend(rule),
            Stmt::Warn(rule) => {
                let value = self.eval_expr(&rule.value)?;
                let message = self.diagnostic_text(&value);
                self.session.warn(Warning {
                    message,
                    span: Some(rule.span),
                    traces: self.call_stack.clone(),
                });
                Ok(Flow::Normal)
            }
            Stmt::Error(rule) => {
                let value = self.eval_expr(&rule.value)?;
                let message = self.diagnostic_text(&value);
                Err(self.error(ErrorKind::Custom(message), rule.span))
            }
            Stmt::Debug(rule) => {
                let value = self.eval_expr(&rule.value)?;
                let message = self.diagnostic_text(&value);
                let loc = self.sources.look_up(rule.span);
                rsass_log!(
                    "{}:{} DEBUG: {}",
                    loc.file.name(),
                    loc.begin.line + 1,
                    message
                );
                Ok(Flow::Normal)
            }
            Stmt::Import(rule) => {
                for import in &rule.imports {
                    match import {
                        ImportArg::Static(import) => {
                            let url = self.eval_interpolation(&import.url)?;
                            let modifiers = match &import.modifiers {
                                Some(m) => Some(self.eval_interpolation(m)?),
                                None => None,
                            };
                            out.push(CssStmt::Import {
                                url,
                                modifiers,
                                span: import.span,
                            });
                        }
                        ImportArg::Dynamic(import) => {
                            self.visit_dynamic_import(&import.url, import.span, out)?;
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Use(rule) => {
                let module = self.load_module(&rule.url, rule.span, out)?;
                match &rule.namespace {
                    UseNamespace::Default => {
                        let stem = default_namespace(&rule.url);
                        self.bind_namespace(Ident::new(&stem), module, rule.span)?;
                    }
                    UseNamespace::Named(name) => {
                        self.bind_namespace(Ident::new(name), module, rule.span)?;
                    }
                    UseNamespace::Global => {
                        if let ModuleRef::User(module) = module {
                            let members = module.env.local_members();
                            let global = self.env.global();
                            for (name, value) in members.vars {
                                global.define_var(name, value);
                            }
                            for (name, mixin) in members.mixins {
                                global.define_mixin(name, mixin);
                            }
                            for (name, function) in members.functions {
                                global.define_fn(name, function);
                            }
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Forward(rule) => {
                let module = self.load_module(&rule.url, rule.span, out)?;
                if let ModuleRef::User(module) = module {
                    let members = module.env.local_members();
                    let visible = |name: &Ident| -> bool {
                        if let Some(show) = &rule.show {
                            return show.contains(name);
                        }
                        if let Some(hide) = &rule.hide {
                            return !hide.contains(name);
                        }
                        true
                    };
                    let rename = |name: &Ident| -> Ident {
                        match &rule.prefix {
                            Some(prefix) => Ident::new(&format!("{}{}", prefix, name)),
                            None => name.clone(),
                        }
                    };
                    let global = self.env.global();
                    for (name, value) in members.vars {
                        if visible(&name) {
                            global.define_var(rename(&name), value);
                        }
                    }
                    for (name, mixin) in members.mixins {
                        if visible(&name) {
                            global.define_mixin(rename(&name), mixin);
                        }
                    }
                    for (name, function) in members.functions {
                        if visible(&name) {
                            global.define_fn(rename(&name), function);
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::LoudComment(comment) => {
                let text = self.eval_interpolation(&comment.text)?;
                out.push(CssStmt::Comment {
                    text,
                    span: comment.span,
                });
                Ok(Flow::Normal)
            }
        }
    }

    fn visit_style_rule(
        &mut self,
        rule: &crate::ast::StyleRule,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let text = self.eval_interpolation(&rule.selector)?;

        if self.in_keyframes {
            let mut body = Vec::new();
            self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body))?;
            out.push(CssStmt::KeyframeBlock {
                selector: text,
                body,
                span: rule.span,
            });
            return Ok(Flow::Normal);
        }

        let parsed = parse_selector(&text, rule.span, true, true)?;
        let parent = self.selector_stack.last().cloned();
        let resolved = resolve_parent_selectors(&parsed, parent.as_deref(), true).map_err(
            |e| match e {
                ParentError::TopLevel => self.error(ErrorKind::TopLevelParent, rule.span),
                ParentError::Misplaced => self.error(
                    ErrorKind::Syntax(
                        "\"&\" may only be used at the beginning of a compound selector"
                            .to_string(),
                    ),
                    rule.span,
                ),
                ParentError::Incompatible(parent) => {
                    self.error(ErrorKind::InvalidParent(parent), rule.span)
                }
            },
        )?;

        let depth = self.selector_stack.len();
        self.selector_stack.push(Rc::new(resolved.clone()));
        let mut body = Vec::new();
        let result = self.scoped(|ev| ev.eval_stmts(&rule.body, &mut body));
        self.selector_stack.pop();
        result?;

        out.push(CssStmt::Rule(CssRule {
            selector: resolved,
            body,
            span: rule.span,
            depth,
        }));
        Ok(Flow::Normal)
    }

    fn visit_declaration(
        &mut self,
        decl: &crate::ast::Declaration,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let name = self.eval_interpolation(&decl.name)?;
        let custom = name.starts_with("--");
        if self.selector_stack.is_empty()
            && !self.in_keyframes
            && !self.in_unknown_at_rule
            && self.declaration_name.is_none()
        {
            return Err(self.error(
                ErrorKind::Syntax(
                    "declarations may only be used within style rules".to_string(),
                ),
                decl.span,
            ));
        }
        let full_name = match &self.declaration_name {
            Some(prefix) => format!("{}-{}", prefix, name),
            None => name,
        };

        if let Some(value) = &decl.value {
            let value_span = value.span();
            let value = self.eval_expr(value)?;
            if custom || !value.is_invisible() {
                out.push(CssStmt::Decl(CssDecl {
                    name: full_name.clone(),
                    value,
                    value_span,
                    span: decl.span,
                    custom,
                }));
            }
        }

        if let Some(body) = &decl.body {
            let saved = self.declaration_name.replace(full_name);
            let result = self.scoped(|ev| ev.eval_stmts(body, out));
            self.declaration_name = saved;
            result?;
        }
        Ok(Flow::Normal)
    }

    fn visit_for(&mut self, rule: &crate::ast::ForRule, out: &mut Vec<CssStmt>) -> SassResult<Flow> {
        let from_value = self.eval_expr(&rule.from)?;
        let to_value = self.eval_expr(&rule.to)?;
        let (from_num, to_num) = match (&from_value, &to_value) {
            (Value::Number(a), Value::Number(b)) => (a.clone(), b.clone()),
            _ => {
                return Err(self.error(
                    ErrorKind::TypeMismatch("@for bounds must be numbers".to_string()),
                    rule.span,
                ))
            }
        };
        let to_converted = to_num.coerced_to(&from_num).ok_or_else(|| {
            self.error(
                ErrorKind::IncompatibleUnits(from_num.unit_str(), to_num.unit_str()),
                rule.span,
            )
        })?;
        let from = from_num.to_int().ok_or_else(|| {
            self.error(
                ErrorKind::TypeMismatch(format!("{} is not an integer", from_num.value)),
                rule.span,
            )
        })?;
        let to = to_converted.to_int().ok_or_else(|| {
            self.error(
                ErrorKind::TypeMismatch(format!("{} is not an integer", to_converted.value)),
                rule.span,
            )
        })?;

        let descending = from > to;
        let mut i = from;
        loop {
            if rule.exclusive {
                if (!descending && i >= to) || (descending && i <= to) {
                    break;
                }
            } else if (!descending && i > to) || (descending && i < to) {
                break;
            }
            let saved = self.env.clone();
            self.env = saved.child();
            let mut unit_number = from_num.clone();
            unit_number.value = i as f64;
            unit_number.as_slash = None;
            self.env
                .define_var(rule.var.clone(), Value::Number(unit_number));
            let flow = self.eval_stmts(&rule.body, out);
            self.env = saved;
            match flow? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
            i += if descending { -1 } else { 1 };
        }
        Ok(Flow::Normal)
    }

    fn visit_each(
        &mut self,
        rule: &crate::ast::EachRule,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let iterable = self.eval_expr(&rule.iterable)?;
        for element in iterable.as_list() {
            let saved = self.env.clone();
            self.env = saved.child();
            if rule.vars.len() == 1 {
                self.env.define_var(rule.vars[0].clone(), element);
            } else {
                let parts = element.as_list();
                for (i, var) in rule.vars.iter().enumerate() {
                    let value = parts.get(i).cloned().unwrap_or(Value::Null);
                    self.env.define_var(var.clone(), value);
                }
            }
            let flow = self.eval_stmts(&rule.body, out);
            self.env = saved;
            match flow? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_include(
        &mut self,
        rule: &crate::ast::IncludeRule,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let mixin = match &rule.namespace {
            Some(ns) => match self.namespaces.get(ns) {
                Some(ModuleRef::User(module)) => module.get_mixin(&rule.name),
                _ => None,
            },
            None => self.env.get_mixin(&rule.name),
        };
        let mixin = mixin.ok_or_else(|| {
            self.error(
                ErrorKind::Custom(format!("no mixin named {}", rule.name)),
                rule.span,
            )
        })?;

        let args = self.eval_invocation_args(&rule.args)?;
        self.push_trace(rule.name.to_string(), rule.span)?;

        let has_content = rule.content.is_some();
        if let Some(content) = &rule.content {
            self.content_stack.push((content.clone(), self.env.clone()));
        }

        let callee_env = mixin.env.child();
        self.bind_args(&mixin.decl.params, args, &callee_env, rule.span)?;
        let saved_env = std::mem::replace(&mut self.env, callee_env);
        let flow = self.eval_stmts(&mixin.decl.body, out);
        self.env = saved_env;

        if has_content {
            self.content_stack.pop();
        }
        self.call_stack.pop();

        match flow? {
            Flow::Normal => Ok(Flow::Normal),
            Flow::Return(_) => Err(self.error(
                ErrorKind::Syntax("@return may only be used within a function".to_string()),
                rule.span,
            )),
        }
    }

    fn visit_content(
        &mut self,
        rule: &crate::ast::ContentRule,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let (block, env) = match self.content_stack.pop() {
            Some(entry) => entry,
            None => {
                return Err(self.error(
                    ErrorKind::Syntax(
                        "@content is only allowed within mixin declarations".to_string(),
                    ),
                    rule.span,
                ))
            }
        };
        let args = self.eval_invocation_args(&rule.args)?;
        self.push_trace("@content".to_string(), rule.span)?;

        let content_env = env.child();
        let result = self
            .bind_args(&block.params, args, &content_env, rule.span)
            .and_then(|()| {
                let saved_env = std::mem::replace(&mut self.env, content_env);
                let flow = self.eval_stmts(&block.body, out);
                self.env = saved_env;
                flow
            });

        self.call_stack.pop();
        self.content_stack.push((block, env));
        match result? {
            Flow::Normal => Ok(Flow::Normal),
            flow @ Flow::Return(_) => Ok(flow),
        }
    }

    fn visit_extend(&mut self, rule: &crate::ast::ExtendRule) -> SassResult<Flow> {
        let text = self.eval_interpolation(&rule.selector)?;
        let targets = parse_selector(&text, rule.span, false, true)?;
        let current = self.selector_stack.last().cloned().ok_or_else(|| {
            self.error(
                ErrorKind::Syntax("@extend may only be used within style rules".to_string()),
                rule.span,
            )
        })?;
        let media_context = self.media_stack.last().cloned();

        for target_complex in &targets.components {
            let target = match target_complex.components.as_slice() {
                [ComplexComponent::Compound(compound)] => compound.clone(),
                _ => {
                    return Err(self.error(
                        ErrorKind::InvalidValue(format!(
                            "complex selectors may not be extended: {}",
                            target_complex
                        )),
                        rule.span,
                    ))
                }
            };
            for extender in &current.components {
                self.extensions.push(Extension::new(
                    target.clone(),
                    extender.clone(),
                    rule.span,
                    rule.optional,
                    media_context.clone(),
                ));
            }
        }
        Ok(Flow::Normal)
    }

    fn visit_dynamic_import(
        &mut self,
        url: &str,
        span: Span,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<Flow> {
        let sheet = self.load_sheet(url, span)?;
        let path = sheet.path.clone();

        if let Some(path) = &path {
            if let Err(trail) = self.cache.enter(path) {
                let trail: Vec<String> = trail
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(self.error(
                    ErrorKind::Custom(format!("circular import: {}", trail.join(" -> "))),
                    span,
                ));
            }
        }
        self.push_trace(format!("@import \"{}\"", url), span)?;
        let saved_path = self.current_path.clone();
        self.current_path = path.clone();

        let flow = self.eval_stmts(&sheet.stmts, out);

        self.current_path = saved_path;
        self.call_stack.pop();
        if let Some(path) = &path {
            self.cache.leave(path);
        }
        flow
    }

    /// Resolves and parses a sheet through the importer chain.
    fn load_sheet(&mut self, url: &str, span: Span) -> SassResult<Rc<Stylesheet>> {
        let previous = self.current_path.clone();
        let mut resolved = None;
        for importer in &self.importers {
            match importer.resolve(url, previous.as_deref()) {
                ImporterResult::NotFound => continue,
                ImporterResult::Error(message) => {
                    return Err(self.error(ErrorKind::Io(message), span))
                }
                found @ ImporterResult::Resolved { .. } => {
                    resolved = Some(found);
                    break;
                }
            }
        }
        let resolved = match resolved {
            Some(r) => r,
            None => self.file_importer.resolve(url, previous.as_deref()),
        };

        let (path, contents, syntax) = match resolved {
            ImporterResult::Resolved {
                path,
                contents,
                syntax,
            } => (path, contents, syntax),
            ImporterResult::Error(message) => {
                return Err(self.error(ErrorKind::Io(message), span))
            }
            ImporterResult::NotFound => {
                return Err(self.error(
                    ErrorKind::Io(format!("can't find stylesheet to import: {}", url)),
                    span,
                ))
            }
        };

        self.cache.record_included(&path);
        if let Some(sheet) = self.cache.get(&path) {
            return Ok(sheet);
        }

        let contents = match contents {
            Some(text) => text,
            None => std::fs::read_to_string(&path).map_err(|e| {
                self.error(
                    ErrorKind::Io(format!("error reading {}: {}", path.display(), e)),
                    span,
                )
            })?,
        };
        let syntax = syntax
            .unwrap_or(Syntax::Auto)
            .resolve(Some(Path::new(&path)));
        let text = match syntax {
            Syntax::Sass => crate::indented::to_scss(&contents),
            _ => contents,
        };

        let file = self.sources.add(path.display().to_string(), text);
        let sheet = Rc::new(parse_stylesheet(
            file.source(),
            file.span,
            syntax,
            Some(path.clone()),
        )?);
        self.cache.insert(path, sheet.clone());
        Ok(sheet)
    }

    /// Loads and evaluates a module once; its CSS lands at the first use
    /// site.
    fn load_module(
        &mut self,
        url: &str,
        span: Span,
        out: &mut Vec<CssStmt>,
    ) -> SassResult<ModuleRef> {
        if let Some(name) = url.strip_prefix("sass:") {
            return Ok(ModuleRef::Builtin(name.to_string()));
        }

        let sheet = self.load_sheet(url, span)?;
        let path = sheet.path.clone();
        if let Some(path) = &path {
            if let Some(module) = self.modules.get(path) {
                return Ok(ModuleRef::User(module.clone()));
            }
            if let Err(trail) = self.cache.enter(path) {
                let trail: Vec<String> =
                    trail.iter().map(|p| p.display().to_string()).collect();
                return Err(self.error(
                    ErrorKind::Custom(format!("module loop: {}", trail.join(" -> "))),
                    span,
                ));
            }
        }

        self.push_trace(format!("@use \"{}\"", url), span)?;
        let module_env = Env::new_root();
        let saved_env = std::mem::replace(&mut self.env, module_env.clone());
        let saved_path = std::mem::replace(&mut self.current_path, path.clone());
        let saved_selectors = std::mem::take(&mut self.selector_stack);
        let saved_media = std::mem::take(&mut self.media_stack);

        let mut body = Vec::new();
        let flow = self.eval_stmts(&sheet.stmts, &mut body);

        self.env = saved_env;
        self.current_path = saved_path;
        self.selector_stack = saved_selectors;
        self.media_stack = saved_media;
        self.call_stack.pop();
        if let Some(path) = &path {
            self.cache.leave(path);
        }
        flow?;
        out.extend(body);

        let module = Module { env: module_env };
        if let Some(path) = path {
            self.modules.insert(path, module.clone());
        }
        Ok(ModuleRef::User(module))
    }

    fn bind_namespace(
        &mut self,
        name: Ident,
        module: ModuleRef,
        span: Span,
    ) -> SassResult<()> {
        if self.namespaces.contains_key(&name) {
            return Err(self.error(
                ErrorKind::Custom(format!(
                    "there is already a module with namespace \"{}\"",
                    name
                )),
                span,
            ));
        }
        self.namespaces.insert(name, module);
        Ok(())
    }

    // ---- expressions -----------------------------------------------------

    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> SassResult<Value> {
        match expr {
            Expr::Number { value, unit, .. } => Ok(Value::Number(match unit {
                Some(unit) => crate::value::Number::with_unit(*value, unit),
                None => crate::value::Number::new(*value),
            })),
            Expr::Color { value, .. } => Ok(Value::Color(value.clone())),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Null { .. } => Ok(Value::Null),
            Expr::String {
                contents, quoted, ..
            } => {
                let text = self.eval_interpolation(contents)?;
                if !quoted {
                    if let Some(plain) = contents.as_plain() {
                        if let Some(color) = Color::from_name(plain) {
                            return Ok(Value::Color(color));
                        }
                    }
                    return Ok(Value::String(text, QuoteKind::None));
                }
                Ok(Value::String(text, QuoteKind::Quoted))
            }
            Expr::List {
                items,
                separator,
                bracketed,
                ..
            } => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<SassResult<Vec<_>>>()?;
                Ok(Value::List {
                    items,
                    separator: *separator,
                    bracketed: *bracketed,
                })
            }
            Expr::Map { pairs, span } => {
                let mut map = SassMap::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval_expr(key_expr)?;
                    if map.contains_key(&key) {
                        return Err(self.error(
                            ErrorKind::InvalidValue(format!(
                                "duplicate key {} in map",
                                key.inspect(self.precision)
                            )),
                            *span,
                        ));
                    }
                    let value = self.eval_expr(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            Expr::Variable {
                name,
                namespace,
                span,
            } => match namespace {
                Some(ns) => match self.namespaces.get(ns) {
                    Some(ModuleRef::User(module)) => {
                        module.get_var(name).ok_or_else(|| {
                            self.error(
                                ErrorKind::Custom(format!(
                                    "undefined variable: \"{}.${}\"",
                                    ns, name
                                )),
                                *span,
                            )
                        })
                    }
                    _ => Err(self.error(
                        ErrorKind::Custom(format!(
                            "there is no module with the namespace \"{}\"",
                            ns
                        )),
                        *span,
                    )),
                },
                None => self.env.get_var(name).ok_or_else(|| {
                    self.error(
                        ErrorKind::Custom(format!("undefined variable: ${}", name)),
                        *span,
                    )
                }),
            },
            Expr::BinaryOp {
                op,
                lhs,
                rhs,
                allows_slash,
                span,
            } => {
                use crate::ast::BinaryOperator::{And, Or};
                match op {
                    And => {
                        let lhs = self.eval_expr(lhs)?;
                        if !lhs.is_truthy() {
                            return Ok(lhs);
                        }
                        self.eval_expr(rhs)
                    }
                    Or => {
                        let lhs = self.eval_expr(lhs)?;
                        if lhs.is_truthy() {
                            return Ok(lhs);
                        }
                        self.eval_expr(rhs)
                    }
                    _ => {
                        let lhs = self.eval_expr(lhs)?;
                        let rhs = self.eval_expr(rhs)?;
                        ops::binary_op(*op, lhs, rhs, *allows_slash, self.precision)
                            .map_err(|kind| self.error(kind, *span))
                    }
                }
            }
            Expr::UnaryOp { op, operand, span } => {
                let operand = self.eval_expr(operand)?;
                ops::unary_op(*op, operand, self.precision)
                    .map_err(|kind| self.error(kind, *span))
            }
            Expr::Paren { inner, .. } => {
                // Parentheses force a literal `a/b` to act as division.
                match self.eval_expr(inner)? {
                    Value::Number(mut n) => {
                        n.as_slash = None;
                        Ok(Value::Number(n))
                    }
                    other => Ok(other),
                }
            }
            Expr::ParentSelector { .. } => match self.selector_stack.last() {
                Some(selector) => Ok(crate::builtin::selector_as_value(selector)),
                None => Ok(Value::Null),
            },
            Expr::FunctionCall {
                name,
                namespace,
                args,
                span,
            } => self.visit_function_call(name, namespace.as_ref(), args, *span),
        }
    }

    fn visit_function_call(
        &mut self,
        name: &Ident,
        namespace: Option<&Ident>,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        if let Some(ns) = namespace {
            let function = match self.namespaces.get(ns) {
                Some(ModuleRef::User(module)) => module.get_fn(name),
                Some(ModuleRef::Builtin(module_name)) => {
                    builtin_module_function(module_name, name).map(SassFunction::Builtin)
                }
                None => {
                    return Err(self.error(
                        ErrorKind::Custom(format!(
                            "there is no module with the namespace \"{}\"",
                            ns
                        )),
                        span,
                    ))
                }
            };
            let function = function.ok_or_else(|| {
                self.error(
                    ErrorKind::Custom(format!("undefined function {}.{}()", ns, name)),
                    span,
                )
            })?;
            let args = self.eval_invocation_args(invocation)?;
            return self.call_sass_function_at(function, args, span);
        }

        // Lazy `if()`: only the taken branch is evaluated.
        if name.as_str() == "if" && self.env.get_fn(name).is_none() {
            return self.eval_if_function(invocation, span);
        }

        if let Some(function) = self.env.get_fn(name) {
            let args = self.eval_invocation_args(invocation)?;
            return self.call_sass_function_at(function, args, span);
        }
        if let Some(host) = self.host_functions.get(name).cloned() {
            let args = self.eval_invocation_args(invocation)?;
            return self.call_host_function(&*host, args, span);
        }
        if let Some(f) = builtin::lookup(name.as_str()) {
            let args = self.eval_invocation_args(invocation)?;
            self.push_trace(name.to_string(), span)?;
            let result = f(args, self);
            self.call_stack.pop();
            return result;
        }

        // Unknown functions pass through as plain CSS.
        if !invocation.keywords.is_empty() || invocation.rest.is_some() {
            return Err(self.error(
                ErrorKind::Custom(format!(
                    "plain CSS function {}() doesn't support keyword arguments",
                    name
                )),
                span,
            ));
        }
        let mut rendered = Vec::new();
        for arg in &invocation.positional {
            let value = self.eval_expr(arg)?;
            rendered.push(
                value
                    .to_css_string(self.precision, false)
                    .map_err(|m| self.error(ErrorKind::InvalidValue(m), span))?,
            );
        }
        Ok(Value::String(
            format!("{}({})", name, rendered.join(", ")),
            QuoteKind::None,
        ))
    }

    fn eval_if_function(
        &mut self,
        invocation: &ArgumentInvocation,
        span: Span,
    ) -> SassResult<Value> {
        let get = |position: usize, name: &str| -> Option<&Expr> {
            invocation
                .positional
                .get(position)
                .or_else(|| invocation.keywords.get(&Ident::new(name)))
        };
        let condition = get(0, "condition")
            .ok_or_else(|| self.error(ErrorKind::MissingArgument("condition".into()), span))?
            .clone();
        let if_true = get(1, "if-true")
            .ok_or_else(|| self.error(ErrorKind::MissingArgument("if-true".into()), span))?
            .clone();
        let if_false = get(2, "if-false")
            .ok_or_else(|| self.error(ErrorKind::MissingArgument("if-false".into()), span))?
            .clone();
        if self.eval_expr(&condition)?.is_truthy() {
            self.eval_expr(&if_true)
        } else {
            self.eval_expr(&if_false)
        }
    }

    // ---- calls and binding ----------------------------------------------

    pub(crate) fn eval_invocation_args(
        &mut self,
        invocation: &ArgumentInvocation,
    ) -> SassResult<CallArgs> {
        let mut args = CallArgs::new(invocation.span);
        for expr in &invocation.positional {
            let value = self.eval_expr(expr)?;
            args.positional.push(value);
        }
        for (name, expr) in &invocation.keywords {
            let value = self.eval_expr(expr)?;
            args.named.insert(name.clone(), value);
        }
        if let Some(rest) = &invocation.rest {
            let rest_span = rest.span();
            match self.eval_expr(rest)? {
                Value::ArgList(arglist) => {
                    args.separator = arglist.separator;
                    args.positional.extend(arglist.values);
                    for (name, value) in arglist.keywords {
                        args.named.insert(name, value);
                    }
                }
                Value::Map(map) => {
                    self.named_from_map(map, &mut args, rest_span)?;
                }
                Value::List {
                    items, separator, ..
                } => {
                    args.separator = separator;
                    args.positional.extend(items);
                }
                other => args.positional.push(other),
            }
        }
        if let Some(kw_rest) = &invocation.keyword_rest {
            let kw_span = kw_rest.span();
            match self.eval_expr(kw_rest)? {
                Value::Map(map) => self.named_from_map(map, &mut args, kw_span)?,
                other => {
                    return Err(self.error(
                        ErrorKind::TypeMismatch(format!(
                            "variable keyword arguments must be a map (was {})",
                            other.inspect(self.precision)
                        )),
                        kw_span,
                    ))
                }
            }
        }
        Ok(args)
    }

    fn named_from_map(
        &mut self,
        map: SassMap,
        args: &mut CallArgs,
        span: Span,
    ) -> SassResult<()> {
        for (key, value) in map.into_pairs() {
            match key {
                Value::String(name, _) => {
                    args.named.insert(Ident::new(&name), value);
                }
                other => {
                    return Err(self.error(
                        ErrorKind::TypeMismatch(format!(
                            "map keys passed as keyword arguments must be strings (was {})",
                            other.inspect(self.precision)
                        )),
                        span,
                    ))
                }
            }
        }
        Ok(())
    }

    /// Binds evaluated arguments to a parameter list in `env`.
    fn bind_args(
        &mut self,
        params: &ParameterList,
        mut args: CallArgs,
        env: &Env,
        span: Span,
    ) -> SassResult<()> {
        for (i, param) in params.params.iter().enumerate() {
            if i < args.positional.len() {
                if args.named.contains_key(&param.name) {
                    return Err(self.error(
                        ErrorKind::InvalidValue(format!(
                            "argument ${} was passed both by position and by name",
                            param.name
                        )),
                        span,
                    ));
                }
                env.define_var(param.name.clone(), args.positional[i].clone());
            } else if let Some(value) = args.named.shift_remove(&param.name) {
                env.define_var(param.name.clone(), value);
            } else if let Some(default) = &param.default {
                // Defaults see the parameters bound before them.
                let saved = std::mem::replace(&mut self.env, env.clone());
                let value = self.eval_expr(default);
                self.env = saved;
                env.define_var(param.name.clone(), value?);
            } else {
                return Err(self.error(
                    ErrorKind::MissingArgument(param.name.to_string()),
                    span,
                ));
            }
        }

        match &params.rest {
            Some(rest_name) => {
                let leftover: Vec<Value> = args
                    .positional
                    .drain(params.params.len().min(args.positional.len())..)
                    .collect();
                let keywords = std::mem::take(&mut args.named);
                env.define_var(
                    rest_name.clone(),
                    Value::ArgList(ArgList {
                        values: leftover,
                        keywords,
                        separator: match args.separator {
                            ListSeparator::Undecided => ListSeparator::Comma,
                            sep => sep,
                        },
                    }),
                );
            }
            None => {
                if args.positional.len() > params.params.len() {
                    return Err(self.error(
                        ErrorKind::InvalidValue(format!(
                            "wrong number of arguments ({} for {})",
                            args.positional.len(),
                            params.params.len()
                        )),
                        span,
                    ));
                }
                args.assert_no_leftovers()?;
            }
        }
        Ok(())
    }

    fn call_sass_function_at(
        &mut self,
        function: SassFunction,
        args: CallArgs,
        span: Span,
    ) -> SassResult<Value> {
        match function {
            SassFunction::UserDefined { decl, env } => {
                self.call_user_function(&decl, &env, args, span)
            }
            SassFunction::Builtin(name) => {
                let f = builtin::lookup(name.as_str()).ok_or_else(|| {
                    self.error(
                        ErrorKind::Custom(format!("undefined function {}()", name)),
                        span,
                    )
                })?;
                self.push_trace(name.to_string(), span)?;
                let result = f(args, self);
                self.call_stack.pop();
                result
            }
            SassFunction::Host(host) => self.call_host_function(&*host, args, span),
        }
    }

    /// Entry point for the `call()` builtin.
    pub fn call_sass_function(
        &mut self,
        function: SassFunction,
        args: CallArgs,
    ) -> SassResult<Value> {
        let span = args.span;
        self.call_sass_function_at(function, args, span)
    }

    fn call_user_function(
        &mut self,
        decl: &Rc<CallableDecl>,
        closure: &Env,
        args: CallArgs,
        span: Span,
    ) -> SassResult<Value> {
        self.push_trace(decl.name.to_string(), span)?;
        let callee_env = closure.child();
        let result = self
            .bind_args(&decl.params, args, &callee_env, span)
            .and_then(|()| {
                let saved_env = std::mem::replace(&mut self.env, callee_env);
                let saved_in_function = std::mem::replace(&mut self.in_function, true);
                let mut discarded = Vec::new();
                let flow = self.eval_stmts(&decl.body, &mut discarded);
                self.env = saved_env;
                self.in_function = saved_in_function;
                flow
            });
        self.call_stack.pop();
        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Err(self.error(
                ErrorKind::Custom(format!(
                    "function {} finished without @return",
                    decl.name
                )),
                span,
            )),
        }
    }

    fn call_host_function(
        &mut self,
        host: &dyn crate::api::HostFunction,
        args: CallArgs,
        span: Span,
    ) -> SassResult<Value> {
        self.push_trace(host.name().to_string(), span)?;
        let result = host.call(&args);
        self.call_stack.pop();
        result.map_err(|message| self.error(ErrorKind::Custom(message), span))
    }

    // ---- shared infrastructure ------------------------------------------

    pub(crate) fn eval_interpolation(&mut self, interp: &Interpolation) -> SassResult<String> {
        let mut out = String::new();
        for part in &interp.parts {
            match part {
                InterpolationPart::Literal(text) => out.push_str(text),
                InterpolationPart::Expr(expr) => {
                    let span = expr.span();
                    let value = self.eval_expr(expr)?;
                    let text = match value {
                        // Interpolation unquotes strings.
                        Value::String(s, _) => s,
                        other => other
                            .to_css_string(self.precision, false)
                            .map_err(|m| self.error(ErrorKind::InvalidValue(m), span))?,
                    };
                    out.push_str(&text);
                }
            }
        }
        Ok(out)
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.env.clone();
        self.env = saved.child();
        let result = f(self);
        self.env = saved;
        result
    }

    fn scoped_stmts(&mut self, stmts: &[Stmt], out: &mut Vec<CssStmt>) -> SassResult<Flow> {
        self.scoped(|ev| ev.eval_stmts(stmts, out))
    }

    fn push_trace(&mut self, name: String, span: Span) -> SassResult<()> {
        if self.call_stack.len() >= MAX_CALL_DEPTH {
            return Err(self.error(ErrorKind::RecursionLimit(MAX_CALL_DEPTH), span));
        }
        self.call_stack.push(Trace { name, span });
        Ok(())
    }

    fn error(&self, kind: ErrorKind, span: Span) -> Box<SassError> {
        SassError::new(kind, span).with_traces(self.call_stack.clone())
    }

    /// `@warn`/`@error`/`@debug` print strings without their quotes.
    fn diagnostic_text(&self, value: &Value) -> String {
        match value {
            Value::String(text, _) => text.clone(),
            other => other.inspect(self.precision),
        }
    }

    // ---- hooks used by the builtins -------------------------------------

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn random_float(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    pub fn random_int(&mut self, limit: i64) -> i64 {
        self.rng.gen_range(1..=limit)
    }

    pub fn unique_id(&mut self) -> String {
        let n: u64 = self.rng.gen_range(0..36u64.pow(8));
        let mut id = String::from("u");
        let mut n = n;
        for _ in 0..8 {
            let digit = (n % 36) as u32;
            id.push(char::from_digit(digit, 36).expect("radix 36"));
            n /= 36;
        }
        id
    }

    pub fn variable_exists(&self, name: &Ident) -> bool {
        self.env.get_var(name).is_some()
    }

    pub fn global_variable_exists(&self, name: &Ident) -> bool {
        self.env.global_var_exists(name)
    }

    pub fn function_exists(&self, name: &Ident) -> bool {
        self.env.get_fn(name).is_some()
            || self.host_functions.contains_key(name)
            || builtin::lookup(name.as_str()).is_some()
    }

    pub fn mixin_exists(&self, name: &Ident) -> bool {
        self.env.get_mixin(name).is_some()
    }

    pub fn content_exists(&self) -> bool {
        !self.content_stack.is_empty()
    }

    pub fn get_function_value(&self, name: &Ident) -> Option<SassFunction> {
        if let Some(f) = self.env.get_fn(name) {
            return Some(f);
        }
        if let Some(host) = self.host_functions.get(name) {
            return Some(SassFunction::Host(host.clone()));
        }
        if builtin::lookup(name.as_str()).is_some() {
            return Some(SassFunction::Builtin(name.clone()));
        }
        None
    }
}

/// Maps a `sass:` module function name onto the classic global name.
fn builtin_module_function(module: &str, name: &Ident) -> Option<Ident> {
    let plain = name.clone();
    if builtin::lookup(plain.as_str()).is_some() {
        return Some(plain);
    }
    let prefixed = Ident::new(&format!("{}-{}", module, name));
    if builtin::lookup(prefixed.as_str()).is_some() {
        return Some(prefixed);
    }
    if module == "string" {
        let str_prefixed = Ident::new(&format!("str-{}", name));
        if builtin::lookup(str_prefixed.as_str()).is_some() {
            return Some(str_prefixed);
        }
    }
    None
}

/// The namespace a `@use` without `as` gets: the URL's file stem.
fn default_namespace(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    let stem = last.strip_prefix('_').unwrap_or(last);
    let stem = stem
        .strip_suffix(".scss")
        .or_else(|| stem.strip_suffix(".sass"))
        .unwrap_or(stem);
    stem.to_string()
}

/// Parses `(with: …)` / `(without: …)`.
fn parse_at_root_query(text: &str, span: Span) -> SassResult<AtRootQuery> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| {
            SassError::new(ErrorKind::Syntax("expected @at-root query".to_string()), span)
        })?;
    let (keyword, names) = inner.split_once(':').ok_or_else(|| {
        SassError::new(ErrorKind::Syntax("expected \":\" in @at-root query".to_string()), span)
    })?;
    let include = match keyword.trim() {
        "with" => true,
        "without" => false,
        other => {
            return Err(SassError::new(
                ErrorKind::Syntax(format!(
                    "expected \"with\" or \"without\" in @at-root query, was \"{}\"",
                    other
                )),
                span,
            ))
        }
    };
    let names: Vec<String> = names
        .split_whitespace()
        .map(|s| s.to_ascii_lowercase())
        .collect();
    if names.is_empty() {
        return Err(SassError::new(
            ErrorKind::Syntax("expected at-rule names in @at-root query".to_string()),
            span,
        ));
    }
    Ok(AtRootQuery { include, names })
}
