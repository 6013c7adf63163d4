//! The public compiler API.
//!
//! A [`Compiler`] is configured once with [`Options`] and drives each
//! compilation through parse, evaluate, transform, and render.  Compilations
//! are strictly single-threaded and share nothing; callers wanting
//! parallelism use independent compilers.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cssize::cssize;
use crate::emitter::Emitter;
pub use crate::emitter::OutputStyle;
use crate::error::SassError;
use crate::eval::{CallArgs, EvalConfig, Evaluator};
use crate::importer::Importer;
use crate::parse::parse_stylesheet;
use crate::session::{Session, Warning};
use crate::source::{Sources, Syntax};
pub use crate::srcmap::SourceMapMode;
use crate::srcmap::{build_source_map, footer};
use crate::value::Value;

/// A function made available to stylesheets by the embedding application.
///
/// Values crossing this boundary are ordinary [`Value`]s; returning `Err`
/// behaves as if the call site raised the error.
pub trait HostFunction {
    fn name(&self) -> &str;
    fn call(&self, args: &CallArgs) -> Result<Value, String>;
}

/// Compiler configuration.
pub struct Options {
    pub style: OutputStyle,
    /// Number-to-string precision.
    pub precision: usize,
    pub source_map: SourceMapMode,
    /// Include `sourcesContent` in the map.
    pub embed_contents: bool,
    /// Emit `file:` URLs in the map's `sources`.
    pub file_urls: bool,
    /// Searched after importer callbacks, in order.
    pub include_paths: Vec<PathBuf>,
    pub importers: Vec<Rc<dyn Importer>>,
    pub functions: Vec<Rc<dyn HostFunction>>,
    /// Fixed seed for `random()`, for reproducible output.
    pub random_seed: Option<u64>,
    /// The output file name recorded in the source map.
    pub output_file: String,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            style: OutputStyle::Expanded,
            precision: 10,
            source_map: SourceMapMode::None,
            embed_contents: false,
            file_urls: false,
            include_paths: Vec::new(),
            importers: Vec::new(),
            functions: Vec::new(),
            random_seed: None,
            output_file: "stylesheet.css".to_string(),
        }
    }
}

impl Options {
    pub fn with_style(mut self, style: OutputStyle) -> Options {
        self.style = style;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Options {
        self.precision = precision;
        self
    }

    pub fn with_source_map(mut self, mode: SourceMapMode) -> Options {
        self.source_map = mode;
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Options {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_importer(mut self, importer: Rc<dyn Importer>) -> Options {
        self.importers.push(importer);
        self
    }

    pub fn with_function(mut self, function: Rc<dyn HostFunction>) -> Options {
        self.functions.push(function);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Options {
        self.random_seed = Some(seed);
        self
    }
}

/// The outcome of a successful compilation.
#[derive(Debug)]
pub struct CompileResult {
    /// UTF-8 CSS text, newline-terminated except in compressed mode.
    pub css: String,
    /// The source-map JSON, when a map was requested.
    pub source_map: Option<String>,
    /// Every file consulted, in discovery order.
    pub included_files: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// A compilation failure, pre-rendered for display.
#[derive(Debug)]
pub struct CompileError {
    message: String,
    formatted: String,
    json: serde_json::Value,
}

impl CompileError {
    fn from_sass(error: Box<SassError>, sources: &Sources) -> CompileError {
        CompileError {
            message: format!("{}", error.kind()),
            formatted: error.format(sources, true),
            json: error.to_json(sources, true),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The user-visible multi-line rendering with backtrace and position.
    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    /// The structured form: `{status, what, traces, formatted}`.
    pub fn to_json(&self) -> &serde_json::Value {
        &self.json
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompileError {}

/// The driver's lifecycle; each transition happens exactly once per job.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum DriverState {
    Created,
    Parsed,
    Compiled,
    Rendered,
}

pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            options: Options::default(),
        }
    }

    pub fn with_options(options: Options) -> Compiler {
        Compiler { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compiles a file entry point.
    pub fn compile_path(&self, path: impl AsRef<Path>) -> Result<CompileResult, CompileError> {
        let path = path.as_ref();
        let mut sources = Sources::new();
        let contents = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                let error = SassError::raw(crate::error::ErrorKind::Io(format!(
                    "error reading {}: {}",
                    path.display(),
                    e
                )));
                return Err(CompileError::from_sass(error, &sources));
            }
        };
        let syntax = Syntax::Auto.resolve(Some(path));
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.compile(
            &mut sources,
            contents,
            syntax,
            Some(canonical),
            path.display().to_string(),
        )
    }

    /// Compiles an in-memory string ("data source").
    pub fn compile_string(
        &self,
        source: &str,
        syntax: Syntax,
    ) -> Result<CompileResult, CompileError> {
        let mut sources = Sources::new();
        let syntax = syntax.resolve(None);
        self.compile(
            &mut sources,
            source.to_string(),
            syntax,
            None,
            "stdin".to_string(),
        )
    }

    fn compile(
        &self,
        sources: &mut Sources,
        contents: String,
        syntax: Syntax,
        path: Option<PathBuf>,
        name: String,
    ) -> Result<CompileResult, CompileError> {
        let mut state = DriverState::Created;
        let mut session = Session::new();

        let text = match syntax {
            Syntax::Sass => crate::indented::to_scss(&contents),
            _ => contents,
        };
        let file = sources.add(name, text);
        let sheet = parse_stylesheet(file.source(), file.span, syntax, path)
            .map_err(|e| CompileError::from_sass(e, sources))?;
        advance(&mut state, DriverState::Created, DriverState::Parsed);

        let config = EvalConfig {
            precision: self.options.precision,
            include_paths: self.options.include_paths.clone(),
            importers: self.options.importers.clone(),
            functions: self.options.functions.clone(),
            random_seed: self.options.random_seed,
        };
        let evaluated = Evaluator::new(sources, &mut session, config)
            .run(&sheet)
            .map_err(|e| CompileError::from_sass(e, sources))?;
        let tree = cssize(evaluated.stmts, &evaluated.extensions)
            .map_err(|e| CompileError::from_sass(e, sources))?;
        advance(&mut state, DriverState::Parsed, DriverState::Compiled);

        let emitter = Emitter::new(self.options.style, self.options.precision);
        let (mut css, mappings) = emitter
            .emit(&tree)
            .map_err(|e| CompileError::from_sass(e, sources))?;
        advance(&mut state, DriverState::Compiled, DriverState::Rendered);

        let source_map = match &self.options.source_map {
            SourceMapMode::None => None,
            mode => {
                let json = build_source_map(
                    &mappings,
                    sources,
                    &self.options.output_file,
                    self.options.embed_contents,
                    self.options.file_urls,
                );
                if let Some(comment) = footer(mode, &json) {
                    css.push_str(&comment);
                    if self.options.style != OutputStyle::Compressed {
                        css.push('\n');
                    }
                }
                Some(json)
            }
        };

        Ok(CompileResult {
            css,
            source_map,
            included_files: evaluated.included_files,
            warnings: session.take_warnings(),
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

fn advance(state: &mut DriverState, expected: DriverState, next: DriverState) {
    debug_assert_eq!(*state, expected, "driver transition out of order");
    *state = next;
}
