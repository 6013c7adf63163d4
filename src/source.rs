//! Source text bookkeeping.
//!
//! Every piece of input consumed during a compilation, the entry point and
//! everything reached through `@import`/`@use`, is interned here.  A
//! [`codemap::Span`] is the only thing AST nodes carry around; line/column
//! information is recovered on demand when formatting diagnostics or writing
//! the source map.

use std::path::Path;
use std::sync::Arc;

use codemap::{CodeMap, File, Span, SpanLoc};

/// The syntax dialect of one source.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Syntax {
    /// Pick based on the file extension; defaults to [`Syntax::Scss`].
    Auto,

    /// The brace-delimited SCSS dialect.
    Scss,

    /// The whitespace-sensitive indented dialect.
    Sass,

    /// Plain CSS; Sass-only constructs are syntax errors.
    Css,
}

impl Syntax {
    /// The syntax implied by a file name.
    pub fn for_path(path: &Path) -> Syntax {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sass") => Syntax::Sass,
            Some("css") => Syntax::Css,
            _ => Syntax::Scss,
        }
    }

    /// Resolves `Auto` against an optional file name.
    pub fn resolve(self, path: Option<&Path>) -> Syntax {
        match self {
            Syntax::Auto => path.map_or(Syntax::Scss, Syntax::for_path),
            other => other,
        }
    }
}

/// All sources loaded during one compilation.
///
/// Sources outlive the AST parsed from them; spans index into this structure.
pub struct Sources {
    map: CodeMap,
    files: Vec<Arc<File>>,
}

impl Sources {
    pub fn new() -> Sources {
        Sources {
            map: CodeMap::new(),
            files: Vec::new(),
        }
    }

    /// Interns a source and returns its file handle.
    pub fn add(&mut self, name: String, contents: String) -> Arc<File> {
        let file = self.map.add_file(name, contents);
        self.files.push(file.clone());
        file
    }

    /// All files, in the order they were loaded.
    pub fn files(&self) -> &[Arc<File>] {
        &self.files
    }

    /// Line/column lookup for diagnostics; positions are zero-based.
    pub fn look_up(&self, span: Span) -> SpanLoc {
        self.map.look_up_span(span)
    }

    /// The text a span covers.
    pub fn snippet(&self, span: Span) -> String {
        let file = self.map.find_file(span.low());
        file.source_slice(span).to_string()
    }
}

impl Default for Sources {
    fn default() -> Self {
        Sources::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn syntax_from_extension() {
        assert_eq!(Syntax::for_path(&PathBuf::from("a.scss")), Syntax::Scss);
        assert_eq!(Syntax::for_path(&PathBuf::from("a.sass")), Syntax::Sass);
        assert_eq!(Syntax::for_path(&PathBuf::from("a.css")), Syntax::Css);
        assert_eq!(Syntax::for_path(&PathBuf::from("a")), Syntax::Scss);
    }

    #[test]
    fn auto_resolves_against_path() {
        let p = PathBuf::from("style.sass");
        assert_eq!(Syntax::Auto.resolve(Some(&p)), Syntax::Sass);
        assert_eq!(Syntax::Auto.resolve(None), Syntax::Scss);
        assert_eq!(Syntax::Css.resolve(Some(&p)), Syntax::Css);
    }

    #[test]
    fn spans_point_into_loaded_sources() {
        let mut sources = Sources::new();
        let file = sources.add("test.scss".to_string(), "a { b: c; }".to_string());
        let span = file.span.subspan(4, 8);
        assert_eq!(sources.snippet(span), "b: c");
        let loc = sources.look_up(span);
        assert_eq!(loc.begin.line, 0);
        assert_eq!(loc.begin.column, 4);
    }
}
