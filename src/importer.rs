//! Import resolution.
//!
//! Custom importers run first, in registration order; the file-system
//! resolver runs last, searching relative to the importing file and then
//! each include path.  Loaded sheets are cached by canonical absolute path,
//! the active import chain is tracked for cycle detection, and every
//! consulted path is recorded for the `included_files` output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ast::Stylesheet;
use crate::source::Syntax;

/// What an importer callback can answer.
#[derive(Debug, Clone)]
pub enum ImporterResult {
    Resolved {
        /// The canonical path, used for caching and cycle detection.  A
        /// data-only importer may fabricate one.
        path: PathBuf,
        /// In-memory contents; when absent the path is read from disk.
        contents: Option<String>,
        syntax: Option<Syntax>,
    },
    NotFound,
    Error(String),
}

/// Resolves a requested URL to a loaded source.
pub trait Importer {
    /// `url` is the text written in the `@import`/`@use`; `previous` is the
    /// path of the importing file, if it came from disk.
    fn resolve(&self, url: &str, previous: Option<&Path>) -> ImporterResult;
}

/// The default file-system importer.
pub struct FileImporter {
    include_paths: Vec<PathBuf>,
}

impl FileImporter {
    pub fn new(include_paths: Vec<PathBuf>) -> FileImporter {
        FileImporter { include_paths }
    }

    /// The candidate file names tried for a requested `name`, in order.
    fn candidates(url: &str) -> Vec<PathBuf> {
        let path = Path::new(url);
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(url)
            .to_string();

        let mut names = vec![
            format!("{}.scss", stem),
            format!("_{}.scss", stem),
            format!("{}.sass", stem),
            format!("_{}.sass", stem),
            format!("{}/index.scss", stem),
            format!("{}/_index.scss", stem),
        ];
        // A verbatim name with a recognized extension is also acceptable.
        if stem.ends_with(".scss") || stem.ends_with(".sass") || stem.ends_with(".css") {
            names.insert(0, stem);
        }
        names.into_iter().map(|n| dir.join(n)).collect()
    }

    fn try_base(&self, base: &Path, url: &str) -> Option<PathBuf> {
        for candidate in Self::candidates(url) {
            let full = base.join(&candidate);
            if full.is_file() {
                return Some(full);
            }
        }
        None
    }
}

impl Importer for FileImporter {
    fn resolve(&self, url: &str, previous: Option<&Path>) -> ImporterResult {
        if let Some(prev) = previous {
            if let Some(dir) = prev.parent() {
                if let Some(found) = self.try_base(dir, url) {
                    return resolved_file(found);
                }
            }
        }
        for base in &self.include_paths {
            if let Some(found) = self.try_base(base, url) {
                return resolved_file(found);
            }
        }
        // Relative to the working directory, as a final fallback.
        if let Some(found) = self.try_base(Path::new("."), url) {
            return resolved_file(found);
        }
        ImporterResult::NotFound
    }
}

fn resolved_file(path: PathBuf) -> ImporterResult {
    let canonical = path.canonicalize().unwrap_or(path);
    ImporterResult::Resolved {
        path: canonical,
        contents: None,
        syntax: None,
    }
}

/// Whether an `@import` URL stays in the output as plain CSS.
pub fn is_plain_css_import(url: &str) -> bool {
    url.ends_with(".css")
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with("url(")
}

/// Parsed-sheet cache plus the active import chain.
pub struct ImportCache {
    parsed: HashMap<PathBuf, Rc<Stylesheet>>,
    /// Paths currently being imported, outermost first.
    active: Vec<PathBuf>,
    included: Vec<PathBuf>,
}

impl ImportCache {
    pub fn new() -> ImportCache {
        ImportCache {
            parsed: HashMap::new(),
            active: Vec::new(),
            included: Vec::new(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<Rc<Stylesheet>> {
        self.parsed.get(path).cloned()
    }

    pub fn insert(&mut self, path: PathBuf, sheet: Rc<Stylesheet>) {
        self.parsed.insert(path, sheet);
    }

    /// Records a consulted file, once, in discovery order.
    pub fn record_included(&mut self, path: &Path) {
        if !self.included.iter().any(|p| p == path) {
            self.included.push(path.to_path_buf());
        }
    }

    pub fn included_files(&self) -> &[PathBuf] {
        &self.included
    }

    /// Pushes onto the active chain; `Err` carries the cycle trail.
    pub fn enter(&mut self, path: &Path) -> Result<(), Vec<PathBuf>> {
        if self.active.iter().any(|p| p == path) {
            let mut trail = self.active.clone();
            trail.push(path.to_path_buf());
            return Err(trail);
        }
        self.active.push(path.to_path_buf());
        Ok(())
    }

    pub fn leave(&mut self, path: &Path) {
        if self.active.last().map(Path::new) == Some(path) {
            let _ = self.active.pop();
        } else {
            self.active.retain(|p| p != path);
        }
    }
}

impl Default for ImportCache {
    fn default() -> Self {
        ImportCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_css_detection() {
        assert!(is_plain_css_import("foo.css"));
        assert!(is_plain_css_import("http://example.com/x"));
        assert!(is_plain_css_import("//cdn/x"));
        assert!(is_plain_css_import("url(foo)"));
        assert!(!is_plain_css_import("partial"));
    }

    #[test]
    fn candidate_order_prefers_scss_then_partial() {
        let c = FileImporter::candidates("mixins");
        assert_eq!(c[0], PathBuf::from("mixins.scss"));
        assert_eq!(c[1], PathBuf::from("_mixins.scss"));
        assert!(c.iter().any(|p| p.ends_with("_index.scss")));
    }

    #[test]
    fn resolves_partials_from_include_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_lib.scss"), "$x: 1;").unwrap();
        let importer = FileImporter::new(vec![dir.path().to_path_buf()]);
        match importer.resolve("lib", None) {
            ImporterResult::Resolved { path, .. } => {
                assert!(path.ends_with("_lib.scss"));
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn resolves_relative_to_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("helper.scss"), "a { b: c; }").unwrap();
        let prev = dir.path().join("main.scss");
        let importer = FileImporter::new(vec![]);
        match importer.resolve("helper", Some(&prev)) {
            ImporterResult::Resolved { path, .. } => {
                assert!(path.ends_with("helper.scss"));
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn cycle_detection_reports_trail() {
        let mut cache = ImportCache::new();
        let a = PathBuf::from("/a.scss");
        let b = PathBuf::from("/b.scss");
        cache.enter(&a).unwrap();
        cache.enter(&b).unwrap();
        let err = cache.enter(&a).unwrap_err();
        assert_eq!(err, vec![a.clone(), b, a]);
    }
}
