//! Import and module-system behavior against a real file system.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use rsass::{Compiler, Importer, ImporterResult, Options, Syntax};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn compile_in(dir: &Path, entry: &str) -> rsass::CompileResult {
    Compiler::new()
        .compile_path(dir.join(entry))
        .unwrap_or_else(|e| panic!("{}", e.formatted()))
}

#[test]
fn imports_partials_by_convention() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_partial.scss", "b { c: d; }");
    write(dir.path(), "main.scss", "@import \"partial\";\na { x: 1; }");
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "b {\n  c: d;\n}\n\na {\n  x: 1;\n}\n");
}

#[test]
fn imported_definitions_are_visible() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_vars.scss", "$size: 5px;\n@mixin pad { p: 2; }");
    write(
        dir.path(),
        "main.scss",
        "@import \"vars\";\na { w: $size; @include pad; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "a {\n  w: 5px;\n  p: 2;\n}\n");
}

#[test]
fn include_paths_are_searched_in_order() {
    let lib = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write(lib.path(), "_shared.scss", "s { t: u; }");
    write(dir.path(), "main.scss", "@import \"shared\";");
    let result = Compiler::with_options(
        Options::default().with_include_path(lib.path().to_path_buf()),
    )
    .compile_path(dir.path().join("main.scss"))
    .unwrap_or_else(|e| panic!("{}", e.formatted()));
    assert_eq!(result.css, "s {\n  t: u;\n}\n");
}

#[test]
fn included_files_are_recorded_in_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_one.scss", "@import \"two\";");
    write(dir.path(), "_two.scss", "x { y: z; }");
    write(dir.path(), "main.scss", "@import \"one\";");
    let result = compile_in(dir.path(), "main.scss");
    let names: Vec<String> = result
        .included_files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["main.scss", "_one.scss", "_two.scss"]);
}

#[test]
fn import_cycles_are_detected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_a.scss", "@import \"b\";");
    write(dir.path(), "_b.scss", "@import \"a\";");
    write(dir.path(), "main.scss", "@import \"a\";");
    let err = Compiler::new()
        .compile_path(dir.path().join("main.scss"))
        .unwrap_err();
    assert!(err.formatted().contains("circular import"), "{}", err.formatted());
}

#[test]
fn plain_css_imports_stay_in_the_output() {
    let result = Compiler::new()
        .compile_string(
            "@import \"theme.css\";\n@import url(fonts);\n@import \"print\" screen;",
            Syntax::Scss,
        )
        .unwrap();
    assert!(result.css.contains("@import \"theme.css\";"), "{}", result.css);
    assert!(result.css.contains("@import url(fonts);"), "{}", result.css);
    assert!(result.css.contains("@import \"print\" screen;"), "{}", result.css);
}

#[test]
fn missing_import_is_an_error() {
    let err = Compiler::new()
        .compile_string("@import \"nowhere-to-be-found\";", Syntax::Scss)
        .unwrap_err();
    assert!(
        err.formatted().contains("can't find stylesheet"),
        "{}",
        err.formatted()
    );
}

#[test]
fn indented_partials_convert_before_parsing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_deep.sass", "q\n  r: s\n");
    write(dir.path(), "main.scss", "@import \"deep\";");
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "q {\n  r: s;\n}\n");
}

#[test]
fn use_binds_a_namespace() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "_lib.scss",
        "$size: 10px;\n@mixin pad { p: 1; }\n@function twice($x) { @return $x * 2; }",
    );
    write(
        dir.path(),
        "main.scss",
        "@use \"lib\";\na { w: lib.$size; t: lib.twice(2); @include lib.pad; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "a {\n  w: 10px;\n  t: 4;\n  p: 1;\n}\n");
}

#[test]
fn use_evaluates_a_module_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_style.scss", ".from-module { x: 1; }");
    write(
        dir.path(),
        "main.scss",
        "@use \"style\";\n@use \"style\" as s2;\na { y: 2; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css.matches(".from-module").count(), 1, "{}", result.css);
}

#[test]
fn use_with_custom_and_star_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_lib.scss", "$n: 7;");
    write(
        dir.path(),
        "main.scss",
        "@use \"lib\" as l;\na { x: l.$n; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "a {\n  x: 7;\n}\n");

    write(
        dir.path(),
        "star.scss",
        "@use \"lib\" as *;\na { x: $n; }",
    );
    let result = compile_in(dir.path(), "star.scss");
    assert_eq!(result.css, "a {\n  x: 7;\n}\n");
}

#[test]
fn use_of_builtin_modules() {
    let result = Compiler::new()
        .compile_string(
            "@use \"sass:math\";\n@use \"sass:map\";\n$m: (a: 1);\na { x: math.floor(2.5); y: map.get($m, a); }",
            Syntax::Scss,
        )
        .unwrap();
    assert_eq!(result.css, "a {\n  x: 2;\n  y: 1;\n}\n");
}

#[test]
fn forward_reexports_members() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_inner.scss", "$v: 1;\n$hidden: 2;");
    write(
        dir.path(),
        "_outer.scss",
        "@forward \"inner\" show v;",
    );
    write(
        dir.path(),
        "main.scss",
        "@use \"outer\";\na { x: outer.$v; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "a {\n  x: 1;\n}\n");

    write(
        dir.path(),
        "bad.scss",
        "@use \"outer\";\na { x: outer.$hidden; }",
    );
    let err = Compiler::new()
        .compile_path(dir.path().join("bad.scss"))
        .unwrap_err();
    assert!(err.formatted().contains("hidden"), "{}", err.formatted());
}

#[test]
fn forward_with_prefix() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_inner.scss", "$v: 3;");
    write(dir.path(), "_outer.scss", "@forward \"inner\" as pre-*;");
    write(
        dir.path(),
        "main.scss",
        "@use \"outer\";\na { x: outer.$pre-v; }",
    );
    let result = compile_in(dir.path(), "main.scss");
    assert_eq!(result.css, "a {\n  x: 3;\n}\n");
}

/// An importer that serves sources from memory.
struct MemoryImporter;

impl Importer for MemoryImporter {
    fn resolve(&self, url: &str, _previous: Option<&Path>) -> ImporterResult {
        if url == "virtual" {
            ImporterResult::Resolved {
                path: "/virtual/from-memory.scss".into(),
                contents: Some("v { w: 1; }".to_string()),
                syntax: Some(Syntax::Scss),
            }
        } else {
            ImporterResult::NotFound
        }
    }
}

#[test]
fn custom_importers_run_before_the_file_system() {
    let result = Compiler::with_options(
        Options::default().with_importer(Rc::new(MemoryImporter)),
    )
    .compile_string("@import \"virtual\";", Syntax::Scss)
    .unwrap_or_else(|e| panic!("{}", e.formatted()));
    assert_eq!(result.css, "v {\n  w: 1;\n}\n");
}

#[test]
fn importer_errors_surface() {
    struct Failing;
    impl Importer for Failing {
        fn resolve(&self, _url: &str, _previous: Option<&Path>) -> ImporterResult {
            ImporterResult::Error("disk on fire".to_string())
        }
    }
    let err = Compiler::with_options(Options::default().with_importer(Rc::new(Failing)))
        .compile_string("@import \"whatever\";", Syntax::Scss)
        .unwrap_err();
    assert!(err.formatted().contains("disk on fire"), "{}", err.formatted());
}
