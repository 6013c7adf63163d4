//! Output styles, precision, and source maps.

use rsass::{Compiler, Options, OutputStyle, SourceMapMode, Syntax};

fn compile_with(options: Options, source: &str) -> rsass::CompileResult {
    Compiler::with_options(options)
        .compile_string(source, Syntax::Scss)
        .unwrap_or_else(|e| panic!("{}", e.formatted()))
}

fn styled(style: OutputStyle, source: &str) -> String {
    compile_with(Options::default().with_style(style), source).css
}

#[test]
fn expanded_is_the_reference_layout() {
    assert_eq!(
        styled(OutputStyle::Expanded, "a { x: 1; y: 2; }"),
        "a {\n  x: 1;\n  y: 2;\n}\n"
    );
}

#[test]
fn compact_keeps_rules_on_one_line() {
    assert_eq!(
        styled(OutputStyle::Compact, "a { x: 1; y: 2; } b { z: 3; }"),
        "a { x: 1; y: 2; }\nb { z: 3; }\n"
    );
}

#[test]
fn compressed_strips_whitespace() {
    assert_eq!(
        styled(OutputStyle::Compressed, "a { x: 1px; } b, c { y: 2; }"),
        "a{x:1px}b,c{y:2}"
    );
}

#[test]
fn compressed_shortens_colors() {
    assert_eq!(
        styled(
            OutputStyle::Compressed,
            "a { c: #ff0000; d: #112233; e: #102035; }"
        ),
        "a{c:red;d:#123;e:#102035}"
    );
}

#[test]
fn compressed_drops_leading_zeros() {
    assert_eq!(
        styled(OutputStyle::Compressed, "a { m: 0.5px; }"),
        "a{m:.5px}"
    );
}

#[test]
fn compressed_has_no_trailing_newline() {
    let css = styled(OutputStyle::Compressed, "a { x: 1; }");
    assert!(!css.ends_with('\n'), "{:?}", css);
    let css = styled(OutputStyle::Expanded, "a { x: 1; }");
    assert!(css.ends_with('\n'), "{:?}", css);
}

#[test]
fn compressed_keeps_bang_comments_only() {
    let css = styled(
        OutputStyle::Compressed,
        "/*! legal */ /* chatty */ a { x: 1; }",
    );
    assert!(css.contains("/*! legal */"), "{}", css);
    assert!(!css.contains("chatty"), "{}", css);
}

#[test]
fn nested_indents_by_source_nesting() {
    assert_eq!(
        styled(OutputStyle::Nested, "a { x: 1; b { y: 2; } }"),
        "a {\n  x: 1; }\n\n  a b {\n    y: 2; }\n"
    );
}

#[test]
fn precision_bounds_number_output() {
    let css = compile_with(
        Options::default().with_precision(3),
        "a { x: (1 / 3); }",
    )
    .css;
    assert_eq!(css, "a {\n  x: 0.333;\n}\n");
}

#[test]
fn invalid_css_units_error_in_expanded() {
    let err = Compiler::new()
        .compile_string("a { x: 1px * 1em; }", Syntax::Scss)
        .unwrap_err();
    assert!(err.formatted().contains("isn't a valid CSS value"), "{}", err.formatted());
}

#[test]
fn quote_choice_avoids_escaping() {
    assert_eq!(
        styled(OutputStyle::Expanded, "a { x: \"say \\\"hi\\\"\"; }"),
        "a {\n  x: 'say \"hi\"';\n}\n"
    );
}

#[test]
fn non_ascii_output_gets_a_charset() {
    let css = styled(OutputStyle::Expanded, "a { content: \"déjà\"; }");
    assert!(css.starts_with("@charset \"UTF-8\";\n"), "{}", css);
}

#[test]
fn source_map_file_mode_adds_a_footer() {
    let result = compile_with(
        Options::default().with_source_map(SourceMapMode::File {
            url: "out.css.map".to_string(),
        }),
        "a { x: 1; }",
    );
    assert!(
        result.css.contains("/*# sourceMappingURL=out.css.map */"),
        "{}",
        result.css
    );
    let map: serde_json::Value = serde_json::from_str(result.source_map.as_deref().unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["sources"][0], "stdin");
    assert!(map["mappings"].as_str().unwrap().contains(';'));
}

#[test]
fn source_map_embed_json_mode_inlines_the_map() {
    let result = compile_with(
        Options::default().with_source_map(SourceMapMode::EmbedJson),
        "a { x: 1; }",
    );
    assert!(
        result
            .css
            .contains("sourceMappingURL=data:application/json;base64,"),
        "{}",
        result.css
    );
}

#[test]
fn source_map_can_embed_contents() {
    let mut options = Options::default().with_source_map(SourceMapMode::EmbedJson);
    options.embed_contents = true;
    let result = compile_with(options, "a { x: 1; }");
    let map: serde_json::Value = serde_json::from_str(result.source_map.as_deref().unwrap()).unwrap();
    assert_eq!(map["sourcesContent"][0], "a { x: 1; }");
}

#[test]
fn mappings_point_at_the_rule_and_declarations() {
    let result = compile_with(
        Options::default().with_source_map(SourceMapMode::EmbedJson),
        "a {\n  x: 1;\n}\n",
    );
    let map: serde_json::Value = serde_json::from_str(result.source_map.as_deref().unwrap()).unwrap();
    let mappings = map["mappings"].as_str().unwrap();
    // At least one segment per output line (rule line and declaration line).
    assert!(!mappings.is_empty());
    assert!(mappings.split(';').count() >= 2, "{}", mappings);
}
