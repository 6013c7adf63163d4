//! End-to-end compilation tests for the core language.

use rsass::{Compiler, Syntax};

fn compile(source: &str) -> String {
    Compiler::new()
        .compile_string(source, Syntax::Scss)
        .unwrap_or_else(|e| panic!("{}", e.formatted()))
        .css
}

fn compile_err(source: &str) -> String {
    match Compiler::new().compile_string(source, Syntax::Scss) {
        Ok(result) => panic!("expected an error, got:\n{}", result.css),
        Err(e) => e.formatted().to_string(),
    }
}

#[test]
fn basic_nesting() {
    assert_eq!(compile("a { b { color: red; } }"), "a b {\n  color: red;\n}\n");
}

#[test]
fn parent_reference() {
    assert_eq!(compile(".a { &.b { x: 1; } }"), ".a.b {\n  x: 1;\n}\n");
}

#[test]
fn parent_suffix() {
    assert_eq!(
        compile(".block { &-elem { x: 1; } }"),
        ".block-elem {\n  x: 1;\n}\n"
    );
}

#[test]
fn nesting_distributes_over_lists() {
    assert_eq!(compile("a, b { c { x: 1; } }"), "a c, b c {\n  x: 1;\n}\n");
}

#[test]
fn unit_arithmetic() {
    assert_eq!(compile("x { a: (10px * 2) / 4; }"), "x {\n  a: 5px;\n}\n");
}

#[test]
fn slash_shorthand_is_preserved() {
    assert_eq!(
        compile("a { font: 12px/30px serif; }"),
        "a {\n  font: 12px/30px serif;\n}\n"
    );
}

#[test]
fn variables_force_division() {
    assert_eq!(compile("$w: 100px; a { x: $w / 4; }"), "a {\n  x: 25px;\n}\n");
}

#[test]
fn parens_force_division() {
    assert_eq!(compile("a { x: (12/4); }"), "a {\n  x: 3;\n}\n");
}

#[test]
fn unit_conversion_in_addition() {
    assert_eq!(compile("a { w: 1in + 6pt; }"), "a {\n  w: 1.0833333333in;\n}\n");
}

#[test]
fn each_with_map_destructuring() {
    assert_eq!(
        compile("@each $k, $v in (a:1, b:2) { .#{$k} { v: $v; } }"),
        ".a {\n  v: 1;\n}\n\n.b {\n  v: 2;\n}\n"
    );
}

#[test]
fn each_over_list() {
    assert_eq!(
        compile("@each $s in 1px 2px { .m#{$s} { margin: $s; } }"),
        ".m1px {\n  margin: 1px;\n}\n\n.m2px {\n  margin: 2px;\n}\n"
    );
}

#[test]
fn media_bubbles_out_of_rules() {
    assert_eq!(
        compile("a { @media print { color: red; } }"),
        "@media print {\n  a {\n    color: red;\n  }\n}\n"
    );
}

#[test]
fn nested_media_merges_queries() {
    let css = compile("@media screen { a { @media (min-width: 100px) { x: 1; } } }");
    assert!(
        css.contains("@media screen and (min-width: 100px)"),
        "{}",
        css
    );
    // The merged query appears exactly once, at the top level.
    assert_eq!(css.matches("@media").count(), 1, "{}", css);
}

#[test]
fn incompatible_nested_media_emits_nothing() {
    assert_eq!(compile("@media screen { @media print { a { x: 1; } } }"), "");
}

#[test]
fn mixins_bind_arguments() {
    assert_eq!(
        compile("@mixin m($a, $b: 2px) { x: $a; y: $b; } c { @include m(1px); }"),
        "c {\n  x: 1px;\n  y: 2px;\n}\n"
    );
}

#[test]
fn mixin_defaults_see_earlier_parameters() {
    assert_eq!(
        compile("@mixin m($a, $b: $a * 2) { y: $b; } c { @include m(3px); }"),
        "c {\n  y: 6px;\n}\n"
    );
}

#[test]
fn mixin_keyword_arguments() {
    assert_eq!(
        compile("@mixin m($a: 1, $b: 2) { x: $a $b; } c { @include m($b: 9); }"),
        "c {\n  x: 1 9;\n}\n"
    );
}

#[test]
fn rest_arguments_become_arglists() {
    assert_eq!(
        compile("@mixin m($args...) { n: length($args); } c { @include m(1, 2, 3); }"),
        "c {\n  n: 3;\n}\n"
    );
}

#[test]
fn spread_arguments_at_call_site() {
    assert_eq!(
        compile("@mixin m($a, $b) { x: $a + $b; } $pair: 1 2; c { @include m($pair...); }"),
        "c {\n  x: 3;\n}\n"
    );
}

#[test]
fn unknown_keyword_argument_is_an_error() {
    let err = compile_err("@mixin m($a) { x: $a; } c { @include m(1, $nope: 2); }");
    assert!(err.contains("no parameter named $nope"), "{}", err);
}

#[test]
fn missing_argument_is_an_error() {
    let err = compile_err("@mixin m($a) { x: $a; } c { @include m; }");
    assert!(err.contains("missing argument $a"), "{}", err);
}

#[test]
fn functions_return_values() {
    assert_eq!(
        compile("@function double($x) { @return $x * 2; } a { w: double(4); }"),
        "a {\n  w: 8;\n}\n"
    );
}

#[test]
fn function_without_return_is_an_error() {
    let err = compile_err("@function f() { $x: 1; } a { w: f(); }");
    assert!(err.contains("without @return"), "{}", err);
}

#[test]
fn content_blocks() {
    assert_eq!(
        compile("@mixin wrap { .w { @content; } } @include wrap { y: 2; }"),
        ".w {\n  y: 2;\n}\n"
    );
}

#[test]
fn content_with_arguments() {
    assert_eq!(
        compile(
            "@mixin each-side { @content(left); @content(right); }\n\
             a { @include each-side using ($side) { m-#{$side}: 0; } }"
        ),
        "a {\n  m-left: 0;\n  m-right: 0;\n}\n"
    );
}

#[test]
fn content_outside_mixin_is_an_error() {
    let err = compile_err("a { @content; }");
    assert!(err.contains("@content"), "{}", err);
}

#[test]
fn if_else_chains() {
    assert_eq!(
        compile("@if 1 > 2 { a { x: 1; } } @else if 2 > 3 { b { x: 2; } } @else { c { x: 3; } }"),
        "c {\n  x: 3;\n}\n"
    );
}

#[test]
fn truthiness_of_zero_and_empty_string() {
    assert_eq!(
        compile("@if 0 { a { x: zero-is-true; } } @if \"\" { b { y: empty-is-true; } }"),
        "a {\n  x: zero-is-true;\n}\n\nb {\n  y: empty-is-true;\n}\n"
    );
}

#[test]
fn for_through_is_inclusive() {
    assert_eq!(
        compile("@for $i from 1 through 3 { .c#{$i} { n: $i; } }"),
        ".c1 {\n  n: 1;\n}\n\n.c2 {\n  n: 2;\n}\n\n.c3 {\n  n: 3;\n}\n"
    );
}

#[test]
fn for_to_is_exclusive() {
    assert_eq!(compile("@for $i from 1 to 1 { .c#{$i} { n: $i; } }"), "");
    assert_eq!(
        compile("@for $i from 1 through 1 { .c#{$i} { n: $i; } }"),
        ".c1 {\n  n: 1;\n}\n"
    );
}

#[test]
fn while_loops() {
    assert_eq!(
        compile("$i: 1; @while $i < 3 { .w#{$i} { n: $i; } $i: $i + 1; }"),
        ".w1 {\n  n: 1;\n}\n\n.w2 {\n  n: 2;\n}\n"
    );
}

#[test]
fn default_assignment_only_fills_unset() {
    assert_eq!(
        compile("$a: 1; $a: 2 !default; b { c: $a; }"),
        "b {\n  c: 1;\n}\n"
    );
    assert_eq!(compile("$a: 2 !default; b { c: $a; }"), "b {\n  c: 2;\n}\n");
}

#[test]
fn global_assignment_from_inner_scope() {
    assert_eq!(
        compile("$a: 1; @mixin m { $a: 9 !global; } @include m; b { c: $a; }"),
        "b {\n  c: 9;\n}\n"
    );
}

#[test]
fn undefined_variable_is_an_error() {
    let err = compile_err("a { x: $missing; }");
    assert!(err.contains("undefined variable"), "{}", err);
}

#[test]
fn interpolation_in_names_and_selectors() {
    assert_eq!(
        compile("$side: top; .sel { margin-#{$side}: 1px; }"),
        ".sel {\n  margin-top: 1px;\n}\n"
    );
}

#[test]
fn interpolation_unquotes_strings() {
    assert_eq!(
        compile("$n: \"quoted\"; a { x: \"#{$n}-next\"; }"),
        "a {\n  x: \"quoted-next\";\n}\n"
    );
}

#[test]
fn string_concatenation_keeps_lhs_quoting() {
    assert_eq!(compile("a { x: \"ab\" + cd; }"), "a {\n  x: \"abcd\";\n}\n");
    assert_eq!(compile("a { x: ab + \"cd\"; }"), "a {\n  x: abcd;\n}\n");
}

#[test]
fn null_declarations_are_dropped() {
    assert_eq!(compile("a { x: null; y: 1; }"), "a {\n  y: 1;\n}\n");
}

#[test]
fn and_or_short_circuit() {
    assert_eq!(
        compile("a { x: false and unbound-is-fine; y: 1 or 2; }"),
        "a {\n  x: false;\n  y: 1;\n}\n"
    );
}

#[test]
fn comparisons_and_equality() {
    assert_eq!(
        compile("a { x: 1in == 96px; y: 2 != 2; z: 10pt >= 9pt; }"),
        "a {\n  x: true;\n  y: false;\n  z: true;\n}\n"
    );
}

#[test]
fn at_root_escapes_nesting() {
    assert_eq!(
        compile(".p { @at-root .r { x: 1; } }"),
        ".r {\n  x: 1;\n}\n"
    );
}

#[test]
fn at_root_without_media() {
    // `(without: media)` escapes the media context but keeps rule nesting.
    let css = compile("@media screen { .p { @at-root (without: media) { .r { x: 1; } } } }");
    assert!(css.contains(".p .r {\n  x: 1;\n}"), "{}", css);
    assert!(!css.contains("@media"), "{}", css);
}

#[test]
fn keyframes_blocks_keep_selectors() {
    let css = compile("@keyframes spin { from { opacity: 0; } 50% { opacity: 1; } }");
    assert!(css.starts_with("@keyframes spin {"), "{}", css);
    assert!(css.contains("from {"), "{}", css);
    assert!(css.contains("50% {"), "{}", css);
}

#[test]
fn unknown_at_rules_pass_through() {
    let css = compile("@font-face { font-family: x; } a { x: 1; }");
    assert!(css.contains("@font-face {\n  font-family: x;\n}"), "{}", css);
}

#[test]
fn supports_rules_bubble() {
    let css = compile("a { @supports (display: grid) { x: 1; } }");
    assert_eq!(
        css,
        "@supports (display: grid) {\n  a {\n    x: 1;\n  }\n}\n"
    );
}

#[test]
fn custom_properties_keep_raw_text() {
    assert_eq!(compile("a { --x: { raw }; }"), "a {\n  --x: { raw };\n}\n");
}

#[test]
fn nested_properties_expand() {
    assert_eq!(
        compile("a { font: { family: serif; size: 10px; } }"),
        "a {\n  font-family: serif;\n  font-size: 10px;\n}\n"
    );
}

#[test]
fn important_flag_survives() {
    assert_eq!(compile("a { x: 1 !important; }"), "a {\n  x: 1 !important;\n}\n");
}

#[test]
fn loud_comments_survive_silent_do_not() {
    let css = compile("/* keep #{1 + 1} */\n// drop\na { x: 1; }");
    assert!(css.starts_with("/* keep 2 */"), "{}", css);
    assert!(!css.contains("drop"), "{}", css);
}

#[test]
fn pseudo_selector_vs_declaration_ambiguity() {
    assert_eq!(
        compile("a { x:hover { y: 1; } }"),
        "a x:hover {\n  y: 1;\n}\n"
    );
    assert_eq!(compile("a { x:hover; }"), "a {\n  x: hover;\n}\n");
}

#[test]
fn builtin_list_functions() {
    assert_eq!(
        compile("a { x: nth(10px 20px 30px, 2); y: length((a, b)); z: index(i j k, j); }"),
        "a {\n  x: 20px;\n  y: 2;\n  z: 2;\n}\n"
    );
}

#[test]
fn builtin_map_functions() {
    assert_eq!(
        compile("$m: (a: 1, b: 2); a { x: map-get($m, b); y: map-has-key($m, c); }"),
        "a {\n  x: 2;\n  y: false;\n}\n"
    );
}

#[test]
fn builtin_string_functions() {
    assert_eq!(
        compile("a { x: to-upper-case(\"abc\"); y: str-length(\"abcd\"); z: str-index(\"abc\", \"b\"); }"),
        "a {\n  x: \"ABC\";\n  y: 4;\n  z: 2;\n}\n"
    );
}

#[test]
fn builtin_math_functions() {
    assert_eq!(
        compile("a { x: abs(-3px); y: round(2.5); z: max(1px, 2px, 3px); w: percentage(0.25); }"),
        "a {\n  x: 3px;\n  y: 3;\n  z: 3px;\n  w: 25%;\n}\n"
    );
}

#[test]
fn builtin_color_functions() {
    assert_eq!(
        compile("a { x: mix(#000, #fff); y: red(#102030); z: invert(#102030); }"),
        "a {\n  x: #808080;\n  y: 16;\n  z: #efdfcf;\n}\n"
    );
}

#[test]
fn builtin_meta_functions() {
    assert_eq!(
        compile("a { x: type-of(1px); y: unit(1px); z: unitless(3); w: comparable(1px, 1in); }"),
        "a {\n  x: number;\n  y: \"px\";\n  z: true;\n  w: true;\n}\n"
    );
}

#[test]
fn if_function_is_lazy() {
    // The untaken branch would raise, but is never evaluated.
    assert_eq!(
        compile("a { x: if(true, ok, $missing); }"),
        "a {\n  x: ok;\n}\n"
    );
}

#[test]
fn call_and_get_function() {
    assert_eq!(
        compile("@function add($a, $b) { @return $a + $b; } a { x: call(get-function(\"add\"), 1, 2); }"),
        "a {\n  x: 3;\n}\n"
    );
}

#[test]
fn user_error_aborts_with_message() {
    let err = compile_err("@error \"boom: #{1 + 1}\";");
    assert!(err.contains("boom: 2"), "{}", err);
}

#[test]
fn warnings_do_not_abort() {
    let result = Compiler::new()
        .compile_string("@warn \"careful\"; a { x: 1; }", Syntax::Scss)
        .unwrap();
    assert_eq!(result.css, "a {\n  x: 1;\n}\n");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].message, "careful");
}

#[test]
fn top_level_parent_is_an_error() {
    let err = compile_err("&.a { x: 1; }");
    assert!(err.contains("&"), "{}", err);
}

#[test]
fn recursion_limit_is_enforced() {
    let err = compile_err("@function f($n) { @return f($n + 1); } a { x: f(0); }");
    assert!(err.contains("recursion"), "{}", err);
}

#[test]
fn division_by_zero_yields_infinity() {
    assert_eq!(compile("a { x: (1 / 0); }"), "a {\n  x: Infinity;\n}\n");
    assert_eq!(compile("a { x: (-1 / 0); }"), "a {\n  x: -Infinity;\n}\n");
}

#[test]
fn indented_syntax_compiles() {
    let result = Compiler::new()
        .compile_string("a\n  b\n    color: red\n", Syntax::Sass)
        .unwrap();
    assert_eq!(result.css, "a b {\n  color: red;\n}\n");
}

#[test]
fn indented_mixin_shorthands() {
    let result = Compiler::new()
        .compile_string("=big\n  size: 10px\na\n  +big\n", Syntax::Sass)
        .unwrap();
    assert_eq!(result.css, "a {\n  size: 10px;\n}\n");
}

#[test]
fn random_is_reproducible_with_a_seed() {
    let options = || {
        rsass::Options::default().with_random_seed(42)
    };
    let first = Compiler::with_options(options())
        .compile_string("a { x: random(100); y: random(); }", Syntax::Scss)
        .unwrap();
    let second = Compiler::with_options(options())
        .compile_string("a { x: random(100); y: random(); }", Syntax::Scss)
        .unwrap();
    assert_eq!(first.css, second.css);
}

#[test]
fn parent_selector_in_expressions() {
    assert_eq!(
        compile(".a .b { content: \"#{&}\"; }"),
        ".a .b {\n  content: \".a .b\";\n}\n"
    );
}
