//! `@extend` behavior, end to end.

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
fn extend_unions_selectors() {
    assert_eq!(
        compile(".a { x: 1; } .b { @extend .a; }"),
        ".a, .b {\n  x: 1;\n}\n"
    );
}

#[test]
fn extend_inside_complex_selectors() {
    assert_eq!(
        compile(".nav .item { x: 1; } .active { @extend .item; }"),
        ".nav .item, .nav .active {\n  x: 1;\n}\n"
    );
}

#[test]
fn extend_keeps_remaining_simples() {
    assert_eq!(
        compile(".a.c { x: 1; } .b { @extend .a; }"),
        ".a.c, .c.b {\n  x: 1;\n}\n"
    );
}

#[test]
fn placeholders_extend_but_never_emit() {
    assert_eq!(
        compile("%base { x: 1; } .real { @extend %base; }"),
        ".real {\n  x: 1;\n}\n"
    );
}

#[test]
fn unused_placeholder_emits_nothing() {
    assert_eq!(compile("%unused { x: 1; }"), "");
}

#[test]
fn extending_a_placeholder_is_a_no_op_for_other_rules() {
    // Adding an unused placeholder rule changes nothing.
    let plain = compile(".a { x: 1; }");
    let with_placeholder = compile(".a { x: 1; } %x { }");
    assert_eq!(plain, with_placeholder);
}

#[test]
fn extend_is_transitive() {
    let css = compile(".a { x: 1; } .b { @extend .a; } .c { @extend .b; }");
    assert!(css.starts_with(".a, .b, .c {"), "{}", css);
}

#[test]
fn extenders_with_ancestors_weave() {
    let css = compile(".x .a { v: 1; } .y .b { @extend .a; }");
    assert!(css.contains(".x .a"), "{}", css);
    assert!(css.contains(".x .y .b"), "{}", css);
    assert!(css.contains(".y .x .b"), "{}", css);
}

#[test]
fn shared_ancestors_are_not_duplicated() {
    assert_eq!(
        compile(".p .a { v: 1; } .p .b { @extend .a; }"),
        ".p .a, .p .b {\n  v: 1;\n}\n"
    );
}

#[test]
fn unsatisfied_extend_is_an_error() {
    let err = compile_err(".b { @extend .missing; }");
    assert!(err.contains(".missing"), "{}", err);
}

#[test]
fn optional_extend_may_be_unsatisfied() {
    assert_eq!(
        compile(".b { @extend .missing !optional; x: 1; }"),
        ".b {\n  x: 1;\n}\n"
    );
}

#[test]
fn extend_across_media_is_an_error() {
    let err = compile_err(".a { x: 1; } @media print { .b { @extend .a; } }");
    assert!(err.contains("media"), "{}", err);
}

#[test]
fn extend_within_matching_media_works() {
    let css = compile("@media print { .a { x: 1; } .b { @extend .a; } }");
    assert!(css.contains(".a, .b {"), "{}", css);
}

#[test]
fn extend_compound_targets() {
    assert_eq!(
        compile(".a.b { x: 1; } .c { @extend .a.b; }"),
        ".a.b, .c {\n  x: 1;\n}\n"
    );
}

#[test]
fn extend_multiple_targets_in_one_rule() {
    let css = compile(".a { x: 1; } .b { y: 2; } .c { @extend .a; @extend .b; }");
    assert!(css.contains(".a, .c {"), "{}", css);
    assert!(css.contains(".b, .c {"), "{}", css);
}

#[test]
fn extend_distributes_over_extender_lists() {
    let css = compile(".a { x: 1; } .b, .c { @extend .a; }");
    assert!(css.starts_with(".a, .b, .c {"), "{}", css);
}

#[test]
fn extended_pseudo_arguments_rewrite_in_place() {
    let css = compile(":not(.a) { x: 1; } .b { @extend .a; }");
    assert!(css.starts_with(":not(.a, .b) {"), "{}", css);
}

#[test]
fn extend_respects_child_combinators() {
    let css = compile(".x > .a { v: 1; } .b { @extend .a; }");
    assert!(css.contains(".x > .a"), "{}", css);
    assert!(css.contains(".x > .b"), "{}", css);
}
