//! CSS tree lowering.
//!
//! Flattens the evaluator's nested tree to CSS's model: nested style rules
//! become siblings, `@media`/`@supports` bubble out of style rules, and
//! `@at-root` content is lifted past the wrappers its query excludes.  Also
//! runs the extension pass, removes placeholder rules, drops empty blocks,
//! and merges adjacent equal media rules.

use crate::css_tree::{CssMediaRule, CssRule, CssStmt};
use crate::error::SassResult;
use crate::media::CssMediaQuery;
use crate::selector::{check_unsatisfied, extend_selector_list, Extension};

/// The full post-evaluation pipeline.
pub fn cssize(mut stmts: Vec<CssStmt>, extensions: &[Extension]) -> SassResult<Vec<CssStmt>> {
    apply_extensions_rec(&mut stmts, extensions, None)?;
    check_unsatisfied(extensions)?;
    let flattened = flatten_root(stmts);
    let cleaned = remove_placeholders(flattened);
    Ok(merge_adjacent_media(cleaned))
}

// ---- extension ----------------------------------------------------------

fn apply_extensions_rec(
    stmts: &mut [CssStmt],
    extensions: &[Extension],
    media: Option<&[CssMediaQuery]>,
) -> SassResult<()> {
    for stmt in stmts {
        match stmt {
            CssStmt::Rule(rule) => {
                rule.selector = extend_selector_list(&rule.selector, media, extensions)?;
                apply_extensions_rec(&mut rule.body, extensions, media)?;
            }
            CssStmt::Media(rule) => {
                let queries = rule.queries.clone();
                apply_extensions_rec(&mut rule.body, extensions, Some(&queries))?;
            }
            CssStmt::Supports { body, .. }
            | CssStmt::Keyframes { body, .. }
            | CssStmt::KeyframeBlock { body, .. }
            | CssStmt::AtRoot { body, .. } => {
                apply_extensions_rec(body, extensions, media)?;
            }
            CssStmt::UnknownAt {
                body: Some(body), ..
            } => {
                apply_extensions_rec(body, extensions, media)?;
            }
            _ => {}
        }
    }
    Ok(())
}

// ---- flattening ---------------------------------------------------------

fn flatten_root(stmts: Vec<CssStmt>) -> Vec<CssStmt> {
    let mut out = Vec::new();
    for stmt in stmts {
        match stmt {
            CssStmt::Rule(rule) => out.extend(flatten_rule(rule)),
            CssStmt::Media(mut media) => {
                let mut escaped = Vec::new();
                extract_media_escapes(&mut media.body, &mut escaped);
                media.body = flatten_media_body(media.body);
                out.extend(lift_nested_media(media));
                out.extend(escaped);
            }
            CssStmt::Supports {
                condition,
                body,
                span,
            } => out.push(CssStmt::Supports {
                condition,
                body: flatten_root(body),
                span,
            }),
            CssStmt::Keyframes {
                name,
                prelude,
                body,
                span,
            } => out.push(CssStmt::Keyframes {
                name,
                prelude,
                body,
                span,
            }),
            CssStmt::UnknownAt {
                name,
                prelude,
                body,
                span,
            } => out.push(CssStmt::UnknownAt {
                name,
                prelude,
                body: body.map(flatten_root),
                span,
            }),
            CssStmt::AtRoot { body, .. } => out.extend(flatten_root(body)),
            other => out.push(other),
        }
    }
    out
}

/// Flattens one style rule: declarations stay, nested structures hoist.
fn flatten_rule(rule: CssRule) -> Vec<CssStmt> {
    let CssRule {
        selector,
        body,
        span,
        depth,
    } = rule;

    let mut decls = Vec::new();
    let mut hoisted = Vec::new();
    for child in body {
        match child {
            CssStmt::Decl(_) | CssStmt::Comment { .. } => decls.push(child),
            CssStmt::UnknownAt { body: None, .. } => decls.push(child),
            CssStmt::Rule(inner) => hoisted.extend(flatten_rule(inner)),
            CssStmt::Media(mut media) => {
                // Bubble outward, reproducing the style rule inside.
                let mut escaped = Vec::new();
                extract_media_escapes(&mut media.body, &mut escaped);
                let inner_rule = CssRule {
                    selector: selector.clone(),
                    body: media.body,
                    span,
                    depth: depth + 1,
                };
                media.body = flatten_rule(inner_rule);
                hoisted.extend(lift_nested_media(media));
                hoisted.extend(escaped);
            }
            CssStmt::Supports {
                condition,
                body,
                span: supports_span,
            } => {
                let inner_rule = CssRule {
                    selector: selector.clone(),
                    body,
                    span,
                    depth: depth + 1,
                };
                hoisted.push(CssStmt::Supports {
                    condition,
                    body: flatten_rule(inner_rule),
                    span: supports_span,
                });
            }
            CssStmt::UnknownAt {
                name,
                prelude,
                body: Some(body),
                span: at_span,
            } => {
                let inner_rule = CssRule {
                    selector: selector.clone(),
                    body,
                    span,
                    depth: depth + 1,
                };
                hoisted.push(CssStmt::UnknownAt {
                    name,
                    prelude,
                    body: Some(flatten_rule(inner_rule)),
                    span: at_span,
                });
            }
            CssStmt::Keyframes {
                name,
                prelude,
                body,
                span: kf_span,
            } => hoisted.push(CssStmt::Keyframes {
                name,
                prelude,
                body,
                span: kf_span,
            }),
            CssStmt::AtRoot { body, .. } => {
                // The body was evaluated without the rule context already.
                hoisted.extend(flatten_root(body));
            }
            CssStmt::Import { .. } => hoisted.push(child),
            CssStmt::KeyframeBlock { .. } => decls.push(child),
        }
    }

    let mut out = Vec::new();
    out.push(CssStmt::Rule(CssRule {
        selector,
        body: decls,
        span,
        depth,
    }));
    out.extend(hoisted);
    out
}

/// The body of a media rule: style rules flatten among themselves.
fn flatten_media_body(body: Vec<CssStmt>) -> Vec<CssStmt> {
    flatten_root(body)
}

/// Nested media rules already carry their fully merged queries, so they
/// move up beside their parent instead of nesting inside it.
fn lift_nested_media(mut media: CssMediaRule) -> Vec<CssStmt> {
    let (nested, rest): (Vec<CssStmt>, Vec<CssStmt>) = media
        .body
        .drain(..)
        .partition(|child| matches!(child, CssStmt::Media(_)));
    media.body = rest;

    let mut out = Vec::new();
    if !media.body.is_empty() {
        out.push(CssStmt::Media(media));
    }
    out.extend(nested);
    out
}

/// Pulls `@at-root` bodies whose query excludes `media` out through the
/// enclosing media rule.
fn extract_media_escapes(stmts: &mut Vec<CssStmt>, escaped: &mut Vec<CssStmt>) {
    let mut i = 0;
    while i < stmts.len() {
        let escape = match &stmts[i] {
            CssStmt::AtRoot { query, .. } => query.excludes_media(),
            _ => false,
        };
        if escape {
            if let CssStmt::AtRoot { body, .. } = stmts.remove(i) {
                escaped.extend(flatten_root(body));
            }
            continue;
        }
        match &mut stmts[i] {
            CssStmt::Rule(rule) => extract_media_escapes(&mut rule.body, escaped),
            CssStmt::Media(media) => extract_media_escapes(&mut media.body, escaped),
            CssStmt::Supports { body, .. } => extract_media_escapes(body, escaped),
            _ => {}
        }
        i += 1;
    }
}

// ---- placeholder removal and cleanup ------------------------------------

fn remove_placeholders(stmts: Vec<CssStmt>) -> Vec<CssStmt> {
    let mut out = Vec::new();
    for stmt in stmts {
        match stmt {
            CssStmt::Rule(mut rule) => {
                rule.selector = rule.selector.without_placeholders();
                if rule.selector.is_empty() {
                    continue;
                }
                if rule.body.is_empty() {
                    continue;
                }
                out.push(CssStmt::Rule(rule));
            }
            CssStmt::Media(mut media) => {
                media.body = remove_placeholders(media.body);
                if media.body.is_empty() {
                    continue;
                }
                out.push(CssStmt::Media(media));
            }
            CssStmt::Supports {
                condition,
                body,
                span,
            } => {
                let body = remove_placeholders(body);
                if body.is_empty() {
                    continue;
                }
                out.push(CssStmt::Supports {
                    condition,
                    body,
                    span,
                });
            }
            CssStmt::Keyframes {
                name,
                prelude,
                body,
                span,
            } => {
                let body = remove_placeholders(body);
                out.push(CssStmt::Keyframes {
                    name,
                    prelude,
                    body,
                    span,
                });
            }
            CssStmt::KeyframeBlock { selector, body, span } => {
                out.push(CssStmt::KeyframeBlock { selector, body, span });
            }
            CssStmt::UnknownAt {
                name,
                prelude,
                body,
                span,
            } => out.push(CssStmt::UnknownAt {
                name,
                prelude,
                body: body.map(remove_placeholders),
                span,
            }),
            other => out.push(other),
        }
    }
    out
}

// ---- media merging ------------------------------------------------------

fn merge_adjacent_media(stmts: Vec<CssStmt>) -> Vec<CssStmt> {
    let mut out: Vec<CssStmt> = Vec::new();
    for stmt in stmts {
        match (&stmt, out.last_mut()) {
            (CssStmt::Media(media), Some(CssStmt::Media(previous)))
                if previous.queries == media.queries =>
            {
                previous.body.extend(media.body.iter().cloned());
            }
            _ => out.push(stmt),
        }
    }
    out
}

