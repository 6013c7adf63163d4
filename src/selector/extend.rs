//! `@extend` resolution.
//!
//! Every `@extend T` inside a rule with resolved selector `S` registers one
//! [`Extension`] per complex selector of `S`.  After evaluation, every style
//! rule's selector list is rewritten: each compound containing a target is
//! replaced by the union of itself and the extenders' weave-produced
//! alternatives, iterated to a fixed point, then trimmed of redundant
//! superselectors.

use std::cell::Cell;

use codemap::Span;
use itertools::Itertools;

use crate::error::{ErrorKind, SassError, SassResult};
use crate::limits::MAX_TRIM_SELECTORS;
use crate::media::CssMediaQuery;

use super::superselector::complex_is_superselector;
use super::unify::{unify_complex, unify_compound};
use super::weave::paths;
use super::{
    ComplexComponent, ComplexSelector, CompoundSelector, PseudoSelector, SelectorList,
    SimpleSelector,
};

/// One registered `@extend`.
#[derive(Debug)]
pub struct Extension {
    /// The simple selector sequence being extended.
    pub target: CompoundSelector,
    /// One complex selector of the extending rule.
    pub extender: ComplexSelector,
    pub span: Span,
    pub optional: bool,
    /// The media context the `@extend` appeared in.
    pub media_context: Option<Vec<CssMediaQuery>>,
    /// Whether any rule's selector matched the target.
    matched: Cell<bool>,
}

impl Extension {
    pub fn new(
        target: CompoundSelector,
        extender: ComplexSelector,
        span: Span,
        optional: bool,
        media_context: Option<Vec<CssMediaQuery>>,
    ) -> Extension {
        Extension {
            target,
            extender,
            span,
            optional,
            media_context,
            matched: Cell::new(false),
        }
    }

    fn single_target(&self) -> Option<&SimpleSelector> {
        if self.target.components.len() == 1 {
            Some(&self.target.components[0])
        } else {
            None
        }
    }
}

/// A selector produced during extension, with the bookkeeping `trim` needs.
#[derive(Debug, Clone)]
struct ExtendedSelector {
    complex: ComplexSelector,
    /// The maximum specificity among the sources that produced it.
    source_specificity: i32,
    /// Whether it appeared verbatim in the input.
    original: bool,
}

/// Rewrites one selector list under the given extensions.
///
/// `media_context` is the list's enclosing media queries; extending across
/// incompatible contexts is an error.
pub fn extend_selector_list(
    list: &SelectorList,
    media_context: Option<&[CssMediaQuery]>,
    extensions: &[Extension],
) -> SassResult<SelectorList> {
    if extensions.is_empty() {
        return Ok(list.clone());
    }

    let mut entries: Vec<ExtendedSelector> = Vec::new();
    for complex in &list.components {
        let specificity = complex.max_specificity();
        match extend_complex(complex, media_context, extensions)? {
            None => entries.push(ExtendedSelector {
                complex: complex.clone(),
                source_specificity: specificity,
                original: true,
            }),
            Some(extended) => {
                for (i, (result, source_specificity)) in extended.into_iter().enumerate() {
                    let original = i == 0 && result == *complex;
                    entries.push(ExtendedSelector {
                        complex: result,
                        source_specificity: if original {
                            specificity
                        } else {
                            source_specificity
                        },
                        original,
                    });
                }
            }
        }
    }

    // Iterate to a fixed point: an extender may itself match a target.
    let mut rounds = 0;
    loop {
        rounds += 1;
        if rounds > 16 {
            break;
        }
        let mut changed = false;
        let mut next: Vec<ExtendedSelector> = Vec::new();
        for entry in &entries {
            if entry.original {
                next.push(entry.clone());
                continue;
            }
            match extend_complex(&entry.complex, media_context, extensions)? {
                None => next.push(entry.clone()),
                Some(extended) => {
                    for (result, source_specificity) in extended {
                        if result == entry.complex {
                            next.push(entry.clone());
                        } else {
                            changed = true;
                            next.push(ExtendedSelector {
                                complex: result,
                                source_specificity: source_specificity
                                    .max(entry.source_specificity),
                                original: false,
                            });
                        }
                    }
                }
            }
        }
        let deduped: Vec<ExtendedSelector> = next
            .into_iter()
            .unique_by(|e| (e.complex.clone(), e.original))
            .collect();
        entries = deduped;
        if !changed {
            break;
        }
    }

    Ok(SelectorList::new(trim(entries)))
}

/// `Err` of compilation, `Ok(None)` when nothing extended this complex.
fn extend_complex(
    complex: &ComplexSelector,
    media_context: Option<&[CssMediaQuery]>,
    extensions: &[Extension],
) -> SassResult<Option<Vec<(ComplexSelector, i32)>>> {
    // Per-component alternatives: each choice is a component sequence plus
    // the extender specificity it carries.
    let mut choices: Vec<Vec<(Vec<ComplexComponent>, i32)>> = Vec::new();
    let mut extended_any = false;

    for component in &complex.components {
        match component {
            ComplexComponent::Compound(compound) => {
                match extend_compound(compound, media_context, extensions)? {
                    None => {
                        choices.push(vec![(vec![component.clone()], 0)]);
                    }
                    Some(options) => {
                        extended_any = true;
                        choices.push(options);
                    }
                }
            }
            ComplexComponent::Combinator(_) => {
                choices.push(vec![(vec![component.clone()], 0)]);
            }
        }
    }

    if !extended_any {
        return Ok(None);
    }

    let mut results: Vec<(ComplexSelector, i32)> = Vec::new();
    for path in paths(&choices) {
        let sequences: Vec<Vec<ComplexComponent>> =
            path.iter().map(|(seq, _)| seq.clone()).collect();
        let specificity = path.iter().map(|(_, s)| *s).max().unwrap_or(0);
        for woven in super::weave::weave(&sequences) {
            let candidate = ComplexSelector::new(woven);
            if candidate.is_bounded() {
                results.push((candidate, specificity));
            }
        }
    }
    Ok(Some(results))
}

/// Extends one compound; `Ok(None)` when no extension applies to it.
fn extend_compound(
    compound: &CompoundSelector,
    media_context: Option<&[CssMediaQuery]>,
    extensions: &[Extension],
) -> SassResult<Option<Vec<(Vec<ComplexComponent>, i32)>>> {
    // Alternatives per simple selector position.
    #[derive(Clone)]
    struct Entry {
        components: Vec<ComplexComponent>,
        specificity: i32,
        original: bool,
    }

    let original_entry = |simple: &SimpleSelector| Entry {
        components: vec![ComplexComponent::Compound(CompoundSelector::single(
            simple.clone(),
        ))],
        specificity: 0,
        original: true,
    };

    let mut options: Option<Vec<Vec<Entry>>> = None;
    for (i, simple) in compound.components.iter().enumerate() {
        let extended = extend_simple(simple, media_context, extensions)?;
        match extended {
            None => {
                if let Some(options) = &mut options {
                    options.push(vec![original_entry(simple)]);
                }
            }
            Some((alternatives, keep_original)) => {
                if options.is_none() {
                    let mut initial = Vec::new();
                    for prior in &compound.components[..i] {
                        initial.push(vec![original_entry(prior)]);
                    }
                    options = Some(initial);
                }
                let mut set = Vec::new();
                if keep_original {
                    set.push(original_entry(simple));
                }
                for (extender, specificity) in alternatives {
                    set.push(Entry {
                        components: extender,
                        specificity,
                        original: false,
                    });
                }
                options.as_mut().expect("set above").push(set);
            }
        }
    }

    // Whole-compound targets (`@extend .a.b`).
    let mut compound_level: Vec<(Vec<ComplexComponent>, i32)> = Vec::new();
    for extension in extensions {
        if extension.target.components.len() < 2 {
            continue;
        }
        let applies = extension
            .target
            .components
            .iter()
            .all(|t| compound.components.contains(t));
        if !applies {
            continue;
        }
        check_media(extension, media_context)?;
        extension.matched.set(true);
        let rest: Vec<SimpleSelector> = compound
            .components
            .iter()
            .filter(|s| !extension.target.components.contains(s))
            .cloned()
            .collect();
        if let Some(replacement) = replace_trailing_compound(&extension.extender, &rest) {
            compound_level.push((replacement, extension.extender.max_specificity()));
        }
    }

    let mut results: Vec<(Vec<ComplexComponent>, i32)> = Vec::new();
    if let Some(options) = options {
        for path in paths(&options) {
            let mut originals: Vec<SimpleSelector> = Vec::new();
            let mut to_unify: Vec<Vec<ComplexComponent>> = Vec::new();
            let mut specificity = 0;
            for entry in &path {
                specificity = specificity.max(entry.specificity);
                if entry.original {
                    if let Some(ComplexComponent::Compound(c)) = entry.components.last() {
                        originals.extend(c.components.iter().cloned());
                    }
                } else {
                    to_unify.push(entry.components.clone());
                }
            }
            if !originals.is_empty() {
                to_unify.insert(
                    0,
                    vec![ComplexComponent::Compound(CompoundSelector::new(originals))],
                );
            }
            if let Some(unified) = unify_complex(&to_unify) {
                for components in unified {
                    results.push((components, specificity));
                }
            }
        }
    }
    // Compound-level matches union with the untouched original compound.
    if !compound_level.is_empty() && results.is_empty() {
        results.push((
            vec![ComplexComponent::Compound(compound.clone())],
            0,
        ));
    }
    results.extend(compound_level);

    if results.is_empty() {
        Ok(None)
    } else {
        Ok(Some(results))
    }
}

/// Extensions applying to one simple selector.
///
/// The boolean is whether the original simple selector still participates:
/// direct extensions union with it, while a rewritten selector-argument
/// pseudo (`:not(.a)` under `@extend .a`) replaces it outright.
#[allow(clippy::type_complexity)]
fn extend_simple(
    simple: &SimpleSelector,
    media_context: Option<&[CssMediaQuery]>,
    extensions: &[Extension],
) -> SassResult<Option<(Vec<(Vec<ComplexComponent>, i32)>, bool)>> {
    let mut alternatives: Vec<(Vec<ComplexComponent>, i32)> = Vec::new();
    let mut keep_original = true;

    for extension in extensions {
        let target = match extension.single_target() {
            Some(t) => t,
            None => continue,
        };
        if target != simple {
            continue;
        }
        check_media(extension, media_context)?;
        extension.matched.set(true);
        alternatives.push((
            extension.extender.components.clone(),
            extension.extender.max_specificity(),
        ));
    }

    // `:not(.a)` with `@extend .a` rewrites the inner selector in place.
    if let SimpleSelector::Pseudo(pseudo) = simple {
        if let Some(inner) = &pseudo.selector {
            let extended = extend_selector_list(inner, media_context, extensions)?;
            if extended != **inner {
                let specificity = extended
                    .components
                    .iter()
                    .map(ComplexSelector::max_specificity)
                    .max()
                    .unwrap_or(0);
                let new_pseudo = SimpleSelector::Pseudo(PseudoSelector {
                    name: pseudo.name.clone(),
                    is_element: pseudo.is_element,
                    argument: pseudo.argument.clone(),
                    selector: Some(Box::new(extended)),
                });
                alternatives.push((
                    vec![ComplexComponent::Compound(CompoundSelector::single(
                        new_pseudo,
                    ))],
                    specificity,
                ));
                keep_original = false;
            }
        }
    }

    if alternatives.is_empty() {
        Ok(None)
    } else {
        Ok(Some((alternatives, keep_original)))
    }
}

/// The extender with its trailing compound unified against `rest`.
fn replace_trailing_compound(
    extender: &ComplexSelector,
    rest: &[SimpleSelector],
) -> Option<Vec<ComplexComponent>> {
    let last = match extender.components.last()? {
        ComplexComponent::Compound(c) => c,
        ComplexComponent::Combinator(_) => return None,
    };
    let unified = if rest.is_empty() {
        last.clone()
    } else {
        unify_compound(&last.components, rest)?
    };
    let mut components = extender.components[..extender.components.len() - 1].to_vec();
    components.push(ComplexComponent::Compound(unified));
    Some(components)
}

fn check_media(
    extension: &Extension,
    media_context: Option<&[CssMediaQuery]>,
) -> SassResult<()> {
    let matches = match (&extension.media_context, media_context) {
        (None, None) => true,
        (Some(theirs), Some(ours)) => theirs.as_slice() == ours,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(SassError::new(ErrorKind::ExtendAcrossMedia, extension.span))
    }
}

/// Removes selectors covered by another selector in the list with equal or
/// greater specificity, keeping everything that was in the input verbatim.
fn trim(entries: Vec<ExtendedSelector>) -> Vec<ComplexSelector> {
    if entries.len() > MAX_TRIM_SELECTORS {
        return entries.into_iter().map(|e| e.complex).collect();
    }

    let mut result: Vec<ExtendedSelector> = Vec::new();
    let mut num_originals = 0;

    'outer: for i in (0..entries.len()).rev() {
        let entry = &entries[i];
        if entry.original {
            // Eliminate duplicate originals, keeping the first occurrence.
            for j in 0..num_originals {
                if result[j].complex == entry.complex {
                    let duplicate = result.remove(j);
                    result.insert(0, duplicate);
                    continue 'outer;
                }
            }
            num_originals += 1;
            result.insert(0, entry.clone());
            continue;
        }

        // Only the specificity of the selector's sources matters here: a
        // generated selector may be dropped when something at least as
        // specific as everything that produced it already covers it.
        let max_specificity = entry.source_specificity;
        let covered = result.iter().any(|other| {
            other.complex.min_specificity() >= max_specificity
                && complex_is_superselector(&other.complex.components, &entry.complex.components)
        }) || entries[..i].iter().any(|other| {
            other.complex.min_specificity() >= max_specificity
                && complex_is_superselector(&other.complex.components, &entry.complex.components)
        });
        if covered {
            continue;
        }
        result.insert(0, entry.clone());
    }

    result.into_iter().map(|e| e.complex).collect()
}

/// Applies the trailing check: every mandatory extension must have matched
/// something by the end of compilation.
pub fn check_unsatisfied(extensions: &[Extension]) -> SassResult<()> {
    for extension in extensions {
        if !extension.optional && !extension.matched.get() {
            return Err(SassError::new(
                ErrorKind::UnsatisfiedExtend(extension.target.to_string()),
                extension.span,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorParser;

    fn list(s: &str) -> SelectorList {
        SelectorParser::parse_from_text(s).unwrap()
    }

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t".to_string(), "x".to_string()).span
    }

    fn extension(target: &str, extender: &str) -> Extension {
        let target = list(target).components[0]
            .components
            .last()
            .and_then(ComplexComponent::as_compound)
            .expect("target compound")
            .clone();
        Extension::new(
            target,
            list(extender).components[0].clone(),
            span(),
            false,
            None,
        )
    }

    fn extend(selector: &str, target: &str, extender: &str) -> String {
        extend_selector_list(&list(selector), None, &[extension(target, extender)])
            .unwrap()
            .to_string()
    }

    #[test]
    fn basic_extension_unions() {
        assert_eq!(extend(".a", ".a", ".b"), ".a, .b");
    }

    #[test]
    fn extension_in_complex_selector() {
        assert_eq!(extend(".x .a", ".a", ".b"), ".x .a, .x .b");
    }

    #[test]
    fn extender_with_ancestors_weaves() {
        let result = extend(".x .a", ".a", ".y .b");
        assert!(result.contains(".x .a"), "{}", result);
        assert!(result.contains(".x .y .b"), "{}", result);
        assert!(result.contains(".y .x .b"), "{}", result);
    }

    #[test]
    fn compound_retains_remaining_simples() {
        assert_eq!(extend(".a.c", ".a", ".b"), ".a.c, .c.b");
    }

    #[test]
    fn unmatched_mandatory_extension_errors() {
        let exts = [extension(".missing", ".b")];
        extend_selector_list(&list(".a"), None, &exts).unwrap();
        assert!(check_unsatisfied(&exts).is_err());
    }

    #[test]
    fn unmatched_optional_extension_is_fine() {
        let target = list(".missing").components[0]
            .components
            .last()
            .and_then(ComplexComponent::as_compound)
            .unwrap()
            .clone();
        let ext = Extension::new(
            target,
            list(".b").components[0].clone(),
            span(),
            true,
            None,
        );
        assert!(check_unsatisfied(&[ext]).is_ok());
    }

    #[test]
    fn extend_across_media_errors() {
        let ext = extension(".a", ".b");
        let media = vec![CssMediaQuery {
            modifier: None,
            media_type: Some("print".to_string()),
            features: vec![],
        }];
        let result = extend_selector_list(&list(".a"), Some(&media), &[ext]);
        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::ExtendAcrossMedia
        ));
    }

    #[test]
    fn matching_media_contexts_extend() {
        let media = vec![CssMediaQuery {
            modifier: None,
            media_type: Some("print".to_string()),
            features: vec![],
        }];
        let target = list(".a").components[0]
            .components
            .last()
            .and_then(ComplexComponent::as_compound)
            .unwrap()
            .clone();
        let ext = Extension::new(
            target,
            list(".b").components[0].clone(),
            span(),
            false,
            Some(media.clone()),
        );
        let result = extend_selector_list(&list(".a"), Some(&media), &[ext]).unwrap();
        assert_eq!(result.to_string(), ".a, .b");
    }

    #[test]
    fn transitive_extension_reaches_fixed_point() {
        // .c extends .b, .b extends .a: .a picks up both.
        let exts = [extension(".a", ".b"), extension(".b", ".c")];
        let result = extend_selector_list(&list(".a"), None, &exts).unwrap();
        let text = result.to_string();
        assert!(text.contains(".a"), "{}", text);
        assert!(text.contains(".b"), "{}", text);
        assert!(text.contains(".c"), "{}", text);
    }

    #[test]
    fn trim_drops_redundant_superselectors() {
        let entries = vec![
            ExtendedSelector {
                complex: list(".a").components[0].clone(),
                source_specificity: 1000,
                original: true,
            },
            ExtendedSelector {
                complex: list(".x .b").components[0].clone(),
                source_specificity: 1000,
                original: false,
            },
            // Covered by `.x .b` with specificity at least that of its
            // source, so it is redundant.
            ExtendedSelector {
                complex: list(".q .x .b").components[0].clone(),
                source_specificity: 1000,
                original: false,
            },
        ];
        let trimmed = trim(entries);
        let text = SelectorList::new(trimmed).to_string();
        assert_eq!(text, ".a, .x .b");
    }

    #[test]
    fn shared_parents_are_not_duplicated() {
        let result = extend(".x .a", ".a", ".x .b");
        assert_eq!(result, ".x .a, .x .b");
    }

    #[test]
    fn originals_survive_trim() {
        // `.a.b` is a subselector of the generated `.b`, but it is original
        // input and must stay.
        let exts = [extension(".x", ".b")];
        let result = extend_selector_list(&list(".a.b, .x"), None, &exts).unwrap();
        let text = result.to_string();
        assert!(text.contains(".a.b"), "{}", text);
    }

    #[test]
    fn extension_inside_not_rewrites_in_place() {
        assert_eq!(extend(":not(.a)", ".a", ".b"), ":not(.a, .b)");
    }

    #[test]
    fn placeholder_extension() {
        assert_eq!(extend("%base", "%base", ".b"), "%base, .b");
    }
}
