//! Selector unification.
//!
//! `A.unify(B)` produces a selector matching exactly the intersection of
//! what `A` and `B` match, or nothing when they cannot both hold of one
//! element (two different ids, say).

use super::weave::weave;
use super::{
    ComplexComponent, ComplexSelector, CompoundSelector, Namespace, SelectorList, SimpleSelector,
};

/// Unifies one simple selector into a compound's component list.
///
/// Returns `None` when the result can't match anything.
pub fn unify_simple_into(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    match simple {
        SimpleSelector::Type { .. } | SimpleSelector::Universal(_) => {
            unify_type_into(simple, compound)
        }
        SimpleSelector::Id(id) => {
            let conflicting = compound
                .iter()
                .any(|s| matches!(s, SimpleSelector::Id(other) if other != id));
            if conflicting {
                return None;
            }
            add_unless_present(simple, compound)
        }
        SimpleSelector::Pseudo(p) if p.is_element => {
            let conflicting = compound.iter().any(|s| {
                matches!(s, SimpleSelector::Pseudo(other) if other.is_element)
                    && s != simple
            });
            if conflicting {
                return None;
            }
            add_unless_present(simple, compound)
        }
        _ => add_unless_present(simple, compound),
    }
}

fn add_unless_present(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    if compound.contains(simple) {
        return Some(compound.to_vec());
    }
    let mut result = compound.to_vec();
    // Pseudo selectors stay last.
    let insert_at = result
        .iter()
        .position(|s| matches!(s, SimpleSelector::Pseudo(_)))
        .unwrap_or(result.len());
    result.insert(insert_at, simple.clone());
    Some(result)
}

/// Unifies a type or universal selector with a compound; the result keeps
/// the element selector first.
fn unify_type_into(
    simple: &SimpleSelector,
    compound: &[SimpleSelector],
) -> Option<Vec<SimpleSelector>> {
    let existing = compound.iter().position(|s| {
        matches!(
            s,
            SimpleSelector::Type { .. } | SimpleSelector::Universal(_)
        )
    });
    match existing {
        None => {
            let mut result = vec![simple.clone()];
            result.extend(compound.iter().cloned());
            Some(result)
        }
        Some(i) => {
            let unified = unify_type(simple, &compound[i])?;
            let mut result = compound.to_vec();
            result[i] = unified;
            if i != 0 {
                let elem = result.remove(i);
                result.insert(0, elem);
            }
            Some(result)
        }
    }
}

/// Unification of two element (type/universal) selectors.
fn unify_type(a: &SimpleSelector, b: &SimpleSelector) -> Option<SimpleSelector> {
    match (a, b) {
        (SimpleSelector::Universal(ns1), SimpleSelector::Universal(ns2)) => {
            Some(SimpleSelector::Universal(ns1.unify(ns2)?))
        }
        (SimpleSelector::Universal(ns1), SimpleSelector::Type { namespace, name })
        | (SimpleSelector::Type { namespace, name }, SimpleSelector::Universal(ns1)) => {
            Some(SimpleSelector::Type {
                namespace: ns1.unify(namespace)?,
                name: name.clone(),
            })
        }
        (
            SimpleSelector::Type {
                namespace: ns1,
                name: n1,
            },
            SimpleSelector::Type {
                namespace: ns2,
                name: n2,
            },
        ) => {
            if n1 != n2 {
                return None;
            }
            Some(SimpleSelector::Type {
                namespace: ns1.unify(ns2)?,
                name: n1.clone(),
            })
        }
        _ => None,
    }
}

/// Unifies two compound selectors memberwise.
pub fn unify_compound(
    a: &[SimpleSelector],
    b: &[SimpleSelector],
) -> Option<CompoundSelector> {
    let mut result = b.to_vec();
    for simple in a {
        result = unify_simple_into(simple, &result)?;
    }
    Some(CompoundSelector::new(result))
}

/// Unifies a set of complex selectors into the complex selectors matching
/// all of them, by unifying the trailing compounds and weaving the rest.
pub fn unify_complex(
    complexes: &[Vec<ComplexComponent>],
) -> Option<Vec<Vec<ComplexComponent>>> {
    if complexes.len() == 1 {
        return Some(complexes.to_vec());
    }

    let mut unified_base: Option<Vec<SimpleSelector>> = None;
    for complex in complexes {
        let base = match complex.last()? {
            ComplexComponent::Compound(c) => c,
            ComplexComponent::Combinator(_) => return None,
        };
        unified_base = Some(match unified_base {
            None => base.components.clone(),
            Some(current) => {
                let mut acc = current;
                for simple in &base.components {
                    acc = unify_simple_into(simple, &acc)?;
                }
                acc
            }
        });
    }

    let mut without_bases: Vec<Vec<ComplexComponent>> = complexes
        .iter()
        .map(|complex| complex[..complex.len() - 1].to_vec())
        .collect();
    if let Some(last) = without_bases.last_mut() {
        last.push(ComplexComponent::Compound(CompoundSelector::new(
            unified_base?,
        )));
    }
    let woven = weave(&without_bases);
    if woven.is_empty() {
        None
    } else {
        Some(woven)
    }
}

/// List-level unification, as exposed by `selector-unify()`.
pub fn unify_lists(list1: &SelectorList, list2: &SelectorList) -> SelectorList {
    let mut components = Vec::new();
    for complex1 in &list1.components {
        for complex2 in &list2.components {
            if let Some(unified) = unify_complex(&[
                complex1.components.clone(),
                complex2.components.clone(),
            ]) {
                components.extend(unified.into_iter().map(ComplexSelector::new));
            }
        }
    }
    SelectorList::new(components)
}

/// Whether unifying two component sequences is obligatory: they share a
/// unique simple selector (an id or pseudo-element), so any weave that
/// keeps them separate can't match anything.
pub fn must_unify(complex1: &[ComplexComponent], complex2: &[ComplexComponent]) -> bool {
    let uniques: Vec<&SimpleSelector> = complex1
        .iter()
        .filter_map(ComplexComponent::as_compound)
        .flat_map(|c| c.components.iter())
        .filter(|s| s.is_unique())
        .collect();
    if uniques.is_empty() {
        return false;
    }
    complex2
        .iter()
        .filter_map(ComplexComponent::as_compound)
        .flat_map(|c| c.components.iter())
        .any(|s| s.is_unique() && uniques.iter().any(|u| *u == s))
}

/// The defining property of unification: both inputs are superselectors of
/// every element of the result.
#[cfg(test)]
pub fn unification_is_sound(a: &ComplexSelector, b: &ComplexSelector) -> bool {
    match unify_complex(&[a.components.clone(), b.components.clone()]) {
        None => true,
        Some(results) => results.iter().all(|result| {
            super::superselector::complex_is_superselector(&a.components, result)
                && super::superselector::complex_is_superselector(&b.components, result)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorParser;

    fn list(s: &str) -> SelectorList {
        SelectorParser::parse_from_text(s).unwrap()
    }

    fn unify_str(a: &str, b: &str) -> String {
        unify_lists(&list(a), &list(b)).to_string()
    }

    #[test]
    fn compound_unification() {
        assert_eq!(unify_str(".a", ".b"), ".a.b");
        assert_eq!(unify_str("a", ".b"), "a.b");
        // The type selector lands first regardless of order.
        assert_eq!(unify_str(".b", "a"), "a.b");
    }

    #[test]
    fn conflicting_ids_do_not_unify() {
        assert_eq!(unify_str("#a", "#b"), "");
        assert_eq!(unify_str("#a", "#a"), "#a");
    }

    #[test]
    fn conflicting_types_do_not_unify() {
        assert_eq!(unify_str("a", "b"), "");
        assert_eq!(unify_str("a", "a"), "a");
    }

    #[test]
    fn universal_unifies_with_type() {
        assert_eq!(unify_str("*", "a"), "a");
    }

    #[test]
    fn pseudo_elements_unify_only_when_identical() {
        assert_eq!(unify_str("::before", "::after"), "");
        assert_eq!(unify_str("::before", "::before"), "::before");
    }

    #[test]
    fn complex_unification_weaves() {
        let result = unify_str(".a .b", ".c .d");
        // Both interleavings appear.
        assert!(result.contains(".a .c .b.d"));
        assert!(result.contains(".c .a .b.d"));
    }

    #[test]
    fn unified_results_are_subselectors_of_both() {
        for (a, b) in [(".a", ".b"), (".a .b", ".c .d"), ("a.x", ".y")] {
            let la = list(a);
            let lb = list(b);
            assert!(
                unification_is_sound(&la.components[0], &lb.components[0]),
                "unify({}, {}) unsound",
                a,
                b
            );
        }
    }
}
