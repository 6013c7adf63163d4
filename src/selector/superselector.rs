//! Superselector checks.
//!
//! `A` is a superselector of `B` iff every element matching `B` also matches
//! `A`.  The complex-selector walk proceeds left to right, consuming a
//! prefix of `B` for each compound of `A` while honoring combinator
//! semantics (`~` covers `+`; `>` and `+` require adjacency).

use super::{
    Combinator, ComplexComponent, ComplexSelector, CompoundSelector, PseudoSelector,
    SelectorList, SimpleSelector,
};

/// Pseudo-classes that match everything their selector argument matches.
const SUBSELECTOR_PSEUDOS: &[&str] = &["matches", "is", "any", "where", "nth-child", "nth-last-child"];

pub fn list_is_superselector(list1: &SelectorList, list2: &SelectorList) -> bool {
    list2.components.iter().all(|complex2| {
        list1
            .components
            .iter()
            .any(|complex1| complex_is_superselector(&complex1.components, &complex2.components))
    })
}

pub fn complex_is_superselector(
    complex1: &[ComplexComponent],
    complex2: &[ComplexComponent],
) -> bool {
    // Selectors with trailing combinators are neither superselectors nor
    // subselectors of anything.
    if matches!(complex1.last(), Some(ComplexComponent::Combinator(_)))
        || matches!(complex2.last(), Some(ComplexComponent::Combinator(_)))
    {
        return false;
    }

    let mut i1 = 0;
    let mut i2 = 0;
    loop {
        let remaining1 = complex1.len() - i1;
        let remaining2 = complex2.len() - i2;
        if remaining1 == 0 || remaining2 == 0 || remaining1 > remaining2 {
            return false;
        }

        let compound1 = match &complex1[i1] {
            ComplexComponent::Compound(c) => c,
            ComplexComponent::Combinator(_) => return false,
        };

        if remaining1 == 1 {
            let parents: Vec<&CompoundSelector> = complex2[i2..complex2.len() - 1]
                .iter()
                .filter_map(ComplexComponent::as_compound)
                .collect();
            let last2 = match complex2.last() {
                Some(ComplexComponent::Compound(c)) => c,
                _ => return false,
            };
            return compound_is_superselector(compound1, last2, &parents);
        }

        // Find the first position in complex2 whose compound compound1 covers.
        let mut after_superselector = i2 + 1;
        while after_superselector < complex2.len() {
            if let ComplexComponent::Compound(compound2) = &complex2[after_superselector - 1] {
                let parents: Vec<&CompoundSelector> = complex2[i2..after_superselector - 1]
                    .iter()
                    .filter_map(ComplexComponent::as_compound)
                    .collect();
                if compound_is_superselector(compound1, compound2, &parents) {
                    break;
                }
            }
            after_superselector += 1;
        }
        if after_superselector == complex2.len() {
            return false;
        }

        let component1 = &complex1[i1 + 1];
        let component2 = &complex2[after_superselector];
        match (component1.as_combinator(), component2.as_combinator()) {
            (Some(combinator1), Some(combinator2)) => {
                // `~` is a superselector of `+`; all else must match exactly.
                let compatible = match combinator1 {
                    Combinator::FollowingSibling => combinator2 != Combinator::Child,
                    other => combinator2 == other,
                };
                if !compatible {
                    return false;
                }
                // `>` and `+` require the next match to be immediately
                // adjacent, so a longer tail on complex2 can't be skipped.
                if remaining1 == 3 && remaining2 > 3 {
                    return false;
                }
                i1 += 2;
                i2 = after_superselector + 1;
            }
            (None, Some(combinator2)) => {
                if combinator2 != Combinator::Child {
                    return false;
                }
                i1 += 1;
                i2 = after_superselector + 1;
            }
            _ => {
                i1 += 1;
                i2 = after_superselector;
            }
        }
    }
}

pub fn compound_is_superselector(
    compound1: &CompoundSelector,
    compound2: &CompoundSelector,
    parents: &[&CompoundSelector],
) -> bool {
    for simple1 in &compound1.components {
        match simple1 {
            SimpleSelector::Pseudo(p) if p.selector.is_some() => {
                if !selector_pseudo_is_superselector(p, compound2, parents) {
                    return false;
                }
            }
            _ => {
                if !simple_is_superselector_of_compound(simple1, compound2) {
                    return false;
                }
            }
        }
    }
    // A pseudo-element in compound2 must be spoken for by compound1.
    for simple2 in &compound2.components {
        if let SimpleSelector::Pseudo(p) = simple2 {
            if p.is_element && p.selector.is_none() && !compound1.components.contains(simple2) {
                return false;
            }
        }
    }
    true
}

/// Whether `simple` matches everything `compound` does.
fn simple_is_superselector_of_compound(
    simple: &SimpleSelector,
    compound: &CompoundSelector,
) -> bool {
    compound.components.iter().any(|their_simple| {
        if simple == their_simple {
            return true;
        }
        // Selectors like `:is(.a)` match everything their argument matches.
        if let SimpleSelector::Pseudo(p) = their_simple {
            if let Some(selector) = &p.selector {
                if SUBSELECTOR_PSEUDOS.contains(&p.normalized_name().as_str()) {
                    return selector.components.iter().all(|complex| {
                        if complex.components.len() != 1 {
                            return false;
                        }
                        complex.components[0]
                            .as_compound()
                            .map_or(false, |c| c.components.contains(simple))
                    });
                }
            }
        }
        false
    })
}

/// The selector arguments of every pseudo in `compound` with the given
/// normalized name.
fn selector_pseudo_args<'a>(
    compound: &'a CompoundSelector,
    normalized: &str,
    is_element: bool,
) -> Vec<&'a SelectorList> {
    compound
        .components
        .iter()
        .filter_map(|s| match s {
            SimpleSelector::Pseudo(p)
                if p.is_element == is_element && p.normalized_name() == normalized =>
            {
                p.selector.as_deref()
            }
            _ => None,
        })
        .collect()
}

fn selector_pseudo_is_superselector(
    pseudo1: &PseudoSelector,
    compound2: &CompoundSelector,
    parents: &[&CompoundSelector],
) -> bool {
    let selector1 = match &pseudo1.selector {
        Some(s) => s,
        None => return false,
    };
    match pseudo1.normalized_name().as_str() {
        "matches" | "is" | "any" | "where" => {
            selector_pseudo_args(compound2, &pseudo1.normalized_name(), false)
                .iter()
                .any(|selector2| list_is_superselector(selector1, selector2))
                || selector1.components.iter().any(|complex1| {
                    let mut expanded: Vec<ComplexComponent> = parents
                        .iter()
                        .map(|c| ComplexComponent::Compound((*c).clone()))
                        .collect();
                    expanded.push(ComplexComponent::Compound(compound2.clone()));
                    complex_is_superselector(&complex1.components, &expanded)
                })
        }
        "has" | "host" | "host-context" => {
            selector_pseudo_args(compound2, &pseudo1.normalized_name(), pseudo1.is_element)
                .iter()
                .any(|selector2| list_is_superselector(selector1, selector2))
        }
        "slotted" => selector_pseudo_args(compound2, &pseudo1.normalized_name(), true)
            .iter()
            .any(|selector2| list_is_superselector(selector1, selector2)),
        "not" => selector1.components.iter().all(|complex| {
            compound2.components.iter().any(|simple2| match simple2 {
                SimpleSelector::Type { .. } => {
                    let single = complex.components.last().and_then(ComplexComponent::as_compound);
                    single.map_or(false, |compound| {
                        compound.components.iter().any(
                            |s| matches!(s, SimpleSelector::Type { .. }) && s != simple2,
                        )
                    })
                }
                SimpleSelector::Id(_) => {
                    let single = complex.components.last().and_then(ComplexComponent::as_compound);
                    single.map_or(false, |compound| {
                        compound
                            .components
                            .iter()
                            .any(|s| matches!(s, SimpleSelector::Id(_)) && s != simple2)
                    })
                }
                SimpleSelector::Pseudo(p2)
                    if p2.name == pseudo1.name && p2.selector.is_some() =>
                {
                    let inner = p2.selector.as_deref().map(|s| {
                        s.components.iter().any(|their_complex| {
                            complex_is_superselector(&their_complex.components, &complex.components)
                        })
                    });
                    inner.unwrap_or(false)
                }
                _ => false,
            })
        }),
        "current" => selector_pseudo_args(compound2, "current", pseudo1.is_element)
            .iter()
            .any(|selector2| **selector1 == **selector2),
        "nth-child" | "nth-last-child" => compound2.components.iter().any(|simple2| {
            matches!(simple2, SimpleSelector::Pseudo(p2)
                if p2.name == pseudo1.name
                    && p2.argument == pseudo1.argument
                    && p2.selector.as_deref().map_or(false, |s2| {
                        list_is_superselector(selector1, s2)
                    }))
        }),
        _ => false,
    }
}

/// Like [`complex_is_superselector`], but padded so that a bare `A` counts
/// as a parent-superselector of `A B`.
pub fn complex_is_parent_superselector(
    complex1: &[ComplexComponent],
    complex2: &[ComplexComponent],
) -> bool {
    if matches!(complex1.first(), Some(ComplexComponent::Combinator(_)))
        || matches!(complex2.first(), Some(ComplexComponent::Combinator(_)))
    {
        return false;
    }
    if complex1.len() > complex2.len() {
        return false;
    }
    let bogus = ComplexComponent::Compound(CompoundSelector::single(
        SimpleSelector::Placeholder("<temp>".to_string()),
    ));
    let mut padded1 = complex1.to_vec();
    padded1.push(bogus.clone());
    let mut padded2 = complex2.to_vec();
    padded2.push(bogus);
    complex_is_superselector(&padded1, &padded2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorParser;

    fn list(s: &str) -> SelectorList {
        SelectorParser::parse_from_text(s).unwrap()
    }

    fn is_super(a: &str, b: &str) -> bool {
        list_is_superselector(&list(a), &list(b))
    }

    #[test]
    fn basic_compounds() {
        assert!(is_super("a", "a.b"));
        assert!(!is_super("a.b", "a"));
        assert!(is_super(".c", "a.b.c"));
        assert!(!is_super(".c", ".b"));
    }

    #[test]
    fn descendant_prefixes() {
        assert!(is_super("b", "a b"));
        assert!(is_super("a b", "x a y b"));
        assert!(!is_super("a b", "b"));
    }

    #[test]
    fn combinator_rules() {
        assert!(is_super("a > b", "a > b"));
        assert!(!is_super("a > b", "a b"));
        assert!(is_super("a ~ b", "a + b"));
        assert!(!is_super("a + b", "a ~ b"));
    }

    #[test]
    fn lists_cover_elementwise() {
        assert!(is_super("a, b", "a"));
        assert!(is_super("a, b", "b.c"));
        assert!(!is_super("a", "a, b"));
    }

    #[test]
    fn universal_and_types() {
        assert!(is_super("a", "a"));
        assert!(!is_super("a", "b"));
    }

    #[test]
    fn is_pseudo_covers_members() {
        assert!(is_super(":is(a, b)", "a"));
        assert!(is_super("a", ":is(a)"));
    }

    #[test]
    fn not_pseudo() {
        assert!(is_super(":not(.a)", ".b:not(.a)"));
        assert!(!is_super(":not(.a)", ".b"));
    }

    #[test]
    fn parent_superselector_padding() {
        let a = list("a");
        let b = list("a b");
        assert!(complex_is_parent_superselector(
            &a.components[0].components,
            &b.components[0].components
        ));
        assert!(!complex_is_parent_superselector(
            &b.components[0].components,
            &a.components[0].components
        ));
    }

    #[test]
    fn mutual_superselectors_are_equal() {
        let a = list("a.b");
        let b = list("a.b");
        assert!(list_is_superselector(&a, &b));
        assert!(list_is_superselector(&b, &a));
        assert_eq!(a, b);
    }
}
