//! Parent resolution: substituting `&` and prepending parent selectors.

use super::{ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};

/// Why a selector could not be resolved against its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentError {
    /// `&` used where there is no enclosing rule.
    TopLevel,
    /// The parent's shape can't take the reference (trailing combinator,
    /// or a suffix on something that admits none).
    Incompatible(String),
    /// `&` not at the start of its compound selector.
    Misplaced,
}

/// Resolves a child selector list against the enclosing rule's selector.
///
/// Each child complex selector distributes over the parent list.  A child
/// with no explicit `&` is prepended as a descendant of each parent unless
/// `implicit_parent` is off (used for `@at-root` and pseudo arguments).
pub fn resolve_parent_selectors(
    list: &SelectorList,
    parent: Option<&SelectorList>,
    implicit_parent: bool,
) -> Result<SelectorList, ParentError> {
    let parent = match parent {
        Some(p) => p,
        None => {
            if list.contains_parent() {
                return Err(ParentError::TopLevel);
            }
            return Ok(list.clone());
        }
    };

    let mut result = Vec::new();
    for complex in &list.components {
        if !complex.contains_parent() {
            if !implicit_parent {
                result.push(complex.clone());
                continue;
            }
            for parent_complex in &parent.components {
                let mut components = parent_complex.components.clone();
                components.extend(complex.components.iter().cloned());
                result.push(ComplexSelector {
                    components,
                    line_break: parent_complex.line_break || complex.line_break,
                });
            }
            continue;
        }

        let mut working: Vec<Vec<ComplexComponent>> = vec![Vec::new()];
        for component in &complex.components {
            match component {
                ComplexComponent::Compound(compound) if compound.has_parent() => {
                    let resolved = resolve_compound(compound, parent)?;
                    let mut next = Vec::with_capacity(working.len() * resolved.len());
                    for prefix in &working {
                        for alternative in &resolved {
                            let mut extended = prefix.clone();
                            extended.extend(alternative.iter().cloned());
                            next.push(extended);
                        }
                    }
                    working = next;
                }
                other => {
                    for prefix in &mut working {
                        prefix.push(other.clone());
                    }
                }
            }
        }
        result.extend(working.into_iter().map(ComplexSelector::new));
    }
    Ok(SelectorList::new(result))
}

/// Resolves one compound containing a parent reference, producing one
/// component sequence per parent complex selector.
fn resolve_compound(
    compound: &CompoundSelector,
    parent: &SelectorList,
) -> Result<Vec<Vec<ComplexComponent>>, ParentError> {
    let mut rest = Vec::new();
    let mut parent_suffix: Option<Option<String>> = None;
    for (i, simple) in compound.components.iter().enumerate() {
        match simple {
            SimpleSelector::Parent { suffix } => {
                if i != 0 {
                    return Err(ParentError::Misplaced);
                }
                parent_suffix = Some(suffix.clone());
            }
            SimpleSelector::Pseudo(p)
                if p.selector.as_ref().map_or(false, |s| s.contains_parent()) =>
            {
                let inner = p.selector.as_deref().expect("checked above");
                let resolved = resolve_parent_selectors(inner, Some(parent), false)?;
                let mut resolved_pseudo = p.clone();
                resolved_pseudo.selector = Some(Box::new(resolved));
                rest.push(SimpleSelector::Pseudo(resolved_pseudo));
            }
            other => rest.push(other.clone()),
        }
    }

    let suffix = match parent_suffix {
        // Only pseudo-inner references: the compound stays where it is.
        None => {
            return Ok(vec![vec![ComplexComponent::Compound(
                CompoundSelector::new(rest),
            )]])
        }
        Some(suffix) => suffix,
    };

    let mut result = Vec::new();
    for parent_complex in &parent.components {
        let last_compound = match parent_complex.components.last() {
            Some(ComplexComponent::Compound(c)) => c,
            _ => {
                return Err(ParentError::Incompatible(parent_complex.to_string()));
            }
        };

        let mut new_last = last_compound.components.clone();
        if let Some(suffix) = &suffix {
            let last_simple = new_last
                .pop()
                .ok_or_else(|| ParentError::Incompatible(parent_complex.to_string()))?;
            let suffixed = last_simple
                .add_suffix(suffix)
                .ok_or_else(|| ParentError::Incompatible(parent_complex.to_string()))?;
            new_last.push(suffixed);
        }
        new_last.extend(rest.iter().cloned());

        let mut components =
            parent_complex.components[..parent_complex.components.len() - 1].to_vec();
        components.push(ComplexComponent::Compound(CompoundSelector::new(new_last)));
        result.push(components);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorParser;

    fn list(s: &str) -> SelectorList {
        SelectorParser::parse_from_text(s).unwrap()
    }

    fn resolve(child: &str, parent: &str) -> String {
        resolve_parent_selectors(&list(child), Some(&list(parent)), true)
            .unwrap()
            .to_string()
    }

    #[test]
    fn implicit_descendant_nesting() {
        assert_eq!(resolve("b", "a"), "a b");
        assert_eq!(resolve("b c", "a"), "a b c");
    }

    #[test]
    fn explicit_parent_reference() {
        assert_eq!(resolve("&.b", ".a"), ".a.b");
        assert_eq!(resolve("& .b", ".a"), ".a .b");
        assert_eq!(resolve(".b &", ".a"), ".b .a");
    }

    #[test]
    fn distributes_over_parent_list() {
        assert_eq!(resolve("&.x", "a, b"), "a.x, b.x");
        assert_eq!(resolve("c", "a, b"), "a c, b c");
    }

    #[test]
    fn distributes_over_child_list() {
        assert_eq!(resolve("&.x, &.y", ".p"), ".p.x, .p.y");
    }

    #[test]
    fn suffix_concatenates_names() {
        assert_eq!(resolve("&-fld", ".base"), ".base-fld");
        assert_eq!(resolve("&-b", "a"), "a-b");
    }

    #[test]
    fn suffix_incompatible_with_combinator_parent() {
        let result = resolve_parent_selectors(&list("&-x"), Some(&list("a >")), true);
        assert!(matches!(result, Err(ParentError::Incompatible(_))));
    }

    #[test]
    fn top_level_parent_is_an_error() {
        let result = resolve_parent_selectors(&list("&.x"), None, true);
        assert_eq!(result, Err(ParentError::TopLevel));
        // Without `&` the list passes through untouched.
        let ok = resolve_parent_selectors(&list("a b"), None, true).unwrap();
        assert_eq!(ok.to_string(), "a b");
    }

    #[test]
    fn parent_in_pseudo_argument() {
        // A `&` inside a pseudo argument suppresses the implicit parent.
        assert_eq!(resolve(":not(&) .x", ".a"), ":not(.a) .x");
    }

    #[test]
    fn multiple_parents_in_one_complex() {
        assert_eq!(resolve("& + &", ".a"), ".a + .a");
        assert_eq!(resolve("& &", ".a, .b"), ".a .a, .a .b, .b .a, .b .b");
    }
}
