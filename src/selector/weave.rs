//! Weaving complex selectors.
//!
//! `weave` expands a set of component sequences into all sequences that
//! match everything the inputs match: the machinery behind `@extend` and
//! complex-selector unification.  Leading and trailing combinator runs are
//! merged first; the remainders are grouped into compound-plus-combinator
//! chunks, aligned by a longest-common-subsequence over groups, and the
//! leftover chunks contribute both orderings to a Cartesian product.

use std::collections::VecDeque;

use super::superselector::{complex_is_parent_superselector, compound_is_superselector};
use super::unify::{must_unify, unify_complex, unify_compound};
use super::{Combinator, ComplexComponent, CompoundSelector};

type Component = ComplexComponent;
type Group = Vec<Component>;
/// One set of alternatives; each alternative is a component sequence.
type Choices = Vec<Vec<Component>>;

/// Expands `complexes` into the list of all weavings.
///
/// The first sequence seeds the prefixes; each following sequence is split
/// into its parent part and its trailing component, the parents are woven
/// against every prefix, and the trailing component is appended.
pub fn weave(complexes: &[Vec<Component>]) -> Vec<Vec<Component>> {
    let mut prefixes: Vec<Vec<Component>> = vec![complexes[0].clone()];

    for complex in &complexes[1..] {
        if complex.is_empty() {
            continue;
        }
        let target = complex.last().expect("non-empty").clone();
        if complex.len() == 1 {
            for prefix in &mut prefixes {
                prefix.push(target.clone());
            }
            continue;
        }

        let parents: Vec<Component> = complex[..complex.len() - 1].to_vec();
        let mut new_prefixes = Vec::new();
        for prefix in &prefixes {
            if let Some(parent_prefixes) = weave_parents(prefix.clone(), parents.clone()) {
                for mut parent_prefix in parent_prefixes {
                    parent_prefix.push(target.clone());
                    new_prefixes.push(parent_prefix);
                }
            }
        }
        prefixes = new_prefixes;
    }

    prefixes
}

/// Interweaves two parent sequences into all sequences that are
/// superselectors of both; `None` when they cannot be merged.
pub fn weave_parents(
    parents1: Vec<Component>,
    parents2: Vec<Component>,
) -> Option<Vec<Vec<Component>>> {
    let mut queue1: VecDeque<Component> = parents1.into();
    let mut queue2: VecDeque<Component> = parents2.into();

    let initial = merge_initial_combinators(&mut queue1, &mut queue2)?;
    let mut final_combinators: VecDeque<Choices> = VecDeque::new();
    if !merge_final_combinators(&mut queue1, &mut queue2, &mut final_combinators) {
        return None;
    }

    // `:root` unification during weaving is disabled; the hook always
    // declines, matching the reference behavior.
    let root1 = first_if_root(&mut queue1);
    let root2 = first_if_root(&mut queue2);
    match (root1, root2) {
        (Some(r1), Some(r2)) => {
            let root = unify_compound(&r1.components, &r2.components)?;
            queue1.push_front(ComplexComponent::Compound(root.clone()));
            queue2.push_front(ComplexComponent::Compound(root));
        }
        (Some(r1), None) => queue2.push_front(ComplexComponent::Compound(r1)),
        (None, Some(r2)) => queue1.push_front(ComplexComponent::Compound(r2)),
        (None, None) => {}
    }

    let mut groups1 = group_selectors(queue1.make_contiguous());
    let mut groups2 = group_selectors(queue2.make_contiguous());

    let g1: Vec<Group> = groups1.iter().cloned().collect();
    let g2: Vec<Group> = groups2.iter().cloned().collect();
    let lcs = longest_common_subsequence(&g2, &g1, &|group1, group2| {
        if group1 == group2 {
            return Some(group1.clone());
        }
        if !matches!(group1.first(), Some(ComplexComponent::Compound(_)))
            || !matches!(group2.first(), Some(ComplexComponent::Compound(_)))
        {
            return None;
        }
        if complex_is_parent_superselector(group1, group2) {
            return Some(group2.clone());
        }
        if complex_is_parent_superselector(group2, group1) {
            return Some(group1.clone());
        }
        if !must_unify(group1, group2) {
            return None;
        }
        let unified = unify_complex(&[group1.clone(), group2.clone()])?;
        if unified.len() != 1 {
            return None;
        }
        unified.into_iter().next()
    });

    let mut choices: Vec<Choices> = vec![vec![initial]];
    for group in lcs {
        let chunk = chunks(&mut groups1, &mut groups2, |seq| {
            seq.front()
                .map_or(true, |first| complex_is_parent_superselector(first, &group))
        });
        choices.push(
            chunk
                .into_iter()
                .map(|groups| groups.into_iter().flatten().collect())
                .collect(),
        );
        choices.push(vec![group]);
        groups1.pop_front();
        groups2.pop_front();
    }
    let trailing = chunks(&mut groups1, &mut groups2, |seq| seq.is_empty());
    choices.push(
        trailing
            .into_iter()
            .map(|groups| groups.into_iter().flatten().collect())
            .collect(),
    );
    choices.extend(final_combinators);

    let non_empty: Vec<Choices> = choices.into_iter().filter(|c| !c.is_empty()).collect();
    Some(
        paths(&non_empty)
            .into_iter()
            .map(|path| path.into_iter().flatten().collect())
            .collect(),
    )
}

/// Removes and returns the leading compound if it contains `:root`.
///
/// The predicate is intentionally never satisfied; see the module docs.
fn first_if_root(queue: &mut VecDeque<Component>) -> Option<CompoundSelector> {
    let has_root = match queue.front() {
        Some(ComplexComponent::Compound(compound)) => compound_has_root(compound),
        _ => false,
    };
    if !has_root {
        return None;
    }
    match queue.pop_front() {
        Some(ComplexComponent::Compound(compound)) => Some(compound),
        _ => None,
    }
}

/// Whether a compound contains a `:root` selector.  Always false, keeping
/// root weaving disabled.
fn compound_has_root(_compound: &CompoundSelector) -> bool {
    false
}

/// Extracts leading combinators from both queues and merges them; the one
/// run must be a subsequence of the other.
fn merge_initial_combinators(
    queue1: &mut VecDeque<Component>,
    queue2: &mut VecDeque<Component>,
) -> Option<Vec<Component>> {
    let mut combinators1 = Vec::new();
    while let Some(ComplexComponent::Combinator(c)) = queue1.front() {
        combinators1.push(*c);
        queue1.pop_front();
    }
    let mut combinators2 = Vec::new();
    while let Some(ComplexComponent::Combinator(c)) = queue2.front() {
        combinators2.push(*c);
        queue2.pop_front();
    }

    let lcs = longest_common_subsequence(&combinators1, &combinators2, &|a, b| {
        if a == b {
            Some(*a)
        } else {
            None
        }
    });
    let winner = if lcs == combinators1 {
        combinators2
    } else if lcs == combinators2 {
        combinators1
    } else {
        return None;
    };
    Some(
        winner
            .into_iter()
            .map(ComplexComponent::Combinator)
            .collect(),
    )
}

/// Extracts trailing combinators, and the compounds they apply to, merging
/// them into choice sets pushed onto the front of `result`.
fn merge_final_combinators(
    queue1: &mut VecDeque<Component>,
    queue2: &mut VecDeque<Component>,
    result: &mut VecDeque<Choices>,
) -> bool {
    let ends1 = matches!(queue1.back(), Some(ComplexComponent::Combinator(_)));
    let ends2 = matches!(queue2.back(), Some(ComplexComponent::Combinator(_)));
    if !ends1 && !ends2 {
        return true;
    }

    let mut combinators1 = Vec::new();
    while let Some(ComplexComponent::Combinator(c)) = queue1.back() {
        combinators1.push(*c);
        queue1.pop_back();
    }
    let mut combinators2 = Vec::new();
    while let Some(ComplexComponent::Combinator(c)) = queue2.back() {
        combinators2.push(*c);
        queue2.pop_back();
    }

    if combinators1.len() > 1 || combinators2.len() > 1 {
        // Multiple trailing combinators only merge when one run is a
        // supersequence of the other.
        let lcs = longest_common_subsequence(&combinators1, &combinators2, &|a, b| {
            if a == b {
                Some(*a)
            } else {
                None
            }
        });
        let winner = if lcs == combinators1 {
            combinators2
        } else if lcs == combinators2 {
            combinators1
        } else {
            return false;
        };
        result.push_front(vec![winner
            .into_iter()
            .rev()
            .map(ComplexComponent::Combinator)
            .collect()]);
        return true;
    }

    let combinator1 = combinators1.first().copied();
    let combinator2 = combinators2.first().copied();
    match (combinator1, combinator2) {
        (Some(c1), Some(c2)) => {
            let compound1 = match queue1.pop_back() {
                Some(ComplexComponent::Compound(c)) => c,
                _ => return false,
            };
            let compound2 = match queue2.pop_back() {
                Some(ComplexComponent::Compound(c)) => c,
                _ => return false,
            };

            use Combinator::*;
            match (c1, c2) {
                (FollowingSibling, FollowingSibling) => {
                    if compound_is_superselector(&compound1, &compound2, &[]) {
                        result.push_front(vec![seq(&[
                            compound(&compound2),
                            comb(FollowingSibling),
                        ])]);
                    } else if compound_is_superselector(&compound2, &compound1, &[]) {
                        result.push_front(vec![seq(&[
                            compound(&compound1),
                            comb(FollowingSibling),
                        ])]);
                    } else {
                        let mut choices = vec![
                            seq(&[
                                compound(&compound1),
                                comb(FollowingSibling),
                                compound(&compound2),
                                comb(FollowingSibling),
                            ]),
                            seq(&[
                                compound(&compound2),
                                comb(FollowingSibling),
                                compound(&compound1),
                                comb(FollowingSibling),
                            ]),
                        ];
                        if let Some(unified) =
                            unify_compound(&compound1.components, &compound2.components)
                        {
                            choices.push(seq(&[compound(&unified), comb(FollowingSibling)]));
                        }
                        result.push_front(choices);
                    }
                }
                (FollowingSibling, NextSibling) | (NextSibling, FollowingSibling) => {
                    let (following, next) = if c1 == FollowingSibling {
                        (&compound1, &compound2)
                    } else {
                        (&compound2, &compound1)
                    };
                    if compound_is_superselector(following, next, &[]) {
                        result.push_front(vec![seq(&[compound(next), comb(NextSibling)])]);
                    } else {
                        let mut choices = vec![seq(&[
                            compound(following),
                            comb(FollowingSibling),
                            compound(next),
                            comb(NextSibling),
                        ])];
                        if let Some(unified) =
                            unify_compound(&compound1.components, &compound2.components)
                        {
                            choices.push(seq(&[compound(&unified), comb(NextSibling)]));
                        }
                        result.push_front(choices);
                    }
                }
                (Child, NextSibling) | (Child, FollowingSibling) => {
                    result.push_front(vec![seq(&[compound(&compound2), comb(c2)])]);
                    queue1.push_back(compound(&compound1));
                    queue1.push_back(comb(Child));
                }
                (NextSibling, Child) | (FollowingSibling, Child) => {
                    result.push_front(vec![seq(&[compound(&compound1), comb(c1)])]);
                    queue2.push_back(compound(&compound2));
                    queue2.push_back(comb(Child));
                }
                (a, b) if a == b => {
                    let unified =
                        match unify_compound(&compound1.components, &compound2.components) {
                            Some(u) => u,
                            None => return false,
                        };
                    result.push_front(vec![seq(&[compound(&unified), comb(a)])]);
                }
                _ => return false,
            }
            merge_final_combinators(queue1, queue2, result)
        }
        (Some(c1), None) => {
            if c1 == Combinator::Child && !queue2.is_empty() {
                let remove = match (queue1.back(), queue2.back()) {
                    (
                        Some(ComplexComponent::Compound(back1)),
                        Some(ComplexComponent::Compound(back2)),
                    ) => compound_is_superselector(back2, back1, &[]),
                    _ => false,
                };
                if remove {
                    queue2.pop_back();
                }
            }
            let back = match queue1.pop_back() {
                Some(c @ ComplexComponent::Compound(_)) => c,
                _ => return false,
            };
            result.push_front(vec![vec![back, comb(c1)]]);
            merge_final_combinators(queue1, queue2, result)
        }
        (None, Some(c2)) => {
            if c2 == Combinator::Child && !queue1.is_empty() {
                let remove = match (queue1.back(), queue2.back()) {
                    (
                        Some(ComplexComponent::Compound(back1)),
                        Some(ComplexComponent::Compound(back2)),
                    ) => compound_is_superselector(back1, back2, &[]),
                    _ => false,
                };
                if remove {
                    queue1.pop_back();
                }
            }
            let back = match queue2.pop_back() {
                Some(c @ ComplexComponent::Compound(_)) => c,
                _ => return false,
            };
            result.push_front(vec![vec![back, comb(c2)]]);
            merge_final_combinators(queue1, queue2, result)
        }
        (None, None) => true,
    }
}

fn compound(c: &CompoundSelector) -> Component {
    ComplexComponent::Compound(c.clone())
}

fn comb(c: Combinator) -> Component {
    ComplexComponent::Combinator(c)
}

fn seq(components: &[Component]) -> Vec<Component> {
    components.to_vec()
}

/// Groups components such that no group contains two adjacent compounds:
/// each group is one compound plus the combinator run that follows it.
fn group_selectors(components: &[Component]) -> VecDeque<Group> {
    let mut groups: VecDeque<Group> = VecDeque::new();
    let mut group: Group = Vec::new();
    let mut last_was_compound = false;
    for component in components {
        match component {
            ComplexComponent::Compound(_) => {
                if last_was_compound {
                    groups.push_back(std::mem::take(&mut group));
                }
                group.push(component.clone());
                last_was_compound = true;
            }
            ComplexComponent::Combinator(_) => {
                group.push(component.clone());
                last_was_compound = false;
            }
        }
    }
    if !group.is_empty() {
        groups.push_back(group);
    }
    groups
}

/// Returns the orderings of the initial subsequences of the two queues, as
/// bounded by `done`; destructively consumes those subsequences.
fn chunks<F: Fn(&VecDeque<Group>) -> bool>(
    queue1: &mut VecDeque<Group>,
    queue2: &mut VecDeque<Group>,
    done: F,
) -> Vec<Vec<Group>> {
    let mut chunk1 = Vec::new();
    while !done(queue1) {
        if let Some(group) = queue1.pop_front() {
            chunk1.push(group);
        } else {
            break;
        }
    }
    let mut chunk2 = Vec::new();
    while !done(queue2) {
        if let Some(group) = queue2.pop_front() {
            chunk2.push(group);
        } else {
            break;
        }
    }

    match (chunk1.is_empty(), chunk2.is_empty()) {
        (true, true) => vec![],
        (true, false) => vec![chunk2],
        (false, true) => vec![chunk1],
        (false, false) => {
            let mut order1 = chunk1.clone();
            order1.extend(chunk2.iter().cloned());
            let mut order2 = chunk2;
            order2.extend(chunk1);
            vec![order1, order2]
        }
    }
}

/// The Cartesian product of the choice sets.
pub fn paths<T: Clone>(choices: &[Vec<T>]) -> Vec<Vec<T>> {
    choices.iter().fold(vec![Vec::new()], |acc, choice_set| {
        let mut out = Vec::with_capacity(acc.len() * choice_set.len());
        for path in &acc {
            for choice in choice_set {
                let mut extended = path.clone();
                extended.push(choice.clone());
                out.push(extended);
            }
        }
        out
    })
}

/// Longest common subsequence under a custom comparison that also selects
/// the element to keep when two inputs "match" without being equal.
fn longest_common_subsequence<T: Clone>(
    x: &[T],
    y: &[T],
    select: &dyn Fn(&T, &T) -> Option<T>,
) -> Vec<T> {
    let m = x.len();
    let n = y.len();
    if m == 0 || n == 0 {
        return Vec::new();
    }

    let mut lengths = vec![vec![0usize; n + 1]; m + 1];
    let mut selections: Vec<Vec<Option<T>>> = vec![vec![None; n]; m];
    for i in 1..=m {
        for j in 1..=n {
            selections[i - 1][j - 1] = select(&x[i - 1], &y[j - 1]);
            lengths[i][j] = if selections[i - 1][j - 1].is_some() {
                lengths[i - 1][j - 1] + 1
            } else {
                lengths[i - 1][j].max(lengths[i][j - 1])
            };
        }
    }

    let mut result = Vec::with_capacity(lengths[m][n]);
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if let Some(selected) = &selections[i - 1][j - 1] {
            result.push(selected.clone());
            i -= 1;
            j -= 1;
        } else if lengths[i - 1][j] > lengths[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorParser;

    fn complex(s: &str) -> Vec<Component> {
        SelectorParser::parse_from_text(s).unwrap().components[0]
            .components
            .clone()
    }

    fn render(results: &[Vec<Component>]) -> Vec<String> {
        results
            .iter()
            .map(|components| {
                crate::selector::ComplexSelector::new(components.clone()).to_string()
            })
            .collect()
    }

    #[test]
    fn lcs_of_identical_is_identity() {
        let lcs = longest_common_subsequence(&[1, 2, 3], &[1, 2, 3], &|a, b| {
            if a == b {
                Some(*a)
            } else {
                None
            }
        });
        assert_eq!(lcs, vec![1, 2, 3]);
    }

    #[test]
    fn lcs_skips_mismatches() {
        let lcs = longest_common_subsequence(&[1, 9, 2], &[1, 2, 7], &|a, b| {
            if a == b {
                Some(*a)
            } else {
                None
            }
        });
        assert_eq!(lcs, vec![1, 2]);
    }

    #[test]
    fn paths_is_cartesian() {
        let result = paths(&[vec![1, 2], vec![10], vec![100, 200]]);
        assert_eq!(result.len(), 4);
        assert!(result.contains(&vec![1, 10, 100]));
        assert!(result.contains(&vec![2, 10, 200]));
    }

    #[test]
    fn groups_split_between_adjacent_compounds() {
        // A group is a compound plus the combinator run binding it to the
        // next one; splits happen only where two compounds are adjacent.
        let components = complex("a b > c d + e ~ f");
        let groups = group_selectors(&components);
        let rendered: Vec<String> = groups
            .iter()
            .map(|g| crate::selector::ComplexSelector::new(g.clone()).to_string())
            .collect();
        assert_eq!(rendered, vec!["a", "b > c", "d + e ~ f"]);
    }

    #[test]
    fn weave_of_single_is_identity() {
        let woven = weave(&[complex("a b")]);
        assert_eq!(render(&woven), vec!["a b"]);
    }

    #[test]
    fn weave_produces_both_interleavings() {
        // The first sequence is the accumulated prefix; following sequences
        // contribute their parents woven in plus their trailing compound.
        let woven = weave(&[complex(".a"), complex(".b .x")]);
        let rendered = render(&woven);
        assert!(rendered.contains(&".a .b .x".to_string()), "{:?}", rendered);
        assert!(rendered.contains(&".b .a .x".to_string()), "{:?}", rendered);
    }

    #[test]
    fn weave_shares_common_parents() {
        let woven = weave(&[complex(".p .a"), complex(".p .b .x")]);
        let rendered = render(&woven);
        // The shared `.p` prefix is not duplicated in any ordering.
        assert!(rendered.iter().any(|s| s == ".p .a .b .x"), "{:?}", rendered);
        assert!(rendered.iter().any(|s| s == ".p .b .a .x"), "{:?}", rendered);
        assert!(
            rendered.iter().all(|s| !s.contains(".p .a .p") && !s.contains(".p .b .p")),
            "{:?}",
            rendered
        );
    }

    #[test]
    fn woven_results_keep_the_target_constraint() {
        use crate::selector::complex_is_superselector;
        // The second complex contributes its parents and its target; every
        // result must still be matched only by elements its tail matches.
        let a = complex(".a > .b");
        let b = complex(".c .x");
        let woven = weave(&[a, b.clone()]);
        assert!(!woven.is_empty());
        for result in woven {
            assert!(
                complex_is_superselector(&b, &result),
                "{} should cover {}",
                crate::selector::ComplexSelector::new(b.clone()),
                crate::selector::ComplexSelector::new(result.clone())
            );
        }
    }

    #[test]
    fn child_combinators_must_match() {
        // `a > x` and `b ~ x` cannot share the trailing compound silently;
        // merging keeps both constraints.
        let woven = weave(&[complex(".a > .x"), complex(".b .x")]);
        for rendered in render(&woven) {
            assert!(rendered.contains("> .x"), "{}", rendered);
        }
    }
}
