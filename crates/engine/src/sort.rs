//! Inheritance ordering — run this before migrating block definitions.
//!
//! Rules enforced:
//! 1. Slugs must be unique within the input.
//! 2. No definition may name itself as its parent.
//! 3. Every named parent must be part of the input.
//! 4. The parent relation must be acyclic.
//!
//! Returns the definitions ordered parent-before-child on success. Roots are
//! emitted in input order and children follow breadth-first, so the output is
//! deterministic for a given input.

use std::collections::{HashMap, VecDeque};

use crate::error::{CycleCause, EngineError};
use crate::models::BlockDefinitionSpec;

/// Anything that participates in a single-parent inheritance forest.
pub trait InheritanceNode {
    fn slug(&self) -> &str;
    fn parent_slug(&self) -> Option<&str>;
}

impl InheritanceNode for BlockDefinitionSpec {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn parent_slug(&self) -> Option<&str> {
        self.parent_slug.as_deref()
    }
}

/// Order `nodes` so that every parent precedes its children.
///
/// # Errors
/// - [`EngineError::DuplicateSlug`] if two nodes share a slug.
/// - [`EngineError::CycleDetected`] for self-references, parents missing from
///   the input, and multi-node cycles. No partial order is returned.
pub fn sort_by_inheritance<T: InheritanceNode>(nodes: &[T]) -> Result<Vec<&T>, EngineError> {
    // -----------------------------------------------------------------------
    // 1. Build the slug → index arena
    // -----------------------------------------------------------------------
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.slug(), i).is_some() {
            return Err(EngineError::DuplicateSlug(node.slug().to_owned()));
        }
    }

    // -----------------------------------------------------------------------
    // 2. Resolve parents
    // -----------------------------------------------------------------------
    let mut self_referencing = Vec::new();
    let mut orphans = Vec::new();
    let mut parent_of: Vec<Option<usize>> = Vec::with_capacity(nodes.len());

    for node in nodes {
        let parent = match node.parent_slug() {
            None => None,
            Some(parent) if parent == node.slug() => {
                self_referencing.push(node.slug().to_owned());
                None
            }
            Some(parent) => match index.get(parent) {
                Some(&p) => Some(p),
                None => {
                    orphans.push(node.slug().to_owned());
                    None
                }
            },
        };
        parent_of.push(parent);
    }

    if !self_referencing.is_empty() {
        return Err(EngineError::CycleDetected {
            slugs: self_referencing,
            cause: CycleCause::SelfReference,
        });
    }
    if !orphans.is_empty() {
        return Err(EngineError::CycleDetected {
            slugs: orphans,
            cause: CycleCause::MissingParent,
        });
    }

    // -----------------------------------------------------------------------
    // 3. Kahn's algorithm over the arena
    // -----------------------------------------------------------------------
    // Each node has at most one parent, so the in-degree is 0 or 1 and the
    // roots are exactly the nodes without one.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (child, parent) in parent_of.iter().enumerate() {
        if let Some(p) = parent {
            children[*p].push(child);
        }
    }

    let mut queue: VecDeque<usize> = parent_of
        .iter()
        .enumerate()
        .filter(|(_, parent)| parent.is_none())
        .map(|(i, _)| i)
        .collect();

    let mut visited = vec![false; nodes.len()];
    let mut sorted: Vec<&T> = Vec::with_capacity(nodes.len());

    while let Some(i) = queue.pop_front() {
        visited[i] = true;
        sorted.push(&nodes[i]);
        queue.extend(children[i].iter().copied());
    }

    // Whatever was never reached sits on a cycle or hangs below one.
    if sorted.len() != nodes.len() {
        let slugs = nodes
            .iter()
            .zip(&visited)
            .filter(|(_, seen)| !**seen)
            .map(|(node, _)| node.slug().to_owned())
            .collect();
        return Err(EngineError::CycleDetected {
            slugs,
            cause: CycleCause::Cycle,
        });
    }

    Ok(sorted)
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Def(&'static str, Option<&'static str>);

    impl InheritanceNode for Def {
        fn slug(&self) -> &str {
            self.0
        }

        fn parent_slug(&self) -> Option<&str> {
            self.1
        }
    }

    fn slugs(sorted: &[&Def]) -> Vec<&'static str> {
        sorted.iter().map(|d| d.0).collect()
    }

    fn position(order: &[&'static str], slug: &str) -> usize {
        order.iter().position(|s| *s == slug).expect("slug present")
    }

    /// Every node whose parent is in the input comes after that parent.
    fn assert_parents_first(input: &[Def], order: &[&'static str]) {
        assert_eq!(order.len(), input.len());
        for def in input {
            if let Some(parent) = def.1 {
                assert!(
                    position(order, parent) < position(order, def.0),
                    "{parent} must precede {}",
                    def.0
                );
            }
        }
    }

    #[test]
    fn chain_given_in_reverse_sorts_root_first() {
        let input = vec![
            Def("github_create_issue", Some("github-api")),
            Def("github-api", Some("bearer-api")),
            Def("bearer-api", Some("rest-api")),
            Def("rest-api", Some("http")),
            Def("http", None),
        ];

        let sorted = sort_by_inheritance(&input).expect("valid chain");
        assert_eq!(
            slugs(&sorted),
            vec!["http", "rest-api", "bearer-api", "github-api", "github_create_issue"]
        );
    }

    #[test]
    fn forest_keeps_every_parent_before_its_children() {
        //   http        llm     start
        //   /  \         |
        // rest  webhook chat
        //  |
        // bearer
        let input = vec![
            Def("bearer", Some("rest")),
            Def("chat", Some("llm")),
            Def("start", None),
            Def("webhook", Some("http")),
            Def("rest", Some("http")),
            Def("llm", None),
            Def("http", None),
        ];

        let sorted = sort_by_inheritance(&input).expect("valid forest");
        assert_parents_first(&input, &slugs(&sorted));
    }

    #[test]
    fn independent_definitions_keep_input_order() {
        let input = vec![Def("c", None), Def("a", None), Def("b", None)];
        let sorted = sort_by_inheritance(&input).unwrap();
        assert_eq!(slugs(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_input_sorts_to_empty_output() {
        let input: Vec<Def> = Vec::new();
        assert!(sort_by_inheritance(&input).unwrap().is_empty());
    }

    #[test]
    fn three_node_cycle_is_detected() {
        let input = vec![Def("a", Some("c")), Def("c", Some("b")), Def("b", Some("a"))];

        match sort_by_inheritance(&input) {
            Err(EngineError::CycleDetected { slugs, cause }) => {
                assert_eq!(cause, CycleCause::Cycle);
                assert_eq!(slugs, vec!["a", "c", "b"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn descendants_of_a_cycle_are_named_too() {
        let input = vec![
            Def("root", None),
            Def("x", Some("y")),
            Def("y", Some("x")),
            Def("leaf", Some("x")),
        ];

        match sort_by_inheritance(&input) {
            Err(EngineError::CycleDetected { slugs, .. }) => {
                assert_eq!(slugs, vec!["x", "y", "leaf"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_reference_is_detected() {
        let input = vec![Def("a", Some("a"))];
        assert!(matches!(
            sort_by_inheritance(&input),
            Err(EngineError::CycleDetected { cause: CycleCause::SelfReference, slugs })
                if slugs == vec!["a".to_string()]
        ));
    }

    #[test]
    fn missing_parent_is_reported_like_a_cycle() {
        let input = vec![Def("http", None), Def("child", Some("missing"))];
        let err = sort_by_inheritance(&input).unwrap_err();
        assert!(matches!(
            &err,
            EngineError::CycleDetected { cause: CycleCause::MissingParent, slugs }
                if slugs == &vec!["child".to_string()]
        ));
        assert!(err.to_string().contains("child"));
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let input = vec![Def("http", None), Def("http", None)];
        assert!(matches!(
            sort_by_inheritance(&input),
            Err(EngineError::DuplicateSlug(slug)) if slug == "http"
        ));
    }
}
