/*
 * inheritance.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Multi-parent inheritance linearization.
//!
//! Components declare their bases with `metadata.inherits`. The declared
//! relation forms a directed graph; the ancestor order for one component is
//! its C3 linearization:
//!
//! `linearize(C) = C + merge(linearize(B1), ..., linearize(Bn), [B1..Bn])`
//!
//! where `merge` repeatedly takes the head of the first candidate list whose
//! head does not appear in the tail of any other candidate list. Tie-break
//! is the standard C3 rule: the first candidate list with a legal head wins.
//! This guarantees a component always precedes anything inheriting from it,
//! a later entry in an explicit inherits-list overrides an earlier one, and
//! a shared ancestor appears exactly once.
//!
//! Precedence convention: the later an entry appears in `inherits`, the
//! higher its precedence. C3 orders most-specific first, so the merge runs
//! over the *reversed* inherits list.
//!
//! Cycles are detected with an explicit visiting-set DFS before
//! linearization runs, so C3 itself never recurses into a cycle.

use crate::error::{ResolveError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// The C3-linearized ancestor order for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceChain {
    /// The component the chain was computed for.
    pub component: String,

    /// Ancestors ordered least-specific first; the component itself is not
    /// included and has the highest precedence.
    pub ancestors: Vec<String>,
}

/// The declared inheritance relation for one component type within a stack.
#[derive(Debug, Clone, Default)]
pub struct InheritanceGraph {
    /// Stack name, for error attribution.
    stack: String,

    /// Parents per component, in declaration order, duplicates removed.
    parents: IndexMap<String, Vec<String>>,
}

impl InheritanceGraph {
    /// Create an empty graph for a stack.
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            parents: IndexMap::new(),
        }
    }

    /// Add a component with its declared inheritance list.
    ///
    /// Duplicate entries in the list are dropped, keeping the first
    /// occurrence.
    pub fn add_component(&mut self, name: impl Into<String>, inherits: &[String]) {
        let mut unique = Vec::with_capacity(inherits.len());
        for parent in inherits {
            if !unique.contains(parent) {
                unique.push(parent.clone());
            }
        }
        self.parents.insert(name.into(), unique);
    }

    /// Check whether a component is present in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    /// Compute the C3 linearization for a component.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::ComponentNotFound`] when the component or one of
    ///   its transitive bases is not in the graph;
    /// - [`ResolveError::InheritanceCycle`] when the declared relation is
    ///   cyclic;
    /// - [`ResolveError::InconsistentHierarchy`] when no legal C3 head
    ///   exists (a true MRO conflict).
    pub fn linearize(&self, component: &str) -> Result<InheritanceChain> {
        if !self.contains(component) {
            return Err(self.not_found(component));
        }

        if let Some(chain) = self.find_cycle(component) {
            return Err(ResolveError::InheritanceCycle {
                component: component.to_string(),
                chain,
            });
        }

        let mut memo = HashMap::new();
        let linearized = self.c3(component, &mut memo)?;

        // The C3 order is most-specific first; callers consume ancestors
        // least-specific first, component last.
        let ancestors = linearized.into_iter().skip(1).rev().collect();

        Ok(InheritanceChain {
            component: component.to_string(),
            ancestors,
        })
    }

    /// `linearize(C) = C + merge(linearize(parents)..., parents)`.
    fn c3(&self, component: &str, memo: &mut HashMap<String, Vec<String>>) -> Result<Vec<String>> {
        if let Some(known) = memo.get(component) {
            return Ok(known.clone());
        }

        let Some(parents) = self.parents.get(component) else {
            return Err(self.not_found(component));
        };

        // Later inherits entries have higher precedence, and C3 orders
        // most-specific first, so candidates go in reversed declaration
        // order.
        let mut candidates: Vec<Vec<String>> = Vec::with_capacity(parents.len() + 1);
        for parent in parents.iter().rev() {
            candidates.push(self.c3(parent, memo)?);
        }
        if !parents.is_empty() {
            candidates.push(parents.iter().rev().cloned().collect());
        }

        let mut result = vec![component.to_string()];
        result.extend(self.c3_merge(component, candidates)?);

        memo.insert(component.to_string(), result.clone());
        Ok(result)
    }

    /// Merge candidate linearizations by repeatedly taking the first legal
    /// head.
    fn c3_merge(&self, component: &str, mut candidates: Vec<Vec<String>>) -> Result<Vec<String>> {
        let mut merged = Vec::new();

        loop {
            candidates.retain(|candidate| !candidate.is_empty());
            if candidates.is_empty() {
                return Ok(merged);
            }

            // A head is legal when it appears in no other candidate's tail.
            let legal = candidates
                .iter()
                .map(|candidate| &candidate[0])
                .find(|head| {
                    candidates
                        .iter()
                        .all(|other| !other[1..].contains(head))
                })
                .cloned();

            let Some(head) = legal else {
                let heads = candidates
                    .iter()
                    .map(|candidate| candidate[0].clone())
                    .collect();
                return Err(ResolveError::InconsistentHierarchy {
                    component: component.to_string(),
                    candidates: heads,
                });
            };

            for candidate in &mut candidates {
                if candidate.first() == Some(&head) {
                    candidate.remove(0);
                }
            }
            merged.push(head);
        }
    }

    /// Depth-first search with an explicit visiting set.
    ///
    /// Returns the cycle chain when one is reachable from `start`.
    fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
        #[derive(PartialEq)]
        enum State {
            Visiting,
            Done,
        }

        fn visit(
            graph: &InheritanceGraph,
            node: &str,
            states: &mut HashMap<String, State>,
            trail: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            match states.get(node) {
                Some(State::Done) => return None,
                Some(State::Visiting) => {
                    let from = trail.iter().position(|n| n == node).unwrap_or(0);
                    let mut chain: Vec<String> = trail[from..].to_vec();
                    chain.push(node.to_string());
                    return Some(chain);
                }
                None => {}
            }

            states.insert(node.to_string(), State::Visiting);
            trail.push(node.to_string());

            if let Some(parents) = graph.parents.get(node) {
                for parent in parents {
                    if let Some(chain) = visit(graph, parent, states, trail) {
                        return Some(chain);
                    }
                }
            }

            trail.pop();
            states.insert(node.to_string(), State::Done);
            None
        }

        let mut states = HashMap::new();
        let mut trail = Vec::new();
        visit(self, start, &mut states, &mut trail)
    }

    fn not_found(&self, component: &str) -> ResolveError {
        ResolveError::ComponentNotFound {
            stack: self.stack.clone(),
            component: component.to_string(),
        }
    }
}
