//! Join linearization.
//!
//! Orders a deduplicated set of joins so that every join's source alias is
//! the root or was introduced by a join placed earlier. Among joins that are
//! ready at the same time the earliest-registered one goes first, which keeps
//! generated SQL reproducible.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::join::{JoinDescriptor, JoinSet};
use super::table::TableReference;
use crate::error::{QueryError, Result};

/// Produce a valid join sequence starting from `root`.
///
/// Fails with [`QueryError::InconsistentJoinGraph`] when a join's source is
/// never introduced, joins form a cycle, an alias is introduced twice, or an
/// alias is reused for a different physical table.
pub fn linearize<'a>(
    root: &TableReference,
    joins: impl IntoIterator<Item = &'a JoinDescriptor>,
) -> Result<Vec<JoinDescriptor>> {
    let mut set = JoinSet::new();
    set.extend(joins);

    let mut introducers: HashMap<&str, &JoinDescriptor> = HashMap::new();
    for join in set.iter() {
        if join.target.alias == root.alias {
            return Err(inconsistent(
                root,
                format!("join {} re-introduces the root alias", join),
            ));
        }
        if let Some(previous) = introducers.insert(&join.target.alias, join) {
            return Err(inconsistent(
                root,
                format!(
                    "alias '{}' introduced by both {} and {}",
                    join.target.alias, previous, join
                ),
            ));
        }
    }

    let mut introduced: HashMap<String, TableReference> = HashMap::new();
    introduced.insert(root.alias.clone(), root.clone());

    let mut remaining: Vec<&JoinDescriptor> = set.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let ready = remaining
            .iter()
            .position(|j| introduced.contains_key(&j.source.alias));
        let Some(pos) = ready else {
            return Err(inconsistent(root, diagnose(&remaining)));
        };

        let join = remaining.remove(pos);
        if let Some(known) = introduced.get(&join.source.alias) {
            if known != &join.source {
                return Err(inconsistent(
                    root,
                    format!(
                        "join {} expects alias '{}' to be {} but it is {}",
                        join, join.source.alias, join.source.table, known.table
                    ),
                ));
            }
        }
        introduced.insert(join.target.alias.clone(), join.target.clone());
        ordered.push(join.clone());
    }

    Ok(ordered)
}

fn inconsistent(root: &TableReference, reason: String) -> QueryError {
    QueryError::inconsistent_joins(root.alias.clone(), reason)
}

/// Explain why none of the remaining joins can be placed.
fn diagnose(remaining: &[&JoinDescriptor]) -> String {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for join in remaining {
        let source = *nodes
            .entry(join.source.alias.as_str())
            .or_insert_with(|| graph.add_node(join.source.alias.as_str()));
        let target = *nodes
            .entry(join.target.alias.as_str())
            .or_insert_with(|| graph.add_node(join.target.alias.as_str()));
        graph.add_edge(source, target, ());
    }

    let cycle = tarjan_scc(&graph).into_iter().find(|scc| {
        scc.len() > 1 || graph.edges_connecting(scc[0], scc[0]).next().is_some()
    });

    match cycle {
        Some(scc) => {
            let mut aliases: Vec<&str> = scc.iter().map(|idx| graph[*idx]).collect();
            aliases.sort_unstable();
            format!("joins form a cycle between aliases {}", aliases.join(", "))
        }
        None => format!(
            "join {} depends on alias '{}' which is never introduced",
            remaining[0], remaining[0].source.alias
        ),
    }
}
