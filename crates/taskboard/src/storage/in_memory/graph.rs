//! Dependency graph queries over the in-memory adjacency index.

use super::inner::InMemoryStoreInner;
use crate::domain::{Dependency, TaskId};
use crate::error::{Error, Result};
use petgraph::algo;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Edge records touching a task in one direction.
///
/// `Outgoing` yields the task's dependencies ordered by target id,
/// `Incoming` its dependents ordered by source id.
pub(super) fn edges_of(
    inner: &InMemoryStoreInner,
    id: TaskId,
    direction: Direction,
) -> Result<Vec<Dependency>> {
    let node = inner
        .node_map
        .get(&id)
        .ok_or(Error::TaskNotFound(id))?;

    let mut edges: Vec<Dependency> = inner
        .graph
        .edges_directed(*node, direction)
        .map(|edge| edge.weight().clone())
        .collect();

    match direction {
        Direction::Outgoing => edges.sort_by_key(|dep| dep.depends_on_task_id),
        Direction::Incoming => edges.sort_by_key(|dep| dep.task_id),
    }

    Ok(edges)
}

/// Whether `from` already reaches `to` along existing edges.
///
/// Used while importing persisted edges, where the graph is being rebuilt in
/// one pass and has no store to query.
pub(super) fn has_path(inner: &InMemoryStoreInner, from: TaskId, to: TaskId) -> bool {
    match (inner.node_map.get(&from), inner.node_map.get(&to)) {
        (Some(from_node), Some(to_node)) => {
            algo::has_path_connecting(&inner.graph, *from_node, *to_node, None)
        }
        _ => false,
    }
}
