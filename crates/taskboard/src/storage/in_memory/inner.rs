//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{Dependency, DependencyId, Task, TaskId};
use crate::storage::IdCounters;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

/// Inner storage structure (not thread-safe).
///
/// # Graph Representation
///
/// Edges are directed from **dependent to dependency** (source depends on
/// target). See the module-level documentation for details.
pub(crate) struct InMemoryStoreInner {
    /// Tasks indexed by ID, ordered for deterministic listing
    pub(super) tasks: BTreeMap<TaskId, Task>,

    /// Dependency graph.
    ///
    /// Nodes contain `TaskId` values, edges contain the `Dependency` record.
    pub(super) graph: StableDiGraph<TaskId, Dependency>,

    /// Mapping from TaskId to graph NodeIndex.
    ///
    /// Every task in `self.tasks` has exactly one entry here.
    pub(super) node_map: HashMap<TaskId, NodeIndex>,

    /// Mapping from DependencyId to graph EdgeIndex.
    ///
    /// Every edge in `self.graph` has exactly one entry here.
    pub(super) edge_map: HashMap<DependencyId, EdgeIndex>,

    /// Highest task id handed out so far
    last_task_id: u64,

    /// Highest dependency id handed out so far
    last_dependency_id: u64,
}

impl InMemoryStoreInner {
    /// Create a new empty storage instance
    pub(crate) fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            last_task_id: 0,
            last_dependency_id: 0,
        }
    }

    /// Reserve the next task id
    pub(super) fn next_task_id(&mut self) -> TaskId {
        self.last_task_id += 1;
        TaskId(self.last_task_id)
    }

    /// Reserve the next dependency id
    pub(super) fn next_dependency_id(&mut self) -> DependencyId {
        self.last_dependency_id += 1;
        DependencyId(self.last_dependency_id)
    }

    /// Current high-water marks of both id sequences
    pub(super) fn counters(&self) -> IdCounters {
        IdCounters {
            last_task_id: self.last_task_id,
            last_dependency_id: self.last_dependency_id,
        }
    }

    /// Raise the id sequences to saved high-water marks.
    ///
    /// Never lowers a counter, so ids of records loaded after the marks were
    /// written stay unique too.
    pub(super) fn restore_counters(&mut self, counters: IdCounters) {
        self.last_task_id = self.last_task_id.max(counters.last_task_id);
        self.last_dependency_id = self.last_dependency_id.max(counters.last_dependency_id);
    }

    /// Store a task and give it a graph node.
    ///
    /// Keeps the id counter ahead of imported ids.
    pub(super) fn insert_task(&mut self, task: Task) {
        let id = task.id;
        self.last_task_id = self.last_task_id.max(id.0);

        if !self.node_map.contains_key(&id) {
            let node = self.graph.add_node(id);
            self.node_map.insert(id, node);
        }
        self.tasks.insert(id, task);
    }

    /// Remove a task, its node and every edge touching it
    pub(super) fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        if let Some(node) = self.node_map.remove(&id) {
            // Drop edge ids first; removing the node removes the edges themselves
            let incident: Vec<DependencyId> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .chain(self.graph.edges_directed(node, Direction::Incoming))
                .map(|edge| edge.weight().id)
                .collect();
            for dependency_id in incident {
                self.edge_map.remove(&dependency_id);
            }
            self.graph.remove_node(node);
        }
        self.tasks.remove(&id)
    }

    /// Find the edge between two tasks, if both exist and are connected
    pub(super) fn find_edge(&self, task_id: TaskId, depends_on_task_id: TaskId) -> Option<EdgeIndex> {
        let from = self.node_map.get(&task_id)?;
        let to = self.node_map.get(&depends_on_task_id)?;
        self.graph.find_edge(*from, *to)
    }

    /// Add an edge for an existing pair of tasks.
    ///
    /// Callers check existence, duplicates and cycles first. Keeps the id
    /// counter ahead of imported ids.
    pub(super) fn insert_edge(&mut self, dependency: Dependency) {
        let from = self.node_map[&dependency.task_id];
        let to = self.node_map[&dependency.depends_on_task_id];
        let id = dependency.id;
        self.last_dependency_id = self.last_dependency_id.max(id.0);

        let edge = self.graph.add_edge(from, to, dependency);
        self.edge_map.insert(id, edge);
    }

    /// Remove an edge, returning its record
    pub(super) fn remove_edge(&mut self, edge: EdgeIndex) -> Option<Dependency> {
        let dependency = self.graph.remove_edge(edge)?;
        self.edge_map.remove(&dependency.id);
        Some(dependency)
    }
}

impl Default for InMemoryStoreInner {
    fn default() -> Self {
        Self::new()
    }
}
