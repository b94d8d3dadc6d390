//! In-memory storage backend using a task map and petgraph.
//!
//! This module provides a fast, **ephemeral** storage implementation where all data
//! is held in RAM and **lost when the process exits**, unless it is wrapped by the
//! JSONL backend (see [`crate::storage::StorageBackend::Jsonl`]).
//!
//! # Persistence
//!
//! `load_from_jsonl()` and `save_to_jsonl()` move the whole state between memory
//! and a JSON Lines file. The trait's `save()` and `reload()` are no-ops here.
//!
//! # Architecture
//!
//! The implementation uses:
//! - `BTreeMap<TaskId, Task>` for lookups and id-ordered listing
//! - `petgraph::StableDiGraph` as the adjacency index of the dependency graph
//! - `HashMap<TaskId, NodeIndex>` and `HashMap<DependencyId, EdgeIndex>` to find
//!   graph nodes and edges without scanning
//! - Monotonic counters for task and dependency ids; ids are never reused
//!
//! ## Edge Direction Convention
//!
//! The dependency graph uses a **dependent -> dependency** edge direction:
//!
//! - **Edge source**: The task that has the dependency (the dependent)
//! - **Edge target**: The task being depended upon
//! - **Edge weight**: The [`Dependency`](crate::domain::Dependency) record
//!
//! If task A cannot be completed before task B, the edge is `A -> B`.
//! Outgoing edges of a node are its dependencies, incoming edges its dependents.
//!
//! A stable graph is used so that node and edge indices held in the maps stay
//! valid when other nodes and edges are removed.
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<InMemoryStoreInner>>`. Every trait
//! method acquires the mutex for its whole body, so each single call is atomic.
//!
//! # Performance Characteristics
//!
//! - Task create/read/update: O(log n)
//! - Task delete: O(d) where d is the number of edges touching the task
//! - Edge create/delete by pair: O(k) where k is the out-degree of the source
//! - Edge delete by id: O(1) lookup
//! - Neighbour queries: O(k log k)

mod graph;
mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::Storage;
use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::Mutex;

// Re-export public API
pub use jsonl::{load_from_jsonl, save_to_jsonl, LoadWarning};

/// Thread-safe in-memory storage.
///
/// This type alias wraps the inner storage in `Arc<Mutex<>>` for thread-safe
/// async access. It implements [`Storage`] via the trait implementations
/// in `trait_impl.rs`.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create a new, empty in-memory storage instance.
///
/// # Example
///
/// ```
/// use taskboard::storage::in_memory::new_in_memory_storage;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let storage = new_in_memory_storage();
///     // Use storage...
/// }
/// ```
pub fn new_in_memory_storage() -> Box<dyn Storage> {
    Box::new(new_store())
}

pub(crate) fn new_store() -> InMemoryStore {
    Arc::new(Mutex::new(InMemoryStoreInner::new()))
}
