//! Cycle detection for proposed dependency edges.
//!
//! Adding `task_id -> depends_on_task_id` closes a cycle exactly when
//! `depends_on_task_id` already reaches `task_id` along existing edges. The
//! search walks the graph through [`DependencyStore::outgoing_edges`] so it
//! always sees the store's current edges.

use crate::domain::TaskId;
use crate::error::Result;
use crate::storage::DependencyStore;
use std::collections::HashSet;

/// Whether adding the edge `task_id -> depends_on_task_id` would create a
/// cycle.
///
/// Depth-first search from `depends_on_task_id` with an explicit stack and a
/// visited set. Each task is expanded at most once, so the search terminates
/// even if the stored graph already contains a cycle, and costs O(V + E) over
/// the part of the graph reachable from the start.
///
/// Self-loops are expected to be rejected before this is called; for
/// `task_id == depends_on_task_id` this returns `true`.
pub async fn would_create_cycle<S>(
    store: &S,
    task_id: TaskId,
    depends_on_task_id: TaskId,
) -> Result<bool>
where
    S: DependencyStore + ?Sized,
{
    let mut stack = vec![depends_on_task_id];
    let mut visited = HashSet::new();

    while let Some(current) = stack.pop() {
        if current == task_id {
            return Ok(true);
        }
        if !visited.insert(current) {
            continue;
        }

        for next in store.outgoing_edges(current).await? {
            if !visited.contains(&next) {
                stack.push(next);
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, UserId};
    use crate::storage::in_memory::new_in_memory_storage;
    use crate::storage::{Storage, TaskStore};
    use rstest::rstest;

    async fn chain(len: usize) -> (Box<dyn Storage>, Vec<TaskId>) {
        let mut storage = new_in_memory_storage();
        let mut ids = Vec::new();
        for i in 0..len {
            let task = storage
                .create_task(NewTask::titled(format!("Task {i}")), UserId(1))
                .await
                .unwrap();
            ids.push(task.id);
        }
        for pair in ids.windows(2) {
            storage.create_edge(pair[0], pair[1]).await.unwrap();
        }
        (storage, ids)
    }

    #[rstest]
    #[case::direct(2, 1, 0, true)]
    #[case::transitive(4, 3, 0, true)]
    #[case::middle_of_chain(5, 3, 1, true)]
    #[case::same_direction(4, 0, 3, false)]
    #[case::shortcut(4, 1, 3, false)]
    #[tokio::test]
    async fn test_chain_cases(
        #[case] len: usize,
        #[case] from: usize,
        #[case] to: usize,
        #[case] expected: bool,
    ) {
        let (storage, ids) = chain(len).await;

        let result = would_create_cycle(storage.as_ref(), ids[from], ids[to])
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_unconnected_tasks() {
        let (mut storage, ids) = chain(2).await;
        let loner = storage
            .create_task(NewTask::titled("Loner"), UserId(1))
            .await
            .unwrap();

        assert!(!would_create_cycle(storage.as_ref(), loner.id, ids[0]).await.unwrap());
        assert!(!would_create_cycle(storage.as_ref(), ids[1], loner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_diamond_is_not_a_cycle() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let (mut storage, _) = chain(0).await;
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(
                storage
                    .create_task(NewTask::titled(format!("D{i}")), UserId(1))
                    .await
                    .unwrap()
                    .id,
            );
        }
        storage.create_edge(ids[0], ids[1]).await.unwrap();
        storage.create_edge(ids[0], ids[2]).await.unwrap();
        storage.create_edge(ids[1], ids[3]).await.unwrap();

        assert!(!would_create_cycle(storage.as_ref(), ids[2], ids[3]).await.unwrap());
        assert!(would_create_cycle(storage.as_ref(), ids[3], ids[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_terminates_on_existing_cycle() {
        // The store does not check acyclicity, so a cycle can be planted directly
        let (mut storage, ids) = chain(3).await;
        storage.create_edge(ids[2], ids[0]).await.unwrap();
        let outsider = storage
            .create_task(NewTask::titled("Outsider"), UserId(1))
            .await
            .unwrap();

        let result = would_create_cycle(storage.as_ref(), outsider.id, ids[0])
            .await
            .unwrap();

        assert!(!result);
    }
}
