//! JSONL persistence for in-memory storage.
//!
//! The first line holds the id counters. Each following line is one task. The
//! task's outgoing dependency edges are embedded in the same line, so a file
//! always describes a closed graph:
//!
//! ```text
//! {"counters":{"last_task_id":3,"last_dependency_id":2}}
//! {"id":1,"title":"Write report",...,"dependencies":[]}
//! {"id":2,"title":"Review report",...,"dependencies":[{"id":1,"depends_on_task_id":1,"created_at":"..."}]}
//! ```

use super::graph::has_path;
use super::new_store;
use crate::domain::{Dependency, DependencyId, Task, TaskFilter, TaskId};
use crate::error::{Error, Result};
use crate::storage::{IdCounters, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// Leading line of the JSONL file.
///
/// Files without it still load; their counters are derived from the highest
/// ids present.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeaderRecord {
    counters: IdCounters,
}

/// One task line of the JSONL file.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    #[serde(flatten)]
    task: Task,

    #[serde(default)]
    dependencies: Vec<EdgeRecord>,
}

/// A dependency edge stored on the line of its dependent task.
#[derive(Debug, Serialize, Deserialize)]
struct EdgeRecord {
    id: DependencyId,
    depends_on_task_id: TaskId,
    created_at: DateTime<Utc>,
}

/// Warnings that can occur during JSONL file loading.
///
/// These are non-fatal: the offending line or edge is skipped and the rest of
/// the file is loaded. Callers should log them, since they indicate a file
/// that was edited by hand or written by something other than this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line could not be parsed as a task record.
    ///
    /// **Effect**: The line is skipped entirely.
    MalformedJson {
        /// 1-based line number in the file
        line_number: usize,
        /// Parser error
        error: String,
    },

    /// A task failed field validation.
    ///
    /// **Effect**: The task and its edges are not loaded.
    InvalidTaskData {
        /// Id of the rejected task
        task_id: TaskId,
        /// 1-based line number in the file
        line_number: usize,
        /// Validation error
        error: String,
    },

    /// A task id appears on more than one line.
    ///
    /// **Effect**: The first occurrence wins.
    DuplicateTask {
        /// The repeated id
        task_id: TaskId,
        /// 1-based line number of the ignored occurrence
        line_number: usize,
    },

    /// An edge references a task that is not in the file.
    ///
    /// **Effect**: The edge is skipped.
    OrphanedDependency {
        /// The dependent task
        task_id: TaskId,
        /// The missing target
        depends_on_task_id: TaskId,
    },

    /// An edge is a self-loop, repeats an existing pair, or reuses an edge id.
    ///
    /// **Effect**: The edge is skipped.
    InvalidDependency {
        /// The dependent task
        task_id: TaskId,
        /// The target task
        depends_on_task_id: TaskId,
    },

    /// An edge would close a cycle with edges loaded before it.
    ///
    /// **Effect**: The edge is skipped to break the cycle.
    CircularDependency {
        /// The dependent task
        task_id: TaskId,
        /// The target task
        depends_on_task_id: TaskId,
    },
}

/// Load storage from a JSONL file.
///
/// Loading runs in three passes: parse and validate every line, import the
/// tasks, then rebuild the dependency graph. Problem lines and edges are
/// skipped and reported as [`LoadWarning`]s; edges are imported in ascending
/// id order so cycle breaking always drops the most recently created edge.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read. Malformed content is never
/// an error.
pub async fn load_from_jsonl(path: &Path) -> Result<(Box<dyn Storage>, Vec<LoadWarning>)> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut warnings = Vec::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut counters = None;

    // First pass: parse and validate
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        if counters.is_none() && records.is_empty() {
            if let Ok(header) = serde_json::from_str::<HeaderRecord>(&line) {
                counters = Some(header.counters);
                continue;
            }
        }

        let record: TaskRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if let Err(error) = record.task.validate() {
            warnings.push(LoadWarning::InvalidTaskData {
                task_id: record.task.id,
                line_number,
                error,
            });
            continue;
        }

        if !seen.insert(record.task.id) {
            warnings.push(LoadWarning::DuplicateTask {
                task_id: record.task.id,
                line_number,
            });
            continue;
        }

        records.push(record);
    }

    let store = new_store();
    let mut inner = store.lock().await;

    // Second pass: tasks and graph nodes
    let mut edges = BTreeMap::new();
    let mut invalid_edges = Vec::new();
    for record in records {
        let task_id = record.task.id;
        for edge in record.dependencies {
            let dependency = Dependency {
                id: edge.id,
                task_id,
                depends_on_task_id: edge.depends_on_task_id,
                created_at: edge.created_at,
            };
            if edges.contains_key(&dependency.id) {
                invalid_edges.push(dependency);
            } else {
                edges.insert(dependency.id, dependency);
            }
        }
        inner.insert_task(record.task);
    }

    for dependency in invalid_edges {
        warnings.push(LoadWarning::InvalidDependency {
            task_id: dependency.task_id,
            depends_on_task_id: dependency.depends_on_task_id,
        });
    }

    // Third pass: edges, oldest first
    for dependency in edges.into_values() {
        let task_id = dependency.task_id;
        let depends_on_task_id = dependency.depends_on_task_id;

        if !inner.tasks.contains_key(&depends_on_task_id) {
            warnings.push(LoadWarning::OrphanedDependency {
                task_id,
                depends_on_task_id,
            });
            continue;
        }

        if task_id == depends_on_task_id || inner.find_edge(task_id, depends_on_task_id).is_some()
        {
            warnings.push(LoadWarning::InvalidDependency {
                task_id,
                depends_on_task_id,
            });
            continue;
        }

        if has_path(&inner, depends_on_task_id, task_id) {
            warnings.push(LoadWarning::CircularDependency {
                task_id,
                depends_on_task_id,
            });
            continue;
        }

        inner.insert_edge(dependency);
    }

    if let Some(counters) = counters {
        inner.restore_counters(counters);
    }

    drop(inner);

    Ok((Box::new(store), warnings))
}

/// Save storage to a JSONL file with atomic writes.
///
/// The id counters come first, then the tasks in ascending id order, each
/// with its outgoing edges in ascending edge id order. Saving the same state
/// twice produces the same bytes.
///
/// # Atomicity
///
/// The state is written to `<path>.tmp` and then renamed over `path`. If the
/// write fails, the previous file is left untouched.
pub async fn save_to_jsonl<S: Storage + ?Sized>(storage: &S, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let header = HeaderRecord {
        counters: storage.id_counters().await?,
    };
    let tasks = storage.list_tasks(&TaskFilter::default()).await?;
    let mut by_task: BTreeMap<TaskId, Vec<EdgeRecord>> = BTreeMap::new();
    for dependency in storage.all_edges().await? {
        by_task
            .entry(dependency.task_id)
            .or_default()
            .push(EdgeRecord {
                id: dependency.id,
                depends_on_task_id: dependency.depends_on_task_id,
                created_at: dependency.created_at,
            });
    }

    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    let json = serde_json::to_string(&header)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    for task in tasks {
        let dependencies = by_task.remove(&task.id).unwrap_or_default();
        let record = TaskRecord { task, dependencies };
        let json = serde_json::to_string(&record)?;

        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        Error::Storage(format!(
            "failed to replace {} with {}: {}",
            path.display(),
            temp_path.display(),
            e
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, UserId};
    use crate::storage::{DependencyStore, TaskStore};
    use tempfile::TempDir;

    async fn write_lines(dir: &TempDir, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join("tasks.jsonl");
        tokio::fs::write(&path, lines.join("\n")).await.unwrap();
        path
    }

    fn task_line(id: u64, deps: &[(u64, u64)]) -> String {
        let deps: Vec<String> = deps
            .iter()
            .map(|(edge_id, target)| {
                format!(
                    r#"{{"id":{edge_id},"depends_on_task_id":{target},"created_at":"2025-01-01T00:00:00Z"}}"#
                )
            })
            .collect();
        format!(
            r#"{{"id":{id},"title":"Task {id}","description":null,"status":"pending","due_date":null,"assigned_to":null,"created_by":1,"created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-01T00:00:00Z","dependencies":[{}]}}"#,
            deps.join(",")
        )
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.jsonl");

        let mut store = new_store();
        let a = store
            .create_task(NewTask::titled("A"), UserId(1))
            .await
            .unwrap();
        let b = store
            .create_task(NewTask::titled("B"), UserId(1))
            .await
            .unwrap();
        let edge = store.create_edge(b.id, a.id).await.unwrap();
        save_to_jsonl(&store, &path).await.unwrap();

        let (mut loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.all_edges().await.unwrap(), vec![edge]);

        // Counters continue after the highest loaded ids
        let c = loaded
            .create_task(NewTask::titled("C"), UserId(1))
            .await
            .unwrap();
        assert_eq!(c.id, TaskId(3));
        let next_edge = loaded.create_edge(c.id, a.id).await.unwrap();
        assert_eq!(next_edge.id, DependencyId(2));
    }

    #[tokio::test]
    async fn test_save_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.jsonl");
        let second = dir.path().join("second.jsonl");

        let mut store = new_store();
        for title in ["A", "B", "C"] {
            store
                .create_task(NewTask::titled(title), UserId(1))
                .await
                .unwrap();
        }
        store.create_edge(TaskId(3), TaskId(2)).await.unwrap();
        store.create_edge(TaskId(3), TaskId(1)).await.unwrap();

        save_to_jsonl(&store, &first).await.unwrap();
        save_to_jsonl(&store, &second).await.unwrap();

        let first = tokio::fs::read_to_string(&first).await.unwrap();
        let second = tokio::fs::read_to_string(&second).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.lines().count(), 4);
        assert_eq!(
            first.lines().next(),
            Some(r#"{"counters":{"last_task_id":3,"last_dependency_id":2}}"#)
        );
    }

    #[tokio::test]
    async fn test_load_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(
            &dir,
            &[task_line(1, &[]), "{not json".to_string(), task_line(2, &[])],
        )
        .await;

        let (storage, warnings) = load_from_jsonl(&path).await.unwrap();

        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedJson { line_number: 2, .. }
        ));
        let tasks = storage.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_load_skips_orphaned_and_self_edges() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(&dir, &[task_line(1, &[(1, 7), (2, 1)])]).await;

        let (storage, warnings) = load_from_jsonl(&path).await.unwrap();

        assert_eq!(
            warnings,
            vec![
                LoadWarning::OrphanedDependency {
                    task_id: TaskId(1),
                    depends_on_task_id: TaskId(7),
                },
                LoadWarning::InvalidDependency {
                    task_id: TaskId(1),
                    depends_on_task_id: TaskId(1),
                },
            ]
        );
        assert!(storage.all_edges().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_breaks_cycles_at_newest_edge() {
        let dir = TempDir::new().unwrap();
        // 1 -> 2 (edge 1), 2 -> 3 (edge 2), 3 -> 1 (edge 3) closes the cycle
        let path = write_lines(
            &dir,
            &[
                task_line(1, &[(1, 2)]),
                task_line(2, &[(2, 3)]),
                task_line(3, &[(3, 1)]),
            ],
        )
        .await;

        let (storage, warnings) = load_from_jsonl(&path).await.unwrap();

        assert_eq!(
            warnings,
            vec![LoadWarning::CircularDependency {
                task_id: TaskId(3),
                depends_on_task_id: TaskId(1),
            }]
        );
        assert_eq!(storage.all_edges().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_header_keeps_deleted_ids_retired() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(
            &dir,
            &[
                r#"{"counters":{"last_task_id":9,"last_dependency_id":4}}"#.to_string(),
                task_line(1, &[]),
                task_line(2, &[(1, 1)]),
            ],
        )
        .await;

        let (mut storage, warnings) = load_from_jsonl(&path).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            storage.id_counters().await.unwrap(),
            IdCounters {
                last_task_id: 9,
                last_dependency_id: 4,
            }
        );

        let task = storage
            .create_task(NewTask::titled("Next"), UserId(1))
            .await
            .unwrap();
        assert_eq!(task.id, TaskId(10));
        let edge = storage.create_edge(task.id, TaskId(1)).await.unwrap();
        assert_eq!(edge.id, DependencyId(5));
    }

    #[tokio::test]
    async fn test_header_never_lowers_counters() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(
            &dir,
            &[
                r#"{"counters":{"last_task_id":1,"last_dependency_id":0}}"#.to_string(),
                task_line(1, &[]),
                task_line(5, &[(3, 1)]),
            ],
        )
        .await;

        let (storage, _) = load_from_jsonl(&path).await.unwrap();

        assert_eq!(
            storage.id_counters().await.unwrap(),
            IdCounters {
                last_task_id: 5,
                last_dependency_id: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_load_rejects_duplicate_task_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_lines(&dir, &[task_line(1, &[]), task_line(1, &[])]).await;

        let (_, warnings) = load_from_jsonl(&path).await.unwrap();

        assert_eq!(
            warnings,
            vec![LoadWarning::DuplicateTask {
                task_id: TaskId(1),
                line_number: 2,
            }]
        );
    }
}
