//! Integration tests for the task lifecycle service.

use rstest::rstest;
use taskboard::domain::{NewTask, TaskFilter, TaskId, TaskStatus, TaskUpdate, UserId};
use taskboard::error::Error;

mod common;
use common::{manager, outsider, worker, Board, WORKER_ID};

async fn assigned_task(board: &Board, title: &str) -> TaskId {
    let mut new_task = NewTask::titled(title);
    new_task.assigned_to = Some(WORKER_ID);
    board
        .tasks
        .create_task(&manager(), new_task)
        .await
        .unwrap()
        .id
}

// ========== Creation ==========

#[tokio::test]
async fn test_create_sets_creator_and_defaults() {
    let board = Board::in_memory();

    let task = board
        .tasks
        .create_task(&manager(), NewTask::titled("Quarterly report"))
        .await
        .unwrap();

    assert_eq!(task.created_by, manager().id);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.assigned_to, None);
}

#[tokio::test]
async fn test_only_managers_create() {
    let board = Board::in_memory();

    let result = board
        .tasks
        .create_task(&worker(), NewTask::titled("Sneaky"))
        .await;

    assert!(matches!(result, Err(Error::Forbidden(_))));
}

#[tokio::test]
async fn test_create_rejects_unknown_assignee() {
    let board = Board::in_memory();
    let mut new_task = NewTask::titled("Orphan");
    new_task.assigned_to = Some(UserId(404));

    let result = board.tasks.create_task(&manager(), new_task).await;

    assert!(matches!(result, Err(Error::UserNotFound(UserId(404)))));
}

#[tokio::test]
async fn test_create_rejects_blank_title() {
    let board = Board::in_memory();

    let result = board
        .tasks
        .create_task(&manager(), NewTask::titled("   "))
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
}

// ========== Visibility ==========

#[tokio::test]
async fn test_users_only_see_assigned_tasks() {
    let board = Board::in_memory();
    let mine = assigned_task(&board, "Mine").await;
    let other = board.task("Not mine").await.id;

    let visible = board
        .tasks
        .list_tasks(&worker(), TaskFilter::default())
        .await
        .unwrap();
    let visible: Vec<TaskId> = visible.iter().map(|t| t.id).collect();
    assert_eq!(visible, vec![mine]);

    let all = board
        .tasks
        .list_tasks(&manager(), TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    assert!(board.tasks.get_task(&worker(), mine).await.is_ok());
    assert!(matches!(
        board.tasks.get_task(&worker(), other).await,
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_user_filter_for_someone_else_is_empty() {
    let board = Board::in_memory();
    assigned_task(&board, "Mine").await;

    let filter = TaskFilter {
        assigned_to: Some(manager().id),
        ..Default::default()
    };
    let tasks = board.tasks.list_tasks(&worker(), filter).await.unwrap();

    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let board = Board::in_memory();
    let ids = board.task_ids(3).await;
    board
        .tasks
        .update_status(&manager(), ids[1], TaskStatus::InProgress)
        .await
        .unwrap();

    let filter = TaskFilter {
        status: Some(TaskStatus::InProgress),
        ..Default::default()
    };
    let tasks = board.tasks.list_tasks(&manager(), filter).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, ids[1]);
}

// ========== Updates ==========

#[tokio::test]
async fn test_assignee_may_only_change_status() {
    let board = Board::in_memory();
    let id = assigned_task(&board, "Mine").await;

    let rename = TaskUpdate {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        board.tasks.update_task(&worker(), id, rename).await,
        Err(Error::Forbidden(_))
    ));

    let task = board
        .tasks
        .update_task(&worker(), id, TaskUpdate::status(TaskStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_manager_reassigns_and_clears_fields() {
    let board = Board::in_memory();
    let id = assigned_task(&board, "Mine").await;

    let task = board
        .tasks
        .update_task(
            &manager(),
            id,
            TaskUpdate {
                assigned_to: Some(None),
                description: Some(Some("Details".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(task.assigned_to, None);
    assert_eq!(task.description.as_deref(), Some("Details"));
    assert!(task.updated_at >= task.created_at);

    let result = board
        .tasks
        .update_task(
            &manager(),
            id,
            TaskUpdate {
                assigned_to: Some(Some(UserId(77))),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::UserNotFound(UserId(77)))));
}

#[tokio::test]
async fn test_update_task_applies_completion_gate() {
    let board = Board::in_memory();
    let ids = board.task_ids(2).await;
    board
        .engine
        .add_dependency(&manager(), ids[0], ids[1])
        .await
        .unwrap();

    let result = board
        .tasks
        .update_task(&manager(), ids[0], TaskUpdate::status(TaskStatus::Completed))
        .await;

    assert!(matches!(result, Err(Error::IncompleteDependencies { .. })));
}

// ========== Status transitions ==========

#[rstest]
#[case::reopen_completed(TaskStatus::Completed, TaskStatus::Pending)]
#[case::cancel_completed(TaskStatus::Completed, TaskStatus::Canceled)]
#[case::complete_canceled(TaskStatus::Canceled, TaskStatus::Completed)]
#[case::start_canceled(TaskStatus::Canceled, TaskStatus::InProgress)]
#[tokio::test]
async fn test_invalid_transitions(#[case] from: TaskStatus, #[case] to: TaskStatus) {
    let board = Board::in_memory();
    let id = board.task("Task").await.id;
    board
        .tasks
        .update_status(&manager(), id, from)
        .await
        .unwrap();

    let result = board.tasks.update_status(&manager(), id, to).await;

    assert!(matches!(
        result,
        Err(Error::InvalidStatusTransition { from: f, to: t }) if f == from && t == to
    ));
}

#[tokio::test]
async fn test_same_status_is_noop() {
    let board = Board::in_memory();
    let id = board.task("Task").await.id;
    let before = board.tasks.get_task(&manager(), id).await.unwrap();

    let after = board
        .tasks
        .update_status(&manager(), id, TaskStatus::Pending)
        .await
        .unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_status_change_permissions() {
    let board = Board::in_memory();
    let id = assigned_task(&board, "Mine").await;

    assert!(board
        .tasks
        .update_status(&worker(), id, TaskStatus::InProgress)
        .await
        .is_ok());
    assert!(matches!(
        board
            .tasks
            .update_status(&outsider(), id, TaskStatus::Completed)
            .await,
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_status_change_missing_task() {
    let board = Board::in_memory();

    let result = board
        .tasks
        .update_status(&manager(), TaskId(3), TaskStatus::InProgress)
        .await;

    assert!(matches!(result, Err(Error::TaskNotFound(TaskId(3)))));
}

// ========== Deletion ==========

#[tokio::test]
async fn test_delete_removes_outgoing_edges() {
    let board = Board::in_memory();
    let ids = board.task_ids(2).await;
    board
        .engine
        .add_dependency(&manager(), ids[0], ids[1])
        .await
        .unwrap();

    board.tasks.delete_task(&manager(), ids[0]).await.unwrap();

    assert_eq!(board.edge_count().await, 0);
    assert!(matches!(
        board.tasks.get_task(&manager(), ids[0]).await,
        Err(Error::TaskNotFound(_))
    ));
}

#[tokio::test]
async fn test_only_managers_delete() {
    let board = Board::in_memory();
    let id = assigned_task(&board, "Mine").await;

    let result = board.tasks.delete_task(&worker(), id).await;

    assert!(matches!(result, Err(Error::Forbidden(_))));
}
