mod common;

use futures::join;
use taskdeck::application::tasks::{
    CreateTaskCommand, TaskError, Transition, UpdateTaskCommand,
};
use taskdeck::domain::tasks::LifecycleState;

use common::{Harness, harness};

async fn seeded(h: &Harness, title: &str) -> i64 {
    h.service
        .create(CreateTaskCommand {
            title: title.to_string(),
            done: false,
            due_at: None,
        })
        .await
        .expect("create")
        .id
}

async fn trashed(h: &Harness, title: &str) -> i64 {
    let id = seeded(h, title).await;
    h.service.soft_delete(id).await.expect("soft delete");
    id
}

fn rename(id: i64, title: &str) -> UpdateTaskCommand {
    UpdateTaskCommand {
        id,
        title: title.to_string(),
        done: false,
        due_at: None,
    }
}

#[tokio::test]
async fn toggle_racing_soft_delete_leaves_task_trashed() {
    let h = harness();
    let id = seeded(&h, "Water plants").await;

    h.store.arm_write_gate(2);
    let (deleted, toggled) = join!(h.service.soft_delete(id), h.service.toggle(id));

    assert_eq!(deleted.expect("soft delete"), Transition::Applied);
    assert!(toggled.expect("toggle").is_done);

    let row = h.store.row(id).await.expect("row kept");
    assert!(row.state().is_trashed());
    assert!(row.done);

    let cached = h.service.show(id).await.expect("show");
    assert!(cached.is_done);
    assert!(h.service.list_trashed().await.expect("trash").iter().any(|t| t.task.id == id));
}

#[tokio::test]
async fn edit_racing_soft_delete_leaves_task_trashed() {
    let h = harness();
    let id = seeded(&h, "Pay rent").await;

    h.store.arm_write_gate(2);
    let (deleted, edited) = join!(
        h.service.soft_delete(id),
        h.service.edit(rename(id, "Pay rent early"))
    );

    assert_eq!(deleted.expect("soft delete"), Transition::Applied);
    assert_eq!(edited.expect("edit").title, "Pay rent early");

    let row = h.store.row(id).await.expect("row kept");
    assert!(row.state().is_trashed());
    assert_eq!(row.title, "Pay rent early");
}

#[tokio::test]
async fn purge_racing_restore_never_reports_a_restored_task_as_gone() {
    let h = harness();
    let id = trashed(&h, "Old receipts").await;

    h.store.arm_write_gate(2);
    let (purged, restored) = join!(h.service.purge(id), h.service.restore(id));

    match h.store.row(id).await {
        None => {
            assert_eq!(purged.expect("purge"), Transition::Applied);
            assert!(matches!(restored, Err(TaskError::NotFound { id: missing }) if missing == id));
            assert!(matches!(h.service.show(id).await, Err(TaskError::NotFound { .. })));
        }
        Some(row) => {
            assert_eq!(restored.expect("restore"), Transition::Applied);
            assert_eq!(purged.expect("purge"), Transition::Skipped);
            assert_eq!(row.state(), LifecycleState::Active);
        }
    }
}

#[tokio::test]
async fn edit_racing_restore_keeps_both_changes() {
    let h = harness();
    let id = trashed(&h, "Book dentist").await;

    h.store.arm_write_gate(2);
    let (edited, restored) = join!(
        h.service.edit(rename(id, "Book dentist for May")),
        h.service.restore(id)
    );

    edited.expect("edit");
    assert_eq!(restored.expect("restore"), Transition::Applied);

    let row = h.store.row(id).await.expect("row kept");
    assert_eq!(row.state(), LifecycleState::Active);
    assert_eq!(row.title, "Book dentist for May");

    let shown = h.service.show(id).await.expect("show");
    assert_eq!(shown.title, "Book dentist for May");
}
