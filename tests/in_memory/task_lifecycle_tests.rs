//! In-memory integration tests for the task status lifecycle.

use super::helpers::{ADMIN, ASSIGNEE, COLLEAGUE, ScriptedTransport, create_task, desk};
use taskdesk::error::ErrorKind;
use taskdesk::identity::domain::Actor;
use taskdesk::task::domain::{TaskStatus, TransitionDetails};

fn comment(text: &str) -> TransitionDetails {
    TransitionDetails {
        comment: Some(text.to_owned()),
        ..TransitionDetails::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_leaves_one_history_entry_per_change() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Replace filter bank").await;

    let steps = [
        (Actor::user(ASSIGNEE), TaskStatus::OnProgress),
        (Actor::user(ASSIGNEE), TaskStatus::OnHold),
        (Actor::user(ASSIGNEE), TaskStatus::OnProgress),
        (Actor::user(ASSIGNEE), TaskStatus::Done),
        (Actor::admin(ADMIN), TaskStatus::Approved),
    ];
    for (actor, target) in steps {
        desk.engine
            .transition(task_id, actor, target, TransitionDetails::default())
            .await?;
    }

    let task = desk.engine.find_task(task_id).await?;
    eyre::ensure!(task.status() == TaskStatus::Approved, "task should be approved");
    eyre::ensure!(task.approved_by() == Some(ADMIN), "approver should be recorded");

    let history = desk.engine.history(task_id).await?;
    let statuses: Vec<_> = history.iter().map(|entry| entry.status).collect();
    eyre::ensure!(
        statuses
            == vec![
                TaskStatus::Pending,
                TaskStatus::OnProgress,
                TaskStatus::OnHold,
                TaskStatus::OnProgress,
                TaskStatus::Done,
                TaskStatus::Approved,
            ],
        "unexpected history {statuses:?}"
    );
    for pair in history.windows(2) {
        let [before, after] = pair else {
            continue;
        };
        eyre::ensure!(
            after.previous_status == Some(before.status),
            "history entries should chain"
        );
    }

    // Assigned on creation, then approved by an admin. The assignee's own
    // moves produce no notifications.
    eyre::ensure!(
        desk.inbox.unread_count(ASSIGNEE).await? == 2,
        "assignee should have two unread notifications"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_transition_writes_nothing() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Inspect dampers").await;

    let err = desk
        .engine
        .transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::Done,
            TransitionDetails::default(),
        )
        .await
        .expect_err("pending tasks cannot jump to done");
    eyre::ensure!(err.kind() == ErrorKind::InvalidTransition, "got {err:?}");

    let task = desk.engine.find_task(task_id).await?;
    eyre::ensure!(task.status() == TaskStatus::Pending, "status must not move");
    eyre::ensure!(
        desk.engine.history(task_id).await?.len() == 1,
        "only the creation entry should exist"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn only_the_assignee_or_an_admin_moves_a_task() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Rebalance chilled water loop").await;

    let err = desk
        .engine
        .transition(
            task_id,
            Actor::user(COLLEAGUE),
            TaskStatus::OnProgress,
            TransitionDetails::default(),
        )
        .await
        .expect_err("colleague is not the assignee");
    eyre::ensure!(err.kind() == ErrorKind::Forbidden, "got {err:?}");

    desk.engine
        .transition(
            task_id,
            Actor::admin(ADMIN),
            TaskStatus::OnProgress,
            comment("Started on behalf of Sam"),
        )
        .await?;

    let unread = desk.inbox.list_unread(ASSIGNEE).await?;
    eyre::ensure!(unread.len() == 2, "creation and admin move should notify");
    eyre::ensure!(
        unread
            .iter()
            .any(|notification| notification.message().contains("Started on behalf of Sam")),
        "admin comment should reach the assignee"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn done_records_completion_notes_and_hours() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Service boiler").await;
    desk.engine
        .transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::OnProgress,
            TransitionDetails::default(),
        )
        .await?;

    let commit = desk
        .engine
        .transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::Done,
            TransitionDetails {
                comment: Some("Replaced gasket".to_owned()),
                actual_hours: Some(2.5),
            },
        )
        .await?;

    eyre::ensure!(
        commit.task.completion_notes() == Some("Replaced gasket"),
        "completion notes should be stored"
    );
    eyre::ensure!(
        commit.task.actual_hours() == Some(2.5),
        "actual hours should be stored"
    );
    eyre::ensure!(
        commit.log_entry.comment.as_deref() == Some("Replaced gasket"),
        "log entry should carry the comment"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approved_tasks_accept_no_further_transitions() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Commission pump").await;
    for (actor, target) in [
        (Actor::user(ASSIGNEE), TaskStatus::OnProgress),
        (Actor::user(ASSIGNEE), TaskStatus::Done),
        (Actor::admin(ADMIN), TaskStatus::Approved),
    ] {
        desk.engine
            .transition(task_id, actor, target, TransitionDetails::default())
            .await?;
    }

    for target in TaskStatus::ALL {
        let result = desk
            .engine
            .transition(task_id, Actor::admin(ADMIN), target, TransitionDetails::default())
            .await;
        let Err(err) = result else {
            eyre::bail!("approved task moved to {target}");
        };
        eyre::ensure!(err.kind() == ErrorKind::InvalidTransition, "got {err:?}");
    }
    Ok(())
}
