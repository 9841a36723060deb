//! In-memory integration tests for the reassignment workflow.

use super::helpers::{ADMIN, ASSIGNEE, COLLEAGUE, ScriptedTransport, create_task, desk};
use taskdesk::error::ErrorKind;
use taskdesk::identity::domain::Actor;
use taskdesk::task::domain::{AssignmentChange, ReassignmentDecision, ReassignmentStatus};

#[tokio::test(flavor = "multi_thread")]
async fn approval_moves_the_task_and_notifies_both_assignees() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Swap damper actuator").await;

    let request = desk
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "On leave next week")
        .await?;
    eyre::ensure!(
        desk.workflow.list_pending().await?.len() == 1,
        "request should be pending"
    );

    let commit = desk
        .workflow
        .resolve(
            request.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Approve,
            Some("Kim has capacity".to_owned()),
        )
        .await?;

    eyre::ensure!(
        commit.request.status() == ReassignmentStatus::Approved,
        "request should be approved"
    );
    let task = desk.engine.find_task(task_id).await?;
    eyre::ensure!(task.assigned_to() == COLLEAGUE, "task should move to Kim");

    let history = desk.engine.history(task_id).await?;
    let last = history
        .last()
        .ok_or_else(|| eyre::eyre!("history should not be empty"))?;
    eyre::ensure!(
        last.assignment
            == Some(AssignmentChange {
                from: ASSIGNEE,
                to: COLLEAGUE,
            }),
        "assignment change should be logged"
    );
    eyre::ensure!(last.changed_by == ADMIN, "admin should be the actor");

    eyre::ensure!(
        desk.inbox.unread_count(COLLEAGUE).await? == 1,
        "new assignee should be told"
    );
    // Creation notice plus the approval notice.
    eyre::ensure!(
        desk.inbox.unread_count(ASSIGNEE).await? == 2,
        "previous assignee should be told"
    );
    eyre::ensure!(
        desk.workflow.list_pending().await?.is_empty(),
        "nothing should remain pending"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn a_task_has_at_most_one_pending_request() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Clean cooling tower").await;

    desk.workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Clashes with audit")
        .await?;
    let err = desk
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Still clashes")
        .await
        .expect_err("second pending request must be refused");
    eyre::ensure!(err.kind() == ErrorKind::Conflict, "got {err:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_requests_for_one_task_leave_a_single_pending_entry() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Bleed radiators").await;

    let (first, second) = tokio::join!(
        desk.workflow
            .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Shift swap"),
        desk.workflow
            .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Covering leave"),
    );

    let outcomes = [first.map(|_| ()), second.map(|_| ())];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .filter(|err| err.kind() == ErrorKind::Conflict)
        .count();
    eyre::ensure!(
        successes == 1 && conflicts == 1,
        "expected one request and one conflict, got {outcomes:?}"
    );
    eyre::ensure!(
        desk.workflow.list_pending().await?.len() == 1,
        "exactly one request should be pending"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejection_keeps_the_assignee_and_tells_the_requester() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Recalibrate sensors").await;
    let request = desk
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Not my area")
        .await?;

    let commit = desk
        .workflow
        .resolve(
            request.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Reject,
            Some("Training booked".to_owned()),
        )
        .await?;
    eyre::ensure!(commit.task.is_none(), "rejection must not touch the task");
    eyre::ensure!(
        commit.request.admin_comment() == Some("Training booked"),
        "admin comment should be stored"
    );

    let task = desk.engine.find_task(task_id).await?;
    eyre::ensure!(task.assigned_to() == ASSIGNEE, "assignee must not change");
    eyre::ensure!(
        desk.engine.history(task_id).await?.len() == 1,
        "rejection adds no history entry"
    );
    let unread = desk.inbox.list_unread(ASSIGNEE).await?;
    eyre::ensure!(
        unread
            .iter()
            .any(|notification| notification.message().contains("Training booked")),
        "requester should see the admin comment"
    );

    let err = desk
        .workflow
        .resolve(
            request.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Approve,
            None,
        )
        .await
        .expect_err("resolved requests stay resolved");
    eyre::ensure!(err.kind() == ErrorKind::InvalidState, "got {err:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn only_the_current_assignee_may_ask_and_only_admins_decide() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    let task_id = create_task(&desk, "Label isolation valves").await;

    let err = desk
        .workflow
        .request(task_id, Actor::user(COLLEAGUE), COLLEAGUE, "I want it")
        .await
        .expect_err("colleague is not the assignee");
    eyre::ensure!(err.kind() == ErrorKind::Forbidden, "got {err:?}");

    let request = desk
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Swap shifts")
        .await?;
    let err = desk
        .workflow
        .resolve(
            request.id(),
            Actor::user(COLLEAGUE),
            ReassignmentDecision::Approve,
            None,
        )
        .await
        .expect_err("regular users cannot decide");
    eyre::ensure!(err.kind() == ErrorKind::Forbidden, "got {err:?}");
    eyre::ensure!(
        desk.workflow.find(request.id()).await?.status() == ReassignmentStatus::Pending,
        "request should still be pending"
    );
    Ok(())
}
