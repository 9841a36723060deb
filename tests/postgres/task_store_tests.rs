//! `PostgreSQL` integration tests for task persistence.

use super::helpers::{ADMIN, ASSIGNEE, COLLEAGUE, TestDatabase, test_database};
use chrono::NaiveDate;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskdesk::error::ErrorKind;
use taskdesk::identity::{adapters::postgres::PostgresUserDirectory, domain::Actor};
use taskdesk::notification::{
    adapters::{dispatch::NoopDispatcher, postgres::PostgresNotificationRepository},
    services::NotificationRegistry,
};
use taskdesk::task::{
    adapters::postgres::PostgresTaskStore,
    domain::{ReassignmentDecision, TaskId, TaskStatus, TransitionDetails},
    services::{CreateTaskRequest, ReassignmentWorkflow, StatusTransitionEngine},
};

type Engine =
    StatusTransitionEngine<PostgresTaskStore, PostgresUserDirectory, NoopDispatcher, DefaultClock>;
type Workflow =
    ReassignmentWorkflow<PostgresTaskStore, PostgresUserDirectory, NoopDispatcher, DefaultClock>;
type Inbox = NotificationRegistry<
    PostgresNotificationRepository,
    PostgresUserDirectory,
    NoopDispatcher,
    DefaultClock,
>;

struct Services {
    engine: Engine,
    workflow: Workflow,
    inbox: Inbox,
}

fn services(database: &TestDatabase) -> Services {
    let store = Arc::new(PostgresTaskStore::new(database.pool.clone()));
    let users = Arc::new(PostgresUserDirectory::new(database.pool.clone()));
    let dispatcher = Arc::new(NoopDispatcher);
    let clock = Arc::new(DefaultClock);
    Services {
        engine: StatusTransitionEngine::new(
            Arc::clone(&store),
            Arc::clone(&users),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
        ),
        workflow: ReassignmentWorkflow::new(
            store,
            Arc::clone(&users),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
        ),
        inbox: NotificationRegistry::new(
            Arc::new(PostgresNotificationRepository::new(database.pool.clone())),
            users,
            dispatcher,
            clock,
        ),
    }
}

fn request(title: &str) -> eyre::Result<CreateTaskRequest> {
    let scheduled_on = NaiveDate::from_ymd_opt(2026, 4, 14)
        .ok_or_else(|| eyre::eyre!("invalid scheduled date"))?;
    Ok(CreateTaskRequest::new(title, "Basement plant room", scheduled_on, ASSIGNEE)
        .with_estimated_hours(3.0))
}

async fn create(services: &Services, title: &str) -> eyre::Result<TaskId> {
    let commit = services
        .engine
        .create_task(Actor::admin(ADMIN), request(title)?)
        .await?;
    Ok(commit.task.id())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_changes_persist_with_their_history(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let services = services(&database);
    let task_id = create(&services, "Replace pressure gauge").await?;

    services
        .engine
        .transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::OnProgress,
            TransitionDetails::default(),
        )
        .await?;
    services
        .engine
        .transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::Done,
            TransitionDetails {
                comment: Some("Gauge swapped".to_owned()),
                actual_hours: Some(1.5),
            },
        )
        .await?;

    let task = services.engine.find_task(task_id).await?;
    eyre::ensure!(task.status() == TaskStatus::Done, "status should persist");
    eyre::ensure!(
        task.completion_notes() == Some("Gauge swapped"),
        "completion notes should persist"
    );
    eyre::ensure!(task.estimated_hours() == Some(3.0), "estimate should persist");

    let history = services.engine.history(task_id).await?;
    let transitions: Vec<_> = history
        .iter()
        .map(|entry| (entry.previous_status, entry.status))
        .collect();
    eyre::ensure!(
        transitions
            == vec![
                (None, TaskStatus::Pending),
                (Some(TaskStatus::Pending), TaskStatus::OnProgress),
                (Some(TaskStatus::OnProgress), TaskStatus::Done),
            ],
        "unexpected history {transitions:?}"
    );

    let unread = services.inbox.list_unread(ASSIGNEE).await?;
    eyre::ensure!(unread.len() == 1, "creation notice should be stored");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_transitions_from_the_same_status_commit_once(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let services = services(&database);
    let task_id = create(&services, "Drain expansion vessel").await?;

    let (first, second) = tokio::join!(
        services.engine.transition(
            task_id,
            Actor::user(ASSIGNEE),
            TaskStatus::OnProgress,
            TransitionDetails::default(),
        ),
        services.engine.transition(
            task_id,
            Actor::admin(ADMIN),
            TaskStatus::OnProgress,
            TransitionDetails::default(),
        ),
    );

    let failures: Vec<_> = [first, second]
        .into_iter()
        .filter_map(Result::err)
        .collect();
    let [failure] = failures.as_slice() else {
        eyre::bail!("expected exactly one loser, got {}", failures.len());
    };
    eyre::ensure!(
        failure.kind() == ErrorKind::InvalidTransition,
        "loser should see an invalid transition, got {failure:?}"
    );
    eyre::ensure!(
        services.engine.history(task_id).await?.len() == 2,
        "only the winner is logged"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_pending_reassignment_per_task_is_enforced(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let services = services(&database);
    let task_id = create(&services, "Replace expansion joint").await?;

    let first = services
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Different site")
        .await?;
    let err = services
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Asking again")
        .await
        .expect_err("second pending request must fail");
    eyre::ensure!(err.kind() == ErrorKind::Conflict, "got {err:?}");

    services
        .workflow
        .resolve(
            first.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Reject,
            Some("Stay on it".to_owned()),
        )
        .await?;
    services
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "After the audit")
        .await?;
    eyre::ensure!(
        services.workflow.list_pending().await?.len() == 1,
        "a new request may follow a resolved one"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reassignment_requests_leave_one_pending(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let services = services(&database);
    let task_id = create(&services, "Flush condenser loop").await?;

    let (first, second) = tokio::join!(
        services
            .workflow
            .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Shift swap"),
        services
            .workflow
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
        services.workflow.list_pending().await?.len() == 1,
        "exactly one request should be pending"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_reassignment_moves_the_task_atomically(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    let services = services(&database);
    let task_id = create(&services, "Service air handler").await?;
    let pending = services
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Annual leave")
        .await?;

    let commit = services
        .workflow
        .resolve(
            pending.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Approve,
            None,
        )
        .await?;
    let moved = commit
        .task
        .ok_or_else(|| eyre::eyre!("approval should return the task"))?;
    eyre::ensure!(moved.assigned_to() == COLLEAGUE, "assignee should change");

    let stored = services.engine.find_task(task_id).await?;
    eyre::ensure!(stored.assigned_to() == COLLEAGUE, "change should persist");
    eyre::ensure!(
        services.engine.tasks_assigned_to(COLLEAGUE).await?.len() == 1,
        "task should be listed for the new assignee"
    );
    eyre::ensure!(
        services.inbox.unread_count(COLLEAGUE).await? == 1,
        "new assignee should be notified"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inactive_users_cannot_receive_tasks(
    #[future(awt)] test_database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let database = test_database?;
    database.deactivate_user(ASSIGNEE)?;
    let services = services(&database);

    let err = services
        .engine
        .create_task(Actor::admin(ADMIN), request("Paint pipework")?)
        .await
        .expect_err("inactive assignee must be refused");
    eyre::ensure!(err.kind() == ErrorKind::InvalidState, "got {err:?}");
    Ok(())
}
