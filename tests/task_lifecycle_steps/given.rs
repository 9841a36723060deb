//! Given steps for task lifecycle BDD scenarios.

use super::helpers::{ADMIN, ASSIGNEE, COLLEAGUE, registration, task_for};
use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskdesk::identity::domain::Actor;
use taskdesk::task::domain::{TaskStatus, TransitionDetails};

#[given(r#"the admin has created the task "{title}" for the assignee"#)]
fn admin_created_task(world: &mut TaskLifecycleWorld, title: String) -> Result<(), eyre::Report> {
    let commit = run_async(
        world
            .desk()
            .engine
            .create_task(Actor::admin(ADMIN), task_for(ASSIGNEE, &title)),
    )
    .wrap_err("create task in scenario setup")?;
    world.task_id = Some(commit.task.id());
    Ok(())
}

#[given("the assignee has started the task")]
fn assignee_started_task(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    run_async(world.desk().engine.transition(
        task_id,
        Actor::user(ASSIGNEE),
        TaskStatus::OnProgress,
        TransitionDetails::default(),
    ))
    .wrap_err("start task in scenario setup")?;
    Ok(())
}

#[given(r#"the assignee has asked to hand the task to the colleague because "{reason}""#)]
fn assignee_requested_reassignment(
    world: &mut TaskLifecycleWorld,
    reason: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let request = run_async(world.desk().workflow.request(
        task_id,
        Actor::user(ASSIGNEE),
        COLLEAGUE,
        reason,
    ))
    .wrap_err("request reassignment in scenario setup")?;
    world.request_id = Some(request.id());
    Ok(())
}

#[given(r#"the assignee has subscribed from "{endpoint}""#)]
fn assignee_subscribed(
    world: &mut TaskLifecycleWorld,
    endpoint: String,
) -> Result<(), eyre::Report> {
    run_async(
        world
            .desk()
            .subscriptions
            .register(ASSIGNEE, registration(&endpoint)),
    )
    .wrap_err("register subscription in scenario setup")?;
    Ok(())
}

#[given(r#"the push service reports "{endpoint}" as gone"#)]
fn push_service_reports_gone(world: &TaskLifecycleWorld, endpoint: String) {
    world.desk().transport.answer(&endpoint, 410);
}
