//! When steps for task lifecycle BDD scenarios.

use super::helpers::{ADMIN, ASSIGNEE, task_for};
use super::world::{TaskLifecycleWorld, run_async};
use rstest_bdd_macros::when;
use taskdesk::identity::domain::Actor;
use taskdesk::task::domain::{ReassignmentDecision, TaskStatus, TransitionDetails};

fn parse_status(status: &str) -> Result<TaskStatus, eyre::Report> {
    TaskStatus::try_from(status).map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

fn move_task(
    world: &mut TaskLifecycleWorld,
    actor: Actor,
    status: &str,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let target = parse_status(status)?;
    let result = run_async(world.desk().engine.transition(
        task_id,
        actor,
        target,
        TransitionDetails::default(),
    ));
    world.last_transition = Some(result);
    Ok(())
}

#[when(r#"the assignee moves the task to "{status}""#)]
fn assignee_moves_task(world: &mut TaskLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    move_task(world, Actor::user(ASSIGNEE), &status)
}

#[when(r#"the admin moves the task to "{status}""#)]
fn admin_moves_task(world: &mut TaskLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    move_task(world, Actor::admin(ADMIN), &status)
}

#[when(r#"the admin rejects the request with comment "{comment}""#)]
fn admin_rejects_request(
    world: &mut TaskLifecycleWorld,
    comment: String,
) -> Result<(), eyre::Report> {
    let request_id = world
        .request_id
        .ok_or_else(|| eyre::eyre!("missing reassignment request in scenario world"))?;
    run_async(world.desk().workflow.resolve(
        request_id,
        Actor::admin(ADMIN),
        ReassignmentDecision::Reject,
        Some(comment),
    ))?;
    Ok(())
}

#[when(r#"the admin creates the task "{title}" for the assignee"#)]
fn admin_creates_task(world: &mut TaskLifecycleWorld, title: String) -> Result<(), eyre::Report> {
    let commit = run_async(
        world
            .desk()
            .engine
            .create_task(Actor::admin(ADMIN), task_for(ASSIGNEE, &title)),
    )?;
    world.task_id = Some(commit.task.id());
    run_async(world.desk().drain_push_queue());
    Ok(())
}
