//! Wording of the notifications produced by task lifecycle events.

use super::TaskServiceResult;
use crate::identity::{domain::UserId, ports::UserDirectory};
use crate::notification::domain::{NewNotification, NotificationKind, RelatedEntity};
use crate::task::domain::{Task, TaskDraft, TaskStatus};
use minijinja::{Environment, context};

const TASK_ASSIGNED: &str =
    "{{ creator }} assigned you \"{{ title }}\" scheduled for {{ scheduled_on }}.";

const STATUS_UPDATED: &str = concat!(
    "{{ actor }} moved \"{{ title }}\" from {{ from }} to {{ to }}.",
    "{% if comment %} Comment: {{ comment }}{% endif %}",
);

const REASSIGNMENT_APPROVED: &str = concat!(
    "Your request to hand over \"{{ title }}\" was approved. ",
    "The task is now assigned to {{ new_assignee }}.",
    "{% if comment %} Admin comment: {{ comment }}{% endif %}",
);

const TASK_REASSIGNED: &str = "\"{{ title }}\" was reassigned to you from {{ previous }}.";

const REASSIGNMENT_REJECTED: &str = concat!(
    "Your request to reassign \"{{ title }}\" was rejected.",
    "{% if comment %} Admin comment: {{ comment }}{% endif %}",
);

/// Name used for `user` in notification text.
pub(super) async fn display_name<U: UserDirectory>(
    users: &U,
    user: UserId,
) -> TaskServiceResult<String> {
    Ok(users
        .find_by_id(user)
        .await?
        .map_or_else(|| format!("user {user}"), |found| found.display_name))
}

fn render(template: &str, ctx: minijinja::Value) -> Result<String, minijinja::Error> {
    Environment::new().render_str(template, ctx)
}

/// Creation notice for the assignee. The store links it to the new task.
pub(super) fn task_assigned(
    draft: &TaskDraft,
    creator: &str,
) -> TaskServiceResult<NewNotification> {
    let message = render(
        TASK_ASSIGNED,
        context! {
            creator => creator,
            title => draft.title(),
            scheduled_on => draft.scheduled_on().to_string(),
        },
    )?;
    Ok(NewNotification::new(
        draft.assigned_to(),
        "New task assigned",
        message,
        NotificationKind::Info,
    )?)
}

pub(super) fn status_updated(
    task: &Task,
    from: TaskStatus,
    actor: &str,
    comment: Option<&str>,
) -> TaskServiceResult<NewNotification> {
    let message = render(
        STATUS_UPDATED,
        context! {
            actor => actor,
            title => task.title(),
            from => from.label(),
            to => task.status().label(),
            comment => comment,
        },
    )?;
    let kind = match task.status() {
        TaskStatus::Approved => NotificationKind::Success,
        TaskStatus::OnHold => NotificationKind::Warning,
        TaskStatus::Pending | TaskStatus::OnProgress | TaskStatus::Done => NotificationKind::Info,
    };
    Ok(
        NewNotification::new(task.assigned_to(), "Task status updated", message, kind)?
            .with_related(RelatedEntity::task(task.id().value())),
    )
}

pub(super) fn reassignment_approved(
    task: &Task,
    previous: UserId,
    new_assignee: &str,
    comment: Option<&str>,
) -> TaskServiceResult<NewNotification> {
    let message = render(
        REASSIGNMENT_APPROVED,
        context! {
            title => task.title(),
            new_assignee => new_assignee,
            comment => comment,
        },
    )?;
    Ok(NewNotification::new(
        previous,
        "Reassignment approved",
        message,
        NotificationKind::Success,
    )?
    .with_related(RelatedEntity::task(task.id().value())))
}

pub(super) fn task_reassigned(
    task: &Task,
    new_assignee: UserId,
    previous: &str,
) -> TaskServiceResult<NewNotification> {
    let message = render(
        TASK_REASSIGNED,
        context! {
            title => task.title(),
            previous => previous,
        },
    )?;
    Ok(NewNotification::new(
        new_assignee,
        "Task reassigned to you",
        message,
        NotificationKind::Info,
    )?
    .with_related(RelatedEntity::task(task.id().value())))
}

pub(super) fn reassignment_rejected(
    task: &Task,
    requester: UserId,
    comment: Option<&str>,
) -> TaskServiceResult<NewNotification> {
    let message = render(
        REASSIGNMENT_REJECTED,
        context! {
            title => task.title(),
            comment => comment,
        },
    )?;
    Ok(NewNotification::new(
        requester,
        "Reassignment rejected",
        message,
        NotificationKind::Warning,
    )?
    .with_related(RelatedEntity::task(task.id().value())))
}
