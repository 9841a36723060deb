//! In-memory integration tests for queued Web Push delivery.

use super::helpers::{
    ADMIN, ASSIGNEE, CLICK_BASE_URL, COLLEAGUE, ScriptedTransport, create_task, desk,
    registration,
};
use taskdesk::identity::domain::Actor;
use taskdesk::push::domain::DeliveryOutcome;
use taskdesk::task::domain::{ReassignmentDecision, TaskStatus, TransitionDetails};

const PHONE: &str = "https://push.example.net/send/phone";
const LAPTOP: &str = "https://push.example.net/send/laptop";
const DESKTOP: &str = "https://push.example.net/send/desktop";

#[tokio::test(flavor = "multi_thread")]
async fn gone_endpoints_are_deactivated_while_others_receive_the_push() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::answering(&[(LAPTOP, 410)]));
    desk.subscriptions
        .register(ASSIGNEE, registration(PHONE))
        .await?;
    desk.subscriptions
        .register(ASSIGNEE, registration(LAPTOP))
        .await?;

    let task_id = create_task(&desk, "Flush condenser lines").await;
    desk.drain_push_queue().await;

    let entries = desk.delivery_log.entries()?;
    eyre::ensure!(entries.len() == 2, "one attempt per subscription");
    let outcome_for = |endpoint: &str| {
        entries
            .iter()
            .find(|entry| entry.endpoint == endpoint)
            .map(|entry| entry.outcome)
    };
    eyre::ensure!(
        outcome_for(PHONE) == Some(DeliveryOutcome::Delivered),
        "phone should be delivered"
    );
    eyre::ensure!(
        outcome_for(LAPTOP) == Some(DeliveryOutcome::Gone),
        "laptop should be gone"
    );

    let laptop = desk
        .subscriptions
        .find_by_endpoint(LAPTOP)
        .await?
        .ok_or_else(|| eyre::eyre!("laptop subscription should still exist"))?;
    eyre::ensure!(!laptop.is_active(), "gone endpoint should be deactivated");
    let phone = desk
        .subscriptions
        .find_by_endpoint(PHONE)
        .await?
        .ok_or_else(|| eyre::eyre!("phone subscription should exist"))?;
    eyre::ensure!(phone.is_active(), "phone should stay active");
    eyre::ensure!(phone.last_used_at().is_some(), "delivery should touch it");

    let active = desk.subscriptions.list_active(ASSIGNEE).await?;
    eyre::ensure!(active.len() == 1, "only the phone remains active");

    let expected_url = format!("{CLICK_BASE_URL}/tasks/{task_id}");
    for (_, message) in desk.transport.sent() {
        eyre::ensure!(message.data.url == expected_url, "click-through url");
        eyre::ensure!(message.title == "New task assigned", "title should match");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn push_payload_matches_the_committed_inbox_entry() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    desk.subscriptions
        .register(ASSIGNEE, registration(PHONE))
        .await?;

    create_task(&desk, "Replace belt drive").await;
    desk.drain_push_queue().await;

    let unread = desk.inbox.list_unread(ASSIGNEE).await?;
    let [notification] = unread.as_slice() else {
        eyre::bail!("expected one inbox entry, found {}", unread.len());
    };
    let sent = desk.transport.sent();
    let [(endpoint, message)] = sent.as_slice() else {
        eyre::bail!("expected one push, found {}", sent.len());
    };
    eyre::ensure!(endpoint == PHONE, "push should go to the phone");
    eyre::ensure!(
        message.data.notification_id == notification.id().value(),
        "push should reference the inbox entry"
    );
    eyre::ensure!(message.body == notification.message(), "body should match");
    eyre::ensure!(
        message.data.related_type.as_deref() == Some("task"),
        "push should carry the related entity type"
    );

    let entries = desk.delivery_log.entries()?;
    let [entry] = entries.as_slice() else {
        eyre::bail!("expected one delivery log entry");
    };
    eyre::ensure!(
        entry.notification_id == Some(notification.id()),
        "log should reference the notification"
    );
    eyre::ensure!(entry.recipient == ASSIGNEE, "log should name the user");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn self_initiated_changes_send_no_push() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    desk.subscriptions
        .register(ASSIGNEE, registration(PHONE))
        .await?;
    let task_id = create_task(&desk, "Bleed radiators").await;

    for target in [TaskStatus::OnProgress, TaskStatus::Done] {
        desk.engine
            .transition(
                task_id,
                Actor::user(ASSIGNEE),
                target,
                TransitionDetails::default(),
            )
            .await?;
    }
    desk.drain_push_queue().await;

    eyre::ensure!(
        desk.transport.sent().len() == 1,
        "only the creation notice should be pushed"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn approved_reassignment_pushes_to_both_users() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    desk.subscriptions
        .register(ASSIGNEE, registration(PHONE))
        .await?;
    desk.subscriptions
        .register(COLLEAGUE, registration(DESKTOP))
        .await?;
    let task_id = create_task(&desk, "Replace thermostat").await;
    let request = desk
        .workflow
        .request(task_id, Actor::user(ASSIGNEE), COLLEAGUE, "Off site")
        .await?;
    desk.workflow
        .resolve(
            request.id(),
            Actor::admin(ADMIN),
            ReassignmentDecision::Approve,
            None,
        )
        .await?;
    desk.drain_push_queue().await;

    let sent = desk.transport.sent();
    let to_phone = sent.iter().filter(|(endpoint, _)| endpoint == PHONE).count();
    let to_desktop = sent
        .iter()
        .filter(|(endpoint, _)| endpoint == DESKTOP)
        .count();
    eyre::ensure!(to_phone == 2, "creation and approval notices, got {to_phone}");
    eyre::ensure!(to_desktop == 1, "reassignment notice, got {to_desktop}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rotated_subscription_receives_later_pushes() -> eyre::Result<()> {
    let desk = desk(ScriptedTransport::default());
    desk.subscriptions
        .register(ASSIGNEE, registration(PHONE))
        .await?;
    desk.subscriptions
        .rotate(PHONE, ASSIGNEE, registration(LAPTOP))
        .await?;

    create_task(&desk, "Check fire dampers").await;
    desk.drain_push_queue().await;

    let endpoints: Vec<_> = desk
        .transport
        .sent()
        .into_iter()
        .map(|(endpoint, _)| endpoint)
        .collect();
    eyre::ensure!(endpoints == vec![LAPTOP.to_owned()], "got {endpoints:?}");
    Ok(())
}
