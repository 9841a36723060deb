//! Unit tests for the push context.


use crate::identity::domain::UserId;
use crate::notification::domain::{
    NewNotification, Notification, NotificationId, NotificationKind, RelatedEntity,
};
use crate::push::domain::SubscriptionKeys;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;

/// Syntactically valid keys; the mocked transport never encrypts.
fn sample_keys() -> SubscriptionKeys {
    let mut point = vec![0x04_u8];
    point.extend([7_u8; 64]);
    SubscriptionKeys::new(URL_SAFE_NO_PAD.encode(&point), URL_SAFE_NO_PAD.encode([9_u8; 16]))
        .expect("sample keys are valid")
}

fn task_notification(id: i64, recipient: UserId, task_id: i64) -> Notification {
    let draft = NewNotification::new(
        recipient,
        "New task assigned",
        "Ada Admin assigned you \"Replace filters\".",
        NotificationKind::Info,
    )
    .expect("valid notification")
    .with_related(RelatedEntity::task(task_id));
    Notification::from_new(NotificationId::new(id), draft, Utc::now())
}
