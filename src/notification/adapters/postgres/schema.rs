//! Diesel schema for notifications.

diesel::table! {
    /// Per-user in-app notifications.
    notifications (id) {
        /// Notification identifier.
        id -> Int8,
        /// Recipient user.
        recipient_id -> Int8,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Message body.
        message -> Text,
        /// Kind: `info`, `warning`, or `success`.
        #[max_length = 20]
        kind -> Varchar,
        /// Related entity type.
        #[max_length = 50]
        related_type -> Nullable<Varchar>,
        /// Related entity identifier.
        related_id -> Nullable<Int8>,
        /// Read flag.
        is_read -> Bool,
        /// Archive flag.
        is_archived -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
