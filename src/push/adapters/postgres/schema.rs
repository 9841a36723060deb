//! Diesel schema for push persistence.

diesel::table! {
    /// Browser push subscriptions, unique per endpoint.
    push_subscriptions (id) {
        /// Subscription identifier.
        id -> Int8,
        /// Owning user.
        user_id -> Nullable<Int8>,
        /// Push service endpoint URL.
        endpoint -> Text,
        /// Client P-256 public key, base64url.
        #[max_length = 255]
        p256dh -> Varchar,
        /// Client authentication secret, base64url.
        #[max_length = 255]
        auth -> Varchar,
        /// Registering browser.
        user_agent -> Nullable<Text>,
        /// Active flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest successful delivery.
        last_used_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// One row per delivery attempt.
    push_delivery_log (id) {
        /// Log entry identifier.
        id -> Int8,
        /// Delivered notification.
        notification_id -> Nullable<Int8>,
        /// Recipient user.
        recipient_id -> Int8,
        /// Target endpoint.
        endpoint -> Text,
        /// Push title.
        #[max_length = 255]
        title -> Varchar,
        /// Push body.
        body -> Text,
        /// JSON payload that was sent.
        payload -> Jsonb,
        /// `delivered`, `gone`, `rejected`, or `transient`.
        #[max_length = 20]
        outcome -> Varchar,
        /// Whether the attempt was delivered.
        success -> Bool,
        /// HTTP status returned by the push service.
        status_code -> Nullable<Int4>,
        /// Raw response or error text.
        detail -> Text,
        /// Attempt timestamp.
        sent_at -> Timestamptz,
    }
}
