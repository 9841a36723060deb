//! Diesel schema for user accounts.

diesel::table! {
    /// User accounts maintained by the login layer.
    users (id) {
        /// User identifier.
        id -> Int8,
        /// Display name.
        #[max_length = 255]
        display_name -> Varchar,
        /// Role, `admin` or `user`.
        #[max_length = 20]
        role -> Varchar,
        /// Whether the account is active.
        is_active -> Bool,
    }
}
