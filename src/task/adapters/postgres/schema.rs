//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Int8,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Free-text details.
        details -> Text,
        /// Scheduled calendar date.
        scheduled_on -> Date,
        /// Priority: `low`, `medium`, or `high`.
        #[max_length = 20]
        priority -> Varchar,
        /// Estimated effort in hours.
        estimated_hours -> Nullable<Float8>,
        /// Actual effort in hours.
        actual_hours -> Nullable<Float8>,
        /// Due time on the scheduled date.
        due_time -> Nullable<Time>,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Notes recorded on completion.
        completion_notes -> Nullable<Text>,
        /// Assignee.
        assigned_to -> Int8,
        /// Creator.
        created_by -> Int8,
        /// Approving admin.
        approved_by -> Nullable<Int8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail of status and assignment changes.
    status_logs (id) {
        /// Entry identifier.
        id -> Int8,
        /// Task reference.
        task_id -> Int8,
        /// Status after the change.
        #[max_length = 20]
        status -> Varchar,
        /// Status before the change.
        #[max_length = 20]
        previous_status -> Nullable<Varchar>,
        /// Acting user.
        changed_by -> Int8,
        /// Optional comment.
        comment -> Nullable<Text>,
        /// Previous assignee, for reassignment entries.
        assigned_from -> Nullable<Int8>,
        /// New assignee, for reassignment entries.
        assigned_to -> Nullable<Int8>,
        /// Change timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reassignment requests awaiting or carrying an admin decision.
    reassignment_requests (id) {
        /// Request identifier.
        id -> Int8,
        /// Task reference.
        task_id -> Int8,
        /// Requesting assignee.
        requested_by -> Int8,
        /// Proposed new assignee.
        proposed_assignee -> Int8,
        /// Reason text.
        reason -> Text,
        /// Request status: `pending`, `approved`, or `rejected`.
        #[max_length = 20]
        status -> Varchar,
        /// Handling admin.
        handled_by -> Nullable<Int8>,
        /// Admin comment.
        admin_comment -> Nullable<Text>,
        /// Request timestamp.
        requested_at -> Timestamptz,
        /// Decision timestamp.
        handled_at -> Nullable<Timestamptz>,
    }
}
