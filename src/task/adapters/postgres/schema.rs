//! Diesel schema for task and user persistence.

diesel::table! {
    /// Task records scoped by owning group.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning group identifier.
        #[max_length = 255]
        group_id -> Varchar,
        /// Task title.
        #[max_length = 500]
        title -> Varchar,
        /// Free-text description.
        description -> Text,
        /// Declared priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Workflow status.
        #[max_length = 20]
        status -> Varchar,
        /// Day the task is planned for.
        date_planned -> Nullable<Date>,
        /// Completion timestamp.
        date_completed -> Nullable<Timestamptz>,
        /// Urgency annotation written on overspill.
        urgency_score -> Nullable<Int2>,
        /// Category tags as a JSON array.
        labels -> Jsonb,
        /// Assigned member.
        #[max_length = 255]
        assigned_to -> Nullable<Varchar>,
        /// Discussion thread as a JSON array.
        comments -> Jsonb,
        /// Creating member.
        #[max_length = 255]
        created_by -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Users subject to daily automation.
    users (uid) {
        /// Identity-provider user identifier.
        #[max_length = 255]
        uid -> Varchar,
        /// Active group identifier.
        #[max_length = 255]
        group_id -> Nullable<Varchar>,
        /// Day automation last ran.
        last_automation_date -> Nullable<Date>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, users);
