//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task title.
        title -> Text,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Task lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role-tagged links between users and tasks.
    task_memberships (task_id, user_id) {
        /// Linked task.
        task_id -> Uuid,
        /// Linked user.
        user_id -> Uuid,
        /// Membership role.
        #[max_length = 50]
        role -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_memberships -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_memberships);
