//! Diesel schema for Kanban persistence.

diesel::table! {
    /// Kanban boards.
    kanban_boards (id) {
        /// Board identifier.
        id -> Uuid,
        /// Board name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Optional linked project.
        project_id -> Nullable<Uuid>,
        /// Active flag; boards are deactivated instead of deleted.
        is_active -> Bool,
        /// Creating user.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Board columns; `(board_id, position)` is unique at commit.
    kanban_columns (id) {
        /// Column identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Display name.
        #[max_length = 100]
        name -> Varchar,
        /// Status label mirrored onto tasks.
        #[max_length = 50]
        status_label -> Varchar,
        /// Zero-based display position.
        position -> Int4,
        /// Display color.
        #[max_length = 7]
        color -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks; `(column_id, position)` is unique at commit.
    kanban_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Current column.
        column_id -> Uuid,
        /// Human-readable code.
        #[max_length = 20]
        task_code -> Varchar,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Status label copied from the column.
        #[max_length = 50]
        status -> Varchar,
        /// Priority.
        #[max_length = 20]
        priority -> Varchar,
        /// One-based position inside the column.
        position -> Int4,
        /// Optional assignee.
        assignee -> Nullable<Uuid>,
        /// Optional due date.
        due_date -> Nullable<Date>,
        /// Whether moves are rejected.
        is_locked -> Bool,
        /// Creating user.
        created_by -> Uuid,
        /// Last user to change the task.
        updated_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task transition log.
    kanban_task_history (id) {
        /// Insertion order.
        seq -> Int8,
        /// Entry identifier.
        id -> Uuid,
        /// Described task.
        task_id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Trigger of the transition.
        #[max_length = 20]
        source -> Varchar,
        /// Status before.
        #[max_length = 50]
        old_status -> Nullable<Varchar>,
        /// Status after.
        #[max_length = 50]
        new_status -> Varchar,
        /// Column before.
        old_column_id -> Nullable<Uuid>,
        /// Column after.
        new_column_id -> Uuid,
        /// Position before.
        old_position -> Nullable<Int4>,
        /// Position after.
        new_position -> Int4,
        /// Acting user.
        changed_by -> Uuid,
        /// Transition timestamp.
        changed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Board memberships.
    kanban_board_members (board_id, user_id) {
        /// Board identifier.
        board_id -> Uuid,
        /// Member user identifier.
        user_id -> Uuid,
        /// Member role.
        #[max_length = 20]
        role -> Varchar,
        /// Join timestamp.
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Time logged against tasks.
    kanban_time_logs (id) {
        /// Insertion order.
        seq -> Int8,
        /// Entry identifier.
        id -> Uuid,
        /// Task the time was spent on.
        task_id -> Uuid,
        /// User who spent the time.
        user_id -> Uuid,
        /// Duration in minutes.
        minutes -> Int4,
        /// Optional note.
        note -> Nullable<Text>,
        /// Entry timestamp.
        logged_at -> Timestamptz,
    }
}

diesel::joinable!(kanban_columns -> kanban_boards (board_id));
diesel::joinable!(kanban_tasks -> kanban_columns (column_id));
diesel::joinable!(kanban_task_history -> kanban_tasks (task_id));
diesel::joinable!(kanban_board_members -> kanban_boards (board_id));
diesel::joinable!(kanban_time_logs -> kanban_tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    kanban_boards,
    kanban_columns,
    kanban_tasks,
    kanban_task_history,
    kanban_board_members,
    kanban_time_logs,
);
