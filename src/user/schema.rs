use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const USERS_TABLE_V1: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("display_name", SqlType::Text, non_null = true),
        sqlite_column!("avatar_url", SqlType::Text),
        sqlite_column!("profile_url", SqlType::Text),
        sqlite_column!("country", SqlType::Text),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!("last_login_at", SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SESSION_TOKENS_TABLE_V1: Table = Table {
    name: "session_tokens",
    columns: &[
        sqlite_column!("value", SqlType::Text, is_primary_key = true),
        sqlite_column!("user_id", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!("last_used_at", SqlType::Integer),
    ],
    indices: &[("idx_session_tokens_user", "user_id")],
    unique_constraints: &[],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[USERS_TABLE_V1, SESSION_TOKENS_TABLE_V1],
    migration: None,
}];
