//! SQLite schema for the reaction ledger database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Targets, likes and reviews
// =============================================================================

/// Target registry - one row per externally-identified entity, lazily created
/// the first time anything reacts to it. Counter columns are only ever touched
/// by the atomic adjust/recompute statements.
const TARGETS_TABLE_V1: Table = Table {
    name: "targets",
    columns: &[
        sqlite_column!("kind", SqlType::Text, non_null = true),
        sqlite_column!("id", SqlType::Text, non_null = true),
        sqlite_column!(
            "like_count",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "review_count",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "annotation_count",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "avg_rating",
            SqlType::Real,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
    unique_constraints: &[&["kind", "id"]],
};

/// Likes ledger. The (user_id, target_kind, target_id) uniqueness constraint
/// is the source of truth for "a user likes a target at most once".
const LIKES_TABLE_V1: Table = Table {
    name: "likes",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!("user_id", SqlType::Text, non_null = true),
        sqlite_column!("target_kind", SqlType::Text, non_null = true),
        sqlite_column!("target_id", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_likes_target", "target_kind, target_id")],
    unique_constraints: &[&["user_id", "target_kind", "target_id"]],
};

/// Reviews ledger - one review per (user, item), enforced by constraint.
const REVIEWS_TABLE_V1: Table = Table {
    name: "reviews",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("user_id", SqlType::Text, non_null = true),
        sqlite_column!("item_id", SqlType::Text, non_null = true),
        sqlite_column!("item_kind", SqlType::Text, non_null = true),
        sqlite_column!("rating", SqlType::Integer, non_null = true),
        sqlite_column!("text", SqlType::Text),
        sqlite_column!("is_public", SqlType::Integer, non_null = true),
        sqlite_column!(
            "like_count",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_reviews_item", "item_kind, item_id"),
        ("idx_reviews_user", "user_id"),
    ],
    unique_constraints: &[&["user_id", "item_id"]],
};

// =============================================================================
// Version 2 - Annotations
// =============================================================================

/// Timestamped notes on tracks. Multiple annotations per (user, track) are
/// allowed, so no uniqueness beyond the primary key.
const ANNOTATIONS_TABLE_V2: Table = Table {
    name: "annotations",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("user_id", SqlType::Text, non_null = true),
        sqlite_column!("track_id", SqlType::Text, non_null = true),
        sqlite_column!("position_secs", SqlType::Real, non_null = true),
        sqlite_column!("text", SqlType::Text, non_null = true),
        sqlite_column!("is_public", SqlType::Integer, non_null = true),
        sqlite_column!(
            "like_count",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("created_at", SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_annotations_track", "track_id"),
        ("idx_annotations_user", "user_id"),
    ],
    unique_constraints: &[],
};

/// Migration from version 1 to version 2: add annotations table
fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    ANNOTATIONS_TABLE_V2.create(conn)?;
    Ok(())
}

/// All versioned schemas for the ledger database.
///
/// Version 1: targets, likes, reviews
/// Version 2: annotations
pub const LEDGER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[TARGETS_TABLE_V1, LIKES_TABLE_V1, REVIEWS_TABLE_V1],
        migration: None, // Initial version has no migration
    },
    VersionedSchema {
        version: 2,
        tables: &[
            TARGETS_TABLE_V1,
            LIKES_TABLE_V1,
            REVIEWS_TABLE_V1,
            ANNOTATIONS_TABLE_V2,
        ],
        migration: Some(migrate_v1_to_v2),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn v1_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &LEDGER_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn v2_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &LEDGER_VERSIONED_SCHEMAS[1];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn migration_v1_to_v2_adds_annotations() {
        let conn = Connection::open_in_memory().unwrap();
        LEDGER_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        let migrate_fn = LEDGER_VERSIONED_SCHEMAS[1].migration.unwrap();
        migrate_fn(&conn).unwrap();

        let annotations_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='annotations'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(annotations_exists, 1);

        LEDGER_VERSIONED_SCHEMAS[1].validate(&conn).unwrap();
    }

    #[test]
    fn duplicate_like_violates_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        LEDGER_VERSIONED_SCHEMAS[1].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO likes (user_id, target_kind, target_id, created_at)
             VALUES ('u1', 'track', 't1', 0)",
            [],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO likes (user_id, target_kind, target_id, created_at)
                 VALUES ('u1', 'track', 't1', 1)",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("unique"));
    }

    #[test]
    fn duplicate_review_per_user_item_violates_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        LEDGER_VERSIONED_SCHEMAS[1].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO reviews (id, user_id, item_id, item_kind, rating, is_public, created_at, updated_at)
             VALUES ('r1', 'u1', 't1', 'track', 4, 1, 0, 0)",
            [],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO reviews (id, user_id, item_id, item_kind, rating, is_public, created_at, updated_at)
                 VALUES ('r2', 'u1', 't1', 'track', 2, 1, 0, 0)",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("unique"));
    }
}
