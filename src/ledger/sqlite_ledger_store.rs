use super::schema::LEDGER_VERSIONED_SCHEMAS;
use super::{
    Annotation, AnnotationUpdate, CounterAdjust, CounterField, LedgerStore, LikeDelete, LikeInsert,
    LikeTargetKind, Review, ReviewInsert, ReviewItemKind, ReviewUpdate, TargetKind, TargetStats,
};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open ledger database")?;

        if is_new_db {
            info!("Creating new ledger database at {:?}", path);
            LEDGER_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                bail!(
                    "Ledger database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let current_schema_version = LEDGER_VERSIONED_SCHEMAS.last().unwrap().version as i64;

            let version_index = LEDGER_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown ledger database version {}", db_version))?;
            LEDGER_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Ledger database schema validation failed for version {}",
                        db_version
                    )
                })?;

            if db_version < current_schema_version {
                info!(
                    "Migrating ledger database from version {} to {}",
                    db_version, current_schema_version
                );
                Self::migrate(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut latest = from_version;
        for schema in LEDGER_VERSIONED_SCHEMAS.iter() {
            if schema.version > from_version {
                info!(
                    "Running ledger database migration from version {} to {}",
                    latest, schema.version
                );
                if let Some(migration_fn) = schema.migration {
                    migration_fn(&tx).with_context(|| {
                        format!("Failed to run migration to version {}", schema.version)
                    })?;
                }
                latest = schema.version;
            }
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<Review> {
        let item_kind_str: String = row.get("item_kind")?;
        let like_count: i64 = row.get("like_count")?;
        let rating: i64 = row.get("rating")?;

        Ok(Review {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            item_id: row.get("item_id")?,
            item_kind: ReviewItemKind::parse(&item_kind_str).unwrap_or(ReviewItemKind::Track),
            rating: rating as u8,
            text: row.get("text")?,
            is_public: row.get::<_, i64>("is_public")? != 0,
            like_count: like_count.max(0) as u64,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn row_to_annotation(row: &rusqlite::Row) -> rusqlite::Result<Annotation> {
        let like_count: i64 = row.get("like_count")?;

        Ok(Annotation {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            track_id: row.get("track_id")?,
            position_secs: row.get("position_secs")?,
            text: row.get("text")?,
            is_public: row.get::<_, i64>("is_public")? != 0,
            like_count: like_count.max(0) as u64,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const REVIEW_COLUMNS: &str =
    "id, user_id, item_id, item_kind, rating, text, is_public, like_count, created_at, updated_at";
const ANNOTATION_COLUMNS: &str =
    "id, user_id, track_id, position_secs, text, is_public, like_count, created_at, updated_at";

impl LedgerStore for SqliteLedgerStore {
    fn ensure_target(&self, kind: TargetKind, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        // The (kind, id) uniqueness constraint makes concurrent first-time
        // creation a harmless no-op for the loser.
        conn.execute(
            "INSERT OR IGNORE INTO targets (kind, id) VALUES (?1, ?2)",
            params![kind.as_str(), id],
        )?;
        Ok(())
    }

    fn get_target_stats(&self, kind: TargetKind, id: &str) -> Result<Option<TargetStats>> {
        let conn = self.conn.lock().unwrap();
        let stats = conn
            .query_row(
                "SELECT like_count, review_count, annotation_count, avg_rating
                 FROM targets WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id],
                |row| {
                    Ok(TargetStats {
                        like_count: row.get::<_, i64>(0)?.max(0) as u64,
                        review_count: row.get::<_, i64>(1)?.max(0) as u64,
                        annotation_count: row.get::<_, i64>(2)?.max(0) as u64,
                        avg_rating: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    fn insert_like(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
        created_at: i64,
    ) -> Result<LikeInsert> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO likes (user_id, target_kind, target_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, kind.as_str(), target_id, created_at],
        );
        match result {
            Ok(_) => Ok(LikeInsert::Created),
            Err(err) if Self::is_unique_violation(&err) => Ok(LikeInsert::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_like(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
    ) -> Result<LikeDelete> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND target_kind = ?2 AND target_id = ?3",
            params![user_id, kind.as_str(), target_id],
        )?;
        if deleted > 0 {
            Ok(LikeDelete::Removed)
        } else {
            Ok(LikeDelete::NotFound)
        }
    }

    fn insert_review(&self, review: &Review) -> Result<ReviewInsert> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO reviews (id, user_id, item_id, item_kind, rating, text, is_public, like_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                review.id,
                review.user_id,
                review.item_id,
                review.item_kind.as_str(),
                review.rating as i64,
                review.text,
                review.is_public as i64,
                review.like_count as i64,
                review.created_at,
                review.updated_at,
            ],
        );
        match result {
            Ok(_) => Ok(ReviewInsert::Created),
            Err(err) if Self::is_unique_violation(&err) => Ok(ReviewInsert::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    fn get_review(&self, id: &str) -> Result<Option<Review>> {
        let conn = self.conn.lock().unwrap();
        let review = conn
            .query_row(
                &format!("SELECT {} FROM reviews WHERE id = ?1", REVIEW_COLUMNS),
                params![id],
                Self::row_to_review,
            )
            .optional()?;
        Ok(review)
    }

    fn update_review(&self, id: &str, update: &ReviewUpdate, updated_at: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE reviews SET
                rating = COALESCE(?1, rating),
                text = COALESCE(?2, text),
                is_public = COALESCE(?3, is_public),
                updated_at = ?4
             WHERE id = ?5",
            params![
                update.rating.map(|r| r as i64),
                update.text,
                update.is_public.map(|p| p as i64),
                updated_at,
                id
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_review(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_public_reviews(
        &self,
        item_kind: ReviewItemKind,
        item_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Review>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reviews
             WHERE item_kind = ?1 AND item_id = ?2 AND is_public = 1
             ORDER BY created_at DESC
             LIMIT ?3 OFFSET ?4",
            REVIEW_COLUMNS
        ))?;
        let reviews = stmt
            .query_map(
                params![item_kind.as_str(), item_id, limit as i64, offset as i64],
                Self::row_to_review,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    fn insert_annotation(&self, annotation: &Annotation) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO annotations (id, user_id, track_id, position_secs, text, is_public, like_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                annotation.id,
                annotation.user_id,
                annotation.track_id,
                annotation.position_secs,
                annotation.text,
                annotation.is_public as i64,
                annotation.like_count as i64,
                annotation.created_at,
                annotation.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_annotation(&self, id: &str) -> Result<Option<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let annotation = conn
            .query_row(
                &format!(
                    "SELECT {} FROM annotations WHERE id = ?1",
                    ANNOTATION_COLUMNS
                ),
                params![id],
                Self::row_to_annotation,
            )
            .optional()?;
        Ok(annotation)
    }

    fn update_annotation(
        &self,
        id: &str,
        update: &AnnotationUpdate,
        updated_at: i64,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE annotations SET
                position_secs = COALESCE(?1, position_secs),
                text = COALESCE(?2, text),
                is_public = COALESCE(?3, is_public),
                updated_at = ?4
             WHERE id = ?5",
            params![
                update.position_secs,
                update.text,
                update.is_public.map(|p| p as i64),
                updated_at,
                id
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_annotation(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM annotations WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_public_annotations(
        &self,
        track_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM annotations
             WHERE track_id = ?1 AND is_public = 1
             ORDER BY position_secs ASC, created_at ASC
             LIMIT ?2 OFFSET ?3",
            ANNOTATION_COLUMNS
        ))?;
        let annotations = stmt
            .query_map(
                params![track_id, limit as i64, offset as i64],
                Self::row_to_annotation,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(annotations)
    }

    fn adjust_counter(
        &self,
        kind: LikeTargetKind,
        target_id: &str,
        field: CounterField,
        delta: i64,
    ) -> Result<CounterAdjust> {
        let conn = self.conn.lock().unwrap();
        let updated = match kind.registry_kind() {
            Some(registry_kind) => {
                let column = field.column();
                // Single conditional update, clamped at zero. MAX() keeps an
                // already-drifted counter from ever going negative.
                conn.execute(
                    &format!(
                        "UPDATE targets SET {col} = MAX(0, {col} + ?1)
                         WHERE kind = ?2 AND id = ?3",
                        col = column
                    ),
                    params![delta, registry_kind.as_str(), target_id],
                )?
            }
            None => {
                if field != CounterField::LikeCount {
                    bail!(
                        "counter field {:?} is not valid for {} targets",
                        field,
                        kind.as_str()
                    );
                }
                let table = match kind {
                    LikeTargetKind::Review => "reviews",
                    LikeTargetKind::Annotation => "annotations",
                    _ => unreachable!(),
                };
                conn.execute(
                    &format!(
                        "UPDATE {table} SET like_count = MAX(0, like_count + ?1) WHERE id = ?2",
                        table = table
                    ),
                    params![delta, target_id],
                )?
            }
        };
        if updated > 0 {
            Ok(CounterAdjust::Applied)
        } else {
            Ok(CounterAdjust::NotFound)
        }
    }

    fn recompute_avg_rating(&self, item_kind: ReviewItemKind, item_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE targets SET avg_rating = COALESCE(
                (SELECT AVG(rating) FROM reviews WHERE item_kind = ?1 AND item_id = ?2), 0)
             WHERE kind = ?1 AND id = ?2",
            params![item_kind.as_str(), item_id],
        )?;
        Ok(())
    }

    fn reconcile_counters(&self) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut corrected = 0;

        corrected += tx.execute(
            "UPDATE targets SET
                like_count = (SELECT COUNT(*) FROM likes
                              WHERE target_kind = targets.kind AND target_id = targets.id),
                review_count = (SELECT COUNT(*) FROM reviews
                                WHERE item_kind = targets.kind AND item_id = targets.id),
                annotation_count = CASE targets.kind
                    WHEN 'track' THEN (SELECT COUNT(*) FROM annotations
                                       WHERE track_id = targets.id)
                    ELSE 0 END,
                avg_rating = COALESCE((SELECT AVG(rating) FROM reviews
                                       WHERE item_kind = targets.kind AND item_id = targets.id), 0)
             WHERE like_count <> (SELECT COUNT(*) FROM likes
                                  WHERE target_kind = targets.kind AND target_id = targets.id)
                OR review_count <> (SELECT COUNT(*) FROM reviews
                                    WHERE item_kind = targets.kind AND item_id = targets.id)
                OR annotation_count <> CASE targets.kind
                    WHEN 'track' THEN (SELECT COUNT(*) FROM annotations
                                       WHERE track_id = targets.id)
                    ELSE 0 END
                OR avg_rating <> COALESCE((SELECT AVG(rating) FROM reviews
                                           WHERE item_kind = targets.kind AND item_id = targets.id), 0)",
            [],
        )?;

        corrected += tx.execute(
            "UPDATE reviews SET like_count = (SELECT COUNT(*) FROM likes
                                              WHERE target_kind = 'review' AND target_id = reviews.id)
             WHERE like_count <> (SELECT COUNT(*) FROM likes
                                  WHERE target_kind = 'review' AND target_id = reviews.id)",
            [],
        )?;

        corrected += tx.execute(
            "UPDATE annotations SET like_count = (SELECT COUNT(*) FROM likes
                                                  WHERE target_kind = 'annotation' AND target_id = annotations.id)
             WHERE like_count <> (SELECT COUNT(*) FROM likes
                                  WHERE target_kind = 'annotation' AND target_id = annotations.id)",
            [],
        )?;

        tx.commit()?;
        Ok(corrected)
    }
}
