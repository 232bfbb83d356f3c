mod error;
mod models;
mod schema;
mod service;
mod sqlite_ledger_store;

pub use error::ReactionError;
pub use models::*;
pub use schema::LEDGER_VERSIONED_SCHEMAS;
pub use service::ReactionService;
pub use sqlite_ledger_store::SqliteLedgerStore;

use anyhow::Result;

/// Outcome of a like insertion; a duplicate is a user-facing condition, not a
/// storage error.
#[derive(Debug, PartialEq, Eq)]
pub enum LikeInsert {
    Created,
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LikeDelete {
    Removed,
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReviewInsert {
    Created,
    AlreadyExists,
}

/// Outcome of an atomic counter adjustment.
#[derive(Debug, PartialEq, Eq)]
pub enum CounterAdjust {
    Applied,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    LikeCount,
    ReviewCount,
    AnnotationCount,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::LikeCount => "like_count",
            CounterField::ReviewCount => "review_count",
            CounterField::AnnotationCount => "annotation_count",
        }
    }
}

/// Storage interface for the reaction ledger, the target registry and the
/// aggregate counters.
///
/// Counter adjustments are single conditional SQL updates clamped at zero,
/// never application-level read-modify-write, so concurrent requests cannot
/// lose updates.
pub trait LedgerStore: Send + Sync {
    /// Idempotent upsert of a target row with zeroed counters. Concurrent
    /// first-time creation must neither fail nor duplicate the row.
    fn ensure_target(&self, kind: TargetKind, id: &str) -> Result<()>;

    /// Returns Ok(None) for targets the registry has never seen.
    fn get_target_stats(&self, kind: TargetKind, id: &str) -> Result<Option<TargetStats>>;

    fn insert_like(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
        created_at: i64,
    ) -> Result<LikeInsert>;
    fn delete_like(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
    ) -> Result<LikeDelete>;

    /// Inserts a review; a duplicate (user, item) pair reports AlreadyExists.
    fn insert_review(&self, review: &Review) -> Result<ReviewInsert>;
    fn get_review(&self, id: &str) -> Result<Option<Review>>;
    /// Applies the non-None fields of the update. Returns false if the review
    /// does not exist.
    fn update_review(&self, id: &str, update: &ReviewUpdate, updated_at: i64) -> Result<bool>;
    fn delete_review(&self, id: &str) -> Result<bool>;
    fn list_public_reviews(
        &self,
        item_kind: ReviewItemKind,
        item_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Review>>;

    fn insert_annotation(&self, annotation: &Annotation) -> Result<()>;
    fn get_annotation(&self, id: &str) -> Result<Option<Annotation>>;
    fn update_annotation(
        &self,
        id: &str,
        update: &AnnotationUpdate,
        updated_at: i64,
    ) -> Result<bool>;
    fn delete_annotation(&self, id: &str) -> Result<bool>;
    fn list_public_annotations(
        &self,
        track_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Annotation>>;

    /// Atomically applies a ±1 delta to a counter, clamped at zero. For
    /// review/annotation targets only `like_count` is a valid field.
    fn adjust_counter(
        &self,
        kind: LikeTargetKind,
        target_id: &str,
        field: CounterField,
        delta: i64,
    ) -> Result<CounterAdjust>;

    /// Overwrites `avg_rating` with the mean over all current reviews of the
    /// item (full recomputation, not incremental).
    fn recompute_avg_rating(&self, item_kind: ReviewItemKind, item_id: &str) -> Result<()>;

    /// Recomputes every denormalized counter from ledger rows. Returns the
    /// number of rows that needed correction.
    fn reconcile_counters(&self) -> Result<usize>;
}
