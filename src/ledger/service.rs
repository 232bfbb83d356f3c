use super::{
    Annotation, AnnotationUpdate, CounterAdjust, CounterField, LedgerStore, LikeDelete, LikeInsert,
    LikeTargetKind, ReactionError, Review, ReviewInsert, ReviewItemKind, ReviewUpdate, TargetKind,
    TargetStats,
};
use std::sync::Arc;
use tracing::warn;

const MAX_TEXT_LEN: usize = 10_000;
const MAX_PAGE_SIZE: usize = 100;

/// All reaction writes go through here. The invariant is write-then-signal:
/// the ledger row (like, review, annotation) is committed first, then the
/// denormalized counter on the target is adjusted. A crash between the two
/// steps leaves a drifted counter which the periodic [`reconcile`] pass
/// repairs from the ledger rows.
///
/// [`reconcile`]: ReactionService::reconcile
pub struct ReactionService {
    store: Arc<dyn LedgerStore>,
}

impl ReactionService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn like(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
    ) -> Result<(), ReactionError> {
        validate_id(target_id)?;

        if let Some(registry_kind) = kind.registry_kind() {
            self.store.ensure_target(registry_kind, target_id)?;
        }

        match self.store.insert_like(user_id, kind, target_id, now_ts())? {
            LikeInsert::Created => {}
            LikeInsert::AlreadyExists => {
                return Err(ReactionError::conflict(format!(
                    "{} {} is already liked",
                    kind.as_str(),
                    target_id
                )));
            }
        }

        match self
            .store
            .adjust_counter(kind, target_id, CounterField::LikeCount, 1)
        {
            Ok(CounterAdjust::Applied) => Ok(()),
            Ok(CounterAdjust::NotFound) => {
                // The liked review or annotation does not exist. Undo the
                // like row so the ledger does not reference a ghost.
                self.compensate_like(user_id, kind, target_id);
                Err(ReactionError::NotFound)
            }
            Err(err) => {
                self.compensate_like(user_id, kind, target_id);
                Err(err.into())
            }
        }
    }

    fn compensate_like(&self, user_id: &str, kind: LikeTargetKind, target_id: &str) {
        if let Err(err) = self.store.delete_like(user_id, kind, target_id) {
            warn!(
                "Failed to roll back like of {} {} by {}, reconciliation will catch it: {:#}",
                kind.as_str(),
                target_id,
                user_id,
                err
            );
        }
    }

    pub fn unlike(
        &self,
        user_id: &str,
        kind: LikeTargetKind,
        target_id: &str,
    ) -> Result<(), ReactionError> {
        validate_id(target_id)?;

        match self.store.delete_like(user_id, kind, target_id)? {
            LikeDelete::Removed => {}
            LikeDelete::NotFound => return Err(ReactionError::NotFound),
        }

        // The like row is already gone; a failing decrement leaves a stale
        // counter for reconciliation, but the caller still hears about it.
        match self
            .store
            .adjust_counter(kind, target_id, CounterField::LikeCount, -1)?
        {
            CounterAdjust::Applied => {}
            CounterAdjust::NotFound => {
                // The counter row disappeared between the two steps, nothing
                // left to decrement.
                warn!(
                    "Like removed but no counter row for {} {}",
                    kind.as_str(),
                    target_id
                );
            }
        }
        Ok(())
    }

    pub fn create_review(
        &self,
        user_id: &str,
        item_kind: ReviewItemKind,
        item_id: &str,
        rating: u8,
        text: Option<String>,
        is_public: bool,
    ) -> Result<Review, ReactionError> {
        validate_id(item_id)?;
        validate_rating(rating)?;
        if let Some(text) = &text {
            validate_text_len(text)?;
        }

        let target_kind = item_kind.target_kind();
        self.store.ensure_target(target_kind, item_id)?;

        let now = now_ts();
        let review = Review {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            item_kind,
            rating,
            text,
            is_public,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_review(&review)? {
            ReviewInsert::Created => {}
            ReviewInsert::AlreadyExists => {
                return Err(ReactionError::conflict(format!(
                    "user already reviewed {} {}",
                    item_kind.as_str(),
                    item_id
                )));
            }
        }

        self.signal_review_change(item_kind, item_id, 1)?;
        Ok(review)
    }

    pub fn update_review(
        &self,
        user_id: &str,
        review_id: &str,
        update: ReviewUpdate,
    ) -> Result<Review, ReactionError> {
        if let Some(rating) = update.rating {
            validate_rating(rating)?;
        }
        if let Some(text) = &update.text {
            validate_text_len(text)?;
        }

        let existing = self
            .store
            .get_review(review_id)?
            .ok_or(ReactionError::NotFound)?;
        if existing.user_id != user_id {
            return Err(ReactionError::Unauthorized);
        }

        self.store.update_review(review_id, &update, now_ts())?;

        if update.rating.is_some() {
            self.signal_review_change(existing.item_kind, &existing.item_id, 0)?;
        }

        self.store
            .get_review(review_id)?
            .ok_or(ReactionError::NotFound)
    }

    pub fn delete_review(&self, user_id: &str, review_id: &str) -> Result<(), ReactionError> {
        let existing = self
            .store
            .get_review(review_id)?
            .ok_or(ReactionError::NotFound)?;
        if existing.user_id != user_id {
            return Err(ReactionError::Unauthorized);
        }

        if !self.store.delete_review(review_id)? {
            return Err(ReactionError::NotFound);
        }

        self.signal_review_change(existing.item_kind, &existing.item_id, -1)?;
        Ok(())
    }

    /// Counter signal after a review mutation. Delta adjusts review_count,
    /// the average is always recomputed from scratch over the surviving
    /// reviews. The ledger row has already committed, so a failing signal
    /// surfaces as an infrastructure error while the drifted counter waits
    /// for reconciliation.
    fn signal_review_change(
        &self,
        item_kind: ReviewItemKind,
        item_id: &str,
        delta: i64,
    ) -> Result<(), ReactionError> {
        let like_kind = match item_kind {
            ReviewItemKind::Track => LikeTargetKind::Track,
            ReviewItemKind::Album => LikeTargetKind::Album,
        };
        if delta != 0 {
            if let CounterAdjust::NotFound =
                self.store
                    .adjust_counter(like_kind, item_id, CounterField::ReviewCount, delta)?
            {
                // Registry targets are never deleted, so a missing row is
                // drift that reconciliation repairs.
                warn!(
                    "No counter row for {} {} while adjusting review count",
                    item_kind.as_str(),
                    item_id
                );
            }
        }
        self.store.recompute_avg_rating(item_kind, item_id)?;
        Ok(())
    }

    pub fn create_annotation(
        &self,
        user_id: &str,
        track_id: &str,
        position_secs: f64,
        text: String,
        is_public: bool,
    ) -> Result<Annotation, ReactionError> {
        validate_id(track_id)?;
        validate_position(position_secs)?;
        validate_annotation_text(&text)?;

        self.store.ensure_target(TargetKind::Track, track_id)?;

        let now = now_ts();
        let annotation = Annotation {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            track_id: track_id.to_string(),
            position_secs,
            text,
            is_public,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_annotation(&annotation)?;

        // The annotation row stays committed even if the counter bump fails,
        // but the failure is the caller's to see.
        if let CounterAdjust::NotFound = self.store.adjust_counter(
            LikeTargetKind::Track,
            track_id,
            CounterField::AnnotationCount,
            1,
        )? {
            warn!("No counter row for track {} after annotation", track_id);
        }
        Ok(annotation)
    }

    pub fn update_annotation(
        &self,
        user_id: &str,
        annotation_id: &str,
        update: AnnotationUpdate,
    ) -> Result<Annotation, ReactionError> {
        if let Some(position_secs) = update.position_secs {
            validate_position(position_secs)?;
        }
        if let Some(text) = &update.text {
            validate_annotation_text(text)?;
        }

        let existing = self
            .store
            .get_annotation(annotation_id)?
            .ok_or(ReactionError::NotFound)?;
        if existing.user_id != user_id {
            return Err(ReactionError::Unauthorized);
        }

        self.store
            .update_annotation(annotation_id, &update, now_ts())?;
        self.store
            .get_annotation(annotation_id)?
            .ok_or(ReactionError::NotFound)
    }

    pub fn delete_annotation(
        &self,
        user_id: &str,
        annotation_id: &str,
    ) -> Result<(), ReactionError> {
        let existing = self
            .store
            .get_annotation(annotation_id)?
            .ok_or(ReactionError::NotFound)?;
        if existing.user_id != user_id {
            return Err(ReactionError::Unauthorized);
        }

        if !self.store.delete_annotation(annotation_id)? {
            return Err(ReactionError::NotFound);
        }

        if let CounterAdjust::NotFound = self.store.adjust_counter(
            LikeTargetKind::Track,
            &existing.track_id,
            CounterField::AnnotationCount,
            -1,
        )? {
            warn!(
                "No counter row for track {} while removing annotation",
                existing.track_id
            );
        }
        Ok(())
    }

    /// Stats for a target the registry may never have seen. Unknown targets
    /// report all-zero rather than an error, liking or reviewing something
    /// is what brings it into the registry.
    pub fn target_stats(
        &self,
        kind: TargetKind,
        target_id: &str,
    ) -> Result<TargetStats, ReactionError> {
        validate_id(target_id)?;
        let stats = self
            .store
            .get_target_stats(kind, target_id)?
            .unwrap_or_else(TargetStats::zero);
        Ok(stats)
    }

    pub fn list_public_reviews(
        &self,
        item_kind: ReviewItemKind,
        item_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Review>, ReactionError> {
        validate_id(item_id)?;
        let reviews =
            self.store
                .list_public_reviews(item_kind, item_id, limit.min(MAX_PAGE_SIZE), offset)?;
        Ok(reviews)
    }

    pub fn list_public_annotations(
        &self,
        track_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Annotation>, ReactionError> {
        validate_id(track_id)?;
        let annotations =
            self.store
                .list_public_annotations(track_id, limit.min(MAX_PAGE_SIZE), offset)?;
        Ok(annotations)
    }

    pub fn get_review(&self, review_id: &str) -> Result<Review, ReactionError> {
        self.store.get_review(review_id)?.ok_or(ReactionError::NotFound)
    }

    pub fn get_annotation(&self, annotation_id: &str) -> Result<Annotation, ReactionError> {
        self.store
            .get_annotation(annotation_id)?
            .ok_or(ReactionError::NotFound)
    }

    pub fn reconcile(&self) -> Result<usize, ReactionError> {
        Ok(self.store.reconcile_counters()?)
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

fn validate_id(id: &str) -> Result<(), ReactionError> {
    if id.is_empty() {
        return Err(ReactionError::validation("id must not be empty"));
    }
    Ok(())
}

fn validate_rating(rating: u8) -> Result<(), ReactionError> {
    if !(1..=5).contains(&rating) {
        return Err(ReactionError::validation(format!(
            "rating must be between 1 and 5, got {}",
            rating
        )));
    }
    Ok(())
}

fn validate_text_len(text: &str) -> Result<(), ReactionError> {
    if text.len() > MAX_TEXT_LEN {
        return Err(ReactionError::validation(format!(
            "text exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

fn validate_annotation_text(text: &str) -> Result<(), ReactionError> {
    if text.trim().is_empty() {
        return Err(ReactionError::validation("annotation text must not be empty"));
    }
    validate_text_len(text)
}

fn validate_position(position_secs: f64) -> Result<(), ReactionError> {
    if !position_secs.is_finite() || position_secs < 0.0 {
        return Err(ReactionError::validation(format!(
            "position_secs must be a non-negative number, got {}",
            position_secs
        )));
    }
    Ok(())
}
