//! Reaction ledger data models

use serde::{Deserialize, Serialize};

/// An external entity the registry keeps denormalized counters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Track,
    Album,
    Playlist,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Track => "track",
            TargetKind::Album => "album",
            TargetKind::Playlist => "playlist",
        }
    }

    pub fn parse(s: &str) -> Option<TargetKind> {
        match s {
            "track" => Some(TargetKind::Track),
            "album" => Some(TargetKind::Album),
            "playlist" => Some(TargetKind::Playlist),
            _ => None,
        }
    }
}

/// Everything a like can point at. Reviews and annotations carry their own
/// like_count column, so they are counter homes in their own right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeTargetKind {
    Track,
    Album,
    Playlist,
    Review,
    Annotation,
}

impl LikeTargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTargetKind::Track => "track",
            LikeTargetKind::Album => "album",
            LikeTargetKind::Playlist => "playlist",
            LikeTargetKind::Review => "review",
            LikeTargetKind::Annotation => "annotation",
        }
    }

    pub fn parse(s: &str) -> Option<LikeTargetKind> {
        match s {
            "track" => Some(LikeTargetKind::Track),
            "album" => Some(LikeTargetKind::Album),
            "playlist" => Some(LikeTargetKind::Playlist),
            "review" => Some(LikeTargetKind::Review),
            "annotation" => Some(LikeTargetKind::Annotation),
            _ => None,
        }
    }

    /// The registry kind, for likes whose counter lives on a targets row.
    pub fn registry_kind(&self) -> Option<TargetKind> {
        match self {
            LikeTargetKind::Track => Some(TargetKind::Track),
            LikeTargetKind::Album => Some(TargetKind::Album),
            LikeTargetKind::Playlist => Some(TargetKind::Playlist),
            LikeTargetKind::Review | LikeTargetKind::Annotation => None,
        }
    }
}

/// Reviews are restricted to tracks and albums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewItemKind {
    Track,
    Album,
}

impl ReviewItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewItemKind::Track => "track",
            ReviewItemKind::Album => "album",
        }
    }

    pub fn parse(s: &str) -> Option<ReviewItemKind> {
        match s {
            "track" => Some(ReviewItemKind::Track),
            "album" => Some(ReviewItemKind::Album),
            _ => None,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            ReviewItemKind::Track => TargetKind::Track,
            ReviewItemKind::Album => TargetKind::Album,
        }
    }
}

/// Denormalized counters for a target. Mutated only through the
/// counter-adjustment paths of the store, never by handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStats {
    pub like_count: u64,
    pub review_count: u64,
    pub annotation_count: u64,
    pub avg_rating: f64,
}

impl TargetStats {
    pub fn zero() -> TargetStats {
        TargetStats {
            like_count: 0,
            review_count: 0,
            annotation_count: 0,
            avg_rating: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub item_kind: ReviewItemKind,
    pub rating: u8,
    pub text: Option<String>,
    pub is_public: bool,
    pub like_count: u64,
    /// Unix timestamps (seconds)
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub id: String,
    pub user_id: String,
    pub track_id: String,
    /// Position within the track, seconds from the start.
    pub position_secs: f64,
    pub text: String,
    pub is_public: bool,
    pub like_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for a review; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<u8>,
    pub text: Option<String>,
    pub is_public: Option<bool>,
}

/// Partial update for an annotation; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AnnotationUpdate {
    pub position_secs: Option<f64>,
    pub text: Option<String>,
    pub is_public: Option<bool>,
}
