//! The upstream music provider. Identity resolution for login and
//! best-effort metadata lookups for display.

mod spotify;

pub use spotify::SpotifyClient;

use crate::ledger::TargetKind;
use crate::user::UserProfile;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider rejected the credential")]
    InvalidCredential,
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

/// A provider-issued OAuth access token, handed to us by the client.
/// Carried as an explicit value so callers can tell from the signature
/// which operations talk to the provider.
#[derive(Clone, Debug)]
pub struct BearerCredential {
    pub access_token: String,
    pub expires_at: Option<i64>,
}

impl BearerCredential {
    pub fn new<S: Into<String>>(access_token: S) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlbumMetadata {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub release_date: Option<String>,
    pub track_count: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaylistMetadata {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub track_count: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetMetadata {
    Track(TrackMetadata),
    Album(AlbumMetadata),
    Playlist(PlaylistMetadata),
}

/// Resolves who a provider access token belongs to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(
        &self,
        credential: &BearerCredential,
    ) -> Result<UserProfile, ProviderError>;
}

/// Looks up display metadata for a target. Ok(None) means the provider
/// does not know the id, or no metadata source is configured.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn target_metadata(
        &self,
        kind: TargetKind,
        id: &str,
    ) -> Result<Option<TargetMetadata>, ProviderError>;
}
