//! Spotify Web API client.

use super::{
    AlbumMetadata, BearerCredential, IdentityProvider, MetadataProvider, PlaylistMetadata,
    ProviderError, TargetMetadata, TrackMetadata,
};
use crate::ledger::TargetKind;
use crate::user::UserProfile;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

pub struct SpotifyClient {
    client: reqwest::Client,
    api_base: String,
    /// Token used for metadata lookups. When absent, metadata enrichment
    /// is off and lookups report Ok(None).
    service_token: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    display_name: Option<String>,
    images: Option<Vec<ImageResponse>>,
    external_urls: Option<ExternalUrls>,
    country: Option<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    url: String,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct TrackResponse {
    id: String,
    name: String,
    duration_ms: Option<u64>,
    artists: Option<Vec<ArtistResponse>>,
    album: Option<AlbumRef>,
}

#[derive(Deserialize)]
struct ArtistResponse {
    name: String,
}

#[derive(Deserialize)]
struct AlbumRef {
    name: String,
}

#[derive(Deserialize)]
struct AlbumResponse {
    id: String,
    name: String,
    artists: Option<Vec<ArtistResponse>>,
    release_date: Option<String>,
    total_tracks: Option<u32>,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    id: String,
    name: String,
    owner: Option<OwnerResponse>,
    tracks: Option<TracksRef>,
}

#[derive(Deserialize)]
struct OwnerResponse {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct TracksRef {
    total: Option<u32>,
}

impl SpotifyClient {
    pub fn new(api_base: Option<String>, service_token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.unwrap_or_else(|| SPOTIFY_API_BASE.to_string()),
            service_token,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<Option<T>, ProviderError> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::InvalidCredential);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(anyhow!(
                "Provider responded with status {} for {}",
                status,
                url
            )));
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode provider response from {}", url))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl IdentityProvider for SpotifyClient {
    async fn current_user(
        &self,
        credential: &BearerCredential,
    ) -> Result<UserProfile, ProviderError> {
        let user: UserResponse = self
            .get_json("/me", &credential.access_token)
            .await?
            .ok_or(ProviderError::InvalidCredential)?;

        let display_name = user.display_name.unwrap_or_else(|| user.id.clone());
        Ok(UserProfile {
            id: user.id,
            display_name,
            avatar_url: user
                .images
                .and_then(|images| images.into_iter().next())
                .map(|image| image.url),
            profile_url: user.external_urls.and_then(|urls| urls.spotify),
            country: user.country,
        })
    }
}

#[async_trait]
impl MetadataProvider for SpotifyClient {
    async fn target_metadata(
        &self,
        kind: TargetKind,
        id: &str,
    ) -> Result<Option<TargetMetadata>, ProviderError> {
        let token = match &self.service_token {
            Some(token) => token.clone(),
            None => return Ok(None),
        };

        let metadata = match kind {
            TargetKind::Track => self
                .get_json::<TrackResponse>(&format!("/tracks/{}", id), &token)
                .await?
                .map(|track| {
                    TargetMetadata::Track(TrackMetadata {
                        id: track.id,
                        name: track.name,
                        artists: track
                            .artists
                            .unwrap_or_default()
                            .into_iter()
                            .map(|a| a.name)
                            .collect(),
                        album: track.album.map(|album| album.name),
                        duration_secs: track.duration_ms.map(|ms| ms as f64 / 1000.0),
                    })
                }),
            TargetKind::Album => self
                .get_json::<AlbumResponse>(&format!("/albums/{}", id), &token)
                .await?
                .map(|album| {
                    TargetMetadata::Album(AlbumMetadata {
                        id: album.id,
                        name: album.name,
                        artists: album
                            .artists
                            .unwrap_or_default()
                            .into_iter()
                            .map(|a| a.name)
                            .collect(),
                        release_date: album.release_date,
                        track_count: album.total_tracks,
                    })
                }),
            TargetKind::Playlist => self
                .get_json::<PlaylistResponse>(&format!("/playlists/{}", id), &token)
                .await?
                .map(|playlist| {
                    TargetMetadata::Playlist(PlaylistMetadata {
                        id: playlist.id,
                        name: playlist.name,
                        owner: playlist.owner.and_then(|owner| owner.display_name),
                        track_count: playlist.tracks.and_then(|tracks| tracks.total),
                    })
                }),
        };
        Ok(metadata)
    }
}
