//! Player API client: read the currently playing track and queue tracks.

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tunecast_core::playback::NowPlaying;

use crate::error::SpotifyError;
use crate::models::{CurrentlyPlayingResponse, PlayerErrorBody};

/// Base URL of the Spotify Web API.
const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// HTTP request timeout for a single player call. The inline answer window
/// leaves room for at most a refresh plus two player calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Fallback when the player error body carries no message.
const GENERIC_API_ERROR: &str = "An error occurred";

/// HTTP client for the player endpoints. Stateless; the bearer token is
/// passed per call so one client serves every user.
pub struct PlayerApi {
    client: reqwest::Client,
    base_url: String,
}

impl PlayerApi {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different player endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch what the account is playing right now.
    ///
    /// `Ok(None)` means nothing shareable is playing: no active device
    /// (HTTP 204), an ad, an episode, or a local file without a track id.
    /// That outcome is ordinary, not an error.
    pub async fn currently_playing(
        &self,
        access_token: &str,
    ) -> Result<Option<NowPlaying>, SpotifyError> {
        let response = self
            .client
            .get(format!("{}/me/player/currently-playing", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::UNAUTHORIZED => Err(SpotifyError::Unauthorized),
            _ if status.is_success() => {
                let payload: CurrentlyPlayingResponse = response.json().await?;
                Ok(to_now_playing(payload))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(api_error(status.as_u16(), &body))
            }
        }
    }

    /// Add a track to the account's playback queue.
    ///
    /// Requires an active device and a Premium account; those failures come
    /// back as [`SpotifyError::Api`] with the upstream message.
    pub async fn add_to_queue(
        &self,
        access_token: &str,
        track_id: &str,
    ) -> Result<(), SpotifyError> {
        let uri = format!("spotify:track:{track_id}");
        let response = self
            .client
            .post(format!("{}/me/player/queue", self.base_url))
            .query(&[("uri", uri.as_str())])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SpotifyError::Unauthorized);
        }
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }
}

impl Default for PlayerApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce a currently-playing payload to a shareable track, or `None` when
/// there is nothing shareable (episode, ad, local file, missing link).
fn to_now_playing(payload: CurrentlyPlayingResponse) -> Option<NowPlaying> {
    if payload.currently_playing_type != "track" {
        return None;
    }
    let item = payload.item?;
    let track_id = item.id?;
    let track_url = item.external_urls?.spotify;

    let artist = item
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let (album, thumbnail_url) = match item.album {
        Some(album) => {
            let thumbnail = album.images.last().map(|img| img.url.clone());
            (Some(album.name), thumbnail)
        }
        None => (None, None),
    };

    Some(NowPlaying {
        track_id,
        title: item.name,
        artist,
        track_url,
        album,
        thumbnail_url,
        is_playing: payload.is_playing,
        fetched_at: Utc::now(),
    })
}

/// Build an [`SpotifyError::Api`] from a player error body, falling back
/// to a generic message when the body is not the documented shape.
fn api_error(status: u16, body: &str) -> SpotifyError {
    let message = serde_json::from_str::<PlayerErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string());
    SpotifyError::Api { status, message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
