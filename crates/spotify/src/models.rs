//! Wire types for the Spotify Web API.
//!
//! Player payload fields are deliberately lenient: the `item` of a
//! currently-playing response can be a track, an episode, or null (ads),
//! and local files carry no track id. Deserialization accepts all of
//! them; [`crate::player`] decides what counts as a playable track.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Accounts service
// ---------------------------------------------------------------------------

/// Response to an authorization-code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Response to a refresh-token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    /// Present only when the provider rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub scope: String,
    /// New access token lifetime in seconds.
    pub expires_in: i64,
}

/// Error body from the accounts token endpoint.
#[derive(Debug, Deserialize)]
pub struct AccountsErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Player API
// ---------------------------------------------------------------------------

/// Response from `GET /me/player/currently-playing`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlayingResponse {
    pub is_playing: bool,
    /// One of `track`, `episode`, `ad`, `unknown`.
    pub currently_playing_type: String,
    pub item: Option<PlayingItem>,
}

/// The `item` of a currently-playing response.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayingItem {
    /// Absent for local files.
    pub id: Option<String>,
    pub name: String,
    /// Empty when the item is an episode.
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub external_urls: Option<ExternalUrls>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    /// Ordered largest first; the last entry is the smallest rendition.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

/// Error body from the player API, e.g.
/// `{"error": {"status": 404, "message": "No active device found"}}`.
#[derive(Debug, Deserialize)]
pub struct PlayerErrorBody {
    #[serde(default)]
    pub error: Option<PlayerErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}
