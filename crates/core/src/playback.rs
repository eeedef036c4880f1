//! Provider-agnostic playback state.

use serde::Serialize;

use crate::types::Timestamp;

/// A track the linked account is playing right now.
///
/// Built fresh for each inline query and discarded with the answer; this
/// is never cached or persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NowPlaying {
    /// Provider track id, used for queue callbacks.
    pub track_id: String,
    pub title: String,
    /// All credited artists, comma separated.
    pub artist: String,
    /// Public link to the track.
    pub track_url: String,
    pub album: Option<String>,
    /// Album art, used for inline result thumbnails.
    pub thumbnail_url: Option<String>,
    /// False while playback is paused on an active device.
    pub is_playing: bool,
    pub fetched_at: Timestamp,
}
