use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    pub items: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub artists: Option<Paging>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawArtist {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Artist resolved by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    pub tracks: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Option<Vec<serde_json::Value>>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlbum {
    pub id: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Track object as returned by the top-tracks and recently-played endpoints.
/// Every field is optional; defaults are applied by the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    pub artists: Option<Vec<RawArtistRef>>,
    pub album: Option<RawAlbum>,
    pub duration_ms: Option<u64>,
    pub popularity: Option<u32>,
    pub explicit: Option<bool>,
    pub external_urls: Option<ExternalUrls>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayItem {
    pub track: Option<RawTrack>,
    pub played_at: Option<String>,
}

/// Normalized record. Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_id: String,
    pub artist_id: String,
    pub album_id: String,
    pub duration_ms: u64,
    pub popularity: u32,
    pub explicit: bool,
    pub external_url: String,
    pub preview_url: String,
    pub played_at: Option<String>,
    pub rank: Option<u32>,
    pub release_date: String,
}

impl Track {
    /// Date portion of `played_at`, the way history rows are bucketed.
    pub fn timestamp(&self) -> Option<&str> {
        self.played_at
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| p.get(..10).unwrap_or(p))
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub rank: String,
    pub track: String,
    pub artist: String,
    pub album: String,
    pub duration: String,
    pub popularity: String,
    pub explicit: String,
    pub played_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    NoData,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFlags {
    pub explicit_count: usize,
    pub skipped_items: usize,
    pub stale_count: usize,
    pub null_fields: Vec<String>,
    pub date_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub records_processed: usize,
    pub unique_artists: usize,
    pub average_popularity: f64,
    pub flags: RunFlags,
    pub sink_location: Option<String>,
    pub execution_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
