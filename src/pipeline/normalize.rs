use serde_json::Value;

use crate::types::{RawPlayItem, RawTrack, Track};

const UNKNOWN: &str = "Unknown";

/// Why an item was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based position of the item in the source page.
    pub position: usize,
    pub reason: String,
}

/// A normalized batch plus the items that were skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub tracks: Vec<Track>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    fn collect<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<Track, Diagnostic>>,
    {
        let mut batch = Self::default();
        for outcome in outcomes {
            match outcome {
                Ok(track) => batch.tracks.push(track),
                Err(diagnostic) => {
                    tracing::warn!(
                        position = diagnostic.position,
                        reason = %diagnostic.reason,
                        "skipping track item"
                    );
                    batch.diagnostics.push(diagnostic);
                }
            }
        }
        tracing::info!(
            records = batch.tracks.len(),
            skipped = batch.diagnostics.len(),
            "normalized batch"
        );
        batch
    }
}

/// Flattens a decoded track, substituting defaults for anything missing.
/// Never fails; `played_at` and `rank` are left empty.
pub fn normalize_track(raw: &RawTrack) -> Track {
    let first_artist = raw.artists.as_ref().and_then(|artists| artists.first());
    let album = raw.album.as_ref();

    Track {
        track_name: raw.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        artist_name: first_artist
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        album_name: album
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        track_id: raw.id.clone().unwrap_or_default(),
        artist_id: first_artist.and_then(|a| a.id.clone()).unwrap_or_default(),
        album_id: album.and_then(|a| a.id.clone()).unwrap_or_default(),
        duration_ms: raw.duration_ms.unwrap_or(0),
        popularity: raw.popularity.unwrap_or(0).min(100),
        explicit: raw.explicit.unwrap_or(false),
        external_url: raw
            .external_urls
            .as_ref()
            .and_then(|u| u.spotify.clone())
            .unwrap_or_default(),
        preview_url: raw.preview_url.clone().unwrap_or_default(),
        played_at: None,
        rank: None,
        release_date: album
            .and_then(|a| a.release_date.clone())
            .unwrap_or_default(),
    }
}

/// Normalizes one element of a top-tracks page.
pub fn normalize_top_track(position: usize, value: &Value) -> Result<Track, Diagnostic> {
    match serde_json::from_value::<RawTrack>(value.clone()) {
        Ok(raw) => Ok(normalize_track(&raw)),
        Err(e) => Err(Diagnostic {
            position,
            reason: format!("malformed track: {e}"),
        }),
    }
}

/// Normalizes one element of a recently-played page. The item's position is
/// its rank, whether or not earlier items were skipped.
pub fn normalize_play_item(position: usize, value: &Value) -> Result<Track, Diagnostic> {
    let item = serde_json::from_value::<RawPlayItem>(value.clone()).map_err(|e| Diagnostic {
        position,
        reason: format!("malformed history item: {e}"),
    })?;

    let Some(raw) = item.track else {
        return Err(Diagnostic {
            position,
            reason: "history item has no track".to_string(),
        });
    };

    let mut track = normalize_track(&raw);
    track.played_at = item.played_at.filter(|p| !p.is_empty());
    track.rank = Some(position as u32);
    Ok(track)
}

pub fn normalize_top_tracks(values: &[Value]) -> Normalized {
    Normalized::collect(
        values
            .iter()
            .enumerate()
            .map(|(idx, v)| normalize_top_track(idx + 1, v)),
    )
}

pub fn normalize_recently_played(values: &[Value]) -> Normalized {
    Normalized::collect(
        values
            .iter()
            .enumerate()
            .map(|(idx, v)| normalize_play_item(idx + 1, v)),
    )
}
