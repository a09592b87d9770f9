use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::{Track, TrackTableRow};

pub const MIN_PAGE_LIMIT: u32 = 1;
pub const MAX_PAGE_LIMIT: u32 = 50;

pub fn clamp_limit(requested: i64) -> u32 {
    requested.clamp(MIN_PAGE_LIMIT as i64, MAX_PAGE_LIMIT as i64) as u32
}

/// Lower bound of the history window: `now - 24h` in epoch milliseconds,
/// truncated to whole seconds.
pub fn window_start_ms(now: DateTime<Utc>) -> i64 {
    (now - Duration::days(1)).timestamp() * 1000
}

pub fn format_duration(duration_ms: u64) -> String {
    format!(
        "{}:{:02}",
        duration_ms / 60_000,
        (duration_ms % 60_000) / 1000
    )
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

pub fn get_date_from_string(date: Option<&str>, now: DateTime<Utc>) -> String {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date_str) => date_str.to_string(),
        None => now.date_naive().to_string(),
    }
}

pub fn unique_artists(tracks: &[Track]) -> usize {
    tracks
        .iter()
        .map(|t| t.artist_name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn average_popularity(tracks: &[Track]) -> f64 {
    if tracks.is_empty() {
        return 0.0;
    }
    let total: u64 = tracks.iter().map(|t| t.popularity as u64).sum();
    round2(total as f64 / tracks.len() as f64)
}

pub fn date_range(tracks: &[Track]) -> Option<String> {
    let min = tracks.iter().filter_map(Track::timestamp).min()?;
    let max = tracks.iter().filter_map(Track::timestamp).max()?;
    Some(format!("{min} to {max}"))
}

pub fn track_table_rows(tracks: &[Track]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(idx, t)| TrackTableRow {
            rank: t.rank.unwrap_or(idx as u32 + 1).to_string(),
            track: t.track_name.clone(),
            artist: t.artist_name.clone(),
            album: t.album_name.clone(),
            duration: format_duration(t.duration_ms),
            popularity: format!("{}/100", t.popularity),
            explicit: if t.explicit { "yes" } else { "" }.to_string(),
            played_at: t.played_at.clone().unwrap_or_default(),
        })
        .collect()
}
