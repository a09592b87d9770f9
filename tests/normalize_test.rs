use serde_json::json;
use spotetl::pipeline::normalize::*;

fn full_track() -> serde_json::Value {
    json!({
        "id": "t1",
        "name": "Shape of You",
        "duration_ms": 233712,
        "popularity": 87,
        "explicit": false,
        "preview_url": "https://p.scdn.co/mp3-preview/t1",
        "external_urls": { "spotify": "https://open.spotify.com/track/t1" },
        "artists": [
            { "id": "a1", "name": "Ed Sheeran" },
            { "id": "a2", "name": "Someone Else" }
        ],
        "album": { "id": "al1", "name": "÷", "release_date": "2017-03-03" }
    })
}

#[test]
fn test_normalize_full_track() {
    let track = normalize_top_track(1, &full_track()).unwrap();

    assert_eq!(track.track_name, "Shape of You");
    assert_eq!(track.artist_name, "Ed Sheeran");
    assert_eq!(track.album_name, "÷");
    assert_eq!(track.track_id, "t1");
    assert_eq!(track.artist_id, "a1");
    assert_eq!(track.album_id, "al1");
    assert_eq!(track.duration_ms, 233712);
    assert_eq!(track.popularity, 87);
    assert!(!track.explicit);
    assert_eq!(track.external_url, "https://open.spotify.com/track/t1");
    assert_eq!(track.preview_url, "https://p.scdn.co/mp3-preview/t1");
    assert_eq!(track.release_date, "2017-03-03");

    // Top tracks have no play time or rank
    assert_eq!(track.played_at, None);
    assert_eq!(track.rank, None);
}

#[test]
fn test_normalize_missing_fields_use_defaults() {
    let track = normalize_top_track(1, &json!({})).unwrap();

    assert_eq!(track.track_name, "Unknown");
    assert_eq!(track.artist_name, "Unknown");
    assert_eq!(track.album_name, "Unknown");
    assert_eq!(track.track_id, "");
    assert_eq!(track.artist_id, "");
    assert_eq!(track.album_id, "");
    assert_eq!(track.duration_ms, 0);
    assert_eq!(track.popularity, 0);
    assert!(!track.explicit);
    assert_eq!(track.external_url, "");
    assert_eq!(track.preview_url, "");
    assert_eq!(track.release_date, "");
}

#[test]
fn test_normalize_empty_artists_and_null_preview() {
    let value = json!({
        "name": "Instrumental",
        "artists": [],
        "preview_url": null,
        "album": { "name": "Sessions" }
    });
    let track = normalize_top_track(1, &value).unwrap();

    assert_eq!(track.artist_name, "Unknown");
    assert_eq!(track.artist_id, "");
    assert_eq!(track.preview_url, "");
    assert_eq!(track.album_name, "Sessions");
    assert_eq!(track.album_id, "");
}

#[test]
fn test_normalize_popularity_is_capped() {
    let value = json!({ "name": "Loud", "popularity": 140 });
    let track = normalize_top_track(1, &value).unwrap();

    assert_eq!(track.popularity, 100);
}

#[test]
fn test_normalize_wrong_type_is_a_diagnostic() {
    let value = json!({ "name": "Broken", "duration_ms": "long" });
    let diagnostic = normalize_top_track(3, &value).unwrap_err();

    assert_eq!(diagnostic.position, 3);
    assert!(diagnostic.reason.contains("malformed"));
}

#[test]
fn test_normalize_play_item() {
    let item = json!({
        "track": full_track(),
        "played_at": "2024-05-01T10:15:00.000Z"
    });
    let track = normalize_play_item(4, &item).unwrap();

    assert_eq!(track.track_name, "Shape of You");
    assert_eq!(track.played_at.as_deref(), Some("2024-05-01T10:15:00.000Z"));
    assert_eq!(track.rank, Some(4));
    assert_eq!(track.timestamp(), Some("2024-05-01"));
}

#[test]
fn test_normalize_play_item_without_track() {
    let missing = json!({ "played_at": "2024-05-01T10:15:00.000Z" });
    let null = json!({ "track": null, "played_at": "2024-05-01T10:15:00.000Z" });

    assert!(normalize_play_item(1, &missing).is_err());
    assert!(normalize_play_item(2, &null).is_err());
}

#[test]
fn test_normalize_play_item_empty_played_at() {
    let item = json!({ "track": { "name": "No Time" }, "played_at": "" });
    let track = normalize_play_item(1, &item).unwrap();

    assert_eq!(track.played_at, None);
    assert_eq!(track.timestamp(), None);
}

#[test]
fn test_normalize_recently_played_keeps_positions() {
    let items = vec![
        json!({ "track": { "name": "First" }, "played_at": "2024-05-01T10:00:00.000Z" }),
        json!({ "played_at": "2024-05-01T09:00:00.000Z" }),
        json!({ "track": { "name": "Third" }, "played_at": "2024-05-01T08:00:00.000Z" }),
    ];
    let batch = normalize_recently_played(&items);

    assert_eq!(batch.tracks.len(), 2);
    assert_eq!(batch.diagnostics.len(), 1);
    assert_eq!(batch.diagnostics[0].position, 2);

    // Ranks follow the source positions, skipped items included
    assert_eq!(batch.tracks[0].rank, Some(1));
    assert_eq!(batch.tracks[1].rank, Some(3));
}

#[test]
fn test_normalize_top_tracks_empty() {
    let batch = normalize_top_tracks(&[]);

    assert!(batch.tracks.is_empty());
    assert!(batch.diagnostics.is_empty());
}
