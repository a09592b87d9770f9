use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use spotetl::config::{Settings, VariableStore};
use spotetl::error::EtlError;
use spotetl::pipeline::{CsvSink, Pipeline, RunContext, Sink};
use spotetl::spotify::SpotifyApi;
use spotetl::types::{Artist, ClientCredentials, RunStatus, Track};
use tempfile::tempdir;

// In-memory API that records which calls were made
#[derive(Default)]
struct FakeApi {
    token: Option<EtlError>,
    artist: Option<Artist>,
    tracks: Vec<Value>,
    history: Vec<Value>,
    calls: RefCell<Vec<String>>,
    history_args: RefCell<Option<(i64, i64)>>,
}

impl SpotifyApi for FakeApi {
    fn request_token(&self, _credentials: &ClientCredentials) -> Result<String, EtlError> {
        self.calls.borrow_mut().push("token".to_string());
        match &self.token {
            Some(EtlError::Auth { status, body }) => Err(EtlError::Auth {
                status: *status,
                body: body.clone(),
            }),
            _ => Ok("token-123".to_string()),
        }
    }

    fn search_artist(&self, token: &str, name: &str) -> Result<Artist, EtlError> {
        assert_eq!(token, "token-123");
        self.calls.borrow_mut().push("search".to_string());
        self.artist
            .clone()
            .ok_or_else(|| EtlError::NotFound(format!("Artist '{}' not found", name)))
    }

    fn top_tracks(&self, _token: &str, artist_id: &str, market: &str) -> Result<Vec<Value>, EtlError> {
        self.calls
            .borrow_mut()
            .push(format!("top_tracks:{}:{}", artist_id, market));
        Ok(self.tracks.clone())
    }

    fn recently_played(&self, token: &str, limit: i64, after_ms: i64) -> Result<Vec<Value>, EtlError> {
        assert_eq!(token, "user-token");
        self.calls.borrow_mut().push("recently_played".to_string());
        *self.history_args.borrow_mut() = Some((limit, after_ms));
        Ok(self.history.clone())
    }
}

// Sink that keeps every batch it receives
#[derive(Default)]
struct RecordingSink {
    batches: Vec<Vec<Track>>,
}

impl Sink for RecordingSink {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn write(&mut self, batch: &[Track]) -> Result<usize, EtlError> {
        self.batches.push(batch.to_vec());
        Ok(batch.len())
    }
}

fn settings_with(pairs: &[(&str, &str)]) -> Settings {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_layers(&VariableStore::empty(), |key| env.get(key).cloned()).unwrap()
}

fn client_settings() -> Settings {
    settings_with(&[
        ("SPOTIFY_CLIENT_ID", "id"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
    ])
}

fn user_settings() -> Settings {
    settings_with(&[("SPOTIFY_USER_TOKEN", "user-token"), ("SPOTIFY_RECENT_LIMIT", "200")])
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

fn ed_sheeran() -> Option<Artist> {
    Some(Artist {
        id: "6eUKZXaKkcviH0Ku9w2n3V".to_string(),
        name: "Ed Sheeran".to_string(),
    })
}

fn track_json(id: &str, artist: &str, popularity: u32, explicit: bool) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "popularity": popularity,
        "explicit": explicit,
        "duration_ms": 200000,
        "artists": [{ "id": format!("{}-id", artist), "name": artist }],
        "album": { "id": "al", "name": "Album", "release_date": "2023-05-05" }
    })
}

fn play_json(id: &str, played_at: &str) -> Value {
    json!({ "track": track_json(id, "Ed Sheeran", 70, false), "played_at": played_at })
}

#[test]
fn test_top_tracks_success() {
    let api = FakeApi {
        artist: ed_sheeran(),
        tracks: vec![
            track_json("1", "Ed Sheeran", 90, false),
            track_json("2", "Ed Sheeran", 81, true),
            track_json("3", "Khalid", 70, false),
        ],
        ..FakeApi::default()
    };
    let settings = client_settings();
    let mut sink = RecordingSink::default();

    let outcome = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_top_tracks(&RunContext::new().with_execution_date("2024-05-01"), &mut sink)
        .unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.records_processed, 3);
    assert_eq!(summary.unique_artists, 2);
    assert_eq!(summary.average_popularity, 80.33);
    assert_eq!(summary.flags.explicit_count, 1);
    assert_eq!(summary.flags.skipped_items, 0);
    assert_eq!(summary.execution_date, "2024-05-01");
    assert_eq!(summary.artist_name.as_deref(), Some("Ed Sheeran"));
    assert_eq!(summary.sink_location.as_deref(), Some("memory"));

    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].len(), 3);
    assert_eq!(outcome.tracks, sink.batches[0]);

    assert_eq!(
        *api.calls.borrow(),
        vec![
            "token".to_string(),
            "search".to_string(),
            "top_tracks:6eUKZXaKkcviH0Ku9w2n3V:US".to_string(),
        ]
    );
}

#[test]
fn test_top_tracks_artist_not_found() {
    let api = FakeApi::default();
    let settings = client_settings();
    let mut sink = RecordingSink::default();

    let result = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_top_tracks(&RunContext::new(), &mut sink);

    match result {
        Err(EtlError::NotFound(message)) => assert_eq!(message, "Artist 'Ed Sheeran' not found"),
        other => panic!("expected not found, got {:?}", other.map(|o| o.summary)),
    }

    // Nothing persisted, no top tracks requested
    assert!(sink.batches.is_empty());
    assert_eq!(api.calls.borrow().len(), 2);
}

#[test]
fn test_top_tracks_token_rejected() {
    let api = FakeApi {
        token: Some(EtlError::Auth {
            status: 401,
            body: "invalid_client".to_string(),
        }),
        artist: ed_sheeran(),
        ..FakeApi::default()
    };
    let settings = client_settings();
    let mut sink = RecordingSink::default();

    let result = Pipeline::new(&api, &settings).run_top_tracks(&RunContext::new(), &mut sink);

    assert!(matches!(result, Err(EtlError::Auth { status: 401, .. })));
    assert_eq!(*api.calls.borrow(), vec!["token".to_string()]);
    assert!(sink.batches.is_empty());
}

#[test]
fn test_top_tracks_missing_credentials() {
    let api = FakeApi::default();
    let settings = settings_with(&[("SPOTIFY_CLIENT_ID", "id")]);
    let mut sink = RecordingSink::default();

    let result = Pipeline::new(&api, &settings).run_top_tracks(&RunContext::new(), &mut sink);

    match result {
        Err(EtlError::MissingCredentials { missing, .. }) => {
            assert_eq!(missing, "SPOTIFY_CLIENT_SECRET")
        }
        other => panic!("expected missing credentials, got {:?}", other.map(|o| o.summary)),
    }
    assert!(api.calls.borrow().is_empty());
}

#[test]
fn test_top_tracks_empty_is_no_data() {
    let api = FakeApi {
        artist: ed_sheeran(),
        ..FakeApi::default()
    };
    let settings = client_settings();
    let mut sink = RecordingSink::default();

    let outcome = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_top_tracks(&RunContext::new(), &mut sink)
        .unwrap();

    assert_eq!(outcome.summary.status, RunStatus::NoData);
    assert_eq!(outcome.summary.records_processed, 0);
    assert_eq!(outcome.summary.execution_date, "2024-05-02");
    assert_eq!(outcome.summary.sink_location, None);
    assert!(sink.batches.is_empty());
}

#[test]
fn test_recently_played_success() {
    let api = FakeApi {
        history: vec![
            play_json("1", "2024-05-02T10:00:00.000Z"),
            json!({ "played_at": "2024-05-02T09:00:00.000Z" }),
            play_json("3", "2024-05-01T20:00:00.000Z"),
        ],
        ..FakeApi::default()
    };
    let settings = user_settings();
    let mut sink = RecordingSink::default();

    let outcome = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_recently_played(&RunContext::new(), &mut sink)
        .unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.records_processed, 2);
    assert_eq!(summary.flags.skipped_items, 1);
    assert_eq!(
        summary.flags.date_range.as_deref(),
        Some("2024-05-01 to 2024-05-02")
    );
    assert_eq!(summary.artist_name, None);

    // Limit is passed through as configured; clamping happens in the client
    let (limit, after_ms) = api.history_args.borrow().unwrap();
    assert_eq!(limit, 200);
    assert_eq!(
        after_ms,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap().timestamp() * 1000
    );

    assert_eq!(sink.batches[0][0].rank, Some(1));
    assert_eq!(sink.batches[0][1].rank, Some(3));
}

#[test]
fn test_recently_played_duplicate_played_at() {
    let api = FakeApi {
        history: vec![
            play_json("1", "2024-05-02T10:00:00.000Z"),
            play_json("2", "2024-05-02T10:00:00.000Z"),
        ],
        ..FakeApi::default()
    };
    let settings = user_settings();
    let mut sink = RecordingSink::default();

    let result = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_recently_played(&RunContext::new(), &mut sink);

    assert!(matches!(result, Err(EtlError::DataIntegrity(_))));
    assert!(sink.batches.is_empty());
}

#[test]
fn test_recently_played_empty_history() {
    let api = FakeApi::default();
    let settings = user_settings();
    let mut sink = RecordingSink::default();

    let outcome = Pipeline::new(&api, &settings)
        .with_clock(now())
        .run_recently_played(&RunContext::new(), &mut sink)
        .unwrap();

    assert_eq!(outcome.summary.status, RunStatus::NoData);
    assert!(sink.batches.is_empty());
}

#[test]
fn test_recently_played_requires_user_token() {
    let api = FakeApi::default();
    let settings = client_settings();
    let mut sink = RecordingSink::default();

    let result = Pipeline::new(&api, &settings).run_recently_played(&RunContext::new(), &mut sink);

    assert!(matches!(result, Err(EtlError::MissingCredentials { .. })));
    assert!(api.calls.borrow().is_empty());
}

#[test]
fn test_top_tracks_into_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("songs.csv");
    let api = FakeApi {
        artist: ed_sheeran(),
        tracks: vec![track_json("1", "Ed Sheeran", 90, false)],
        ..FakeApi::default()
    };
    let settings = client_settings();
    let pipeline = Pipeline::new(&api, &settings).with_clock(now());

    let mut sink = CsvSink::new(&path);
    pipeline.run_top_tracks(&RunContext::new(), &mut sink).unwrap();
    pipeline.run_top_tracks(&RunContext::new(), &mut sink).unwrap();

    // Two runs append two rows under one header
    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), 2);
}

#[test]
fn test_run_context() {
    let now = now();

    let ctx = RunContext::from_json(r#"{"ds": "2024-04-01", "run_id": 7}"#).unwrap();
    assert_eq!(ctx.execution_date(now), "2024-04-01");
    assert_eq!(ctx.get("run_id"), Some("7"));

    let ctx = RunContext::from_json(r#"{"execution_date": "2024-03-01"}"#).unwrap();
    assert_eq!(ctx.execution_date(now), "2024-03-01");

    assert_eq!(RunContext::new().execution_date(now), "2024-05-02");

    assert!(matches!(
        RunContext::from_json("[1, 2]"),
        Err(EtlError::Config(_))
    ));
}
