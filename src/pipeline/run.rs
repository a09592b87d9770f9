use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    config::{self, Settings},
    error::EtlError,
    spotify::SpotifyApi,
    types::{RunFlags, RunStatus, RunSummary, Track},
    utils,
};

use super::{
    normalize::{self, Normalized},
    sink::Sink,
    validate::{self, ValidationReport, Verdict},
};

/// Trigger context handed in by whatever schedules the run.
///
/// Only the execution date is interpreted (`ds`, or `execution_date`);
/// other keys are carried along untouched.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    values: BTreeMap<String, String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object; scalar values are stringified, nested values
    /// are kept as JSON text.
    pub fn from_json(raw: &str) -> Result<Self, EtlError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| EtlError::Config(format!("context must be a JSON object: {e}")))?;

        let values = map
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();
        Ok(Self { values })
    }

    pub fn with_execution_date(mut self, ds: impl Into<String>) -> Self {
        self.values.insert("ds".to_string(), ds.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The execution date from the context, or today's date.
    pub fn execution_date(&self, now: DateTime<Utc>) -> String {
        let ds = self.get("ds").or_else(|| self.get("execution_date"));
        utils::get_date_from_string(ds, now)
    }
}

/// Result of a completed run: the summary plus the records it produced,
/// for callers that want to display them.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub tracks: Vec<Track>,
}

impl RunSummary {
    pub fn no_data(execution_date: String, artist_name: Option<String>, skipped: usize) -> Self {
        Self {
            status: RunStatus::NoData,
            records_processed: 0,
            unique_artists: 0,
            average_popularity: 0.0,
            flags: RunFlags {
                skipped_items: skipped,
                ..RunFlags::default()
            },
            sink_location: None,
            execution_date,
            artist_name,
            error: None,
        }
    }

    pub fn failed(execution_date: String, error: &EtlError) -> Self {
        Self {
            status: RunStatus::Failed,
            records_processed: 0,
            unique_artists: 0,
            average_popularity: 0.0,
            flags: RunFlags::default(),
            sink_location: None,
            execution_date,
            artist_name: None,
            error: Some(format!("{}: {error}", error.kind())),
        }
    }

    pub fn success(
        execution_date: String,
        artist_name: Option<String>,
        tracks: &[Track],
        skipped: usize,
        report: ValidationReport,
        sink_location: String,
    ) -> Self {
        Self {
            status: RunStatus::Success,
            records_processed: tracks.len(),
            unique_artists: utils::unique_artists(tracks),
            average_popularity: utils::average_popularity(tracks),
            flags: RunFlags {
                explicit_count: tracks.iter().filter(|t| t.explicit).count(),
                skipped_items: skipped,
                stale_count: report.stale_count,
                null_fields: report.null_fields,
                date_range: utils::date_range(tracks),
            },
            sink_location: Some(sink_location),
            execution_date,
            artist_name,
            error: None,
        }
    }
}

/// Sequences extract, normalize, validate and load for one run.
pub struct Pipeline<'a, A: SpotifyApi> {
    api: &'a A,
    settings: &'a Settings,
    clock: Option<DateTime<Utc>>,
}

impl<'a, A: SpotifyApi> Pipeline<'a, A> {
    pub fn new(api: &'a A, settings: &'a Settings) -> Self {
        Self {
            api,
            settings,
            clock: None,
        }
    }

    /// Pins "now" for the history window, freshness check and default
    /// execution date.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Top tracks of the configured artist.
    ///
    /// Resolves client credentials, requests a token, looks the artist up,
    /// fetches their top tracks in the configured market and appends them to
    /// `sink`. An empty track list ends the run with `no_data` and the sink
    /// is never touched.
    ///
    /// # Errors
    ///
    /// Every stage error is logged and returned as-is; nothing is persisted
    /// once a stage has failed.
    pub fn run_top_tracks(
        &self,
        ctx: &RunContext,
        sink: &mut dyn Sink,
    ) -> Result<RunOutcome, EtlError> {
        let now = self.now();
        let execution_date = ctx.execution_date(now);
        let artist_name = self.settings.artist_name.clone();

        tracing::info!(artist = %artist_name, %execution_date, "starting top tracks run");

        let result = self.top_tracks_stages(now, execution_date, artist_name, sink);
        log_outcome("top tracks", result)
    }

    /// The user's listening history of the last 24 hours.
    ///
    /// Uses the pre-provisioned user token; the page size comes from
    /// `SPOTIFY_RECENT_LIMIT` and is clamped to 1..=50.
    pub fn run_recently_played(
        &self,
        ctx: &RunContext,
        sink: &mut dyn Sink,
    ) -> Result<RunOutcome, EtlError> {
        let now = self.now();
        let execution_date = ctx.execution_date(now);

        tracing::info!(%execution_date, "starting recently played run");

        let result = self.recently_played_stages(now, execution_date, sink);
        log_outcome("recently played", result)
    }

    fn top_tracks_stages(
        &self,
        now: DateTime<Utc>,
        execution_date: String,
        artist_name: String,
        sink: &mut dyn Sink,
    ) -> Result<RunOutcome, EtlError> {
        let token = self.client_token()?;
        let artist = self.api.search_artist(&token, &artist_name)?;
        let raw = self
            .api
            .top_tracks(&token, &artist.id, &self.settings.market)?;
        let batch = normalize::normalize_top_tracks(&raw);
        self.finish(batch, now, execution_date, Some(artist_name), sink)
    }

    fn recently_played_stages(
        &self,
        now: DateTime<Utc>,
        execution_date: String,
        sink: &mut dyn Sink,
    ) -> Result<RunOutcome, EtlError> {
        let token = config::resolve_user_token(self.settings)?;

        let after_ms = utils::window_start_ms(now);
        let raw = self
            .api
            .recently_played(&token, self.settings.recent_limit, after_ms)?;
        let batch = normalize::normalize_recently_played(&raw);
        self.finish(batch, now, execution_date, None, sink)
    }

    fn client_token(&self) -> Result<String, EtlError> {
        let credentials = config::resolve_client_credentials(self.settings)?;
        self.api.request_token(&credentials)
    }

    fn finish(
        &self,
        batch: Normalized,
        now: DateTime<Utc>,
        execution_date: String,
        artist_name: Option<String>,
        sink: &mut dyn Sink,
    ) -> Result<RunOutcome, EtlError> {
        let skipped = batch.diagnostics.len();

        let report = match validate::validate(&batch.tracks, now)? {
            Verdict::NoData => {
                return Ok(RunOutcome {
                    summary: RunSummary::no_data(execution_date, artist_name, skipped),
                    tracks: Vec::new(),
                });
            }
            Verdict::Checked(report) => report,
        };

        sink.write(&batch.tracks)?;

        let summary = RunSummary::success(
            execution_date,
            artist_name,
            &batch.tracks,
            skipped,
            report,
            sink.location(),
        );
        tracing::info!(
            records = summary.records_processed,
            unique_artists = summary.unique_artists,
            average_popularity = summary.average_popularity,
            "run summary"
        );

        Ok(RunOutcome {
            summary,
            tracks: batch.tracks,
        })
    }
}

fn log_outcome(job: &str, result: Result<RunOutcome, EtlError>) -> Result<RunOutcome, EtlError> {
    match &result {
        Ok(outcome) => {
            tracing::info!(job, status = ?outcome.summary.status, "run completed");
        }
        Err(e) => {
            tracing::error!(job, kind = e.kind(), error = %e, "run failed");
        }
    }
    result
}
