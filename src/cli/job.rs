use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::Settings,
    error,
    error::EtlError,
    info,
    pipeline::{RunContext, RunOutcome, SinkTarget},
    success,
    types::{RunStatus, RunSummary},
    utils, warning,
};

/// Destination kind selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    Csv,
    Sqlite,
}

/// Flags shared by every job command.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub variables: Option<PathBuf>,
    pub sink: Option<SinkKind>,
    pub execution_date: Option<String>,
    pub context: Option<String>,
    pub json: bool,
    pub no_display: bool,
}

impl JobOptions {
    /// Builds the trigger context. `--execution-date` overrides any date in
    /// `--context`.
    pub fn run_context(&self) -> Result<RunContext, EtlError> {
        let ctx = match &self.context {
            Some(raw) => RunContext::from_json(raw)?,
            None => RunContext::new(),
        };
        Ok(self.with_date(ctx))
    }

    /// Context carrying only `--execution-date`, for reporting a `--context`
    /// that could not be parsed.
    pub fn date_context(&self) -> RunContext {
        self.with_date(RunContext::new())
    }

    fn with_date(&self, ctx: RunContext) -> RunContext {
        match &self.execution_date {
            Some(ds) => ctx.with_execution_date(ds.clone()),
            None => ctx,
        }
    }

    /// Settings from the variable store and the environment.
    pub fn load_settings(&self) -> Result<Settings, EtlError> {
        Settings::load(self.variables.as_deref())
    }

    pub fn sink_target(
        &self,
        default: SinkKind,
        settings: &Settings,
        csv_file: &str,
    ) -> Result<SinkTarget, EtlError> {
        match self.sink.unwrap_or(default) {
            SinkKind::Csv => Ok(SinkTarget::Csv(settings.csv_location(csv_file))),
            SinkKind::Sqlite => SinkTarget::parse(&settings.database_location),
        }
    }

    /// Summary reported for a run that failed with `e`, dated from `ctx`.
    pub fn failed_summary(&self, ctx: &RunContext, e: &EtlError) -> RunSummary {
        RunSummary::failed(ctx.execution_date(Utc::now()), e)
    }

    /// Context, settings and sink target for a job. Exits on error; every
    /// failure after the context is parsed is dated from it.
    pub(super) fn prepare(
        &self,
        default: SinkKind,
        csv_file: &str,
    ) -> (RunContext, Settings, SinkTarget) {
        let ctx = match self.run_context() {
            Ok(ctx) => ctx,
            Err(e) => self.fail(&self.date_context(), &e),
        };
        let settings = match self.load_settings() {
            Ok(settings) => settings,
            Err(e) => self.fail(&ctx, &e),
        };
        let target = match self.sink_target(default, &settings, csv_file) {
            Ok(target) => target,
            Err(e) => self.fail(&ctx, &e),
        };
        (ctx, settings, target)
    }

    /// Prints the outcome of a run, or a failed summary and exits 1.
    pub(super) fn report(
        &self,
        ctx: &RunContext,
        settings: &Settings,
        result: Result<RunOutcome, EtlError>,
    ) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => self.fail(ctx, &e),
        };

        if self.json {
            print_json(&outcome.summary);
            return;
        }

        print_summary(&outcome.summary);
        if settings.display_results && !self.no_display && !outcome.tracks.is_empty() {
            println!("{}", Table::new(utils::track_table_rows(&outcome.tracks)));
        }
    }

    pub(super) fn fail(&self, ctx: &RunContext, e: &EtlError) -> ! {
        if self.json {
            print_json(&self.failed_summary(ctx, e));
            std::process::exit(1);
        }
        error!("{}", e);
    }
}

pub(super) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

fn print_json(summary: &RunSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Cannot serialize run summary. Err: {}", e),
    }
}

fn print_summary(summary: &RunSummary) {
    match summary.status {
        RunStatus::Success => success!(
            "Saved {} records to {}",
            summary.records_processed,
            summary.sink_location.as_deref().unwrap_or("-")
        ),
        RunStatus::NoData => {
            warning!("No songs downloaded for {}", summary.execution_date);
            return;
        }
        RunStatus::Failed => {
            error!("{}", summary.error.as_deref().unwrap_or("run failed"));
        }
    }

    if let Some(artist) = &summary.artist_name {
        info!("Artist: {}", artist);
    }
    info!("Execution date: {}", summary.execution_date);
    info!(
        "Unique artists: {}, average popularity: {:.2}",
        summary.unique_artists, summary.average_popularity
    );

    let flags = &summary.flags;
    if let Some(range) = &flags.date_range {
        info!("Played between {}", range);
    }
    if flags.explicit_count > 0 {
        info!("Explicit tracks: {}", flags.explicit_count);
    }
    if flags.skipped_items > 0 {
        warning!("Skipped {} malformed items", flags.skipped_items);
    }
    if flags.stale_count > 0 {
        warning!("{} tracks are older than a week", flags.stale_count);
    }
    if !flags.null_fields.is_empty() {
        warning!("Null values in: {}", flags.null_fields.join(", "));
    }
}
