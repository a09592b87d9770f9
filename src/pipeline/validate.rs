use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::{error::EtlError, types::Track, utils};

/// Records older than this many days are reported as stale.
pub const FRESHNESS_DAYS: i64 = 7;

/// Outcome of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to persist. Terminal, but not a failure.
    NoData,
    Checked(ValidationReport),
}

/// Non-blocking findings. None of these stop persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub null_fields: Vec<String>,
    pub stale_count: usize,
}

/// Runs every check against a normalized batch.
///
/// Only a duplicate `played_at` fails the run: two history rows with the same
/// play instant mean the same window was processed twice.
pub fn validate(batch: &[Track], now: DateTime<Utc>) -> Result<Verdict, EtlError> {
    if batch.is_empty() {
        tracing::warn!("no songs downloaded, finishing execution");
        return Ok(Verdict::NoData);
    }

    check_unique_played_at(batch)?;

    let null_fields = null_fields(batch);
    if !null_fields.is_empty() {
        tracing::warn!(fields = ?null_fields, "null values found in data");
    }

    let stale_count = count_stale(batch, now);
    if stale_count > 0 {
        tracing::warn!(
            stale_count,
            days = FRESHNESS_DAYS,
            "found tracks older than the freshness window"
        );
    }

    Ok(Verdict::Checked(ValidationReport {
        null_fields,
        stale_count,
    }))
}

pub fn check_unique_played_at(batch: &[Track]) -> Result<(), EtlError> {
    let mut seen = HashSet::new();
    for played_at in batch
        .iter()
        .filter_map(|t| t.played_at.as_deref())
        .filter(|p| !p.is_empty())
    {
        if !seen.insert(played_at) {
            return Err(EtlError::DataIntegrity(format!(
                "primary key check violated: duplicate played_at {played_at}"
            )));
        }
    }
    Ok(())
}

/// Optional columns left empty in a history batch.
///
/// A batch is a history listing when any record carries a rank or a play
/// time; every record of such a listing must have both. Top-tracks batches
/// carry neither, so nothing is reported for them.
pub fn null_fields(batch: &[Track]) -> Vec<String> {
    let columns: [(&str, fn(&Track) -> bool); 2] = [
        ("played_at", |t| t.played_at.is_some()),
        ("rank", |t| t.rank.is_some()),
    ];

    let history = batch
        .iter()
        .any(|t| columns.iter().any(|(_, present)| present(t)));
    if !history {
        return Vec::new();
    }

    columns
        .iter()
        .filter(|(_, present)| batch.iter().any(|t| !present(t)))
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn count_stale(batch: &[Track], now: DateTime<Utc>) -> usize {
    let cutoff = (now - Duration::days(FRESHNESS_DAYS)).date_naive();

    batch
        .iter()
        .filter_map(Track::timestamp)
        .filter(|timestamp| match utils::parse_day(timestamp) {
            Some(day) => day < cutoff,
            None => {
                tracing::error!(timestamp, "cannot parse play date");
                false
            }
        })
        .count()
}
