//! # CLI Module
//!
//! Command-line runners for the two ETL jobs. Each runner resolves settings,
//! builds the sink and the Spotify client, hands them to
//! [`crate::pipeline::Pipeline`] and reports the resulting
//! [`crate::types::RunSummary`].
//!
//! ## Commands
//!
//! - [`top_tracks`] - top tracks of the configured artist, CSV by default
//! - [`recent`] - last 24 hours of listening history, SQLite by default
//!
//! ## Output
//!
//! With `--json` the summary is the only thing written to stdout, as one JSON
//! document, for both successful and failed runs. Otherwise a short colored
//! report is printed, followed by a track table unless display is turned off
//! with `--no-display` or `SPOTIFY_DISPLAY_RESULTS=false`.
//!
//! Diagnostics from the pipeline go through `tracing` to stderr and never mix
//! with the summary.
//!
//! ## Exit Codes
//!
//! A run that ends in `success` or `no_data` exits 0. Any stage error exits 1.
//!
//! ## Usage
//!
//! ```bash
//! spotetl top-tracks                                   # append to songs.csv
//! spotetl top-tracks --sink sqlite --json              # top_tracks table, JSON summary
//! spotetl recent --context '{"ds":"2024-05-01"}'       # recently_played table
//! spotetl --log-level debug recent --sink csv --no-display
//! ```

mod job;
mod recent;
mod top_tracks;

pub use job::{JobOptions, SinkKind};
pub use recent::recent;
pub use top_tracks::top_tracks;
