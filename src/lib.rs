//! Spotify Listening ETL Library
//!
//! Batch jobs that pull track data from the Spotify Web API, flatten it into
//! fixed-schema records, run a few quality checks and append the batch to a
//! CSV file or a SQLite table. Each run ends with a [`types::RunSummary`].
//!
//! # Modules
//!
//! - `cli` - Command-line job runners and console output
//! - `config` - Layered configuration (variable store, environment, `.env`)
//! - `error` - Error taxonomy shared by all stages
//! - `logging` - Tracing subscriber setup
//! - `pipeline` - Normalize, validate and load stages plus the orchestrator
//! - `spotify` - Blocking Spotify Web API client
//! - `types` - Wire schemas, records and summaries
//! - `utils` - Date, limit and statistics helpers
//!
//! # Example
//!
//! ```
//! use spotetl::{config::Settings, pipeline::{Pipeline, RunContext, SinkTarget}, spotify::SpotifyClient};
//!
//! fn main() -> Result<(), spotetl::error::EtlError> {
//!     let settings = Settings::load(None)?;
//!     let client = SpotifyClient::new(&settings)?;
//!     let mut sink = SinkTarget::parse("songs.csv")?.open("top_tracks");
//!     let outcome = Pipeline::new(&client, &settings)
//!         .run_top_tracks(&RunContext::new(), sink.as_mut())?;
//!     println!("{}", outcome.summary.records_processed);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching top tracks for {}", artist);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Saved {} records", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark to stderr and exits
/// the program with code 1.
///
/// Only used by the command-line layer; library code returns
/// [`error::EtlError`] instead.
///
/// # Example
///
/// ```
/// error!("Cannot load configuration: {}", e);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("{} items were skipped", skipped);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
