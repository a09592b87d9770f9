//! Transform, validate and load stages plus the run orchestrator.
//!
//! Extraction lives in [`crate::spotify`]; everything after the raw JSON
//! items come back is here.

pub mod normalize;
pub mod run;
pub mod sink;
pub mod validate;

pub use normalize::{Diagnostic, Normalized};
pub use run::{Pipeline, RunContext, RunOutcome};
pub use sink::{CsvSink, Sink, SinkTarget, SqliteSink};
pub use validate::{ValidationReport, Verdict};
