//! Report persistence.
//!
//! Every sweep ends in one standardized JSON document per run
//! ([`RunDocument`]), written by the [`ReportWriter`] into the configured
//! log directory. [`compose_daily_summary`] rolls the day's documents up
//! into a plain-text summary for delivery channels.

mod document;
mod summary;
mod writer;

pub use document::RunDocument;
pub use summary::{compose_daily_summary, STANDARD_REPORT_PREFIXES};
pub use writer::{report_path, ReportWriter};
