//! Structured audit logging for governance runs.
//!
//! Every retry decision and site-scan outcome is reported to an
//! [`AuditSink`]. The default [`TracingSink`] forwards events to the
//! `tracing` crate under the `sitesweep::audit` target, tagging each
//! event with the run's correlation identifier so log aggregation can
//! reconstruct a whole sweep. Sinks are observability only: the executor
//! and coordinator never let them influence control flow.

mod events;

pub use events::{AuditSink, NoopSink, TracingSink};
