//! Multi-site sweep orchestration.
//!
//! The [`SweepCoordinator`] owns a run's whole lifecycle: sign in once,
//! enumerate every site, switch into each in enumeration order, invoke
//! the scanner, and concatenate the results. A server error inside one
//! site skips that site and continues; anything else aborts the run. The
//! session is signed out on every exit path.

mod coordinator;

pub use coordinator::{SweepCoordinator, SweepCoordinatorBuilder, SweepOutcome};
