//! Server protocol clients.
//!
//! The sweep coordinator talks to the BI server through the
//! [`ServerClient`] trait, which captures the handful of REST capabilities
//! governance sweeps need: sign-in/out, site enumeration, site switching,
//! and the per-resource listing calls.
//!
//! ## Available Clients
//!
//! - [`mock`] - An in-memory server with programmable fixtures and
//!   failures, used throughout the crate's tests
//! - [`rest`] - The real REST implementation (requires the `rest` feature)
//!
//! ## Implementing a Custom Client
//!
//! ```rust,ignore
//! use sitesweep::client::{AuthToken, ServerClient};
//! use sitesweep::core::{Credentials, Site, SweepResult};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct MyClient;
//!
//! #[async_trait]
//! impl ServerClient for MyClient {
//!     async fn sign_in(&self, credentials: &Credentials) -> SweepResult<AuthToken> {
//!         // Exchange the token for a session...
//!         todo!()
//!     }
//!     // ...remaining capabilities
//! }
//! ```

pub mod mock;
mod session;
mod traits;

#[cfg(feature = "rest")]
pub mod rest;

pub use mock::{MockFailure, MockServer};
pub use session::Session;
pub use traits::{ArcServerClient, AuthToken, ServerClient};

#[cfg(feature = "rest")]
pub use rest::{RestClient, RestConfig};
