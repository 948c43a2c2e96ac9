//! # Backends
//!
//! Concrete [`contracts::Backend`] implementations that need no running
//! Prometheus server.
//!
//! - [`MockBackend`]: scripted answers, injectable failures and latency
//! - [`FixtureBackend`]: serves a JSON snapshot captured from a real backend

mod fixture;
mod mock;

pub use fixture::{Fixture, FixtureBackend};
pub use mock::{MockBackend, MockConfig};
