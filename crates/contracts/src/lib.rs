//! # Contracts
//!
//! Frozen interface contracts shared by every promfed crate: the backend
//! capability trait, the query result model, and the unified error type.
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - Sample timestamps are Unix epoch milliseconds (`i64`), matching the
//!   Prometheus data model
//! - Query evaluation times use `chrono::DateTime<Utc>`

mod api;
mod backend;
mod error;
mod labels;
mod value;

pub use api::{ApiKind, CallStatus, MetricFn};
pub use backend::{Backend, LocalBackend};
pub use error::*;
pub use labels::*;
pub use value::*;

pub use tokio_util::sync::CancellationToken;
