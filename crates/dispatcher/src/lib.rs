//! # Dispatcher
//!
//! Fan-out query federation.
//!
//! Handles:
//! - Running one unit of work per backend for every logical call
//! - Folding the outcomes through the merge engine
//! - Partial-failure semantics: one successful backend is enough
//! - Cancellation of every in-flight backend call when the caller gives up
//!
//! ## Example
//!
//! ```ignore
//! use dispatcher::MultiBackend;
//! use contracts::{Backend, CancellationToken};
//!
//! let proxy = MultiBackend::new(vec![prom_a, prom_b], Duration::from_secs(10));
//! let values = proxy.label_values(&CancellationToken::new(), "job").await?;
//! ```

pub mod aggregate;
pub mod fanout;
pub mod multi;

pub use aggregate::aggregate;
pub use fanout::{cancel_after, fan_out, Mailbox};
pub use multi::MultiBackend;
