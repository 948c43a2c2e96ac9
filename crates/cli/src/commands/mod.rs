//! Command implementations.

mod info;
mod query;
mod validate;

pub use info::run_info;
pub use query::{run_label_values, run_query, run_query_range, run_series};
pub use validate::run_validate;
