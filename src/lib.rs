//! Aggregation pipeline and report generator for video-game sales tables.
//!
//! Load a table with [`loader::load_and_clean`], describe the derived table a
//! chart needs with an [`request::AggregationRequest`], and run it. The
//! built-in dashboard views live in [`views`].

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod request;
pub mod types;
pub mod util;
pub mod views;

pub use error::{Error, Result};
pub use request::{AggregationRequest, Predicate};
pub use types::{AggregatedRow, Dimension, Measure, RankedRow, SalesField, SalesRecord, Value};
