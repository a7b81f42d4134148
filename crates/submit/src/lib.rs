//! Imperative shell for the festival submission store.
//!
//! `submit_core` holds the pure pieces (keys, cursors, entities, ranking).
//! This crate wires them to storage backends and runs the vote tally.

pub mod aggregator;
pub mod cancellation;
pub mod catalog;
pub mod config;
pub mod storage;

pub use aggregator::{TallyReport, VoteAggregator};
pub use cancellation::{CancelHandle, Cancellation};
pub use catalog::Catalog;
pub use config::Config;
