//! Core of the festival submission store.
//!
//! Everything in this crate is pure: entity types and their record encoding,
//! the key codec, the pagination codec, the storage traits that backends
//! implement, and the vote ranking math. Backends and the aggregation job
//! live in the `submit` crate.

pub mod entity;
pub mod ranking;
pub mod storage;
