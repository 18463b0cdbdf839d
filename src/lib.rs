//! newreleases - recent release aggregation for a music catalog
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod engine;
pub mod merge;
pub mod retrieval;
pub mod scheduler;
pub mod sources;
