//! # greenmatch API
//!
//! REST endpoints for ingestion, matching, narratives and maintenance.

pub mod rest;

pub use rest::{configure, AppState, RestApi};
