//! Database query modules.
//!
//! - batches: queued batch CRUD and listing

pub mod batches;
