//! Mediasort - sort pending media into library destinations
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod publisher;
pub mod queue;
pub mod scanner;
pub mod server;
pub mod state;
pub mod streaming;
