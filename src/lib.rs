//! kiln.ai - live process console for kiln plants
//!
//! This library provides the history store, session management, telemetry
//! feed and HTTP presentation layer behind the `kiln` console server.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod telemetry;
