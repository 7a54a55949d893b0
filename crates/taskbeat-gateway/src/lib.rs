//! # TaskBeat Gateway
//! HTTP surface of the event processor: lifecycle event intake,
//! an externally callable reminder trigger, subscription discovery,
//! and a health check.

pub mod routes;
pub mod server;

pub use server::{build_router, serve, AppState};
