//! # Voxlead Gateway
//!
//! The HTTP surface: lead intake, contact form, the dispatch cron
//! trigger, and health/info endpoints.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
