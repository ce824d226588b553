//! Incident Tracker
//!
//! Tracks incidents through their lifecycle (open, in progress, waiting,
//! resolved or cancelled) behind a REST API. Every use case runs inside one
//! unit of work that commits on success and rolls back on error, over either
//! PostgreSQL or an in-memory store.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod incidents;
pub mod metrics;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
