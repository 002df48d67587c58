//! Deterministic rule-based workout planner, served over HTTP.

pub mod generator;
pub mod model;
mod service;

pub use service::{routes, serve, SERVICE_NAME};
