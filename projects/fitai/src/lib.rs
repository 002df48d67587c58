//! FitAI front controller, API client and workout planner.
//!
//! The binary in `src/main.rs` runs the gateway and the planner service;
//! the modules are public so integration tests can build routers directly.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod planner;
