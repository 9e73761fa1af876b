//! speedy daemon library.
//!
//! Exposes the daemon's building blocks for integration testing.
//! In production, the `speedy` binary (main.rs) drives them.

pub mod cli;
pub mod health;
pub mod logging;
pub mod metrics_server;
pub mod modules;
pub mod orchestrator;
pub mod pid_file;
