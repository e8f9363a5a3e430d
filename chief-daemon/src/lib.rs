//! Chief daemon
//!
//! Accepts pipeline definitions over a local HTTP control plane, runs each one
//! through fetch, build and deploy, and reports progress.

pub mod access;
pub mod api;
pub mod config;
pub mod server;
pub mod service;
pub mod state;

pub use config::{Config, WorkspaceRetention};
pub use server::Daemon;
