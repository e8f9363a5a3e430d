//! Data Transfer Objects for daemon/client communication
//!
//! This module contains DTOs exchanged between the Chief daemon's control plane
//! and its clients (CLI, scripts). DTOs are lightweight representations of
//! domain entities optimized for network transfer.

pub mod run;
pub mod server;

/// Header carrying the caller's username on privileged requests
pub const USER_HEADER: &str = "x-chief-user";

/// Header carrying the caller's password on privileged requests
pub const PASSWORD_HEADER: &str = "x-chief-password";
