//! Core domain types
//!
//! This module contains the core domain structures used across Chief crates.
//! They are shared between the daemon (which executes and tracks runs) and the
//! client/CLI (which submit definitions and display run state).

pub mod access;
pub mod pipeline;
pub mod run;
