//! Chief Core
//!
//! Core types and abstractions for the Chief CI/CD daemon.
//!
//! This crate contains:
//! - Domain types: Pipeline specs, runs, phases and access clearances
//! - DTOs: Data transfer objects exchanged between the daemon and its clients
//! - The pipeline definition parser
//! - The access configuration document and password hashing

pub mod access;
pub mod domain;
pub mod dto;
pub mod parser;

pub use parser::{DefinitionError, parse_definition, parse_definition_file};
