//! Service Module
//!
//! Run execution for the daemon.
//! The engine drives runs, the registry holds their observable state.

pub mod engine;
pub mod fetcher;
pub mod process;
pub mod registry;

pub use engine::{EngineSettings, RunEngine};
pub use fetcher::{GitFetcher, SourceFetcher};
pub use registry::{RegistryError, RunRegistry};
