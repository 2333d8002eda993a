//! Core utilities and common types for the agent.

pub mod error;
pub mod types;

pub use error::{Error, Phase, ReleaseFailure, Result};
pub use types::*;
