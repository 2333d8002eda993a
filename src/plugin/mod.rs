//! Plugin Module
//!
//! Provides the managed-unit contract:
//! - Plugin capability traits
//! - Named plugins and the ordered registry

pub mod interface;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use interface::{Close, Plugin, PluginError, PluginResult, PostInit};
pub use registry::{Capabilities, NamedPlugin, PluginRegistry, Release};
