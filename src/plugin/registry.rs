//! Ordered plugin registry.
//!
//! Registry order is the only dependency declaration plugins have:
//! initialization walks it front to back, release walks it back to front.

use crate::core::{Error, Result};
use crate::plugin::interface::{call_guarded, Plugin, PluginResult, PostInit};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Optional capabilities detected when a plugin is registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Implements `PostInit`
    pub post_init: bool,
    /// Implements `Close`
    pub close: bool,
}

impl Capabilities {
    fn detect(plugin: &dyn Plugin) -> Self {
        Self {
            post_init: plugin.as_post_init().is_some(),
            close: plugin.as_close().is_some(),
        }
    }
}

/// Outcome of a successful release attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// `Close::close` ran and succeeded
    Closed,
    /// The plugin has no `Close` capability
    NothingToRelease,
    /// Release was already attempted earlier
    AlreadyReleased,
}

/// A plugin paired with the name used for logging and error attribution.
pub struct NamedPlugin {
    name: String,
    plugin: Arc<dyn Plugin>,
    capabilities: Capabilities,
    released: AtomicBool,
}

impl NamedPlugin {
    /// Register a plugin under a name.
    pub fn new<P: Plugin + 'static>(name: &str, plugin: P) -> Self {
        Self::from_arc(name, Arc::new(plugin))
    }

    /// Register an already shared plugin under a name.
    pub fn from_arc(name: &str, plugin: Arc<dyn Plugin>) -> Self {
        let capabilities = Capabilities::detect(plugin.as_ref());
        Self {
            name: name.to_string(),
            plugin,
            capabilities,
            released: AtomicBool::new(false),
        }
    }

    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin itself.
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    /// Capabilities captured at registration.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Second-phase handle, if the plugin registered with one.
    pub fn post_init(&self) -> Option<&dyn PostInit> {
        if self.capabilities.post_init {
            self.plugin.as_post_init()
        } else {
            None
        }
    }

    /// Whether release has been attempted.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub(crate) async fn init(&self) -> PluginResult<()> {
        call_guarded(self.plugin.init()).await
    }

    pub(crate) async fn after_init(&self, post: &dyn PostInit) -> PluginResult<()> {
        call_guarded(post.after_init()).await
    }

    /// Release the plugin's resources.
    ///
    /// Release is attempted at most once; later calls report
    /// `Release::AlreadyReleased` without touching the plugin, even when
    /// the first attempt failed.
    pub async fn release(&self) -> PluginResult<Release> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(Release::AlreadyReleased);
        }
        let closer = if self.capabilities.close {
            self.plugin.as_close()
        } else {
            None
        };
        match closer {
            Some(closer) => {
                call_guarded(closer.close()).await?;
                Ok(Release::Closed)
            }
            None => Ok(Release::NothingToRelease),
        }
    }
}

impl std::fmt::Debug for NamedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedPlugin")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Ordered, immutable collection of named plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<NamedPlugin>,
}

impl PluginRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(plugins: Vec<NamedPlugin>) -> Result<Self> {
        let mut seen = HashSet::new();
        for plugin in &plugins {
            if !seen.insert(plugin.name()) {
                return Err(Error::DuplicatePlugin(plugin.name().to_string()));
            }
        }
        Ok(Self { plugins })
    }

    /// Plugins in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, NamedPlugin> {
        self.plugins.iter()
    }

    /// Plugins as a slice, in registry order.
    pub fn as_slice(&self) -> &[NamedPlugin] {
        &self.plugins
    }

    /// Get plugin by name.
    pub fn get(&self, name: &str) -> Option<&NamedPlugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Plugin names in registry order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Get plugin count.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry holds no plugins.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<'a> IntoIterator for &'a PluginRegistry {
    type Item = &'a NamedPlugin;
    type IntoIter = std::slice::Iter<'a, NamedPlugin>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.iter()
    }
}
