//! Plugin interface definition.
//!
//! Defines the capabilities a managed plugin can expose. `Plugin` is
//! mandatory; `PostInit` and `Close` are optional and discovered through
//! the `as_post_init` / `as_close` queries.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Plugin-specific error.
#[derive(Clone, Debug)]
pub struct PluginError {
    /// Error message
    pub message: String,
    /// Underlying cause, if any
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl PluginError {
    /// Create a new error.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source<E>(message: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.to_string(),
            source: Some(Arc::new(source)),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for PluginError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source("io error", err)
    }
}

impl From<String> for PluginError {
    fn from(message: String) -> Self {
        Self {
            message,
            source: None,
        }
    }
}

impl From<&str> for PluginError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Plugin trait that all plugins must implement.
///
/// Plugins are shared between the caller and the background startup task,
/// so every operation takes `&self`; plugins keep their own state behind
/// interior mutability.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Initialize the plugin. Plugins earlier in the registry are
    /// already initialized when this runs.
    async fn init(&self) -> PluginResult<()>;

    /// Second-phase capability, if supported.
    fn as_post_init(&self) -> Option<&dyn PostInit> {
        None
    }

    /// Release capability, if supported. `None` means nothing to release.
    fn as_close(&self) -> Option<&dyn Close> {
        None
    }
}

/// Optional second initialization phase, run once every plugin has passed `init`.
#[async_trait]
pub trait PostInit: Send + Sync {
    /// Finish initialization that depends on all other plugins.
    async fn after_init(&self) -> PluginResult<()>;
}

/// Optional resource release.
#[async_trait]
pub trait Close: Send + Sync {
    /// Release resources held by the plugin.
    async fn close(&self) -> PluginResult<()>;
}

/// Run a plugin future, turning a panic into a `PluginError`.
pub(crate) async fn call_guarded<F>(fut: F) -> PluginResult<()>
where
    F: Future<Output = PluginResult<()>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(PluginError::from(format!("panicked: {}", panic_message(&*panic)))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
