//! Scripted plugins shared by the unit tests.

use crate::plugin::interface::{Close, Plugin, PluginError, PluginResult, PostInit};
use crate::plugin::registry::NamedPlugin;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, ordered record of plugin calls (`"init:etcd"`, `"close:etcd"`...).
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, op: &str, name: &str) {
        self.0.lock().unwrap().push(format!("{}:{}", op, name));
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Calls of one operation, in order, as plugin names.
    pub fn calls_of(&self, op: &str) -> Vec<String> {
        let prefix = format!("{}:", op);
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// Plugin whose behaviour is configured up front.
pub struct MockPlugin {
    name: String,
    journal: Journal,
    fail_init: bool,
    panic_init: bool,
    after_init: bool,
    fail_after_init: bool,
    close: bool,
    fail_close: bool,
    init_delay: Option<Duration>,
    init_block: Option<Duration>,
    after_init_delay: Option<Duration>,
}

impl MockPlugin {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            fail_init: false,
            panic_init: false,
            after_init: false,
            fail_after_init: false,
            close: true,
            fail_close: false,
            init_delay: None,
            init_block: None,
            after_init_delay: None,
        }
    }

    pub fn fail_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn panic_init(mut self) -> Self {
        self.panic_init = true;
        self
    }

    pub fn with_after_init(mut self) -> Self {
        self.after_init = true;
        self
    }

    pub fn fail_after_init(mut self) -> Self {
        self.after_init = true;
        self.fail_after_init = true;
        self
    }

    pub fn without_close(mut self) -> Self {
        self.close = false;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    /// Block the executor thread during `init` instead of yielding.
    pub fn init_block(mut self, duration: Duration) -> Self {
        self.init_block = Some(duration);
        self
    }

    pub fn after_init_delay(mut self, delay: Duration) -> Self {
        self.after_init = true;
        self.after_init_delay = Some(delay);
        self
    }

    pub fn named(self) -> NamedPlugin {
        let name = self.name.clone();
        NamedPlugin::new(&name, self)
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    async fn init(&self) -> PluginResult<()> {
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(duration) = self.init_block {
            std::thread::sleep(duration);
        }
        self.journal.record("init", &self.name);
        if self.panic_init {
            panic!("{} exploded", self.name);
        }
        if self.fail_init {
            return Err(PluginError::new(&format!("{} init failed", self.name)));
        }
        Ok(())
    }

    fn as_post_init(&self) -> Option<&dyn PostInit> {
        if self.after_init {
            Some(self)
        } else {
            None
        }
    }

    fn as_close(&self) -> Option<&dyn Close> {
        if self.close {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl PostInit for MockPlugin {
    async fn after_init(&self) -> PluginResult<()> {
        if let Some(delay) = self.after_init_delay {
            tokio::time::sleep(delay).await;
        }
        self.journal.record("after_init", &self.name);
        if self.fail_after_init {
            return Err(PluginError::new(&format!("{} after init failed", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl Close for MockPlugin {
    async fn close(&self) -> PluginResult<()> {
        self.journal.record("close", &self.name);
        if self.fail_close {
            return Err(PluginError::new(&format!("{} close failed", self.name)));
        }
        Ok(())
    }
}
