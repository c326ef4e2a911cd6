//! Input-processing plugins.

use crate::{MutableTransaction, PluginError, WalletError, WalletResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extension that attaches or checks extra input data.
pub trait Plugin: Send + Sync {
    /// Plugin identifier; also the key of its data in the transaction.
    fn id(&self) -> u8;

    /// Process the inputs of a transaction under construction.
    fn process_inputs(&self, transaction: &mut MutableTransaction) -> Result<(), PluginError>;
}

/// Runs plugins over a transaction once its inputs are set.
pub trait PluginManager: Send + Sync {
    /// Process the transaction's inputs with every registered plugin.
    fn process_inputs(&self, transaction: &mut MutableTransaction) -> WalletResult<()>;
}

/// Plugins keyed by id, run in ascending id order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<BTreeMap<u8, Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any plugin with the same id.
    pub fn add_plugin(&self, plugin: Arc<dyn Plugin>) {
        let id = plugin.id();
        if self.plugins.write().insert(id, plugin).is_some() {
            warn!(plugin = id, "Replaced registered plugin");
        }
    }

    /// Remove a plugin by id.
    pub fn remove_plugin(&self, id: u8) -> bool {
        self.plugins.write().remove(&id).is_some()
    }

    /// Registered ids in run order.
    pub fn plugin_ids(&self) -> Vec<u8> {
        self.plugins.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

impl PluginManager for PluginRegistry {
    fn process_inputs(&self, transaction: &mut MutableTransaction) -> WalletResult<()> {
        // Snapshot so plugins never run under the lock.
        let plugins: Vec<Arc<dyn Plugin>> = self.plugins.read().values().cloned().collect();

        for plugin in plugins {
            let id = plugin.id();
            plugin
                .process_inputs(transaction)
                .map_err(|source| WalletError::Plugin { id, source })?;
            debug!(plugin = id, "Plugin processed inputs");
        }
        Ok(())
    }
}
