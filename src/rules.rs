//! Rule store — concurrent snapshots of the active rule configuration
//!
//! Readers take one immutable `Arc<RuleConfig>` per filtering call and never
//! block writers. Writers publish a fresh copy with read-copy-update, so a
//! batch is always judged against a single consistent configuration even
//! while an operator is editing the allow-sets.

use crate::config::{canonical_address, RuleConfig};
use crate::error::{FilterError, Result};
use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Source of rule snapshots consumed by the engine
///
/// Implementations must return a snapshot that does not change after it is
/// handed out.
pub trait RuleSource: Send + Sync {
    /// Current rule configuration
    fn snapshot(&self) -> Result<Arc<RuleConfig>>;
}

/// A mutation applied to a [`RuleStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RuleChange {
    /// Whole configuration replaced
    Installed,
    DevFilterToggled { enabled: bool },
    FundingFilterToggled { enabled: bool },
    DevAddressAdded { address: String },
    DevAddressRemoved { address: String },
    FunderAddressAdded { address: String },
    FunderAddressRemoved { address: String },
}

/// In-process rule store with copy-on-write publication
pub struct RuleStore {
    current: ArcSwapOption<RuleConfig>,
    changes: broadcast::Sender<RuleChange>,
}

impl RuleStore {
    /// Create a store holding `config`
    pub fn new(config: RuleConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current: ArcSwapOption::new(Some(Arc::new(config))),
            changes,
        }
    }

    /// Create a store with no configuration yet
    ///
    /// Snapshots and mutations fail with `ConfigurationUnavailable` until
    /// [`RuleStore::install`] is called.
    pub fn unconfigured() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current: ArcSwapOption::empty(),
            changes,
        }
    }

    /// Replace the whole configuration
    pub fn install(&self, config: RuleConfig) {
        tracing::info!(
            dev_filter = config.filter_by_dev_address,
            funding_filter = config.filter_by_funding_wallet,
            dev_addresses = config.dev_addresses.len(),
            funder_addresses = config.funder_addresses.len(),
            "Rule configuration installed"
        );
        self.current.store(Some(Arc::new(config)));
        self.notify(RuleChange::Installed);
    }

    /// Whether any configuration has been installed
    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn dev_filter_enabled(&self) -> Result<bool> {
        Ok(self.snapshot()?.filter_by_dev_address)
    }

    pub fn funding_filter_enabled(&self) -> Result<bool> {
        Ok(self.snapshot()?.filter_by_funding_wallet)
    }

    pub fn set_dev_filter(&self, enabled: bool) -> Result<()> {
        let changed = self.update(|config| {
            let changed = config.filter_by_dev_address != enabled;
            config.filter_by_dev_address = enabled;
            changed
        })?;
        if changed {
            self.notify(RuleChange::DevFilterToggled { enabled });
        }
        Ok(())
    }

    pub fn set_funding_filter(&self, enabled: bool) -> Result<()> {
        let changed = self.update(|config| {
            let changed = config.filter_by_funding_wallet != enabled;
            config.filter_by_funding_wallet = enabled;
            changed
        })?;
        if changed {
            self.notify(RuleChange::FundingFilterToggled { enabled });
        }
        Ok(())
    }

    /// Add a developer address; returns false if it was already present
    pub fn add_dev_address(&self, address: &str) -> Result<bool> {
        let address = canonical_address(address)?;
        let added = self.update(|config| config.dev_addresses.insert(address.clone()))?;
        if added {
            self.notify(RuleChange::DevAddressAdded { address });
        }
        Ok(added)
    }

    /// Remove a developer address; returns false if it was not present
    pub fn remove_dev_address(&self, address: &str) -> Result<bool> {
        let address = canonical_address(address)?;
        let removed = self.update(|config| config.dev_addresses.remove(&address))?;
        if removed {
            self.notify(RuleChange::DevAddressRemoved { address });
        }
        Ok(removed)
    }

    /// Add a funder address; returns false if it was already present
    pub fn add_funder_address(&self, address: &str) -> Result<bool> {
        let address = canonical_address(address)?;
        let added = self.update(|config| config.funder_addresses.insert(address.clone()))?;
        if added {
            self.notify(RuleChange::FunderAddressAdded { address });
        }
        Ok(added)
    }

    /// Remove a funder address; returns false if it was not present
    pub fn remove_funder_address(&self, address: &str) -> Result<bool> {
        let address = canonical_address(address)?;
        let removed = self.update(|config| config.funder_addresses.remove(&address))?;
        if removed {
            self.notify(RuleChange::FunderAddressRemoved { address });
        }
        Ok(removed)
    }

    /// Observe mutations applied after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RuleChange> {
        self.changes.subscribe()
    }

    /// Apply `f` to a private copy and publish it
    ///
    /// `f` may run more than once if writers race; its return value from the
    /// winning attempt is returned.
    fn update<F>(&self, mut f: F) -> Result<bool>
    where
        F: FnMut(&mut RuleConfig) -> bool,
    {
        let mut outcome = None;
        let previous = self.current.rcu(|current| {
            current.as_ref().map(|config| {
                let mut next = RuleConfig::clone(config);
                outcome = Some(f(&mut next));
                Arc::new(next)
            })
        });

        match (previous, outcome) {
            (Some(_), Some(changed)) => Ok(changed),
            _ => Err(unavailable()),
        }
    }

    fn notify(&self, change: RuleChange) {
        tracing::info!(change = ?change, "Rule configuration changed");
        // No subscribers is not an error
        let _ = self.changes.send(change);
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl RuleSource for RuleStore {
    fn snapshot(&self) -> Result<Arc<RuleConfig>> {
        self.current.load_full().ok_or_else(unavailable)
    }
}

fn unavailable() -> FilterError {
    FilterError::ConfigurationUnavailable("no rule configuration installed".to_string())
}
