//! Filter and engine configuration
//!
//! Both structs deserialize from camelCase JSON with per-field defaults, so
//! an operator only needs to spell out what differs from the stock setup.

use crate::channel::ResponseShape;
use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Well-known exchange hot wallets that fund developer wallets
pub mod wallets {
    pub const BINANCE: &str = "5tzFkiKscXHK5ZXCGbXZxdw7gTjjD1mBwuoFbhUvuAi9";
    pub const KUCOIN: &str = "BmFdpraQhkiDQE6SnfG5omcA1VwzqfXrwtNYBwWTymy6";
    pub const BYBIT: &str = "iGdFcQoyR2MwbXMHQskhmNsqddZ6rinsipHc4TNSdwu";
    pub const MEXC: &str = "ASTyfSima4LLAdDgoFGkgqoKowG1LZFDr9fAQrg7iaJZ";
}

/// Enabled checks and allow-listed addresses
///
/// Addresses are held in canonical form: surrounding whitespace removed,
/// never empty. Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Require the developer address to be in `dev_addresses`
    #[serde(default)]
    pub filter_by_dev_address: bool,

    /// Require the funding wallet to be in `funder_addresses`
    #[serde(default = "default_true")]
    pub filter_by_funding_wallet: bool,

    /// Developer allow-set
    #[serde(default)]
    pub dev_addresses: HashSet<String>,

    /// Funder allow-set
    #[serde(default = "default_funders")]
    pub funder_addresses: HashSet<String>,
}

fn default_true() -> bool {
    true
}

fn default_funders() -> HashSet<String> {
    [wallets::KUCOIN, wallets::MEXC, wallets::BYBIT]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            filter_by_dev_address: false,
            filter_by_funding_wallet: default_true(),
            dev_addresses: HashSet::new(),
            funder_addresses: default_funders(),
        }
    }
}

impl RuleConfig {
    /// Both checks disabled, empty allow-sets: every record is kept
    pub fn permissive() -> Self {
        Self {
            filter_by_dev_address: false,
            filter_by_funding_wallet: false,
            dev_addresses: HashSet::new(),
            funder_addresses: HashSet::new(),
        }
    }

    /// Parse from JSON, canonicalizing every address
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: RuleConfig = serde_json::from_str(json)
            .map_err(|e| FilterError::Config(format!("Invalid rule configuration: {}", e)))?;
        config.dev_addresses = canonical_set(config.dev_addresses)?;
        config.funder_addresses = canonical_set(config.funder_addresses)?;
        Ok(config)
    }

    pub fn with_dev_filter(mut self, enabled: bool) -> Self {
        self.filter_by_dev_address = enabled;
        self
    }

    pub fn with_funding_filter(mut self, enabled: bool) -> Self {
        self.filter_by_funding_wallet = enabled;
        self
    }

    /// Replace the developer allow-set; blank entries are skipped
    pub fn with_dev_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dev_addresses = addresses
            .into_iter()
            .filter_map(|a| canonical_address(a.as_ref()).ok())
            .collect();
        self
    }

    /// Replace the funder allow-set; blank entries are skipped
    pub fn with_funder_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.funder_addresses = addresses
            .into_iter()
            .filter_map(|a| canonical_address(a.as_ref()).ok())
            .collect();
        self
    }

    pub fn allows_dev(&self, address: &str) -> bool {
        self.dev_addresses.contains(address)
    }

    pub fn allows_funder(&self, address: &str) -> bool {
        self.funder_addresses.contains(address)
    }

    /// True when neither check is enabled
    pub fn is_permissive(&self) -> bool {
        !self.filter_by_dev_address && !self.filter_by_funding_wallet
    }
}

/// Canonical form of an operator-supplied address
pub fn canonical_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(FilterError::Config("Address cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn canonical_set(addresses: HashSet<String>) -> Result<HashSet<String>> {
    addresses.iter().map(|a| canonical_address(a)).collect()
}

/// Routing and channel settings for a [`FilterEngine`](crate::FilterEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Host substring identifying intercepted traffic
    #[serde(default = "default_target_host")]
    pub target_host: String,

    /// Room whose frames carry positional batches
    #[serde(default = "default_batch_room")]
    pub batch_room: String,

    /// Room counted and forwarded without filtering
    #[serde(default = "default_pass_through_room")]
    pub pass_through_room: String,

    /// Number of leading characters searched for a room name
    #[serde(default = "default_room_probe_len")]
    pub room_probe_len: usize,

    /// Envelope key holding the batch of a room frame
    #[serde(default = "default_content_field")]
    pub content_field: String,

    /// HTTP method of the filtered endpoint
    #[serde(default = "default_response_method")]
    pub response_method: String,

    /// HTTP path of the filtered endpoint
    #[serde(default = "default_response_path")]
    pub response_path: String,

    /// Where the entity list sits inside a response body
    #[serde(default)]
    pub response: ResponseShape,

    /// Drop a batch frame entirely when no record survives
    #[serde(default)]
    pub drop_empty_batches: bool,
}

fn default_target_host() -> String {
    "axiom.trade".to_string()
}

fn default_batch_room() -> String {
    "update_pulse_v2".to_string()
}

fn default_pass_through_room() -> String {
    "new_pairs".to_string()
}

fn default_room_probe_len() -> usize {
    50
}

fn default_content_field() -> String {
    "content".to_string()
}

fn default_response_method() -> String {
    "POST".to_string()
}

fn default_response_path() -> String {
    "/pulse".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_host: default_target_host(),
            batch_room: default_batch_room(),
            pass_through_room: default_pass_through_room(),
            room_probe_len: default_room_probe_len(),
            content_field: default_content_field(),
            response_method: default_response_method(),
            response_path: default_response_path(),
            response: ResponseShape::default(),
            drop_empty_batches: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| FilterError::Config(format!("Invalid engine configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make routing impossible
    pub fn validate(&self) -> Result<()> {
        if self.batch_room.is_empty() || self.pass_through_room.is_empty() {
            return Err(FilterError::Config("Room names cannot be empty".to_string()));
        }
        if self.batch_room == self.pass_through_room {
            return Err(FilterError::Config(format!(
                "Batch and pass-through rooms must differ (both '{}')",
                self.batch_room
            )));
        }
        if self.room_probe_len == 0 {
            return Err(FilterError::Config(
                "Room probe length must be >= 1".to_string(),
            ));
        }
        if self.response.list_path.iter().any(|segment| segment.is_empty()) {
            return Err(FilterError::Config(
                "Response list path cannot contain empty segments".to_string(),
            ));
        }
        Ok(())
    }
}
