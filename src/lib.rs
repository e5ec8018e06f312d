//! # a3s-filter
//!
//! Traffic classification and inclusion filtering for intercepted pair feeds.
//!
//! ## Overview
//!
//! `a3s-filter` sits between an interception transport and a client. It
//! decodes messages from two channels, keeps only the pairs whose developer
//! and funding wallet pass the configured allow-lists, and rebuilds each
//! payload in the shape it arrived in. It never performs I/O itself.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_filter::{EngineConfig, FilterEngine, RuleConfig, RuleStore};
//! use std::sync::Arc;
//!
//! # fn example() -> a3s_filter::Result<()> {
//! // Only keep pairs funded by a known wallet
//! let store = Arc::new(RuleStore::new(
//!     RuleConfig::permissive()
//!         .with_funding_filter(true)
//!         .with_funder_addresses(["Funder1"]),
//! ));
//! let engine = FilterEngine::new(store.clone(), EngineConfig::default())?;
//!
//! let body = serde_json::json!({
//!     "pairs": [{"devAddress": "Dev1", "devWalletFunding": {"fundingWalletAddress": "Funder1"}}],
//!     "count": 1
//! });
//! let filtered = engine.filter_response(body)?;
//! assert_eq!(filtered["count"], 1);
//!
//! // Rules can change at any time; the next call sees the new set
//! store.remove_funder_address("Funder1")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Channels
//!
//! - **array-batch** — positional records streamed in `update_pulse_v2` frames
//! - **object-response** — JSON objects returned by `POST /pulse`
//! - **pass-through** — `new_pairs` frames, counted but never filtered
//!
//! ## Architecture
//!
//! - **Record** trait — one accessor surface over both record encodings
//! - **PositionalSchema** — versioned field-to-offset table
//! - **Evaluator** — base allow-list policy plus `RulePredicate` escapes
//! - **RuleSource** trait — consistent rule snapshots, implemented by `RuleStore`
//! - **FilterEngine** — routing, adapters, and statistics

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod record;
pub mod rules;
pub mod stats;

// Re-export core types
pub use channel::{BatchOutcome, Channel, ResponseOutcome, ResponseShape, Tally};
pub use config::{EngineConfig, RuleConfig};
pub use engine::{FilterEngine, FrameVerdict, ResponseVerdict};
pub use error::{FilterError, Result};
pub use filter::{
    decide, Decision, DropReason, Evaluator, FnPredicate, MinHolders, MinMarketCap, RulePredicate,
};
pub use record::{Field, Funding, ObjectRecord, PositionalRecord, PositionalSchema, Record};
pub use rules::{RuleChange, RuleSource, RuleStore};
pub use stats::{ChannelCounts, FilterStats, StatsSnapshot};
