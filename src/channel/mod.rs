//! Channel adapters — per-message-kind orchestration
//!
//! Each adapter takes a decoded payload, runs every record it carries through
//! the evaluator against one rule snapshot, and rebuilds a payload of the
//! same shape. Adapters never touch statistics; they report a [`Tally`] that
//! the engine records.

mod batch;
mod response;

pub use batch::{filter_batch, filter_records, BatchOutcome};
pub use response::{filter_response, filter_response_in_place, ResponseOutcome, ResponseShape};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distinct message kinds with their own filtering policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Positional batches streamed over the WebSocket
    ArrayBatch,
    /// JSON object responses from the HTTP endpoint
    ObjectResponse,
    /// Messages counted but never filtered
    PassThrough,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::ArrayBatch,
        Channel::ObjectResponse,
        Channel::PassThrough,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::ArrayBatch => "array-batch",
            Channel::ObjectResponse => "object-response",
            Channel::PassThrough => "pass-through",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records seen and kept by one adapter call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub seen: u64,
    pub kept: u64,
    /// Subset of `seen - kept` rejected before evaluation
    pub malformed: u64,
}

impl Tally {
    pub fn dropped(&self) -> u64 {
        self.seen.saturating_sub(self.kept)
    }
}
