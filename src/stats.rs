//! Per-channel filtering statistics

use crate::channel::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// `kept` is published after `seen` and read before it, so a loaded pair
/// never reports more kept than seen
#[derive(Debug, Default)]
struct Counter {
    seen: AtomicU64,
    kept: AtomicU64,
}

impl Counter {
    fn add(&self, seen: u64, kept: u64) {
        self.seen.fetch_add(seen, Ordering::Relaxed);
        self.kept.fetch_add(kept, Ordering::Release);
    }

    fn load(&self) -> ChannelCounts {
        let kept = self.kept.load(Ordering::Acquire);
        let seen = self.seen.load(Ordering::Relaxed);
        ChannelCounts { seen, kept }
    }
}

/// Monotonic seen/kept counters for every channel
///
/// Counters only grow for the lifetime of the accumulator.
#[derive(Debug)]
pub struct FilterStats {
    array_batch: Counter,
    object_response: Counter,
    pass_through: Counter,
    started_at: DateTime<Utc>,
}

impl FilterStats {
    pub fn new() -> Self {
        Self {
            array_batch: Counter::default(),
            object_response: Counter::default(),
            pass_through: Counter::default(),
            started_at: Utc::now(),
        }
    }

    fn counter(&self, channel: Channel) -> &Counter {
        match channel {
            Channel::ArrayBatch => &self.array_batch,
            Channel::ObjectResponse => &self.object_response,
            Channel::PassThrough => &self.pass_through,
        }
    }

    /// Add `seen` and `kept` to a channel's counters
    pub fn record(&self, channel: Channel, seen: u64, kept: u64) {
        debug_assert!(kept <= seen, "kept ({}) exceeds seen ({})", kept, seen);
        self.counter(channel).add(seen, kept);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            array_batch: self.array_batch.load(),
            object_response: self.object_response.load(),
            pass_through: self.pass_through.load(),
        }
    }
}

impl Default for FilterStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Seen/kept pair for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub seen: u64,
    pub kept: u64,
}

impl ChannelCounts {
    pub fn dropped(&self) -> u64 {
        self.seen.saturating_sub(self.kept)
    }
}

/// Point-in-time copy of [`FilterStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub array_batch: ChannelCounts,
    pub object_response: ChannelCounts,
    pub pass_through: ChannelCounts,
}

impl StatsSnapshot {
    pub fn get(&self, channel: Channel) -> ChannelCounts {
        match channel {
            Channel::ArrayBatch => self.array_batch,
            Channel::ObjectResponse => self.object_response,
            Channel::PassThrough => self.pass_through,
        }
    }

    /// Sum over all channels
    pub fn total(&self) -> ChannelCounts {
        Channel::ALL
            .iter()
            .map(|c| self.get(*c))
            .fold(ChannelCounts::default(), |acc, c| ChannelCounts {
                seen: acc.seen + c.seen,
                kept: acc.kept + c.kept,
            })
    }
}
