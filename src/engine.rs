//! Filter engine — routes intercepted traffic to the channel adapters
//!
//! `FilterEngine` owns the positional schema, the escape predicates and the
//! statistics, and pulls one rule snapshot from its `RuleSource` per call.
//! It exposes two layers: value-level entry points taking decoded JSON, and
//! interception-level entry points taking raw frames and response bodies.

use crate::channel::{self, BatchOutcome, Channel, Tally};
use crate::config::{EngineConfig, RuleConfig};
use crate::error::{FilterError, Result};
use crate::filter::{Evaluator, RulePredicate};
use crate::record::PositionalSchema;
use crate::rules::RuleSource;
use crate::stats::{FilterStats, StatsSnapshot};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use std::sync::Arc;

const BINARY_PREVIEW_BYTES: usize = 48;

/// What to do with an intercepted WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameVerdict {
    /// Forward the original frame
    Untouched,
    /// Forward this text instead
    Replace(String),
    /// Do not forward anything
    Drop,
}

/// What to do with an intercepted HTTP response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseVerdict {
    Untouched,
    Replace(Vec<u8>),
}

/// Classification and filtering engine for intercepted traffic
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct FilterEngine {
    rules: Arc<dyn RuleSource>,
    evaluator: Evaluator,
    config: EngineConfig,
    schema: PositionalSchema,
    stats: Arc<FilterStats>,

    /// Lowercased room names matched against frame prefixes
    batch_room: String,
    pass_through_room: String,
}

impl FilterEngine {
    /// Create an engine using the `PULSE_V2` record layout
    pub fn new(rules: Arc<dyn RuleSource>, config: EngineConfig) -> Result<Self> {
        Self::with_schema(rules, config, PositionalSchema::PULSE_V2)
    }

    /// Create an engine with an explicit positional schema
    ///
    /// Fails if the schema or the configuration is inconsistent.
    pub fn with_schema(
        rules: Arc<dyn RuleSource>,
        config: EngineConfig,
        schema: PositionalSchema,
    ) -> Result<Self> {
        schema.validate()?;
        config.validate()?;

        tracing::info!(
            target_host = %config.target_host,
            batch_room = %config.batch_room,
            pass_through_room = %config.pass_through_room,
            response_path = %config.response_path,
            schema_version = schema.version,
            "Filter engine initialized"
        );

        Ok(Self {
            batch_room: config.batch_room.to_lowercase(),
            pass_through_room: config.pass_through_room.to_lowercase(),
            rules,
            evaluator: Evaluator::new(),
            config,
            schema,
            stats: Arc::new(FilterStats::new()),
        })
    }

    /// Replace the escape predicates
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Append an escape predicate
    pub fn add_predicate(&mut self, predicate: impl RulePredicate + 'static) {
        self.evaluator.add_escape(Arc::new(predicate));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schema(&self) -> &PositionalSchema {
        &self.schema
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Shared handle to the statistics accumulator
    pub fn stats(&self) -> Arc<FilterStats> {
        self.stats.clone()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ─── Value level ─────────────────────────────────────────────

    /// Filter a decoded array-batch payload
    pub fn filter_batch(&self, payload: Value) -> Result<Value> {
        Ok(self.run_batch(payload)?.payload)
    }

    /// Filter a decoded object-response body
    ///
    /// A body without the configured list field is returned unchanged.
    pub fn filter_response(&self, mut body: Value) -> Result<Value> {
        self.run_response(&mut body)?;
        Ok(body)
    }

    /// Count a pass-through message and return it unchanged
    pub fn pass_through(&self, payload: Value) -> Value {
        self.stats.record(Channel::PassThrough, 1, 1);
        tracing::debug!(channel = %Channel::PassThrough, "Message passed through");
        payload
    }

    fn run_batch(&self, payload: Value) -> Result<BatchOutcome> {
        let rules = self.rules.snapshot()?;
        let outcome = channel::filter_batch(
            payload,
            &self.config.content_field,
            &self.schema,
            &self.evaluator,
            &rules,
        )?;
        self.record(Channel::ArrayBatch, outcome.tally);
        Ok(outcome)
    }

    /// `None` when the body has no list to filter
    fn run_response(&self, body: &mut Value) -> Result<Option<Tally>> {
        let rules = self.rules.snapshot()?;
        match self.filter_response_with(body, &rules) {
            Ok(tally) => {
                self.record(Channel::ObjectResponse, tally);
                Ok(Some(tally))
            }
            Err(FilterError::MissingListField { path }) => {
                tracing::debug!(path = %path, "No list field in response, passing through");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn filter_response_with(&self, body: &mut Value, rules: &RuleConfig) -> Result<Tally> {
        channel::filter_response_in_place(body, &self.config.response, &self.evaluator, rules)
    }

    fn record(&self, channel: Channel, tally: Tally) {
        self.stats.record(channel, tally.seen, tally.kept);
        tracing::debug!(
            channel = %channel,
            seen = tally.seen,
            kept = tally.kept,
            malformed = tally.malformed,
            "Filtered"
        );
    }

    // ─── Interception level ──────────────────────────────────────

    /// Whether `host` belongs to the filtered service
    pub fn is_target_host(&self, host: &str) -> bool {
        host.contains(&self.config.target_host)
    }

    /// Detect the room of a frame from its leading characters
    ///
    /// The pass-through room wins when both names appear.
    pub fn classify_frame(&self, text: &str) -> Option<Channel> {
        let probe: String = text
            .chars()
            .take(self.config.room_probe_len)
            .collect::<String>()
            .to_lowercase();

        if probe.contains(&self.pass_through_room) {
            Some(Channel::PassThrough)
        } else if probe.contains(&self.batch_room) {
            Some(Channel::ArrayBatch)
        } else {
            None
        }
    }

    /// Handle a server-to-client text frame
    ///
    /// Frames that cannot be decoded or do not match an accepted framing are
    /// forwarded untouched. Only a missing rule configuration is an error.
    pub fn handle_ws_text(&self, text: &str) -> Result<FrameVerdict> {
        match self.classify_frame(text) {
            Some(Channel::ArrayBatch) => self.handle_batch_frame(text),
            Some(Channel::PassThrough) => {
                self.stats.record(Channel::PassThrough, 1, 1);
                tracing::debug!(channel = %Channel::PassThrough, "Frame passed through");
                Ok(FrameVerdict::Untouched)
            }
            _ => Ok(FrameVerdict::Untouched),
        }
    }

    /// Handle a server-to-client frame delivered as bytes
    pub fn handle_ws_bytes(&self, bytes: &[u8]) -> Result<FrameVerdict> {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.handle_ws_text(text),
            Err(_) => {
                let preview = &bytes[..bytes.len().min(BINARY_PREVIEW_BYTES)];
                tracing::debug!(
                    len = bytes.len(),
                    preview = %BASE64.encode(preview),
                    "Binary frame is not UTF-8, forwarding untouched"
                );
                Ok(FrameVerdict::Untouched)
            }
        }
    }

    fn handle_batch_frame(&self, text: &str) -> Result<FrameVerdict> {
        let payload: Value = match serde_json::from_str(text) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode batch frame");
                return Ok(FrameVerdict::Untouched);
            }
        };

        let outcome = match self.run_batch(payload) {
            Ok(outcome) => outcome,
            Err(e @ FilterError::ConfigurationUnavailable(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Batch frame not filtered");
                return Ok(FrameVerdict::Untouched);
            }
        };

        if outcome.tally.kept == 0 && self.config.drop_empty_batches {
            tracing::debug!(seen = outcome.tally.seen, "Dropping empty batch frame");
            return Ok(FrameVerdict::Drop);
        }
        if !outcome.modified {
            return Ok(FrameVerdict::Untouched);
        }

        Ok(FrameVerdict::Replace(serde_json::to_string(&outcome.payload)?))
    }

    /// Handle an HTTP response body for `method path`
    pub fn handle_http_response(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<ResponseVerdict> {
        if !self.is_filtered_endpoint(method, path) {
            return Ok(ResponseVerdict::Untouched);
        }

        let mut value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to decode response body");
                return Ok(ResponseVerdict::Untouched);
            }
        };

        match self.run_response(&mut value)? {
            Some(tally) if tally.kept < tally.seen => {
                Ok(ResponseVerdict::Replace(serde_json::to_vec(&value)?))
            }
            _ => Ok(ResponseVerdict::Untouched),
        }
    }

    fn is_filtered_endpoint(&self, method: &str, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        method.eq_ignore_ascii_case(&self.config.response_method)
            && path == self.config.response_path
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("config", &self.config)
            .field("schema_version", &self.schema.version)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}
