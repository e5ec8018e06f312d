//! Filter evaluator — keep/drop decisions for a single record
//!
//! The base policy is an AND of the enabled identity checks. Extension
//! predicates sit on top as OR-escapes: they are consulted only when the base
//! policy drops a record, and any one of them matching keeps it.

mod predicate;

pub use predicate::{FnPredicate, MinHolders, MinMarketCap, RulePredicate};

use crate::config::RuleConfig;
use crate::record::Record;
use std::fmt;
use std::sync::Arc;

/// Why the base policy rejected a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Developer address absent or not allow-listed
    DevNotAllowed,
    /// No funding wallet known for the developer
    FundingAbsent,
    /// Funding wallet not allow-listed
    FunderNotAllowed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::DevNotAllowed => "dev address not allowed",
            DropReason::FundingAbsent => "funding wallet absent",
            DropReason::FunderNotAllowed => "funding wallet not allowed",
        };
        f.write_str(s)
    }
}

/// Outcome of evaluating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No check enabled
    KeepPermissive,
    /// Every enabled check passed
    KeepAllowListed,
    /// Base policy failed but the named predicate matched
    KeepEscape(String),
    Drop(DropReason),
}

impl Decision {
    pub fn is_keep(&self) -> bool {
        !matches!(self, Decision::Drop(_))
    }
}

/// Stateless evaluator with an ordered list of escape predicates
#[derive(Clone, Default)]
pub struct Evaluator {
    escapes: Vec<Arc<dyn RulePredicate>>,
}

impl Evaluator {
    /// Evaluator applying only the base policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an escape predicate
    pub fn with_escape(mut self, predicate: impl RulePredicate + 'static) -> Self {
        self.escapes.push(Arc::new(predicate));
        self
    }

    pub fn add_escape(&mut self, predicate: Arc<dyn RulePredicate>) {
        self.escapes.push(predicate);
    }

    pub fn escape_names(&self) -> Vec<&str> {
        self.escapes.iter().map(|p| p.name()).collect()
    }

    /// Keep or drop, with the reason
    pub fn evaluate(&self, record: &dyn Record, rules: &RuleConfig) -> Decision {
        let reason = match base_policy(record, rules) {
            Ok(decision) => return decision,
            Err(reason) => reason,
        };

        match self.escapes.iter().find(|p| p.matches(record)) {
            Some(predicate) => Decision::KeepEscape(predicate.name().to_string()),
            None => Decision::Drop(reason),
        }
    }

    /// Keep (`true`) or drop (`false`)
    pub fn decide(&self, record: &dyn Record, rules: &RuleConfig) -> bool {
        self.evaluate(record, rules).is_keep()
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("escapes", &self.escape_names())
            .finish()
    }
}

/// AND of the enabled checks; permissive when none is enabled
fn base_policy(record: &dyn Record, rules: &RuleConfig) -> Result<Decision, DropReason> {
    if rules.is_permissive() {
        return Ok(Decision::KeepPermissive);
    }

    if rules.filter_by_dev_address {
        match record.dev_address() {
            Some(dev) if rules.allows_dev(dev) => {}
            _ => return Err(DropReason::DevNotAllowed),
        }
    }

    if rules.filter_by_funding_wallet {
        match record.funding_wallet_address() {
            None => return Err(DropReason::FundingAbsent),
            Some(funder) if !rules.allows_funder(funder) => {
                return Err(DropReason::FunderNotAllowed)
            }
            Some(_) => {}
        }
    }

    Ok(Decision::KeepAllowListed)
}

/// Evaluate with the base policy only
pub fn decide(record: &dyn Record, rules: &RuleConfig) -> bool {
    base_policy(record, rules).is_ok()
}
