use crate::record::Record;
use std::fmt;

/// Ad hoc keep condition evaluated after the base policy
///
/// Predicates are pure functions of the record; they never see the rule
/// configuration.
pub trait RulePredicate: Send + Sync {
    /// Short identifier used in logs and decisions
    fn name(&self) -> &str;

    /// True if the record should be kept regardless of the base policy
    fn matches(&self, record: &dyn Record) -> bool;
}

/// Keep records whose market cap (in SOL) exceeds a threshold
#[derive(Debug, Clone, Copy)]
pub struct MinMarketCap(pub f64);

impl RulePredicate for MinMarketCap {
    fn name(&self) -> &str {
        "min_market_cap"
    }

    fn matches(&self, record: &dyn Record) -> bool {
        record.market_cap_sol().is_some_and(|mc| mc > self.0)
    }
}

/// Keep records with at least this many holders
#[derive(Debug, Clone, Copy)]
pub struct MinHolders(pub u64);

impl RulePredicate for MinHolders {
    fn name(&self) -> &str {
        "min_holders"
    }

    fn matches(&self, record: &dyn Record) -> bool {
        record.num_holders().is_some_and(|n| n >= self.0)
    }
}

/// Closure-backed predicate
pub struct FnPredicate<F> {
    name: String,
    f: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&dyn Record) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> RulePredicate for FnPredicate<F>
where
    F: Fn(&dyn Record) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, record: &dyn Record) -> bool {
        (self.f)(record)
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate").field("name", &self.name).finish()
    }
}
