//! Array-batch adapter for `update_pulse_v2` frames

use super::Tally;
use crate::config::RuleConfig;
use crate::error::{FilterError, Result};
use crate::filter::Evaluator;
use crate::record::{PositionalRecord, PositionalSchema};
use serde_json::Value;

/// Filtered batch payload and its tally
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub payload: Value,
    pub tally: Tally,
    /// False when `payload` is identical to the input
    pub modified: bool,
}

/// Filter a list of positional records, preserving relative order
///
/// Malformed elements are dropped and counted, never propagated.
pub fn filter_records(
    records: Vec<Value>,
    schema: &PositionalSchema,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> (Vec<Value>, Tally) {
    let mut tally = Tally::default();
    let mut kept = Vec::with_capacity(records.len());

    for (index, value) in records.into_iter().enumerate() {
        tally.seen += 1;

        let keep = match PositionalRecord::new(&value, schema) {
            Ok(record) => {
                let decision = evaluator.evaluate(&record, rules);
                tracing::trace!(index, decision = ?decision, "Record evaluated");
                decision.is_keep()
            }
            Err(e) => {
                tally.malformed += 1;
                tracing::warn!(index, error = %e, "Dropping malformed record");
                false
            }
        };

        if keep {
            tally.kept += 1;
            kept.push(value);
        }
    }

    (kept, tally)
}

/// Filter a batch payload in any accepted framing
///
/// - `[records, total_count]`: `total_count` is rewritten to the kept count
/// - `{"<content_field>": <either of the above or below>, ...}`: other
///   envelope fields are left as they are
/// - `records`: a bare list
///
/// A two-element `[list of arrays, scalar]` whose scalar is not a number is
/// rejected as `InvalidFrame` rather than read as a bare list.
pub fn filter_batch(
    payload: Value,
    content_field: &str,
    schema: &PositionalSchema,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> Result<BatchOutcome> {
    match payload {
        Value::Array(_) => filter_framed(payload, schema, evaluator, rules),
        Value::Object(mut envelope) => {
            let slot = match envelope.get_mut(content_field) {
                Some(slot) if slot.is_array() => slot,
                Some(_) => {
                    return Err(FilterError::InvalidFrame(format!(
                        "'{}' is not an array",
                        content_field
                    )))
                }
                None => {
                    return Err(FilterError::InvalidFrame(format!(
                        "missing '{}' field",
                        content_field
                    )))
                }
            };

            let outcome = filter_framed(std::mem::take(slot), schema, evaluator, rules)?;
            *slot = outcome.payload;
            Ok(BatchOutcome {
                payload: Value::Object(envelope),
                ..outcome
            })
        }
        other => Err(FilterError::InvalidFrame(format!(
            "expected array or object batch payload, got {}",
            type_name(&other)
        ))),
    }
}

fn filter_framed(
    value: Value,
    schema: &PositionalSchema,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> Result<BatchOutcome> {
    let mut parts = match value {
        Value::Array(parts) => parts,
        other => {
            return Err(FilterError::InvalidFrame(format!(
                "expected array batch, got {}",
                type_name(&other)
            )))
        }
    };

    let counted = match parts.as_mut_slice() {
        [Value::Array(records), total @ Value::Number(_)] => {
            let (kept, tally) = filter_records(std::mem::take(records), schema, evaluator, rules);
            let modified = tally.kept != tally.seen || total.as_u64() != Some(tally.kept);
            *records = kept;
            *total = Value::from(tally.kept);
            Some((tally, modified))
        }
        [Value::Array(records), total]
            if !total.is_array() && records.iter().all(Value::is_array) =>
        {
            return Err(FilterError::InvalidFrame(format!(
                "total count must be a number, got {}",
                type_name(total)
            )));
        }
        _ => None,
    };

    if let Some((tally, modified)) = counted {
        return Ok(BatchOutcome {
            payload: Value::Array(parts),
            tally,
            modified,
        });
    }

    let (kept, tally) = filter_records(parts, schema, evaluator, rules);
    Ok(BatchOutcome {
        payload: Value::Array(kept),
        tally,
        modified: tally.kept != tally.seen,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::pulse_item;
    use serde_json::json;

    fn strict() -> RuleConfig {
        RuleConfig::permissive()
            .with_dev_filter(true)
            .with_funding_filter(true)
            .with_dev_addresses(["Addr1"])
            .with_funder_addresses(["Addr9"])
    }

    fn run(payload: Value, rules: &RuleConfig) -> BatchOutcome {
        filter_batch(
            payload,
            "content",
            &PositionalSchema::PULSE_V2,
            &Evaluator::new(),
            rules,
        )
        .unwrap()
    }

    fn counted_parts(payload: &Value) -> (&Vec<Value>, u64) {
        let records = payload[0].as_array().unwrap();
        let count = payload[1].as_u64().unwrap();
        (records, count)
    }

    #[test]
    fn test_counted_batch_keeps_matching_record() {
        let rec_a = pulse_item("Addr1", Some("Addr9"));
        let rec_b = pulse_item("Addr2", Some("Addr9"));
        let payload = json!([[rec_a.clone(), rec_b], 2]);

        let outcome = run(payload, &strict());

        assert_eq!(outcome.payload, json!([[rec_a], 1]));
        assert_eq!(
            outcome.tally,
            Tally {
                seen: 2,
                kept: 1,
                malformed: 0
            }
        );
    }

    #[test]
    fn test_count_matches_length() {
        let payload = json!([
            [
                pulse_item("Addr1", Some("Addr9")),
                pulse_item("Addr1", None),
                pulse_item("Addr1", Some("Addr9")),
                pulse_item("Addr3", Some("Addr9"))
            ],
            4
        ]);
        let outcome = run(payload, &strict());
        let (records, count) = counted_parts(&outcome.payload);
        assert_eq!(records.len() as u64, count);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let payload = json!([
            [
                pulse_item("Addr1", Some("Addr9")),
                pulse_item("Addr2", Some("Addr9")),
                pulse_item("Addr1", Some("Addr9"))
            ],
            3
        ]);
        let once = run(payload, &strict());
        let twice = run(once.payload.clone(), &strict());
        assert_eq!(once.payload, twice.payload);
        assert_eq!(twice.tally.seen, twice.tally.kept);
    }

    #[test]
    fn test_order_preserved() {
        let first = pulse_item("Addr1", Some("Addr9"));
        let mut second = pulse_item("Addr1", Some("Addr9"));
        second[3] = json!("Second");
        let payload = json!([[first.clone(), pulse_item("ZZ", None), second.clone()], 3]);

        let outcome = run(payload, &strict());
        assert_eq!(outcome.payload, json!([[first, second], 2]));
    }

    #[test]
    fn test_malformed_record_dropped_without_aborting() {
        let good = pulse_item("Addr1", Some("Addr9"));
        let payload = json!([[json!(["too", "short"]), good.clone(), json!("garbage")], 3]);

        let outcome = run(payload, &strict());

        assert_eq!(outcome.payload, json!([[good], 1]));
        assert_eq!(outcome.tally.seen, 3);
        assert_eq!(outcome.tally.kept, 1);
        assert_eq!(outcome.tally.malformed, 2);
    }

    #[test]
    fn test_malformed_record_dropped_even_when_permissive() {
        let payload = json!([[json!([1, 2, 3]), pulse_item("X", None)], 2]);
        let outcome = run(payload, &RuleConfig::permissive());
        let (records, count) = counted_parts(&outcome.payload);
        assert_eq!(records.len(), 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_envelope_with_counted_content() {
        let good = pulse_item("Addr1", Some("Addr9"));
        let payload = json!({
            "room": "update_pulse_v2",
            "content": [[good.clone(), pulse_item("Bad", None)], 2]
        });

        let outcome = run(payload, &strict());

        assert_eq!(outcome.payload["room"], "update_pulse_v2");
        assert_eq!(outcome.payload["content"], json!([[good], 1]));
    }

    #[test]
    fn test_envelope_with_bare_list() {
        let good = pulse_item("Addr1", Some("Addr9"));
        let payload = json!({
            "room": "update_pulse_v2",
            "content": [good.clone(), pulse_item("Bad", None)]
        });

        let outcome = run(payload, &strict());
        assert_eq!(outcome.payload["content"], json!([good]));
        assert_eq!(outcome.tally.kept, 1);
    }

    #[test]
    fn test_bare_list() {
        let good = pulse_item("Addr1", Some("Addr9"));
        let outcome = run(json!([pulse_item("Bad", None), good.clone()]), &strict());
        assert_eq!(outcome.payload, json!([good]));
    }

    #[test]
    fn test_empty_result_keeps_shape() {
        let payload = json!([[pulse_item("Bad", None)], 1]);
        let outcome = run(payload, &strict());
        assert_eq!(outcome.payload, json!([[], 0]));
    }

    #[test]
    fn test_empty_batch() {
        let outcome = run(json!([[], 0]), &strict());
        assert_eq!(outcome.payload, json!([[], 0]));
        assert_eq!(outcome.tally, Tally::default());
    }

    #[test]
    fn test_stale_count_is_rewritten() {
        let keep = pulse_item("Addr1", Some("Addr9"));
        let outcome = run(json!([[keep.clone()], 5]), &strict());
        assert_eq!(outcome.payload, json!([[keep], 1]));
        assert!(outcome.modified);
    }

    #[test]
    fn test_unmodified_when_everything_kept() {
        let keep = pulse_item("Addr1", Some("Addr9"));
        assert!(!run(json!([[keep.clone()], 1]), &strict()).modified);
        assert!(!run(json!([keep.clone()]), &strict()).modified);
        assert!(!run(json!({"content": [[keep], 1]}), &strict()).modified);
        assert!(run(json!([[pulse_item("Bad", None)], 1]), &strict()).modified);
    }

    #[test]
    fn test_non_numeric_count_is_invalid_frame() {
        let keep = pulse_item("Addr1", Some("Addr9"));
        let rules = strict();
        let evaluator = Evaluator::new();
        let schema = PositionalSchema::PULSE_V2;

        for total in [json!("2"), Value::Null, json!(true)] {
            let payload = json!([[keep.clone(), pulse_item("Addr2", None)], total]);
            let err = filter_batch(payload, "content", &schema, &evaluator, &rules).unwrap_err();
            assert!(matches!(err, FilterError::InvalidFrame(ref m) if m.contains("total count")));
        }

        let payload = json!([[], null]);
        assert!(filter_batch(payload, "content", &schema, &evaluator, &rules).is_err());
    }

    #[test]
    fn test_bare_list_with_trailing_scalar_is_not_counted() {
        let keep = pulse_item("Addr1", Some("Addr9"));
        let outcome = run(json!([keep.clone(), "junk"]), &strict());
        assert_eq!(outcome.payload, json!([keep]));
        assert_eq!(outcome.tally.malformed, 1);
    }

    #[test]
    fn test_invalid_frames() {
        let rules = strict();
        let evaluator = Evaluator::new();
        let schema = PositionalSchema::PULSE_V2;

        for payload in [
            json!("text"),
            json!(42),
            json!({"room": "update_pulse_v2"}),
            json!({"content": {"not": "a list"}}),
        ] {
            let err = filter_batch(payload, "content", &schema, &evaluator, &rules).unwrap_err();
            assert!(matches!(err, FilterError::InvalidFrame(_)));
        }
    }
}
