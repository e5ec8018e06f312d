//! Object-response adapter for `/pulse` bodies

use super::Tally;
use crate::config::RuleConfig;
use crate::error::{FilterError, Result};
use crate::filter::Evaluator;
use crate::record::ObjectRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Location of the entity list inside a response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseShape {
    /// Object keys leading to the list; empty means the body is the list
    #[serde(default = "default_list_path")]
    pub list_path: Vec<String>,

    /// Numeric siblings of the list that report its length
    #[serde(default = "default_count_fields")]
    pub count_fields: Vec<String>,

    /// The body is one entity object rather than a list; `list_path` and
    /// `count_fields` are ignored
    #[serde(default)]
    pub single_entity: bool,
}

fn default_list_path() -> Vec<String> {
    vec!["pairs".to_string()]
}

fn default_count_fields() -> Vec<String> {
    vec!["count".to_string(), "total".to_string()]
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self {
            list_path: default_list_path(),
            count_fields: default_count_fields(),
            single_entity: false,
        }
    }
}

impl ResponseShape {
    /// Shape for a body that is itself the entity list
    pub fn top_level() -> Self {
        Self {
            list_path: Vec::new(),
            count_fields: Vec::new(),
            single_entity: false,
        }
    }

    /// Shape for a body holding a single entity object
    ///
    /// A dropped entity is replaced by `{}`.
    pub fn single() -> Self {
        Self {
            single_entity: true,
            ..Self::top_level()
        }
    }

    pub fn at<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list_path: path.into_iter().map(Into::into).collect(),
            count_fields: default_count_fields(),
            single_entity: false,
        }
    }

    fn display_path(&self) -> String {
        if self.single_entity {
            "<entity>".to_string()
        } else if self.list_path.is_empty() {
            "<body>".to_string()
        } else {
            self.list_path.join(".")
        }
    }
}

/// Filtered response body and its tally
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub body: Value,
    pub tally: Tally,
}

/// Filter the entity list of a response body
///
/// Fails with `MissingListField` when the path does not lead to a list, or
/// in single-entity mode when the body is not an object. Siblings of the
/// list are preserved; numeric count siblings named in `shape.count_fields`
/// are rewritten to the kept count. A dropped single entity becomes `{}`.
pub fn filter_response(
    mut body: Value,
    shape: &ResponseShape,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> Result<ResponseOutcome> {
    let tally = filter_response_in_place(&mut body, shape, evaluator, rules)?;
    Ok(ResponseOutcome { body, tally })
}

/// Same as [`filter_response`], editing `body` directly
///
/// `body` is left untouched when an error is returned.
pub fn filter_response_in_place(
    body: &mut Value,
    shape: &ResponseShape,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> Result<Tally> {
    if shape.single_entity {
        return filter_entity(body, shape, evaluator, rules);
    }

    let Some((last, parents)) = shape.list_path.split_last() else {
        let Value::Array(entries) = body else {
            return Err(missing(shape));
        };
        let (kept, tally) = filter_entries(std::mem::take(entries), evaluator, rules);
        *entries = kept;
        return Ok(tally);
    };

    let parent = parent_object(body, parents).ok_or_else(|| missing(shape))?;
    let entries = match parent.get_mut(last.as_str()) {
        Some(Value::Array(entries)) => entries,
        _ => return Err(missing(shape)),
    };

    let (kept, tally) = filter_entries(std::mem::take(entries), evaluator, rules);
    *entries = kept;

    for field in &shape.count_fields {
        if let Some(count) = parent.get_mut(field.as_str()) {
            if count.is_number() {
                *count = Value::from(tally.kept);
            }
        }
    }

    Ok(tally)
}

fn filter_entity(
    body: &mut Value,
    shape: &ResponseShape,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> Result<Tally> {
    if !body.is_object() {
        return Err(missing(shape));
    }

    let decision = evaluator.evaluate(&ObjectRecord::new(body), rules);
    tracing::trace!(decision = ?decision, "Entity evaluated");
    if decision.is_keep() {
        return Ok(Tally {
            seen: 1,
            kept: 1,
            malformed: 0,
        });
    }

    *body = Value::Object(Map::new());
    Ok(Tally {
        seen: 1,
        kept: 0,
        malformed: 0,
    })
}

fn filter_entries(
    entries: Vec<Value>,
    evaluator: &Evaluator,
    rules: &RuleConfig,
) -> (Vec<Value>, Tally) {
    let mut tally = Tally::default();
    let mut kept = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        tally.seen += 1;
        let decision = evaluator.evaluate(&ObjectRecord::new(&entry), rules);
        tracing::trace!(index, decision = ?decision, "Entry evaluated");
        if decision.is_keep() {
            tally.kept += 1;
            kept.push(entry);
        }
    }

    (kept, tally)
}

fn parent_object<'a>(body: &'a mut Value, path: &[String]) -> Option<&'a mut Map<String, Value>> {
    let mut current = body;
    for segment in path {
        current = current.get_mut(segment.as_str())?;
    }
    current.as_object_mut()
}

fn missing(shape: &ResponseShape) -> FilterError {
    FilterError::MissingListField {
        path: shape.display_path(),
    }
}
