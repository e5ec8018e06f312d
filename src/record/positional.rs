use super::{non_null, Field, PositionalSchema, Record};
use crate::error::{FilterError, Result};
use serde_json::Value;

/// View over one element of an `update_pulse_v2` batch
#[derive(Debug, Clone, Copy)]
pub struct PositionalRecord<'a> {
    slots: &'a [Value],
    schema: &'a PositionalSchema,
}

impl<'a> PositionalRecord<'a> {
    /// Wrap a batch element
    ///
    /// Fails with `MalformedRecord` when the element is not an array or is
    /// shorter than `schema.min_len`. Once constructed, every field lookup is
    /// in bounds.
    pub fn new(value: &'a Value, schema: &'a PositionalSchema) -> Result<Self> {
        let slots = match value {
            Value::Array(slots) => slots.as_slice(),
            _ => {
                return Err(FilterError::MalformedRecord {
                    len: 0,
                    required: schema.min_len,
                })
            }
        };

        if slots.len() < schema.min_len {
            return Err(FilterError::MalformedRecord {
                len: slots.len(),
                required: schema.min_len,
            });
        }

        Ok(Self { slots, schema })
    }

    /// Raw slot by offset, including slots with no named field
    pub fn slot(&self, offset: usize) -> Option<&'a Value> {
        self.slots.get(offset)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Record for PositionalRecord<'_> {
    fn get(&self, field: Field) -> Option<&Value> {
        let offset = self.schema.offset(field)?;
        self.slots.get(offset).and_then(non_null)
    }
}
