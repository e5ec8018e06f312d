use super::{non_null, Field, Record};
use serde_json::{Map, Value};

/// View over one entry of a `/pulse` response list
///
/// Missing keys are absent rather than errors, since the endpoint omits
/// fields backward-compatibly. An entry that is not an object has every
/// field absent.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRecord<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> ObjectRecord<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    /// Lookup by raw key, for keys without a named field
    pub fn get_key(&self, key: &str) -> Option<&'a Value> {
        self.fields?.get(key).and_then(non_null)
    }
}

impl Record for ObjectRecord<'_> {
    fn get(&self, field: Field) -> Option<&Value> {
        self.get_key(field.key()?)
    }
}
