//! Document type returned by store reads.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;

/// A single document: its key within the collection plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    data: Map<String, JsonValue>,
}

impl Document {
    /// Creates a document from its key and field map.
    pub fn new(id: impl Into<String>, data: Map<String, JsonValue>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Gets a field, deserializing to the requested type.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or if deserialization fails.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        self.data
            .get(key)
            .ok_or_else(|| AppError::Validation(format!("{}: field not found: {}", self.id, key)))
            .and_then(|v| self.decode(key, v))
    }

    /// Gets a field, returning `None` if it is missing or null.
    ///
    /// Still returns an error if the field exists but deserialization fails.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.data.get(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => self.decode(key, v).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the raw JSON value for a field, if it exists.
    pub fn get_raw(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    /// Returns the underlying field map.
    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, value: &JsonValue) -> Result<T, AppError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            AppError::Validation(format!("{}: failed to deserialize '{}': {}", self.id, key, e))
        })
    }
}
