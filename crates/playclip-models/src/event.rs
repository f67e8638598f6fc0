//! Timed events read from an event table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the start offset in milliseconds.
pub const POSITION_COLUMN: &str = "Position";
/// Column holding the clip length in milliseconds.
pub const DURATION_COLUMN: &str = "Duration";
/// Column holding the play name, used as identity rather than as a category.
pub const NAME_COLUMN: &str = "Name";

/// Errors raised while resolving event fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("required column '{0}' not found")]
    Missing(String),

    #[error("column '{column}' holds '{value}', expected a non-negative number of milliseconds")]
    InvalidMillis { column: String, value: String },
}

/// Ordered field map with case-insensitive lookup.
///
/// Keys keep the casing of the source header. Lookup tries an exact match
/// first and falls back to an ASCII case-insensitive match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EventFields(Vec<(String, String)>);

impl EventFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A later insert with an identical key replaces the value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Resolve the stored key for `name`: exact match preferred, then case-insensitive.
    pub fn resolve_key(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
            .map(|(k, _)| k.as_str())
    }

    /// Look up a value by column name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = self.resolve_key(name)?;
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a value, failing with a named error when the column is absent.
    pub fn require(&self, name: &str) -> Result<&str, FieldError> {
        self.get(name)
            .ok_or_else(|| FieldError::Missing(name.to_string()))
    }

    /// Remove a field by case-insensitive name and return its value.
    pub fn take(&mut self, name: &str) -> Option<String> {
        let key = self.resolve_key(name)?.to_string();
        let idx = self.0.iter().position(|(k, _)| *k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EventFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = EventFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// One row of input timing and annotation data.
///
/// Events are immutable once read; the planner and the sidecar generator
/// only borrow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    /// Start offset in the source video (milliseconds)
    pub position_ms: u64,
    /// Clip length (milliseconds)
    pub duration_ms: u64,
    /// Every other column, keyed by the original header text
    pub fields: EventFields,
}

impl Event {
    pub fn new(position_ms: u64, duration_ms: u64, fields: EventFields) -> Self {
        Self {
            position_ms,
            duration_ms,
            fields,
        }
    }

    /// Build an event from a full record, pulling `Position` and `Duration`
    /// out of the fields by case-insensitive name.
    pub fn from_record(mut record: EventFields) -> Result<Self, FieldError> {
        let position = record
            .take(POSITION_COLUMN)
            .ok_or_else(|| FieldError::Missing(POSITION_COLUMN.to_string()))?;
        let duration = record
            .take(DURATION_COLUMN)
            .ok_or_else(|| FieldError::Missing(DURATION_COLUMN.to_string()))?;

        Ok(Self {
            position_ms: parse_millis(POSITION_COLUMN, &position)?,
            duration_ms: parse_millis(DURATION_COLUMN, &duration)?,
            fields: record,
        })
    }

    /// Play name, if the table carries one.
    pub fn name(&self) -> Option<&str> {
        self.fields.get(NAME_COLUMN)
    }
}

/// Parse a decimal millisecond string. Fractional values are rounded.
pub fn parse_millis(column: &str, value: &str) -> Result<u64, FieldError> {
    let invalid = || FieldError::InvalidMillis {
        column: column.to_string(),
        value: value.to_string(),
    };
    let ms: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(invalid());
    }
    Ok(ms.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> EventFields {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_lookup_prefers_exact_case() {
        let fields = record(&[("down", "lower"), ("Down", "exact")]);
        assert_eq!(fields.get("Down"), Some("exact"));
        assert_eq!(fields.get("DOWN"), Some("lower"));
        assert_eq!(fields.resolve_key("DOWN"), Some("down"));
        assert_eq!(fields.get("Distance"), None);
    }

    #[test]
    fn test_require_names_missing_column() {
        let fields = record(&[("ODK", "O")]);
        assert_eq!(
            fields.require("Down"),
            Err(FieldError::Missing("Down".to_string()))
        );
    }

    #[test]
    fn test_from_record_case_insensitive() {
        let exact = Event::from_record(record(&[
            ("Position", "1000"),
            ("Duration", "2000"),
            ("Down", "3rd"),
        ]))
        .unwrap();
        let varied = Event::from_record(record(&[
            ("POSITION", "1000"),
            ("duration", "2000"),
            ("Down", "3rd"),
        ]))
        .unwrap();

        assert_eq!(exact, varied);
        assert_eq!(exact.position_ms, 1000);
        assert_eq!(exact.duration_ms, 2000);
        assert_eq!(exact.fields.len(), 1);
        assert_eq!(exact.fields.get("down"), Some("3rd"));
    }

    #[test]
    fn test_from_record_missing_duration() {
        let err = Event::from_record(record(&[("Position", "1000")])).unwrap_err();
        assert_eq!(err, FieldError::Missing("Duration".to_string()));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("Position", "1500").unwrap(), 1500);
        assert_eq!(parse_millis("Position", " 1500.4 ").unwrap(), 1500);
        assert!(parse_millis("Position", "-1").is_err());
        assert!(parse_millis("Position", "abc").is_err());
        assert!(parse_millis("Position", "NaN").is_err());
    }

    #[test]
    fn test_fields_keep_header_order() {
        let fields = record(&[("Play Type", "Run"), ("ODK", "O"), ("Down", "1")]);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Play Type", "ODK", "Down"]);
    }
}
