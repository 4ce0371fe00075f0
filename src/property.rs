//! Property mappings: a named weight/value column that may or may not yet be
//! bound to a concrete key id.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::graph::loading::Aggregation;

/// Key naming the property in a mapping description.
pub const PROPERTY_KEY: &str = "property";
/// Key naming the aggregation in a mapping description.
pub const AGGREGATION_KEY: &str = "aggregate";
/// Key naming the default value in a mapping description.
pub const DEFAULT_WEIGHT_KEY: &str = "defaultWeight";

/// Binding state of a [`PropertyMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Not yet bound to a source column.
    Unresolved,
    /// Bound to the column with this id.
    Resolved(u32),
}

/// Describes one property to load: where it comes from, what to use when it is
/// missing, and how parallel values combine.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMapping {
    identifier: String,
    property_name: String,
    default_value: f64,
    aggregation: Option<Aggregation>,
    key: PropertyKey,
}

impl PropertyMapping {
    /// An unresolved mapping without an explicit aggregation.
    pub fn of(identifier: impl Into<String>, property_name: impl Into<String>, default_value: f64) -> Self {
        Self {
            identifier: identifier.into(),
            property_name: property_name.into(),
            default_value,
            aggregation: None,
            key: PropertyKey::Unresolved,
        }
    }

    /// An unresolved mapping with an explicit aggregation.
    pub fn with(
        identifier: impl Into<String>,
        property_name: impl Into<String>,
        default_value: f64,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            aggregation: Some(aggregation),
            ..Self::of(identifier, property_name, default_value)
        }
    }

    /// Parses a mapping description.
    ///
    /// A string names the source property directly. A map must carry
    /// `property` (string) and may carry `aggregate` (aggregation name) and
    /// `defaultWeight` (number).
    pub fn from_value(identifier: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::of(identifier, name.clone(), f64::NAN)),
            Value::Object(map) => {
                let name = match map.get(PROPERTY_KEY) {
                    None => {
                        return Err(Error::InvalidProperty(format!(
                            "property was not set, missing entry with key '{PROPERTY_KEY}'"
                        )))
                    }
                    Some(Value::String(name)) => name.clone(),
                    Some(other) => {
                        return Err(Error::InvalidProperty(format!(
                            "expected the property name to be a string, but was {}",
                            type_name(other)
                        )))
                    }
                };
                let aggregation = match map.get(AGGREGATION_KEY) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.parse::<Aggregation>()?),
                    Some(other) => {
                        return Err(Error::InvalidProperty(format!(
                            "expected the aggregation to be a string, but was {}",
                            type_name(other)
                        )))
                    }
                };
                let default_value = match map.get(DEFAULT_WEIGHT_KEY) {
                    None | Some(Value::Null) => f64::NAN,
                    Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
                    Some(other) => {
                        return Err(Error::InvalidProperty(format!(
                            "expected the default weight to be a number, but was {}",
                            type_name(other)
                        )))
                    }
                };
                Ok(Self {
                    aggregation,
                    ..Self::of(identifier, name, default_value)
                })
            }
            other => Err(Error::InvalidProperty(format!(
                "expected a string or a map, but got {}",
                type_name(other)
            ))),
        }
    }

    /// Name the property is exposed under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Name of the source property.
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Value used when the source has none. `NaN` if unspecified.
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Default value, falling back to `fallback` when unspecified.
    pub fn default_value_or(&self, fallback: f64) -> f64 {
        if self.default_value.is_nan() {
            fallback
        } else {
            self.default_value
        }
    }

    /// Explicitly configured aggregation.
    pub fn aggregation(&self) -> Option<Aggregation> {
        self.aggregation
    }

    /// Current binding.
    pub fn key(&self) -> PropertyKey {
        self.key
    }

    /// Returns `true` once bound to a key id.
    pub fn exists(&self) -> bool {
        matches!(self.key, PropertyKey::Resolved(_))
    }

    /// Returns `true` if a source property name was given.
    pub fn has_valid_name(&self) -> bool {
        !self.property_name.is_empty()
    }

    /// Sets the aggregation unless one was configured explicitly.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation.get_or_insert(aggregation);
        self
    }

    /// Binds the mapping to `key_id`.
    ///
    /// Resolving an already resolved mapping to the same id is a no-op; a
    /// different id is [`Error::PropertyKeyMismatch`].
    pub fn resolve_with(&self, key_id: u32) -> Result<Self> {
        match self.key {
            PropertyKey::Resolved(existing) if existing != key_id => Err(Error::PropertyKeyMismatch {
                expected: existing,
                actual: key_id,
            }),
            _ => Ok(Self {
                key: PropertyKey::Resolved(key_id),
                ..self.clone()
            }),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_description_names_property() {
        let mapping = PropertyMapping::from_value("w", &json!("cost")).unwrap();
        assert_eq!(mapping.identifier(), "w");
        assert_eq!(mapping.property_name(), "cost");
        assert!(mapping.default_value().is_nan());
        assert_eq!(mapping.default_value_or(1.0), 1.0);
        assert_eq!(mapping.aggregation(), None);
        assert!(!mapping.exists());
    }

    #[test]
    fn map_description_with_all_keys() {
        let value = json!({"property": "cost", "aggregate": "max", "defaultWeight": 2.5});
        let mapping = PropertyMapping::from_value("w", &value).unwrap();
        assert_eq!(mapping.aggregation(), Some(Aggregation::Max));
        assert_eq!(mapping.default_value(), 2.5);
    }

    #[test]
    fn map_description_type_errors() {
        for value in [
            json!({}),
            json!({"property": 3}),
            json!({"property": "cost", "aggregate": 1}),
            json!({"property": "cost", "defaultWeight": "heavy"}),
            json!({"property": "cost", "aggregate": "median"}),
            json!(12),
        ] {
            assert!(
                PropertyMapping::from_value("w", &value).is_err(),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_is_idempotent_but_rejects_conflicts() {
        let mapping = PropertyMapping::of("w", "cost", 1.0);
        let resolved = mapping.resolve_with(4).unwrap();
        assert_eq!(resolved.key(), PropertyKey::Resolved(4));
        assert!(resolved.exists());
        assert_eq!(resolved.resolve_with(4).unwrap(), resolved);
        assert!(matches!(
            resolved.resolve_with(5),
            Err(Error::PropertyKeyMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn explicit_aggregation_wins() {
        let explicit = PropertyMapping::with("w", "cost", 1.0, Aggregation::Min);
        assert_eq!(
            explicit.with_aggregation(Aggregation::Sum).aggregation(),
            Some(Aggregation::Min)
        );
        let implicit = PropertyMapping::of("w", "cost", 1.0);
        assert_eq!(
            implicit.with_aggregation(Aggregation::Sum).aggregation(),
            Some(Aggregation::Sum)
        );
    }
}
