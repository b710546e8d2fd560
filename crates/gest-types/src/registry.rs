//! Ordered name-to-entity registries that validate on every write.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{shape_name, ValidationError};
use crate::field::Field;

/// Raw input accepted wherever a registry entry is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw<E> {
    /// An already-constructed entity, stored as-is.
    Entity(E),
    /// A JSON-shaped literal: pair, list, mapping, string or scalar.
    Value(Value),
    /// A set of values. Duplicates are dropped, first occurrence wins.
    Set(Vec<Value>),
}

impl<E> Raw<E> {
    pub fn set<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Set(values.into_iter().map(Into::into).collect())
    }
}

impl<E> From<Value> for Raw<E> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<E> From<&str> for Raw<E> {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl<E> From<f64> for Raw<E> {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl<E> From<[f64; 2]> for Raw<E> {
    fn from([low, high]: [f64; 2]) -> Self {
        Self::Value(Value::Array(vec![Value::from(low), Value::from(high)]))
    }
}

/// An entity kind that can live in a [`Registry`].
pub trait Entity: Field + Clone + PartialEq + Serialize + Sized {
    /// Lower-case kind name used in error messages ("variable", "constraint", ...).
    const KIND: &'static str;

    /// Coerce a raw input into a fully-constructed entity.
    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError>;
}

/// Split the `type` tag off a mapping input, returning it with the remaining fields.
pub(crate) fn split_type_tag(
    kind: &'static str,
    name: &str,
    mut fields: Map<String, Value>,
) -> Result<(String, Map<String, Value>), ValidationError> {
    match fields.remove("type") {
        Some(Value::String(tag)) => Ok((tag, fields)),
        Some(other) => Err(ValidationError::UnknownType {
            kind,
            tag: other.to_string(),
        }),
        None => Err(ValidationError::MissingType {
            kind,
            name: name.to_string(),
        }),
    }
}

/// Deserialize the constructor fields of a typed mapping.
pub(crate) fn parse_fields<F: DeserializeOwned>(
    name: &str,
    fields: Map<String, Value>,
) -> Result<F, ValidationError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ValidationError::invalid_field(name, e.to_string()))
}

pub(crate) fn unsupported(
    kind: &'static str,
    name: &str,
    value: &Value,
    expected: &'static str,
) -> ValidationError {
    ValidationError::UnsupportedInput {
        kind,
        name: name.to_string(),
        found: shape_name(value),
        expected,
    }
}

/// Read a JSON number as `f64`, naming the field on failure.
pub(crate) fn number(field: &str, value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| {
            ValidationError::invalid_field(field, format!("expected a number, got {value}"))
        })
}

/// Insertion-ordered mapping of name to entity.
///
/// The only mutation entry points are [`Registry::set`], [`Registry::update`]
/// and [`Registry::remove`]; the first two coerce every incoming value through
/// [`Entity::coerce`] and commit nothing when any entry of the call fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<E> {
    entries: Vec<(String, E)>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Entity> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(name, raw)` pairs, validating each entry.
    pub fn from_entries<I, K, R>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Raw<E>>,
    {
        let mut registry = Self::new();
        registry.update(entries)?;
        Ok(registry)
    }

    /// Build a registry from a JSON mapping of name to raw entry.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Self::from_entries(map),
            Value::Null => Ok(Self::new()),
            other => Err(ValidationError::UnsupportedInput {
                kind: E::KIND,
                name: format!("{}s", E::KIND),
                found: shape_name(&other),
                expected: "a mapping of names to entries",
            }),
        }
    }

    /// Validate and store a single entry, replacing any existing entry of the
    /// same name in place.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<E>>,
    ) -> Result<(), ValidationError> {
        let name = name.into();
        let entity = E::coerce(&name, raw.into())?;
        self.commit(name, entity);
        Ok(())
    }

    /// Validate every entry first, then store them all. On error the registry
    /// is left untouched.
    pub fn update<I, K, R>(&mut self, entries: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Raw<E>>,
    {
        let staged = entries
            .into_iter()
            .map(|(name, raw)| {
                let name = name.into();
                E::coerce(&name, raw.into()).map(|entity| (name, entity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (name, entity) in staged {
            self.commit(name, entity);
        }
        Ok(())
    }

    fn commit(&mut self, name: String, entity: E) {
        debug!(
            kind = E::KIND,
            name = %name,
            entity_type = entity.type_name(),
            "registry entry stored"
        );
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = entity,
            None => self.entries.push((name, entity)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<E> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }
}

impl<E> Registry<E> {
    pub fn get(&self, name: &str) -> Option<&E> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, entity)| entity)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entries.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.entries.iter().map(|(_, entity)| entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical dump: each entry's own fields merged with a `type` tag.
impl<E: Entity> Serialize for Registry<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entity) in &self.entries {
            let mut dump = match serde_json::to_value(entity).map_err(S::Error::custom)? {
                Value::Object(fields) => fields,
                other => return Err(S::Error::custom(format!("{name} dumped as {other}"))),
            };
            dump.insert("type".to_string(), Value::String(entity.type_name().to_string()));
            map.serialize_entry(name, &dump)?;
        }
        map.end()
    }
}

impl<'de, E: Entity> Deserialize<'de> for Registry<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_entries(map).map_err(D::Error::custom)
    }
}
