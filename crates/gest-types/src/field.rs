//! Data-type tags shared by every declared field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional data-type tag attached to a variable, objective, constraint,
/// constant or observable.
///
/// A tag is either a plain type name (`"float"`, `"int"`, `"str"`) or a tuple.
/// Tuples of the form `[base, n]` or `[base, [d1, d2, ...]]` declare an
/// array-valued field of the given shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DType {
    Name(String),
    Tuple(Vec<Value>),
}

impl DType {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Array dtype with base type `base` and the given shape.
    pub fn array(base: impl Into<String>, shape: &[usize]) -> Self {
        let dims = shape.iter().map(|d| Value::from(*d as u64)).collect();
        Self::Tuple(vec![Value::String(base.into()), Value::Array(dims)])
    }

    /// Shape of an array-valued field, or `None` for scalar fields.
    pub fn array_shape(&self) -> Option<Vec<usize>> {
        let Self::Tuple(items) = self else {
            return None;
        };
        if items.len() != 2 || !items[0].is_string() {
            return None;
        }
        match &items[1] {
            Value::Number(n) => n.as_u64().map(|d| vec![d as usize]),
            Value::Array(dims) if !dims.is_empty() => dims
                .iter()
                .map(|d| d.as_u64().map(|d| d as usize))
                .collect(),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_shape().is_some()
    }
}

impl From<&str> for DType {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for DType {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Common surface of every declared field.
pub trait Field {
    /// Tag naming the concrete variant, used as the `type` key in dumps.
    fn type_name(&self) -> &'static str;

    fn dtype(&self) -> Option<&DType>;
}
