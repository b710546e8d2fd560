//! Tracked outputs with no optimization direction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::field::{DType, Field};
use crate::registry::{parse_fields, split_type_tag, unsupported, Entity, Raw};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observable {
    #[serde(default)]
    pub dtype: Option<DType>,
}

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dtype(mut self, dtype: impl Into<DType>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }
}

impl Field for Observable {
    fn type_name(&self) -> &'static str {
        "Observable"
    }

    fn dtype(&self) -> Option<&DType> {
        self.dtype.as_ref()
    }
}

impl Entity for Observable {
    const KIND: &'static str = "observable";

    /// A bare string or tuple is taken as the observable's dtype.
    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError> {
        match raw {
            Raw::Entity(observable) => Ok(observable),
            Raw::Value(Value::Object(fields)) => {
                let (tag, fields) = split_type_tag(Self::KIND, name, fields)?;
                if tag != "Observable" {
                    return Err(ValidationError::UnknownType {
                        kind: Self::KIND,
                        tag,
                    });
                }
                parse_fields(name, fields)
            }
            Raw::Value(Value::String(dtype)) => Ok(Self::new().with_dtype(DType::Name(dtype))),
            Raw::Value(Value::Array(items)) => Ok(Self::new().with_dtype(DType::Tuple(items))),
            Raw::Value(other) => Err(unsupported(
                Self::KIND,
                name,
                &other,
                "an observable, a dtype string or tuple, or a mapping with a type field",
            )),
            Raw::Set(_) => Err(ValidationError::UnsupportedInput {
                kind: Self::KIND,
                name: name.to_string(),
                found: "set",
                expected: "an observable, a dtype string or tuple, or a mapping with a type field",
            }),
        }
    }
}

impl From<Observable> for Raw<Observable> {
    fn from(observable: Observable) -> Self {
        Self::Entity(observable)
    }
}
