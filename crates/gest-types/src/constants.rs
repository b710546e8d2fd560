//! Fixed inputs passed through to evaluation unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::field::{DType, Field};
use crate::registry::{parse_fields, split_type_tag, Entity, Raw};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constant {
    #[serde(default)]
    pub dtype: Option<DType>,
    pub value: Value,
}

impl Constant {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            dtype: None,
            value: value.into(),
        }
    }

    pub fn with_dtype(mut self, dtype: impl Into<DType>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Field for Constant {
    fn type_name(&self) -> &'static str {
        "Constant"
    }

    fn dtype(&self) -> Option<&DType> {
        self.dtype.as_ref()
    }
}

impl Entity for Constant {
    const KIND: &'static str = "constant";

    /// Bare values of any other shape are wrapped as the constant's value.
    /// Mappings are reserved for the typed form and must carry `type`.
    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError> {
        match raw {
            Raw::Entity(constant) => Ok(constant),
            Raw::Value(Value::Object(fields)) => {
                let (tag, fields) = split_type_tag(Self::KIND, name, fields)?;
                if tag != "Constant" {
                    return Err(ValidationError::UnknownType {
                        kind: Self::KIND,
                        tag,
                    });
                }
                parse_fields(name, fields)
            }
            Raw::Value(value) => Ok(Self::new(value)),
            Raw::Set(values) => Ok(Self::new(Value::Array(values))),
        }
    }
}

impl From<Constant> for Raw<Constant> {
    fn from(constant: Constant) -> Self {
        Self::Entity(constant)
    }
}
