//! Tunable input dimensions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::field::{DType, Field};
use crate::registry::{number, parse_fields, split_type_tag, unsupported, Entity, Raw};

/// A variable over the closed interval `[low, high]` with `high > low`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContinuousVariableFields")]
pub struct ContinuousVariable {
    dtype: Option<DType>,
    default_value: Option<f64>,
    domain: [f64; 2],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ContinuousVariableFields {
    #[serde(default)]
    dtype: Option<DType>,
    #[serde(default)]
    default_value: Option<f64>,
    domain: [f64; 2],
}

impl TryFrom<ContinuousVariableFields> for ContinuousVariable {
    type Error = ValidationError;

    fn try_from(fields: ContinuousVariableFields) -> Result<Self, Self::Error> {
        let [low, high] = fields.domain;
        Ok(Self::new(low, high)?
            .with_dtype_opt(fields.dtype)
            .with_default_value_opt(fields.default_value))
    }
}

impl ContinuousVariable {
    pub fn new(low: f64, high: f64) -> Result<Self, ValidationError> {
        // Written as a negation so NaN bounds are rejected too.
        if !(high > low) {
            return Err(ValidationError::InvalidDomain { low, high });
        }
        if !low.is_finite() || !high.is_finite() {
            return Err(ValidationError::invalid_field(
                "domain",
                format!("bounds must be finite, got [{low}, {high}]"),
            ));
        }
        Ok(Self {
            dtype: None,
            default_value: None,
            domain: [low, high],
        })
    }

    pub fn with_dtype(self, dtype: impl Into<DType>) -> Self {
        self.with_dtype_opt(Some(dtype.into()))
    }

    pub fn with_default_value(self, value: f64) -> Self {
        self.with_default_value_opt(Some(value))
    }

    fn with_dtype_opt(mut self, dtype: Option<DType>) -> Self {
        self.dtype = dtype;
        self
    }

    fn with_default_value_opt(mut self, value: Option<f64>) -> Self {
        self.default_value = value;
        self
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn low(&self) -> f64 {
        self.domain[0]
    }

    pub fn high(&self) -> f64 {
        self.domain[1]
    }

    pub fn default_value(&self) -> Option<f64> {
        self.default_value
    }

    pub fn contains(&self, x: f64) -> bool {
        self.low() <= x && x <= self.high()
    }
}

/// A variable over a non-empty set of arbitrary values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DiscreteVariableFields")]
pub struct DiscreteVariable {
    dtype: Option<DType>,
    default_value: Option<f64>,
    values: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DiscreteVariableFields {
    #[serde(default)]
    dtype: Option<DType>,
    #[serde(default)]
    default_value: Option<f64>,
    values: Vec<Value>,
}

impl TryFrom<DiscreteVariableFields> for DiscreteVariable {
    type Error = ValidationError;

    fn try_from(fields: DiscreteVariableFields) -> Result<Self, Self::Error> {
        let mut variable = Self::new(fields.values)?;
        variable.dtype = fields.dtype;
        variable.default_value = fields.default_value;
        Ok(variable)
    }
}

impl DiscreteVariable {
    /// Duplicates are dropped keeping the first occurrence. Numbers compare
    /// by value, so `1` and `1.0` are the same entry.
    pub fn new<I, V>(values: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut unique: Vec<Value> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !unique.iter().any(|seen| same_value(seen, &value)) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::EmptyValues);
        }
        Ok(Self {
            dtype: None,
            default_value: None,
            values: unique,
        })
    }

    pub fn with_dtype(mut self, dtype: impl Into<DType>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn with_default_value(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn default_value(&self) -> Option<f64> {
        self.default_value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Closed set of variable kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Variable {
    Continuous(ContinuousVariable),
    Discrete(DiscreteVariable),
}

impl Variable {
    pub fn continuous(low: f64, high: f64) -> Result<Self, ValidationError> {
        ContinuousVariable::new(low, high).map(Self::Continuous)
    }

    pub fn discrete<I, V>(values: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        DiscreteVariable::new(values).map(Self::Discrete)
    }

    pub fn as_continuous(&self) -> Option<&ContinuousVariable> {
        match self {
            Self::Continuous(v) => Some(v),
            Self::Discrete(_) => None,
        }
    }

    pub fn as_discrete(&self) -> Option<&DiscreteVariable> {
        match self {
            Self::Discrete(v) => Some(v),
            Self::Continuous(_) => None,
        }
    }

    /// `[low, high]` for continuous variables.
    pub fn domain(&self) -> Option<[f64; 2]> {
        self.as_continuous().map(ContinuousVariable::domain)
    }

    pub fn default_value(&self) -> Option<f64> {
        match self {
            Self::Continuous(v) => v.default_value(),
            Self::Discrete(v) => v.default_value(),
        }
    }

    fn from_pair(name: &str, items: &[Value]) -> Result<Self, ValidationError> {
        if items.len() != 2 {
            return Err(ValidationError::invalid_field(
                name,
                "variable is not correctly specified, must have two elements \
                 representing lower and upper bounds",
            ));
        }
        Self::continuous(number(name, &items[0])?, number(name, &items[1])?)
    }

    fn from_typed(
        name: &str,
        fields: serde_json::Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let (tag, fields) = split_type_tag(Self::KIND, name, fields)?;
        match tag.as_str() {
            "ContinuousVariable" => {
                let fields: ContinuousVariableFields = parse_fields(name, fields)?;
                ContinuousVariable::try_from(fields).map(Self::Continuous)
            }
            "DiscreteVariable" => {
                let fields: DiscreteVariableFields = parse_fields(name, fields)?;
                DiscreteVariable::try_from(fields).map(Self::Discrete)
            }
            _ => Err(ValidationError::UnknownType {
                kind: Self::KIND,
                tag,
            }),
        }
    }
}

impl Field for Variable {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Continuous(_) => "ContinuousVariable",
            Self::Discrete(_) => "DiscreteVariable",
        }
    }

    fn dtype(&self) -> Option<&DType> {
        match self {
            Self::Continuous(v) => v.dtype.as_ref(),
            Self::Discrete(v) => v.dtype.as_ref(),
        }
    }
}

impl Entity for Variable {
    const KIND: &'static str = "variable";

    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError> {
        match raw {
            Raw::Entity(variable) => Ok(variable),
            Raw::Set(values) => Self::discrete(values),
            Raw::Value(Value::Array(items)) => Self::from_pair(name, &items),
            Raw::Value(Value::Object(fields)) => Self::from_typed(name, fields),
            Raw::Value(other) => Err(unsupported(
                Self::KIND,
                name,
                &other,
                "a variable, a [low, high] pair, a set, or a mapping with a type field",
            )),
        }
    }
}

impl From<Variable> for Raw<Variable> {
    fn from(variable: Variable) -> Self {
        Self::Entity(variable)
    }
}

impl From<ContinuousVariable> for Raw<Variable> {
    fn from(variable: ContinuousVariable) -> Self {
        Self::Entity(Variable::Continuous(variable))
    }
}

impl From<DiscreteVariable> for Raw<Variable> {
    fn from(variable: DiscreteVariable) -> Self {
        Self::Entity(Variable::Discrete(variable))
    }
}
