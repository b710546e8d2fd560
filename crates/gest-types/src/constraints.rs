//! Feasibility predicates over output values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::field::{DType, Field};
use crate::registry::{number, parse_fields, split_type_tag, unsupported, Entity, Raw};

/// Satisfied when `x < value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LessThanConstraint {
    #[serde(default)]
    pub dtype: Option<DType>,
    pub value: f64,
}

impl LessThanConstraint {
    pub fn new(value: f64) -> Self {
        Self { dtype: None, value }
    }

    pub fn check(&self, x: f64) -> bool {
        x < self.value
    }
}

/// Satisfied when `x > value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreaterThanConstraint {
    #[serde(default)]
    pub dtype: Option<DType>,
    pub value: f64,
}

impl GreaterThanConstraint {
    pub fn new(value: f64) -> Self {
        Self { dtype: None, value }
    }

    pub fn check(&self, x: f64) -> bool {
        x > self.value
    }
}

/// Satisfied when `low <= x <= high`, closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsConstraintFields")]
pub struct BoundsConstraint {
    dtype: Option<DType>,
    range: [f64; 2],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundsConstraintFields {
    #[serde(default)]
    dtype: Option<DType>,
    range: Vec<f64>,
}

impl TryFrom<BoundsConstraintFields> for BoundsConstraint {
    type Error = ValidationError;

    fn try_from(fields: BoundsConstraintFields) -> Result<Self, Self::Error> {
        let [low, high] = <[f64; 2]>::try_from(fields.range.as_slice()).map_err(|_| {
            ValidationError::invalid_field("range", "'range' must have exactly two numbers")
        })?;
        let mut constraint = Self::new(low, high)?;
        constraint.dtype = fields.dtype;
        Ok(constraint)
    }
}

impl BoundsConstraint {
    pub fn new(low: f64, high: f64) -> Result<Self, ValidationError> {
        if !(low < high) {
            return Err(ValidationError::InvalidRange { low, high });
        }
        Ok(Self {
            dtype: None,
            range: [low, high],
        })
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn check(&self, x: f64) -> bool {
        let [low, high] = self.range;
        low <= x && x <= high
    }
}

/// Closed set of constraint kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Constraint {
    LessThan(LessThanConstraint),
    GreaterThan(GreaterThanConstraint),
    Bounds(BoundsConstraint),
}

impl Constraint {
    pub fn less_than(value: f64) -> Self {
        Self::LessThan(LessThanConstraint::new(value))
    }

    pub fn greater_than(value: f64) -> Self {
        Self::GreaterThan(GreaterThanConstraint::new(value))
    }

    pub fn bounds(low: f64, high: f64) -> Result<Self, ValidationError> {
        BoundsConstraint::new(low, high).map(Self::Bounds)
    }

    pub fn check(&self, x: f64) -> bool {
        match self {
            Self::LessThan(c) => c.check(x),
            Self::GreaterThan(c) => c.check(x),
            Self::Bounds(c) => c.check(x),
        }
    }

    fn from_typed(name: &str, fields: Map<String, Value>) -> Result<Self, ValidationError> {
        let (tag, fields) = split_type_tag(Self::KIND, name, fields)?;
        match tag.as_str() {
            "LessThanConstraint" => parse_fields(name, fields).map(Self::LessThan),
            "GreaterThanConstraint" => parse_fields(name, fields).map(Self::GreaterThan),
            "BoundsConstraint" => {
                let fields: BoundsConstraintFields = parse_fields(name, fields)?;
                BoundsConstraint::try_from(fields).map(Self::Bounds)
            }
            _ => Err(ValidationError::UnknownType {
                kind: Self::KIND,
                tag,
            }),
        }
    }

    /// `[TAG, ...args]` shorthand. `BOUNDS` takes two args, the others one;
    /// trailing extra args are ignored.
    fn from_list(name: &str, items: &[Value]) -> Result<Self, ValidationError> {
        let tag = match items.first() {
            Some(Value::String(tag)) => tag.to_uppercase(),
            Some(other) => {
                return Err(ValidationError::invalid_field(
                    name,
                    format!("constraint type {other} must be a string if specified by a list"),
                ))
            }
            None => {
                return Err(ValidationError::invalid_field(
                    name,
                    "constraint list must start with a constraint type",
                ))
            }
        };
        let args = &items[1..];

        match tag.as_str() {
            "BOUNDS" => {
                if args.len() != 2 {
                    return Err(ValidationError::invalid_field(
                        name,
                        "'range' must have two numbers in ascending order",
                    ));
                }
                Self::bounds(number(name, &args[0])?, number(name, &args[1])?)
            }
            "LESS_THAN" | "GREATER_THAN" => {
                let value = args.first().ok_or_else(|| {
                    ValidationError::invalid_field(
                        name,
                        format!("constraint {tag} is missing its value"),
                    )
                })?;
                let value = number(name, value)?;
                Ok(if tag == "LESS_THAN" {
                    Self::less_than(value)
                } else {
                    Self::greater_than(value)
                })
            }
            _ => Err(ValidationError::UnknownType {
                kind: Self::KIND,
                tag,
            }),
        }
    }
}

impl Field for Constraint {
    fn type_name(&self) -> &'static str {
        match self {
            Self::LessThan(_) => "LessThanConstraint",
            Self::GreaterThan(_) => "GreaterThanConstraint",
            Self::Bounds(_) => "BoundsConstraint",
        }
    }

    fn dtype(&self) -> Option<&DType> {
        match self {
            Self::LessThan(c) => c.dtype.as_ref(),
            Self::GreaterThan(c) => c.dtype.as_ref(),
            Self::Bounds(c) => c.dtype.as_ref(),
        }
    }
}

impl Entity for Constraint {
    const KIND: &'static str = "constraint";

    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError> {
        match raw {
            Raw::Entity(constraint) => Ok(constraint),
            Raw::Value(Value::Object(fields)) => Self::from_typed(name, fields),
            Raw::Value(Value::Array(items)) => Self::from_list(name, &items),
            Raw::Value(other) => Err(unsupported(
                Self::KIND,
                name,
                &other,
                "a constraint, a [TYPE, ...args] list, or a mapping with a type field",
            )),
            Raw::Set(_) => Err(ValidationError::UnsupportedInput {
                kind: Self::KIND,
                name: name.to_string(),
                found: "set",
                expected: "a constraint, a [TYPE, ...args] list, or a mapping with a type field",
            }),
        }
    }
}

impl From<Constraint> for Raw<Constraint> {
    fn from(constraint: Constraint) -> Self {
        Self::Entity(constraint)
    }
}

impl From<LessThanConstraint> for Raw<Constraint> {
    fn from(constraint: LessThanConstraint) -> Self {
        Self::Entity(Constraint::LessThan(constraint))
    }
}

impl From<GreaterThanConstraint> for Raw<Constraint> {
    fn from(constraint: GreaterThanConstraint) -> Self {
        Self::Entity(Constraint::GreaterThan(constraint))
    }
}

impl From<BoundsConstraint> for Raw<Constraint> {
    fn from(constraint: BoundsConstraint) -> Self {
        Self::Entity(Constraint::Bounds(constraint))
    }
}
