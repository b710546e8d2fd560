//! Outputs to optimize, with a direction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::field::{DType, Field};
use crate::registry::{parse_fields, split_type_tag, unsupported, Entity, Raw};

/// Whether an objective is minimized, maximized or explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectiveDirection {
    Minimize,
    Maximize,
    Explore,
}

impl ObjectiveDirection {
    /// Parse a shorthand name such as `"maximize"`, case-insensitively.
    pub fn from_shorthand(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "MINIMIZE" => Some(Self::Minimize),
            "MAXIMIZE" => Some(Self::Maximize),
            "EXPLORE" => Some(Self::Explore),
            _ => None,
        }
    }

    pub fn from_type_name(tag: &str) -> Option<Self> {
        match tag {
            "MinimizeObjective" => Some(Self::Minimize),
            "MaximizeObjective" => Some(Self::Maximize),
            "ExploreObjective" => Some(Self::Explore),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Minimize => "MinimizeObjective",
            Self::Maximize => "MaximizeObjective",
            Self::Explore => "ExploreObjective",
        }
    }

    /// True if `candidate` improves on `incumbent` in this direction.
    /// Explore objectives have no ordering.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
            Self::Explore => false,
        }
    }
}

/// An objective. The direction is carried by the variant's type tag, not by
/// a serialized field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    dtype: Option<DType>,
    #[serde(skip)]
    direction: ObjectiveDirection,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectiveFields {
    #[serde(default)]
    dtype: Option<DType>,
}

impl Objective {
    pub fn new(direction: ObjectiveDirection) -> Self {
        Self {
            dtype: None,
            direction,
        }
    }

    pub fn minimize() -> Self {
        Self::new(ObjectiveDirection::Minimize)
    }

    pub fn maximize() -> Self {
        Self::new(ObjectiveDirection::Maximize)
    }

    pub fn explore() -> Self {
        Self::new(ObjectiveDirection::Explore)
    }

    pub fn with_dtype(mut self, dtype: impl Into<DType>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }
}

impl Field for Objective {
    fn type_name(&self) -> &'static str {
        self.direction.type_name()
    }

    fn dtype(&self) -> Option<&DType> {
        self.dtype.as_ref()
    }
}

impl Entity for Objective {
    const KIND: &'static str = "objective";

    fn coerce(name: &str, raw: Raw<Self>) -> Result<Self, ValidationError> {
        match raw {
            Raw::Entity(objective) => Ok(objective),
            Raw::Value(Value::String(shorthand)) => ObjectiveDirection::from_shorthand(&shorthand)
                .map(Self::new)
                .ok_or_else(|| {
                    ValidationError::invalid_field(
                        name,
                        format!("objective type '{shorthand}' is not supported"),
                    )
                }),
            Raw::Value(Value::Object(fields)) => {
                let (tag, fields) = split_type_tag(Self::KIND, name, fields)?;
                let direction = ObjectiveDirection::from_type_name(&tag).ok_or(
                    ValidationError::UnknownType {
                        kind: Self::KIND,
                        tag,
                    },
                )?;
                let fields: ObjectiveFields = parse_fields(name, fields)?;
                Ok(Self {
                    dtype: fields.dtype,
                    direction,
                })
            }
            Raw::Value(other) => Err(unsupported(
                Self::KIND,
                name,
                &other,
                "an objective, MINIMIZE/MAXIMIZE/EXPLORE, or a mapping with a type field",
            )),
            Raw::Set(_) => Err(ValidationError::UnsupportedInput {
                kind: Self::KIND,
                name: name.to_string(),
                found: "set",
                expected: "an objective, MINIMIZE/MAXIMIZE/EXPLORE, or a mapping with a type field",
            }),
        }
    }
}

impl From<Objective> for Raw<Objective> {
    fn from(objective: Objective) -> Self {
        Self::Entity(objective)
    }
}

impl From<ObjectiveDirection> for Raw<Objective> {
    fn from(direction: ObjectiveDirection) -> Self {
        Self::Entity(Objective::new(direction))
    }
}
