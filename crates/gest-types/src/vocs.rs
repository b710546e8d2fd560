//! The VOCS aggregate: Variables, Objectives, Constraints, Constants and
//! Observables describing one optimization problem.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::Constant;
use crate::constraints::Constraint;
use crate::errors::{shape_name, GestResult, ValidationError};
use crate::objectives::Objective;
use crate::observables::Observable;
use crate::registry::{number, Entity, Raw, Registry};
use crate::variables::Variable;

/// A point record: field name to value, in insertion order.
pub type Record = Map<String, Value>;

const FIELDS: [&str; 5] = [
    "variables",
    "objectives",
    "constraints",
    "constants",
    "observables",
];

/// Problem descriptor shared read-only by the driver and the generator.
///
/// `variables` is mandatory and never empty. Names only need to be unique
/// within one registry; the same name may appear in several.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vocs {
    variables: Registry<Variable>,
    objectives: Registry<Objective>,
    constraints: Registry<Constraint>,
    constants: Registry<Constant>,
    observables: Registry<Observable>,
}

impl Vocs {
    pub fn new(variables: Registry<Variable>) -> Result<Self, ValidationError> {
        if variables.is_empty() {
            return Err(ValidationError::EmptyVariables);
        }
        Ok(Self {
            variables,
            objectives: Registry::new(),
            constraints: Registry::new(),
            constants: Registry::new(),
            observables: Registry::new(),
        })
    }

    pub fn builder() -> VocsBuilder {
        VocsBuilder::default()
    }

    /// Build from a JSON mapping with the five registry keys. Unknown keys
    /// are rejected.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let mut document = match value {
            Value::Object(document) => document,
            other => {
                return Err(ValidationError::UnsupportedInput {
                    kind: "vocs",
                    name: "vocs".to_string(),
                    found: shape_name(&other),
                    expected: "a mapping",
                })
            }
        };
        if let Some(unknown) = document.keys().find(|key| !FIELDS.contains(&key.as_str())) {
            return Err(ValidationError::UnknownField(unknown.clone()));
        }
        let variables = document.remove("variables").ok_or(ValidationError::MissingKey {
            key: "variables".to_string(),
        })?;

        let mut builder = Self::builder().with_variables(variables);
        if let Some(objectives) = document.remove("objectives") {
            builder = builder.with_objectives(objectives);
        }
        if let Some(constraints) = document.remove("constraints") {
            builder = builder.with_constraints(constraints);
        }
        if let Some(constants) = document.remove("constants") {
            builder = builder.with_constants(constants);
        }
        if let Some(observables) = document.remove("observables") {
            builder = builder.with_observables(observables);
        }
        builder.build()
    }

    pub fn from_json_str(json: &str) -> GestResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value)?)
    }

    /// Canonical dump: every entry's fields plus its `type` tag.
    pub fn to_json_value(&self) -> GestResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string_pretty(&self) -> GestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // -- Registries ---------------------------------------------------------

    pub fn variables(&self) -> &Registry<Variable> {
        &self.variables
    }

    pub fn objectives(&self) -> &Registry<Objective> {
        &self.objectives
    }

    pub fn constraints(&self) -> &Registry<Constraint> {
        &self.constraints
    }

    pub fn constants(&self) -> &Registry<Constant> {
        &self.constants
    }

    pub fn observables(&self) -> &Registry<Observable> {
        &self.observables
    }

    // -- Reassignment -------------------------------------------------------
    //
    // Whole-registry setters take raw input and re-run the same validation as
    // construction. On error the previous registry is kept.

    pub fn set_variables(&mut self, value: Value) -> Result<(), ValidationError> {
        let variables = Registry::from_value(value)?;
        if variables.is_empty() {
            return Err(ValidationError::EmptyVariables);
        }
        self.variables = variables;
        Ok(())
    }

    pub fn set_objectives(&mut self, value: Value) -> Result<(), ValidationError> {
        self.objectives = Registry::from_value(value)?;
        Ok(())
    }

    pub fn set_constraints(&mut self, value: Value) -> Result<(), ValidationError> {
        self.constraints = Registry::from_value(value)?;
        Ok(())
    }

    pub fn set_constants(&mut self, value: Value) -> Result<(), ValidationError> {
        self.constants = Registry::from_value(value)?;
        Ok(())
    }

    /// Accepts a mapping, or a list of names each given a default observable.
    pub fn set_observables(&mut self, value: Value) -> Result<(), ValidationError> {
        self.observables = Registry::from_entries(observable_entries(value)?)?;
        Ok(())
    }

    pub fn set_variable(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<Variable>>,
    ) -> Result<(), ValidationError> {
        self.variables.set(name, raw)
    }

    pub fn set_objective(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<Objective>>,
    ) -> Result<(), ValidationError> {
        self.objectives.set(name, raw)
    }

    pub fn set_constraint(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<Constraint>>,
    ) -> Result<(), ValidationError> {
        self.constraints.set(name, raw)
    }

    pub fn set_constant(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<Constant>>,
    ) -> Result<(), ValidationError> {
        self.constants.set(name, raw)
    }

    pub fn set_observable(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<Raw<Observable>>,
    ) -> Result<(), ValidationError> {
        self.observables.set(name, raw)
    }

    /// Remove a variable. The last remaining variable cannot be removed.
    pub fn remove_variable(&mut self, name: &str) -> Result<Option<Variable>, ValidationError> {
        if self.variables.len() == 1 && self.variables.contains_key(name) {
            return Err(ValidationError::EmptyVariables);
        }
        Ok(self.variables.remove(name))
    }

    pub fn objectives_mut(&mut self) -> &mut Registry<Objective> {
        &mut self.objectives
    }

    pub fn constraints_mut(&mut self) -> &mut Registry<Constraint> {
        &mut self.constraints
    }

    pub fn constants_mut(&mut self) -> &mut Registry<Constant> {
        &mut self.constants
    }

    pub fn observables_mut(&mut self) -> &mut Registry<Observable> {
        &mut self.observables
    }

    // -- Derived views ------------------------------------------------------

    /// `[low, high]` per variable, in order. Fails if any variable is not
    /// continuous.
    pub fn bounds(&self) -> Result<Vec<[f64; 2]>, ValidationError> {
        self.variables
            .iter()
            .map(|(name, variable)| {
                variable.domain().ok_or_else(|| ValidationError::NotContinuous {
                    name: name.to_string(),
                })
            })
            .collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.names()
    }

    pub fn objective_names(&self) -> Vec<String> {
        self.objectives.names()
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.constraints.names()
    }

    pub fn observable_names(&self) -> Vec<String> {
        self.observables.names()
    }

    pub fn constant_names(&self) -> Vec<String> {
        self.constants.names()
    }

    /// Variables followed by constants.
    pub fn input_names(&self) -> Vec<String> {
        let mut names = self.variable_names();
        names.extend(self.constant_names());
        names
    }

    /// Objectives, then constraints, then observables, keeping only the first
    /// occurrence of each name.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.objective_names();
        for name in self.constraint_names().into_iter().chain(self.observable_names()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn all_names(&self) -> Vec<String> {
        let mut names = self.input_names();
        names.extend(self.output_names());
        names
    }

    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn n_constants(&self) -> usize {
        self.constants.len()
    }

    pub fn n_inputs(&self) -> usize {
        self.n_variables() + self.n_constants()
    }

    pub fn n_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn n_observables(&self) -> usize {
        self.observables.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.output_names().len()
    }

    // -- Record checks ------------------------------------------------------

    /// Check that `record` carries every variable and constant name.
    pub fn validate_input_record(&self, record: &Record) -> Result<(), ValidationError> {
        require_keys(record, self.input_names())
    }

    /// Check that `record` carries every declared name.
    pub fn validate_output_record(&self, record: &Record) -> Result<(), ValidationError> {
        require_keys(record, self.all_names())
    }

    /// True iff every constraint holds on the record's value for it.
    pub fn feasible(&self, record: &Record) -> Result<bool, ValidationError> {
        for (name, constraint) in self.constraints.iter() {
            let value = record.get(name).ok_or_else(|| ValidationError::MissingKey {
                key: name.to_string(),
            })?;
            if !constraint.check(number(name, value)?) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn require_keys(record: &Record, names: Vec<String>) -> Result<(), ValidationError> {
    match names.into_iter().find(|name| !record.contains_key(name)) {
        Some(key) => Err(ValidationError::MissingKey { key }),
        None => Ok(()),
    }
}

/// Split a registry-shaped JSON mapping into `(name, raw)` pairs.
fn mapping_entries<E: Entity>(value: Value) -> Result<Vec<(String, Raw<E>)>, ValidationError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, Raw::Value(v))).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ValidationError::UnsupportedInput {
            kind: E::KIND,
            name: format!("{}s", E::KIND),
            found: shape_name(&other),
            expected: "a mapping of names to entries",
        }),
    }
}

/// Observables also accept a plain list of names.
fn observable_entries(value: Value) -> Result<Vec<(String, Raw<Observable>)>, ValidationError> {
    match value {
        Value::Array(names) => names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok((name, Raw::Entity(Observable::new()))),
                other => Err(ValidationError::invalid_field(
                    "observables",
                    format!("observable names must be strings, got {other}"),
                )),
            })
            .collect(),
        other => mapping_entries(other),
    }
}

impl<'de> Deserialize<'de> for Vocs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for Vocs {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Collects raw registry inputs and validates them all in [`VocsBuilder::build`].
#[derive(Debug, Default)]
pub struct VocsBuilder {
    variables: Vec<(String, Raw<Variable>)>,
    objectives: Vec<(String, Raw<Objective>)>,
    constraints: Vec<(String, Raw<Constraint>)>,
    constants: Vec<(String, Raw<Constant>)>,
    observables: Vec<(String, Raw<Observable>)>,
    error: Option<ValidationError>,
}

impl VocsBuilder {
    fn absorb<E>(
        mut self,
        entries: Result<Vec<(String, Raw<E>)>, ValidationError>,
        pick: impl FnOnce(&mut Self) -> &mut Vec<(String, Raw<E>)>,
    ) -> Self {
        match entries {
            Ok(entries) => pick(&mut self).extend(entries),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Add every entry of a JSON mapping of variable name to raw variable.
    pub fn with_variables(self, value: Value) -> Self {
        self.absorb(mapping_entries(value), |b| &mut b.variables)
    }

    pub fn with_objectives(self, value: Value) -> Self {
        self.absorb(mapping_entries(value), |b| &mut b.objectives)
    }

    pub fn with_constraints(self, value: Value) -> Self {
        self.absorb(mapping_entries(value), |b| &mut b.constraints)
    }

    pub fn with_constants(self, value: Value) -> Self {
        self.absorb(mapping_entries(value), |b| &mut b.constants)
    }

    /// Accepts a mapping or a list of observable names.
    pub fn with_observables(self, value: Value) -> Self {
        self.absorb(observable_entries(value), |b| &mut b.observables)
    }

    pub fn variable(mut self, name: impl Into<String>, raw: impl Into<Raw<Variable>>) -> Self {
        self.variables.push((name.into(), raw.into()));
        self
    }

    pub fn objective(mut self, name: impl Into<String>, raw: impl Into<Raw<Objective>>) -> Self {
        self.objectives.push((name.into(), raw.into()));
        self
    }

    pub fn constraint(mut self, name: impl Into<String>, raw: impl Into<Raw<Constraint>>) -> Self {
        self.constraints.push((name.into(), raw.into()));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, raw: impl Into<Raw<Constant>>) -> Self {
        self.constants.push((name.into(), raw.into()));
        self
    }

    pub fn observable(mut self, name: impl Into<String>, raw: impl Into<Raw<Observable>>) -> Self {
        self.observables.push((name.into(), raw.into()));
        self
    }

    pub fn build(self) -> Result<Vocs, ValidationError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut vocs = Vocs::new(Registry::from_entries(self.variables)?)?;
        vocs.objectives = Registry::from_entries(self.objectives)?;
        vocs.constraints = Registry::from_entries(self.constraints)?;
        vocs.constants = Registry::from_entries(self.constants)?;
        vocs.observables = Registry::from_entries(self.observables)?;

        debug!(
            variables = vocs.n_variables(),
            objectives = vocs.n_objectives(),
            constraints = vocs.n_constraints(),
            constants = vocs.n_constants(),
            observables = vocs.n_observables(),
            "vocs constructed"
        );
        Ok(vocs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::objectives::ObjectiveDirection;
    use serde_json::json;

    fn sample_vocs() -> Vocs {
        Vocs::builder()
            .with_variables(json!({"x1": [0.0, 1.0], "x2": [-2.0, 2.0]}))
            .with_objectives(json!({"f": "MINIMIZE"}))
            .with_constraints(json!({"c1": ["LESS_THAN", 0.5], "f": ["GREATER_THAN", -10.0]}))
            .with_constants(json!({"mode": "fast"}))
            .with_observables(json!(["o1", "c1"]))
            .build()
            .unwrap()
    }

    #[test]
    fn minimal_problem() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [-5.0, 5.0]}))
            .with_objectives(json!({"f": "MAXIMIZE"}))
            .build()
            .unwrap();

        assert_eq!(vocs.output_names(), vec!["f"]);
        assert_eq!(vocs.n_variables(), 1);
        assert_eq!(vocs.n_objectives(), 1);
        assert_eq!(vocs.n_constraints(), 0);
        assert_eq!(vocs.bounds().unwrap(), vec![[-5.0, 5.0]]);
    }

    #[test]
    fn empty_variables_rejected() {
        let err = Vocs::builder()
            .with_variables(json!({}))
            .with_objectives(json!({"f": "MAXIMIZE"}))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyVariables);

        let err = Vocs::from_value(json!({"objectives": {"f": "MAXIMIZE"}})).unwrap_err();
        assert!(matches!(err, ValidationError::MissingKey { .. }));
    }

    #[test]
    fn unknown_top_level_field_rejected() {
        let err =
            Vocs::from_value(json!({"variables": {"x": [0, 1]}, "settings": {}})).unwrap_err();
        assert_eq!(err, ValidationError::UnknownField("settings".to_string()));
    }

    #[test]
    fn derived_names_dedupe_outputs_only() {
        let vocs = sample_vocs();
        assert_eq!(vocs.output_names(), vec!["f", "c1", "o1"]);
        assert_eq!(vocs.input_names(), vec!["x1", "x2", "mode"]);
        assert_eq!(
            vocs.all_names(),
            vec!["x1", "x2", "mode", "f", "c1", "o1"]
        );
        assert_eq!(vocs.n_constraints(), 2);
        assert_eq!(vocs.n_observables(), 2);
        assert_eq!(vocs.n_outputs(), 3);
        assert_eq!(vocs.n_inputs(), 3);
    }

    #[test]
    fn cross_registry_names_are_tolerated() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .with_constraints(json!({"x": ["LESS_THAN", 0.5]}))
            .build()
            .unwrap();
        assert_eq!(vocs.all_names(), vec!["x", "x"]);
    }

    #[test]
    fn bounds_requires_continuous() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .variable("mode", Raw::<Variable>::set(["a", "b"]))
            .build()
            .unwrap();
        assert_eq!(
            vocs.bounds(),
            Err(ValidationError::NotContinuous {
                name: "mode".to_string()
            })
        );
    }

    #[test]
    fn reassignment_revalidates() {
        let mut vocs = sample_vocs();
        let before = vocs.clone();

        assert!(vocs.set_constraints(json!({"c": ["NOPE", 1]})).is_err());
        assert!(vocs.set_variables(json!({})).is_err());
        assert!(vocs.set_variable("x1", json!([1.0, 0.0])).is_err());
        assert_eq!(vocs, before);

        vocs.set_constraints(json!({"c": ["BOUNDS", 0, 1]})).unwrap();
        assert_eq!(vocs.constraint_names(), vec!["c"]);

        vocs.set_objective("f", "maximize").unwrap();
        assert_eq!(
            vocs.objectives().get("f").unwrap().direction(),
            ObjectiveDirection::Maximize
        );
    }

    #[test]
    fn last_variable_cannot_be_removed() {
        let mut vocs = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0], "y": [0.0, 1.0]}))
            .build()
            .unwrap();
        assert!(vocs.remove_variable("x").unwrap().is_some());
        assert_eq!(vocs.remove_variable("y"), Err(ValidationError::EmptyVariables));
        assert!(vocs.remove_variable("missing").unwrap().is_none());
    }

    #[test]
    fn canonical_dump() {
        let vocs = sample_vocs();
        let dump = vocs.to_json_value().unwrap();

        assert_eq!(
            dump["variables"]["x1"],
            json!({
                "dtype": null,
                "default_value": null,
                "domain": [0.0, 1.0],
                "type": "ContinuousVariable"
            })
        );
        assert_eq!(dump["objectives"]["f"], json!({"dtype": null, "type": "MinimizeObjective"}));
        assert_eq!(
            dump["constraints"]["c1"],
            json!({"dtype": null, "value": 0.5, "type": "LessThanConstraint"})
        );
        assert_eq!(
            dump["constants"]["mode"],
            json!({"dtype": null, "value": "fast", "type": "Constant"})
        );
        assert_eq!(dump["observables"]["o1"], json!({"dtype": null, "type": "Observable"}));

        let keys: Vec<&String> = dump.as_object().unwrap().keys().collect();
        assert_eq!(keys, FIELDS.iter().collect::<Vec<_>>());
    }

    #[test]
    fn round_trip() {
        let vocs = sample_vocs();
        let json = vocs.to_json_string_pretty().unwrap();
        let back = Vocs::from_json_str(&json).unwrap();
        assert_eq!(back, vocs);

        let back: Vocs = serde_json::from_str(&json).unwrap();
        assert_eq!(back.variable_names(), vec!["x1", "x2"]);
    }

    #[test]
    fn feasibility() {
        let vocs = sample_vocs();
        let mut record = Record::new();
        record.insert("c1".into(), json!(0.1));
        record.insert("f".into(), json!(1.0));
        assert_eq!(vocs.feasible(&record), Ok(true));

        record.insert("c1".into(), json!(0.9));
        assert_eq!(vocs.feasible(&record), Ok(false));

        record.remove("f");
        record.insert("c1".into(), json!(0.1));
        assert!(matches!(vocs.feasible(&record), Err(ValidationError::MissingKey { .. })));

        record.insert("f".into(), json!("high"));
        assert!(vocs.feasible(&record).is_err());
    }

    #[test]
    fn record_validation() {
        let vocs = sample_vocs();
        let mut record = Record::new();
        for name in vocs.input_names() {
            record.insert(name, json!(0.0));
        }
        assert!(vocs.validate_input_record(&record).is_ok());
        assert_eq!(
            vocs.validate_output_record(&record),
            Err(ValidationError::MissingKey { key: "f".to_string() })
        );
    }

    #[test]
    fn observables_shapes() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .with_observables(json!({"o": "float", "p": {"type": "Observable"}}))
            .build()
            .unwrap();
        assert_eq!(vocs.observable_names(), vec!["o", "p"]);
        assert_eq!(vocs.observables().get("o").unwrap().type_name(), "Observable");

        let err = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .with_observables(json!("o"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedInput { .. }));
    }
}
