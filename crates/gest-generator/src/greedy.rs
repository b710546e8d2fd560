//! Single-objective greedy search: explore at random, or perturb the best
//! point seen so far.

use gest_types::{Field, ObjectiveDirection, Record, ValidationError, Variable, Vocs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::protocol::{check_count, validate_results, Generator, LifecycleState};
use crate::sampling::{insert_constants, random_point, sample_variable};

/// Fraction of a continuous domain used as the perturbation radius.
const PERTURBATION: f64 = 0.1;

/// Greedy optimizer for one MINIMIZE or MAXIMIZE objective.
///
/// Each suggested point is a uniform random sample with probability
/// `exploration_weight` (and always before anything has been observed);
/// otherwise it is the incumbent with every continuous coordinate nudged by
/// up to 10% of its domain. Discrete and array-valued variables are
/// resampled. Always suggests exactly `batch_size` points.
#[derive(Debug)]
pub struct GreedyGenerator {
    vocs: Arc<Vocs>,
    batch_size: usize,
    exploration_weight: f64,
    rng: StdRng,
    objective: String,
    direction: ObjectiveDirection,
    observations: Vec<(Record, f64)>,
    best: Option<usize>,
    state: LifecycleState,
}

impl GreedyGenerator {
    pub fn new(
        vocs: impl Into<Arc<Vocs>>,
        batch_size: usize,
        exploration_weight: f64,
    ) -> Result<Self, ValidationError> {
        let vocs = vocs.into();
        Self::validate_vocs(&vocs)?;
        if batch_size == 0 {
            return Err(ValidationError::InvalidField {
                field: "batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&exploration_weight) {
            return Err(ValidationError::InvalidField {
                field: "exploration_weight".to_string(),
                message: format!("must lie in [0, 1], got {exploration_weight}"),
            });
        }

        let (objective, direction) = vocs
            .objectives()
            .iter()
            .map(|(name, objective)| (name.to_string(), objective.direction()))
            .next()
            .ok_or(ValidationError::Incompatible {
                generator: "greedy".to_string(),
                reason: "a problem without objectives".to_string(),
            })?;

        info!(batch_size, exploration_weight, objective = %objective, "greedy generator created");
        Ok(Self {
            vocs,
            batch_size,
            exploration_weight,
            rng: StdRng::from_os_rng(),
            objective,
            direction,
            observations: Vec::new(),
            best: None,
            state: LifecycleState::Constructed,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Incumbent record and its objective value.
    pub fn best(&self) -> Option<(&Record, f64)> {
        self.best
            .map(|i| &self.observations[i])
            .map(|(record, value)| (record, *value))
    }

    pub fn n_observations(&self) -> usize {
        self.observations.len()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn objective_value(&self, record: &Record) -> Result<f64, ValidationError> {
        record
            .get(&self.objective)
            .and_then(Value::as_f64)
            .ok_or_else(|| ValidationError::InvalidField {
                field: self.objective.clone(),
                message: "objective value must be numeric".to_string(),
            })
    }

    fn perturb(&mut self, base: &Record) -> Record {
        let mut point = Record::new();
        for (name, variable) in self.vocs.variables().iter() {
            let scalar = variable.dtype().map_or(true, |d| !d.is_array());
            let value = match (variable, base.get(name).and_then(Value::as_f64)) {
                (Variable::Continuous(v), Some(x)) if scalar => {
                    // Scale each bound separately; `high - low` can overflow.
                    let step = self.rng.random_range(-PERTURBATION..PERTURBATION);
                    let noise = step * v.high() - step * v.low();
                    Value::from((x + noise).clamp(v.low(), v.high()))
                }
                _ => sample_variable(&mut self.rng, variable),
            };
            point.insert(name.to_string(), value);
        }
        insert_constants(&self.vocs, &mut point);
        point
    }
}

impl Generator for GreedyGenerator {
    fn name(&self) -> &str {
        "greedy"
    }

    fn vocs(&self) -> &Vocs {
        &self.vocs
    }

    fn validate_vocs(vocs: &Vocs) -> Result<(), ValidationError> {
        let incompatible = |reason: String| ValidationError::Incompatible {
            generator: "greedy".to_string(),
            reason,
        };

        if vocs.n_objectives() != 1 {
            return Err(incompatible(format!(
                "{} objectives, exactly one is required",
                vocs.n_objectives()
            )));
        }
        if vocs
            .objectives()
            .values()
            .any(|o| o.direction() == ObjectiveDirection::Explore)
        {
            return Err(incompatible("an EXPLORE objective".to_string()));
        }
        if vocs.n_constraints() > 0 {
            return Err(incompatible("constraints".to_string()));
        }
        Ok(())
    }

    fn suggest(&mut self, num_points: Option<usize>) -> Result<Vec<Record>, ValidationError> {
        let next = self.state.transition(LifecycleState::Suggesting, "greedy")?;
        check_count(num_points, self.batch_size)?;
        self.state = next;

        let incumbent = self.best().map(|(record, _)| record.clone());
        let mut explored = 0usize;
        let mut points = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            let point = match &incumbent {
                Some(base) if self.rng.random::<f64>() >= self.exploration_weight => {
                    self.perturb(base)
                }
                _ => {
                    explored += 1;
                    random_point(&self.vocs, &mut self.rng)
                }
            };
            points.push(point);
        }

        debug!(count = points.len(), explored, "greedy points suggested");
        Ok(points)
    }

    fn ingest(&mut self, results: &[Record]) -> Result<(), ValidationError> {
        let next = self.state.transition(LifecycleState::Ingesting, "greedy")?;
        validate_results(&self.vocs, results)?;
        let values = results
            .iter()
            .map(|record| self.objective_value(record))
            .collect::<Result<Vec<_>, _>>()?;
        self.state = next;

        for (record, value) in results.iter().zip(values) {
            let improves = match self.best() {
                Some((_, incumbent)) => self.direction.improves(value, incumbent),
                None => true,
            };
            self.observations.push((record.clone(), value));
            if improves {
                self.best = Some(self.observations.len() - 1);
            }
        }

        info!(
            ingested = results.len(),
            total = self.observations.len(),
            best = self.best().map(|(_, v)| v),
            "results ingested"
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ValidationError> {
        self.state.advance(LifecycleState::Finalized, "greedy")?;
        info!(
            evaluated = self.observations.len(),
            best = self.best().map(|(_, v)| v),
            "greedy generator finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gest_types::Raw;
    use serde_json::json;

    fn sample_vocs(direction: &str) -> Vocs {
        Vocs::builder()
            .with_variables(json!({"x": [0.0, 10.0]}))
            .variable("mode", Raw::<Variable>::set(["a", "b"]))
            .with_objectives(json!({"f": direction}))
            .build()
            .unwrap()
    }

    fn result(x: f64, mode: &str, f: Value) -> Record {
        let mut record = Record::new();
        record.insert("x".into(), json!(x));
        record.insert("mode".into(), json!(mode));
        record.insert("f".into(), f);
        record
    }

    #[test]
    fn explicit_count_must_match_batch() {
        let mut generator = GreedyGenerator::new(sample_vocs("MAXIMIZE"), 3, 0.3).unwrap();
        assert_eq!(
            generator.suggest(Some(5)),
            Err(ValidationError::CountMismatch {
                requested: 5,
                produced: 3
            })
        );
        assert_eq!(generator.state(), LifecycleState::Constructed);
        assert_eq!(generator.suggest(Some(3)).unwrap().len(), 3);
        assert_eq!(generator.suggest(None).unwrap().len(), 3);
        assert_eq!(generator.state(), LifecycleState::Suggesting);
    }

    #[test]
    fn widest_domain_stays_finite() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [-1e308, 1e308]}))
            .with_objectives(json!({"f": "MINIMIZE"}))
            .build()
            .unwrap();
        let mut generator = GreedyGenerator::new(vocs, 8, 0.0).unwrap().with_seed(2);
        let mut seed = Record::new();
        seed.insert("x".into(), json!(9e307));
        seed.insert("f".into(), json!(0.0));
        generator.ingest(&[seed]).unwrap();

        for point in generator.suggest(None).unwrap() {
            let x = point["x"].as_f64().unwrap();
            assert!(x.is_finite());
            assert!((-1e308..=1e308).contains(&x));
        }
    }

    #[test]
    fn tracks_best_in_objective_direction() {
        let mut max = GreedyGenerator::new(sample_vocs("MAXIMIZE"), 1, 0.3).unwrap();
        max.ingest(&[result(1.0, "a", json!(2.0)), result(2.0, "b", json!(5.0))])
            .unwrap();
        max.ingest(&[result(3.0, "a", json!(4.0))]).unwrap();
        let (record, value) = max.best().unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(record["x"], json!(2.0));
        assert_eq!(max.n_observations(), 3);

        let mut min = GreedyGenerator::new(sample_vocs("MINIMIZE"), 1, 0.3).unwrap();
        min.ingest(&[result(1.0, "a", json!(2.0)), result(2.0, "b", json!(5.0))])
            .unwrap();
        assert_eq!(min.best().unwrap().1, 2.0);
    }

    #[test]
    fn exploits_near_incumbent() {
        let mut generator = GreedyGenerator::new(sample_vocs("MAXIMIZE"), 20, 0.0)
            .unwrap()
            .with_seed(3);
        generator
            .ingest(&[result(5.0, "a", json!(1.0)), result(9.0, "b", json!(0.0))])
            .unwrap();

        for point in generator.suggest(None).unwrap() {
            let x = point["x"].as_f64().unwrap();
            assert!((4.0..=6.0).contains(&x), "x = {x}");
        }
    }

    #[test]
    fn explores_before_any_observation() {
        let mut generator = GreedyGenerator::new(sample_vocs("MAXIMIZE"), 10, 0.0)
            .unwrap()
            .with_seed(11);
        let points = generator.suggest(None).unwrap();
        assert_eq!(points.len(), 10);
        assert!(points
            .iter()
            .all(|p| (0.0..=10.0).contains(&p["x"].as_f64().unwrap())));
    }

    #[test]
    fn non_numeric_objective_rejects_whole_batch() {
        let mut generator = GreedyGenerator::new(sample_vocs("MAXIMIZE"), 1, 0.3).unwrap();
        let err = generator
            .ingest(&[result(1.0, "a", json!(1.0)), result(2.0, "a", json!("high"))])
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "f"));
        assert_eq!(generator.n_observations(), 0);
        assert!(generator.best().is_none());
        assert_eq!(generator.state(), LifecycleState::Constructed);
    }

    #[test]
    fn rejects_unsupported_problems() {
        let two = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .with_objectives(json!({"f": "MINIMIZE", "g": "MAXIMIZE"}))
            .build()
            .unwrap();
        assert!(GreedyGenerator::new(two, 1, 0.3).is_err());

        let explore = sample_vocs("EXPLORE");
        assert!(GreedyGenerator::new(explore, 1, 0.3).is_err());

        let constrained = Vocs::builder()
            .with_variables(json!({"x": [0.0, 1.0]}))
            .with_objectives(json!({"f": "MINIMIZE"}))
            .with_constraints(json!({"c": ["LESS_THAN", 0.5]}))
            .build()
            .unwrap();
        assert_eq!(
            GreedyGenerator::validate_vocs(&constrained),
            Err(ValidationError::Incompatible {
                generator: "greedy".to_string(),
                reason: "constraints".to_string()
            })
        );
    }

    #[test]
    fn exploration_weight_must_be_a_probability() {
        assert!(GreedyGenerator::new(sample_vocs("MAXIMIZE"), 1, 1.5).is_err());
        assert!(GreedyGenerator::new(sample_vocs("MAXIMIZE"), 1, -0.1).is_err());
    }
}
