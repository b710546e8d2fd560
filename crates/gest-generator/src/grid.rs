//! Exhaustive grid over the variable space.

use gest_types::{Field, Record, ValidationError, Variable, Vocs};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::protocol::{check_count, validate_results, Generator, LifecycleState};
use crate::sampling::{insert_constants, lerp};

/// Walks the Cartesian product of every variable's grid axis.
///
/// Continuous variables contribute `grid_steps` evenly spaced points from
/// `low` to `high`; discrete variables contribute their values. Points are
/// produced lazily, the last variable varying fastest.
#[derive(Debug)]
pub struct GridGenerator {
    vocs: Arc<Vocs>,
    batch_size: usize,
    axes: Vec<(String, Vec<Value>)>,
    total: usize,
    cursor: usize,
    ingested: usize,
    state: LifecycleState,
}

impl GridGenerator {
    pub fn new(
        vocs: impl Into<Arc<Vocs>>,
        grid_steps: usize,
        batch_size: usize,
    ) -> Result<Self, ValidationError> {
        let vocs = vocs.into();
        Self::validate_vocs(&vocs)?;
        if batch_size == 0 {
            return Err(ValidationError::InvalidField {
                field: "batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if grid_steps < 2 {
            return Err(ValidationError::InvalidField {
                field: "grid_steps".to_string(),
                message: format!("must be at least 2, got {grid_steps}"),
            });
        }

        let axes = Self::build_axes(&vocs, grid_steps);
        let total = axes
            .iter()
            .try_fold(1usize, |acc, (_, axis)| acc.checked_mul(axis.len()))
            .ok_or_else(|| ValidationError::Incompatible {
                generator: "grid".to_string(),
                reason: "a grid with more points than can be addressed".to_string(),
            })?;

        info!(total, batch_size, "grid generator created");
        Ok(Self {
            vocs,
            batch_size,
            axes,
            total,
            cursor: 0,
            ingested: 0,
            state: LifecycleState::Constructed,
        })
    }

    fn build_axes(vocs: &Vocs, steps: usize) -> Vec<(String, Vec<Value>)> {
        vocs.variables()
            .iter()
            .map(|(name, variable)| {
                let axis = match variable {
                    Variable::Continuous(v) => (0..steps)
                        .map(|i| {
                            let t = i as f64 / (steps - 1) as f64;
                            Value::from(lerp(v.low(), v.high(), t))
                        })
                        .collect(),
                    Variable::Discrete(v) => v.values().to_vec(),
                };
                (name.to_string(), axis)
            })
            .collect()
    }

    /// Total number of grid points.
    pub fn grid_size(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.cursor
    }

    pub fn ingested(&self) -> usize {
        self.ingested
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn point_at(&self, mut index: usize) -> Record {
        let mut coords = vec![0usize; self.axes.len()];
        for (slot, (_, axis)) in coords.iter_mut().zip(&self.axes).rev() {
            *slot = index % axis.len();
            index /= axis.len();
        }

        let mut record = Record::new();
        for ((name, axis), coord) in self.axes.iter().zip(coords) {
            record.insert(name.clone(), axis[coord].clone());
        }
        insert_constants(&self.vocs, &mut record);
        record
    }
}

impl Generator for GridGenerator {
    fn name(&self) -> &str {
        "grid"
    }

    fn vocs(&self) -> &Vocs {
        &self.vocs
    }

    /// Grid points are scalar per variable.
    fn validate_vocs(vocs: &Vocs) -> Result<(), ValidationError> {
        match vocs
            .variables()
            .iter()
            .find(|(_, v)| v.dtype().is_some_and(|d| d.is_array()))
        {
            Some((name, _)) => Err(ValidationError::Incompatible {
                generator: "grid".to_string(),
                reason: format!("array-valued variable {name}"),
            }),
            None => Ok(()),
        }
    }

    fn suggest(&mut self, num_points: Option<usize>) -> Result<Vec<Record>, ValidationError> {
        let next = self.state.transition(LifecycleState::Suggesting, "grid")?;
        let count = match num_points {
            Some(requested) => {
                check_count(Some(requested), requested.min(self.remaining()))?;
                requested
            }
            None => self.batch_size.min(self.remaining()),
        };
        self.state = next;

        let points = (self.cursor..self.cursor + count)
            .map(|i| self.point_at(i))
            .collect();
        self.cursor += count;

        debug!(count, remaining = self.remaining(), "grid points suggested");
        Ok(points)
    }

    fn ingest(&mut self, results: &[Record]) -> Result<(), ValidationError> {
        let next = self.state.transition(LifecycleState::Ingesting, "grid")?;
        validate_results(&self.vocs, results)?;
        self.state = next;
        self.ingested += results.len();
        info!(ingested = results.len(), total = self.ingested, "results ingested");
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ValidationError> {
        self.state.advance(LifecycleState::Finalized, "grid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gest_types::Raw;
    use serde_json::json;

    fn sample_vocs() -> Vocs {
        Vocs::builder()
            .with_variables(json!({"a": [0.0, 1.0]}))
            .variable("b", Raw::<Variable>::set(["lo", "hi"]))
            .with_constants(json!({"k": 1}))
            .build()
            .unwrap()
    }

    #[test]
    fn grid_produces_full_product() {
        let mut generator = GridGenerator::new(sample_vocs(), 3, 100).unwrap();
        assert_eq!(generator.grid_size(), 6);

        let points = generator.suggest(None).unwrap();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0]["a"], json!(0.0));
        assert_eq!(points[0]["b"], json!("lo"));
        assert_eq!(points[1]["b"], json!("hi"));
        assert_eq!(points[2]["a"], json!(0.5));
        assert_eq!(points[5]["a"], json!(1.0));
        assert!(points.iter().all(|p| p["k"] == json!(1)));
    }

    #[test]
    fn cursor_advances_by_batch() {
        let mut generator = GridGenerator::new(sample_vocs(), 2, 3).unwrap();
        assert_eq!(generator.suggest(None).unwrap().len(), 3);
        assert_eq!(generator.suggest(None).unwrap().len(), 1);
        assert!(generator.suggest(None).unwrap().is_empty());
    }

    #[test]
    fn explicit_count_beyond_remaining_fails() {
        let mut generator = GridGenerator::new(sample_vocs(), 2, 1).unwrap();
        assert_eq!(generator.suggest(Some(3)).unwrap().len(), 3);
        assert_eq!(
            generator.suggest(Some(5)),
            Err(ValidationError::CountMismatch {
                requested: 5,
                produced: 1
            })
        );
        // A failed call does not consume grid points.
        assert_eq!(generator.remaining(), 1);
    }

    #[test]
    fn failed_calls_keep_lifecycle_state() {
        let mut generator = GridGenerator::new(sample_vocs(), 2, 1).unwrap();
        assert!(generator.suggest(Some(10)).is_err());
        assert_eq!(generator.state(), LifecycleState::Constructed);

        let points = generator.suggest(None).unwrap();
        assert_eq!(generator.state(), LifecycleState::Suggesting);

        let mut incomplete = points[0].clone();
        incomplete.remove("k");
        assert!(generator.ingest(&[incomplete]).is_err());
        assert_eq!(generator.state(), LifecycleState::Suggesting);
        assert_eq!(generator.ingested(), 0);

        generator.ingest(&points).unwrap();
        assert_eq!(generator.state(), LifecycleState::Ingesting);
    }

    #[test]
    fn too_few_grid_steps_rejected() {
        for steps in [0, 1] {
            assert!(matches!(
                GridGenerator::new(sample_vocs(), steps, 1),
                Err(ValidationError::InvalidField { ref field, .. }) if field == "grid_steps"
            ));
        }
    }

    #[test]
    fn widest_domain_yields_finite_axis() {
        let vocs = Vocs::builder()
            .with_variables(json!({"x": [-1e308, 1e308]}))
            .build()
            .unwrap();
        let mut generator = GridGenerator::new(vocs, 3, 3).unwrap();
        let xs: Vec<f64> = generator
            .suggest(None)
            .unwrap()
            .iter()
            .map(|p| p["x"].as_f64().unwrap())
            .collect();
        assert_eq!(xs, vec![-1e308, 0.0, 1e308]);
    }

    #[test]
    fn rejects_array_variables() {
        let vocs = Vocs::builder()
            .with_variables(json!({
                "v": {"type": "ContinuousVariable", "domain": [0, 1], "dtype": ["float", 3]}
            }))
            .build()
            .unwrap();
        let err = GridGenerator::new(vocs, 2, 1).unwrap_err();
        assert!(err
            .to_string()
            .contains("grid generator cannot accept array-valued variable v"));
    }

    #[test]
    fn ingest_counts_results() {
        let mut generator = GridGenerator::new(sample_vocs(), 2, 2).unwrap();
        let points = generator.suggest(None).unwrap();
        generator.ingest(&points).unwrap();
        assert_eq!(generator.ingested(), 2);
        generator.finalize().unwrap();
        assert!(generator.ingest(&points).is_err());
    }
}
