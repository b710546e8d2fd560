//! Independent uniform sampling across the variable space.

use gest_types::{Record, ValidationError, Vocs};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ids::IdTracker;
use crate::protocol::{validate_results, Generator, LifecycleState};
use crate::sampling::random_point;

/// Random sampler that tags every point with an identifier.
///
/// Without an explicit count, `suggest` returns `batch_size` points.
/// Ingested records are kept as history.
#[derive(Debug)]
pub struct RandomGenerator {
    vocs: Arc<Vocs>,
    batch_size: usize,
    rng: StdRng,
    ids: IdTracker,
    history: Vec<Record>,
    state: LifecycleState,
}

impl RandomGenerator {
    pub fn new(vocs: impl Into<Arc<Vocs>>, batch_size: usize) -> Result<Self, ValidationError> {
        let vocs = vocs.into();
        Self::validate_vocs(&vocs)?;
        if batch_size == 0 {
            return Err(ValidationError::InvalidField {
                field: "batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        info!(batch_size, variables = vocs.n_variables(), "random generator created");
        Ok(Self {
            vocs,
            batch_size,
            rng: StdRng::from_os_rng(),
            ids: IdTracker::new(),
            history: Vec::new(),
            state: LifecycleState::Constructed,
        })
    }

    /// Reseed for reproducible suggestions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn history(&self) -> &[Record] {
        &self.history
    }

    pub fn pending_ids(&self) -> usize {
        self.ids.pending_count()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }
}

impl Generator for RandomGenerator {
    fn name(&self) -> &str {
        "random"
    }

    fn vocs(&self) -> &Vocs {
        &self.vocs
    }

    fn returns_id(&self) -> bool {
        true
    }

    /// Any problem can be sampled.
    fn validate_vocs(_vocs: &Vocs) -> Result<(), ValidationError> {
        Ok(())
    }

    fn suggest(&mut self, num_points: Option<usize>) -> Result<Vec<Record>, ValidationError> {
        self.state = self.state.transition(LifecycleState::Suggesting, "random")?;
        let count = num_points.unwrap_or(self.batch_size);

        let points: Vec<Record> = (0..count)
            .map(|_| {
                let mut point = random_point(&self.vocs, &mut self.rng);
                self.ids.tag(&mut point);
                point
            })
            .collect();

        debug!(count, pending = self.ids.pending_count(), "random points suggested");
        Ok(points)
    }

    fn ingest(&mut self, results: &[Record]) -> Result<(), ValidationError> {
        let next = self.state.transition(LifecycleState::Ingesting, "random")?;
        validate_results(&self.vocs, results)?;
        let matched = self.ids.check(results).inspect_err(|e| {
            warn!(error = %e, "ingest rejected");
        })?;

        self.state = next;
        self.ids.retire(&matched);
        self.history.extend_from_slice(results);
        info!(
            ingested = results.len(),
            matched = matched.len(),
            total = self.history.len(),
            "results ingested"
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), ValidationError> {
        self.state.advance(LifecycleState::Finalized, "random")?;
        info!(
            evaluated = self.history.len(),
            outstanding = self.ids.pending_count(),
            "random generator finalized"
        );
        Ok(())
    }
}
