//! The generator lifecycle contract.

use gest_types::{Record, ValidationError, Vocs};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Reserved record key carrying generator-assigned point identifiers.
pub const ID_KEY: &str = "_id";

/// Common trait for all optimization algorithms driven through
/// `suggest`/`ingest`/`finalize`.
///
/// Calls are made from a single logical thread of control; implementations
/// that run background work must still return fully-formed points from
/// `suggest` and only return from `ingest` once the records are absorbed.
pub trait Generator: Send {
    /// Human-readable generator name.
    fn name(&self) -> &str;

    /// The problem this generator was constructed against.
    fn vocs(&self) -> &Vocs;

    /// Whether suggested points carry an [`ID_KEY`] identifier that must be
    /// echoed back in `ingest`.
    fn returns_id(&self) -> bool {
        false
    }

    /// Reject problems this generator cannot handle. Constructors call this
    /// before returning an instance.
    fn validate_vocs(vocs: &Vocs) -> Result<(), ValidationError>
    where
        Self: Sized;

    /// Produce the next points to evaluate. With `Some(n)` exactly `n` points
    /// are returned or the call fails; with `None` the generator picks the
    /// count.
    fn suggest(&mut self, num_points: Option<usize>) -> Result<Vec<Record>, ValidationError>;

    /// Feed evaluated points back. Every record must carry every name the
    /// VOCS declares.
    fn ingest(&mut self, results: &[Record]) -> Result<(), ValidationError> {
        validate_results(self.vocs(), results)
    }

    /// Flush any outstanding work. After this returns, everything the
    /// generator knows about is reflected in its state.
    fn finalize(&mut self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Fail unless `produced` matches an explicitly requested count.
pub fn check_count(requested: Option<usize>, produced: usize) -> Result<(), ValidationError> {
    match requested {
        Some(requested) if requested != produced => {
            warn!(requested, produced, "suggest count mismatch");
            Err(ValidationError::CountMismatch {
                requested,
                produced,
            })
        }
        _ => Ok(()),
    }
}

/// Check that every result record carries every declared name.
pub fn validate_results(vocs: &Vocs, results: &[Record]) -> Result<(), ValidationError> {
    results
        .iter()
        .try_for_each(|record| vocs.validate_output_record(record))
}

/// Lifecycle state of a generator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    #[default]
    Constructed,
    Suggesting,
    Ingesting,
    Finalized,
}

impl LifecycleState {
    /// Check that `next` is reachable without moving. Callers validate the
    /// rest of their input and only then store the returned state.
    pub fn transition(
        self,
        next: LifecycleState,
        generator: &str,
    ) -> Result<LifecycleState, ValidationError> {
        if self == Self::Finalized {
            warn!(generator, ?next, "call after finalize rejected");
            return Err(ValidationError::Finalized(generator.to_string()));
        }
        Ok(next)
    }

    /// Move to `next`, refusing any transition out of `Finalized`.
    pub fn advance(
        &mut self,
        next: LifecycleState,
        generator: &str,
    ) -> Result<(), ValidationError> {
        *self = self.transition(next, generator)?;
        Ok(())
    }

    pub fn is_finalized(self) -> bool {
        self == Self::Finalized
    }
}
