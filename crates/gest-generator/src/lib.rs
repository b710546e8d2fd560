//! # gest-generator
//!
//! The suggest/ingest/finalize protocol that drives optimization over a
//! [`gest_types::Vocs`], with identifier tracking for generators that tag
//! their points, and three reference generators (random, grid, greedy).
//!
//! Generators are built directly or from a [`RunConfig`] loaded from JSON.

pub mod config;
mod greedy;
mod grid;
mod ids;
pub mod protocol;
mod random;
pub mod sampling;

pub use config::{build_generator, GeneratorConfig, RunConfig, Strategy};
pub use greedy::GreedyGenerator;
pub use grid::GridGenerator;
pub use ids::IdTracker;
pub use protocol::{check_count, validate_results, Generator, LifecycleState, ID_KEY};
pub use random::RandomGenerator;
