//! Run configuration: the problem plus which generator to drive it with.

use gest_types::{config_error, GestResult, ValidationError, Vocs};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::greedy::GreedyGenerator;
use crate::grid::GridGenerator;
use crate::protocol::Generator;
use crate::random::RandomGenerator;

/// Which reference generator to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Random,
    Grid,
    Greedy,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Random => write!(f, "random"),
            Strategy::Grid => write!(f, "grid"),
            Strategy::Greedy => write!(f, "greedy"),
        }
    }
}

/// Generator settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Run label used in logs.
    pub name: String,
    pub strategy: Strategy,
    /// Points per `suggest` call when no count is requested.
    pub batch_size: usize,
    /// Points per continuous axis for the grid strategy.
    pub grid_steps: usize,
    /// Probability of a random point for the greedy strategy.
    pub exploration_weight: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "gest".to_string(),
            strategy: Strategy::Random,
            batch_size: 1,
            grid_steps: 5,
            exploration_weight: 0.3,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_grid_steps(mut self, grid_steps: usize) -> Self {
        self.grid_steps = grid_steps;
        self
    }

    pub fn with_exploration_weight(mut self, weight: f64) -> Self {
        self.exploration_weight = weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> GestResult<()> {
        if self.batch_size == 0 {
            return Err(config_error!("batch_size must be at least 1"));
        }
        if self.grid_steps < 2 {
            return Err(config_error!(
                "grid_steps must be at least 2, got {}",
                self.grid_steps
            ));
        }
        if !(0.0..=1.0).contains(&self.exploration_weight) {
            return Err(config_error!(
                "exploration_weight must lie in [0, 1], got {}",
                self.exploration_weight
            ));
        }
        Ok(())
    }
}

/// A complete run description, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub vocs: Vocs,
    pub generator: GeneratorConfig,
}

/// On-disk layout. The VOCS stays raw JSON so its errors surface as
/// [`ValidationError`]s rather than serde messages.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RunConfigDocument {
    vocs: Value,
    #[serde(default)]
    generator: GeneratorConfig,
}

impl RunConfig {
    pub fn new(vocs: Vocs, generator: GeneratorConfig) -> Self {
        Self { vocs, generator }
    }

    pub fn from_json_str(json: &str) -> GestResult<Self> {
        let document: RunConfigDocument = serde_json::from_str(json)?;
        let vocs = Vocs::from_value(document.vocs)?;
        document.generator.validate()?;
        Ok(Self::new(vocs, document.generator))
    }

    pub fn from_path(path: impl AsRef<Path>) -> GestResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            strategy = %config.generator.strategy,
            variables = config.vocs.n_variables(),
            "run config loaded"
        );
        Ok(config)
    }

    pub fn build_generator(&self) -> Result<Box<dyn Generator>, ValidationError> {
        build_generator(Arc::new(self.vocs.clone()), &self.generator)
    }
}

/// Construct the configured generator against `vocs`.
pub fn build_generator(
    vocs: Arc<Vocs>,
    config: &GeneratorConfig,
) -> Result<Box<dyn Generator>, ValidationError> {
    let generator: Box<dyn Generator> = match config.strategy {
        Strategy::Random => {
            let generator = RandomGenerator::new(vocs, config.batch_size)?;
            match config.seed {
                Some(seed) => Box::new(generator.with_seed(seed)),
                None => Box::new(generator),
            }
        }
        Strategy::Grid => Box::new(GridGenerator::new(vocs, config.grid_steps, config.batch_size)?),
        Strategy::Greedy => {
            let generator =
                GreedyGenerator::new(vocs, config.batch_size, config.exploration_weight)?;
            match config.seed {
                Some(seed) => Box::new(generator.with_seed(seed)),
                None => Box::new(generator),
            }
        }
    };
    info!(run = %config.name, generator = generator.name(), "generator built");
    Ok(generator)
}
