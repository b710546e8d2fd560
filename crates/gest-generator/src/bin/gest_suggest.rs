//! Print one batch of suggestions for a run config as JSON.
//!
//! Usage: `gest-suggest [RUN_CONFIG] [NUM_POINTS]`. Either argument may come
//! from `GEST_RUN_CONFIG` / `GEST_NUM_POINTS` instead. Without a count the
//! generator's batch size is used. Logs go to stderr, filtered by `GEST_LOG`
//! or `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use gest_generator::RunConfig;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const RUN_CONFIG_VAR: &str = "GEST_RUN_CONFIG";
const NUM_POINTS_VAR: &str = "GEST_NUM_POINTS";

/// Resolved command line.
#[derive(Debug, PartialEq)]
struct Invocation {
    path: String,
    num_points: Option<usize>,
}

/// Positional arguments win over their environment fallbacks.
fn resolve_args<I, F>(args: I, var: F) -> Result<Invocation>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut args = args.into_iter();
    let path = match args.next().or_else(|| var(RUN_CONFIG_VAR)) {
        Some(path) => path,
        None => bail!("usage: gest-suggest <RUN_CONFIG> [NUM_POINTS]"),
    };
    let num_points = args
        .next()
        .or_else(|| var(NUM_POINTS_VAR))
        .map(|n| {
            n.parse::<usize>()
                .with_context(|| format!("invalid point count {n:?}"))
        })
        .transpose()?;

    Ok(Invocation { path, num_points })
}

fn init_logging() {
    let filter = env::var("GEST_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let Invocation { path, num_points } =
        resolve_args(env::args().skip(1), |key| env::var(key).ok())?;

    let config = RunConfig::from_path(&path).with_context(|| format!("loading {path}"))?;
    let mut generator = config.build_generator()?;

    let points = generator.suggest(num_points)?;
    info!(generator = generator.name(), count = points.len(), "suggestions ready");
    println!("{}", serde_json::to_string_pretty(&points)?);

    generator.finalize()?;
    Ok(())
}
