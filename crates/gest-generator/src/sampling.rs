//! Point construction shared by the reference generators.

use gest_types::{Field, Record, Variable, Vocs};
use rand::Rng;
use serde_json::Value;

/// Draw one value for `variable`: uniform over a continuous domain, uniform
/// choice over discrete values. Array-valued variables get an independently
/// sampled (possibly nested) array of the declared shape.
pub fn sample_variable<R: Rng>(rng: &mut R, variable: &Variable) -> Value {
    match variable.dtype().and_then(|d| d.array_shape()) {
        Some(shape) => fill_shape(&shape, &mut || sample_scalar(rng, variable)),
        None => sample_scalar(rng, variable),
    }
}

fn sample_scalar<R: Rng>(rng: &mut R, variable: &Variable) -> Value {
    match variable {
        Variable::Continuous(v) => Value::from(lerp(v.low(), v.high(), rng.random::<f64>())),
        Variable::Discrete(v) => {
            let idx = rng.random_range(0..v.len());
            v.values()[idx].clone()
        }
    }
}

/// Point at fraction `t` of `[low, high]`, clamped to the interval.
///
/// Never forms `high - low`, which overflows for domains wider than `f64::MAX`.
pub fn lerp(low: f64, high: f64, t: f64) -> f64 {
    (low * (1.0 - t) + high * t).clamp(low, high)
}

/// Build a nested array of the given shape, filling leaves from `leaf`.
pub fn fill_shape(shape: &[usize], leaf: &mut dyn FnMut() -> Value) -> Value {
    match shape.split_first() {
        None => leaf(),
        Some((&len, rest)) => Value::Array((0..len).map(|_| fill_shape(rest, leaf)).collect()),
    }
}

/// Append every constant's value to `record`.
pub fn insert_constants(vocs: &Vocs, record: &mut Record) {
    for (name, constant) in vocs.constants().iter() {
        record.insert(name.to_string(), constant.value().clone());
    }
}

/// One uniformly random input point: every variable, then every constant.
pub fn random_point<R: Rng>(vocs: &Vocs, rng: &mut R) -> Record {
    let mut record = Record::new();
    for (name, variable) in vocs.variables().iter() {
        record.insert(name.to_string(), sample_variable(rng, variable));
    }
    insert_constants(vocs, &mut record);
    record
}
