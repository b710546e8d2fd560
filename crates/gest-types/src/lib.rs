//! # gest-types
//!
//! The VOCS problem schema shared by optimization drivers and generators:
//! typed variables, objectives, constraints, constants and observables held in
//! validated registries, and the aggregate [`Vocs`] descriptor.
//!
//! Raw input (pairs, sets, `[TAG, ...]` lists, strings, scalars and mappings
//! with a `type` key) is coerced into typed entities on every write; the
//! canonical dump (each entry's fields plus a `type` tag) round-trips through
//! the same coercion rules.

pub mod constants;
pub mod constraints;
pub mod errors;
pub mod field;
pub mod objectives;
pub mod observables;
pub mod registry;
pub mod variables;
pub mod vocs;

pub use constants::*;
pub use constraints::*;
pub use errors::*;
pub use field::*;
pub use objectives::*;
pub use observables::*;
pub use registry::{Entity, Raw, Registry};
pub use variables::*;
pub use vocs::*;
