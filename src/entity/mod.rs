//! Entity layer modules.
//!
//! Typed teacher/school records plus the narrow views the matching and
//! resolution code depend on.

pub mod entity;
pub mod fields;
pub mod record;

pub use entity::{EntityId, EntityKind};
pub use fields::{ContactFields, Freshness};
pub use record::{EntityRecord, School, Teacher};
