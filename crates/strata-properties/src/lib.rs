//! Material property data: typed property groups, the [`PropertyBundle`]
//! that aggregates them, and the dynamic [`Value`] used by override maps.
//!
//! A bundle is plain data. Inheritance between materials is expressed as
//! "clone the parent's bundle, then merge overrides", so everything here is
//! built around [`PropertyBundle::apply_overrides`] and deep-copying `Clone`.

mod bundle;
mod error;
mod field;
mod groups;
mod value;

pub use bundle::{GroupName, InferredUnit, PropertyBundle, UnknownKeyPolicy, is_group_key};
pub use error::PropertyError;
pub use field::{Availability, Derivable, Difficulty, FieldSlot, Rating, Scalar};
pub use groups::{
    ComplianceProperties, DEFAULT_IOR, ElectricalProperties, ManufacturingProperties,
    MechanicalProperties, OpticalProperties, PropertyGroup, RenderingProperties,
    SourcingProperties, ThermalProperties,
};
pub use value::{Table, Value, ValueError};
