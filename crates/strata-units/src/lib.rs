//! Unit tags for material properties: the default-unit table and a small
//! table-driven converter between units of the same physical dimension.
//!
//! Units are looked up by symbol in a fixed table; each entry maps linearly
//! (or affinely, for temperatures) onto the SI base of its dimension.

mod defaults;
mod quantity;
mod unit;

pub use defaults::{STANDARD_UNITS, default_unit};
pub use quantity::{Quantity, convert};
pub use unit::{Dimension, Unit, UnitError};
