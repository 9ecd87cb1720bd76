//! Hierarchical materials: nodes that inherit a [`PropertyBundle`] from their
//! parent and override parts of it, a [`TreeBuilder`] that turns nested TOML
//! tables into node trees, a flat [`Registry`] of every node by key, and a
//! lazily loading [`Library`] of bundled material categories.
//!
//! ```no_run
//! use strata_materials::{Library, Registry};
//!
//! let library = Library::new(Registry::global());
//! let steel = library.get("stainless.s316L")?;
//! println!("{}", steel.info());
//! # Ok::<(), strata_materials::LoadError>(())
//! ```
//!
//! [`PropertyBundle`]: strata_properties::PropertyBundle

pub mod apply;
pub mod builder;
pub mod error;
pub mod factories;
pub mod formula;
pub mod library;
pub mod node;
pub mod registry;

#[cfg(test)]
mod inheritance_tests;

pub use apply::{MaterialTarget, RenderableShape, apply};
pub use builder::TreeBuilder;
pub use error::{ApplyError, LoadError, MaterialError};
pub use factories::{air, saline, water};
pub use formula::{Composition, FormulaError, is_element, parse_formula};
pub use library::{CATEGORIES, Category, Library, load_toml, load_toml_str};
pub use node::{ChildKind, IDENTITY_KEYS, MaterialNode, Metadata, Overrides};
pub use registry::Registry;
