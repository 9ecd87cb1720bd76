//! Error types for material trees, the library loader and the apply hook.

use std::path::PathBuf;

use strata_properties::PropertyError;
use strata_units::UnitError;
use thiserror::Error;

use crate::formula::FormulaError;

/// Errors raised while constructing or navigating material trees.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// `resolve` found no child under the requested key.
    #[error("no material {key:?} under {node:?} (available: {list})", list = .available.join(", "))]
    NotFound {
        /// Path of the node that was searched.
        node: String,
        /// Requested child key.
        key: String,
        /// Child keys that do exist.
        available: Vec<String>,
    },

    /// A child with this key is already attached. Use `replace_child` to swap it.
    #[error("{parent:?} already has a child {key:?}")]
    DuplicateChild { parent: String, key: String },

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// An identity key (`name`, `formula`, `composition`, metadata tags) had
    /// the wrong type.
    #[error("{key:?} must be {expected}, found {found}")]
    InvalidIdentity {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Wraps an error with the dotted path of the node being built.
    #[error("at {path}: {source}")]
    AtNode {
        path: String,
        #[source]
        source: Box<MaterialError>,
    },
}

impl MaterialError {
    pub(crate) fn at(path: impl Into<String>, source: MaterialError) -> Self {
        // Keep the innermost path only.
        match source {
            inner @ MaterialError::AtNode { .. } => inner,
            other => MaterialError::AtNode {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Errors raised while loading material data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        /// File path or bundled category name.
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown material category {name:?} (available: {list})", list = .available.join(", "))]
    UnknownCategory {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("no material {name:?} in the library")]
    UnknownMaterial { name: String },

    /// A category file was loaded but did not define one of its base materials.
    #[error("category {category:?} does not define {name:?}")]
    MissingBase { category: String, name: String },

    #[error(transparent)]
    Build(#[from] MaterialError),
}

/// Raised by a [`MaterialTarget`](crate::MaterialTarget) that refuses a material.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("target rejected material {material:?}: {reason}")]
    Rejected { material: String, reason: String },

    #[error("cannot compute mass for {material:?}: {source}")]
    Mass {
        material: String,
        #[source]
        source: UnitError,
    },
}
