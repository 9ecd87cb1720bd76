use thiserror::Error;

use crate::value::ValueError;

/// Errors raised while merging overrides into a property bundle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("unknown property group: {0:?}")]
    UnknownGroup(String),

    /// Only raised under [`UnknownKeyPolicy::Reject`](crate::UnknownKeyPolicy::Reject).
    #[error("unknown field {group}.{field}")]
    UnknownField { group: &'static str, field: String },

    #[error("invalid value for {group}.{field}: {source}")]
    InvalidValue {
        group: &'static str,
        field: String,
        #[source]
        source: ValueError,
    },

    /// A group override was given as something other than a table.
    #[error("property group {group:?} must be a table, found {found}")]
    NotATable { group: String, found: &'static str },
}
