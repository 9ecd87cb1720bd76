//! Typed property fields and the [`FieldSlot`] bridge from dynamic [`Value`]s.

use std::fmt;

use strata_units::{Quantity, UnitError};

use crate::value::{Value, ValueError};

// ---------------------------------------------------------------------------
// FieldSlot
// ---------------------------------------------------------------------------

/// A property field that can be written from and read back as a [`Value`].
///
/// Group structs expose their fields by name through this trait, which is what
/// lets override maps address fields with plain string keys.
pub trait FieldSlot {
    /// Replaces the field's value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value has the wrong type, length or range.
    fn assign(&mut self, value: &Value) -> Result<(), ValueError>;

    /// Current value, or `None` when the field is not set.
    fn read(&self) -> Option<Value>;

    /// The unit-tagged view of this field, if it carries a unit.
    fn scalar(&self) -> Option<&Scalar> {
        None
    }

    fn scalar_mut(&mut self) -> Option<&mut Scalar> {
        None
    }
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// A numeric value with a unit tag. Both halves are optional: a freshly
/// constructed scalar is "not set", which is distinct from zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scalar {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl Scalar {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value: Some(value),
            unit: Some(unit.to_string()),
        }
    }

    /// A value without a unit tag; the bundle backfills the default unit.
    pub fn bare(value: f64) -> Self {
        Self {
            value: Some(value),
            unit: None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<f64> {
        self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// The value as a [`Quantity`], or `None` when not set.
    ///
    /// # Errors
    ///
    /// [`UnitError::Missing`] if the value has no unit tag, or
    /// [`UnitError::Unknown`] if the tag is not a known unit.
    pub fn quantity(&self) -> Result<Option<Quantity>, UnitError> {
        let Some(value) = self.value else {
            return Ok(None);
        };
        let unit = self.unit.as_deref().ok_or(UnitError::Missing)?;
        Quantity::new(value, unit).map(Some)
    }

    /// The value converted into `unit`, or `None` when not set.
    ///
    /// # Errors
    ///
    /// See [`Scalar::quantity`] and [`Quantity::to`].
    pub fn to(&self, unit: &str) -> Result<Option<f64>, UnitError> {
        match self.quantity()? {
            Some(q) => Ok(Some(q.to(unit)?.value())),
            None => Ok(None),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.value, self.unit.as_deref()) {
            (Some(v), Some(u)) => write!(f, "{v} {u}"),
            (Some(v), None) => write!(f, "{v}"),
            (None, _) => f.write_str("unset"),
        }
    }
}

impl FieldSlot for Scalar {
    /// Accepts a bare number, or an inline `{ value = .., unit = ".." }` table.
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        if let Some(table) = value.as_table() {
            let number = table.get("value").unwrap_or(&Value::Unset).expect_f64()?;
            let unit = match table.get("unit") {
                Some(unit) => Some(unit.expect_str()?.to_string()),
                None => None,
            };
            self.value = Some(number);
            if unit.is_some() {
                self.unit = unit;
            }
            return Ok(());
        }
        self.value = Some(value.expect_f64()?);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.value.map(Value::Float)
    }

    fn scalar(&self) -> Option<&Scalar> {
        Some(self)
    }

    fn scalar_mut(&mut self) -> Option<&mut Scalar> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Plain fields
// ---------------------------------------------------------------------------

impl FieldSlot for f64 {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = value.expect_f64()?;
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }
}

impl FieldSlot for Option<f64> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = Some(value.expect_f64()?);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.map(Value::Float)
    }
}

impl FieldSlot for Option<bool> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = Some(value.expect_bool()?);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.map(Value::Bool)
    }
}

impl FieldSlot for Option<String> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = Some(value.expect_str()?.to_string());
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.clone().map(Value::String)
    }
}

/// Recycling resin code, 1 through 7.
impl FieldSlot for Option<u8> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        let code = value.as_i64().ok_or(ValueError::TypeMismatch {
            expected: "integer",
            found: value.type_name(),
        })?;
        if !(1..=7).contains(&code) {
            return Err(ValueError::OutOfRange {
                value: code as f64,
                min: 1.0,
                max: 7.0,
            });
        }
        *self = Some(code as u8);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.map(|code| Value::Integer(i64::from(code)))
    }
}

impl FieldSlot for Vec<String> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        let items = value.expect_array()?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(item.expect_str()?.to_string());
        }
        *self = out;
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        Some(Value::Array(
            self.iter().cloned().map(Value::String).collect(),
        ))
    }
}

fn tuple_from_value<const N: usize>(value: &Value) -> Result<[f64; N], ValueError> {
    let items = value.expect_array()?;
    if items.len() != N {
        return Err(ValueError::Length {
            expected: N,
            found: items.len(),
        });
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.expect_f64()?;
    }
    Ok(out)
}

impl<const N: usize> FieldSlot for [f64; N] {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = tuple_from_value(value)?;
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        Some(Value::from(*self))
    }
}

impl<const N: usize> FieldSlot for Option<[f64; N]> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = Some(tuple_from_value(value)?);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.map(Value::from)
    }
}

// ---------------------------------------------------------------------------
// Derivable
// ---------------------------------------------------------------------------

/// A rendering field whose value may come from a physics field.
///
/// `Default` means the library default applies, `Derived` was computed from
/// another group during node construction, and `Explicit` was set by data.
/// Only `Explicit` values survive re-derivation on a child node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Derivable<T> {
    Default,
    Derived(T),
    Explicit(T),
}

impl<T> Default for Derivable<T> {
    fn default() -> Self {
        Derivable::Default
    }
}

impl<T: Copy> Derivable<T> {
    pub fn get(&self) -> Option<T> {
        match self {
            Derivable::Default => None,
            Derivable::Derived(v) | Derivable::Explicit(v) => Some(*v),
        }
    }

    /// The effective value, falling back to `default`.
    pub fn or(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Derivable::Explicit(_))
    }
}

impl FieldSlot for Derivable<f64> {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = Derivable::Explicit(value.expect_f64()?);
        Ok(())
    }

    fn read(&self) -> Option<Value> {
        self.get().map(Value::Float)
    }
}

// ---------------------------------------------------------------------------
// Choice fields
// ---------------------------------------------------------------------------

macro_rules! choice_field {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Accepted spellings, lowercase.
            pub const CHOICES: &'static [&'static str] = &[$($text),+];

            /// Case-insensitive parse.
            pub fn parse(text: &str) -> Option<Self> {
                let lowered = text.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FieldSlot for Option<$name> {
            fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
                let text = value.expect_str()?;
                let parsed = $name::parse(text).ok_or_else(|| ValueError::UnknownVariant {
                    value: text.to_string(),
                    allowed: $name::CHOICES,
                })?;
                *self = Some(parsed);
                Ok(())
            }

            fn read(&self) -> Option<Value> {
                self.map(|v| Value::from(v.as_str()))
            }
        }
    };
}

choice_field! {
    /// Qualitative process rating (weldability, castability, shock resistance).
    pub enum Rating {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

choice_field! {
    /// How readily a material can be bought.
    pub enum Availability {
        Stock => "stock",
        Common => "common",
        Specialty => "specialty",
        Rare => "rare",
    }
}

choice_field! {
    /// Effort needed to remove 3D-print supports.
    pub enum Difficulty {
        Easy => "easy",
        Moderate => "moderate",
        Difficult => "difficult",
    }
}
