//! [`Quantity`]: a magnitude paired with a [`Unit`].

use std::fmt;

use crate::unit::{Unit, UnitError};

/// A magnitude in a specific unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    /// Creates a quantity from a magnitude and a unit symbol.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Unknown`] if the symbol is not in the unit table.
    pub fn new(value: f64, unit: &str) -> Result<Self, UnitError> {
        Ok(Self {
            value,
            unit: Unit::parse(unit)?,
        })
    }

    /// Creates a quantity from an already-parsed unit.
    pub fn with_unit(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Magnitude in [`Self::unit`].
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Magnitude expressed in the SI base unit of this quantity's dimension.
    pub fn base_value(&self) -> f64 {
        self.unit.to_base(self.value)
    }

    /// Converts to another unit of the same dimension.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Unknown`] for an unknown target symbol and
    /// [`UnitError::Incompatible`] when the dimensions differ.
    pub fn to(&self, unit: &str) -> Result<Self, UnitError> {
        let target = Unit::parse(unit)?;
        self.to_unit(target)
    }

    /// Converts to an already-parsed unit of the same dimension.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Incompatible`] when the dimensions differ.
    pub fn to_unit(&self, target: Unit) -> Result<Self, UnitError> {
        if !self.unit.is_compatible(&target) {
            return Err(UnitError::Incompatible {
                from: self.unit.symbol(),
                from_dim: self.unit.dimension(),
                to: target.symbol(),
                to_dim: target.dimension(),
            });
        }
        Ok(Self {
            value: target.from_base(self.base_value()),
            unit: target,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Converts a bare magnitude between two unit symbols.
///
/// # Errors
///
/// See [`Quantity::to`].
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    Ok(Quantity::new(value, from)?.to(to)?.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimension;

    #[test]
    fn test_melting_point_to_kelvin() {
        let q = Quantity::new(1450.0, "degC").unwrap();
        let k = q.to("K").unwrap();
        assert!((k.value() - 1723.15).abs() < 0.01);
        assert_eq!(k.unit().symbol(), "K");
    }

    #[test]
    fn test_density_conversions() {
        let kg_m3 = convert(8.0, "g/cm^3", "kg/m^3").unwrap();
        assert!((kg_m3 - 8000.0).abs() < 1e-6);

        let g_mm3 = convert(8.0, "g/cm^3", "g/mm^3").unwrap();
        assert!((g_mm3 - 0.008).abs() < 1e-12);
    }

    #[test]
    fn test_modulus_to_pascal() {
        let pa = convert(200.0, "GPa", "Pa").unwrap();
        assert!((pa - 2e11).abs() < 1e3);
    }

    #[test]
    fn test_thermal_conductivity_conversion() {
        let w_cm_k = convert(100.0, "W/(m*K)", "W/(cm*K)").unwrap();
        assert!((w_cm_k - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_incompatible_dimensions_rejected() {
        let err = convert(1.0, "MPa", "mm").unwrap_err();
        assert_eq!(
            err,
            UnitError::Incompatible {
                from: "MPa",
                from_dim: Dimension::Pressure,
                to: "mm",
                to_dim: Dimension::Length,
            }
        );
    }

    #[test]
    fn test_unknown_target_rejected() {
        let q = Quantity::new(1.0, "mm").unwrap();
        assert!(matches!(q.to("parsec"), Err(UnitError::Unknown(_))));
    }

    #[test]
    fn test_display() {
        let q = Quantity::new(8.0, "g/cm^3").unwrap();
        assert_eq!(q.to_string(), "8 g/cm^3");
    }
}
