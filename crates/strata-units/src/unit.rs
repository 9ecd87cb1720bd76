//! Unit symbols, their physical dimension, and the mapping onto SI base values.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by unit parsing and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The symbol is not in the unit table.
    #[error("unknown unit: {0:?}")]
    Unknown(String),

    /// A value was given without a unit tag and none could be assumed.
    #[error("value has no unit tag")]
    Missing,

    /// The two units measure different physical dimensions.
    #[error("cannot convert {from} ({from_dim:?}) to {to} ({to_dim:?})")]
    Incompatible {
        /// Source unit symbol.
        from: &'static str,
        /// Source dimension.
        from_dim: Dimension,
        /// Target unit symbol.
        to: &'static str,
        /// Target dimension.
        to_dim: Dimension,
    },
}

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

/// Physical dimension of a unit. Conversion is only defined within one dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Dimensionless,
    Temperature,
    Density,
    Pressure,
    FractureToughness,
    ThermalConductivity,
    SpecificHeat,
    ThermalExpansion,
    Resistivity,
    Conductivity,
    FieldStrength,
    Speed,
    Length,
    InverseLength,
    Time,
    PerEnergy,
    Mass,
    Volume,
}

// ---------------------------------------------------------------------------
// Unit table
// ---------------------------------------------------------------------------

/// One row of the unit table: canonical symbol, accepted aliases, dimension,
/// and the affine map `base = value * scale + offset`.
struct UnitDef {
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    scale: f64,
    offset: f64,
}

const fn linear(
    symbol: &'static str,
    aliases: &'static [&'static str],
    dimension: Dimension,
    scale: f64,
) -> UnitDef {
    UnitDef {
        symbol,
        aliases,
        dimension,
        scale,
        offset: 0.0,
    }
}

use Dimension::*;

const UNITS: &[UnitDef] = &[
    // Dimensionless
    linear("dimensionless", &["1"], Dimensionless, 1.0),
    linear("%", &["percent"], Dimensionless, 0.01),
    linear("ppm", &[], Dimensionless, 1e-6),
    // Temperature (base: K)
    linear("K", &["kelvin"], Temperature, 1.0),
    UnitDef {
        symbol: "degC",
        aliases: &["celsius", "degree_Celsius"],
        dimension: Temperature,
        scale: 1.0,
        offset: 273.15,
    },
    UnitDef {
        symbol: "degF",
        aliases: &["fahrenheit", "degree_Fahrenheit"],
        dimension: Temperature,
        scale: 5.0 / 9.0,
        offset: 273.15 - 32.0 * 5.0 / 9.0,
    },
    // Density (base: kg/m^3)
    linear("kg/m^3", &[], Density, 1.0),
    linear("g/cm^3", &["g/cc", "g/mL", "g/ml", "kg/L"], Density, 1000.0),
    linear("g/mm^3", &[], Density, 1e6),
    linear("lb/in^3", &[], Density, 27_679.904_7),
    // Pressure / stress (base: Pa)
    linear("Pa", &["N/m^2"], Pressure, 1.0),
    linear("kPa", &[], Pressure, 1e3),
    linear("MPa", &["N/mm^2"], Pressure, 1e6),
    linear("GPa", &[], Pressure, 1e9),
    linear("bar", &[], Pressure, 1e5),
    linear("atm", &[], Pressure, 101_325.0),
    linear("psi", &[], Pressure, 6_894.757_293),
    linear("ksi", &[], Pressure, 6_894_757.293),
    // Fracture toughness (base: Pa*m^0.5)
    linear("Pa*m^0.5", &[], FractureToughness, 1.0),
    linear("MPa*m^0.5", &["MPa*sqrt(m)"], FractureToughness, 1e6),
    linear("ksi*in^0.5", &[], FractureToughness, 1.098_843e6),
    // Thermal conductivity (base: W/(m*K))
    linear("W/(m*K)", &["W/m/K", "W/mK"], ThermalConductivity, 1.0),
    linear("W/(cm*K)", &[], ThermalConductivity, 100.0),
    linear("mW/(m*K)", &[], ThermalConductivity, 1e-3),
    // Specific heat (base: J/(kg*K))
    linear("J/(kg*K)", &["J/kg/K"], SpecificHeat, 1.0),
    linear("J/(g*K)", &["J/g/K"], SpecificHeat, 1000.0),
    linear("kJ/(kg*K)", &[], SpecificHeat, 1000.0),
    // Thermal expansion (base: 1/K)
    linear("1/K", &["/K", "1/degC"], ThermalExpansion, 1.0),
    linear("um/(m*K)", &["ppm/K", "1e-6/K"], ThermalExpansion, 1e-6),
    // Resistivity (base: ohm*m)
    linear("ohm*m", &["Ω*m"], Resistivity, 1.0),
    linear("ohm*cm", &["Ω*cm"], Resistivity, 0.01),
    linear("uohm*cm", &["µΩ*cm"], Resistivity, 1e-8),
    linear("nohm*m", &[], Resistivity, 1e-9),
    // Conductivity (base: S/m)
    linear("S/m", &[], Conductivity, 1.0),
    linear("S/cm", &[], Conductivity, 100.0),
    linear("MS/m", &[], Conductivity, 1e6),
    // Electric field strength (base: V/m)
    linear("V/m", &[], FieldStrength, 1.0),
    linear("kV/mm", &["MV/m"], FieldStrength, 1e6),
    linear("kV/cm", &[], FieldStrength, 1e5),
    linear("V/mil", &[], FieldStrength, 39_370.078_7),
    // Speed (base: m/s)
    linear("m/s", &[], Speed, 1.0),
    linear("m/min", &[], Speed, 1.0 / 60.0),
    linear("mm/min", &[], Speed, 1.0 / 60_000.0),
    linear("ft/min", &[], Speed, 0.00508),
    // Length (base: m)
    linear("m", &[], Length, 1.0),
    linear("cm", &[], Length, 0.01),
    linear("mm", &[], Length, 1e-3),
    linear("um", &["µm", "micron"], Length, 1e-6),
    linear("nm", &[], Length, 1e-9),
    linear("in", &["inch"], Length, 0.0254),
    linear("ft", &[], Length, 0.3048),
    // Inverse length (base: 1/m)
    linear("1/m", &[], InverseLength, 1.0),
    linear("1/cm", &["/cm"], InverseLength, 100.0),
    linear("1/mm", &["/mm"], InverseLength, 1000.0),
    // Time (base: s)
    linear("s", &["second"], Time, 1.0),
    linear("ms", &[], Time, 1e-3),
    linear("us", &["µs"], Time, 1e-6),
    linear("ns", &[], Time, 1e-9),
    linear("min", &["minute"], Time, 60.0),
    linear("h", &["hour"], Time, 3_600.0),
    linear("day", &["d"], Time, 86_400.0),
    linear("week", &["weeks"], Time, 604_800.0),
    // Yield per deposited energy (base: 1/MeV)
    linear("1/MeV", &["photons/MeV", "ph/MeV"], PerEnergy, 1.0),
    linear("1/keV", &["photons/keV", "ph/keV"], PerEnergy, 1000.0),
    // Mass (base: kg)
    linear("kg", &[], Mass, 1.0),
    linear("g", &["gram"], Mass, 1e-3),
    linear("mg", &[], Mass, 1e-6),
    linear("lb", &[], Mass, 0.453_592_37),
    // Volume (base: m^3)
    linear("m^3", &[], Volume, 1.0),
    linear("L", &["l"], Volume, 1e-3),
    linear("cm^3", &["mL", "cc"], Volume, 1e-6),
    linear("mm^3", &[], Volume, 1e-9),
];

/// Rewrites common typographic variants into the ASCII spelling used by the table.
fn normalize(symbol: &str) -> String {
    symbol
        .trim()
        .replace(' ', "")
        .replace("**", "^")
        .replace(['·', '⋅'], "*")
        .replace("°C", "degC")
        .replace("°F", "degF")
        .replace('³', "^3")
        .replace('²', "^2")
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A unit from the table. Cheap to copy; identity is the canonical symbol.
#[derive(Clone, Copy)]
pub struct Unit {
    def: &'static UnitDef,
}

impl Unit {
    /// Looks up a unit symbol (canonical or alias).
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Unknown`] if the symbol is not in the table.
    pub fn parse(symbol: &str) -> Result<Self, UnitError> {
        let key = normalize(symbol);
        UNITS
            .iter()
            .find(|def| def.symbol == key || def.aliases.contains(&key.as_str()))
            .map(|def| Self { def })
            .ok_or_else(|| UnitError::Unknown(symbol.to_string()))
    }

    /// Canonical symbol (e.g. `"g/cm^3"`).
    pub fn symbol(&self) -> &'static str {
        self.def.symbol
    }

    /// Physical dimension.
    pub fn dimension(&self) -> Dimension {
        self.def.dimension
    }

    /// Converts a magnitude in this unit to the SI base of its dimension.
    pub fn to_base(&self, value: f64) -> f64 {
        value * self.def.scale + self.def.offset
    }

    /// Converts a magnitude in the SI base of this dimension into this unit.
    pub fn from_base(&self, value: f64) -> f64 {
        (value - self.def.offset) / self.def.scale
    }

    /// Returns `true` if values can be converted between the two units.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension() == other.dimension()
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.def.symbol == other.def.symbol
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({})", self.def.symbol)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.def.symbol)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_symbol() {
        let unit = Unit::parse("g/cm^3").unwrap();
        assert_eq!(unit.symbol(), "g/cm^3");
        assert_eq!(unit.dimension(), Dimension::Density);
    }

    #[test]
    fn test_parse_aliases_and_typography() {
        assert_eq!(Unit::parse("kelvin").unwrap().symbol(), "K");
        assert_eq!(Unit::parse("°C").unwrap().symbol(), "degC");
        assert_eq!(Unit::parse("W/(m·K)").unwrap().symbol(), "W/(m*K)");
        assert_eq!(Unit::parse("g/cm**3").unwrap().symbol(), "g/cm^3");
        assert_eq!(Unit::parse(" g / cm³ ").unwrap().symbol(), "g/cm^3");
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = Unit::parse("furlongs/fortnight").unwrap_err();
        assert_eq!(err, UnitError::Unknown("furlongs/fortnight".to_string()));
    }

    #[test]
    fn test_symbols_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for def in UNITS {
            assert!(seen.insert(def.symbol), "duplicate symbol {}", def.symbol);
            for alias in def.aliases {
                assert!(seen.insert(alias), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn test_temperature_is_affine() {
        let c = Unit::parse("degC").unwrap();
        assert!((c.to_base(0.0) - 273.15).abs() < 1e-9);
        assert!((c.from_base(373.15) - 100.0).abs() < 1e-9);

        let f = Unit::parse("degF").unwrap();
        assert!((f.to_base(32.0) - 273.15).abs() < 1e-9);
        assert!((f.to_base(212.0) - 373.15).abs() < 1e-9);
    }

    #[test]
    fn test_compatibility_follows_dimension() {
        let mpa = Unit::parse("MPa").unwrap();
        let gpa = Unit::parse("GPa").unwrap();
        let mm = Unit::parse("mm").unwrap();
        assert!(mpa.is_compatible(&gpa));
        assert!(!mpa.is_compatible(&mm));
    }
}
