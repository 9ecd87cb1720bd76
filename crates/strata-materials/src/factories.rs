//! Materials whose properties are computed from temperature, pressure or
//! concentration.
//!
//! Factory nodes are standalone roots; they are not added to any registry.

use std::sync::Arc;

use crate::error::MaterialError;
use crate::node::{MaterialNode, Overrides};

const ATM_PA: f64 = 101_325.0;
const GAS_CONSTANT: f64 = 8.314;
const AIR_MOLAR_MASS: f64 = 0.028_97;

/// Density of air-free water at 1 atm in g/cm^3 (Kell, 1975), `t` in degC.
fn water_density(t: f64) -> f64 {
    let numerator = 999.839_52 + 16.945_176 * t - 7.987_040_1e-3 * t.powi(2)
        - 46.170_461e-6 * t.powi(3)
        + 105.563_02e-9 * t.powi(4)
        - 280.542_53e-12 * t.powi(5);
    numerator / (1.0 + 16.879_850e-3 * t) / 1000.0
}

fn water_specific_heat(t: f64) -> f64 {
    4217.6 - 3.4 * t + 0.05 * t.powi(2) - 0.0003 * t.powi(3)
}

fn water_thermal_conductivity(t: f64) -> f64 {
    0.569 + 0.0019 * t - 8e-6 * t.powi(2)
}

/// Liquid water at `temperature_c`, clamped to 0..=100 degC.
///
/// Keyed `water_{t}C` using the requested temperature truncated to an integer.
///
/// # Errors
///
/// Only if node construction fails, which the fixed inputs here do not trigger.
pub fn water(temperature_c: f64) -> Result<Arc<MaterialNode>, MaterialError> {
    let t = temperature_c.clamp(0.0, 100.0);
    let refractive_index = 1.3330 - 0.000_08 * t;

    let overrides = Overrides::new()
        .name(format!("Water @ {temperature_c}°C"))
        .formula("H2O")
        .property("mechanical", "density", water_density(t))
        .property("thermal", "thermal_conductivity", water_thermal_conductivity(t))
        .property("thermal", "specific_heat", water_specific_heat(t))
        .property("thermal", "melting_point", 0.0)
        .property("electrical", "dielectric_constant", 87.74 - 0.4 * t + 9.4e-4 * t.powi(2))
        .property("optical", "refractive_index", refractive_index)
        .property("rendering", "base_color", [0.7, 0.85, 0.95, 0.3])
        .property("rendering", "metallic", 0.0)
        .property("rendering", "roughness", 0.0)
        .property("rendering", "transmission", 0.95)
        .property("rendering", "ior", refractive_index);

    MaterialNode::root(format!("water_{}C", temperature_c.trunc()), &overrides)
}

/// Dry air treated as an ideal gas at `temperature_c` and `pressure_atm`.
///
/// # Errors
///
/// Only if node construction fails, which the fixed inputs here do not trigger.
pub fn air(temperature_c: f64, pressure_atm: f64) -> Result<Arc<MaterialNode>, MaterialError> {
    let kelvin = temperature_c + 273.15;
    let density = pressure_atm * ATM_PA * AIR_MOLAR_MASS / (GAS_CONSTANT * kelvin) / 1000.0;

    let overrides = Overrides::new()
        .name(format!("Air @ {temperature_c}°C, {pressure_atm} atm"))
        .formula("N2O2")
        .property("mechanical", "density", density)
        .property("thermal", "thermal_conductivity", 0.0241 + 7.7e-5 * temperature_c)
        .property("thermal", "specific_heat", 1005.0)
        .property("optical", "refractive_index", 1.000_293)
        .property("rendering", "base_color", [0.9, 0.95, 1.0, 0.02])
        .property("rendering", "metallic", 0.0)
        .property("rendering", "roughness", 0.0)
        .property("rendering", "transmission", 0.99);

    MaterialNode::root(format!("air_{}C", temperature_c.trunc()), &overrides)
}

/// Aqueous NaCl at `concentration_pct` percent by weight, derived from
/// [`water`] at `temperature_c`.
///
/// # Errors
///
/// Only if node construction fails, which the fixed inputs here do not trigger.
pub fn saline(concentration_pct: f64, temperature_c: f64) -> Result<Arc<MaterialNode>, MaterialError> {
    let t = temperature_c.clamp(0.0, 100.0);
    let refractive_index = 1.333 + 0.0017 * concentration_pct;

    let overrides = Overrides::new()
        .name(format!("Saline {concentration_pct}% @ {temperature_c}°C"))
        .formula("NaCl(aq)")
        .property("mechanical", "density", water_density(t) * (1.0 + 0.0068 * concentration_pct))
        .property("thermal", "thermal_conductivity", water_thermal_conductivity(t))
        .property(
            "thermal",
            "specific_heat",
            water_specific_heat(t) * (1.0 - 0.004 * concentration_pct),
        )
        .property("optical", "refractive_index", refractive_index)
        .property("rendering", "base_color", [0.75, 0.85, 0.9, 0.35])
        .property("rendering", "metallic", 0.0)
        .property("rendering", "roughness", 0.0)
        .property("rendering", "transmission", 0.9)
        .property("rendering", "ior", refractive_index);

    MaterialNode::root(format!("saline_{concentration_pct}pct"), &overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_water_density_curve() {
        // Maximum density near 4 degC.
        let four = water(4.0).unwrap().density().unwrap();
        assert!(close(four, 0.99997, 1e-4));
        assert!(four > water(0.0).unwrap().density().unwrap());
        assert!(four > water(20.0).unwrap().density().unwrap());
        assert!(close(water(20.0).unwrap().density().unwrap(), 0.99820, 1e-4));
        assert!(close(water(80.0).unwrap().density().unwrap(), 0.97183, 1e-3));
    }

    #[test]
    fn test_water_identity_and_rendering() {
        let node = water(25.0).unwrap();
        assert_eq!(node.key(), Some("water_25C"));
        assert_eq!(node.name(), "Water @ 25°C");
        assert_eq!(node.formula(), Some("H2O"));
        let props = node.properties();
        assert_eq!(props.thermal.melting_point.unit(), Some("degC"));
        assert!(props.rendering.ior.is_explicit());
        assert!(close(props.rendering.ior(), 1.331, 1e-9));
        assert!(close(props.rendering.transmission(), 0.95, 1e-12));
    }

    #[test]
    fn test_water_clamps_temperature() {
        let boiling = water(150.0).unwrap();
        assert_eq!(boiling.key(), Some("water_150C"));
        assert_eq!(boiling.density(), water(100.0).unwrap().density());
    }

    #[test]
    fn test_air_ideal_gas() {
        let room = air(20.0, 1.0).unwrap();
        assert!(close(room.density().unwrap(), 0.001_204, 2e-6));
        let thin = air(20.0, 0.5).unwrap();
        assert!(close(thin.density().unwrap() * 2.0, room.density().unwrap(), 1e-12));
        assert_eq!(room.key(), Some("air_20C"));
        assert_eq!(room.name(), "Air @ 20°C, 1 atm");
    }

    #[test]
    fn test_saline_scales_from_water() {
        let sea = saline(3.5, 20.0).unwrap();
        let fresh = water(20.0).unwrap().density().unwrap();
        assert!(close(sea.density().unwrap(), fresh * 1.0238, 1e-9));
        assert_eq!(sea.key(), Some("saline_3.5pct"));
        assert_eq!(sea.formula(), Some("NaCl(aq)"));
        let props = sea.properties();
        assert!(close(props.optical.refractive_index.unwrap(), 1.33895, 1e-9));
    }
}
