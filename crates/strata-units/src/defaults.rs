//! Default unit per property name, used when a data file gives a bare number.

/// Property name → default unit symbol.
///
/// Every symbol here must be accepted by [`Unit::parse`](crate::Unit::parse).
pub const STANDARD_UNITS: &[(&str, &str)] = &[
    // Mechanical
    ("density", "g/cm^3"),
    ("youngs_modulus", "GPa"),
    ("shear_modulus", "GPa"),
    ("yield_strength", "MPa"),
    ("tensile_strength", "MPa"),
    ("compressive_strength", "MPa"),
    ("fracture_toughness", "MPa*m^0.5"),
    // Thermal
    ("melting_point", "degC"),
    ("glass_transition", "degC"),
    ("max_service_temp", "degC"),
    ("min_service_temp", "degC"),
    ("thermal_conductivity", "W/(m*K)"),
    ("thermal_conductivity_ref_temp", "degC"),
    ("specific_heat", "J/(kg*K)"),
    ("thermal_expansion", "1/K"),
    // Electrical
    ("resistivity", "ohm*m"),
    ("conductivity", "S/m"),
    ("breakdown_voltage", "kV/mm"),
    ("volume_resistivity", "ohm*cm"),
    // Optical / detector
    ("absorption_coefficient", "1/cm"),
    ("absorption_length", "mm"),
    ("light_yield", "1/MeV"),
    ("decay_time", "ns"),
    ("rise_time", "ns"),
    ("emission_peak", "nm"),
    ("radiation_length", "cm"),
    ("interaction_length", "cm"),
    ("moliere_radius", "cm"),
    // Manufacturing
    ("cutting_speed", "m/min"),
    ("feed_rate", "mm"),
    ("print_nozzle_temp", "degC"),
    ("print_bed_temp", "degC"),
    ("print_chamber_temp", "degC"),
    // Sourcing
    ("cost_per_kg", "dimensionless"),
    ("lead_time_weeks", "week"),
];

/// Returns the default unit for a property name, if the table has one.
pub fn default_unit(property: &str) -> Option<&'static str> {
    STANDARD_UNITS
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, unit)| *unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Unit;

    #[test]
    fn test_common_properties_have_defaults() {
        assert_eq!(default_unit("density"), Some("g/cm^3"));
        assert_eq!(default_unit("melting_point"), Some("degC"));
        assert_eq!(default_unit("youngs_modulus"), Some("GPa"));
        assert_eq!(default_unit("thermal_conductivity"), Some("W/(m*K)"));
    }

    #[test]
    fn test_unknown_property_has_no_default() {
        assert_eq!(default_unit("poissons_ratio"), None);
        assert_eq!(default_unit(""), None);
    }

    #[test]
    fn test_every_default_unit_parses() {
        for (property, symbol) in STANDARD_UNITS {
            assert!(
                Unit::parse(symbol).is_ok(),
                "default unit {symbol:?} for {property} is not in the unit table"
            );
        }
    }

    #[test]
    fn test_no_duplicate_property_names() {
        let mut names: Vec<_> = STANDARD_UNITS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }
}
