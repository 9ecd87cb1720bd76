//! The domain property groups carried by every material.

use strata_units::{Quantity, UnitError};

use crate::field::{Availability, Derivable, Difficulty, FieldSlot, Rating, Scalar};
use crate::value::Value;

/// A named record of optional property fields, addressable by field name.
pub trait PropertyGroup {
    /// Group key in override maps and data files.
    const NAME: &'static str;

    /// Field names, in declaration order.
    const FIELDS: &'static [&'static str];

    fn slot(&self, field: &str) -> Option<&dyn FieldSlot>;

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot>;

    /// Calls `f` for every unit-tagged field.
    fn for_each_scalar_mut(&mut self, f: &mut dyn FnMut(&'static str, &mut Scalar));

    fn has_field(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.slot(field)?.read()
    }

    /// All fields that currently hold a value, in declaration order.
    fn entries(&self) -> Vec<(&'static str, Value)> {
        Self::FIELDS
            .iter()
            .filter_map(|name| self.get(name).map(|v| (*name, v)))
            .collect()
    }
}

macro_rules! property_group {
    (
        $(#[$meta:meta])*
        pub struct $name:ident => $key:literal {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl PropertyGroup for $name {
            const NAME: &'static str = $key;
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn slot(&self, field: &str) -> Option<&dyn FieldSlot> {
                match field {
                    $(stringify!($field) => Some(&self.$field),)*
                    _ => None,
                }
            }

            fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
                match field {
                    $(stringify!($field) => Some(&mut self.$field),)*
                    _ => None,
                }
            }

            fn for_each_scalar_mut(&mut self, f: &mut dyn FnMut(&'static str, &mut Scalar)) {
                $(
                    if let Some(scalar) = FieldSlot::scalar_mut(&mut self.$field) {
                        f(stringify!($field), scalar);
                    }
                )*
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Mechanical
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct MechanicalProperties => "mechanical" {
        pub density: Scalar,
        pub youngs_modulus: Scalar,
        pub shear_modulus: Scalar,
        pub poissons_ratio: Option<f64>,
        pub yield_strength: Scalar,
        pub tensile_strength: Scalar,
        pub compressive_strength: Scalar,
        /// Elongation at break, percent.
        pub elongation: Option<f64>,
        pub hardness_vickers: Option<f64>,
        pub hardness_rockwell: Option<f64>,
        pub fracture_toughness: Scalar,
    }
}

// ---------------------------------------------------------------------------
// Thermal
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct ThermalProperties => "thermal" {
        pub melting_point: Scalar,
        pub glass_transition: Scalar,
        pub thermal_conductivity: Scalar,
        /// Temperature at which `thermal_conductivity` was measured. 20 degC if unset.
        pub thermal_conductivity_ref_temp: Scalar,
        /// Linear temperature coefficient of conductivity, per kelvin.
        pub thermal_conductivity_coeff: Option<f64>,
        pub specific_heat: Scalar,
        pub thermal_expansion: Scalar,
        pub max_service_temp: Scalar,
        pub min_service_temp: Scalar,
        pub thermal_shock_resistance: Option<Rating>,
    }
}

impl ThermalProperties {
    /// Thermal conductivity at `temperature`, using the linear model
    /// `k(T) = k_ref * (1 + coeff * (T - T_ref))`.
    ///
    /// Returns `None` when no conductivity is set. Without a coefficient the
    /// reference value is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitError`] if a stored unit tag is unknown or `temperature`
    /// is not a temperature.
    pub fn thermal_conductivity_at(
        &self,
        temperature: Quantity,
    ) -> Result<Option<Quantity>, UnitError> {
        let Some(k_ref) = self.thermal_conductivity.quantity()? else {
            return Ok(None);
        };
        let Some(coeff) = self.thermal_conductivity_coeff else {
            return Ok(Some(k_ref));
        };
        let t_ref = match self.thermal_conductivity_ref_temp.quantity()? {
            Some(q) => q.to("K")?.value(),
            None => Quantity::new(20.0, "degC")?.to("K")?.value(),
        };
        let t = temperature.to("K")?.value();
        Ok(Some(Quantity::with_unit(
            k_ref.value() * (1.0 + coeff * (t - t_ref)),
            k_ref.unit(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Electrical
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct ElectricalProperties => "electrical" {
        pub resistivity: Scalar,
        pub conductivity: Scalar,
        pub dielectric_constant: Option<f64>,
        pub dielectric_loss_tangent: Option<f64>,
        pub breakdown_voltage: Scalar,
        pub volume_resistivity: Scalar,
    }
}

// ---------------------------------------------------------------------------
// Optical
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct OpticalProperties => "optical" {
        pub refractive_index: Option<f64>,
        /// Percent transmitted, 0 to 100.
        pub transparency: Option<f64>,
        pub absorption_coefficient: Scalar,
        pub absorption_length: Scalar,
        pub light_yield: Scalar,
        pub decay_time: Scalar,
        pub rise_time: Scalar,
        pub emission_peak: Scalar,
        /// Emission band in nm, (low, high).
        pub emission_range: Option<[f64; 2]>,
        pub radiation_length: Scalar,
        pub interaction_length: Scalar,
        pub moliere_radius: Scalar,
        /// Fractional energy resolution at 662 keV.
        pub energy_resolution: Option<f64>,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Index of refraction used when neither data nor optics provide one.
pub const DEFAULT_IOR: f64 = 1.5;

property_group! {
    /// Physically based rendering parameters. Also addressable as `pbr`.
    pub struct RenderingProperties => "rendering" {
        /// Linear RGBA.
        pub base_color: [f64; 4],
        pub metallic: f64,
        pub roughness: f64,
        pub emissive: [f64; 3],
        pub ior: Derivable<f64>,
        /// Fraction of light transmitted, 0 to 1.
        pub transmission: Derivable<f64>,
        pub clearcoat: f64,
        pub normal_map: Option<String>,
        pub roughness_map: Option<String>,
        pub metallic_map: Option<String>,
        pub ambient_occlusion_map: Option<String>,
    }
}

impl Default for RenderingProperties {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0; 3],
            ior: Derivable::Default,
            transmission: Derivable::Default,
            clearcoat: 0.0,
            normal_map: None,
            roughness_map: None,
            metallic_map: None,
            ambient_occlusion_map: None,
        }
    }
}

impl RenderingProperties {
    /// Effective index of refraction.
    pub fn ior(&self) -> f64 {
        self.ior.or(DEFAULT_IOR)
    }

    /// Effective transmission fraction.
    pub fn transmission(&self) -> f64 {
        self.transmission.or(0.0)
    }

    /// `base_color` without alpha.
    pub fn rgb(&self) -> [f64; 3] {
        let [r, g, b, _] = self.base_color;
        [r, g, b]
    }
}

// ---------------------------------------------------------------------------
// Manufacturing
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct ManufacturingProperties => "manufacturing" {
        /// Machinability index, percent of free-cutting brass.
        pub machinability: Option<f64>,
        pub weldability: Option<Rating>,
        pub formability: Option<Rating>,
        pub castability: Option<Rating>,
        pub cutting_speed: Scalar,
        pub feed_rate: Scalar,
        pub tool_material: Option<String>,
        pub printable_fdm: Option<bool>,
        pub printable_sla: Option<bool>,
        pub printable_sls: Option<bool>,
        pub printable_binder_jet: Option<bool>,
        pub print_nozzle_temp: Scalar,
        pub print_bed_temp: Scalar,
        pub print_chamber_temp: Scalar,
        pub print_support_removal: Option<Difficulty>,
        pub anodizable: Option<bool>,
        pub polishable: Option<bool>,
        pub solderable: Option<bool>,
    }
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct ComplianceProperties => "compliance" {
        pub rohs_compliant: Option<bool>,
        pub reach_compliant: Option<bool>,
        pub halogen_free: Option<bool>,
        pub lead_free: Option<bool>,
        pub food_safe: Option<bool>,
        pub biocompatible: Option<bool>,
        pub uv_resistant: Option<bool>,
        pub radiation_resistant: Option<bool>,
        pub flame_retardant: Option<bool>,
        pub recyclable: Option<bool>,
        /// Resin identification code, 1 to 7.
        pub recycling_symbol: Option<u8>,
    }
}

// ---------------------------------------------------------------------------
// Sourcing
// ---------------------------------------------------------------------------

property_group! {
    #[derive(Default)]
    pub struct SourcingProperties => "sourcing" {
        pub cost_per_kg: Scalar,
        pub availability: Option<Availability>,
        pub lead_time_weeks: Scalar,
        pub suppliers: Vec<String>,
    }
}
