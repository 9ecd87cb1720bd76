//! [`PropertyBundle`]: all property groups of one material, and the merge
//! primitives used by inheritance.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strata_units::{Unit, default_unit};
use tracing::warn;

use crate::error::PropertyError;
use crate::field::{Derivable, FieldSlot, Scalar};
use crate::groups::{
    ComplianceProperties, ElectricalProperties, ManufacturingProperties, MechanicalProperties,
    OpticalProperties, PropertyGroup, RenderingProperties, SourcingProperties, ThermalProperties,
};
use crate::value::{Table, Value, ValueError};

// ---------------------------------------------------------------------------
// Group names
// ---------------------------------------------------------------------------

/// The closed set of group keys. Nested tables with one of these names are
/// property groups, never child materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupName {
    Mechanical,
    Thermal,
    Electrical,
    Optical,
    Rendering,
    Manufacturing,
    Compliance,
    Sourcing,
    Custom,
}

impl GroupName {
    pub const ALL: [GroupName; 9] = [
        GroupName::Mechanical,
        GroupName::Thermal,
        GroupName::Electrical,
        GroupName::Optical,
        GroupName::Rendering,
        GroupName::Manufacturing,
        GroupName::Compliance,
        GroupName::Sourcing,
        GroupName::Custom,
    ];

    /// Parses a group key. `pbr` is accepted for `rendering`.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "mechanical" => GroupName::Mechanical,
            "thermal" => GroupName::Thermal,
            "electrical" => GroupName::Electrical,
            "optical" => GroupName::Optical,
            "rendering" | "pbr" => GroupName::Rendering,
            "manufacturing" => GroupName::Manufacturing,
            "compliance" => GroupName::Compliance,
            "sourcing" => GroupName::Sourcing,
            "custom" => GroupName::Custom,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupName::Mechanical => MechanicalProperties::NAME,
            GroupName::Thermal => ThermalProperties::NAME,
            GroupName::Electrical => ElectricalProperties::NAME,
            GroupName::Optical => OpticalProperties::NAME,
            GroupName::Rendering => RenderingProperties::NAME,
            GroupName::Manufacturing => ManufacturingProperties::NAME,
            GroupName::Compliance => ComplianceProperties::NAME,
            GroupName::Sourcing => SourcingProperties::NAME,
            GroupName::Custom => "custom",
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `key` names a property group (including the `pbr` alias).
pub fn is_group_key(key: &str) -> bool {
    GroupName::parse(key).is_some()
}

/// What to do with an override key that names no field of its group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownKeyPolicy {
    /// Store under `custom["<group>.<key>"]` and warn.
    #[default]
    Absorb,
    /// Fail with [`PropertyError::UnknownField`].
    Reject,
}

/// A unit assigned by [`PropertyBundle::backfill_default_units`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferredUnit {
    pub group: &'static str,
    pub field: &'static str,
    /// `None` when the default-unit table has no entry for the field.
    pub unit: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// PropertyBundle
// ---------------------------------------------------------------------------

/// Every property group of one material plus the open `custom` map.
///
/// `Clone` is a structural deep copy: a cloned bundle shares nothing with its
/// source, which is what gives each node in a material tree an independent
/// snapshot of its inherited properties.
///
/// Serializes in the data-file layout: one table per group, unit-tagged
/// fields as `{ value, unit }`. Deserializing merges each group through
/// [`PropertyBundle::merge_group`], so legacy and paired spellings both load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyBundle {
    pub mechanical: MechanicalProperties,
    pub thermal: ThermalProperties,
    pub electrical: ElectricalProperties,
    pub optical: OpticalProperties,
    pub rendering: RenderingProperties,
    pub manufacturing: ManufacturingProperties,
    pub compliance: ComplianceProperties,
    pub sourcing: SourcingProperties,
    pub custom: Table,
}

impl PropertyBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `overrides` into `group`, storing unknown keys in `custom`.
    ///
    /// Entries holding [`Value::Unset`] are skipped. A field can be given as
    /// `density = 8.0` or as the pair `density_value = 8.0`,
    /// `density_unit = "g/cm^3"`; without a `_unit` entry the field keeps its
    /// current unit tag. A lone `<field>_unit` re-tags the existing value.
    ///
    /// # Errors
    ///
    /// [`PropertyError::UnknownGroup`] for an unknown group name and
    /// [`PropertyError::InvalidValue`] for a value of the wrong shape.
    pub fn apply_overrides(&mut self, group: &str, overrides: &Table) -> Result<(), PropertyError> {
        self.merge_group(group, overrides, UnknownKeyPolicy::Absorb)
    }

    /// [`Self::apply_overrides`] with an explicit policy for unknown keys.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_overrides`], plus [`PropertyError::UnknownField`]
    /// under [`UnknownKeyPolicy::Reject`].
    pub fn merge_group(
        &mut self,
        group: &str,
        overrides: &Table,
        policy: UnknownKeyPolicy,
    ) -> Result<(), PropertyError> {
        let name =
            GroupName::parse(group).ok_or_else(|| PropertyError::UnknownGroup(group.to_string()))?;
        let custom = &mut self.custom;
        match name {
            GroupName::Mechanical => merge_into(&mut self.mechanical, overrides, policy, custom),
            GroupName::Thermal => merge_into(&mut self.thermal, overrides, policy, custom),
            GroupName::Electrical => merge_into(&mut self.electrical, overrides, policy, custom),
            GroupName::Optical => merge_into(&mut self.optical, overrides, policy, custom),
            GroupName::Rendering => merge_into(&mut self.rendering, overrides, policy, custom),
            GroupName::Manufacturing => {
                merge_into(&mut self.manufacturing, overrides, policy, custom)
            }
            GroupName::Compliance => merge_into(&mut self.compliance, overrides, policy, custom),
            GroupName::Sourcing => merge_into(&mut self.sourcing, overrides, policy, custom),
            GroupName::Custom => {
                for (key, value) in overrides.iter().filter(|(_, v)| !v.is_unset()) {
                    custom.insert(key.clone(), value.clone());
                }
                Ok(())
            }
        }
    }

    /// Like [`Self::merge_group`] for a dynamically typed group value.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotATable`] if `overrides` is not a table.
    pub fn merge_group_value(
        &mut self,
        group: &str,
        overrides: &Value,
        policy: UnknownKeyPolicy,
    ) -> Result<(), PropertyError> {
        match overrides {
            Value::Table(table) => self.merge_group(group, table, policy),
            Value::Unset => Ok(()),
            other => Err(PropertyError::NotATable {
                group: group.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Assigns the default unit to every unit-tagged field that has a value
    /// but no unit. Each inference is logged as a warning and returned.
    pub fn backfill_default_units(&mut self) -> Vec<InferredUnit> {
        let mut inferred = Vec::new();
        backfill_group(&mut self.mechanical, &mut inferred);
        backfill_group(&mut self.thermal, &mut inferred);
        backfill_group(&mut self.electrical, &mut inferred);
        backfill_group(&mut self.optical, &mut inferred);
        backfill_group(&mut self.rendering, &mut inferred);
        backfill_group(&mut self.manufacturing, &mut inferred);
        backfill_group(&mut self.compliance, &mut inferred);
        backfill_group(&mut self.sourcing, &mut inferred);
        inferred
    }

    /// Derives rendering `ior` from `optical.refractive_index` and
    /// `transmission` from `optical.transparency` (percent, clamped to 0..=1).
    /// Explicitly set rendering values are never touched.
    pub fn wire_rendering_defaults(&mut self) {
        if !self.rendering.ior.is_explicit()
            && let Some(n) = self.optical.refractive_index
        {
            self.rendering.ior = Derivable::Derived(n);
        }
        if !self.rendering.transmission.is_explicit()
            && let Some(percent) = self.optical.transparency
        {
            self.rendering.transmission = Derivable::Derived((percent / 100.0).clamp(0.0, 1.0));
        }
    }

    // -- Queries --

    /// Reads one field. `group` accepts the same names as [`GroupName::parse`].
    pub fn get(&self, group: &str, field: &str) -> Option<Value> {
        match GroupName::parse(group)? {
            GroupName::Mechanical => self.mechanical.get(field),
            GroupName::Thermal => self.thermal.get(field),
            GroupName::Electrical => self.electrical.get(field),
            GroupName::Optical => self.optical.get(field),
            GroupName::Rendering => self.rendering.get(field),
            GroupName::Manufacturing => self.manufacturing.get(field),
            GroupName::Compliance => self.compliance.get(field),
            GroupName::Sourcing => self.sourcing.get(field),
            GroupName::Custom => self.custom.get(field).cloned(),
        }
    }

    /// The unit-tagged field `group.field`, if it is one.
    pub fn scalar(&self, group: &str, field: &str) -> Option<&Scalar> {
        let slot: &dyn FieldSlot = match GroupName::parse(group)? {
            GroupName::Mechanical => self.mechanical.slot(field)?,
            GroupName::Thermal => self.thermal.slot(field)?,
            GroupName::Electrical => self.electrical.slot(field)?,
            GroupName::Optical => self.optical.slot(field)?,
            GroupName::Rendering => self.rendering.slot(field)?,
            GroupName::Manufacturing => self.manufacturing.slot(field)?,
            GroupName::Compliance => self.compliance.slot(field)?,
            GroupName::Sourcing => self.sourcing.slot(field)?,
            GroupName::Custom => return None,
        };
        slot.scalar()
    }

    /// Fields of `group` that hold a value, in declaration order.
    pub fn entries(&self, group: GroupName) -> Vec<(String, Value)> {
        fn owned(entries: Vec<(&'static str, Value)>) -> Vec<(String, Value)> {
            entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
        }
        match group {
            GroupName::Mechanical => owned(self.mechanical.entries()),
            GroupName::Thermal => owned(self.thermal.entries()),
            GroupName::Electrical => owned(self.electrical.entries()),
            GroupName::Optical => owned(self.optical.entries()),
            GroupName::Rendering => owned(self.rendering.entries()),
            GroupName::Manufacturing => owned(self.manufacturing.entries()),
            GroupName::Compliance => owned(self.compliance.entries()),
            GroupName::Sourcing => owned(self.sourcing.entries()),
            GroupName::Custom => self
                .custom
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table form
// ---------------------------------------------------------------------------

impl PropertyBundle {
    /// Builds a bundle from a table of groups, as found in a material's data
    /// entry. Non-group keys are an error. Missing units are backfilled and
    /// rendering defaults wired, as for a root node.
    ///
    /// # Errors
    ///
    /// Any [`PropertyBundle::merge_group`] failure.
    pub fn from_table(table: &Table, policy: UnknownKeyPolicy) -> Result<Self, PropertyError> {
        let mut bundle = Self::default();
        for (group, overrides) in table {
            bundle.merge_group_value(group, overrides, policy)?;
        }
        bundle.backfill_default_units();
        bundle.wire_rendering_defaults();
        Ok(bundle)
    }

    /// The bundle as a table of non-empty groups. Derived rendering values
    /// are left out; [`PropertyBundle::from_table`] derives them again.
    pub fn to_table(&self) -> Table {
        let mut out = Table::new();
        for group in GroupName::ALL {
            let mut fields = Table::new();
            for (field, value) in self.entries(group) {
                let value = match self.scalar(group.as_str(), &field) {
                    Some(Scalar {
                        value: Some(v),
                        unit: Some(unit),
                    }) => Value::Table(Table::from([
                        ("value".to_string(), Value::Float(*v)),
                        ("unit".to_string(), Value::from(unit.as_str())),
                    ])),
                    _ => value,
                };
                fields.insert(field, value);
            }
            if group == GroupName::Rendering {
                if !self.rendering.ior.is_explicit() {
                    fields.remove("ior");
                }
                if !self.rendering.transmission.is_explicit() {
                    fields.remove("transmission");
                }
            }
            if !fields.is_empty() {
                out.insert(group.as_str().to_string(), Value::Table(fields));
            }
        }
        out
    }
}

impl Serialize for PropertyBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_table().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyBundle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let table = Table::deserialize(deserializer)?;
        PropertyBundle::from_table(&table, UnknownKeyPolicy::Absorb).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Merge internals
// ---------------------------------------------------------------------------

fn invalid(group: &'static str, key: &str, source: ValueError) -> PropertyError {
    PropertyError::InvalidValue {
        group,
        field: key.to_string(),
        source,
    }
}

fn is_scalar_field<G: PropertyGroup>(group: &G, field: &str) -> bool {
    group.slot(field).is_some_and(|slot| slot.scalar().is_some())
}

fn unit_tag(group: &'static str, key: &str, value: &Value) -> Result<String, PropertyError> {
    let unit = value.expect_str().map_err(|e| invalid(group, key, e))?;
    if Unit::parse(unit).is_err() {
        warn!(group, key, unit, "unrecognized unit tag kept as given");
    }
    Ok(unit.to_string())
}

fn merge_into<G: PropertyGroup>(
    group: &mut G,
    overrides: &Table,
    policy: UnknownKeyPolicy,
    custom: &mut Table,
) -> Result<(), PropertyError> {
    for (key, value) in overrides {
        if value.is_unset() {
            continue;
        }

        // `<field>_unit`: applied together with the value when one is present.
        if let Some(field) = key.strip_suffix("_unit")
            && is_scalar_field(group, field)
        {
            let has_value = [field.to_string(), format!("{field}_value")]
                .iter()
                .any(|k| overrides.get(k).is_some_and(|v| !v.is_unset()));
            if !has_value
                && let Some(scalar) = group.slot_mut(field).and_then(|s| s.scalar_mut())
            {
                scalar.unit = Some(unit_tag(G::NAME, key, value)?);
            }
            continue;
        }

        let field = key
            .strip_suffix("_value")
            .filter(|f| G::has_field(f))
            .unwrap_or(key);
        let Some(slot) = group.slot_mut(field) else {
            absorb_unknown(G::NAME, key, value, policy, custom)?;
            continue;
        };
        slot.assign(value).map_err(|e| invalid(G::NAME, key, e))?;

        if let Some(unit) = overrides.get(&format!("{field}_unit"))
            && !unit.is_unset()
            && let Some(scalar) = slot.scalar_mut()
        {
            scalar.unit = Some(unit_tag(G::NAME, key, unit)?);
        }
    }
    Ok(())
}

fn absorb_unknown(
    group: &'static str,
    key: &str,
    value: &Value,
    policy: UnknownKeyPolicy,
    custom: &mut Table,
) -> Result<(), PropertyError> {
    match policy {
        UnknownKeyPolicy::Reject => Err(PropertyError::UnknownField {
            group,
            field: key.to_string(),
        }),
        UnknownKeyPolicy::Absorb => {
            let custom_key = format!("{group}.{key}");
            warn!(group, key, "unknown property stored as custom.{custom_key}");
            custom.insert(custom_key, value.clone());
            Ok(())
        }
    }
}

fn backfill_group<G: PropertyGroup>(group: &mut G, inferred: &mut Vec<InferredUnit>) {
    group.for_each_scalar_mut(&mut |field, scalar| {
        if scalar.value.is_none() || scalar.unit.is_some() {
            return;
        }
        let unit = default_unit(field);
        match unit {
            Some(symbol) => {
                warn!(group = G::NAME, field, unit = symbol, "no unit given, assuming default");
                scalar.unit = Some(symbol.to_string());
            }
            None => {
                warn!(group = G::NAME, field, "no unit given and no default unit known");
            }
        }
        inferred.push(InferredUnit {
            group: G::NAME,
            field,
            unit,
        });
    });
}
