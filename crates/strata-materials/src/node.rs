//! [`MaterialNode`]: one material in a hierarchy, owning a fully resolved
//! [`PropertyBundle`] and its child variants.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};

use serde::{Deserialize, Serialize};
use strata_properties::{
    GroupName, PropertyBundle, Table, UnknownKeyPolicy, Value, is_group_key,
};
use strata_units::UnitError;
use tracing::debug;

use crate::error::MaterialError;
use crate::formula::{Composition, FormulaError, parse_formula};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which metadata tag a child constructor stamps with the child's key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildKind {
    Grade,
    Temper,
    Treatment,
    Vendor,
    /// Generic variant (dopant, alloy tweak); stamps no tag.
    Variant,
}

/// Optional classification tags, inherited by children unless overridden.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub grade: Option<String>,
    pub temper: Option<String>,
    pub treatment: Option<String>,
    pub vendor: Option<String>,
}

impl Metadata {
    fn stamp(&mut self, kind: ChildKind, key: &str) {
        let slot = match kind {
            ChildKind::Grade => &mut self.grade,
            ChildKind::Temper => &mut self.temper,
            ChildKind::Treatment => &mut self.treatment,
            ChildKind::Vendor => &mut self.vendor,
            ChildKind::Variant => return,
        };
        *slot = Some(key.to_string());
    }

    /// Fills every unset tag from `parent`.
    fn inherit(&mut self, parent: &Metadata) {
        for (own, inherited) in [
            (&mut self.grade, &parent.grade),
            (&mut self.temper, &parent.temper),
            (&mut self.treatment, &parent.treatment),
            (&mut self.vendor, &parent.vendor),
        ] {
            if own.is_none() {
                own.clone_from(inherited);
            }
        }
    }
}

/// Keys that describe a material's identity rather than its properties.
pub const IDENTITY_KEYS: [&str; 7] = [
    "name",
    "formula",
    "composition",
    "grade",
    "temper",
    "treatment",
    "vendor",
];

/// Identity fields collected from an override or specification table.
#[derive(Clone, Debug, Default)]
pub(crate) struct Identity {
    pub name: Option<String>,
    pub formula: Option<String>,
    pub composition: Option<Composition>,
    pub metadata: Metadata,
}

fn identity_str(key: &str, value: &Value) -> Result<String, MaterialError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MaterialError::InvalidIdentity {
            key: key.to_string(),
            expected: "a string",
            found: value.type_name(),
        })
}

impl Identity {
    /// Consumes `key` if it is an identity key. Returns whether it was one.
    pub(crate) fn absorb(&mut self, key: &str, value: &Value) -> Result<bool, MaterialError> {
        match key {
            "name" => self.name = Some(identity_str(key, value)?),
            "formula" => self.formula = Some(identity_str(key, value)?),
            "grade" => self.metadata.grade = Some(identity_str(key, value)?),
            "temper" => self.metadata.temper = Some(identity_str(key, value)?),
            "treatment" => self.metadata.treatment = Some(identity_str(key, value)?),
            "vendor" => self.metadata.vendor = Some(identity_str(key, value)?),
            "composition" => {
                let invalid = || MaterialError::InvalidIdentity {
                    key: key.to_string(),
                    expected: "a table of element amounts",
                    found: value.type_name(),
                };
                let table = value.as_table().ok_or_else(invalid)?;
                let mut composition = Composition::new();
                for (element, amount) in table {
                    composition.insert(element.clone(), amount.as_f64().ok_or_else(invalid)?);
                }
                self.composition = Some(composition);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Local changes applied on top of an inherited bundle when adding a child.
///
/// Keys are routed the same way data files are: property group names merge
/// into the bundle, identity keys set identity, and anything else is kept in
/// the `custom` map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    entries: Table,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(entries: Table) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &Table {
        &self.entries
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.set("name", name.into())
    }

    pub fn formula(self, formula: impl Into<String>) -> Self {
        self.set("formula", formula.into())
    }

    pub fn composition<'a>(self, amounts: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let table: Table = amounts
            .into_iter()
            .map(|(element, amount)| (element.to_string(), Value::Float(amount)))
            .collect();
        self.set("composition", table)
    }

    pub fn grade(self, grade: impl Into<String>) -> Self {
        self.set("grade", grade.into())
    }

    pub fn temper(self, temper: impl Into<String>) -> Self {
        self.set("temper", temper.into())
    }

    pub fn treatment(self, treatment: impl Into<String>) -> Self {
        self.set("treatment", treatment.into())
    }

    pub fn vendor(self, vendor: impl Into<String>) -> Self {
        self.set("vendor", vendor.into())
    }

    /// Sets `group.field`, e.g. `.property("mechanical", "density", 8.0)`.
    ///
    /// Use `"<field>_unit"` as the field name to supply a unit tag.
    pub fn property(mut self, group: &str, field: &str, value: impl Into<Value>) -> Self {
        let slot = self
            .entries
            .entry(group.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !matches!(slot, Value::Table(_)) {
            *slot = Value::Table(Table::new());
        }
        if let Value::Table(table) = slot {
            table.insert(field.to_string(), value.into());
        }
        self
    }

    /// Sets a top-level key. Non-group, non-identity keys land in `custom`.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

impl From<Table> for Overrides {
    fn from(entries: Table) -> Self {
        Self::from_table(entries)
    }
}

// ---------------------------------------------------------------------------
// MaterialNode
// ---------------------------------------------------------------------------

/// A material in a hierarchy.
///
/// Nodes are always handled through `Arc`. A node owns its children; the
/// parent link is weak and only used to compute [`MaterialNode::path`].
/// The bundle is resolved once at construction: editing a parent later does
/// not reach children that already exist.
pub struct MaterialNode {
    key: Option<String>,
    name: String,
    formula: Option<String>,
    composition: Option<Composition>,
    metadata: Metadata,
    bundle: RwLock<PropertyBundle>,
    parent: Weak<MaterialNode>,
    children: RwLock<BTreeMap<String, Arc<MaterialNode>>>,
}

/// Everything needed to assemble a node, before inheritance is applied.
pub(crate) struct NodeDraft {
    pub key: Option<String>,
    pub default_name: String,
    pub identity: Identity,
    pub bundle: PropertyBundle,
    pub kind: Option<ChildKind>,
}

impl MaterialNode {
    /// A root material addressed by `key`. The name defaults to the key.
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn root(key: impl Into<String>, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        let key = key.into();
        let draft = draft_from_overrides(
            Some(key.clone()),
            key,
            PropertyBundle::new(),
            None,
            overrides,
            UnknownKeyPolicy::Absorb,
        )?;
        Self::assemble(draft, None)
    }

    /// A root material without a key; its path segment is derived from the name.
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn named(name: impl Into<String>, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        let draft = draft_from_overrides(
            None,
            name.into(),
            PropertyBundle::new(),
            None,
            overrides,
            UnknownKeyPolicy::Absorb,
        )?;
        Self::assemble(draft, None)
    }

    /// Finishes a draft: inherits identity from `parent`, validates the
    /// formula, backfills units and wires rendering defaults. The returned
    /// node is not yet attached to `parent`.
    pub(crate) fn assemble(
        draft: NodeDraft,
        parent: Option<&Arc<MaterialNode>>,
    ) -> Result<Arc<Self>, MaterialError> {
        let NodeDraft {
            key,
            default_name,
            identity,
            mut bundle,
            kind,
        } = draft;

        let mut metadata = identity.metadata;
        let mut formula = identity.formula;
        let mut composition = identity.composition;
        if let Some(formula) = &formula {
            parse_formula(formula)?;
        }
        if let Some(parent) = parent {
            metadata.inherit(&parent.metadata);
            if formula.is_none() {
                formula.clone_from(&parent.formula);
            }
            if composition.is_none() {
                composition.clone_from(&parent.composition);
            }
        }
        if let (Some(kind), Some(key)) = (kind, key.as_deref()) {
            metadata.stamp(kind, key);
        }

        bundle.backfill_default_units();
        bundle.wire_rendering_defaults();

        let node = Arc::new(Self {
            key,
            name: identity.name.unwrap_or(default_name),
            formula,
            composition,
            metadata,
            bundle: RwLock::new(bundle),
            parent: parent.map(Arc::downgrade).unwrap_or_default(),
            children: RwLock::new(BTreeMap::new()),
        });
        debug!(path = %node.path(), "constructed material");
        Ok(node)
    }

    // -- Child construction --

    /// Derives a child from this node's resolved bundle plus `overrides` and
    /// attaches it under `key`.
    ///
    /// The child's name defaults to `"{parent name} {key}"`. The metadata tag
    /// matching `kind` is set to `key` regardless of overrides.
    ///
    /// # Errors
    ///
    /// [`MaterialError::DuplicateChild`] if `key` is taken,
    /// [`MaterialError::Property`] for malformed property overrides,
    /// [`MaterialError::InvalidIdentity`] or [`MaterialError::Formula`] for
    /// malformed identity fields.
    pub fn add_child(
        self: &Arc<Self>,
        key: &str,
        kind: ChildKind,
        overrides: &Overrides,
    ) -> Result<Arc<Self>, MaterialError> {
        if self.children_read().contains_key(key) {
            return Err(self.duplicate(key));
        }
        let child = self.derive_child(key, kind, overrides, UnknownKeyPolicy::Absorb)?;
        self.attach(key, Arc::clone(&child), false)?;
        Ok(child)
    }

    /// Like [`MaterialNode::add_child`], but an existing child under `key` is
    /// replaced. Returns the new child and the one it displaced, if any.
    ///
    /// # Errors
    ///
    /// As [`MaterialNode::add_child`], minus `DuplicateChild`.
    pub fn replace_child(
        self: &Arc<Self>,
        key: &str,
        kind: ChildKind,
        overrides: &Overrides,
    ) -> Result<(Arc<Self>, Option<Arc<Self>>), MaterialError> {
        let child = self.derive_child(key, kind, overrides, UnknownKeyPolicy::Absorb)?;
        let previous = self.attach(key, Arc::clone(&child), true)?;
        Ok((child, previous))
    }

    /// Adds a grade (e.g. `304`, `6061`).
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn grade(self: &Arc<Self>, key: &str, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        self.add_child(key, ChildKind::Grade, overrides)
    }

    /// Adds a temper or heat-treatment state (e.g. `T6`, `annealed`).
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn temper(self: &Arc<Self>, key: &str, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        self.add_child(key, ChildKind::Temper, overrides)
    }

    /// Adds a surface treatment (e.g. `passivated`, `anodized`).
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn treatment(self: &Arc<Self>, key: &str, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        self.add_child(key, ChildKind::Treatment, overrides)
    }

    /// Adds a vendor-specific variant.
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn vendor(self: &Arc<Self>, key: &str, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        self.add_child(key, ChildKind::Vendor, overrides)
    }

    /// Adds a generic variant (dopant, composition tweak). No tag is stamped.
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::add_child`].
    pub fn variant(self: &Arc<Self>, key: &str, overrides: &Overrides) -> Result<Arc<Self>, MaterialError> {
        self.add_child(key, ChildKind::Variant, overrides)
    }

    fn derive_child(
        self: &Arc<Self>,
        key: &str,
        kind: ChildKind,
        overrides: &Overrides,
        policy: UnknownKeyPolicy,
    ) -> Result<Arc<Self>, MaterialError> {
        let draft = draft_from_overrides(
            Some(key.to_string()),
            format!("{} {key}", self.name),
            self.bundle_snapshot(),
            Some(kind),
            overrides,
            policy,
        )?;
        Self::assemble(draft, Some(self))
    }

    /// Attaches `child` under `key`. With `replace` unset an occupied key is
    /// an error; otherwise the displaced child is returned.
    pub(crate) fn attach(
        &self,
        key: &str,
        child: Arc<Self>,
        replace: bool,
    ) -> Result<Option<Arc<Self>>, MaterialError> {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        if !replace && children.contains_key(key) {
            return Err(self.duplicate(key));
        }
        Ok(children.insert(key.to_string(), child))
    }

    fn duplicate(&self, key: &str) -> MaterialError {
        MaterialError::DuplicateChild {
            parent: self.path(),
            key: key.to_string(),
        }
    }

    // -- Identity --

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn grade_tag(&self) -> Option<&str> {
        self.metadata.grade.as_deref()
    }

    pub fn temper_tag(&self) -> Option<&str> {
        self.metadata.temper.as_deref()
    }

    pub fn treatment_tag(&self) -> Option<&str> {
        self.metadata.treatment.as_deref()
    }

    pub fn vendor_tag(&self) -> Option<&str> {
        self.metadata.vendor.as_deref()
    }

    /// Element amounts parsed from [`Self::formula`], or `None` without a formula.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] if the formula cannot be parsed.
    pub fn formula_composition(&self) -> Result<Option<Composition>, FormulaError> {
        self.formula.as_deref().map(parse_formula).transpose()
    }

    // -- Hierarchy --

    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.upgrade()
    }

    /// This node's path segment: its key, or its name lowercased with spaces
    /// replaced by underscores.
    pub fn segment(&self) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => self.name.to_lowercase().replace(' ', "_"),
        }
    }

    /// Dotted path from the root, e.g. `aluminum.a6061.T6`.
    pub fn path(&self) -> String {
        let mut segments = vec![self.segment()];
        let mut current = self.parent();
        while let Some(node) = current {
            segments.push(node.segment());
            current = node.parent();
        }
        segments.reverse();
        segments.join(".")
    }

    /// Looks up a direct child.
    ///
    /// # Errors
    ///
    /// [`MaterialError::NotFound`] listing the keys that do exist.
    pub fn resolve(&self, key: &str) -> Result<Arc<Self>, MaterialError> {
        let children = self.children_read();
        children
            .get(key)
            .cloned()
            .ok_or_else(|| MaterialError::NotFound {
                node: self.path(),
                key: key.to_string(),
                available: children.keys().cloned().collect(),
            })
    }

    /// Follows a dotted path of child keys, e.g. `"s304.passivated"`.
    ///
    /// # Errors
    ///
    /// [`MaterialError::NotFound`] at the first missing segment.
    pub fn resolve_path(self: &Arc<Self>, path: &str) -> Result<Arc<Self>, MaterialError> {
        let mut node = Arc::clone(self);
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            node = node.resolve(segment)?;
        }
        Ok(node)
    }

    /// Child keys in sorted order.
    pub fn child_keys(&self) -> Vec<String> {
        self.children_read().keys().cloned().collect()
    }

    pub fn children(&self) -> Vec<Arc<Self>> {
        self.children_read().values().cloned().collect()
    }

    /// This node followed by all descendants, depth first.
    pub fn descendants(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut out = vec![Arc::clone(self)];
        for child in self.children() {
            out.extend(child.descendants());
        }
        out
    }

    fn children_read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<Self>>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Properties --

    /// Read access to this node's resolved bundle.
    pub fn properties(&self) -> RwLockReadGuard<'_, PropertyBundle> {
        self.bundle.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deep copy of this node's bundle.
    pub fn bundle_snapshot(&self) -> PropertyBundle {
        self.properties().clone()
    }

    /// Mutates this node's bundle in place. Existing children are unaffected.
    pub fn update_properties<R>(&self, f: impl FnOnce(&mut PropertyBundle) -> R) -> R {
        let mut bundle = self.bundle.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut bundle)
    }

    /// `mechanical.density` in its stored unit (g/cm^3 unless data says otherwise).
    pub fn density(&self) -> Option<f64> {
        self.properties().mechanical.density.value
    }

    /// Sets `mechanical.density` in g/cm^3 on this node only.
    pub fn set_density(&self, g_cm3: f64) {
        self.update_properties(|bundle| {
            bundle.mechanical.density.value = Some(g_cm3);
            bundle.mechanical.density.unit = Some("g/cm^3".to_string());
        });
    }

    /// Density converted to g/mm^3; 0 when unset.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitError`] if the stored density unit is unknown or not a density.
    pub fn density_g_mm3(&self) -> Result<f64, UnitError> {
        let density = self.properties().mechanical.density.clone();
        if density.value.is_some() && density.unit.is_none() {
            return Ok(density.value.unwrap_or_default() / 1000.0);
        }
        Ok(density.to("g/mm^3")?.unwrap_or(0.0))
    }

    /// Mass in grams of `volume_mm3` cubic millimetres of this material.
    ///
    /// # Errors
    ///
    /// See [`MaterialNode::density_g_mm3`].
    pub fn mass_from_volume_mm3(&self, volume_mm3: f64) -> Result<f64, UnitError> {
        Ok(volume_mm3 * self.density_g_mm3()?)
    }

    /// Multi-line human-readable summary of identity and set properties.
    pub fn info(&self) -> String {
        let mut lines = vec![
            format!("Material: {}", self.name),
            format!("Path: {}", self.path()),
        ];
        if let Some(formula) = &self.formula {
            lines.push(format!("Formula: {formula}"));
        }
        if let Some(composition) = &self.composition {
            let parts: Vec<String> = composition
                .iter()
                .map(|(element, amount)| format!("{element}={amount}"))
                .collect();
            lines.push(format!("Composition: {}", parts.join(", ")));
        }
        for (tag, value) in [
            ("Grade", &self.metadata.grade),
            ("Temper", &self.metadata.temper),
            ("Treatment", &self.metadata.treatment),
            ("Vendor", &self.metadata.vendor),
        ] {
            if let Some(value) = value {
                lines.push(format!("{tag}: {value}"));
            }
        }

        let bundle = self.properties();
        for group in GroupName::ALL {
            let entries = bundle.entries(group);
            if entries.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("[{group}]"));
            for (field, value) in entries {
                let unit = bundle
                    .scalar(group.as_str(), &field)
                    .and_then(|s| s.unit())
                    .map(|u| format!(" {u}"))
                    .unwrap_or_default();
                lines.push(format!("  {field} = {value}{unit}"));
            }
        }
        lines.join("\n")
    }
}

/// Routes an override table into a draft: group keys merge into `bundle`,
/// identity keys set identity, anything else lands in `custom`.
fn draft_from_overrides(
    key: Option<String>,
    default_name: String,
    mut bundle: PropertyBundle,
    kind: Option<ChildKind>,
    overrides: &Overrides,
    policy: UnknownKeyPolicy,
) -> Result<NodeDraft, MaterialError> {
    let mut identity = Identity::default();
    for (k, value) in overrides.entries() {
        if value.is_unset() {
            continue;
        }
        if is_group_key(k) {
            bundle.merge_group_value(k, value, policy)?;
        } else if !identity.absorb(k, value)? {
            bundle.custom.insert(k.clone(), value.clone());
        }
    }
    Ok(NodeDraft {
        key,
        default_name,
        identity,
        bundle,
        kind,
    })
}

impl fmt::Display for MaterialNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path())
    }
}

impl fmt::Debug for MaterialNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let density = self.properties().mechanical.density.clone();
        match density.value {
            Some(value) => {
                let unit = density.unit.as_deref().unwrap_or("g/cm^3");
                write!(f, "Material({:?}, ρ={value} {unit})", self.path())
            }
            None => write!(f, "Material({:?}, ρ=?)", self.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stainless() -> Arc<MaterialNode> {
        MaterialNode::root(
            "stainless",
            &Overrides::new()
                .name("Stainless Steel")
                .property("mechanical", "density", 8.0)
                .property("mechanical", "yield_strength", 200.0),
        )
        .unwrap()
    }

    #[test]
    fn test_root_defaults_name_to_key() {
        let node = MaterialNode::root("peek", &Overrides::new()).unwrap();
        assert_eq!(node.name(), "peek");
        assert_eq!(node.path(), "peek");
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_child_default_name_and_tag() {
        let steel = stainless();
        let s304 = steel.grade("s304", &Overrides::new()).unwrap();
        assert_eq!(s304.name(), "Stainless Steel s304");
        assert_eq!(s304.grade_tag(), Some("s304"));
        assert_eq!(s304.path(), "stainless.s304");
    }

    #[test]
    fn test_kind_tag_wins_over_override() {
        let steel = stainless();
        let child = steel
            .grade("s316", &Overrides::new().grade("316"))
            .unwrap();
        assert_eq!(child.grade_tag(), Some("s316"));
    }

    #[test]
    fn test_metadata_inherited() {
        let steel = stainless();
        let s304 = steel.grade("s304", &Overrides::new()).unwrap();
        let annealed = s304.temper("annealed", &Overrides::new()).unwrap();
        assert_eq!(annealed.grade_tag(), Some("s304"));
        assert_eq!(annealed.temper_tag(), Some("annealed"));

        let doped = annealed.variant("doped", &Overrides::new()).unwrap();
        assert_eq!(doped.temper_tag(), Some("annealed"));
        assert_eq!(doped.treatment_tag(), None);
    }

    #[test]
    fn test_path_without_key_uses_name() {
        let node = MaterialNode::named("Carbon Fiber", &Overrides::new()).unwrap();
        assert_eq!(node.path(), "carbon_fiber");
        let child = node.variant("uni", &Overrides::new()).unwrap();
        assert_eq!(child.path(), "carbon_fiber.uni");
    }

    #[test]
    fn test_resolve_not_found_lists_children() {
        let steel = stainless();
        steel.grade("s304", &Overrides::new()).unwrap();
        steel.grade("s316L", &Overrides::new()).unwrap();
        match steel.resolve("s999") {
            Err(MaterialError::NotFound { node, key, available }) => {
                assert_eq!(node, "stainless");
                assert_eq!(key, "s999");
                assert_eq!(available, vec!["s304", "s316L"]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_path() {
        let steel = stainless();
        let s304 = steel.grade("s304", &Overrides::new()).unwrap();
        let passivated = s304.treatment("passivated", &Overrides::new()).unwrap();
        let found = steel.resolve_path("s304.passivated").unwrap();
        assert!(Arc::ptr_eq(&found, &passivated));
        assert!(steel.resolve_path("s304.missing").is_err());
    }

    #[test]
    fn test_duplicate_child_rejected_then_replaced() {
        let steel = stainless();
        let first = steel.grade("s304", &Overrides::new()).unwrap();
        let err = steel.grade("s304", &Overrides::new()).unwrap_err();
        assert!(matches!(err, MaterialError::DuplicateChild { .. }));

        let (second, displaced) = steel
            .replace_child(
                "s304",
                ChildKind::Grade,
                &Overrides::new().property("mechanical", "yield_strength", 215.0),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&displaced.unwrap(), &first));
        assert!(Arc::ptr_eq(&steel.resolve("s304").unwrap(), &second));
    }

    #[test]
    fn test_unconsumed_override_goes_to_custom() {
        let steel = stainless();
        let child = steel
            .variant("coded", &Overrides::new().set("part_number", "SS-1"))
            .unwrap();
        assert_eq!(
            child.properties().custom.get("part_number"),
            Some(&Value::from("SS-1"))
        );
    }

    #[test]
    fn test_bad_formula_fails_construction() {
        let err = MaterialNode::root("mystery", &Overrides::new().formula("Qq2")).unwrap_err();
        assert!(matches!(err, MaterialError::Formula(_)));
    }

    #[test]
    fn test_bad_identity_type() {
        let err = MaterialNode::root("x", &Overrides::new().set("name", 3)).unwrap_err();
        assert!(matches!(err, MaterialError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_formula_and_composition_inherited() {
        let lyso = MaterialNode::root(
            "lyso",
            &Overrides::new()
                .formula("Lu1.8Y0.2SiO5")
                .composition([("Lu", 0.71), ("Y", 0.04)]),
        )
        .unwrap();
        let vendor = lyso.vendor("saint_gobain", &Overrides::new()).unwrap();
        assert_eq!(vendor.formula(), Some("Lu1.8Y0.2SiO5"));
        assert_eq!(vendor.composition().unwrap()["Lu"], 0.71);
        let amounts = vendor.formula_composition().unwrap().unwrap();
        assert_eq!(amounts["O"], 5.0);
    }

    #[test]
    fn test_density_helpers() {
        let steel = stainless();
        assert_eq!(steel.density(), Some(8.0));
        assert!((steel.density_g_mm3().unwrap() - 0.008).abs() < 1e-12);
        assert!((steel.mass_from_volume_mm3(1000.0).unwrap() - 8.0).abs() < 1e-9);

        let empty = MaterialNode::root("nothing", &Overrides::new()).unwrap();
        assert_eq!(empty.density(), None);
        assert_eq!(empty.mass_from_volume_mm3(1000.0).unwrap(), 0.0);
    }

    #[test]
    fn test_density_unit_respected_for_mass() {
        let foam = MaterialNode::root(
            "foam",
            &Overrides::new()
                .property("mechanical", "density", 30.0)
                .property("mechanical", "density_unit", "kg/m^3"),
        )
        .unwrap();
        // 30 kg/m^3 = 0.03 g/cm^3 -> 1e6 mm^3 weighs 30 g.
        assert!((foam.mass_from_volume_mm3(1e6).unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_density_does_not_propagate() {
        let steel = stainless();
        let s304 = steel.grade("s304", &Overrides::new()).unwrap();
        steel.set_density(9.0);
        assert_eq!(steel.density(), Some(9.0));
        assert_eq!(s304.density(), Some(8.0));
    }

    #[test]
    fn test_display_and_debug() {
        let steel = stainless();
        let s304 = steel.grade("s304", &Overrides::new()).unwrap();
        assert_eq!(s304.to_string(), "Stainless Steel s304 (stainless.s304)");
        assert_eq!(
            format!("{s304:?}"),
            "Material(\"stainless.s304\", ρ=8 g/cm^3)"
        );
        let bare = MaterialNode::root("bare", &Overrides::new()).unwrap();
        assert_eq!(format!("{bare:?}"), "Material(\"bare\", ρ=?)");
    }

    #[test]
    fn test_info_lists_groups() {
        let steel = stainless();
        let info = steel.info();
        assert!(info.starts_with("Material: Stainless Steel\nPath: stainless"));
        assert!(info.contains("[mechanical]"));
        assert!(info.contains("  density = 8 g/cm^3"));
        assert!(info.contains("[rendering]"));
        assert!(!info.contains("[optical]"));
    }

    #[test]
    fn test_nodes_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MaterialNode>();
        assert_send_sync::<Arc<MaterialNode>>();
    }
}
