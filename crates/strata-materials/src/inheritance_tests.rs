//! Scenario tests for property inheritance across node trees.

use std::sync::Arc;

use strata_properties::{GroupName, PropertyBundle, Scalar, Table, Value};

use crate::builder::TreeBuilder;
use crate::error::MaterialError;
use crate::library::Library;
use crate::node::{ChildKind, MaterialNode, Overrides};
use crate::registry::Registry;

fn steel() -> Arc<MaterialNode> {
    MaterialNode::root(
        "steel",
        &Overrides::new()
            .name("Steel")
            .property("mechanical", "density", 7.85),
    )
    .unwrap()
}

fn spec(text: &str) -> Table {
    toml::from_str(text).unwrap()
}

/// Every property set on `node`'s parent is also set on `node`.
fn assert_keeps_parent_fields(node: &MaterialNode) {
    let Some(parent) = node.parent() else {
        return;
    };
    let child_props = node.properties();
    let parent_props = parent.properties();
    for group in GroupName::ALL {
        for (field, _) in parent_props.entries(group) {
            assert!(
                child_props.get(group.as_str(), &field).is_some(),
                "{}.{field} lost by {}",
                group.as_str(),
                node.path()
            );
        }
    }
}

#[test]
fn test_steel_s304_scenario() {
    let steel = steel();
    let s304 = steel
        .add_child("s304", ChildKind::Variant, &Overrides::new().grade("304"))
        .unwrap();
    assert_eq!(s304.density(), Some(7.85));
    assert_eq!(s304.path(), "steel.s304");
    assert_eq!(s304.grade_tag(), Some("304"));
    assert_eq!(s304.name(), "Steel s304");
}

#[test]
fn test_override_isolation_scenario() {
    let root = MaterialNode::root(
        "base",
        &Overrides::new().property("mechanical", "density", 8.0),
    )
    .unwrap();
    let child = root
        .variant(
            "strong",
            &Overrides::new().property("mechanical", "yield_strength", 300.0),
        )
        .unwrap();

    assert_eq!(child.density(), Some(8.0));
    assert_eq!(
        child.properties().mechanical.yield_strength,
        Scalar::new(300.0, "MPa")
    );
    assert!(!root.properties().mechanical.yield_strength.is_set());
}

#[test]
fn test_rendering_wiring_scenario() {
    let crystal = MaterialNode::root(
        "crystal",
        &Overrides::new()
            .property("optical", "refractive_index", 1.82)
            .property("optical", "transparency", 92.0),
    )
    .unwrap();
    let props = crystal.properties();
    assert_eq!(props.rendering.ior(), 1.82);
    assert!((props.rendering.transmission() - 0.92).abs() < 1e-12);
}

#[test]
fn test_derived_ior_follows_child_but_explicit_is_kept() {
    let glass = MaterialNode::root(
        "glass",
        &Overrides::new().property("optical", "refractive_index", 1.47),
    )
    .unwrap();
    let flint = glass
        .variant("flint", &Overrides::new().property("optical", "refractive_index", 1.62))
        .unwrap();
    assert_eq!(flint.properties().rendering.ior(), 1.62);

    let tuned = glass
        .variant("tuned", &Overrides::new().property("rendering", "ior", 1.5))
        .unwrap();
    let dense = tuned
        .variant("dense", &Overrides::new().property("optical", "refractive_index", 1.9))
        .unwrap();
    assert_eq!(dense.properties().rendering.ior(), 1.5);
}

#[test]
fn test_legacy_and_paired_units_build_identical_nodes() {
    let registry = Registry::new();
    let roots = TreeBuilder::new(&registry)
        .build(&spec(
            r#"
            [legacy.mechanical]
            density = 8.0
            yield_strength = 205

            [paired.mechanical]
            density_value = 8.0
            density_unit = "g/cm^3"
            yield_strength_value = 205
            yield_strength_unit = "MPa"
            "#,
        ))
        .unwrap();
    assert_eq!(
        roots["legacy"].bundle_snapshot(),
        roots["paired"].bundle_snapshot()
    );
}

#[test]
fn test_no_override_key_is_dropped() {
    let registry = Registry::new();
    let roots = TreeBuilder::new(&registry)
        .build(&spec(
            r#"
            [widget]
            name = "Widget"
            supplier_code = "W-17"
            [widget.mechanical]
            density = 1.2
            creep_rate = 0.003
            [widget.custom]
            batch = 42
            "#,
        ))
        .unwrap();
    let widget = &roots["widget"];
    let props = widget.properties();
    assert_eq!(widget.name(), "Widget");
    assert_eq!(props.custom.get("supplier_code"), Some(&Value::from("W-17")));
    assert_eq!(props.custom.get("mechanical.creep_rate"), Some(&Value::Float(0.003)));
    assert_eq!(props.custom.get("batch"), Some(&Value::Integer(42)));
    assert_eq!(props.mechanical.density, Scalar::new(1.2, "g/cm^3"));
}

#[test]
fn test_clone_is_independent() {
    let steel = steel();
    let mut copy: PropertyBundle = steel.bundle_snapshot();
    copy.mechanical.density = Scalar::new(1.0, "g/cm^3");
    copy.rendering.base_color[0] = 0.0;
    copy.custom.insert("tag".into(), Value::from("x"));

    let original = steel.properties();
    assert_eq!(original.mechanical.density, Scalar::new(7.85, "g/cm^3"));
    assert_eq!(original.rendering.base_color[0], 0.8);
    assert!(original.custom.is_empty());
}

#[test]
fn test_builder_errors_carry_node_path() {
    let registry = Registry::new();
    let err = TreeBuilder::new(&registry)
        .build(&spec(
            r#"
            [steel.s304.hot]
            [steel.s304.hot.rendering]
            base_color = [0.1, 0.2]
            "#,
        ))
        .unwrap_err();
    match err {
        MaterialError::AtNode { path, source } => {
            assert_eq!(path, "steel.s304.hot");
            assert!(matches!(*source, MaterialError::Property(_)));
        }
        other => panic!("expected AtNode, got {other:?}"),
    }
}

#[test]
fn test_bundled_library_never_loses_inherited_fields() {
    let registry = Registry::new();
    Library::new(&registry).load_all().unwrap();
    let roots: Vec<_> = registry
        .snapshot()
        .into_iter()
        .map(|(_, node)| node)
        .filter(|node| node.parent().is_none())
        .collect();
    assert!(!roots.is_empty());

    for root in roots {
        for node in root.descendants() {
            assert_keeps_parent_fields(&node);
        }
    }
}

#[test]
fn test_unset_fields_resolve_to_nearest_ancestor() {
    let registry = Registry::new();
    let library = Library::new(&registry);
    let passivated = library.get("stainless.s316L.passivated").unwrap();
    let s316l = library.get("stainless.s316L").unwrap();
    let stainless = library.get("stainless").unwrap();

    let props = passivated.properties();
    assert_eq!(props.mechanical.density, s316l.properties().mechanical.density);
    assert_eq!(
        props.mechanical.youngs_modulus,
        stainless.properties().mechanical.youngs_modulus
    );
    assert_eq!(props.rendering.metallic, stainless.properties().rendering.metallic);
}

#[test]
fn test_bundled_chain_lyso_prelude() {
    let registry = Registry::new();
    let library = Library::new(&registry);
    let prelude = library.get("lyso.Ce.saint_gobain.prelude420").unwrap();
    let lyso = library.get("lyso").unwrap();

    assert_eq!(prelude.formula(), lyso.formula());
    assert_eq!(prelude.density(), lyso.density());
    assert_eq!(prelude.vendor_tag(), Some("saint_gobain"));
    assert_eq!(
        prelude.properties().rendering.ior(),
        lyso.properties().optical.refractive_index.unwrap()
    );
}
