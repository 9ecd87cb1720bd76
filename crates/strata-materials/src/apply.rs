//! Hook for pushing a material onto a host object.

use std::sync::Arc;

use tracing::debug;

use crate::error::ApplyError;
use crate::node::MaterialNode;

/// A host object that can carry a material reference.
pub trait MaterialTarget {
    /// Stores the material reference.
    ///
    /// # Errors
    ///
    /// [`ApplyError::Rejected`] if the target refuses this material.
    fn set_material(&mut self, material: Arc<MaterialNode>) -> Result<(), ApplyError>;

    /// The renderable shape behind this target, if it has one.
    fn as_shape(&mut self) -> Option<&mut dyn RenderableShape> {
        None
    }
}

/// Geometry with a volume, a paintable color and a writable mass.
pub trait RenderableShape {
    /// Volume in cubic millimetres.
    fn volume_mm3(&self) -> f64;
    fn set_color(&mut self, rgb: [f64; 3]);
    /// Mass in grams.
    fn set_mass(&mut self, grams: f64);
}

/// Assigns `material` to `target` and, when the target is a shape, paints it
/// with the material's base color and sets its mass from density × volume.
///
/// Mass is left untouched when the material has no positive density.
///
/// # Errors
///
/// Propagates the target's [`ApplyError`], or [`ApplyError::Mass`] if the
/// stored density unit cannot be converted.
pub fn apply(material: &Arc<MaterialNode>, target: &mut dyn MaterialTarget) -> Result<(), ApplyError> {
    target.set_material(Arc::clone(material))?;

    let Some(shape) = target.as_shape() else {
        debug!(material = %material.path(), "target has no shape, skipping color and mass");
        return Ok(());
    };

    shape.set_color(material.properties().rendering.rgb());

    let density = material.density_g_mm3().map_err(|source| ApplyError::Mass {
        material: material.path(),
        source,
    })?;
    if density > 0.0 {
        shape.set_mass(density * shape.volume_mm3());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Overrides;

    #[derive(Default)]
    struct Part {
        material: Option<Arc<MaterialNode>>,
        volume: f64,
        color: Option<[f64; 3]>,
        mass: Option<f64>,
    }

    impl MaterialTarget for Part {
        fn set_material(&mut self, material: Arc<MaterialNode>) -> Result<(), ApplyError> {
            self.material = Some(material);
            Ok(())
        }

        fn as_shape(&mut self) -> Option<&mut dyn RenderableShape> {
            Some(self)
        }
    }

    impl RenderableShape for Part {
        fn volume_mm3(&self) -> f64 {
            self.volume
        }

        fn set_color(&mut self, rgb: [f64; 3]) {
            self.color = Some(rgb);
        }

        fn set_mass(&mut self, grams: f64) {
            self.mass = Some(grams);
        }
    }

    #[derive(Default)]
    struct Label {
        material: Option<String>,
    }

    impl MaterialTarget for Label {
        fn set_material(&mut self, material: Arc<MaterialNode>) -> Result<(), ApplyError> {
            self.material = Some(material.name().to_string());
            Ok(())
        }
    }

    struct Picky;

    impl MaterialTarget for Picky {
        fn set_material(&mut self, material: Arc<MaterialNode>) -> Result<(), ApplyError> {
            Err(ApplyError::Rejected {
                material: material.path(),
                reason: "metals only".to_string(),
            })
        }
    }

    fn steel() -> Arc<MaterialNode> {
        MaterialNode::root(
            "steel",
            &Overrides::new()
                .property("mechanical", "density", 7.85)
                .property("rendering", "base_color", [0.6, 0.6, 0.65, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_apply_sets_color_and_mass() {
        let mut part = Part {
            volume: 1000.0,
            ..Default::default()
        };
        apply(&steel(), &mut part).unwrap();
        assert_eq!(part.material.as_ref().map(|m| m.name()), Some("steel"));
        assert_eq!(part.color, Some([0.6, 0.6, 0.65]));
        assert!((part.mass.unwrap() - 7.85).abs() < 1e-9);
    }

    #[test]
    fn test_apply_respects_density_unit() {
        let material = MaterialNode::root(
            "al",
            &Overrides::new()
                .property("mechanical", "density", 2700.0)
                .property("mechanical", "density_unit", "kg/m^3"),
        )
        .unwrap();
        let mut part = Part {
            volume: 1000.0,
            ..Default::default()
        };
        apply(&material, &mut part).unwrap();
        assert!((part.mass.unwrap() - 2.7).abs() < 1e-9);
    }

    #[test]
    fn test_apply_without_density_leaves_mass() {
        let material = MaterialNode::root("ghost", &Overrides::new()).unwrap();
        let mut part = Part {
            volume: 10.0,
            ..Default::default()
        };
        apply(&material, &mut part).unwrap();
        assert_eq!(part.mass, None);
        assert_eq!(part.color, Some([0.8, 0.8, 0.8]));
    }

    #[test]
    fn test_apply_to_non_shape() {
        let mut label = Label::default();
        apply(&steel(), &mut label).unwrap();
        assert_eq!(label.material.as_deref(), Some("steel"));
    }

    #[test]
    fn test_apply_surfaces_rejection() {
        let err = apply(&steel(), &mut Picky).unwrap_err();
        assert!(matches!(err, ApplyError::Rejected { .. }));
    }

    #[test]
    fn test_apply_bad_density_unit() {
        let material = MaterialNode::root(
            "odd",
            &Overrides::new()
                .property("mechanical", "density", 1.0)
                .property("mechanical", "density_unit", "MPa"),
        )
        .unwrap();
        let mut part = Part::default();
        assert!(matches!(apply(&material, &mut part), Err(ApplyError::Mass { .. })));
    }
}
