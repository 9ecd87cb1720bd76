//! The material library: bundled category data, lazy per-category loading,
//! and TOML file loading.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashSet;
use strata_properties::{Table, UnknownKeyPolicy};
use tracing::{debug, info};

use crate::builder::TreeBuilder;
use crate::error::LoadError;
use crate::node::MaterialNode;
use crate::registry::Registry;

/// Category name → base material keys defined by that category's data file.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "metals",
        &["stainless", "aluminum", "copper", "tungsten", "lead", "titanium", "brass"],
    ),
    (
        "scintillators",
        &["lyso", "bgo", "nai", "csi", "labr3", "pwo", "plastic_scint"],
    ),
    (
        "plastics",
        &[
            "peek", "delrin", "ultem", "ptfe", "esr", "nylon", "pla", "abs", "petg", "tpu",
            "vespel", "torlon", "pctfe", "pmma", "pe", "pc",
        ],
    ),
    ("ceramics", &["alumina", "macor", "zirconia", "glass"]),
    (
        "electronics",
        &["fr4", "rogers", "kapton", "copper_pcb", "solder"],
    ),
    (
        "liquids",
        &["water", "heavy_water", "mineral_oil", "glycerol", "silicone_oil"],
    ),
    (
        "gases",
        &[
            "air", "nitrogen", "oxygen", "argon", "co2", "helium", "hydrogen", "neon", "xenon",
            "methane", "vacuum",
        ],
    ),
];

const BUNDLED: &[(&str, &str)] = &[
    ("metals", include_str!("../data/metals.toml")),
    ("scintillators", include_str!("../data/scintillators.toml")),
    ("plastics", include_str!("../data/plastics.toml")),
    ("ceramics", include_str!("../data/ceramics.toml")),
    ("electronics", include_str!("../data/electronics.toml")),
    ("liquids", include_str!("../data/liquids.toml")),
    ("gases", include_str!("../data/gases.toml")),
];

fn category_names() -> Vec<&'static str> {
    CATEGORIES.iter().map(|(name, _)| *name).collect()
}

fn find_category(name: &str) -> Result<(&'static str, &'static [&'static str]), LoadError> {
    CATEGORIES
        .iter()
        .find(|(category, _)| *category == name)
        .copied()
        .ok_or_else(|| LoadError::UnknownCategory {
            name: name.to_string(),
            available: category_names(),
        })
}

/// The category whose base list contains `key` (case-insensitive).
fn category_of(key: &str) -> Option<(&'static str, &'static str)> {
    CATEGORIES.iter().find_map(|(category, bases)| {
        bases
            .iter()
            .find(|base| base.eq_ignore_ascii_case(key))
            .map(|base| (*category, *base))
    })
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// Lazily loads material categories into a registry.
///
/// Each category is parsed and built at most once per library. Loading is
/// serialized by an internal mutex, so concurrent first accesses to the same
/// category build it once.
pub struct Library<'r> {
    registry: &'r Registry,
    data_dir: Option<PathBuf>,
    unknown_keys: UnknownKeyPolicy,
    loaded: Mutex<FxHashSet<&'static str>>,
}

impl<'r> Library<'r> {
    /// A library reading the category data compiled into this crate.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            data_dir: None,
            unknown_keys: UnknownKeyPolicy::default(),
            loaded: Mutex::new(FxHashSet::default()),
        }
    }

    /// Reads `<dir>/<category>.toml` when present, falling back to the
    /// bundled data for categories the directory does not provide.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// All category names, in display order.
    pub fn categories() -> Vec<&'static str> {
        category_names()
    }

    /// Whether `category` has already been loaded by this library.
    pub fn is_loaded(&self, category: &str) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(category)
    }

    /// A namespace for one category, e.g. `library.category("plastics")?.material("pmma")`.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownCategory`] for a name not in [`CATEGORIES`].
    pub fn category(&self, name: &str) -> Result<Category<'_, 'r>, LoadError> {
        let (name, bases) = find_category(name)?;
        Ok(Category {
            library: self,
            name,
            bases,
        })
    }

    /// Loads `category` unless it is already loaded.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownCategory`], or any read, parse or build failure.
    pub fn ensure_loaded(&self, category: &str) -> Result<(), LoadError> {
        let (name, _) = find_category(category)?;
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if loaded.contains(name) {
            return Ok(());
        }
        let roots = self.load_category(name)?;
        info!(category = name, materials = roots.len(), "loaded material category");
        loaded.insert(name);
        Ok(())
    }

    /// Parses and builds a category, registering every node. Bypasses the
    /// once-per-category cache; the registry still keeps first registrations.
    /// Nothing is registered unless the whole category builds and defines
    /// all of its base materials.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownCategory`], or any read, parse or build failure.
    pub fn load_category(&self, category: &str) -> Result<BTreeMap<String, Arc<MaterialNode>>, LoadError> {
        let (name, bases) = find_category(category)?;
        let (origin, text) = self.source(name)?;
        let builder = self.builder();
        let forest = builder.stage(&parse(&text, &origin)?)?;
        if let Some(missing) = bases.iter().find(|base| !forest.roots.contains_key(**base)) {
            return Err(LoadError::MissingBase {
                category: name.to_string(),
                name: missing.to_string(),
            });
        }
        Ok(builder.commit(forest))
    }

    /// Loads every category.
    ///
    /// # Errors
    ///
    /// The first category that fails to load.
    pub fn load_all(&self) -> Result<Vec<(String, Arc<MaterialNode>)>, LoadError> {
        for (category, _) in CATEGORIES {
            self.ensure_loaded(category)?;
        }
        Ok(self.registry.snapshot())
    }

    /// Looks up a material by bare key, loading its category on demand.
    ///
    /// A dotted path (`"stainless.s316L.passivated"`) resolves the first
    /// segment this way and then walks children.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownMaterial`] when no category defines the key, or a
    /// load failure. Unknown child segments give [`LoadError::Build`].
    pub fn get(&self, key: &str) -> Result<Arc<MaterialNode>, LoadError> {
        let (head, rest) = match key.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (key, None),
        };
        let node = self.lookup(head)?;
        match rest {
            Some(rest) => Ok(node.resolve_path(rest)?),
            None => Ok(node),
        }
    }

    fn lookup(&self, key: &str) -> Result<Arc<MaterialNode>, LoadError> {
        if let Some(node) = self.registry.get(key) {
            return Ok(node);
        }
        let unknown = || LoadError::UnknownMaterial {
            name: key.to_string(),
        };
        let (category, base) = category_of(key).ok_or_else(unknown)?;
        debug!(key, category, "loading category on first access");
        self.ensure_loaded(category)?;
        self.registry
            .get(key)
            .or_else(|| self.registry.get(base))
            .ok_or_else(unknown)
    }

    /// Loads materials from a TOML file with this library's registry and policy.
    ///
    /// # Errors
    ///
    /// [`LoadError::Read`], [`LoadError::Parse`] or [`LoadError::Build`].
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<BTreeMap<String, Arc<MaterialNode>>, LoadError> {
        let path = path.as_ref();
        let text = read(path)?;
        self.load_str(&text, &path.display().to_string())
    }

    fn load_str(&self, text: &str, origin: &str) -> Result<BTreeMap<String, Arc<MaterialNode>>, LoadError> {
        let spec = parse(text, origin)?;
        Ok(self.builder().build(&spec)?)
    }

    fn builder(&self) -> TreeBuilder<'r> {
        TreeBuilder::new(self.registry).unknown_keys(self.unknown_keys)
    }

    fn source(&self, category: &'static str) -> Result<(String, Cow<'static, str>), LoadError> {
        if let Some(dir) = &self.data_dir {
            let path = dir.join(format!("{category}.toml"));
            if path.is_file() {
                return Ok((path.display().to_string(), Cow::Owned(read(&path)?)));
            }
            debug!(category, dir = %dir.display(), "no category file in data dir, using bundled data");
        }
        let text = BUNDLED
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, text)| *text)
            .unwrap_or_default();
        Ok((format!("bundled {category}"), Cow::Borrowed(text)))
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// One category of a [`Library`].
pub struct Category<'l, 'r> {
    library: &'l Library<'r>,
    name: &'static str,
    bases: &'static [&'static str],
}

impl Category<'_, '_> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Base material keys of this category.
    pub fn bases(&self) -> &'static [&'static str] {
        self.bases
    }

    /// A base material of this category, loading the category if needed.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownMaterial`] if `key` is not one of [`Self::bases`].
    pub fn material(&self, key: &str) -> Result<Arc<MaterialNode>, LoadError> {
        if !self.bases.iter().any(|base| *base == key) {
            return Err(LoadError::UnknownMaterial {
                name: format!("{}.{key}", self.name),
            });
        }
        self.library.ensure_loaded(self.name)?;
        self.library
            .registry
            .get(key)
            .ok_or_else(|| LoadError::MissingBase {
                category: self.name.to_string(),
                name: key.to_string(),
            })
    }

    /// All base materials of this category.
    ///
    /// # Errors
    ///
    /// See [`Category::material`].
    pub fn materials(&self) -> Result<Vec<Arc<MaterialNode>>, LoadError> {
        self.bases.iter().map(|key| self.material(key)).collect()
    }
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(text: &str, origin: &str) -> Result<Table, LoadError> {
    toml::from_str(text).map_err(|source| LoadError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Loads materials from a TOML file into `registry`, returning the roots.
///
/// # Errors
///
/// [`LoadError::Read`], [`LoadError::Parse`] or [`LoadError::Build`].
pub fn load_toml(
    registry: &Registry,
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, Arc<MaterialNode>>, LoadError> {
    Library::new(registry).load_file(path)
}

/// Loads materials from TOML text into `registry`, returning the roots.
///
/// # Errors
///
/// [`LoadError::Parse`] or [`LoadError::Build`].
pub fn load_toml_str(
    registry: &Registry,
    text: &str,
) -> Result<BTreeMap<String, Arc<MaterialNode>>, LoadError> {
    Library::new(registry).load_str(text, "<string>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_bundled_category_loads() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        for category in Library::categories() {
            library.ensure_loaded(category).unwrap();
            assert!(library.is_loaded(category));
        }
        for (_, bases) in CATEGORIES {
            for base in *bases {
                assert!(registry.contains(base), "{base} not registered");
            }
        }
    }

    #[test]
    fn test_lazy_get_loads_owning_category_only() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        let pmma = library.get("pmma").unwrap();
        assert_eq!(pmma.name(), "PMMA (Acrylic)");
        assert!(library.is_loaded("plastics"));
        assert!(!library.is_loaded("metals"));
    }

    #[test]
    fn test_get_dotted_path() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        let node = library.get("stainless.s316L.passivated").unwrap();
        assert_eq!(node.path(), "stainless.s316L.passivated");
        assert_eq!(node.treatment_tag(), Some("passivated"));
        assert!(matches!(
            library.get("stainless.s999"),
            Err(LoadError::Build(_))
        ));
    }

    #[test]
    fn test_unknown_material_and_category() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        assert!(matches!(
            library.get("unobtainium"),
            Err(LoadError::UnknownMaterial { .. })
        ));
        assert!(matches!(
            library.category("foods"),
            Err(LoadError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_category_namespace() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        let gases = library.category("gases").unwrap();
        assert!(gases.bases().contains(&"argon"));
        let argon = gases.material("argon").unwrap();
        assert_eq!(argon.formula(), Some("Ar"));
        // Only bases of this category are reachable through it.
        assert!(gases.material("pmma").is_err());
        assert_eq!(gases.materials().unwrap().len(), gases.bases().len());
    }

    #[test]
    fn test_category_loaded_once() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        library.ensure_loaded("ceramics").unwrap();
        let first = registry.get("alumina").unwrap();
        library.ensure_loaded("ceramics").unwrap();
        assert!(Arc::ptr_eq(&first, &registry.get("alumina").unwrap()));
    }

    #[test]
    fn test_data_dir_overrides_bundled_category() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ceramics.toml"),
            r#"
            [alumina.mechanical]
            density = 3.9
            [macor]
            [zirconia]
            [glass]
            "#,
        )
        .unwrap();

        let registry = Registry::new();
        let library = Library::new(&registry).with_data_dir(dir.path());
        assert_eq!(library.get("alumina").unwrap().density(), Some(3.9));
        // Categories missing from the directory fall back to bundled data.
        assert_eq!(library.get("copper").unwrap().density(), Some(8.96));
    }

    #[test]
    fn test_data_dir_file_missing_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gases.toml"), "[air.mechanical]\ndensity = 0.0012\n").unwrap();
        let registry = Registry::new();
        let library = Library::new(&registry).with_data_dir(dir.path());
        assert!(matches!(
            library.ensure_loaded("gases"),
            Err(LoadError::MissingBase { .. })
        ));
        assert!(!library.is_loaded("gases"));
    }

    #[test]
    fn test_rejected_category_stays_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gases.toml"), "[air.mechanical]\ndensity = 0.0012\n").unwrap();
        let registry = Registry::new();
        let library = Library::new(&registry).with_data_dir(dir.path());
        for _ in 0..2 {
            assert!(matches!(
                library.get("air"),
                Err(LoadError::MissingBase { .. })
            ));
        }
        assert!(!registry.contains("air"));
        assert!(!library.is_loaded("gases"));
    }

    #[test]
    fn test_failed_load_str_registers_nothing() {
        let registry = Registry::new();
        let err = load_toml_str(&registry, "[a]\n[a.ok]\n[a.z_bad.rendering]\nbase_color = [1.0]\n");
        assert!(matches!(err, Err(LoadError::Build(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
            [carbon_fiber]
            name = "Carbon Fiber"
            [carbon_fiber.mechanical]
            density = 1.6
            [carbon_fiber.uni]
            name = "Unidirectional CF"
            "#,
        )
        .unwrap();

        let registry = Registry::new();
        let roots = load_toml(&registry, &path).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(registry.get("uni").unwrap().density(), Some(1.6));
    }

    #[test]
    fn test_load_errors() {
        let registry = Registry::new();
        assert!(matches!(
            load_toml(&registry, "/nonexistent/strata.toml"),
            Err(LoadError::Read { .. })
        ));
        assert!(matches!(
            load_toml_str(&registry, "[broken"),
            Err(LoadError::Parse { .. })
        ));
        assert!(matches!(
            load_toml_str(&registry, "[x]\nformula = \"Zz\""),
            Err(LoadError::Build(_))
        ));
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let registry = Registry::new();
        let library = Library::new(&registry);
        let nodes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| library.get("lyso").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for node in &nodes[1..] {
            assert!(Arc::ptr_eq(node, &nodes[0]));
        }
    }
}
