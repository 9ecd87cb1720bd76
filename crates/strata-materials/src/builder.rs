//! [`TreeBuilder`]: turns a nested specification table into material trees.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_properties::{PropertyBundle, Table, UnknownKeyPolicy, Value, is_group_key};
use tracing::{debug, warn};

use crate::error::MaterialError;
use crate::node::{Identity, MaterialNode, NodeDraft};
use crate::registry::Registry;

/// A built forest whose nodes are not yet in the registry.
#[derive(Default)]
pub(crate) struct StagedForest {
    pub(crate) roots: BTreeMap<String, Arc<MaterialNode>>,
    pending: Vec<(String, Arc<MaterialNode>)>,
}

/// Builds material forests from nested tables, registering every node.
///
/// Within a node's table, keys are routed as follows:
///
/// - property group names (`mechanical`, `pbr`, `custom`, ...) merge into the
///   node's bundle, which starts as a deep copy of the parent's;
/// - identity keys (`name`, `formula`, `composition`, metadata tags) set identity;
/// - any other table is a child material;
/// - any other value is stored in the bundle's `custom` map.
///
/// Keys starting with `_` are ignored.
pub struct TreeBuilder<'r> {
    registry: &'r Registry,
    unknown_keys: UnknownKeyPolicy,
}

impl<'r> TreeBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            unknown_keys: UnknownKeyPolicy::default(),
        }
    }

    /// Policy for group fields the bundle does not know.
    pub fn unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Builds one root per top-level table. Top-level non-table entries are
    /// skipped with a warning.
    ///
    /// Nodes are registered only once the whole forest has been built; a
    /// failed build leaves the registry untouched.
    ///
    /// # Errors
    ///
    /// The first construction failure, wrapped in [`MaterialError::AtNode`]
    /// with the dotted path of the failing node.
    pub fn build(&self, spec: &Table) -> Result<BTreeMap<String, Arc<MaterialNode>>, MaterialError> {
        Ok(self.commit(self.stage(spec)?))
    }

    /// Builds a single root material and its subtree.
    ///
    /// # Errors
    ///
    /// See [`TreeBuilder::build`].
    pub fn build_root(&self, key: &str, spec: &Table) -> Result<Arc<MaterialNode>, MaterialError> {
        let mut pending = Vec::new();
        let root = self.build_node(key, spec, None, &mut pending)?;
        self.register_all(pending);
        Ok(root)
    }

    /// Builds a subtree below an existing node, attaching it under `key`.
    /// Neither `parent` nor the registry changes if the subtree fails.
    ///
    /// # Errors
    ///
    /// See [`TreeBuilder::build`]; also [`MaterialError::DuplicateChild`]
    /// if `parent` already has a child `key`.
    pub fn build_child(
        &self,
        parent: &Arc<MaterialNode>,
        key: &str,
        spec: &Table,
    ) -> Result<Arc<MaterialNode>, MaterialError> {
        let mut pending = Vec::new();
        let child = self.build_node(key, spec, Some(parent), &mut pending)?;
        parent.attach(key, Arc::clone(&child), false)?;
        self.register_all(pending);
        Ok(child)
    }

    /// Builds a forest without registering it.
    pub(crate) fn stage(&self, spec: &Table) -> Result<StagedForest, MaterialError> {
        let mut forest = StagedForest::default();
        for (key, value) in spec {
            if key.starts_with('_') {
                continue;
            }
            match value {
                Value::Table(table) => {
                    let root = self.build_node(key, table, None, &mut forest.pending)?;
                    forest.roots.insert(key.clone(), root);
                }
                other => warn!(key = %key, found = other.type_name(), "skipping top-level non-table entry"),
            }
        }
        Ok(forest)
    }

    /// Registers every node of a staged forest, first registration winning.
    pub(crate) fn commit(&self, forest: StagedForest) -> BTreeMap<String, Arc<MaterialNode>> {
        self.register_all(forest.pending);
        forest.roots
    }

    fn register_all(&self, pending: Vec<(String, Arc<MaterialNode>)>) {
        for (key, node) in pending {
            if !self.registry.register(&key, Arc::clone(&node)) {
                debug!(key = %key, path = %node.path(), "key already registered, keeping the first");
            }
        }
    }

    /// Builds `key` and its subtree, pushing each node onto `pending` in
    /// pre-order. The returned node is not attached to `parent`.
    fn build_node(
        &self,
        key: &str,
        spec: &Table,
        parent: Option<&Arc<MaterialNode>>,
        pending: &mut Vec<(String, Arc<MaterialNode>)>,
    ) -> Result<Arc<MaterialNode>, MaterialError> {
        let path = match parent {
            Some(parent) => format!("{}.{key}", parent.path()),
            None => key.to_string(),
        };
        let inherited = parent.map(|p| p.bundle_snapshot()).unwrap_or_default();
        let (draft, children) = self
            .draft(key, spec, inherited)
            .map_err(|e| MaterialError::at(&path, e))?;
        let node = MaterialNode::assemble(draft, parent).map_err(|e| MaterialError::at(&path, e))?;
        pending.push((key.to_string(), Arc::clone(&node)));

        for (child_key, child_spec) in children {
            let child = self.build_node(child_key, child_spec, Some(&node), pending)?;
            node.attach(child_key, child, false)
                .map_err(|e| MaterialError::at(&path, e))?;
        }
        Ok(node)
    }

    /// Splits a node's table into a draft and its child specifications.
    fn draft<'s>(
        &self,
        key: &str,
        spec: &'s Table,
        mut bundle: PropertyBundle,
    ) -> Result<(NodeDraft, Vec<(&'s str, &'s Table)>), MaterialError> {
        let mut identity = Identity::default();
        let mut children = Vec::new();
        for (k, value) in spec {
            if k.starts_with('_') || value.is_unset() {
                continue;
            }
            if is_group_key(k) {
                bundle.merge_group_value(k, value, self.unknown_keys)?;
            } else if identity.absorb(k, value)? {
                // consumed
            } else if let Value::Table(child) = value {
                children.push((k.as_str(), child));
            } else {
                bundle.custom.insert(k.clone(), value.clone());
            }
        }
        let draft = NodeDraft {
            key: Some(key.to_string()),
            default_name: key.to_string(),
            identity,
            bundle,
            kind: None,
        };
        Ok((draft, children))
    }
}
