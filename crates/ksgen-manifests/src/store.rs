//! Object store: the deduplicating accumulator of generated manifests
//!
//! Every generated object goes through [`ObjectStore::ensure`] or
//! [`ObjectStore::ensure_with`]. The store is keyed by storage path, a pure
//! function of (root, kind, namespace, name), so an object is stored at most
//! once per root.
//!
//! # Single-cluster mode
//!
//! When host and member run in the same cluster, an object produced for both
//! cluster types must only be applied once. The host pass runs first; when the
//! member pass produces an object whose identity already exists under the
//! host root, the host entry is moved to the shared `base/` root and both
//! passes resolve to it from then on.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::cluster::Root;
use crate::kind::ResourceKind;
use crate::manifest::Manifest;
use crate::{Error, Result};

/// Directory holding cluster-scoped objects within a root
pub const CLUSTER_SCOPED_DIR: &str = "cluster-scoped";

/// Directory holding namespaced objects within a root
pub const NAMESPACE_SCOPED_DIR: &str = "namespace-scoped";

/// Logical identity of an object, independent of the root storing it
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Resource kind
    pub kind: ResourceKind,
    /// Namespace, empty for cluster-scoped kinds
    pub namespace: String,
    /// Object name
    pub name: String,
}

impl ObjectKey {
    /// Build the key for a manifest, validating its identity fields
    pub fn for_manifest(manifest: &Manifest) -> Result<Self> {
        let kind = manifest.kind();
        let name = manifest.name();
        let namespace = manifest.namespace();

        if name.is_empty() {
            return Err(Error::invalid_object(kind.kind_str(), "name is empty"));
        }
        if name.contains('/') || namespace.contains('/') {
            return Err(Error::invalid_object(
                kind.kind_str(),
                format!("'{namespace}/{name}' contains a path separator"),
            ));
        }
        if kind.namespaced() && namespace.is_empty() {
            return Err(Error::invalid_object(
                kind.kind_str(),
                format!("'{name}' is namespaced but has no namespace"),
            ));
        }
        if !kind.namespaced() && !namespace.is_empty() {
            return Err(Error::invalid_object(
                kind.kind_str(),
                format!("'{name}' is cluster-scoped but has namespace '{namespace}'"),
            ));
        }

        Ok(Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    /// Path of the object relative to its root directory
    pub fn relative_path(&self) -> PathBuf {
        let file = format!("{}.yaml", self.name);
        if self.kind.namespaced() {
            [
                NAMESPACE_SCOPED_DIR,
                self.namespace.as_str(),
                self.kind.plural(),
                file.as_str(),
            ]
            .iter()
            .collect()
        } else {
            [CLUSTER_SCOPED_DIR, self.kind.plural(), file.as_str()]
                .iter()
                .collect()
        }
    }
}

/// Storage location: an object identity under a specific root
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoragePath {
    /// Root the object is materialized under
    pub root: Root,
    /// Object identity
    pub key: ObjectKey,
}

impl StoragePath {
    /// File path relative to the output directory
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.root.dir_name()).join(self.key.relative_path())
    }
}

/// Accumulates generated objects for one compiler run.
#[derive(Debug, Default)]
pub struct ObjectStore {
    single_cluster: bool,
    entries: BTreeMap<StoragePath, Manifest>,
}

impl ObjectStore {
    /// Create an empty store
    ///
    /// `single_cluster` enables promotion of objects shared by host and
    /// member into the `base/` root.
    pub fn new(single_cluster: bool) -> Self {
        Self {
            single_cluster,
            entries: BTreeMap::new(),
        }
    }

    /// Store `object` under `root` unless its identity is already stored.
    ///
    /// An existing entry is left untouched: the first content wins.
    pub fn ensure(&mut self, root: &Root, object: impl Into<Manifest>) -> Result<()> {
        self.upsert(root, object.into(), None::<fn(&mut Manifest) -> Result<bool>>)
    }

    /// Store `object` under `root`, reconciling an existing entry with `update`.
    ///
    /// `update` receives a copy of the stored entry and returns whether it
    /// modified it. The copy replaces the entry only when it reports a
    /// modification; on `Ok(false)` or `Err` the store is unchanged.
    pub fn ensure_with<F>(
        &mut self,
        root: &Root,
        object: impl Into<Manifest>,
        update: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Manifest) -> Result<bool>,
    {
        self.upsert(root, object.into(), Some(update))
    }

    fn upsert<F>(&mut self, root: &Root, object: Manifest, update: Option<F>) -> Result<()>
    where
        F: FnOnce(&mut Manifest) -> Result<bool>,
    {
        let key = ObjectKey::for_manifest(&object)?;
        let target = self.resolve_target(root, &key);

        match self.entries.get(&target) {
            Some(existing) => {
                let Some(update) = update else {
                    return Ok(());
                };
                let mut copy = existing.clone();
                if update(&mut copy)? {
                    debug!(path = %target.to_path().display(), "updated existing object");
                    self.entries.insert(target, copy);
                }
            }
            None => {
                self.entries.insert(target, object);
            }
        }
        Ok(())
    }

    /// Pick the storage path for `key` produced under `root`, promoting the
    /// other cluster type's entry to base when both produce it.
    fn resolve_target(&mut self, root: &Root, key: &ObjectKey) -> StoragePath {
        let default_path = StoragePath {
            root: root.clone(),
            key: key.clone(),
        };
        if !self.single_cluster {
            return default_path;
        }
        let Some(other_root) = root.other_type() else {
            return default_path;
        };

        let base_path = StoragePath {
            root: Root::Base,
            key: key.clone(),
        };
        if self.entries.contains_key(&base_path) {
            return base_path;
        }

        let other_path = StoragePath {
            root: other_root,
            key: key.clone(),
        };
        if let Some(existing) = self.entries.remove(&other_path) {
            debug!(
                kind = %key.kind,
                namespace = %key.namespace,
                name = %key.name,
                from = %other_path.root,
                "promoting object to base"
            );
            self.entries.insert(base_path.clone(), existing);
            return base_path;
        }

        default_path
    }

    /// Look up a stored object
    pub fn get(
        &self,
        root: &Root,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Option<&Manifest> {
        self.entries.get(&StoragePath {
            root: root.clone(),
            key: ObjectKey {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
        })
    }

    /// Iterate all entries in storage path order
    pub fn iter(&self) -> impl Iterator<Item = (&StoragePath, &Manifest)> {
        self.entries.iter()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of objects stored under `root`
    pub fn count_in(&self, root: &Root) -> usize {
        self.entries.keys().filter(|p| &p.root == root).count()
    }
}
