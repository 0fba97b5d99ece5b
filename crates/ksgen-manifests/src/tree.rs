//! Manifest tree: rendered files plus their kustomization indexes
//!
//! Every directory under a root gets a `kustomization.yaml` listing the
//! manifests and subdirectories directly inside it. References propagate up
//! the directory ancestry to each root directory; the output directory
//! itself gets no index. When a `base/` root exists, the `member/` index also
//! references `../base`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::cluster::Root;
use crate::fs::FileWriter;
use crate::store::ObjectStore;
use crate::yaml::{render, render_manifest};
use crate::Result;

/// File name of a directory index
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

const KUSTOMIZATION_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
const COMPONENT_API_VERSION: &str = "kustomize.config.k8s.io/v1alpha1";

/// A `kustomization.yaml` document
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    /// Kustomize API version
    pub api_version: String,
    /// `Kustomization`, or `Component` for member cluster roots
    pub kind: String,
    /// Referenced files and subdirectories
    pub resources: Vec<String>,
}

impl Kustomization {
    fn new(component: bool, resources: &BTreeSet<String>) -> Self {
        let (api_version, kind) = if component {
            (COMPONENT_API_VERSION, "Component")
        } else {
            (KUSTOMIZATION_API_VERSION, "Kustomization")
        };
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            resources: resources.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Directory {
    component: bool,
    resources: BTreeSet<String>,
}

/// Directory ancestry of all stored objects, keyed by relative path
#[derive(Debug, Default)]
struct DirectoryTree {
    dirs: BTreeMap<PathBuf, Directory>,
}

impl DirectoryTree {
    /// Reference `file` from its directory and each directory from its
    /// parent, stopping at the root directory.
    fn add_file(&mut self, root: &Root, file: &Path) {
        let root_dir = PathBuf::from(root.dir_name());
        let mut child = file.to_path_buf();
        while let Some(parent) = child.parent() {
            if parent.as_os_str().is_empty() {
                break;
            }
            let Some(name) = child.file_name() else {
                break;
            };
            let dir = self.dirs.entry(parent.to_path_buf()).or_default();
            dir.component = parent == root_dir.as_path() && root.is_component();
            dir.resources.insert(name.to_string_lossy().into_owned());
            child = parent.to_path_buf();
        }
    }

    fn add_reference(&mut self, dir: PathBuf, resource: String) {
        self.dirs.entry(dir).or_default().resources.insert(resource);
    }
}

/// Rendered output of one compilation run
#[derive(Debug, Default)]
pub struct ManifestTree {
    files: BTreeMap<PathBuf, String>,
}

impl ManifestTree {
    /// Render every stored object and compute all directory indexes
    pub fn build(store: &ObjectStore) -> Result<Self> {
        let mut files = BTreeMap::new();
        let mut tree = DirectoryTree::default();
        let mut has_base = false;

        for (storage_path, manifest) in store.iter() {
            let path = storage_path.to_path();
            tree.add_file(&storage_path.root, &path);
            has_base |= storage_path.root == Root::Base;
            files.insert(path, render_manifest(manifest)?);
        }

        if has_base {
            tree.add_reference(
                PathBuf::from(Root::Member.dir_name()),
                format!("../{}", Root::Base.dir_name()),
            );
        }

        for (dir, entry) in &tree.dirs {
            let index = Kustomization::new(entry.component, &entry.resources);
            files.insert(dir.join(KUSTOMIZATION_FILE), render(&index)?);
        }

        debug!(
            manifests = store.len(),
            indexes = tree.dirs.len(),
            "built manifest tree"
        );
        Ok(Self { files })
    }

    /// Contents of a generated file
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Every generated file in path order
    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    /// Number of generated files, indexes included
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was generated
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Flush every file to `writer`
    pub fn write_to(&self, writer: &mut dyn FileWriter) -> Result<()> {
        for (path, contents) in self.files() {
            writer.write_file(path, contents.as_bytes())?;
        }
        info!(files = self.files.len(), "wrote manifest tree");
        Ok(())
    }
}
