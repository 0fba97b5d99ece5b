//! Input loading for `ksgen generate`
//!
//! - `--admins <file>`: the admins spec (YAML)
//! - `--roles <dir>`: role templates, `host.yaml` and `member.yaml` inside it
//!
//! A missing template file means the cluster type has no templates; any
//! role a principal references there then fails the run.

use std::path::Path;

use tracing::{debug, info};

use ksgen_manifests::cluster::ALL_CLUSTER_TYPES;
use ksgen_manifests::{AdminsSpec, ClusterType, RoleCatalog};

use crate::{Error, Result};

/// Read and parse the admins spec at `path`
pub fn load_admins(path: &Path) -> Result<AdminsSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let spec = AdminsSpec::from_yaml(&content)?;
    info!(
        path = %path.display(),
        service_accounts = spec.service_accounts.len(),
        users = spec.users.len(),
        members = spec.clusters.members.len(),
        "loaded admins spec"
    );
    Ok(spec)
}

/// File holding the templates of a cluster type within the roles directory
pub fn role_file_name(cluster_type: ClusterType) -> String {
    format!("{cluster_type}.yaml")
}

/// Load the role templates of every cluster type from `dir`
pub fn load_role_catalog(dir: &Path) -> Result<RoleCatalog> {
    if !dir.is_dir() {
        return Err(Error::validation(format!(
            "roles directory {} does not exist",
            dir.display()
        )));
    }

    let mut catalog = RoleCatalog::new();
    for cluster_type in ALL_CLUSTER_TYPES {
        let path = dir.join(role_file_name(cluster_type));
        if !path.exists() {
            debug!(path = %path.display(), "no role templates for cluster type");
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::read(&path, e))?;
        catalog.load_yaml(cluster_type, &path.display().to_string(), &content)?;
    }
    info!(dir = %dir.display(), roles = catalog.len(), "loaded role templates");
    Ok(catalog)
}
