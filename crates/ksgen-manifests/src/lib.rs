//! Manifest compiler for KubeSaw admin access specs
//!
//! Turns a declarative list of ServiceAccounts and Users, together with the
//! permissions they hold on host and member clusters, into a deterministic
//! tree of Kubernetes manifests plus the `kustomization.yaml` indexes that
//! tie the tree together.
//!
//! # Pipeline
//!
//! ```text
//! AdminsSpec ──► ClusterDriver ──► PermissionManager ──► ObjectStore ──► ManifestTree ──► FileWriter
//!                                     │         │
//!                              RoleLibrary  SubjectFactory
//! ```
//!
//! Everything up to [`ManifestTree`] is pure and in-memory. The only side
//! effects happen in the [`FileWriter`] the caller hands to
//! [`ManifestTree::write_to`].

pub mod admins;
pub mod cluster;
pub mod driver;
pub mod error;
pub mod fs;
pub mod groups;
pub mod kind;
pub mod manifest;
pub mod permissions;
pub mod roles;
pub mod selector;
pub mod store;
pub mod subject;
pub mod tree;
pub mod yaml;

pub use admins::AdminsSpec;
pub use cluster::{ClusterTarget, ClusterType, Root};
pub use driver::ClusterDriver;
pub use error::Error;
pub use fs::{FileWriter, MemoryWriter};
pub use kind::ResourceKind;
pub use manifest::Manifest;
pub use roles::{RoleCatalog, RoleLibrary};
pub use store::ObjectStore;
pub use tree::ManifestTree;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label key stamped on every generated object
pub const PROVIDER_LABEL_KEY: &str = "provider";

/// Value of [`PROVIDER_LABEL_KEY`] on generated objects
pub const PROVIDER_LABEL_VALUE: &str = "ksgen";

/// Labels carried by every generated object.
pub fn default_labels() -> std::collections::BTreeMap<String, String> {
    std::collections::BTreeMap::from([(
        PROVIDER_LABEL_KEY.to_string(),
        PROVIDER_LABEL_VALUE.to_string(),
    )])
}
