//! Registry of the resource kinds the compiler emits
//!
//! Maps each kind to its plural resource name, scope, and API version so the
//! object store and writer never need a serialization-framework lookup to
//! place an object.

use std::fmt;

/// Kinds of objects produced by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// ServiceAccount (core/v1)
    ServiceAccount,
    /// User (user.openshift.io/v1)
    User,
    /// Identity (user.openshift.io/v1)
    Identity,
    /// Group (user.openshift.io/v1)
    Group,
    /// Role (rbac.authorization.k8s.io/v1)
    Role,
    /// RoleBinding (rbac.authorization.k8s.io/v1)
    RoleBinding,
    /// ClusterRoleBinding (rbac.authorization.k8s.io/v1)
    ClusterRoleBinding,
}

/// All ResourceKind variants for iteration.
pub const ALL_RESOURCE_KINDS: &[ResourceKind] = &[
    ResourceKind::ServiceAccount,
    ResourceKind::User,
    ResourceKind::Identity,
    ResourceKind::Group,
    ResourceKind::Role,
    ResourceKind::RoleBinding,
    ResourceKind::ClusterRoleBinding,
];

/// API group of the RBAC kinds
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

impl ResourceKind {
    /// Kubernetes Kind string
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "ServiceAccount",
            Self::User => "User",
            Self::Identity => "Identity",
            Self::Group => "Group",
            Self::Role => "Role",
            Self::RoleBinding => "RoleBinding",
            Self::ClusterRoleBinding => "ClusterRoleBinding",
        }
    }

    /// Lowercase plural resource name, used as a directory name
    pub fn plural(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "serviceaccounts",
            Self::User => "users",
            Self::Identity => "identities",
            Self::Group => "groups",
            Self::Role => "roles",
            Self::RoleBinding => "rolebindings",
            Self::ClusterRoleBinding => "clusterrolebindings",
        }
    }

    /// Whether objects of this kind live in a namespace
    pub fn namespaced(&self) -> bool {
        matches!(self, Self::ServiceAccount | Self::Role | Self::RoleBinding)
    }

    /// `apiVersion` written into manifests of this kind
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "v1",
            Self::User | Self::Identity | Self::Group => "user.openshift.io/v1",
            Self::Role | Self::RoleBinding | Self::ClusterRoleBinding => {
                "rbac.authorization.k8s.io/v1"
            }
        }
    }

    /// Resolve a Kind string back to a registered kind
    pub fn from_kind_str(kind: &str) -> Option<Self> {
        ALL_RESOURCE_KINDS
            .iter()
            .copied()
            .find(|k| k.kind_str() == kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_str())
    }
}
