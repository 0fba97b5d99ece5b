//! Admins spec: the declarative input of the compiler
//!
//! Deserialized from the `kubesaw-admins.yaml` document. Permissions for
//! each cluster type are written inline under `host:` and `member:` keys of
//! a principal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterType;
use crate::{Error, Result};

/// Root of the admins spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminsSpec {
    /// Clusters of the installation
    #[serde(default)]
    pub clusters: Clusters,
    /// ServiceAccounts to generate
    #[serde(default)]
    pub service_accounts: Vec<ServiceAccountSpec>,
    /// Users to generate
    #[serde(default)]
    pub users: Vec<UserSpec>,
    /// Overrides the `sandbox-sre-<type>` ServiceAccount namespace convention
    #[serde(default)]
    pub default_service_accounts_namespace: DefaultServiceAccountsNamespace,
}

impl AdminsSpec {
    /// Parse an admins spec from YAML
    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Namespace ServiceAccounts land in when they set none themselves
    pub fn default_sa_namespace(&self, cluster_type: ClusterType) -> String {
        let configured = match cluster_type {
            ClusterType::Host => &self.default_service_accounts_namespace.host,
            ClusterType::Member => &self.default_service_accounts_namespace.member,
        };
        configured
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| cluster_type.default_sa_namespace())
    }
}

/// Host and member clusters
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Clusters {
    /// The host cluster
    #[serde(default)]
    pub host: ClusterConfig,
    /// Member clusters
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

/// Connection info for the host cluster
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterConfig {
    /// API server URL
    #[serde(default)]
    pub api: String,
}

/// A named member cluster
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberConfig {
    /// Member cluster name, referenced from selectors
    pub name: String,
    /// API server URL
    #[serde(default)]
    pub api: String,
}

/// Per-cluster-type ServiceAccount namespace overrides
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DefaultServiceAccountsNamespace {
    /// Host override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Member override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

/// Which member clusters a principal applies to
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    /// Member clusters to leave out
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skip_members: BTreeSet<String>,
    /// Member clusters to restrict to (empty means all)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub member_clusters: BTreeSet<String>,
}

/// Permissions keyed by cluster type
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissionsPerClusterType {
    /// Host cluster permissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<PermissionBindings>,
    /// Member cluster permissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<PermissionBindings>,
}

impl PermissionsPerClusterType {
    /// Permissions for a cluster type, if any were declared
    pub fn get(&self, cluster_type: ClusterType) -> Option<&PermissionBindings> {
        match cluster_type {
            ClusterType::Host => self.host.as_ref(),
            ClusterType::Member => self.member.as_ref(),
        }
    }
}

/// Bindings a principal holds on one cluster type
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionBindings {
    /// Namespaced bindings
    #[serde(default)]
    pub role_bindings: Vec<RoleBindings>,
    /// Cluster-wide bindings
    #[serde(default)]
    pub cluster_role_bindings: ClusterRoleBindings,
}

/// Roles and ClusterRoles bound within one namespace
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleBindings {
    /// Target namespace, required
    #[serde(default)]
    pub namespace: String,
    /// Role templates to instantiate and bind
    #[serde(default)]
    pub roles: Vec<String>,
    /// Pre-existing ClusterRoles to bind in the namespace
    #[serde(default)]
    pub cluster_roles: Vec<String>,
}

/// ClusterRoles bound cluster-wide
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBindings {
    /// ClusterRole names
    #[serde(default)]
    pub cluster_roles: Vec<String>,
}

/// A ServiceAccount principal
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccountSpec {
    /// ServiceAccount name
    pub name: String,
    /// Explicit namespace, overriding the cluster-type default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Member cluster selection
    #[serde(default)]
    pub selector: Selector,
    /// Permissions per cluster type
    #[serde(flatten)]
    pub permissions: PermissionsPerClusterType,
}

/// A User principal
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    /// User name
    pub name: String,
    /// External identity provider user IDs
    #[serde(default)]
    pub id: Vec<String>,
    /// Groups the user is added to
    #[serde(default)]
    pub groups: Vec<String>,
    /// Generate the User and its Identities even on cluster types where it
    /// holds no permissions
    #[serde(default)]
    pub all_clusters: bool,
    /// Member cluster selection
    #[serde(default)]
    pub selector: Selector,
    /// Permissions per cluster type
    #[serde(flatten)]
    pub permissions: PermissionsPerClusterType,
}
