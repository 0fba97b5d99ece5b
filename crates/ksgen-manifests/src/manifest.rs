//! Manifest types held by the object store
//!
//! RBAC objects and ServiceAccounts use the `k8s_openapi` types. The
//! OpenShift user API kinds (User, Identity, Group) are not part of
//! `k8s_openapi`, so they are declared here with the same metadata type.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::kind::ResourceKind;
use crate::{Error, Result};

// =============================================================================
// OpenShift user API kinds
// =============================================================================

/// OpenShift User
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Names of the Identities mapped to this user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
}

impl User {
    /// Create a cluster-scoped User
    pub fn new(name: impl Into<String>, labels: BTreeMap<String, String>) -> Self {
        Self {
            api_version: ResourceKind::User.api_version().to_string(),
            kind: ResourceKind::User.kind_str().to_string(),
            metadata: cluster_scoped_meta(name, labels),
            identities: Vec::new(),
        }
    }
}

/// Reference from an Identity to the User it maps to
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UserReference {
    /// User name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// User UID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

/// OpenShift Identity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Identity provider name (e.g. `rhd`)
    pub provider_name: String,
    /// User ID as known to the identity provider
    pub provider_user_name: String,
    /// The User this identity maps to
    #[serde(default)]
    pub user: UserReference,
}

impl Identity {
    /// Create an Identity mapping `provider_user_name` to `user`
    pub fn new(
        name: impl Into<String>,
        provider_name: impl Into<String>,
        provider_user_name: impl Into<String>,
        user: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            api_version: ResourceKind::Identity.api_version().to_string(),
            kind: ResourceKind::Identity.kind_str().to_string(),
            metadata: cluster_scoped_meta(name, labels),
            provider_name: provider_name.into(),
            provider_user_name: provider_user_name.into(),
            user: UserReference {
                name: user.into(),
                uid: String::new(),
            },
        }
    }
}

/// OpenShift Group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Member user names, kept sorted
    #[serde(default)]
    pub users: Vec<String>,
}

impl Group {
    /// Create a Group with the given members (sorted on construction)
    pub fn new(
        name: impl Into<String>,
        labels: BTreeMap<String, String>,
        mut users: Vec<String>,
    ) -> Self {
        users.sort();
        users.dedup();
        Self {
            api_version: ResourceKind::Group.api_version().to_string(),
            kind: ResourceKind::Group.kind_str().to_string(),
            metadata: cluster_scoped_meta(name, labels),
            users,
        }
    }
}

fn cluster_scoped_meta(name: impl Into<String>, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        labels: (!labels.is_empty()).then_some(labels),
        ..Default::default()
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// Any object the compiler can store and write
#[derive(Clone, Debug, PartialEq)]
pub enum Manifest {
    /// core/v1 ServiceAccount
    ServiceAccount(ServiceAccount),
    /// rbac/v1 Role
    Role(Role),
    /// rbac/v1 RoleBinding
    RoleBinding(RoleBinding),
    /// rbac/v1 ClusterRoleBinding
    ClusterRoleBinding(ClusterRoleBinding),
    /// user.openshift.io/v1 User
    User(User),
    /// user.openshift.io/v1 Identity
    Identity(Identity),
    /// user.openshift.io/v1 Group
    Group(Group),
}

impl Manifest {
    /// Registered kind of this object
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ServiceAccount(_) => ResourceKind::ServiceAccount,
            Self::Role(_) => ResourceKind::Role,
            Self::RoleBinding(_) => ResourceKind::RoleBinding,
            Self::ClusterRoleBinding(_) => ResourceKind::ClusterRoleBinding,
            Self::User(_) => ResourceKind::User,
            Self::Identity(_) => ResourceKind::Identity,
            Self::Group(_) => ResourceKind::Group,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::ServiceAccount(o) => &o.metadata,
            Self::Role(o) => &o.metadata,
            Self::RoleBinding(o) => &o.metadata,
            Self::ClusterRoleBinding(o) => &o.metadata,
            Self::User(o) => &o.metadata,
            Self::Identity(o) => &o.metadata,
            Self::Group(o) => &o.metadata,
        }
    }

    /// Object name, empty when unset
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Object namespace, empty when unset
    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    /// Mutable access to the Group inside, if this is one
    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Serialize into a generic YAML value
    pub fn to_yaml_value(&self) -> Result<serde_yaml::Value> {
        let value = match self {
            Self::ServiceAccount(o) => serde_yaml::to_value(o),
            Self::Role(o) => serde_yaml::to_value(o),
            Self::RoleBinding(o) => serde_yaml::to_value(o),
            Self::ClusterRoleBinding(o) => serde_yaml::to_value(o),
            Self::User(o) => serde_yaml::to_value(o),
            Self::Identity(o) => serde_yaml::to_value(o),
            Self::Group(o) => serde_yaml::to_value(o),
        };
        value.map_err(|e| Error::serialization_for_kind(self.kind().kind_str(), e.to_string()))
    }
}

macro_rules! impl_from_object {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Manifest {
                fn from(object: $variant) -> Self {
                    Self::$variant(object)
                }
            }
        )*
    };
}

impl_from_object!(
    ServiceAccount,
    Role,
    RoleBinding,
    ClusterRoleBinding,
    User,
    Identity,
    Group,
);
