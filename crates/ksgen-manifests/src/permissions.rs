//! Permission manager: RBAC bindings for one principal
//!
//! For a cluster pass the manager turns the principal's declared bindings
//! into Roles, RoleBindings and ClusterRoleBindings, all pointing at the one
//! Subject the principal's factory produced for that pass.

use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::admins::{PermissionBindings, PermissionsPerClusterType};
use crate::cluster::{ClusterTarget, ClusterType};
use crate::kind::{ResourceKind, RBAC_API_GROUP};
use crate::roles::{ensure_role, RoleLibrary};
use crate::store::ObjectStore;
use crate::subject::SubjectFactory;
use crate::{default_labels, Error, Result};

const CLUSTER_ROLE_KIND: &str = "ClusterRole";

/// Name of a RoleBinding to a Role template instance
pub fn role_binding_name(role: &str, subject: &str, cluster_type: ClusterType) -> String {
    format!("{role}-{subject}-{cluster_type}")
}

/// Name of a RoleBinding or ClusterRoleBinding to a ClusterRole
pub fn cluster_role_binding_name(
    cluster_role: &str,
    subject: &str,
    cluster_type: ClusterType,
) -> String {
    format!("clusterrole-{cluster_role}-{subject}-{cluster_type}")
}

/// Emits the RBAC objects of a single principal
pub struct PermissionManager<'a> {
    library: &'a dyn RoleLibrary,
    subjects: &'a dyn SubjectFactory,
}

impl<'a> PermissionManager<'a> {
    /// Manager binding roles from `library` to subjects made by `subjects`
    pub fn new(library: &'a dyn RoleLibrary, subjects: &'a dyn SubjectFactory) -> Self {
        Self { library, subjects }
    }

    /// Ensure every binding the principal declares for `target`'s cluster
    /// type. Does nothing when the principal declares none.
    pub fn ensure_permissions(
        &self,
        store: &mut ObjectStore,
        target: &ClusterTarget,
        permissions: &PermissionsPerClusterType,
    ) -> Result<()> {
        let Some(bindings) = permissions.get(target.cluster_type) else {
            return Ok(());
        };
        self.ensure_bindings(store, target, bindings)
    }

    fn ensure_bindings(
        &self,
        store: &mut ObjectStore,
        target: &ClusterTarget,
        bindings: &PermissionBindings,
    ) -> Result<()> {
        let base_name = self.subjects.base_name();
        let cluster_type = target.cluster_type;
        let root = target.root();

        // Namespaces are checked before anything is stored for the principal.
        if bindings.role_bindings.iter().any(|rb| rb.namespace.is_empty()) {
            return Err(Error::validation_for(base_name, "namespace not defined"));
        }
        if !bindings.cluster_role_bindings.cluster_roles.is_empty()
            && self.subjects.kind() == ResourceKind::ServiceAccount
            && self.subjects.namespace().unwrap_or_default().is_empty()
        {
            return Err(Error::validation_for(
                base_name,
                "ServiceAccount subject has no namespace for ClusterRoleBinding",
            ));
        }

        let subject = self
            .subjects
            .create_subject(store, target, &default_labels())?;

        for rb in &bindings.role_bindings {
            for role in &rb.roles {
                let role_name = ensure_role(store, self.library, role, &rb.namespace, target)?;
                let binding = role_binding(
                    role_binding_name(role, base_name, cluster_type),
                    &rb.namespace,
                    role_ref(ResourceKind::Role.kind_str(), role_name),
                    &subject,
                );
                store.ensure(&root, binding)?;
            }
            for cluster_role in &rb.cluster_roles {
                let binding = role_binding(
                    cluster_role_binding_name(cluster_role, base_name, cluster_type),
                    &rb.namespace,
                    role_ref(CLUSTER_ROLE_KIND, cluster_role),
                    &subject,
                );
                store.ensure(&root, binding)?;
            }
        }

        let cluster_roles = &bindings.cluster_role_bindings.cluster_roles;
        for cluster_role in cluster_roles {
            let binding = ClusterRoleBinding {
                metadata: ObjectMeta {
                    name: Some(cluster_role_binding_name(cluster_role, base_name, cluster_type)),
                    labels: Some(default_labels()),
                    ..Default::default()
                },
                role_ref: role_ref(CLUSTER_ROLE_KIND, cluster_role),
                subjects: Some(vec![subject.clone()]),
            };
            store.ensure(&root, binding)?;
        }

        debug!(
            principal = base_name,
            target = %target,
            role_bindings = bindings.role_bindings.len(),
            cluster_role_bindings = cluster_roles.len(),
            "ensured permissions"
        );
        Ok(())
    }
}

fn role_ref(kind: &str, name: impl Into<String>) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: kind.to_string(),
        name: name.into(),
    }
}

fn role_binding(
    name: String,
    namespace: &str,
    role_ref: RoleRef,
    subject: &Subject,
) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace.to_string()),
            labels: Some(default_labels()),
            ..Default::default()
        },
        role_ref,
        subjects: Some(vec![subject.clone()]),
    }
}
