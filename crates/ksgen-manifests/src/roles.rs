//! Role templates and their per-cluster-type instantiation
//!
//! Role templates are bare, namespace-less `Role` objects kept per cluster
//! type. Binding a template into a namespace copies it, stamps the namespace
//! and provider label, and suffixes the name with the cluster type so host
//! and member copies never collide when written side by side.

use std::collections::BTreeMap;

use k8s_openapi::api::rbac::v1::Role;
use serde::Deserialize;
use tracing::debug;

use crate::cluster::{ClusterTarget, ClusterType};
use crate::kind::ResourceKind;
use crate::store::ObjectStore;
use crate::{default_labels, Error, Result};

/// Source of Role templates
pub trait RoleLibrary {
    /// Look up the template named `name` for `cluster_type`.
    ///
    /// Returns `Ok(None)` when no such template exists.
    fn resolve_role(&self, cluster_type: ClusterType, name: &str) -> Result<Option<Role>>;
}

/// In-memory Role template catalog keyed by cluster type and name
#[derive(Clone, Debug, Default)]
pub struct RoleCatalog {
    roles: BTreeMap<(ClusterType, String), Role>,
}

impl RoleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. Fails if the template has no name or the name is taken.
    pub fn insert(&mut self, cluster_type: ClusterType, role: Role) -> Result<()> {
        let name = role.metadata.name.clone().unwrap_or_default();
        if name.is_empty() {
            return Err(Error::invalid_object(
                ResourceKind::Role.kind_str(),
                format!("{cluster_type} role template has no name"),
            ));
        }
        let key = (cluster_type, name);
        if self.roles.contains_key(&key) {
            return Err(Error::invalid_object(
                ResourceKind::Role.kind_str(),
                format!("duplicate {cluster_type} role template '{}'", key.1),
            ));
        }
        self.roles.insert(key, role);
        Ok(())
    }

    /// Load every document of a multi-document YAML stream as templates for
    /// `cluster_type`. `source_name` is used in error messages.
    pub fn load_yaml(
        &mut self,
        cluster_type: ClusterType,
        source_name: &str,
        input: &str,
    ) -> Result<usize> {
        let mut loaded = 0;
        for document in serde_yaml::Deserializer::from_str(input) {
            let value = serde_yaml::Value::deserialize(document).map_err(|e| {
                Error::serialization_for_kind(
                    ResourceKind::Role.kind_str(),
                    format!("{source_name}: {e}"),
                )
            })?;
            if value.is_null() {
                continue;
            }

            let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
            if ResourceKind::from_kind_str(kind) != Some(ResourceKind::Role) {
                return Err(Error::ambiguous_kind(
                    kind,
                    ResourceKind::Role.kind_str(),
                    source_name,
                ));
            }

            let role: Role = serde_yaml::from_value(value).map_err(|e| {
                Error::serialization_for_kind(
                    ResourceKind::Role.kind_str(),
                    format!("{source_name}: {e}"),
                )
            })?;
            self.insert(cluster_type, role)?;
            loaded += 1;
        }
        debug!(cluster_type = %cluster_type, source = source_name, loaded, "loaded role templates");
        Ok(loaded)
    }

    /// Number of templates across all cluster types
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleLibrary for RoleCatalog {
    fn resolve_role(&self, cluster_type: ClusterType, name: &str) -> Result<Option<Role>> {
        Ok(self.roles.get(&(cluster_type, name.to_string())).cloned())
    }
}

/// Name a role template gets once instantiated for a cluster type
pub fn role_name(role: &str, cluster_type: ClusterType) -> String {
    format!("{role}-{cluster_type}")
}

/// Instantiate the `role` template into `namespace` and store it.
///
/// Returns the name of the stored Role. A template missing from the library
/// is an error: it means the admins spec and the catalog have drifted apart.
pub fn ensure_role(
    store: &mut ObjectStore,
    library: &dyn RoleLibrary,
    role: &str,
    namespace: &str,
    target: &ClusterTarget,
) -> Result<String> {
    let cluster_type = target.cluster_type;
    let mut instance = library
        .resolve_role(cluster_type, role)?
        .ok_or_else(|| Error::role_not_found(role, cluster_type))?;

    let name = role_name(role, cluster_type);
    instance.metadata.name = Some(name.clone());
    instance.metadata.namespace = Some(namespace.to_string());
    instance
        .metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .extend(default_labels());

    store.ensure(&target.root(), instance)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Root;
    use crate::manifest::Manifest;
    use k8s_openapi::api::rbac::v1::PolicyRule;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::rstest;

    const HOST_ROLES: &str = r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: Role
metadata:
  name: install-operator
rules:
  - apiGroups: [operators.coreos.com]
    resources: [subscriptions]
    verbs: [get, create]
---
apiVersion: rbac.authorization.k8s.io/v1
kind: Role
metadata:
  name: restart-deployment
rules:
  - apiGroups: [apps]
    resources: [deployments]
    verbs: [patch]
"#;

    fn template(name: &str) -> Role {
        Role {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            rules: Some(vec![PolicyRule {
                api_groups: Some(vec![String::new()]),
                resources: Some(vec!["pods".to_string()]),
                verbs: vec!["get".to_string()],
                ..Default::default()
            }]),
        }
    }

    fn catalog() -> RoleCatalog {
        let mut catalog = RoleCatalog::new();
        catalog
            .insert(ClusterType::Host, template("install-operator"))
            .unwrap();
        catalog
            .insert(ClusterType::Member, template("install-operator"))
            .unwrap();
        catalog
    }

    // =========================================================================
    // Story: Catalog Loading
    // =========================================================================

    #[test]
    fn story_loads_multi_document_templates() {
        let mut catalog = RoleCatalog::new();
        let loaded = catalog
            .load_yaml(ClusterType::Host, "host.yaml", HOST_ROLES)
            .unwrap();
        assert_eq!(loaded, 2);

        let role = catalog
            .resolve_role(ClusterType::Host, "restart-deployment")
            .unwrap()
            .unwrap();
        assert_eq!(role.rules.unwrap()[0].verbs, vec!["patch"]);
        assert!(catalog
            .resolve_role(ClusterType::Member, "restart-deployment")
            .unwrap()
            .is_none());
    }

    #[test]
    fn story_rejects_non_role_documents() {
        let input = r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: not-a-role
"#;
        let err = RoleCatalog::new()
            .load_yaml(ClusterType::Member, "member.yaml", input)
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousKind { .. }));
        assert!(err.to_string().contains("member.yaml"));
    }

    #[test]
    fn story_rejects_duplicate_and_unnamed_templates() {
        let mut catalog = catalog();
        let err = catalog
            .insert(ClusterType::Host, template("install-operator"))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        let err = catalog.insert(ClusterType::Host, template("")).unwrap_err();
        assert!(err.to_string().contains("has no name"));
    }

    // =========================================================================
    // Story: Role Instantiation
    // =========================================================================

    #[rstest]
    #[case(ClusterType::Host, "install-operator-host")]
    #[case(ClusterType::Member, "install-operator-member")]
    fn story_role_names_carry_cluster_type(
        #[case] cluster_type: ClusterType,
        #[case] expected: &str,
    ) {
        let mut store = ObjectStore::new(false);
        let target = ClusterTarget::new(cluster_type);
        let name = ensure_role(
            &mut store,
            &catalog(),
            "install-operator",
            "toolchain-host-operator",
            &target,
        )
        .unwrap();
        assert_eq!(name, expected);

        let Some(Manifest::Role(role)) = store.get(
            &target.root(),
            ResourceKind::Role,
            "toolchain-host-operator",
            expected,
        ) else {
            panic!("role should be stored");
        };
        assert_eq!(
            role.metadata.labels.as_ref().unwrap().get("provider"),
            Some(&"ksgen".to_string())
        );
        assert!(role.rules.is_some());
    }

    #[test]
    fn story_missing_role_is_fatal() {
        let mut store = ObjectStore::new(false);
        let err = ensure_role(
            &mut store,
            &catalog(),
            "does-not-exist",
            "ns",
            &ClusterTarget::new(ClusterType::Host),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no such role with the name 'does-not-exist' defined"
        );
        assert!(store.is_empty());
    }

    #[test]
    fn story_template_reused_across_namespaces() {
        let mut store = ObjectStore::new(false);
        let target = ClusterTarget::new(ClusterType::Host);
        let library = catalog();
        ensure_role(&mut store, &library, "install-operator", "ns-a", &target).unwrap();
        ensure_role(&mut store, &library, "install-operator", "ns-b", &target).unwrap();
        ensure_role(&mut store, &library, "install-operator", "ns-a", &target).unwrap();

        assert_eq!(store.count_in(&Root::Host), 2);
    }
}
