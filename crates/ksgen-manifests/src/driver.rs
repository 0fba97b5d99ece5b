//! Cluster driver: one compilation run over every cluster pass
//!
//! Passes run in a fixed order: host, the shared `member/` root, then one
//! pass per configured member cluster. Principals without a member selector
//! land in `member/`; principals with one are compiled into the component of
//! each member cluster they select.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::admins::{AdminsSpec, Selector};
use crate::cluster::{ClusterTarget, ClusterType, ALL_CLUSTER_TYPES};
use crate::permissions::PermissionManager;
use crate::roles::RoleLibrary;
use crate::store::ObjectStore;
use crate::subject::{ServiceAccountFactory, SubjectFactory, UserFactory};
use crate::{default_labels, Result};

/// Compiles an [`AdminsSpec`] into an [`ObjectStore`]
pub struct ClusterDriver<'a> {
    spec: &'a AdminsSpec,
    library: &'a dyn RoleLibrary,
    single_cluster: bool,
}

impl<'a> ClusterDriver<'a> {
    /// Driver resolving role templates from `library`
    pub fn new(spec: &'a AdminsSpec, library: &'a dyn RoleLibrary) -> Self {
        Self {
            spec,
            library,
            single_cluster: false,
        }
    }

    /// Merge objects shared by host and member into `base/`
    pub fn single_cluster(mut self, single_cluster: bool) -> Self {
        self.single_cluster = single_cluster;
        self
    }

    /// Every pass of this run, in processing order
    pub fn targets(&self) -> Vec<ClusterTarget> {
        let mut targets: Vec<ClusterTarget> =
            ALL_CLUSTER_TYPES.iter().map(|ct| ClusterTarget::new(*ct)).collect();
        targets.extend(
            self.spec
                .clusters
                .members
                .iter()
                .map(|m| ClusterTarget::member_cluster(&m.name)),
        );
        targets
    }

    /// Run every pass and return the populated store
    pub fn compile(&self) -> Result<ObjectStore> {
        self.warn_unknown_members();

        let mut store = ObjectStore::new(self.single_cluster);
        for target in self.targets() {
            let before = store.len();
            self.compile_target(&mut store, &target)?;
            info!(
                target = %target,
                objects = store.len() - before,
                "compiled cluster pass"
            );
        }
        info!(
            objects = store.len(),
            single_cluster = self.single_cluster,
            "compilation finished"
        );
        Ok(store)
    }

    fn compile_target(&self, store: &mut ObjectStore, target: &ClusterTarget) -> Result<()> {
        let cluster_type = target.cluster_type;

        for sa in &self.spec.service_accounts {
            if !applies_to(&sa.selector, target) {
                debug!(principal = %sa.name, target = %target, "selector skips service account");
                continue;
            }
            let namespace = sa
                .namespace
                .clone()
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| self.spec.default_sa_namespace(cluster_type));
            let factory = ServiceAccountFactory::new(&sa.name, namespace);
            PermissionManager::new(self.library, &factory).ensure_permissions(
                store,
                target,
                &sa.permissions,
            )?;
        }

        for user in &self.spec.users {
            if !applies_to(&user.selector, target) {
                debug!(principal = %user.name, target = %target, "selector skips user");
                continue;
            }
            let factory = UserFactory::new(&user.name, user.id.clone(), user.groups.clone());
            if user.permissions.get(cluster_type).is_some() {
                PermissionManager::new(self.library, &factory).ensure_permissions(
                    store,
                    target,
                    &user.permissions,
                )?;
            } else if user.all_clusters {
                factory.create_subject(store, target, &default_labels())?;
            }
        }
        Ok(())
    }

    fn warn_unknown_members(&self) {
        let known: BTreeSet<&str> = self
            .spec
            .clusters
            .members
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        let selectors = self
            .spec
            .service_accounts
            .iter()
            .map(|sa| (&sa.name, &sa.selector))
            .chain(self.spec.users.iter().map(|u| (&u.name, &u.selector)));

        for (principal, selector) in selectors {
            for member in selector.skip_members.iter().chain(&selector.member_clusters) {
                if !known.contains(member.as_str()) {
                    warn!(
                        principal = %principal,
                        member = %member,
                        "selector names an unknown member cluster"
                    );
                }
            }
        }
    }
}

/// Whether a principal with `selector` is compiled in the `target` pass.
///
/// Host passes ignore selectors. The shared member pass takes untargeted
/// principals; per-member passes take targeted ones the selector keeps.
fn applies_to(selector: &Selector, target: &ClusterTarget) -> bool {
    match (target.cluster_type, &target.member_cluster) {
        (ClusterType::Host, _) => true,
        (ClusterType::Member, None) => !selector.is_targeted() && !selector.should_skip(""),
        (ClusterType::Member, Some(name)) => selector.is_targeted() && !selector.should_skip(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admins::{PermissionBindings, PermissionsPerClusterType, RoleBindings};
    use crate::cluster::Root;
    use crate::kind::ResourceKind;
    use crate::roles::RoleCatalog;

    const ROLES: &str = r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: Role
metadata:
  name: install-operator
rules:
  - apiGroups: [operators.coreos.com]
    resources: [subscriptions]
    verbs: [get, create]
"#;

    fn catalog() -> RoleCatalog {
        let mut catalog = RoleCatalog::new();
        catalog.load_yaml(ClusterType::Host, "host.yaml", ROLES).unwrap();
        catalog
            .load_yaml(ClusterType::Member, "member.yaml", ROLES)
            .unwrap();
        catalog
    }

    fn spec(input: &str) -> AdminsSpec {
        AdminsSpec::from_yaml(input).unwrap()
    }

    fn paths(store: &ObjectStore) -> Vec<String> {
        store
            .iter()
            .map(|(p, _)| p.to_path().display().to_string())
            .collect()
    }

    // =========================================================================
    // Story: Pass Ordering
    // =========================================================================

    #[test]
    fn story_targets_run_host_then_member_then_each_member_cluster() {
        let spec = spec(
            r#"
clusters:
  members:
    - name: m1
    - name: m2
"#,
        );
        let library = catalog();
        let targets: Vec<String> = ClusterDriver::new(&spec, &library)
            .targets()
            .iter()
            .map(|t| t.root().dir_name())
            .collect();
        assert_eq!(targets, vec!["host", "member", "member-m1", "member-m2"]);
    }

    // =========================================================================
    // Story: Selectors
    // =========================================================================

    #[test]
    fn story_selected_service_account_lands_in_member_components() {
        let spec = spec(
            r#"
clusters:
  members:
    - name: m1
    - name: m2
    - name: m3
serviceAccounts:
  - name: bob
    selector:
      skipMembers: [m2]
    member:
      clusterRoleBindings:
        clusterRoles: [view]
  - name: alice
    member:
      clusterRoleBindings:
        clusterRoles: [view]
"#,
        );
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library).compile().unwrap();

        let all = paths(&store);
        assert!(all.contains(
            &"member-m1/cluster-scoped/clusterrolebindings/clusterrole-view-bob-member.yaml"
                .to_string()
        ));
        assert!(all.contains(
            &"member-m3/namespace-scoped/sandbox-sre-member/serviceaccounts/bob.yaml".to_string()
        ));
        assert_eq!(store.count_in(&Root::MemberCluster("m2".into())), 0);
        assert!(all.contains(
            &"member/cluster-scoped/clusterrolebindings/clusterrole-view-alice-member.yaml"
                .to_string()
        ));
        assert!(!all.iter().any(|p| p.starts_with("member/") && p.contains("bob")));
    }

    #[test]
    fn story_host_pass_ignores_selectors() {
        let spec = spec(
            r#"
serviceAccounts:
  - name: bob
    selector:
      memberClusters: [m1]
    host:
      clusterRoleBindings:
        clusterRoles: [view]
"#,
        );
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library).compile().unwrap();
        assert_eq!(store.count_in(&Root::Host), 2);
    }

    // =========================================================================
    // Story: Users
    // =========================================================================

    #[test]
    fn story_all_clusters_user_exists_without_permissions() {
        let spec = spec(
            r#"
users:
  - name: david
    id: ["12345"]
    groups: [crtadmins]
    allClusters: true
    host:
      clusterRoleBindings:
        clusterRoles: [view]
  - name: eve
    id: ["999"]
    groups: [crtadmins]
    host:
      clusterRoleBindings:
        clusterRoles: [view]
"#,
        );
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library).compile().unwrap();

        assert!(store
            .get(&Root::Member, ResourceKind::User, "", "david")
            .is_some());
        assert!(store
            .get(&Root::Member, ResourceKind::Identity, "", "rhd:12345")
            .is_some());
        assert!(store
            .get(&Root::Member, ResourceKind::User, "", "eve")
            .is_none());
        assert!(store
            .get(&Root::Host, ResourceKind::User, "", "eve")
            .is_some());
    }

    // =========================================================================
    // Story: Single-Cluster Mode
    // =========================================================================

    #[test]
    fn story_single_cluster_promotes_shared_user_to_base() {
        let spec = spec(
            r#"
users:
  - name: david
    id: ["12345"]
    groups: [crtadmins]
    allClusters: true
"#,
        );
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library)
            .single_cluster(true)
            .compile()
            .unwrap();

        assert_eq!(store.count_in(&Root::Host), 0);
        assert_eq!(store.count_in(&Root::Member), 0);
        assert_eq!(store.count_in(&Root::Base), 3);
    }

    #[test]
    fn story_role_instances_differ_per_type_and_never_promote() {
        let mut spec = AdminsSpec::default();
        let bindings = PermissionBindings {
            role_bindings: vec![RoleBindings {
                namespace: "toolchain".into(),
                roles: vec!["install-operator".into()],
                cluster_roles: vec![],
            }],
            ..Default::default()
        };
        spec.service_accounts.push(crate::admins::ServiceAccountSpec {
            name: "john".into(),
            namespace: Some("sre".into()),
            permissions: PermissionsPerClusterType {
                host: Some(bindings.clone()),
                member: Some(bindings),
            },
            ..Default::default()
        });
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library)
            .single_cluster(true)
            .compile()
            .unwrap();

        // The ServiceAccount is shared; Roles and bindings carry the type in their name.
        assert_eq!(store.count_in(&Root::Base), 1);
        assert_eq!(store.count_in(&Root::Host), 2);
        assert_eq!(store.count_in(&Root::Member), 2);
    }

    #[test]
    fn story_empty_namespace_falls_back_to_default() {
        let spec = spec(
            r#"
defaultServiceAccountsNamespace:
  member: ""
serviceAccounts:
  - name: john
    namespace: ""
    host:
      clusterRoleBindings:
        clusterRoles: [view]
    member:
      clusterRoleBindings:
        clusterRoles: [view]
"#,
        );
        let library = catalog();
        let store = ClusterDriver::new(&spec, &library).compile().unwrap();

        assert!(store
            .get(&Root::Host, ResourceKind::ServiceAccount, "sandbox-sre-host", "john")
            .is_some());
        assert!(store
            .get(&Root::Member, ResourceKind::ServiceAccount, "sandbox-sre-member", "john")
            .is_some());
    }

    #[test]
    fn story_missing_role_aborts_compilation() {
        let spec = spec(
            r#"
serviceAccounts:
  - name: john
    host:
      roleBindings:
        - namespace: toolchain
          roles: [no-such-role]
"#,
        );
        let library = catalog();
        let err = ClusterDriver::new(&spec, &library).compile().unwrap_err();
        assert_eq!(err.to_string(), "no such role with the name 'no-such-role' defined");
    }
}
