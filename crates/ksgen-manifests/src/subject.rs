//! Subject factories: the identity objects bindings point at
//!
//! A ServiceAccount principal becomes a single ServiceAccount. A User
//! principal becomes a User, one Identity per external ID, and memberships in
//! its Groups. Either way the factory returns the `Subject` reference that
//! every binding of the principal uses.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::Subject;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::cluster::ClusterTarget;
use crate::groups::ensure_groups_for_user;
use crate::kind::{ResourceKind, RBAC_API_GROUP};
use crate::manifest::{Identity, User};
use crate::store::ObjectStore;
use crate::Result;

/// Identity provider the generated Identities belong to
pub const IDENTITY_PROVIDER: &str = "rhd";

/// Creates the identity objects of a principal and returns its Subject
pub trait SubjectFactory {
    /// Name of the principal the subject is created for
    fn base_name(&self) -> &str;

    /// Kind of the subject this factory creates
    fn kind(&self) -> ResourceKind;

    /// Namespace of the subject, `None` for cluster-scoped subjects
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Store the principal's identity objects for `target` and return the
    /// Subject that bindings should reference.
    fn create_subject(
        &self,
        store: &mut ObjectStore,
        target: &ClusterTarget,
        labels: &BTreeMap<String, String>,
    ) -> Result<Subject>;
}

/// Subject factory for ServiceAccount principals
#[derive(Clone, Debug)]
pub struct ServiceAccountFactory {
    name: String,
    namespace: String,
}

impl ServiceAccountFactory {
    /// `namespace` is the already-resolved target namespace: the principal's
    /// explicit namespace, or the cluster-type default.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl SubjectFactory for ServiceAccountFactory {
    fn base_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::ServiceAccount
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn create_subject(
        &self,
        store: &mut ObjectStore,
        target: &ClusterTarget,
        labels: &BTreeMap<String, String>,
    ) -> Result<Subject> {
        let sa = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: (!labels.is_empty()).then(|| labels.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        store.ensure(&target.root(), sa)?;

        Ok(Subject {
            kind: ResourceKind::ServiceAccount.kind_str().to_string(),
            name: self.name.clone(),
            namespace: Some(self.namespace.clone()),
            ..Default::default()
        })
    }
}

/// Subject factory for User principals
#[derive(Clone, Debug)]
pub struct UserFactory {
    name: String,
    ids: Vec<String>,
    groups: Vec<String>,
}

impl UserFactory {
    /// A user with its external IDs and group names
    pub fn new(name: impl Into<String>, ids: Vec<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            ids,
            groups,
        }
    }
}

impl SubjectFactory for UserFactory {
    fn base_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn create_subject(
        &self,
        store: &mut ObjectStore,
        target: &ClusterTarget,
        labels: &BTreeMap<String, String>,
    ) -> Result<Subject> {
        let root = target.root();

        let mut identity_names: Vec<String> =
            self.ids.iter().map(|id| identity_name(id)).collect();
        identity_names.sort();
        identity_names.dedup();

        let mut user = User::new(&self.name, labels.clone());
        user.identities = identity_names;
        store.ensure(&root, user)?;

        for id in &self.ids {
            let identity = Identity::new(
                identity_name(id),
                IDENTITY_PROVIDER,
                id,
                &self.name,
                labels.clone(),
            );
            store.ensure(&root, identity)?;
        }

        ensure_groups_for_user(store, &root, &self.name, &self.groups, labels)?;

        Ok(Subject {
            api_group: Some(RBAC_API_GROUP.to_string()),
            kind: ResourceKind::User.kind_str().to_string(),
            name: self.name.clone(),
            namespace: None,
        })
    }
}

/// Normalized Identity name for a provider user ID: `rhd:<id>`.
///
/// IDs that are not valid as an object name path segment are encoded with
/// the URL-safe base64 alphabet, which has no `/`, behind a `b64:` marker.
pub fn identity_name(user_id: &str) -> String {
    let id = if is_valid_path_segment(user_id) {
        user_id.to_string()
    } else {
        format!("b64:{}", URL_SAFE_NO_PAD.encode(user_id))
    };
    format!("{IDENTITY_PROVIDER}:{id}")
}

fn is_valid_path_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains('/') && !s.contains('%')
}
