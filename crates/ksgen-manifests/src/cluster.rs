//! Cluster types and output roots

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment role of a cluster in a KubeSaw installation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    /// The host cluster running the host operator
    Host,
    /// A member cluster running user workloads
    Member,
}

/// Processing order. Host must be complete before Member is compared
/// against it for single-cluster promotion.
pub const ALL_CLUSTER_TYPES: [ClusterType; 2] = [ClusterType::Host, ClusterType::Member];

impl ClusterType {
    /// Lowercase name used in object names, paths and namespaces
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Member => "member",
        }
    }

    /// The other cluster type
    pub fn other(&self) -> Self {
        match self {
            Self::Host => Self::Member,
            Self::Member => Self::Host,
        }
    }

    /// Conventional namespace for ServiceAccounts on this cluster type
    pub fn default_sa_namespace(&self) -> String {
        format!("sandbox-sre-{}", self.as_str())
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level output location of a manifest
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Root {
    /// `host/`
    Host,
    /// `member/`, applied to every member cluster
    Member,
    /// `base/`, shared by host and member in single-cluster mode
    Base,
    /// `member-<name>/`, a component for one specific member cluster
    MemberCluster(String),
}

impl Root {
    /// Directory name of this root under the output directory
    pub fn dir_name(&self) -> String {
        match self {
            Self::Host => "host".to_string(),
            Self::Member => "member".to_string(),
            Self::Base => "base".to_string(),
            Self::MemberCluster(name) => format!("member-{name}"),
        }
    }

    /// The per-type root this root is compared against for promotion.
    ///
    /// Only `Host` and `Member` have a counterpart.
    pub fn other_type(&self) -> Option<Root> {
        match self {
            Self::Host => Some(Self::Member),
            Self::Member => Some(Self::Host),
            Self::Base | Self::MemberCluster(_) => None,
        }
    }

    /// Whether this root is emitted as a Kustomize component
    pub fn is_component(&self) -> bool {
        matches!(self, Self::MemberCluster(_))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

/// The cluster a compilation pass generates manifests for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterTarget {
    /// Host or member
    pub cluster_type: ClusterType,
    /// Specific member cluster name, `None` for the generic per-type pass
    pub member_cluster: Option<String>,
}

impl ClusterTarget {
    /// The generic pass for a cluster type
    pub fn new(cluster_type: ClusterType) -> Self {
        Self {
            cluster_type,
            member_cluster: None,
        }
    }

    /// The pass for one specific member cluster
    pub fn member_cluster(name: impl Into<String>) -> Self {
        Self {
            cluster_type: ClusterType::Member,
            member_cluster: Some(name.into()),
        }
    }

    /// Member cluster name as fed to selectors (empty for generic passes)
    pub fn member_name(&self) -> &str {
        self.member_cluster.as_deref().unwrap_or("")
    }

    /// Root this pass writes to
    pub fn root(&self) -> Root {
        match (&self.cluster_type, &self.member_cluster) {
            (ClusterType::Host, _) => Root::Host,
            (ClusterType::Member, None) => Root::Member,
            (ClusterType::Member, Some(name)) => Root::MemberCluster(name.clone()),
        }
    }
}

impl fmt::Display for ClusterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member_cluster {
            Some(name) => write!(f, "{} ({})", self.cluster_type, name),
            None => write!(f, "{}", self.cluster_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_type_names() {
        assert_eq!(ClusterType::Host.as_str(), "host");
        assert_eq!(ClusterType::Member.to_string(), "member");
        assert_eq!(ClusterType::Host.other(), ClusterType::Member);
        assert_eq!(ClusterType::Member.default_sa_namespace(), "sandbox-sre-member");
    }

    #[test]
    fn processing_order_is_host_first() {
        assert_eq!(ALL_CLUSTER_TYPES[0], ClusterType::Host);
        assert_eq!(ALL_CLUSTER_TYPES[1], ClusterType::Member);
    }

    #[test]
    fn root_dirs_and_counterparts() {
        assert_eq!(Root::Base.dir_name(), "base");
        assert_eq!(
            Root::MemberCluster("member-1".into()).dir_name(),
            "member-member-1"
        );
        assert_eq!(Root::Host.other_type(), Some(Root::Member));
        assert_eq!(Root::Member.other_type(), Some(Root::Host));
        assert_eq!(Root::Base.other_type(), None);
        assert_eq!(Root::MemberCluster("m".into()).other_type(), None);
        assert!(Root::MemberCluster("m".into()).is_component());
        assert!(!Root::Member.is_component());
    }

    #[test]
    fn target_roots() {
        assert_eq!(ClusterTarget::new(ClusterType::Host).root(), Root::Host);
        assert_eq!(ClusterTarget::new(ClusterType::Member).root(), Root::Member);
        let target = ClusterTarget::member_cluster("m1");
        assert_eq!(target.root(), Root::MemberCluster("m1".into()));
        assert_eq!(target.member_name(), "m1");
        assert_eq!(ClusterTarget::new(ClusterType::Member).member_name(), "");
    }

    #[test]
    fn cluster_type_deserializes_lowercase() {
        let ct: ClusterType = serde_yaml::from_str("member").unwrap();
        assert_eq!(ct, ClusterType::Member);
    }
}
