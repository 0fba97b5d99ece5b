//! Group membership reconciliation
//!
//! Groups are shared between users, so a Group stored by one user is updated
//! in place when another user joins it. Membership only ever grows and the
//! member list stays sorted.

use std::collections::BTreeMap;

use crate::cluster::Root;
use crate::kind::ResourceKind;
use crate::manifest::{Group, Manifest};
use crate::store::ObjectStore;
use crate::{Error, Result};

/// Add `username` to each of `groups` under `root`, creating missing Groups.
pub fn ensure_groups_for_user(
    store: &mut ObjectStore,
    root: &Root,
    username: &str,
    groups: &[String],
    labels: &BTreeMap<String, String>,
) -> Result<()> {
    for group in groups {
        let fresh = Group::new(group, labels.clone(), vec![username.to_string()]);
        store.ensure_with(root, fresh, |existing| add_member(existing, username))?;
    }
    Ok(())
}

fn add_member(existing: &mut Manifest, username: &str) -> Result<bool> {
    let kind = existing.kind();
    let group = existing.as_group_mut().ok_or_else(|| {
        Error::invalid_object(
            ResourceKind::Group.kind_str(),
            format!("stored object is a {kind}, not a Group"),
        )
    })?;

    match group.users.binary_search_by(|u| u.as_str().cmp(username)) {
        Ok(_) => Ok(false),
        Err(pos) => {
            group.users.insert(pos, username.to_string());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_labels;

    fn members(store: &ObjectStore, root: &Root, group: &str) -> Vec<String> {
        match store.get(root, ResourceKind::Group, "", group) {
            Some(Manifest::Group(g)) => g.users.clone(),
            other => panic!("expected group {group}, got {other:?}"),
        }
    }

    // =========================================================================
    // Story: Shared Groups
    // =========================================================================

    #[test]
    fn story_users_join_shared_group_in_sorted_order() {
        let mut store = ObjectStore::new(false);
        let groups = vec!["crtadmins".to_string()];
        for user in ["zara", "alice", "mike"] {
            ensure_groups_for_user(&mut store, &Root::Host, user, &groups, &default_labels())
                .unwrap();
        }

        assert_eq!(
            members(&store, &Root::Host, "crtadmins"),
            vec!["alice", "mike", "zara"]
        );
    }

    #[test]
    fn story_second_user_joins_some_new_groups() {
        let mut store = ObjectStore::new(false);
        ensure_groups_for_user(
            &mut store,
            &Root::Host,
            "cool-user",
            &["crtadmins".to_string()],
            &default_labels(),
        )
        .unwrap();
        assert_eq!(members(&store, &Root::Host, "crtadmins"), vec!["cool-user"]);

        let groups: Vec<String> = ["cool-group", "crtadmins", "another-group"]
            .iter()
            .map(|g| g.to_string())
            .collect();
        ensure_groups_for_user(&mut store, &Root::Host, "another-user", &groups, &default_labels())
            .unwrap();

        assert_eq!(
            members(&store, &Root::Host, "crtadmins"),
            vec!["another-user", "cool-user"]
        );
        assert_eq!(members(&store, &Root::Host, "cool-group"), vec!["another-user"]);
        assert_eq!(members(&store, &Root::Host, "another-group"), vec!["another-user"]);
    }

    #[test]
    fn story_rejoining_is_a_no_op() {
        let mut store = ObjectStore::new(false);
        let groups = vec!["crtadmins".to_string(), "viewers".to_string()];
        ensure_groups_for_user(&mut store, &Root::Member, "alice", &groups, &default_labels())
            .unwrap();
        ensure_groups_for_user(&mut store, &Root::Member, "alice", &groups, &default_labels())
            .unwrap();

        assert_eq!(members(&store, &Root::Member, "crtadmins"), vec!["alice"]);
        assert_eq!(members(&store, &Root::Member, "viewers"), vec!["alice"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn story_groups_are_per_root() {
        let mut store = ObjectStore::new(false);
        let groups = vec!["crtadmins".to_string()];
        ensure_groups_for_user(&mut store, &Root::Host, "alice", &groups, &default_labels())
            .unwrap();
        ensure_groups_for_user(&mut store, &Root::Member, "bob", &groups, &default_labels())
            .unwrap();

        assert_eq!(members(&store, &Root::Host, "crtadmins"), vec!["alice"]);
        assert_eq!(members(&store, &Root::Member, "crtadmins"), vec!["bob"]);
    }

    #[test]
    fn story_single_cluster_group_merges_in_base() {
        let mut store = ObjectStore::new(true);
        let groups = vec!["crtadmins".to_string()];
        ensure_groups_for_user(&mut store, &Root::Host, "alice", &groups, &default_labels())
            .unwrap();
        ensure_groups_for_user(&mut store, &Root::Member, "bob", &groups, &default_labels())
            .unwrap();

        assert_eq!(members(&store, &Root::Base, "crtadmins"), vec!["alice", "bob"]);
        assert!(store
            .get(&Root::Host, ResourceKind::Group, "", "crtadmins")
            .is_none());
    }
}
