//! Member cluster selection for principals

use crate::admins::Selector;

impl Selector {
    /// Whether a principal with this selector is left out of `member_name`.
    ///
    /// `member_name` is empty for the generic member pass, which writes the
    /// `member/` root shared by every member cluster.
    pub fn should_skip(&self, member_name: &str) -> bool {
        if !member_name.is_empty() && self.skip_members.contains(member_name) {
            return true;
        }
        !self.member_clusters.is_empty()
            && (member_name.is_empty() || !self.member_clusters.contains(member_name))
    }

    /// Whether the selector names any member cluster at all.
    ///
    /// Targeted principals are generated per member cluster instead of into
    /// the shared `member/` root.
    pub fn is_targeted(&self) -> bool {
        !self.skip_members.is_empty() || !self.member_clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn selector(skip: &[&str], members: &[&str]) -> Selector {
        Selector {
            skip_members: skip.iter().map(|s| s.to_string()).collect(),
            member_clusters: members.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[rstest]
    #[case::empty_selector_generic_pass(&[], &[], "", false)]
    #[case::empty_selector_named_member(&[], &[], "a", false)]
    #[case::skipped_member(&["a", "b"], &[], "a", true)]
    #[case::not_skipped_member(&["a", "b"], &[], "c", false)]
    #[case::skip_list_ignored_for_generic_pass(&["a"], &[], "", false)]
    #[case::outside_member_clusters(&[], &["a", "b"], "c", true)]
    #[case::inside_member_clusters(&[], &["a", "b"], "b", false)]
    #[case::member_clusters_exclude_generic_pass(&[], &["a"], "", true)]
    #[case::skip_wins_over_membership(&["a"], &["a"], "a", true)]
    fn selector_law(
        #[case] skip: &[&str],
        #[case] members: &[&str],
        #[case] member_name: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(selector(skip, members).should_skip(member_name), expected);
    }

    #[test]
    fn targeted_selectors() {
        assert!(!selector(&[], &[]).is_targeted());
        assert!(selector(&["a"], &[]).is_targeted());
        assert!(selector(&[], &["a"]).is_targeted());
    }
}
