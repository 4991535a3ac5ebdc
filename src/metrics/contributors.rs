use std::collections::BTreeSet;

use super::classify::{union_of_identity_sets, AuthorRole};

/// Contributor logins bucketed by period and role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorSets {
    pub all_time: BTreeSet<String>,
    pub all_time_internal: BTreeSet<String>,
    pub all_time_external: BTreeSet<String>,
    pub this_period: BTreeSet<String>,
    pub this_period_internal: BTreeSet<String>,
    pub this_period_external: BTreeSet<String>,
    pub this_period_first_time_contributor: BTreeSet<String>,
}

impl ContributorSets {
    pub(super) fn add_all_time(&mut self, login: &str, role: AuthorRole) {
        self.all_time.insert(login.to_string());
        if role.internal {
            self.all_time_internal.insert(login.to_string());
        }
        if role.external {
            self.all_time_external.insert(login.to_string());
        }
    }

    pub(super) fn add_this_period(&mut self, login: &str, role: AuthorRole) {
        self.this_period.insert(login.to_string());
        if role.internal {
            self.this_period_internal.insert(login.to_string());
        }
        if role.external {
            self.this_period_external.insert(login.to_string());
        }
        if role.first_time_contributor {
            self.this_period_first_time_contributor
                .insert(login.to_string());
        }
    }

    /// Bucket-wise union of several contributor sets.
    pub fn union<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a ContributorSets>,
        I::IntoIter: Clone,
    {
        let sets = sets.into_iter();
        Self {
            all_time: union_of_identity_sets(sets.clone().map(|s| &s.all_time)),
            all_time_internal: union_of_identity_sets(sets.clone().map(|s| &s.all_time_internal)),
            all_time_external: union_of_identity_sets(sets.clone().map(|s| &s.all_time_external)),
            this_period: union_of_identity_sets(sets.clone().map(|s| &s.this_period)),
            this_period_internal: union_of_identity_sets(
                sets.clone().map(|s| &s.this_period_internal),
            ),
            this_period_external: union_of_identity_sets(
                sets.clone().map(|s| &s.this_period_external),
            ),
            this_period_first_time_contributor: union_of_identity_sets(
                sets.map(|s| &s.this_period_first_time_contributor),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERNAL_FIRST_TIMER: AuthorRole = AuthorRole {
        internal: true,
        external: false,
        first_time_contributor: true,
    };

    #[test]
    fn add_this_period_fills_role_buckets() {
        let mut sets = ContributorSets::default();
        sets.add_this_period("alice", INTERNAL_FIRST_TIMER);

        assert!(sets.this_period.contains("alice"));
        assert!(sets.this_period_internal.contains("alice"));
        assert!(sets.this_period_first_time_contributor.contains("alice"));
        assert!(sets.this_period_external.is_empty());
        assert!(sets.all_time.is_empty());
    }

    #[test]
    fn union_merges_each_bucket() {
        let mut a = ContributorSets::default();
        a.add_all_time("alice", AuthorRole::default());
        let mut b = ContributorSets::default();
        b.add_all_time("alice", INTERNAL_FIRST_TIMER);
        b.add_all_time("bob", AuthorRole::default());

        let union = ContributorSets::union([&a, &b]);
        assert_eq!(union.all_time.len(), 2);
        assert_eq!(union.all_time_internal.len(), 1);
    }
}
