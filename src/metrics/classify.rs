use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::snapshot::AuthorAssociation;

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Aggregation roles for an author. `first_time_contributor` refines
/// `internal` and is never set on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorRole {
    pub internal: bool,
    pub external: bool,
    pub first_time_contributor: bool,
}

pub fn classify_role(association: AuthorAssociation) -> AuthorRole {
    use AuthorAssociation::{
        Collaborator, Contributor, FirstTimeContributor, FirstTimer, Member, None, Owner,
    };

    AuthorRole {
        internal: matches!(
            association,
            Contributor | Owner | Member | FirstTimer | FirstTimeContributor
        ),
        external: matches!(association, Collaborator | None),
        first_time_contributor: matches!(association, FirstTimer | FirstTimeContributor),
    }
}

/// Fractional days from `from` to `to`; negative when `to` is earlier.
#[allow(clippy::cast_precision_loss)]
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[allow(clippy::cast_precision_loss)]
fn rounded_percent(numerator: u64, denominator: u64) -> i64 {
    round_half_up(100.0 * numerator as f64 / denominator as f64)
}

/// Formats `numerator / denominator` as a rounded percentage such as `"43%"`.
///
/// Callers must not pass a zero denominator; use [`Percentage::of`] when the
/// denominator may be empty.
pub fn percentage(numerator: u64, denominator: u64) -> String {
    debug_assert!(denominator != 0, "percentage called with zero denominator");
    format!("{}%", rounded_percent(numerator, denominator))
}

/// Rounded mean of the samples, or `N/A` for an empty list.
#[allow(clippy::cast_precision_loss)]
pub fn average(samples: &[f64]) -> Average {
    if samples.is_empty() {
        return Average::NotAvailable;
    }
    let sum: f64 = samples.iter().sum();
    Average::Days(round_half_up(sum / samples.len() as f64))
}

/// Union of contributor login sets. Its size is the contributor count.
pub fn union_of_identity_sets<'a, I>(sets: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    sets.into_iter().flatten().cloned().collect()
}

/// A guarded percentage field: `"N%"` or `"N/A"` when the denominator is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Percentage {
    Share(String),
    NotAvailable,
}

impl Percentage {
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Self::NotAvailable
        } else {
            Self::Share(percentage(numerator, denominator))
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Share(share) => f.write_str(share),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A rounded day average, or `N/A` when there were no samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Average {
    Days(i64),
    NotAvailable,
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{days}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Average {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Days(days) => serializer.serialize_i64(*days),
            Self::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn set(logins: &[&str]) -> BTreeSet<String> {
        logins.iter().map(ToString::to_string).collect()
    }

    mod classify_role {
        use super::*;

        const ALL: [AuthorAssociation; 9] = [
            AuthorAssociation::Owner,
            AuthorAssociation::Member,
            AuthorAssociation::Contributor,
            AuthorAssociation::Collaborator,
            AuthorAssociation::FirstTimer,
            AuthorAssociation::FirstTimeContributor,
            AuthorAssociation::Mannequin,
            AuthorAssociation::None,
            AuthorAssociation::Unknown,
        ];

        #[test]
        fn never_both_internal_and_external() {
            for association in ALL {
                let role = classify_role(association);
                assert!(!(role.internal && role.external), "{association:?}");
                if role.first_time_contributor {
                    assert!(role.internal, "{association:?}");
                }
            }
        }

        #[test]
        fn owner_is_internal() {
            let role = classify_role(AuthorAssociation::Owner);
            assert!(role.internal);
            assert!(!role.external);
            assert!(!role.first_time_contributor);
        }

        #[test]
        fn collaborator_is_external() {
            let role = classify_role(AuthorAssociation::Collaborator);
            assert!(role.external);
            assert!(!role.internal);
        }

        #[test]
        fn first_timers_are_internal_first_time_contributors() {
            for association in [
                AuthorAssociation::FirstTimer,
                AuthorAssociation::FirstTimeContributor,
            ] {
                let role = classify_role(association);
                assert!(role.internal);
                assert!(role.first_time_contributor);
            }
        }

        #[test]
        fn unrecognized_values_have_no_role() {
            assert_eq!(
                classify_role(AuthorAssociation::Unknown),
                AuthorRole::default()
            );
            assert_eq!(
                classify_role(AuthorAssociation::Mannequin),
                AuthorRole::default()
            );
        }
    }

    #[allow(clippy::float_cmp)]
    mod days_between {
        use super::*;

        #[test]
        fn returns_fractional_days() {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            assert_eq!(days_between(start, start + Duration::hours(36)), 1.5);
        }

        #[test]
        fn is_negative_when_reversed() {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            assert_eq!(days_between(start + Duration::days(2), start), -2.0);
        }
    }

    mod percentage {
        use super::*;

        #[test]
        fn rounds_to_nearest_integer() {
            assert_eq!(percentage(1, 3), "33%");
            assert_eq!(percentage(2, 3), "67%");
            assert_eq!(percentage(1, 8), "13%");
            assert_eq!(percentage(5, 5), "100%");
        }

        #[test]
        fn guarded_variant_uses_not_available_for_zero_denominator() {
            assert_eq!(Percentage::of(0, 0), Percentage::NotAvailable);
            assert_eq!(Percentage::of(0, 0).to_string(), "N/A");
        }

        #[test]
        fn guarded_variant_matches_plain_formatting() {
            for (numerator, denominator) in [(1, 3), (7, 9), (0, 4), (4, 4)] {
                assert_eq!(
                    Percentage::of(numerator, denominator).to_string(),
                    percentage(numerator, denominator)
                );
            }
        }

        #[test]
        fn guarded_variant_wraps_plain_share() {
            assert_eq!(Percentage::of(1, 3), Percentage::Share(percentage(1, 3)));
            assert_eq!(Percentage::of(3, 8), Percentage::Share("38%".to_string()));
        }

        #[test]
        fn serializes_as_string() {
            assert_eq!(
                serde_json::to_value(Percentage::of(1, 2)).unwrap(),
                serde_json::json!("50%")
            );
        }
    }

    mod average {
        use super::*;

        #[test]
        fn empty_is_not_available() {
            assert_eq!(average(&[]), Average::NotAvailable);
            assert_eq!(
                serde_json::to_value(average(&[])).unwrap(),
                serde_json::json!("N/A")
            );
        }

        #[test]
        fn rounds_the_mean() {
            assert_eq!(average(&[1.0, 2.0]), Average::Days(2));
            assert_eq!(average(&[1.2, 1.2, 1.3]), Average::Days(1));
            assert_eq!(average(&[5.0]), Average::Days(5));
            assert_eq!(
                serde_json::to_value(average(&[4.0])).unwrap(),
                serde_json::json!(4)
            );
        }
    }

    mod union_of_identity_sets {
        use super::*;

        #[test]
        fn counts_shared_logins_once() {
            let union = union_of_identity_sets([&set(&["alice", "bob"]), &set(&["alice"])]);
            assert_eq!(union, set(&["alice", "bob"]));
        }

        #[test]
        fn is_associative_and_commutative() {
            let a = set(&["alice"]);
            let b = set(&["bob", "carol"]);
            let c = set(&["carol", "dave"]);

            let left = union_of_identity_sets([&union_of_identity_sets([&a, &b]), &c]);
            let right = union_of_identity_sets([&a, &union_of_identity_sets([&b, &c])]);
            assert_eq!(left, right);
            assert_eq!(
                union_of_identity_sets([&a, &b]),
                union_of_identity_sets([&b, &a])
            );
            assert_eq!(union_of_identity_sets([&a, &a]), a);
        }

        #[test]
        fn empty_input_is_empty() {
            assert!(union_of_identity_sets(std::iter::empty()).is_empty());
        }
    }
}
