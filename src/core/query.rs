//! Typed filter/sort directives over the joined (person, package) view.
//!
//! Textual directives such as `checked_in=true` or `person_id=ASCENDING` are
//! parsed once at the boundary; anything unrecognised is an
//! [`MailroomError::InvalidQuery`] rather than a silently unfiltered result.

use crate::domain::model::{Association, PersonId};
use crate::utils::error::{MailroomError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    /// Still in the mail room.
    Active,
    CheckedOut,
    NotificationSent(bool),
    Owner(PersonId),
}

impl Filter {
    pub fn matches(&self, entry: &Association) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => entry.package.is_active(),
            Filter::CheckedOut => entry.package.checked_out,
            Filter::NotificationSent(sent) => entry.package.notification_sent == *sent,
            Filter::Owner(person_id) => &entry.package.owner == person_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PersonId,
    LastName,
    CheckInDate,
    PackageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            key: SortKey::PackageId,
            order: SortOrder::Ascending,
        }
    }
}

impl Sort {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    fn compare(&self, a: &Association, b: &Association) -> Ordering {
        let by_key = match self.key {
            SortKey::PersonId => a.person.person_id.cmp(&b.person.person_id),
            SortKey::LastName => (&a.person.last_name, &a.person.first_name, &a.person.person_id)
                .cmp(&(&b.person.last_name, &b.person.first_name, &b.person.person_id)),
            SortKey::CheckInDate => a.package.checked_in_at.cmp(&b.package.checked_in_at),
            SortKey::PackageId => Ordering::Equal,
        };
        let by_key = match self.order {
            SortOrder::Ascending => by_key,
            SortOrder::Descending => by_key.reverse(),
        };
        let by_id = a.package.package_id.cmp(&b.package.package_id);
        match (self.key, self.order) {
            (SortKey::PackageId, SortOrder::Descending) => by_id.reverse(),
            // ties always fall back to ascending package ID
            _ => by_key.then(by_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub filter: Filter,
    pub sort: Sort,
}

impl Query {
    pub fn new(filter: Filter, sort: Sort) -> Self {
        Self { filter, sort }
    }

    /// Active packages grouped by owner, the shape reminder batching expects.
    pub fn active_by_person() -> Self {
        Self::new(Filter::Active, Sort::new(SortKey::PersonId, SortOrder::Ascending))
    }

    pub fn parse(filter: &str, sort: &str) -> Result<Self> {
        Ok(Self::new(filter.parse()?, sort.parse()?))
    }

    pub fn run(&self, entries: Vec<Association>) -> Vec<Association> {
        let mut selected: Vec<Association> =
            entries.into_iter().filter(|e| self.filter.matches(e)).collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(MailroomError::invalid_query(format!(
            "'{}' expects true or false, got '{}'",
            key, other
        ))),
    }
}

fn split_directive(s: &str) -> Option<(String, &str)> {
    let (key, value) = s.split_once('=')?;
    Some((key.trim().to_ascii_lowercase(), value.trim()))
}

impl FromStr for Filter {
    type Err = MailroomError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        let (key, value) = split_directive(s)
            .ok_or_else(|| MailroomError::invalid_query(format!("unknown filter '{}'", s)))?;
        match key.as_str() {
            "checked_in" => Ok(if parse_bool(&key, value)? {
                Filter::Active
            } else {
                Filter::CheckedOut
            }),
            "checked_out" => Ok(if parse_bool(&key, value)? {
                Filter::CheckedOut
            } else {
                Filter::Active
            }),
            "notification_sent" => Ok(Filter::NotificationSent(parse_bool(&key, value)?)),
            "person_id" if !value.is_empty() => Ok(Filter::Owner(PersonId::new(value))),
            _ => Err(MailroomError::invalid_query(format!("unknown filter '{}'", s))),
        }
    }
}

impl FromStr for Sort {
    type Err = MailroomError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Sort::default());
        }
        let (key, value) = split_directive(s)
            .ok_or_else(|| MailroomError::invalid_query(format!("unknown sort '{}'", s)))?;
        let key = match key.as_str() {
            "person_id" => SortKey::PersonId,
            "last_name" => SortKey::LastName,
            "check_in_date" => SortKey::CheckInDate,
            "package_id" => SortKey::PackageId,
            other => {
                return Err(MailroomError::invalid_query(format!(
                    "unknown sort key '{}'",
                    other
                )))
            }
        };
        let order = match value.to_ascii_uppercase().as_str() {
            "ASCENDING" | "ASC" => SortOrder::Ascending,
            "DESCENDING" | "DESC" => SortOrder::Descending,
            other => {
                return Err(MailroomError::invalid_query(format!(
                    "unknown sort order '{}'",
                    other
                )))
            }
        };
        Ok(Sort { key, order })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "checked_in=true"),
            Filter::CheckedOut => write!(f, "checked_in=false"),
            Filter::NotificationSent(sent) => write!(f, "notification_sent={}", sent),
            Filter::Owner(person_id) => write!(f, "person_id={}", person_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Package, PackageId, Person};
    use chrono::{Duration, TimeZone, Utc};

    fn entry(person_id: &str, last: &str, package_id: u64, hours: i64, checked_out: bool) -> Association {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours);
        let mut package = Package::new(PackageId(package_id), person_id.into(), None, at);
        package.checked_out = checked_out;
        Association {
            person: Person::new(person_id, "First", last, format!("{}@rice.edu", person_id)),
            package,
        }
    }

    fn sample() -> Vec<Association> {
        vec![
            entry("nathan", "Patrick", 3, 1, false),
            entry("np8", "Pathak", 1, 3, false),
            entry("gavin", "Abbott", 2, 2, true),
            entry("np8", "Pathak", 4, 0, false),
        ]
    }

    fn ids(entries: &[Association]) -> Vec<u64> {
        entries.iter().map(|e| e.package.package_id.0).collect()
    }

    #[test]
    fn test_active_filter_excludes_checked_out() {
        let query = Query::new(Filter::Active, Sort::default());
        let result = query.run(sample());
        assert!(result.iter().all(|e| !e.package.checked_out));
        assert_eq!(ids(&result), vec![1, 3, 4]);
    }

    #[test]
    fn test_sort_by_person_breaks_ties_by_package_id() {
        let query = Query::new(Filter::All, Sort::new(SortKey::PersonId, SortOrder::Ascending));
        assert_eq!(ids(&query.run(sample())), vec![2, 3, 1, 4]);

        let query = Query::new(Filter::All, Sort::new(SortKey::PersonId, SortOrder::Descending));
        assert_eq!(ids(&query.run(sample())), vec![1, 4, 3, 2]);
    }

    #[test]
    fn test_sort_by_check_in_date_and_package_id() {
        let query = Query::new(Filter::All, Sort::new(SortKey::CheckInDate, SortOrder::Ascending));
        assert_eq!(ids(&query.run(sample())), vec![4, 3, 2, 1]);

        let query = Query::new(Filter::All, Sort::new(SortKey::PackageId, SortOrder::Descending));
        assert_eq!(ids(&query.run(sample())), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_sort_by_last_name() {
        let query = Query::new(Filter::All, Sort::new(SortKey::LastName, SortOrder::Ascending));
        assert_eq!(ids(&query.run(sample())), vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_owner_filter() {
        let query = Query::new(Filter::Owner("np8".into()), Sort::default());
        assert_eq!(ids(&query.run(sample())), vec![1, 4]);
    }

    #[test]
    fn test_parse_legacy_directives() {
        let query = Query::parse("checked_in=TRUE", "person_ID=ASCENDING").unwrap();
        assert_eq!(query, Query::active_by_person());

        assert_eq!("".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!("checked_out=true".parse::<Filter>().unwrap(), Filter::CheckedOut);
        assert_eq!(
            "notification_sent=false".parse::<Filter>().unwrap(),
            Filter::NotificationSent(false)
        );
        assert_eq!(
            "check_in_date=desc".parse::<Sort>().unwrap(),
            Sort::new(SortKey::CheckInDate, SortOrder::Descending)
        );
    }

    #[test]
    fn test_filter_display_parses_back() {
        for filter in [
            Filter::All,
            Filter::Active,
            Filter::CheckedOut,
            Filter::NotificationSent(true),
            Filter::Owner("np8".into()),
        ] {
            assert_eq!(filter.to_string().parse::<Filter>().unwrap(), filter);
        }
    }

    #[test]
    fn test_unknown_directives_are_rejected() {
        for bad in ["colour=red", "checked_in=maybe", "person_id=", "garbage"] {
            assert!(
                matches!(bad.parse::<Filter>(), Err(MailroomError::InvalidQuery { .. })),
                "filter {} should be rejected",
                bad
            );
        }
        for bad in ["weight=ASCENDING", "person_id=SIDEWAYS", "person_id"] {
            assert!(
                matches!(bad.parse::<Sort>(), Err(MailroomError::InvalidQuery { .. })),
                "sort {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_repeated_queries_are_deterministic() {
        let query = Query::new(Filter::All, Sort::new(SortKey::LastName, SortOrder::Descending));
        let mut shuffled = sample();
        shuffled.reverse();
        assert_eq!(ids(&query.run(sample())), ids(&query.run(shuffled)));
    }
}
