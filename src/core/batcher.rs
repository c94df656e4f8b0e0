use crate::domain::model::{Association, Batch, Package, Person, PersonId};
use crate::utils::error::{MailroomError, Result};
use std::collections::HashSet;

/// Groups (person, package) entries into one [`Batch`] per person.
///
/// The input must already be grouped by person (see
/// [`Query::active_by_person`](crate::core::query::Query::active_by_person)).
/// The batcher does not sort; a person whose entries are split by someone
/// else's is reported as [`MailroomError::UngroupedInput`] instead of
/// producing two reminders. Checked-out packages are skipped, and a person
/// left with no packages gets no batch.
pub fn batch_by_owner<I>(entries: I) -> Result<Vec<Batch>>
where
    I: IntoIterator<Item = Association>,
{
    let mut batches = Vec::new();
    let mut closed: HashSet<PersonId> = HashSet::new();
    let mut current: Option<(Person, Vec<Package>)> = None;

    for Association { person, package } in entries {
        let same_person = matches!(&current, Some((p, _)) if p.person_id == person.person_id);
        if !same_person {
            if closed.contains(&person.person_id) {
                return Err(MailroomError::UngroupedInput {
                    person_id: person.person_id.to_string(),
                });
            }
            if let Some((prev, packages)) = current.take() {
                closed.insert(prev.person_id.clone());
                push_batch(&mut batches, prev, packages);
            }
            current = Some((person, Vec::new()));
        }
        if package.is_active() {
            if let Some((_, packages)) = current.as_mut() {
                packages.push(package);
            }
        }
    }

    if let Some((person, packages)) = current {
        push_batch(&mut batches, person, packages);
    }
    Ok(batches)
}

fn push_batch(batches: &mut Vec<Batch>, person: Person, packages: Vec<Package>) {
    if !packages.is_empty() {
        batches.push(Batch { person, packages });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PackageId;
    use chrono::{TimeZone, Utc};

    fn person(id: &str) -> Person {
        Person::new(id, id, "Tester", format!("{}@rice.edu", id))
    }

    fn entry(person_id: &str, package_id: u64) -> Association {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Association {
            person: person(person_id),
            package: Package::new(PackageId(package_id), person_id.into(), None, at),
        }
    }

    fn package_ids(batch: &Batch) -> Vec<u64> {
        batch.packages.iter().map(|p| p.package_id.0).collect()
    }

    #[test]
    fn test_groups_consecutive_entries() {
        let batches = batch_by_owner(vec![entry("A", 1), entry("A", 2), entry("B", 3)]).unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].person.person_id.as_str(), "A");
        assert_eq!(package_ids(&batches[0]), vec![1, 2]);
        assert_eq!(batches[1].person.person_id.as_str(), "B");
        assert_eq!(package_ids(&batches[1]), vec![3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(batch_by_owner(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_single_entry() {
        let batches = batch_by_owner(vec![entry("A", 7)]).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(package_ids(&batches[0]), vec![7]);
    }

    #[test]
    fn test_preserves_encounter_order() {
        let batches =
            batch_by_owner(vec![entry("C", 9), entry("C", 4), entry("A", 5), entry("B", 1)]).unwrap();
        let owners: Vec<&str> = batches.iter().map(|b| b.person.person_id.as_str()).collect();
        assert_eq!(owners, vec!["C", "A", "B"]);
        assert_eq!(package_ids(&batches[0]), vec![9, 4]);
    }

    #[test]
    fn test_ungrouped_input_is_rejected() {
        let err = batch_by_owner(vec![entry("A", 1), entry("B", 2), entry("A", 3)]).unwrap_err();
        match err {
            MailroomError::UngroupedInput { person_id } => assert_eq!(person_id, "A"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_checked_out_packages_are_skipped() {
        let mut gone = entry("A", 1);
        gone.package.checked_out = true;
        let batches = batch_by_owner(vec![gone, entry("B", 2)]).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].person.person_id.as_str(), "B");
    }
}
