use chrono::{TimeZone, Utc};
use mailroom::core::batcher::batch_by_owner;
use mailroom::{Filter, Ledger, MailroomError, PackageId, Person, Query, Sort, SortKey, SortOrder};

fn ledger_with_residents() -> Ledger {
    let mut ledger = Ledger::new();
    for (id, first, last) in [
        ("np8", "Navin", "Pathak"),
        ("nathan", "Nathan", "Patrick"),
        ("gavin", "Gavin", "Pathak"),
    ] {
        ledger
            .add_person(Person::new(id, first, last, format!("{}@rice.edu", id)))
            .unwrap();
    }
    ledger
}

/// Check in, check out, then confirm the package leaves the active view but
/// stays in the full history.
#[test]
fn test_check_in_check_out_scenario() {
    let mut ledger = ledger_with_residents();
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    let id = ledger
        .check_in_package_at(&"np8".into(), Some("fragile".to_string()), at)
        .unwrap();
    assert_eq!(id, PackageId(20240101120000));
    assert!(!ledger.package(id).unwrap().checked_out);

    ledger.check_out_package(id).unwrap();

    let active = Query::new(Filter::Active, Sort::default()).run(ledger.associations());
    assert!(active.iter().all(|e| e.package.package_id != id));

    let all = Query::default().run(ledger.associations());
    let entry = all.iter().find(|e| e.package.package_id == id).unwrap();
    assert!(entry.package.checked_out);
    assert_eq!(entry.person.person_id.as_str(), "np8");
}

#[test]
fn test_check_out_is_irreversible() {
    let mut ledger = ledger_with_residents();
    let id = ledger.check_in_package(&"gavin".into(), None).unwrap();

    ledger.check_out_package(id).unwrap();
    assert!(matches!(
        ledger.check_out_package(id),
        Err(MailroomError::AlreadyCheckedOut { .. })
    ));
    assert!(ledger.is_checked_out(id).unwrap());
}

#[test]
fn test_active_query_feeds_batcher() {
    let mut ledger = ledger_with_residents();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let first = ledger.check_in_package_at(&"np8".into(), None, at).unwrap();
    ledger.check_in_package_at(&"nathan".into(), None, at).unwrap();
    let second = ledger.check_in_package_at(&"np8".into(), None, at).unwrap();
    let gone = ledger.check_in_package_at(&"gavin".into(), None, at).unwrap();
    ledger.check_out_package(gone).unwrap();

    let entries = Query::active_by_person().run(ledger.associations());
    let batches = batch_by_owner(entries).unwrap();

    let owners: Vec<&str> = batches.iter().map(|b| b.person.person_id.as_str()).collect();
    assert_eq!(owners, vec!["nathan", "np8"]);
    let np8_packages: Vec<PackageId> = batches[1].packages.iter().map(|p| p.package_id).collect();
    assert_eq!(np8_packages, vec![first, second]);
}

#[test]
fn test_batcher_rejects_unsorted_listing() {
    let mut ledger = ledger_with_residents();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    ledger.check_in_package_at(&"np8".into(), None, at).unwrap();
    ledger.check_in_package_at(&"nathan".into(), None, at).unwrap();
    ledger.check_in_package_at(&"np8".into(), None, at).unwrap();

    // package ID order interleaves the two owners
    let entries = Query::new(Filter::Active, Sort::new(SortKey::PackageId, SortOrder::Ascending))
        .run(ledger.associations());

    assert!(matches!(
        batch_by_owner(entries),
        Err(MailroomError::UngroupedInput { .. })
    ));
}
