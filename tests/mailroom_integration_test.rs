use anyhow::Result;
use httpmock::prelude::*;
use mailroom::core::message::MessageSettings;
use mailroom::{
    CsvPersonSource, FileLabelPrinter, LocalStorage, LogNotifier, Mailroom, MailroomError,
    MailroomSettings, PersonId, Query, WebhookNotifier,
};
use std::time::Duration;
use tempfile::TempDir;

const ROSTER: &str = "\
Pathak,Navin,np8@rice.edu,np8
Patrick,Nathan,nathan@rice.edu,nathan
Pathak,Duplicate,dup@rice.edu,np8
Pathak,Gavin,gavin@rice.edu,gavin
Henderson,Chris,cwh1@rice.edu,cwh1
";

async fn open_with_log_notifier(dir: &TempDir) -> Result<Mailroom<LocalStorage>> {
    let data_dir = dir.path().join("data").to_str().unwrap().to_string();
    let label_dir = dir.path().join("labels").to_str().unwrap().to_string();
    let mailroom = Mailroom::open(
        LocalStorage::new(data_dir),
        Box::new(LogNotifier::new(MessageSettings::default())),
        Box::new(FileLabelPrinter::new(LocalStorage::new(label_dir), None)),
        MailroomSettings::default(),
    )
    .await?;
    Ok(mailroom)
}

#[tokio::test]
async fn test_csv_import_is_partial_not_all_or_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let roster_path = temp_dir.path().join("roster.csv");
    tokio::fs::write(&roster_path, ROSTER).await?;

    let mut mailroom = open_with_log_notifier(&temp_dir).await?;
    let report = mailroom
        .import_persons(&CsvPersonSource::new(&roster_path))
        .await?;

    let imported: Vec<&str> = report.imported.iter().map(|p| p.as_str()).collect();
    assert_eq!(imported, vec!["np8", "nathan", "gavin", "cwh1"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row, 3);
    assert!(matches!(
        report.into_result(),
        Err(MailroomError::PartialBatchFailure { failed: 1, total: 5, .. })
    ));

    // the first np8 row wins over the duplicate
    assert_eq!(mailroom.person(&PersonId::new("np8"))?.first_name, "Navin");
    Ok(())
}

#[tokio::test]
async fn test_unreadable_csv_row_reports_parse_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let roster_path = temp_dir.path().join("roster.csv");
    tokio::fs::write(
        &roster_path,
        b"Pathak,Navin,np8@rice.edu,np8\nBroken,\xc3\x28,x@rice.edu,x1\n".as_slice(),
    )
    .await?;

    let mut mailroom = open_with_log_notifier(&temp_dir).await?;
    let report = mailroom
        .import_persons(&CsvPersonSource::new(&roster_path))
        .await?;

    assert_eq!(report.imported.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row, 2);
    assert!(
        report.failures[0].reason.to_lowercase().contains("utf-8"),
        "reason was {}",
        report.failures[0].reason
    );
    Ok(())
}

#[tokio::test]
async fn test_ledger_persists_between_runs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let roster_path = temp_dir.path().join("roster.csv");
    tokio::fs::write(&roster_path, ROSTER).await?;

    let package_id = {
        let mut mailroom = open_with_log_notifier(&temp_dir).await?;
        mailroom
            .import_persons(&CsvPersonSource::new(&roster_path))
            .await?;
        let id = mailroom
            .check_in(&PersonId::new("cwh1"), Some("It's huge".to_string()))
            .await?;
        mailroom.print_label(id).await?;
        id
    };

    let mailroom = open_with_log_notifier(&temp_dir).await?;
    assert_eq!(mailroom.owner(package_id)?.last_first_name(), "Henderson, Chris");
    assert_eq!(mailroom.list_packages(&Query::active_by_person()).len(), 1);

    let label_path = temp_dir
        .path()
        .join("labels")
        .join(format!("label-{}.txt", package_id));
    assert!(label_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_reminders_through_webhook_relay() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let np8_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/send")
            .json_body_partial(r#"{"kind": "reminder", "to": "np8@rice.edu"}"#);
        then.status(200);
    });
    let nathan_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/send")
            .json_body_partial(r#"{"kind": "reminder", "to": "nathan@rice.edu"}"#);
        then.status(500).body("mailbox full");
    });

    let notifier = WebhookNotifier::new(
        server.url("/send"),
        Duration::from_secs(5),
        None,
        MessageSettings::default(),
    )?;
    let mut mailroom = Mailroom::open(
        LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
        Box::new(notifier),
        Box::new(FileLabelPrinter::new(
            LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
            None,
        )),
        MailroomSettings::default(),
    )
    .await?;

    let roster_path = temp_dir.path().join("roster.csv");
    tokio::fs::write(&roster_path, ROSTER).await?;
    mailroom
        .import_persons(&CsvPersonSource::new(&roster_path))
        .await?;
    mailroom.check_in(&PersonId::new("np8"), None).await?;
    mailroom.check_in(&PersonId::new("np8"), None).await?;
    mailroom.check_in(&PersonId::new("nathan"), None).await?;

    let result = mailroom.send_all_reminders().await;

    // one reminder per person, even with two packages for np8
    np8_mock.assert_hits(1);
    nathan_mock.assert_hits(1);
    match result {
        Err(MailroomError::PartialBatchFailure { failed, total, .. }) => {
            assert_eq!((failed, total), (1, 2));
        }
        other => panic!("expected partial failure, got {:?}", other.map(|r| r.packages)),
    }
    Ok(())
}
