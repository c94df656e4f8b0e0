use anyhow::Context;
use clap::Parser;
use mailroom::config::toml_config::{LogFormat, NotifierKind};
use mailroom::config::{Command, PersonCommand};
use mailroom::core::{LabelPrinter, Notifier};
use mailroom::utils::error::ErrorSeverity;
use mailroom::utils::{logger, validation::Validate};
use mailroom::{
    Association, CliConfig, CsvPersonSource, FileLabelPrinter, LocalStorage, LogNotifier, Mailroom,
    MailroomConfig, MailroomError, PackageId, PersonId, WebhookNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = MailroomConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config file '{}'", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.ledger.data_dir = data_dir.clone();
    }

    // 初始化日誌
    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, config.logging.level.as_deref()),
        LogFormat::Json => logger::init_json_logger(cli.verbose, config.logging.level.as_deref()),
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn build_notifier(config: &MailroomConfig) -> mailroom::Result<Box<dyn Notifier>> {
    match config.notifier.kind {
        NotifierKind::Log => Ok(Box::new(LogNotifier::new(config.message_settings()))),
        NotifierKind::Webhook => {
            let endpoint = config.notifier.endpoint.clone().ok_or_else(|| MailroomError::ConfigError {
                message: "notifier.endpoint is required for the webhook notifier".to_string(),
            })?;
            Ok(Box::new(WebhookNotifier::new(
                endpoint,
                config.notifier_timeout(),
                config.notifier.token.clone(),
                config.message_settings(),
            )?))
        }
    }
}

fn parse_package_id(raw: &str) -> mailroom::Result<PackageId> {
    raw.parse()
}

fn print_entry(entry: &Association) {
    let package = &entry.package;
    println!(
        "{}  {:<12} {:<28} {}  {:<11} {}{}",
        package.package_id,
        entry.person.person_id,
        entry.person.last_first_name(),
        package.checked_in_at.format("%Y-%m-%d %H:%M"),
        if package.checked_out { "checked out" } else { "checked in" },
        if package.notification_sent { "notified" } else { "-" },
        package
            .comment
            .as_deref()
            .map(|c| format!("  \"{}\"", c))
            .unwrap_or_default(),
    );
}

async fn run(command: Command, config: &MailroomConfig) -> mailroom::Result<()> {
    if let Command::Templates = command {
        let table = toml::to_string(&config.notifier.templates).map_err(|e| MailroomError::ConfigError {
            message: format!("Cannot render templates: {}", e),
        })?;
        println!("[notifier.templates]\n{}", table);
        return Ok(());
    }

    let storage = LocalStorage::new(config.ledger.data_dir.clone());
    tracing::debug!("Ledger stored under {}", storage.base_path());
    let printer: Box<dyn LabelPrinter> = Box::new(FileLabelPrinter::new(
        LocalStorage::new(config.labels.output_dir.clone()),
        config.labels.printer.clone(),
    ));
    let mut mailroom =
        Mailroom::open(storage, build_notifier(config)?, printer, config.mailroom_settings()).await?;

    match command {
        Command::Person(person_command) => match person_command {
            PersonCommand::Add(args) => {
                let person_id = args.person_id.clone();
                mailroom.add_person(args.into()).await?;
                println!("✅ Added {}", person_id);
            }
            PersonCommand::Edit(args) => {
                let person_id = args.person_id.clone();
                mailroom.edit_person(args.into()).await?;
                println!("✅ Updated {}", person_id);
            }
            PersonCommand::Delete { person_id } => {
                let removed = mailroom.delete_person(&PersonId::new(person_id)).await?;
                println!("✅ Deleted {} ({})", removed.person_id, removed.full_name());
            }
            PersonCommand::List { search } => {
                for person in mailroom.person_list(&search) {
                    println!(
                        "{:<12} {:<28} {}",
                        person.person_id,
                        person.last_first_name(),
                        person.email_address
                    );
                }
            }
            PersonCommand::Import { path, has_headers } => {
                let source = CsvPersonSource::new(&path).with_headers(has_headers);
                let report = mailroom.import_persons(&source).await?;
                println!("📥 Imported {} of {} rows", report.imported.len(), report.total());
                report.into_result()?;
            }
        },
        Command::CheckIn {
            person_id,
            comment,
            notify,
            label,
        } => {
            let package_id = mailroom.check_in(&PersonId::new(person_id), comment).await?;
            println!("📦 Checked in package {}", package_id);
            if notify && !mailroom.package(package_id)?.notification_sent {
                mailroom.send_notification(package_id).await?;
                println!("📧 Notification sent");
            }
            if label {
                mailroom.print_label(package_id).await?;
                println!("🏷️ Label printed");
            }
        }
        Command::CheckOut { package_id } => {
            let package_id = parse_package_id(&package_id)?;
            let owner = mailroom.owner(package_id)?;
            mailroom.check_out(package_id).await?;
            println!("✅ Package {} handed to {}", package_id, owner.full_name());
        }
        Command::Show { package_id } => {
            let package_id = parse_package_id(&package_id)?;
            let entry = Association {
                person: mailroom.owner(package_id)?,
                package: mailroom.package(package_id)?,
            };
            print_entry(&entry);
        }
        Command::List { filter, sort } => {
            for entry in mailroom.list_packages_str(&filter, &sort)? {
                print_entry(&entry);
            }
        }
        Command::Notify { package_id } => {
            mailroom.send_notification(parse_package_id(&package_id)?).await?;
            println!("📧 Notification sent");
        }
        Command::Remind => {
            let report = mailroom.send_all_reminders().await?;
            println!(
                "📧 Reminded {} people about {} packages",
                report.reminded.len(),
                report.packages
            );
        }
        Command::Label { package_id } => {
            let label = mailroom.print_label(parse_package_id(&package_id)?).await?;
            println!("🏷️ Label printed for {}", label.owner_name);
        }
        Command::Templates => {}
    }

    Ok(())
}
