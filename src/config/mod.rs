pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "mailroom")]
#[command(about = "Track packages held in the mail room and remind their owners")]
pub struct CliConfig {
    #[arg(long, default_value = "mailroom.toml")]
    pub config: String,

    /// Overrides `ledger.data_dir` from the config file
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage the people packages are held for
    #[command(subcommand)]
    Person(PersonCommand),

    /// Check a package in for a person
    CheckIn {
        person_id: String,
        #[arg(long)]
        comment: Option<String>,
        /// Send the new-package notification right away
        #[arg(long)]
        notify: bool,
        /// Print a label for the new package
        #[arg(long)]
        label: bool,
    },

    /// Hand a package over to its owner
    CheckOut { package_id: String },

    /// Show one package and its owner
    Show { package_id: String },

    /// List packages, e.g. `--filter checked_in=true --sort person_id=ASCENDING`
    List {
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value = "package_id=ASCENDING")]
        sort: String,
    },

    /// Send the new-package notification for one package
    Notify { package_id: String },

    /// Send one reminder to every person with packages waiting
    Remind,

    /// Print a label for a package
    Label { package_id: String },

    /// Show the message templates in effect, as a `[notifier.templates]` table
    Templates,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct PersonArgs {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum PersonCommand {
    Add(PersonArgs),
    Edit(PersonArgs),
    Delete { person_id: String },
    /// Search by ID or name; no search lists everyone
    List {
        #[arg(default_value = "")]
        search: String,
    },
    /// Import a roster CSV: LastName,FirstName,EmailAddress,PersonID
    Import {
        path: String,
        #[arg(long)]
        has_headers: bool,
    },
}

#[cfg(feature = "cli")]
impl From<PersonArgs> for crate::domain::model::Person {
    fn from(args: PersonArgs) -> Self {
        crate::domain::model::Person::new(
            args.person_id.as_str(),
            args.first_name,
            args.last_name,
            args.email_address,
        )
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_in() {
        let cli = CliConfig::parse_from([
            "mailroom", "--data-dir", "/tmp/mr", "check-in", "np8", "--comment", "fragile", "--notify",
        ]);
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/mr"));
        match cli.command {
            Command::CheckIn {
                person_id,
                comment,
                notify,
                label,
            } => {
                assert_eq!(person_id, "np8");
                assert_eq!(comment.as_deref(), Some("fragile"));
                assert!(notify);
                assert!(!label);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_templates() {
        let cli = CliConfig::parse_from(["mailroom", "--config", "custom.toml", "templates"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Command::Templates));
    }

    #[test]
    fn test_parse_person_add() {
        let cli = CliConfig::parse_from([
            "mailroom", "person", "add", "np8", "Navin", "Pathak", "np8@rice.edu",
        ]);
        match cli.command {
            Command::Person(PersonCommand::Add(args)) => {
                let person: crate::domain::model::Person = args.into();
                assert_eq!(person.last_first_name(), "Pathak, Navin");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
