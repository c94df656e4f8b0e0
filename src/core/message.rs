use crate::domain::model::{Label, Package, Person};
use crate::utils::error::{MailroomError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern compiles"));

const PERSON_PLACEHOLDERS: [&str; 5] = ["first_name", "last_name", "full_name", "person_id", "sign_off"];
const NOTICE_PLACEHOLDERS: [&str; 4] = ["package_id", "comment", "comment_line", "checked_in"];
const REMINDER_PLACEHOLDERS: [&str; 3] = ["count", "plural", "packages"];

/// Editable wording of the two outgoing messages.
///
/// Placeholders are written `{name}`. Both kinds accept `{first_name}`,
/// `{last_name}`, `{full_name}`, `{person_id}` and `{sign_off}`. Notices add
/// `{package_id}`, `{comment}`, `{comment_line}` (a `Comment: ..` line, or
/// nothing) and `{checked_in}`; reminders add `{count}`, `{plural}` (`s`
/// unless the count is one) and `{packages}`, the enumerated package list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub notice_subject: String,
    pub notice_body: String,
    pub reminder_subject: String,
    pub reminder_body: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            notice_subject: "[Package Notification] New Package for {full_name}".to_string(),
            notice_body: "{comment_line}Checked in on {checked_in}\n\n{sign_off}".to_string(),
            reminder_subject: "[Package Reminder] You have {count} package{plural} in the mail room"
                .to_string(),
            reminder_body: "Hello {first_name},\n\nYour packages include: {packages}\n\n\
                Please retrieve your packages as soon as possible.\n\n{sign_off}"
                .to_string(),
        }
    }
}

impl MessageTemplates {
    /// Rejects placeholders a template's message kind cannot fill.
    pub fn validate(&self) -> Result<()> {
        let notice: Vec<&str> = PERSON_PLACEHOLDERS.iter().chain(&NOTICE_PLACEHOLDERS).copied().collect();
        let reminder: Vec<&str> = PERSON_PLACEHOLDERS.iter().chain(&REMINDER_PLACEHOLDERS).copied().collect();
        check_placeholders("notifier.templates.notice_subject", &self.notice_subject, &notice)?;
        check_placeholders("notifier.templates.notice_body", &self.notice_body, &notice)?;
        check_placeholders("notifier.templates.reminder_subject", &self.reminder_subject, &reminder)?;
        check_placeholders("notifier.templates.reminder_body", &self.reminder_body, &reminder)?;
        Ok(())
    }
}

fn check_placeholders(field: &str, template: &str, allowed: &[&str]) -> Result<()> {
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        if !allowed.contains(&&caps[1]) {
            return Err(MailroomError::InvalidConfigValueError {
                field: field.to_string(),
                value: caps[0].to_string(),
                reason: format!("unknown placeholder, expected one of {}", allowed.join(", ")),
            });
        }
    }
    Ok(())
}

/// Fills every `{name}` in one pass, so values containing braces are never
/// expanded again. Unknown placeholders are left as written.
pub fn render_template(template: &str, values: &[(&str, String)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Sender identity and wording shared by every outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    pub sender_address: String,
    pub sender_alias: String,
    /// Prefixed to every subject, e.g. `[Test]`.
    pub subject_tag: String,
    pub sign_off: String,
    pub templates: MessageTemplates,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            sender_address: "mailroom@example.com".to_string(),
            sender_alias: "Mail Room".to_string(),
            subject_tag: String::new(),
            sign_off: "Mail Room".to_string(),
            templates: MessageTemplates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub from_alias: String,
    pub to: String,
    pub to_alias: String,
    pub subject: String,
    pub body: String,
}

const TIME_FORMAT: &str = "%a %b %e %H:%M %Y";

impl Message {
    fn addressed_to(settings: &MessageSettings, person: &Person, subject: String, body: String) -> Self {
        Self {
            from: settings.sender_address.clone(),
            from_alias: settings.sender_alias.clone(),
            to: person.email_address.clone(),
            to_alias: person.full_name(),
            subject,
            body,
        }
    }

    fn person_values(settings: &MessageSettings, person: &Person) -> Vec<(&'static str, String)> {
        vec![
            ("first_name", person.first_name.clone()),
            ("last_name", person.last_name.clone()),
            ("full_name", person.full_name()),
            ("person_id", person.person_id.to_string()),
            ("sign_off", settings.sign_off.clone()),
        ]
    }

    pub fn package_notice(settings: &MessageSettings, person: &Person, package: &Package) -> Self {
        let mut values = Self::person_values(settings, person);
        let comment = package.comment.clone().unwrap_or_default();
        let comment_line = match &package.comment {
            Some(comment) => format!("Comment: {}\n", comment),
            None => String::new(),
        };
        values.extend([
            ("package_id", package.package_id.to_string()),
            ("comment", comment),
            ("comment_line", comment_line),
            ("checked_in", package.checked_in_at.format(TIME_FORMAT).to_string()),
        ]);

        let templates = &settings.templates;
        let subject = format!(
            "{}{}",
            settings.subject_tag,
            render_template(&templates.notice_subject, &values)
        );
        let body = render_template(&templates.notice_body, &values);
        Self::addressed_to(settings, person, subject, body)
    }

    pub fn reminder(settings: &MessageSettings, person: &Person, packages: &[Package]) -> Self {
        let mut listing = String::new();
        for (i, package) in packages.iter().enumerate() {
            listing.push_str(&format!("\n\tPackage {}:", i + 1));
            listing.push_str(&format!(
                "\n\t\tChecked in on {}",
                package.checked_in_at.format(TIME_FORMAT)
            ));
            if let Some(comment) = &package.comment {
                listing.push_str(&format!("\n\t\tComment: {}", comment));
            }
        }
        let mut values = Self::person_values(settings, person);
        values.extend([
            ("count", packages.len().to_string()),
            ("plural", if packages.len() == 1 { "" } else { "s" }.to_string()),
            ("packages", listing),
        ]);

        let templates = &settings.templates;
        let subject = format!(
            "{}{}",
            settings.subject_tag,
            render_template(&templates.reminder_subject, &values)
        );
        let body = render_template(&templates.reminder_body, &values);
        Self::addressed_to(settings, person, subject, body)
    }
}

impl Label {
    pub fn for_package(package: &Package, owner: &Person) -> Self {
        Self {
            package_id: package.package_id,
            owner_name: owner.last_first_name(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.owner_name, self.package_id)
    }
}
