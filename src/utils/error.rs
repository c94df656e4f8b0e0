use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailroomError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} already exists: {id}")]
    DuplicateKey { kind: EntityKind, id: String },

    #[error("Package {package_id} is already checked out")]
    AlreadyCheckedOut { package_id: String },

    #[error("Invalid transition: {message}")]
    InvalidTransition { message: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Entries for person {person_id} are not grouped together")]
    UngroupedInput { person_id: String },

    #[error("Invalid record: {field} {reason}")]
    InvalidRecord { field: String, reason: String },

    #[error("{failed} of {total} items failed")]
    PartialBatchFailure {
        failed: usize,
        total: usize,
        details: Vec<String>,
    },

    #[error("Delivery failed: {message}")]
    Delivery { message: String },

    #[error("Ledger data is corrupt: {message}")]
    Corrupt { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Package,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Person => write!(f, "Person"),
            EntityKind::Package => write!(f, "Package"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    State,
    Input,
    Delivery,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MailroomError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        MailroomError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn duplicate(kind: EntityKind, id: impl ToString) -> Self {
        MailroomError::DuplicateKey {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        MailroomError::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn invalid_record(field: &str, reason: impl Into<String>) -> Self {
        MailroomError::InvalidRecord {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        MailroomError::Delivery {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MailroomError::NotFound { .. } => ErrorCategory::Lookup,
            MailroomError::DuplicateKey { .. }
            | MailroomError::AlreadyCheckedOut { .. }
            | MailroomError::InvalidTransition { .. } => ErrorCategory::State,
            MailroomError::InvalidQuery { .. }
            | MailroomError::UngroupedInput { .. }
            | MailroomError::InvalidRecord { .. }
            | MailroomError::CsvError(_) => ErrorCategory::Input,
            MailroomError::PartialBatchFailure { .. }
            | MailroomError::Delivery { .. }
            | MailroomError::HttpError(_) => ErrorCategory::Delivery,
            MailroomError::Corrupt { .. }
            | MailroomError::IoError(_)
            | MailroomError::SerializationError(_) => ErrorCategory::Storage,
            MailroomError::ConfigError { .. } | MailroomError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup | ErrorCategory::State | ErrorCategory::Input => {
                ErrorSeverity::High
            }
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MailroomError::NotFound { .. } => "Check the ID; use `list` or `person list` to find it",
            MailroomError::DuplicateKey { .. } => "Use a different ID or edit the existing entry",
            MailroomError::AlreadyCheckedOut { .. } => "Nothing to do, the package was already picked up",
            MailroomError::InvalidTransition { .. } => {
                "Check out the person's remaining packages first"
            }
            MailroomError::InvalidQuery { .. } => {
                "Filters: all, checked_in=true|false, notification_sent=true|false, person_id=<id>; \
                 sorts: person_id|last_name|check_in_date|package_id=ASCENDING|DESCENDING"
            }
            MailroomError::UngroupedInput { .. } => "Sort entries by person before batching",
            MailroomError::InvalidRecord { .. } | MailroomError::CsvError(_) => {
                "Fix the offending fields and try again"
            }
            MailroomError::PartialBatchFailure { .. }
            | MailroomError::Delivery { .. }
            | MailroomError::HttpError(_) => "Check the notifier endpoint and retry",
            MailroomError::Corrupt { .. } | MailroomError::SerializationError(_) => {
                "Restore the ledger file from a backup"
            }
            MailroomError::IoError(_) => "Check that the data directory exists and is writable",
            MailroomError::ConfigError { .. } | MailroomError::InvalidConfigValueError { .. } => {
                "Review the configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MailroomError::PartialBatchFailure {
                failed,
                total,
                details,
            } => {
                let mut message = format!("{} of {} items failed", failed, total);
                for detail in details {
                    message.push_str("\n  - ");
                    message.push_str(detail);
                }
                message
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MailroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = MailroomError::not_found(EntityKind::Package, 20240101120000u64);
        assert_eq!(err.to_string(), "Package not found: 20240101120000");
        assert_eq!(err.category(), ErrorCategory::Lookup);
    }

    #[test]
    fn test_partial_failure_lists_details() {
        let err = MailroomError::PartialBatchFailure {
            failed: 1,
            total: 3,
            details: vec!["row 2: duplicate".to_string()],
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("row 2: duplicate"));
    }
}
