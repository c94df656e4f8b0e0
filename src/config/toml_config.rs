use crate::core::dispatch::MailroomSettings;
use crate::core::message::{MessageSettings, MessageTemplates};
use crate::utils::error::{MailroomError, Result};
use crate::utils::validation::{validate_email, validate_path, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailroomConfig {
    pub ledger: LedgerConfig,
    pub notifier: NotifierConfig,
    pub labels: LabelConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_dir: String,
    pub file_name: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            file_name: "ledger.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub sender_address: String,
    pub sender_alias: String,
    pub subject_tag: String,
    pub sign_off: String,
    pub notify_on_check_in: bool,
    pub templates: MessageTemplates,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        let message = MessageSettings::default();
        Self {
            kind: NotifierKind::Log,
            endpoint: None,
            token: None,
            timeout_seconds: 30,
            sender_address: message.sender_address,
            sender_alias: message.sender_alias,
            subject_tag: message.subject_tag,
            sign_off: message.sign_off,
            notify_on_check_in: false,
            templates: message.templates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub output_dir: String,
    pub printer: Option<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            output_dir: "./labels".to_string(),
            printer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: Option<String>,
}

impl MailroomConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MailroomError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Like [`from_file`](Self::from_file), but a missing file means defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.as_ref().display());
                Ok(Self::default())
            }
            Err(e) => Err(MailroomError::IoError(e)),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MailroomError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RELAY_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MailroomError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("ledger.data_dir", &self.ledger.data_dir)?;
        validate_path("ledger.file_name", &self.ledger.file_name)?;
        validate_path("labels.output_dir", &self.labels.output_dir)?;
        validate_range("notifier.timeout_seconds", self.notifier.timeout_seconds, 1, 300)?;
        validate_email("notifier.sender_address", &self.notifier.sender_address)?;
        self.notifier.templates.validate()?;

        if self.notifier.kind == NotifierKind::Webhook {
            let endpoint = self.notifier.endpoint.as_deref().unwrap_or_default();
            validate_url("notifier.endpoint", endpoint)?;
        }

        Ok(())
    }

    pub fn message_settings(&self) -> MessageSettings {
        MessageSettings {
            sender_address: self.notifier.sender_address.clone(),
            sender_alias: self.notifier.sender_alias.clone(),
            subject_tag: self.notifier.subject_tag.clone(),
            sign_off: self.notifier.sign_off.clone(),
            templates: self.notifier.templates.clone(),
        }
    }

    pub fn mailroom_settings(&self) -> MailroomSettings {
        MailroomSettings {
            ledger_file: self.ledger.file_name.clone(),
            notify_on_check_in: self.notifier.notify_on_check_in,
        }
    }

    pub fn notifier_timeout(&self) -> Duration {
        Duration::from_secs(self.notifier.timeout_seconds)
    }
}

impl Validate for MailroomConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
