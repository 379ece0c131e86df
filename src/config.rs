//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSIFT_CONFIG` (environment variable)
//! 2. `~/.config/mailsift/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsift\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mailbox::DEFAULT_FOLDER;
use crate::parser::mbox::DEFAULT_MAX_MESSAGE_SIZE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Where mail is read from.
    pub mailbox: MailboxConfig,
    /// Where attachments are written.
    pub storage: StorageConfig,
    /// Size limits.
    pub limits: LimitsConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override the directory for log files.
    pub log_dir: Option<PathBuf>,
}

/// Mailbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Root of the local mailbox store (`<root>/<user>/<folder>.mbox`).
    pub root: Option<PathBuf>,
    /// Folder read when none is given on the command line.
    pub folder: String,
    /// Delete messages whose processing succeeded.
    pub delete_after_processing: bool,
}

/// Attachment storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for extracted attachments.
    pub attachments_dir: Option<PathBuf>,
}

/// Size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum message size in bytes (default: 268435456 = 256 MB).
    pub max_message_size: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            root: None,
            folder: DEFAULT_FOLDER.to_string(),
            delete_after_processing: false,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSIFT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailsift").join("config.toml"))
}

/// Directory for log files.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
}

/// Local mailbox root: configured, else `<data dir>/mailsift/mail`.
pub fn mailbox_root(config: &Config) -> PathBuf {
    if let Some(ref root) = config.mailbox.root {
        return root.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
        .join("mail")
}

/// Attachment base directory: configured, else `<data dir>/mailsift/attachments`.
pub fn attachments_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.storage.attachments_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
        .join("attachments")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.mailbox.folder, "INBOX");
        assert!(!cfg.mailbox.delete_after_processing);
        assert_eq!(cfg.limits.max_message_size, 256 * 1024 * 1024);
        assert!(cfg.storage.attachments_dir.is_none());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.storage.attachments_dir = Some(PathBuf::from("/tmp/att"));
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.mailbox.folder, cfg.mailbox.folder);
        assert_eq!(parsed.storage.attachments_dir, cfg.storage.attachments_dir);
        assert_eq!(parsed.limits.max_message_size, cfg.limits.max_message_size);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[mailbox]
folder = "Archive"
delete_after_processing = true
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.mailbox.folder, "Archive");
        assert!(cfg.mailbox.delete_after_processing);
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.limits.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_configured_dirs_take_precedence() {
        let mut cfg = Config::default();
        cfg.mailbox.root = Some(PathBuf::from("/srv/mail"));
        cfg.storage.attachments_dir = Some(PathBuf::from("/srv/att"));
        cfg.general.log_dir = Some(PathBuf::from("/var/log/mailsift"));
        assert_eq!(mailbox_root(&cfg), PathBuf::from("/srv/mail"));
        assert_eq!(attachments_dir(&cfg), PathBuf::from("/srv/att"));
        assert_eq!(log_dir(&cfg), PathBuf::from("/var/log/mailsift"));
    }

    #[test]
    fn test_save_then_load_through_env_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        std::env::set_var("MAILSIFT_CONFIG", &path);

        let mut cfg = Config::default();
        cfg.mailbox.folder = "Archive".to_string();
        cfg.mailbox.delete_after_processing = true;
        cfg.limits.max_message_size = 1024;
        save_config(&cfg).expect("save");
        assert!(path.is_file());

        let loaded = load_config();
        std::env::remove_var("MAILSIFT_CONFIG");
        assert_eq!(loaded.mailbox.folder, "Archive");
        assert!(loaded.mailbox.delete_after_processing);
        assert_eq!(loaded.limits.max_message_size, 1024);
    }
}
