use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use url::Url;

use crate::navigation::AllowedDomains;

pub const APP_NAME: &str = "Desktop GPT";
pub const DEFAULT_ENTRY_URL: &str = "https://chat.openai.com";

/// The chat service, its static/API siblings, and the identity providers its
/// sign-in flow redirects through.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "openai.com",
    "chatgpt.com",
    "oaistatic.com",
    "oaiusercontent.com",
    "auth0.com",
    "accounts.google.com",
    "login.microsoftonline.com",
    "login.live.com",
    "appleid.apple.com",
    "challenges.cloudflare.com",
];

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEV_MODE_ENV: &str = "DESKTOP_GPT_DEV";

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);
const MIN_UPDATE_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    entry_url: Option<String>,
    extra_allowed_domains: Vec<String>,
    update_check_interval_minutes: Option<u64>,
    check_for_updates: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub entry_url: Url,
    pub allowed_domains: AllowedDomains,
    pub update_interval: Duration,
    pub updates_enabled: bool,
    pub dev_mode: bool,
}

impl ShellConfig {
    pub fn builtin(dev_mode: bool) -> Result<Self> {
        Ok(Self {
            entry_url: Url::parse(DEFAULT_ENTRY_URL)?,
            allowed_domains: AllowedDomains::new(DEFAULT_ALLOWED_DOMAINS),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            updates_enabled: !dev_mode,
            dev_mode,
        })
    }

    /// Built-in settings overlaid with `config.json` from `config_dir`, if
    /// present. A bad file is logged and ignored.
    pub fn load(config_dir: Option<&Path>, dev_mode: bool) -> Result<Self> {
        let mut config = Self::builtin(dev_mode)?;
        if let Some(dir) = config_dir {
            let path = dir.join(CONFIG_FILE_NAME);
            match read_config_file(&path) {
                Ok(Some(file)) => {
                    info!("[desktop:config] Using overrides from {}", path.display());
                    config.apply(file);
                }
                Ok(None) => {}
                Err(err) => warn!("[desktop:config] Ignoring {}: {err:#}", path.display()),
            }
        }
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(raw) = file.entry_url.as_deref() {
            match Url::parse(raw) {
                Ok(url) if url.scheme() == "https" && url.host_str().is_some() => {
                    self.entry_url = url;
                }
                _ => warn!("[desktop:config] entryUrl must be an https URL; got {raw:?}"),
            }
        }

        self.allowed_domains.extend(&file.extra_allowed_domains);
        // The entry page itself always loads inline.
        if let Some(host) = self.entry_url.host_str() {
            if !self.allowed_domains.matches(host) {
                self.allowed_domains.extend([host]);
            }
        }

        if let Some(minutes) = file.update_check_interval_minutes {
            let minutes = minutes.max(MIN_UPDATE_INTERVAL_MINUTES);
            self.update_interval = Duration::from_secs(minutes * 60);
        }

        if let Some(enabled) = file.check_for_updates {
            self.updates_enabled = enabled && !self.dev_mode;
        }
    }
}

fn read_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let file = json5::from_str::<ConfigFile>(&raw).context("parsing config")?;
    Ok(Some(file))
}

/// Development builds, or any build with `DESKTOP_GPT_DEV` set to a truthy
/// value.
pub fn is_dev_mode() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    std::env::var(DEV_MODE_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_config_targets_the_chat_service() {
        let config = ShellConfig::builtin(false).unwrap();
        assert_eq!(config.entry_url.as_str(), "https://chat.openai.com/");
        assert!(config.allowed_domains.matches("chat.openai.com"));
        assert!(config.allowed_domains.matches("auth.openai.com"));
        assert!(!config.allowed_domains.matches("example.com"));
        assert!(config.updates_enabled);
        assert_eq!(config.update_interval, Duration::from_secs(4 * 60 * 60));
    }

    #[test]
    fn dev_mode_disables_updates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ checkForUpdates: true }"#).unwrap();

        let config = ShellConfig::load(Some(dir.path()), true).unwrap();
        assert!(config.dev_mode);
        assert!(!config.updates_enabled);
    }

    #[test]
    fn missing_file_keeps_builtin_values() {
        let dir = TempDir::new().unwrap();
        let config = ShellConfig::load(Some(dir.path()), false).unwrap();
        let builtin = ShellConfig::builtin(false).unwrap();
        assert_eq!(config.entry_url, builtin.entry_url);
        assert_eq!(config.allowed_domains, builtin.allowed_domains);
    }

    #[test]
    fn file_overrides_are_applied() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{
                // JSON5 comments are fine
                entryUrl: "https://chatgpt.example.org/start",
                extraAllowedDomains: ["intranet.example"],
                updateCheckIntervalMinutes: 1,
            }"#,
        )
        .unwrap();

        let config = ShellConfig::load(Some(dir.path()), false).unwrap();
        assert_eq!(config.entry_url.as_str(), "https://chatgpt.example.org/start");
        assert!(config.allowed_domains.matches("chatgpt.example.org"));
        assert!(config.allowed_domains.matches("wiki.intranet.example"));
        assert_eq!(config.update_interval, Duration::from_secs(15 * 60));
    }

    #[test]
    fn insecure_entry_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "entryUrl": "http://chat.openai.com" }"#,
        )
        .unwrap();

        let config = ShellConfig::load(Some(dir.path()), false).unwrap();
        assert_eq!(config.entry_url.as_str(), "https://chat.openai.com/");
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ entryUrl: ").unwrap();

        let config = ShellConfig::load(Some(dir.path()), false).unwrap();
        assert_eq!(config.entry_url.as_str(), "https://chat.openai.com/");
    }
}
