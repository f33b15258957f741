//! Turns update-check outcomes into user-facing notices.
//!
//! Checking, downloading and verifying packages belong to the host updater.
//! This module only decides which outcomes deserve a notification and keeps
//! scheduled and manual checks from overlapping.

use std::{future::Future, time::Duration};

use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Available { version: String },
    Downloaded { version: String },
    Error(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Available { version: String },
    /// Actionable: the user may install and restart now.
    ReadyToInstall { version: String },
    Failed { message: String },
}

#[derive(Debug)]
pub struct UpdateNotifier {
    enabled: bool,
    checking: bool,
    announced_available: Option<String>,
    announced_ready: Option<String>,
    last_error: Option<String>,
}

impl UpdateNotifier {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            info!("[desktop:updater] Update checks disabled");
        }
        Self {
            enabled,
            checking: false,
            announced_available: None,
            announced_ready: None,
            last_error: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Claims the single in-flight check slot.
    pub fn begin_check(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.checking {
            debug!("[desktop:updater] Check already running; skipping");
            return false;
        }
        self.checking = true;
        true
    }

    pub fn finish_check(&mut self) {
        self.checking = false;
    }

    /// Whether `version` has already been announced as ready to install.
    pub fn is_ready(&self, version: &str) -> bool {
        self.announced_ready.as_deref() == Some(version)
    }

    /// Records an outcome and returns the notice to show, if any.
    ///
    /// Each version is announced at most once as available and once as ready,
    /// however many checks report it. An error is announced once until a
    /// different outcome is seen.
    pub fn observe(&mut self, status: UpdateStatus) -> Option<Notice> {
        match status {
            UpdateStatus::None => {
                info!("[desktop:updater] No update available");
                self.last_error = None;
                None
            }
            UpdateStatus::Error(message) => {
                warn!("[desktop:updater] Update check failed: {message}");
                if self.last_error.as_deref() == Some(message.as_str()) {
                    return None;
                }
                self.last_error = Some(message.clone());
                Some(Notice::Failed { message })
            }
            UpdateStatus::Available { version } => {
                info!("[desktop:updater] Update {version} available");
                self.last_error = None;
                let seen = self.announced_available.as_deref() == Some(version.as_str())
                    || self.is_ready(&version);
                if seen {
                    return None;
                }
                self.announced_available = Some(version.clone());
                Some(Notice::Available { version })
            }
            UpdateStatus::Downloaded { version } => {
                info!("[desktop:updater] Update {version} downloaded");
                self.last_error = None;
                if self.is_ready(&version) {
                    return None;
                }
                self.announced_ready = Some(version.clone());
                Some(Notice::ReadyToInstall { version })
            }
        }
    }
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Available { .. } => "Update available",
            Notice::ReadyToInstall { .. } => "Update ready",
            Notice::Failed { .. } => "Update check failed",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notice::Available { version } => {
                format!("Desktop GPT {version} is downloading in the background.")
            }
            Notice::ReadyToInstall { version } => {
                format!("Desktop GPT {version} has been downloaded. Restart to install it.")
            }
            Notice::Failed { message } => {
                format!("Could not check for updates: {message}. Will try again later.")
            }
        }
    }
}

/// Runs `check` after `initial_delay` and then every `interval`. A failed check
/// simply waits for the next tick.
pub async fn run_schedule<F, Fut>(initial_delay: Duration, interval: Duration, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::time::sleep(initial_delay).await;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        check().await;
    }
}
