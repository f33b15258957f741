use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use tauri::{AppHandle, Manager};
use url::Url;

use crate::{controller::LoadFailure, shell::ShellEvent};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks that a page the webview is loading can be reached at all.
///
/// Any HTTP response counts as reachable; the page renders its own error for
/// 4xx/5xx. Only transport failures produce the offline fallback.
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(concat!("desktop-gpt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub async fn probe(&self, url: &Url) -> Result<(), LoadFailure> {
        match self.client.head(url.clone()).send().await {
            Ok(response) => {
                debug!(
                    "[desktop:probe] {} reachable ({})",
                    url,
                    response.status()
                );
                Ok(())
            }
            Err(err) => Err(describe(url, &err)),
        }
    }
}

fn describe(url: &Url, err: &reqwest::Error) -> LoadFailure {
    let (code, description) = if err.is_timeout() {
        ("ERR_TIMED_OUT", "The server took too long to respond.")
    } else if err.is_connect() {
        (
            "ERR_CONNECTION_FAILED",
            "Could not connect. Check your internet connection.",
        )
    } else {
        ("ERR_FAILED", "The page could not be loaded.")
    };
    LoadFailure {
        code: code.to_string(),
        description: description.to_string(),
        url: url.to_string(),
    }
}

/// Probes `url` in the background and reports a failure back to the shell on
/// the main thread.
pub fn spawn(app: AppHandle, url: Url) {
    tauri::async_runtime::spawn(async move {
        let outcome = match app.try_state::<Prober>() {
            Some(prober) => prober.probe(&url).await,
            None => return,
        };
        let Err(failure) = outcome else {
            return;
        };

        let handle = app.clone();
        if let Err(err) = app.run_on_main_thread(move || {
            super::dispatch(&handle, ShellEvent::LoadFailed(failure));
        }) {
            warn!("[desktop:probe] Failed to report load failure: {err}");
        }
    });
}
