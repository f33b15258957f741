use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_updater::{Update, UpdaterExt};

use crate::{
    config::APP_NAME,
    shell::ShellEvent,
    updates::{run_schedule, Notice, UpdateNotifier, UpdateStatus},
};

const INITIAL_CHECK_DELAY: Duration = Duration::from_secs(10);

struct PendingInstall {
    update: Update,
    bytes: Vec<u8>,
}

pub struct UpdaterState {
    notifier: Mutex<UpdateNotifier>,
    pending: Mutex<Option<PendingInstall>>,
}

impl UpdaterState {
    pub fn new(enabled: bool) -> Self {
        Self {
            notifier: Mutex::new(UpdateNotifier::new(enabled)),
            pending: Mutex::new(None),
        }
    }
}

pub fn spawn_schedule(app: AppHandle, interval: Duration) {
    info!(
        "[desktop:updater] Checking every {} minutes",
        interval.as_secs() / 60
    );
    tauri::async_runtime::spawn(async move {
        run_schedule(INITIAL_CHECK_DELAY, interval, || check_now(app.clone())).await;
    });
}

/// One check, download included. Overlapping calls return immediately.
pub async fn check_now(app: AppHandle) {
    let Some(state) = app.try_state::<UpdaterState>() else {
        return;
    };
    if !state.notifier.lock().begin_check() {
        return;
    }

    run_check(&app, &state).await;
    state.notifier.lock().finish_check();
}

async fn run_check(app: &AppHandle, state: &UpdaterState) {
    let updater = match app.updater() {
        Ok(updater) => updater,
        Err(err) => return report(app, state, UpdateStatus::Error(err.to_string())),
    };

    let update = match updater.check().await {
        Ok(Some(update)) => update,
        Ok(None) => return report(app, state, UpdateStatus::None),
        Err(err) => return report(app, state, UpdateStatus::Error(err.to_string())),
    };

    let version = update.version.clone();
    let already_downloaded = state
        .pending
        .lock()
        .as_ref()
        .is_some_and(|pending| pending.update.version == version);
    if already_downloaded {
        debug!("[desktop:updater] Update {version} already downloaded; waiting for restart");
        return;
    }

    report(
        app,
        state,
        UpdateStatus::Available {
            version: version.clone(),
        },
    );

    match update.download(|_, _| {}, || {}).await {
        Ok(bytes) => {
            *state.pending.lock() = Some(PendingInstall { update, bytes });
            report(app, state, UpdateStatus::Downloaded { version });
        }
        Err(err) => report(app, state, UpdateStatus::Error(err.to_string())),
    }
}

fn report(app: &AppHandle, state: &UpdaterState, status: UpdateStatus) {
    let notice = state.notifier.lock().observe(status);
    if let Some(notice) = notice {
        present(app, notice);
    }
}

fn present(app: &AppHandle, notice: Notice) {
    if let Err(err) = app
        .notification()
        .builder()
        .title(notice.title())
        .body(notice.body())
        .show()
    {
        warn!("[desktop:updater] Failed to show notification: {err}");
    }

    if let Notice::ReadyToInstall { version } = notice {
        let handle = app.clone();
        app.dialog()
            .message(format!(
                "{APP_NAME} {version} is ready. Restart now to install it?"
            ))
            .title(format!("Update {version}"))
            .buttons(MessageDialogButtons::OkCancelCustom(
                "Restart Now".into(),
                "Later".into(),
            ))
            .show(move |restart| {
                if restart {
                    install_pending(&handle);
                }
            });
    }
}

fn install_pending(app: &AppHandle) {
    let Some(state) = app.try_state::<UpdaterState>() else {
        return;
    };
    let Some(pending) = state.pending.lock().take() else {
        warn!("[desktop:updater] No downloaded update to install");
        return;
    };

    info!("[desktop:updater] Installing {}", pending.update.version);
    if let Err(err) = pending.update.install(&pending.bytes) {
        report(app, &state, UpdateStatus::Error(err.to_string()));
        return;
    }

    let handle = app.clone();
    if let Err(err) = app.run_on_main_thread(move || {
        super::dispatch(&handle, ShellEvent::Exit);
        handle.restart();
    }) {
        warn!("[desktop:updater] Failed to schedule restart: {err}");
    }
}
