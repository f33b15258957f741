//! Tauri implementations of the collaborator traits, plus the glue that turns
//! Tauri callbacks into [`ShellEvent`]s.

pub mod hotkeys;
pub mod menu;
pub mod probe;
pub mod tray;
pub mod updater;
pub mod window;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use log::{info, warn};
use parking_lot::{Mutex, MutexGuard};
use tauri::{AppHandle, Manager, Window, WindowEvent};
use tauri_plugin_shell::ShellExt;

use crate::{
    config::ShellConfig,
    controller::WindowController,
    logging,
    navigation::{ExternalOpener, NavigationGuard},
    shell::{Followup, Shell, ShellEvent},
    shortcuts::ShortcutRegistry,
    window_state::WindowStateStore,
};
use hotkeys::{GlobalHotkeys, HotkeyLookup};
use probe::Prober;
use updater::UpdaterState;
use window::{TauriWindow, MAIN_WINDOW_LABEL};

pub type AppShell = Shell<TauriWindow, GlobalHotkeys>;

pub struct ShellState(Mutex<AppShell>);

impl ShellState {
    fn try_lock(&self) -> Option<MutexGuard<'_, AppShell>> {
        self.0.try_lock()
    }
}

/// Opens URLs and folders with the system handler.
pub struct ShellOpener {
    app: AppHandle,
}

impl ShellOpener {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ExternalOpener for ShellOpener {
    fn open(&self, url: &str) -> Result<()> {
        #[allow(deprecated)]
        self.app.shell().open(url, None)?;
        Ok(())
    }
}

pub fn setup(app: &AppHandle, dev_mode: bool) -> Result<()> {
    let config_dir = app.path().app_config_dir().ok();
    let config = ShellConfig::load(config_dir.as_deref(), dev_mode)?;
    info!(
        "[desktop] Starting {} (dev mode: {}, updates: {})",
        config.entry_url, config.dev_mode, config.updates_enabled
    );
    info!(
        "[desktop] Allowed domains: {}",
        config.allowed_domains.iter().collect::<Vec<_>>().join(", ")
    );

    let opener: Arc<dyn ExternalOpener> = Arc::new(ShellOpener::new(app.clone()));
    let guard = NavigationGuard::new(config.allowed_domains.clone(), opener);

    let lookup = HotkeyLookup::default();
    app.manage(lookup.clone());

    let window = TauriWindow::new(
        app.clone(),
        guard.clone(),
        config.entry_url.clone(),
        config.dev_mode,
    );
    let shell = Shell::new(
        WindowController::new(window, config.entry_url.clone()),
        ShortcutRegistry::new(GlobalHotkeys::new(app.clone(), lookup)),
        WindowStateStore::in_directory(&state_directory(app)?),
        guard,
    );

    app.manage(ShellState(Mutex::new(shell)));
    app.manage(Prober::new()?);
    app.manage(UpdaterState::new(config.updates_enabled));

    {
        let state = app.state::<ShellState>();
        let mut shell = state
            .try_lock()
            .ok_or_else(|| anyhow!("shell busy during startup"))?;
        shell.start()?;
    }

    tray::build(app)?;

    if config.updates_enabled {
        updater::spawn_schedule(app.clone(), config.update_interval);
    }

    Ok(())
}

fn state_directory(app: &AppHandle) -> Result<PathBuf> {
    match app.path().app_data_dir() {
        Ok(dir) => Ok(dir),
        Err(err) => {
            warn!("[desktop] App data dir unavailable ({err}); falling back to config dir");
            dirs::config_dir()
                .map(|dir| dir.join("desktop-gpt"))
                .ok_or_else(|| anyhow!("no per-user data directory"))
        }
    }
}

/// Hands `event` to the shell and carries out the follow-up.
///
/// Returns `None` when the shell is already handling an event on this thread;
/// the event is then queued on the main thread instead of deadlocking.
pub fn dispatch(app: &AppHandle, event: ShellEvent) -> Option<Followup> {
    let state = app.try_state::<ShellState>()?;
    let Some(mut shell) = state.try_lock() else {
        defer(app, event);
        return None;
    };
    let followup = shell.dispatch(event);
    drop(shell);

    perform(app, &followup);
    Some(followup)
}

fn defer(app: &AppHandle, event: ShellEvent) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let handle = app.clone();
        if let Err(err) = app.run_on_main_thread(move || {
            dispatch(&handle, event);
        }) {
            warn!("[desktop] Failed to queue shell event: {err}");
        }
    });
}

fn perform(app: &AppHandle, followup: &Followup) {
    match followup {
        Followup::None | Followup::PreventClose => {}
        Followup::Exit => app.exit(0),
        Followup::CheckForUpdates => {
            tauri::async_runtime::spawn(updater::check_now(app.clone()));
        }
        Followup::Probe(url) => probe::spawn(app.clone(), url.clone()),
        Followup::OpenLogs => open_logs(app),
    }
}

fn open_logs(app: &AppHandle) {
    let Some(dir) = logging::log_directory() else {
        warn!("[desktop] Log location unavailable");
        return;
    };
    if let Err(err) = std::fs::create_dir_all(&dir) {
        warn!("[desktop] Failed to create {}: {err}", dir.display());
        return;
    }
    if let Err(err) = ShellOpener::new(app.clone()).open(&dir.to_string_lossy()) {
        warn!("[desktop] Failed to open logs folder: {err:#}");
    }
}

pub fn on_window_event(window: &Window, event: &WindowEvent) {
    if window.label() != MAIN_WINDOW_LABEL {
        return;
    }
    let app = window.app_handle();

    match event {
        WindowEvent::Moved(position) => {
            if window.is_minimized().unwrap_or(false) {
                return;
            }
            let scale = window.scale_factor().unwrap_or(1.0);
            let logical = position.to_logical::<f64>(scale);
            dispatch(
                app,
                ShellEvent::Moved {
                    x: logical.x.round() as i32,
                    y: logical.y.round() as i32,
                    maximized: window.is_maximized().unwrap_or(false),
                },
            );
        }
        WindowEvent::Resized(size) => {
            if window.is_minimized().unwrap_or(false) {
                return;
            }
            let scale = window.scale_factor().unwrap_or(1.0);
            let logical = size.to_logical::<f64>(scale);
            dispatch(
                app,
                ShellEvent::Resized {
                    width: logical.width.round() as u32,
                    height: logical.height.round() as u32,
                    maximized: window.is_maximized().unwrap_or(false),
                },
            );
        }
        WindowEvent::Focused(focused) => {
            dispatch(app, ShellEvent::Focused(*focused));
        }
        WindowEvent::CloseRequested { api, .. } => {
            if dispatch(app, ShellEvent::CloseRequested) != Some(Followup::None) {
                api.prevent_close();
            }
        }
        _ => {}
    }
}
