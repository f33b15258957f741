use std::path::PathBuf;

use log::LevelFilter;
use tauri_plugin_log::{Target, TargetKind};

#[cfg(target_os = "macos")]
const PLATFORM_LOG_SEGMENTS: &[&str] = &["Library", "Logs", "Desktop GPT"];
#[cfg(not(target_os = "macos"))]
const PLATFORM_LOG_SEGMENTS: &[&str] = &[".config", "desktop-gpt", "logs"];

pub const LOG_FILE_STEM: &str = "desktop-gpt";

pub fn log_directory() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    for segment in PLATFORM_LOG_SEGMENTS {
        path.push(segment);
    }
    Some(path)
}

/// Log plugin writing to stdout and the log folder.
pub fn plugin<R: tauri::Runtime>(dev_mode: bool) -> tauri::plugin::TauriPlugin<R> {
    let level = if dev_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = tauri_plugin_log::Builder::default()
        .level(level)
        .level_for("tauri_plugin_updater", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .clear_targets()
        .target(Target::new(TargetKind::Stdout));

    if let Some(dir) = log_directory() {
        builder = builder.target(Target::new(TargetKind::Folder {
            path: dir,
            file_name: Some(LOG_FILE_STEM.into()),
        }));
    }

    builder.build()
}
