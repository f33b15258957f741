use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const WINDOW_STATE_FILE_NAME: &str = "window-state.json";

pub const MIN_WIDTH: u32 = 800;
pub const MIN_HEIGHT: u32 = 600;
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 800;

/// Placement of the primary window in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    pub is_maximized: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            is_maximized: false,
        }
    }
}

impl WindowState {
    /// Raises undersized dimensions to the floor.
    pub fn clamped(mut self) -> Self {
        self.width = self.width.max(MIN_WIDTH);
        self.height = self.height.max(MIN_HEIGHT);
        self
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        Some((self.x?, self.y?))
    }

    /// Reads a persisted object field by field. Anything missing or mistyped
    /// keeps its default value.
    fn from_json_lenient(value: &Value) -> Self {
        let mut state = Self::default();
        let Some(object) = value.as_object() else {
            return state;
        };

        let int_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_f64)
                .filter(|value| value.is_finite())
                .map(f64::round)
        };

        if let Some(x) = int_field("x") {
            state.x = Some(x.clamp(i32::MIN as f64, i32::MAX as f64) as i32);
        }
        if let Some(y) = int_field("y") {
            state.y = Some(y.clamp(i32::MIN as f64, i32::MAX as f64) as i32);
        }
        if let Some(width) = int_field("width").filter(|value| *value > 0.0) {
            state.width = width.min(u32::MAX as f64) as u32;
        }
        if let Some(height) = int_field("height").filter(|value| *value > 0.0) {
            state.height = height.min(u32::MAX as f64) as u32;
        }
        if let Some(is_maximized) = object.get("isMaximized").and_then(Value::as_bool) {
            state.is_maximized = is_maximized;
        }

        state.clamped()
    }
}

/// Owns the persisted window placement.
///
/// The store is the single writer of its file. Read and write failures are
/// logged and never surfaced to callers.
#[derive(Debug)]
pub struct WindowStateStore {
    path: PathBuf,
    current: WindowState,
}

impl WindowStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: WindowState::default(),
        }
    }

    pub fn in_directory(dir: &Path) -> Self {
        Self::new(dir.join(WINDOW_STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> WindowState {
        self.current
    }

    pub fn load(&mut self) -> WindowState {
        self.current = match read_state_file(&self.path) {
            Ok(Some(state)) => {
                debug!("[desktop:window-state] Loaded {:?}", state);
                state
            }
            Ok(None) => {
                info!(
                    "[desktop:window-state] No saved state at {}; using defaults",
                    self.path.display()
                );
                WindowState::default()
            }
            Err(err) => {
                warn!("[desktop:window-state] Failed to load window state: {err:#}");
                WindowState::default()
            }
        };
        self.current
    }

    pub fn save(&mut self, state: WindowState) {
        self.current = state.clamped();
        if let Err(err) = write_state_file(&self.path, &self.current) {
            warn!("[desktop:window-state] Failed to persist window state: {err:#}");
        }
    }

    /// Persists the current state, used on shutdown.
    pub fn flush(&mut self) {
        self.save(self.current);
    }

    pub fn record_resize(&mut self, width: u32, height: u32, is_maximized: bool) {
        let mut next = self.current;
        next.is_maximized = is_maximized;
        // Maximized geometry would overwrite the bounds restored on unmaximize.
        if !is_maximized {
            next.width = width;
            next.height = height;
        }
        self.apply(next.clamped());
    }

    pub fn record_move(&mut self, x: i32, y: i32, is_maximized: bool) {
        let mut next = self.current;
        next.is_maximized = is_maximized;
        if !is_maximized {
            next.x = Some(x);
            next.y = Some(y);
        }
        self.apply(next);
    }

    pub fn record_maximized(&mut self, is_maximized: bool) {
        let mut next = self.current;
        next.is_maximized = is_maximized;
        self.apply(next);
    }

    fn apply(&mut self, next: WindowState) {
        if next != self.current {
            self.save(next);
        }
    }
}

fn read_state_file(path: &Path) -> Result<Option<WindowState>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("reading {}", path.display()));
        }
    };

    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(WindowState::from_json_lenient(&value)))
}

fn write_state_file(path: &Path, state: &WindowState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let bytes = serde_json::to_vec_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
