//! Desktop shell around the ChatGPT web app: one remote-content window, a
//! tray icon, keyboard shortcuts and background update checks.
//!
//! Window behavior lives in toolkit-free modules ([`controller`], [`shell`],
//! [`shortcuts`], [`navigation`]); [`host`] adapts them to Tauri.

pub mod config;
pub mod controller;
pub mod host;
pub mod logging;
pub mod navigation;
pub mod shell;
pub mod shortcuts;
pub mod templates;
pub mod updates;
pub mod window_state;
