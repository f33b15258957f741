//! Lifecycle of the single primary window.
//!
//! The controller never talks to a toolkit directly. Everything it needs from
//! the windowing host goes through [`WindowHost`], which keeps the state
//! machine testable without a real window.

use anyhow::Result;
use log::{debug, info, warn};
use url::Url;

use crate::{templates::LoadErrorPage, window_state::WindowState};

const MAX_HISTORY_ENTRIES: usize = 100;

/// Operations the controller consumes from the windowing toolkit.
pub trait WindowHost {
    /// Builds the native window, hidden, sized and placed per `initial`.
    fn create(&mut self, initial: &WindowState) -> Result<()>;
    fn show(&self) -> Result<()>;
    fn hide(&self) -> Result<()>;
    fn focus(&self) -> Result<()>;
    fn unminimize(&self) -> Result<()>;
    fn destroy(&self) -> Result<()>;

    fn is_visible(&self) -> bool;
    fn is_focused(&self) -> bool;
    fn is_minimized(&self) -> bool;
    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&self, fullscreen: bool) -> Result<()>;

    fn navigate(&self, url: &Url) -> Result<()>;
    fn reload(&self) -> Result<()>;
    fn go_back(&self) -> Result<()>;
    fn go_forward(&self) -> Result<()>;
    /// Runs a script in the current document.
    fn eval(&self, script: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Hidden,
    Visible,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    Pending,
    Loaded,
    LoadFailed { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Cancel the close and keep the process resident in the tray.
    HideToTray,
    /// Let the host destroy the window.
    Proceed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub code: String,
    pub description: String,
    pub url: String,
}

/// Back/forward availability derived from finished page loads.
#[derive(Debug, Default)]
struct NavigationHistory {
    entries: Vec<String>,
    cursor: usize,
    traversing: bool,
}

impl NavigationHistory {
    fn record(&mut self, url: &str) {
        if self.traversing && !self.entries.is_empty() {
            self.traversing = false;
            self.entries[self.cursor] = url.to_string();
            return;
        }
        self.traversing = false;

        if self.entries.get(self.cursor).map(String::as_str) == Some(url) {
            return;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(url.to_string());
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    fn step_back(&mut self) {
        self.cursor -= 1;
        self.traversing = true;
    }

    fn step_forward(&mut self) {
        self.cursor += 1;
        self.traversing = true;
    }
}

pub struct WindowController<H: WindowHost> {
    host: H,
    entry_url: Url,
    lifecycle: Lifecycle,
    content: ContentState,
    run_state: RunState,
    current_load: Option<String>,
    last_failure: Option<LoadFailure>,
    revealed: bool,
    history: NavigationHistory,
}

impl<H: WindowHost> WindowController<H> {
    pub fn new(host: H, entry_url: Url) -> Self {
        Self {
            host,
            entry_url,
            lifecycle: Lifecycle::Uninitialized,
            content: ContentState::Pending,
            run_state: RunState::Running,
            current_load: None,
            last_failure: None,
            revealed: false,
            history: NavigationHistory::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn content(&self) -> &ContentState {
        &self.content
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    fn is_alive(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Hidden | Lifecycle::Visible)
    }

    /// Builds the window hidden. It is revealed once content signals ready.
    pub fn create(&mut self, initial: &WindowState) -> Result<()> {
        if self.lifecycle != Lifecycle::Uninitialized {
            warn!("[desktop:window] Window already created; ignoring create");
            return Ok(());
        }
        self.host.create(initial)?;
        self.lifecycle = Lifecycle::Hidden;
        info!(
            "[desktop:window] Created {}x{} window for {}",
            initial.width, initial.height, self.entry_url
        );
        Ok(())
    }

    pub fn show(&mut self) {
        if !self.is_alive() {
            return;
        }
        if self.host.is_minimized() {
            log_host_error("unminimize", self.host.unminimize());
        }
        log_host_error("show", self.host.show());
        log_host_error("focus", self.host.focus());
        self.lifecycle = Lifecycle::Visible;
        self.revealed = true;
    }

    pub fn hide(&mut self) {
        if !self.is_alive() {
            return;
        }
        log_host_error("hide", self.host.hide());
        self.lifecycle = Lifecycle::Hidden;
    }

    /// Hides a window the user is looking at; surfaces it otherwise. A window
    /// that is visible but behind other windows gets surfaced, not hidden.
    pub fn toggle(&mut self) {
        let in_front =
            self.host.is_visible() && self.host.is_focused() && !self.host.is_minimized();
        if in_front {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn quit(&mut self) {
        if self.run_state == RunState::Running {
            info!("[desktop:window] Quit requested");
        }
        self.run_state = RunState::Quitting;
    }

    pub fn intercept_close(&mut self) -> CloseDecision {
        match self.run_state {
            RunState::Running => {
                debug!("[desktop:window] Close intercepted; hiding to tray");
                self.hide();
                CloseDecision::HideToTray
            }
            RunState::Quitting => {
                self.lifecycle = Lifecycle::Destroyed;
                CloseDecision::Proceed
            }
        }
    }

    pub fn destroy(&mut self) {
        if !self.is_alive() {
            return;
        }
        log_host_error("destroy", self.host.destroy());
        self.lifecycle = Lifecycle::Destroyed;
    }

    /// Tracks a new top-level load. Returns true when the load should be
    /// checked for reachability.
    pub fn on_load_started(&mut self, url: &Url) -> bool {
        self.current_load = Some(url.to_string());
        self.content = ContentState::Pending;
        matches!(url.scheme(), "http" | "https")
    }

    pub fn on_load_finished(&mut self, url: &Url) {
        if !self.is_alive() {
            return;
        }
        self.history.record(url.as_str());

        match &self.content {
            // The host finished its own error document for the failed load.
            ContentState::LoadFailed { url: failed } if failed == url.as_str() => {
                self.render_fallback();
            }
            _ => self.content = ContentState::Loaded,
        }

        if !self.revealed {
            self.show();
        }
    }

    /// Replaces the page with the local fallback. Retrying is left to the user.
    pub fn on_load_failure(&mut self, failure: LoadFailure) {
        if !self.is_alive() {
            return;
        }
        if let Some(current) = &self.current_load {
            if *current != failure.url {
                debug!(
                    "[desktop:window] Ignoring stale load failure for {}",
                    failure.url
                );
                return;
            }
        }

        warn!(
            "[desktop:window] Load of {} failed ({}): {}",
            failure.url, failure.code, failure.description
        );
        self.content = ContentState::LoadFailed {
            url: failure.url.clone(),
        };
        self.last_failure = Some(failure);
        self.render_fallback();

        if !self.revealed {
            self.show();
        }
    }

    fn render_fallback(&self) {
        let Some(failure) = &self.last_failure else {
            return;
        };
        let page = LoadErrorPage {
            code: &failure.code,
            description: &failure.description,
            failed_url: &failure.url,
            entry_url: self.entry_url.as_str(),
        };
        log_host_error("render fallback", self.host.eval(&page.to_script()));
    }

    pub fn reload(&mut self) {
        if !self.is_alive() {
            return;
        }
        if let ContentState::LoadFailed { url } = &self.content {
            if let Ok(url) = Url::parse(url) {
                log_host_error("retry", self.host.navigate(&url));
                return;
            }
        }
        log_host_error("reload", self.host.reload());
    }

    pub fn go_back(&mut self) {
        if !self.is_alive() || !self.history.can_go_back() {
            return;
        }
        // The cursor follows the host only once the traversal was issued.
        match self.host.go_back() {
            Ok(()) => self.history.step_back(),
            Err(err) => log_host_error("go back", Err(err)),
        }
    }

    pub fn go_forward(&mut self) {
        if !self.is_alive() || !self.history.can_go_forward() {
            return;
        }
        match self.host.go_forward() {
            Ok(()) => self.history.step_forward(),
            Err(err) => log_host_error("go forward", Err(err)),
        }
    }

    pub fn new_chat(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.show();
        let entry = self.entry_url.clone();
        log_host_error("open new chat", self.host.navigate(&entry));
    }

    pub fn toggle_fullscreen(&mut self) {
        if !self.is_alive() {
            return;
        }
        let next = !self.host.is_fullscreen();
        log_host_error("toggle fullscreen", self.host.set_fullscreen(next));
    }

    pub fn run_script(&mut self, what: &str, script: &str) {
        if !self.is_alive() {
            return;
        }
        log_host_error(what, self.host.eval(script));
    }
}

fn log_host_error(what: &str, result: Result<()>) {
    if let Err(err) = result {
        warn!("[desktop:window] Failed to {what}: {err:#}");
    }
}
