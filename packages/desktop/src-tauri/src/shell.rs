//! Routes host events to the window controller, the shortcut registry and the
//! window-state store.
//!
//! Every host callback is translated into a [`ShellEvent`] and handed to
//! [`Shell::dispatch`]. Effects that need the async runtime or the app handle
//! come back as a [`Followup`] for the caller to carry out.

use anyhow::Result;
use log::{debug, info};
use url::Url;

use crate::{
    controller::{CloseDecision, LoadFailure, WindowController, WindowHost},
    navigation::{NavigationGuard, NavigationVerdict},
    shortcuts::{default_bindings, install_default_bindings, Chord, HotkeyBackend, ShortcutRegistry},
    templates,
    window_state::WindowStateStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    ToggleWindow,
    ShowWindow,
    NewChat,
    GoBack,
    GoForward,
    Reload,
    ToggleFullscreen,
    ShowShortcutsHelp,
    CheckForUpdates,
    OpenLogs,
    Quit,
}

impl ShellAction {
    pub fn label(self) -> &'static str {
        match self {
            ShellAction::ToggleWindow => "Show/Hide Window",
            ShellAction::ShowWindow => "Show Window",
            ShellAction::NewChat => "New Chat",
            ShellAction::GoBack => "Back",
            ShellAction::GoForward => "Forward",
            ShellAction::Reload => "Reload",
            ShellAction::ToggleFullscreen => "Focus Mode",
            ShellAction::ShowShortcutsHelp => "Show/Hide this help",
            ShellAction::CheckForUpdates => "Check for Updates",
            ShellAction::OpenLogs => "Open Logs Folder",
            ShellAction::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Moved { x: i32, y: i32, maximized: bool },
    Resized { width: u32, height: u32, maximized: bool },
    Focused(bool),
    CloseRequested,
    PageLoadStarted(Url),
    PageLoadFinished(Url),
    LoadFailed(LoadFailure),
    Shortcut(Chord),
    Action(ShellAction),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    None,
    /// Cancel the pending host close.
    PreventClose,
    /// Terminate the process.
    Exit,
    CheckForUpdates,
    /// Check that the load of this URL can reach its server.
    Probe(Url),
    OpenLogs,
}

pub struct Shell<H: WindowHost, B: HotkeyBackend> {
    controller: WindowController<H>,
    shortcuts: ShortcutRegistry<B>,
    window_state: WindowStateStore,
    guard: NavigationGuard,
    torn_down: bool,
}

impl<H: WindowHost, B: HotkeyBackend> Shell<H, B> {
    pub fn new(
        controller: WindowController<H>,
        shortcuts: ShortcutRegistry<B>,
        window_state: WindowStateStore,
        guard: NavigationGuard,
    ) -> Self {
        Self {
            controller,
            shortcuts,
            window_state,
            guard,
            torn_down: false,
        }
    }

    pub fn controller(&self) -> &WindowController<H> {
        &self.controller
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry<B> {
        &self.shortcuts
    }

    pub fn window_state(&self) -> &WindowStateStore {
        &self.window_state
    }

    /// Restores the saved placement, creates the window and installs the
    /// fixed shortcuts.
    pub fn start(&mut self) -> Result<()> {
        let initial = self.window_state.load();
        self.controller.create(&initial)?;
        install_default_bindings(&mut self.shortcuts);
        Ok(())
    }

    pub fn dispatch(&mut self, event: ShellEvent) -> Followup {
        match event {
            ShellEvent::Moved { x, y, maximized } => {
                self.window_state.record_move(x, y, maximized);
                Followup::None
            }
            ShellEvent::Resized {
                width,
                height,
                maximized,
            } => {
                if width == 0 || height == 0 {
                    // Minimized windows report an empty client area.
                    return Followup::None;
                }
                self.window_state.record_resize(width, height, maximized);
                Followup::None
            }
            ShellEvent::Focused(true) => {
                self.shortcuts.focus_gained();
                Followup::None
            }
            ShellEvent::Focused(false) => {
                self.shortcuts.focus_lost();
                Followup::None
            }
            ShellEvent::CloseRequested => match self.controller.intercept_close() {
                CloseDecision::HideToTray => Followup::PreventClose,
                CloseDecision::Proceed => {
                    self.teardown();
                    Followup::None
                }
            },
            ShellEvent::PageLoadStarted(url) => {
                let in_scope = self.guard.verdict(&url) == NavigationVerdict::Inline;
                if self.controller.on_load_started(&url) && in_scope {
                    Followup::Probe(url)
                } else {
                    Followup::None
                }
            }
            ShellEvent::PageLoadFinished(url) => {
                self.controller.on_load_finished(&url);
                Followup::None
            }
            ShellEvent::LoadFailed(failure) => {
                self.controller.on_load_failure(failure);
                Followup::None
            }
            ShellEvent::Shortcut(chord) => match self.shortcuts.activate(&chord) {
                Some(action) => {
                    debug!("[desktop:shortcuts] {chord} -> {action:?}");
                    self.perform(action)
                }
                None => Followup::None,
            },
            ShellEvent::Action(action) => self.perform(action),
            ShellEvent::Exit => {
                self.teardown();
                Followup::None
            }
        }
    }

    fn perform(&mut self, action: ShellAction) -> Followup {
        match action {
            ShellAction::ToggleWindow => self.controller.toggle(),
            ShellAction::ShowWindow => self.controller.show(),
            ShellAction::NewChat => self.controller.new_chat(),
            ShellAction::GoBack => self.controller.go_back(),
            ShellAction::GoForward => self.controller.go_forward(),
            ShellAction::Reload => self.controller.reload(),
            ShellAction::ToggleFullscreen => self.controller.toggle_fullscreen(),
            ShellAction::ShowShortcutsHelp => {
                let script = templates::shortcuts_help_script(&shortcut_help_entries());
                self.controller.run_script("show shortcuts help", &script);
            }
            ShellAction::CheckForUpdates => return Followup::CheckForUpdates,
            ShellAction::OpenLogs => return Followup::OpenLogs,
            ShellAction::Quit => {
                self.controller.quit();
                self.teardown();
                return Followup::Exit;
            }
        }
        Followup::None
    }

    /// Releases OS registrations and saves the window placement. Safe to call
    /// more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.shortcuts.unregister_all();
        self.window_state.flush();
        info!("[desktop] Shell torn down");
    }
}

fn shortcut_help_entries() -> Vec<(String, &'static str)> {
    default_bindings()
        .into_iter()
        .map(|(chord, _, action)| (display_chord(chord), action.label()))
        .collect()
}

fn display_chord(chord: &str) -> String {
    let primary = if cfg!(target_os = "macos") { "Cmd" } else { "Ctrl" };
    chord.replace("CmdOrCtrl", primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::{tests::FakeWindow, Lifecycle},
        navigation::{AllowedDomains, ExternalOpener},
        shortcuts::tests::FakeHotkeys,
        window_state::WindowState,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NoopOpener;

    impl ExternalOpener for NoopOpener {
        fn open(&self, _url: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn shell(dir: &TempDir) -> Shell<FakeWindow, FakeHotkeys> {
        let entry = crate::controller::tests::entry();
        let guard = NavigationGuard::new(AllowedDomains::new(["openai.com"]), Arc::new(NoopOpener));
        let mut shell = Shell::new(
            WindowController::new(FakeWindow::default(), entry),
            ShortcutRegistry::new(FakeHotkeys::default()),
            WindowStateStore::in_directory(dir.path()),
            guard,
        );
        shell.start().unwrap();
        shell
    }

    fn chord(raw: &str) -> Chord {
        raw.parse().unwrap()
    }

    #[test]
    fn start_creates_window_from_saved_state() {
        let dir = TempDir::new().unwrap();
        let mut store = WindowStateStore::in_directory(dir.path());
        let saved = WindowState {
            x: Some(10),
            y: Some(20),
            width: 1000,
            height: 700,
            is_maximized: false,
        };
        store.save(saved);

        let shell = shell(&dir);
        assert_eq!(shell.controller().host().created_with, Some(saved));
        assert_eq!(shell.controller().lifecycle(), Lifecycle::Hidden);
    }

    #[test]
    fn global_shortcut_toggles_window() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);

        shell.dispatch(ShellEvent::Shortcut(chord("CmdOrCtrl+Shift+G")));
        assert_eq!(shell.controller().lifecycle(), Lifecycle::Visible);

        shell.dispatch(ShellEvent::Shortcut(chord("shift+cmdorctrl+g")));
        assert_eq!(shell.controller().lifecycle(), Lifecycle::Hidden);
    }

    #[test]
    fn scoped_shortcuts_only_fire_while_focused() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        let reload = chord("CmdOrCtrl+R");

        shell.dispatch(ShellEvent::Shortcut(reload.clone()));
        assert!(!shell.controller().host().took("reload"));

        shell.dispatch(ShellEvent::Focused(true));
        shell.dispatch(ShellEvent::Shortcut(reload.clone()));
        assert!(shell.controller().host().took("reload"));

        shell.dispatch(ShellEvent::Focused(false));
        assert!(!shell.shortcuts().is_active(&reload));
    }

    #[test]
    fn close_hides_until_quit() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        shell.dispatch(ShellEvent::Action(ShellAction::ShowWindow));

        assert_eq!(shell.dispatch(ShellEvent::CloseRequested), Followup::PreventClose);
        assert_eq!(shell.controller().lifecycle(), Lifecycle::Hidden);

        assert_eq!(shell.dispatch(ShellEvent::Action(ShellAction::Quit)), Followup::Exit);
        assert!(shell.shortcuts().backend().registered.is_empty());

        assert_eq!(shell.dispatch(ShellEvent::CloseRequested), Followup::None);
        assert_eq!(shell.controller().lifecycle(), Lifecycle::Destroyed);
    }

    #[test]
    fn geometry_events_are_persisted() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);

        shell.dispatch(ShellEvent::Resized {
            width: 1000,
            height: 700,
            maximized: false,
        });
        shell.dispatch(ShellEvent::Moved {
            x: 5,
            y: 6,
            maximized: false,
        });
        shell.dispatch(ShellEvent::Resized {
            width: 0,
            height: 0,
            maximized: false,
        });

        let saved = WindowStateStore::in_directory(dir.path()).load();
        assert_eq!((saved.width, saved.height), (1000, 700));
        assert_eq!(saved.position(), Some((5, 6)));
    }

    #[test]
    fn in_scope_loads_are_probed() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        let entry = Url::parse("https://chat.openai.com/").unwrap();

        assert_eq!(
            shell.dispatch(ShellEvent::PageLoadStarted(entry.clone())),
            Followup::Probe(entry)
        );
        assert_eq!(
            shell.dispatch(ShellEvent::PageLoadStarted(Url::parse("about:blank").unwrap())),
            Followup::None
        );
    }

    #[test]
    fn async_actions_become_followups() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        assert_eq!(
            shell.dispatch(ShellEvent::Action(ShellAction::CheckForUpdates)),
            Followup::CheckForUpdates
        );
        assert_eq!(
            shell.dispatch(ShellEvent::Action(ShellAction::OpenLogs)),
            Followup::OpenLogs
        );
    }

    #[test]
    fn shortcuts_help_is_rendered_into_the_page() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        shell.dispatch(ShellEvent::Action(ShellAction::ShowShortcutsHelp));

        let scripts = shell.controller().host().scripts.borrow();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("New Chat"));
        assert!(scripts[0].contains("Alt+Left"));
    }

    #[test]
    fn exit_tears_down_once() {
        let dir = TempDir::new().unwrap();
        let mut shell = shell(&dir);
        shell.dispatch(ShellEvent::Focused(true));

        shell.dispatch(ShellEvent::Exit);
        shell.dispatch(ShellEvent::Exit);

        assert!(shell.shortcuts().backend().registered.is_empty());
        assert!(shell.window_state().path().exists());
    }
}
