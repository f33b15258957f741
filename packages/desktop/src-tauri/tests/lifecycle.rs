use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use desktop_gpt::{
    controller::{Lifecycle, LoadFailure, WindowController, WindowHost},
    navigation::{AllowedDomains, ExternalOpener, NavigationGuard},
    shell::{Followup, Shell, ShellAction, ShellEvent},
    shortcuts::{Chord, HotkeyBackend, ShortcutRegistry},
    window_state::{WindowState, WindowStateStore},
};
use parking_lot::Mutex;
use tempfile::TempDir;
use url::Url;

#[derive(Default)]
struct RecordingWindow {
    created_with: Option<WindowState>,
    visible: Cell<bool>,
    focused: Cell<bool>,
    scripts: RefCell<Vec<String>>,
}

impl WindowHost for RecordingWindow {
    fn create(&mut self, initial: &WindowState) -> anyhow::Result<()> {
        self.created_with = Some(*initial);
        Ok(())
    }
    fn show(&self) -> anyhow::Result<()> {
        self.visible.set(true);
        Ok(())
    }
    fn hide(&self) -> anyhow::Result<()> {
        self.visible.set(false);
        self.focused.set(false);
        Ok(())
    }
    fn focus(&self) -> anyhow::Result<()> {
        self.focused.set(true);
        Ok(())
    }
    fn unminimize(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn is_visible(&self) -> bool {
        self.visible.get()
    }
    fn is_focused(&self) -> bool {
        self.focused.get()
    }
    fn is_minimized(&self) -> bool {
        false
    }
    fn is_fullscreen(&self) -> bool {
        false
    }
    fn set_fullscreen(&self, _fullscreen: bool) -> anyhow::Result<()> {
        Ok(())
    }
    fn navigate(&self, _url: &Url) -> anyhow::Result<()> {
        Ok(())
    }
    fn reload(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn go_back(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn go_forward(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn eval(&self, script: &str) -> anyhow::Result<()> {
        self.scripts.borrow_mut().push(script.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct CountingHotkeys {
    registered: Vec<Chord>,
}

impl HotkeyBackend for CountingHotkeys {
    fn register(&mut self, chord: &Chord) -> anyhow::Result<()> {
        self.registered.push(chord.clone());
        Ok(())
    }
    fn unregister(&mut self, chord: &Chord) -> anyhow::Result<()> {
        self.registered.retain(|registered| registered != chord);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl ExternalOpener for RecordingOpener {
    fn open(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

fn entry() -> Url {
    Url::parse("https://chat.openai.com/").unwrap()
}

fn launch(
    dir: &TempDir,
    opener: Arc<RecordingOpener>,
) -> Shell<RecordingWindow, CountingHotkeys> {
    let guard = NavigationGuard::new(AllowedDomains::new(["openai.com", "chatgpt.com"]), opener);
    let mut shell = Shell::new(
        WindowController::new(RecordingWindow::default(), entry()),
        ShortcutRegistry::new(CountingHotkeys::default()),
        WindowStateStore::in_directory(dir.path()),
        guard,
    );
    shell.start().unwrap();
    shell
}

#[test]
fn window_size_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let opener = Arc::new(RecordingOpener::default());

    let mut first = launch(&dir, opener.clone());
    let created = first.controller().host().created_with.unwrap();
    assert_eq!((created.width, created.height), (1200, 800));
    assert_eq!(created.position(), None);

    first.dispatch(ShellEvent::Resized {
        width: 1000,
        height: 700,
        maximized: false,
    });
    first.dispatch(ShellEvent::Exit);
    drop(first);

    let second = launch(&dir, opener);
    let restored = second.controller().host().created_with.unwrap();
    assert_eq!((restored.width, restored.height), (1000, 700));
    assert!(!restored.is_maximized);
}

#[test]
fn window_is_revealed_by_first_page_load_and_hides_to_tray() {
    let dir = TempDir::new().unwrap();
    let mut shell = launch(&dir, Arc::new(RecordingOpener::default()));
    assert_eq!(shell.controller().lifecycle(), Lifecycle::Hidden);
    assert!(!shell.controller().host().visible.get());

    let followup = shell.dispatch(ShellEvent::PageLoadStarted(entry()));
    assert_eq!(followup, Followup::Probe(entry()));
    shell.dispatch(ShellEvent::PageLoadFinished(entry()));
    assert_eq!(shell.controller().lifecycle(), Lifecycle::Visible);
    assert!(shell.controller().host().visible.get());

    assert_eq!(
        shell.dispatch(ShellEvent::CloseRequested),
        Followup::PreventClose
    );
    assert_eq!(shell.controller().lifecycle(), Lifecycle::Hidden);

    assert_eq!(
        shell.dispatch(ShellEvent::Action(ShellAction::Quit)),
        Followup::Exit
    );
    assert!(shell.shortcuts().backend().registered.is_empty());
    assert_eq!(shell.dispatch(ShellEvent::CloseRequested), Followup::None);
}

#[test]
fn unreachable_entry_page_shows_the_fallback() {
    let dir = TempDir::new().unwrap();
    let mut shell = launch(&dir, Arc::new(RecordingOpener::default()));

    shell.dispatch(ShellEvent::PageLoadStarted(entry()));
    shell.dispatch(ShellEvent::LoadFailed(LoadFailure {
        code: "ERR_CONNECTION_FAILED".into(),
        description: "Could not connect.".into(),
        url: entry().to_string(),
    }));

    assert_eq!(shell.controller().lifecycle(), Lifecycle::Visible);
    let scripts = shell.controller().host().scripts.borrow();
    let fallback = scripts.last().expect("fallback rendered");
    assert!(fallback.contains("ERR_CONNECTION_FAILED"));
}

#[test]
fn foreign_links_leave_the_app() {
    let dir = TempDir::new().unwrap();
    let opener = Arc::new(RecordingOpener::default());
    let mut shell = launch(&dir, opener.clone());
    let guard = NavigationGuard::new(AllowedDomains::new(["openai.com"]), opener.clone());

    // Out-of-scope loads are not probed.
    let docs = Url::parse("https://example.com/docs").unwrap();
    assert_eq!(shell.dispatch(ShellEvent::PageLoadStarted(docs)), Followup::None);

    assert!(guard.allow_navigation(&Url::parse("https://auth.openai.com/login").unwrap()));
    assert!(!guard.allow_navigation(&Url::parse("https://example.com/docs").unwrap()));
    assert_eq!(*opener.opened.lock(), vec!["https://example.com/docs".to_string()]);
}

#[test]
fn global_shortcuts_are_registered_at_startup() {
    let dir = TempDir::new().unwrap();
    let shell = launch(&dir, Arc::new(RecordingOpener::default()));
    let registered = &shell.shortcuts().backend().registered;

    let toggle: Chord = "CmdOrCtrl+Shift+G".parse().unwrap();
    let reload: Chord = "CmdOrCtrl+R".parse().unwrap();
    assert!(registered.contains(&toggle));
    assert!(!registered.contains(&reload));
}
