use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use log::debug;
use parking_lot::Mutex;
use tauri::{plugin::TauriPlugin, AppHandle, Manager, Wry};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::{
    shell::ShellEvent,
    shortcuts::{Chord, HotkeyBackend},
};

/// Maps OS hotkey ids back to the chords they were registered from.
#[derive(Default, Clone)]
pub struct HotkeyLookup(Arc<Mutex<HashMap<u32, Chord>>>);

impl HotkeyLookup {
    fn chord_for(&self, shortcut: &Shortcut) -> Option<Chord> {
        self.0.lock().get(&shortcut.id()).cloned()
    }
}

pub struct GlobalHotkeys {
    app: AppHandle,
    lookup: HotkeyLookup,
}

impl GlobalHotkeys {
    pub fn new(app: AppHandle, lookup: HotkeyLookup) -> Self {
        Self { app, lookup }
    }
}

fn parse(chord: &Chord) -> Result<Shortcut> {
    chord
        .as_str()
        .parse::<Shortcut>()
        .map_err(|err| anyhow!("unsupported shortcut {chord}: {err}"))
}

impl HotkeyBackend for GlobalHotkeys {
    fn register(&mut self, chord: &Chord) -> Result<()> {
        let shortcut = parse(chord)?;
        let id = shortcut.id();
        self.app.global_shortcut().register(shortcut)?;
        self.lookup.0.lock().insert(id, chord.clone());
        Ok(())
    }

    fn unregister(&mut self, chord: &Chord) -> Result<()> {
        let shortcut = parse(chord)?;
        let id = shortcut.id();
        self.lookup.0.lock().remove(&id);
        self.app.global_shortcut().unregister(shortcut)?;
        Ok(())
    }
}

/// The global-shortcut plugin, forwarding key presses to the shell.
pub fn plugin() -> TauriPlugin<Wry> {
    tauri_plugin_global_shortcut::Builder::new()
        .with_handler(|app, shortcut, event| {
            if event.state != ShortcutState::Pressed {
                return;
            }
            on_pressed(app, shortcut);
        })
        .build()
}

fn on_pressed(app: &AppHandle, shortcut: &Shortcut) {
    let Some(lookup) = app.try_state::<HotkeyLookup>() else {
        return;
    };
    let Some(chord) = lookup.chord_for(shortcut) else {
        debug!("[desktop:shortcuts] Unknown shortcut {}", shortcut.id());
        return;
    };
    super::dispatch(app, ShellEvent::Shortcut(chord));
}
