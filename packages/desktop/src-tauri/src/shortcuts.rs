//! Keyboard chords bound to shell actions.
//!
//! Global bindings stay registered with the OS for the life of the process.
//! Focus-scoped bindings are registered only while the window has focus, so
//! a chord like `CmdOrCtrl+R` is released to other apps when we are in the
//! background.

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::{anyhow, bail};
use log::{debug, info, warn};

use crate::shell::ShellAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutScope {
    Global,
    FocusOnly,
}

const MODIFIER_ORDER: &[&str] = &["CmdOrCtrl", "Ctrl", "Alt", "Shift", "Super"];

/// A parsed key chord in canonical form, e.g. `CmdOrCtrl+Shift+G`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chord(String);

impl Chord {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Chord {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut modifiers = [false; MODIFIER_ORDER.len()];
        let mut key: Option<String> = None;

        for token in raw.split('+').map(str::trim) {
            if token.is_empty() {
                bail!("empty token in chord {raw:?}");
            }
            let modifier = match token.to_ascii_lowercase().as_str() {
                "cmdorctrl" | "commandorcontrol" | "cmdorcontrol" | "commandorctrl" => Some(0),
                "ctrl" | "control" => Some(1),
                "alt" | "option" => Some(2),
                "shift" => Some(3),
                "super" | "cmd" | "command" | "meta" | "win" => Some(4),
                _ => None,
            };
            match modifier {
                Some(index) => modifiers[index] = true,
                None if key.is_none() => key = Some(canonical_key(token)),
                None => bail!("chord {raw:?} names more than one key"),
            }
        }

        let key = key.ok_or_else(|| anyhow!("chord {raw:?} has no key"))?;
        let mut parts: Vec<&str> = MODIFIER_ORDER
            .iter()
            .zip(modifiers)
            .filter_map(|(name, set)| set.then_some(*name))
            .collect();
        parts.push(&key);
        Ok(Self(parts.join("+")))
    }
}

fn canonical_key(token: &str) -> String {
    if token.chars().count() == 1 {
        return token.to_ascii_uppercase();
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// OS-level hotkey registration.
pub trait HotkeyBackend {
    fn register(&mut self, chord: &Chord) -> anyhow::Result<()>;
    fn unregister(&mut self, chord: &Chord) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
struct Binding {
    scope: ShortcutScope,
    action: ShellAction,
    active: bool,
}

pub struct ShortcutRegistry<B: HotkeyBackend> {
    backend: B,
    bindings: BTreeMap<Chord, Binding>,
    focused: bool,
}

impl<B: HotkeyBackend> ShortcutRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bindings: BTreeMap::new(),
            focused: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn register_global(&mut self, chord: &Chord, action: ShellAction) {
        self.bind(chord, ShortcutScope::Global, action);
    }

    pub fn unregister_global(&mut self, chord: &Chord) -> bool {
        self.unbind(chord, ShortcutScope::Global)
    }

    /// Declares a binding that is live only while the window is focused.
    pub fn register_scoped(&mut self, chord: &Chord, action: ShellAction) {
        self.bind(chord, ShortcutScope::FocusOnly, action);
    }

    pub fn unregister_scoped(&mut self, chord: &Chord) -> bool {
        self.unbind(chord, ShortcutScope::FocusOnly)
    }

    pub fn focus_gained(&mut self) {
        if self.focused {
            return;
        }
        self.focused = true;
        let scoped: Vec<Chord> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.scope == ShortcutScope::FocusOnly && !binding.active)
            .map(|(chord, _)| chord.clone())
            .collect();
        for chord in scoped {
            self.activate_binding(&chord);
        }
    }

    pub fn focus_lost(&mut self) {
        if !self.focused {
            return;
        }
        self.focused = false;
        let scoped: Vec<Chord> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.scope == ShortcutScope::FocusOnly && binding.active)
            .map(|(chord, _)| chord.clone())
            .collect();
        for chord in scoped {
            self.deactivate_binding(&chord);
        }
    }

    /// Resolves a pressed chord to its action, if a live binding owns it.
    pub fn activate(&self, chord: &Chord) -> Option<ShellAction> {
        let binding = self.bindings.get(chord)?;
        if !binding.active {
            debug!("[desktop:shortcuts] Ignoring inactive chord {chord}");
            return None;
        }
        Some(binding.action)
    }

    pub fn is_active(&self, chord: &Chord) -> bool {
        self.bindings
            .get(chord)
            .map(|binding| binding.active)
            .unwrap_or(false)
    }

    /// Releases every OS registration and forgets all bindings.
    pub fn unregister_all(&mut self) {
        let chords: Vec<Chord> = self.bindings.keys().cloned().collect();
        for chord in chords {
            self.deactivate_binding(&chord);
        }
        self.bindings.clear();
        info!("[desktop:shortcuts] All shortcuts unregistered");
    }

    fn bind(&mut self, chord: &Chord, scope: ShortcutScope, action: ShellAction) {
        if self.bindings.contains_key(chord) {
            self.deactivate_binding(chord);
            self.bindings.remove(chord);
        }

        self.bindings.insert(
            chord.clone(),
            Binding {
                scope,
                action,
                active: false,
            },
        );

        if scope == ShortcutScope::Global || self.focused {
            self.activate_binding(chord);
        }
    }

    fn unbind(&mut self, chord: &Chord, scope: ShortcutScope) -> bool {
        match self.bindings.get(chord) {
            Some(binding) if binding.scope == scope => {
                self.deactivate_binding(chord);
                self.bindings.remove(chord);
                true
            }
            _ => false,
        }
    }

    fn activate_binding(&mut self, chord: &Chord) {
        let Some(binding) = self.bindings.get_mut(chord) else {
            return;
        };
        if binding.active {
            return;
        }
        match self.backend.register(chord) {
            Ok(()) => {
                binding.active = true;
                debug!("[desktop:shortcuts] Registered {chord}");
            }
            Err(err) => {
                warn!("[desktop:shortcuts] Could not register {chord}: {err:#}");
            }
        }
    }

    fn deactivate_binding(&mut self, chord: &Chord) {
        let Some(binding) = self.bindings.get_mut(chord) else {
            return;
        };
        if !binding.active {
            return;
        }
        binding.active = false;
        if let Err(err) = self.backend.unregister(chord) {
            warn!("[desktop:shortcuts] Could not unregister {chord}: {err:#}");
        }
    }
}

/// The fixed bindings installed at startup.
pub fn default_bindings() -> Vec<(&'static str, ShortcutScope, ShellAction)> {
    vec![
        ("CmdOrCtrl+Shift+G", ShortcutScope::Global, ShellAction::ToggleWindow),
        ("CmdOrCtrl+Shift+N", ShortcutScope::Global, ShellAction::NewChat),
        ("CmdOrCtrl+N", ShortcutScope::FocusOnly, ShellAction::NewChat),
        ("Alt+Left", ShortcutScope::FocusOnly, ShellAction::GoBack),
        ("Alt+Right", ShortcutScope::FocusOnly, ShellAction::GoForward),
        ("CmdOrCtrl+R", ShortcutScope::FocusOnly, ShellAction::Reload),
        ("F11", ShortcutScope::FocusOnly, ShellAction::ToggleFullscreen),
        ("CmdOrCtrl+/", ShortcutScope::FocusOnly, ShellAction::ShowShortcutsHelp),
    ]
}

pub fn install_default_bindings<B: HotkeyBackend>(registry: &mut ShortcutRegistry<B>) {
    for (raw, scope, action) in default_bindings() {
        let chord = match raw.parse::<Chord>() {
            Ok(chord) => chord,
            Err(err) => {
                warn!("[desktop:shortcuts] Skipping invalid chord {raw:?}: {err:#}");
                continue;
            }
        };
        match scope {
            ShortcutScope::Global => registry.register_global(&chord, action),
            ShortcutScope::FocusOnly => registry.register_scoped(&chord, action),
        }
    }
}
