//! Logical actions and the physical chords that trigger them.
//!
//! Defaults are resolved per target platform and can be overridden per
//! action from the config file.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    NewDocument,
    Open,
    Save,
    SaveAs,
    Print,
    Undo,
    Redo,
    SelectAll,
    Paste,
    Copy,
    Cut,
    ZoomIn,
    ZoomOut,
    Quit,
}

impl Action {
    pub const ALL: [Action; 14] = [
        Action::NewDocument,
        Action::Open,
        Action::Save,
        Action::SaveAs,
        Action::Print,
        Action::Undo,
        Action::Redo,
        Action::SelectAll,
        Action::Paste,
        Action::Copy,
        Action::Cut,
        Action::ZoomIn,
        Action::ZoomOut,
        Action::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::NewDocument => "New",
            Action::Open => "Open",
            Action::Save => "Save",
            Action::SaveAs => "Save As",
            Action::Print => "Print",
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::SelectAll => "Select All",
            Action::Paste => "Paste",
            Action::Copy => "Copy",
            Action::Cut => "Cut",
            Action::ZoomIn => "Zoom In",
            Action::ZoomOut => "Zoom Out",
            Action::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Key(KeyCode),
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: KeyModifiers,
    pub trigger: Trigger,
}

fn relevant(modifiers: KeyModifiers) -> KeyModifiers {
    modifiers
        & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT | KeyModifiers::SUPER)
}

impl Chord {
    pub fn new(modifiers: KeyModifiers, trigger: Trigger) -> Self {
        Self {
            modifiers: relevant(modifiers),
            trigger,
        }
    }

    /// Normalize a key event: uppercase letters become lowercase + SHIFT,
    /// and SHIFT is dropped for other characters since the character
    /// already carries it.
    pub fn from_key(key: &KeyEvent) -> Self {
        let mut modifiers = relevant(key.modifiers);
        let code = match key.code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Char(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) => {
                if !c.is_ascii_alphabetic() {
                    modifiers.remove(KeyModifiers::SHIFT);
                }
                KeyCode::Char(c)
            }
            other => other,
        };
        Self::new(modifiers, Trigger::Key(code))
    }

    pub fn from_mouse(mouse: &MouseEvent) -> Option<Self> {
        let trigger = match mouse.kind {
            MouseEventKind::ScrollUp => Trigger::ScrollUp,
            MouseEventKind::ScrollDown => Trigger::ScrollDown,
            _ => return None,
        };
        Some(Self::new(mouse.modifiers, trigger))
    }

    /// Parse strings such as `ctrl+shift+s`, `ctrl++`, `alt+scroll-up`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim().to_ascii_lowercase();
        let (mods, key) = if spec == "+" {
            ("", "+")
        } else if let Some(prefix) = spec.strip_suffix("++") {
            (prefix, "+")
        } else {
            spec.rsplit_once('+').unwrap_or(("", spec.as_str()))
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            modifiers |= match part {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" | "option" | "meta" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                "super" | "cmd" | "win" => KeyModifiers::SUPER,
                _ => return None,
            };
        }

        let trigger = match key {
            "scroll-up" => Trigger::ScrollUp,
            "scroll-down" => Trigger::ScrollDown,
            "enter" => Trigger::Key(KeyCode::Enter),
            "esc" | "escape" => Trigger::Key(KeyCode::Esc),
            "tab" => Trigger::Key(KeyCode::Tab),
            "backspace" => Trigger::Key(KeyCode::Backspace),
            "delete" | "del" => Trigger::Key(KeyCode::Delete),
            "home" => Trigger::Key(KeyCode::Home),
            "end" => Trigger::Key(KeyCode::End),
            "pageup" => Trigger::Key(KeyCode::PageUp),
            "pagedown" => Trigger::Key(KeyCode::PageDown),
            "up" => Trigger::Key(KeyCode::Up),
            "down" => Trigger::Key(KeyCode::Down),
            "left" => Trigger::Key(KeyCode::Left),
            "right" => Trigger::Key(KeyCode::Right),
            "space" => Trigger::Key(KeyCode::Char(' ')),
            f if f.len() > 1 && f.starts_with('f') => {
                let n: u8 = f[1..].parse().ok()?;
                Trigger::Key(KeyCode::F(n))
            }
            single => {
                let mut chars = single.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                if !c.is_ascii_alphabetic() {
                    modifiers.remove(KeyModifiers::SHIFT);
                }
                Trigger::Key(KeyCode::Char(c))
            }
        };

        Some(Self::new(modifiers, trigger))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SUPER) {
            write!(f, "Super+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        match self.trigger {
            Trigger::ScrollUp => write!(f, "ScrollUp"),
            Trigger::ScrollDown => write!(f, "ScrollDown"),
            Trigger::Key(KeyCode::Char(c)) => write!(f, "{}", c.to_ascii_uppercase()),
            Trigger::Key(KeyCode::F(n)) => write!(f, "F{}", n),
            Trigger::Key(code) => write!(f, "{:?}", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

fn default_bindings(platform: Platform) -> Vec<(Action, &'static str)> {
    let mut bindings = vec![
        (Action::NewDocument, "ctrl+n"),
        (Action::Open, "ctrl+o"),
        (Action::Save, "ctrl+s"),
        (Action::SaveAs, "ctrl+shift+s"),
        // Most terminals cannot tell Ctrl+Shift+S from Ctrl+S.
        (Action::SaveAs, "alt+s"),
        (Action::Print, "ctrl+p"),
        (Action::Undo, "ctrl+z"),
        (Action::Redo, "ctrl+y"),
        (Action::SelectAll, "ctrl+a"),
        (Action::Paste, "ctrl+v"),
        (Action::Copy, "ctrl+c"),
        (Action::Cut, "ctrl+x"),
        (Action::Quit, "ctrl+q"),
        (Action::ZoomIn, "ctrl+="),
        (Action::ZoomIn, "ctrl++"),
        (Action::ZoomOut, "ctrl+-"),
        // Without keyboard enhancement Ctrl+- arrives as 0x1F, which
        // decodes as Ctrl+7, and Ctrl+= arrives as a bare '='.
        (Action::ZoomOut, "ctrl+7"),
        (Action::ZoomIn, "alt+="),
        (Action::ZoomOut, "alt+-"),
    ];

    match platform {
        Platform::Linux | Platform::Other => {
            bindings.push((Action::ZoomIn, "ctrl+scroll-up"));
            bindings.push((Action::ZoomOut, "ctrl+scroll-down"));
        }
        Platform::MacOs => {
            bindings.push((Action::Redo, "ctrl+shift+z"));
            bindings.push((Action::ZoomIn, "alt+scroll-up"));
            bindings.push((Action::ZoomOut, "alt+scroll-down"));
        }
        Platform::Windows => {
            // Windows Terminal keeps Ctrl+scroll for its own zoom.
            bindings.push((Action::ZoomIn, "alt+scroll-up"));
            bindings.push((Action::ZoomOut, "alt+scroll-down"));
        }
    }

    bindings
}

/// Chord → action lookup table.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<Chord, Action>,
}

impl Keymap {
    pub fn for_platform(platform: Platform) -> Self {
        let mut bindings = HashMap::new();
        for (action, spec) in default_bindings(platform) {
            if let Some(chord) = Chord::parse(spec) {
                bindings.insert(chord, action);
            }
        }
        Self { bindings }
    }

    /// Platform defaults with per-action overrides applied. An override
    /// replaces every default chord of that action.
    pub fn with_overrides(platform: Platform, overrides: &BTreeMap<Action, Vec<String>>) -> Self {
        let mut keymap = Self::for_platform(platform);
        for (action, specs) in overrides {
            keymap.bindings.retain(|_, a| a != action);
            for spec in specs {
                match Chord::parse(spec) {
                    Some(chord) => {
                        if let Some(previous) = keymap.bindings.insert(chord, *action) {
                            log::warn!(
                                "Chord {} rebound from {:?} to {:?}",
                                chord,
                                previous,
                                action
                            );
                        }
                    }
                    None => log::warn!("Ignoring unparsable chord '{}' for {:?}", spec, action),
                }
            }
        }
        keymap
    }

    pub fn resolve_key(&self, key: &KeyEvent) -> Option<Action> {
        self.bindings.get(&Chord::from_key(key)).copied()
    }

    pub fn resolve_mouse(&self, mouse: &MouseEvent) -> Option<Action> {
        Chord::from_mouse(mouse).and_then(|chord| self.bindings.get(&chord).copied())
    }

    /// Chords bound to `action`, keyboard chords first, for display.
    pub fn chords_for(&self, action: Action) -> Vec<Chord> {
        let mut chords: Vec<Chord> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(c, _)| *c)
            .collect();
        chords.sort_by_key(|c| (!matches!(c.trigger, Trigger::Key(_)), c.to_string()));
        chords
    }

    /// Short "Ctrl+O Open" style hint for the first chord of `action`.
    pub fn hint(&self, action: Action) -> Option<String> {
        self.chords_for(action)
            .first()
            .map(|chord| format!("{} {}", chord, action.label()))
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}
