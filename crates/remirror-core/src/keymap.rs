//! Key bindings and the merged keymap plugin.
//!
//! Chords are written like `Mod-b`, `Shift-Enter` or `Ctrl-Alt-ArrowDown`.
//! `Mod` is the command key on macOS and control elsewhere. Bindings from
//! all extensions are merged into one [`KeymapPlugin`]; when several
//! extensions bind the same chord their handlers run in extension order
//! until one reports the key as handled.

use std::fmt;
use std::rc::Rc;

use remirror_model::{Dispatch, EditorState, KeyEvent, Plugin};

use crate::commands::CommandProps;
use crate::error::{Error, Result};
use crate::settings::Platform;

/// Key handler; returns whether it handled the key
pub type KeyHandler = Rc<dyn Fn(&mut CommandProps<'_>) -> bool>;

/// One chord bound to a handler
#[derive(Clone)]
pub struct KeyBinding {
    pub chord: String,
    pub handler: KeyHandler,
}

impl KeyBinding {
    pub fn new(chord: impl Into<String>, handler: impl Fn(&mut CommandProps<'_>) -> bool + 'static) -> Self {
        Self {
            chord: chord.into(),
            handler: Rc::new(handler),
        }
    }
}

const NAMED_KEYS: &[&str] = &[
    "Enter", "Backspace", "Delete", "Tab", "Escape", "ArrowUp", "ArrowDown", "ArrowLeft",
    "ArrowRight", "Home", "End", "PageUp", "PageDown", "Insert", "F1", "F2", "F3", "F4", "F5",
    "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// A parsed, normalised key chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    key: String,
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
}

impl KeyChord {
    /// Parse a chord string.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for unknown or repeated
    /// modifiers, unknown key names and a missing key.
    pub fn parse(chord: &str, platform: Platform) -> std::result::Result<Self, String> {
        let (modifiers, key) = if let Some(rest) = chord.strip_suffix('-') {
            // The key itself is '-'
            match rest {
                "" => ("", "-"),
                _ => match rest.strip_suffix('-') {
                    Some(modifiers) => (modifiers, "-"),
                    None => return Err("missing key after modifier".to_string()),
                },
            }
        } else {
            chord.rsplit_once('-').unwrap_or(("", chord))
        };

        let mut parsed = KeyChord {
            key: normalize_key(key).ok_or_else(|| format!("unknown key '{key}'"))?,
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        };

        if !modifiers.is_empty() {
            for modifier in modifiers.split('-') {
                let flag = match modifier {
                    "Mod" => match platform {
                        Platform::Mac => &mut parsed.meta,
                        Platform::Other => &mut parsed.ctrl,
                    },
                    "Cmd" | "Meta" => &mut parsed.meta,
                    "Ctrl" | "Control" => &mut parsed.ctrl,
                    "Alt" => &mut parsed.alt,
                    "Shift" => &mut parsed.shift,
                    other => return Err(format!("unknown modifier '{other}'")),
                };
                if *flag {
                    return Err(format!("modifier '{modifier}' given twice"));
                }
                *flag = true;
            }
        }
        Ok(parsed)
    }

    /// The chord a key event represents
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        Some(KeyChord {
            key: normalize_key(&event.key)?,
            ctrl: event.ctrl,
            alt: event.alt,
            shift: event.shift,
            meta: event.meta,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [
            (self.ctrl, "Ctrl-"),
            (self.alt, "Alt-"),
            (self.shift, "Shift-"),
            (self.meta, "Meta-"),
        ] {
            if on {
                f.write_str(name)?;
            }
        }
        match self.key.as_str() {
            " " => f.write_str("Space"),
            key => f.write_str(key),
        }
    }
}

fn normalize_key(key: &str) -> Option<String> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (None, _) => None,
        (Some(c), None) => Some(c.to_lowercase().collect()),
        _ if key.eq_ignore_ascii_case("space") => Some(" ".to_string()),
        _ => NAMED_KEYS
            .iter()
            .find(|named| named.eq_ignore_ascii_case(key))
            .map(|named| named.to_string()),
    }
}

struct ChordHandlers {
    chord: KeyChord,
    handlers: Vec<(String, KeyHandler)>,
}

/// All key bindings merged into one plugin.
#[derive(Default)]
pub struct KeymapPlugin {
    bindings: Vec<ChordHandlers>,
}

impl fmt::Debug for KeymapPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chords: Vec<String> = self
            .bindings
            .iter()
            .map(|b| format!("{} x{}", b.chord, b.handlers.len()))
            .collect();
        f.debug_struct("KeymapPlugin").field("bindings", &chords).finish()
    }
}

pub const KEYMAP_PLUGIN_KEY: &str = "keymap";

impl KeymapPlugin {
    /// Merge per-extension bindings given in extension order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyBinding`] for the first chord that does not parse.
    pub fn merge(keymaps: Vec<(String, Vec<KeyBinding>)>, platform: Platform) -> Result<Self> {
        let mut plugin = Self::default();
        for (owner, bindings) in keymaps {
            for binding in bindings {
                let chord = KeyChord::parse(&binding.chord, platform).map_err(|reason| {
                    Error::InvalidKeyBinding {
                        extension: owner.clone(),
                        chord: binding.chord.clone(),
                        reason,
                    }
                })?;
                match plugin.bindings.iter_mut().find(|b| b.chord == chord) {
                    Some(existing) => existing.handlers.push((owner.clone(), binding.handler)),
                    None => plugin.bindings.push(ChordHandlers {
                        chord,
                        handlers: vec![(owner.clone(), binding.handler)],
                    }),
                }
            }
        }
        Ok(plugin)
    }

    /// Extensions bound to `chord`, in the order their handlers run
    pub fn owners(&self, chord: &KeyChord) -> Vec<&str> {
        self.bindings
            .iter()
            .find(|b| &b.chord == chord)
            .map(|b| b.handlers.iter().map(|(o, _)| o.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Plugin for KeymapPlugin {
    fn key(&self) -> &str {
        KEYMAP_PLUGIN_KEY
    }

    fn handle_key_down(&self, state: &EditorState, event: &KeyEvent, dispatch: Dispatch<'_>) -> bool {
        let Some(chord) = KeyChord::from_event(event) else {
            return false;
        };
        let Some(entry) = self.bindings.iter().find(|b| b.chord == chord) else {
            return false;
        };
        for (owner, handler) in &entry.handlers {
            let mut tr = state.tr();
            let handled = {
                let mut props = CommandProps {
                    state,
                    tr: &mut tr,
                    dispatch: true,
                };
                handler(&mut props)
            };
            if handled {
                tracing::debug!(chord = %chord, extension = %owner, "Key handled");
                dispatch(tr);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Mod-b", Platform::Other, "Ctrl-b")]
    #[case("Mod-b", Platform::Mac, "Meta-b")]
    #[case("Shift-Enter", Platform::Other, "Shift-Enter")]
    #[case("Ctrl-Alt-arrowdown", Platform::Other, "Ctrl-Alt-ArrowDown")]
    #[case("Mod-B", Platform::Other, "Ctrl-b")]
    #[case("Ctrl--", Platform::Other, "Ctrl--")]
    #[case("-", Platform::Other, "-")]
    #[case("Space", Platform::Other, "Space")]
    fn test_parse_chords(#[case] chord: &str, #[case] platform: Platform, #[case] expected: &str) {
        assert_eq!(KeyChord::parse(chord, platform).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("Hyper-b")]
    #[case("Mod-Ctrl-b")]
    #[case("Shift-Shift-a")]
    #[case("Ctrl-")]
    #[case("Ctrl-Flurb")]
    #[case("")]
    fn test_malformed_chords(#[case] chord: &str) {
        assert!(KeyChord::parse(chord, Platform::Other).is_err(), "{chord} should not parse");
    }

    #[test]
    fn test_event_matches_chord() {
        let chord = KeyChord::parse("Mod-b", Platform::Other).unwrap();
        assert_eq!(KeyChord::from_event(&KeyEvent::new("b").ctrl()), Some(chord.clone()));
        assert_eq!(KeyChord::from_event(&KeyEvent::new("B").ctrl()), Some(chord.clone()));
        assert_ne!(KeyChord::from_event(&KeyEvent::new("b").meta()), Some(chord));
    }

    #[test]
    fn test_merge_reports_owner_of_bad_chord() {
        let keymaps = vec![
            ("bold".to_string(), vec![KeyBinding::new("Mod-b", |_| true)]),
            ("broken".to_string(), vec![KeyBinding::new("Mod-Nope", |_| true)]),
        ];
        let err = KeymapPlugin::merge(keymaps, Platform::Other).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKeyBinding { ref extension, ref chord, .. }
                if extension == "broken" && chord == "Mod-Nope"
        ));
    }

    #[test]
    fn test_same_chord_keeps_every_owner() {
        let keymaps = vec![
            ("gapCursor".to_string(), vec![KeyBinding::new("ArrowDown", |_| false)]),
            (
                "list".to_string(),
                vec![
                    KeyBinding::new("arrowdown", |_| true),
                    KeyBinding::new("Enter", |_| true),
                ],
            ),
        ];
        let plugin = KeymapPlugin::merge(keymaps, Platform::Other).unwrap();
        let chord = KeyChord::parse("ArrowDown", Platform::Other).unwrap();
        assert_eq!(plugin.owners(&chord), vec!["gapCursor", "list"]);
        assert_eq!(plugin.len(), 2);
    }
}
