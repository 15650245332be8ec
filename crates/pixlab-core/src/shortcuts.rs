//! Keyboard shortcut table
//!
//! Chords resolve to the same [`Command`]s the text interface dispatches;
//! there is no separate logic path per key.

use std::fmt;
use std::str::FromStr;

/// Editor command reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Undo,
    Redo,
    Open,
    ZoomIn,
    ZoomOut,
    ZoomFit,
}

/// Shortcut parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    Empty,

    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),

    #[error("shortcut `{0}` has more than one key")]
    MultipleKeys(String),
}

/// A parsed key chord such as `ctrl+shift+z`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl Shortcut {
    /// Parse a `+`-separated chord; `cmd`/`meta` are aliases of `ctrl`
    ///
    /// # Errors
    /// `Empty`, `UnknownModifier` or `MultipleKeys`
    pub fn parse(chord: &str) -> Result<Self, ShortcutError> {
        let chord = chord.trim().to_ascii_lowercase();
        if chord.is_empty() {
            return Err(ShortcutError::Empty);
        }
        // "ctrl++" ends in an empty segment that stands for the plus key
        let (body, plus_key) = match chord.strip_suffix("++") {
            Some(body) => (body.to_string(), true),
            None => (chord.clone(), chord == "+"),
        };

        let mut shortcut = Self {
            ctrl: false,
            shift: false,
            alt: false,
            key: String::new(),
        };
        let mut parts: Vec<&str> = if plus_key && body == "+" {
            Vec::new()
        } else {
            body.split('+').collect()
        };
        if plus_key {
            parts.push("+");
        }
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(ShortcutError::Empty);
        };
        for modifier in modifiers {
            match *modifier {
                "ctrl" | "control" | "cmd" | "meta" | "super" => shortcut.ctrl = true,
                "shift" => shortcut.shift = true,
                "alt" | "option" => shortcut.alt = true,
                "" => return Err(ShortcutError::Empty),
                other if other.chars().count() == 1 => {
                    return Err(ShortcutError::MultipleKeys(chord.clone()))
                }
                other => return Err(ShortcutError::UnknownModifier(other.to_string())),
            }
        }
        if key.is_empty() {
            return Err(ShortcutError::Empty);
        }
        shortcut.key = (*key).to_string();
        Ok(shortcut)
    }

    /// Command bound to this chord, if any
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        if !self.ctrl || self.alt {
            return None;
        }
        match (self.key.as_str(), self.shift) {
            ("z", false) => Some(Command::Undo),
            ("z", true) => Some(Command::Redo),
            ("o", false) => Some(Command::Open),
            ("=" | "+", _) => Some(Command::ZoomIn),
            ("-", false) => Some(Command::ZoomOut),
            ("0", false) => Some(Command::ZoomFit),
            _ => None,
        }
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(chord: &str) -> Option<Command> {
        Shortcut::parse(chord).unwrap().command()
    }

    #[test]
    fn standard_bindings() {
        assert_eq!(command("ctrl+z"), Some(Command::Undo));
        assert_eq!(command("Ctrl+Shift+Z"), Some(Command::Redo));
        assert_eq!(command("cmd+o"), Some(Command::Open));
        assert_eq!(command("ctrl+="), Some(Command::ZoomIn));
        assert_eq!(command("ctrl++"), Some(Command::ZoomIn));
        assert_eq!(command("ctrl+shift+="), Some(Command::ZoomIn));
        assert_eq!(command("ctrl+-"), Some(Command::ZoomOut));
        assert_eq!(command("ctrl+0"), Some(Command::ZoomFit));
    }

    #[test]
    fn unbound_chords() {
        assert_eq!(command("z"), None);
        assert_eq!(command("ctrl+alt+z"), None);
        assert_eq!(command("ctrl+q"), None);
    }

    #[test]
    fn malformed_chords() {
        assert_eq!(Shortcut::parse("  "), Err(ShortcutError::Empty));
        assert_eq!(Shortcut::parse("ctrl+"), Err(ShortcutError::Empty));
        assert_eq!(
            Shortcut::parse("hyper+z"),
            Err(ShortcutError::UnknownModifier("hyper".into()))
        );
        assert!(matches!(Shortcut::parse("a+b"), Err(ShortcutError::MultipleKeys(_))));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(Shortcut::parse("shift+cmd+z").unwrap().to_string(), "ctrl+shift+z");
        assert_eq!(Shortcut::parse("ctrl++").unwrap().key, "+");
    }
}
