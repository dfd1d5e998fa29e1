//! Keyboard chords such as `Ctrl+Shift+E`.

use std::fmt;
use std::str::FromStr;

use codeferry_core::FerryError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// Lowercased key name
    pub key: String,
}

impl KeyChord {
    pub fn matches(&self, pressed: &KeyChord) -> bool {
        self == pressed
    }
}

impl FromStr for KeyChord {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chord = KeyChord::default();
        let mut key: Option<String> = None;

        for part in s.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "" => return Err(FerryError::ConfigError(format!("empty key in chord `{s}`"))),
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                other => {
                    if key.replace(other.to_string()).is_some() {
                        return Err(FerryError::ConfigError(format!("chord `{s}` names more than one key")));
                    }
                }
            }
        }

        chord.key = key.ok_or_else(|| FerryError::ConfigError(format!("chord `{s}` has no key")))?;
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (held, name) in [(self.ctrl, "Ctrl"), (self.shift, "Shift"), (self.alt, "Alt"), (self.meta, "Meta")] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_uppercase())
        } else {
            write!(f, "{}", self.key)
        }
    }
}
