use std::fmt;
use std::str::FromStr;

/// Modifier flags of a [`KeyCombination`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CONTROL: Modifiers = Modifiers(1);
    pub const SHIFT: Modifiers = Modifiers(1 << 1);
    pub const ALT: Modifiers = Modifiers(1 << 2);
    pub const WIN: Modifiers = Modifiers(1 << 3);

    /// Canonical serialization order
    const ORDERED: [(Modifiers, &'static str); 4] = [
        (Modifiers::CONTROL, "ctrl"),
        (Modifiers::SHIFT, "shift"),
        (Modifiers::ALT, "alt"),
        (Modifiers::WIN, "win"),
    ];

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn from_token(token: &str) -> Option<Modifiers> {
        match token {
            "ctrl" | "control" => Some(Modifiers::CONTROL),
            "shift" => Some(Modifiers::SHIFT),
            "alt" | "menu" => Some(Modifiers::ALT),
            "win" | "meta" => Some(Modifiers::WIN),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// The single non-modifier key of a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// F1..=F24
    Function(u8),
    /// Upper-case ASCII letter
    Letter(char),
    /// 0..=9
    Digit(u8),
}

impl Key {
    /// Windows virtual-key code for this key
    pub fn virtual_key_code(self) -> u32 {
        match self {
            Key::Function(n) => 0x6F + n as u32,
            Key::Letter(c) => c as u32,
            Key::Digit(d) => 0x30 + d as u32,
        }
    }

    fn from_token(token: &str) -> Option<Key> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(Key::Letter(c.to_ascii_uppercase())),
            (Some(c), None) if c.is_ascii_digit() => Some(Key::Digit(c as u8 - b'0')),
            (Some('f'), Some(_)) => match token[1..].parse::<u8>() {
                Ok(n @ 1..=24) if !token[1..].starts_with('0') => Some(Key::Function(n)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Function(n) => write!(f, "f{n}"),
            Key::Letter(c) => write!(f, "{}", c.to_ascii_lowercase()),
            Key::Digit(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("hotkey combination is empty")]
    Empty,

    #[error("empty key name in '{0}'")]
    EmptyToken(String),

    #[error("no primary key in '{0}', expected something like 'ctrl+shift+f1'")]
    MissingKey(String),

    #[error("more than one primary key in '{combo}': '{first}' and '{second}'")]
    MultipleKeys {
        combo: String,
        first: String,
        second: String,
    },

    #[error("unsupported key '{0}', expected a letter, a digit or F1-F24")]
    UnsupportedKey(String),
}

/// A global hotkey: zero or more modifiers plus exactly one primary key.
///
/// Parsed from `mod+mod+key` (case-insensitive) and displayed in the
/// canonical lower-case form `ctrl+shift+alt+win+key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    modifiers: Modifiers,
    key: Key,
}

impl KeyCombination {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut modifiers = Modifiers::NONE;
        let mut key: Option<(Key, String)> = None;

        for raw in trimmed.split('+') {
            let token = raw.trim().to_ascii_lowercase();
            if token.is_empty() {
                return Err(ParseError::EmptyToken(trimmed.to_string()));
            }

            if let Some(modifier) = Modifiers::from_token(&token) {
                modifiers |= modifier;
                continue;
            }

            let parsed =
                Key::from_token(&token).ok_or_else(|| ParseError::UnsupportedKey(raw.trim().to_string()))?;
            if let Some((_, first)) = &key {
                return Err(ParseError::MultipleKeys {
                    combo: trimmed.to_string(),
                    first: first.clone(),
                    second: raw.trim().to_string(),
                });
            }
            key = Some((parsed, raw.trim().to_string()));
        }

        match key {
            Some((key, _)) => Ok(Self { modifiers, key }),
            None => Err(ParseError::MissingKey(trimmed.to_string())),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> Key {
        self.key
    }
}

impl FromStr for KeyCombination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (modifier, name) in Modifiers::ORDERED {
            if self.modifiers.contains(modifier) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}
