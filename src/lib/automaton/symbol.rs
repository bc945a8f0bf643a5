use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The marker used for epsilon in persisted automata.
pub const EPSILON_MARKER: &str = "&";

/// A transition label. Text symbols are non-empty strings and may be longer
/// than a single character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Epsilon,
    Text(String),
}

impl Symbol {
    pub fn text(text: impl Into<String>) -> Self {
        Symbol::Text(text.into())
    }

    /// Reads a symbol in its persisted form. The epsilon marker, the `ε`
    /// glyph and the empty string all denote epsilon.
    pub fn from_persisted(text: &str) -> Self {
        match text {
            "" | EPSILON_MARKER | "ε" => Symbol::Epsilon,
            _ => Symbol::Text(text.to_string()),
        }
    }

    pub fn to_persisted(&self) -> &str {
        match self {
            Symbol::Epsilon => EPSILON_MARKER,
            Symbol::Text(text) => text,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Symbol::Epsilon => None,
            Symbol::Text(text) => Some(text),
        }
    }

    /// The number of characters the symbol consumes. Zero for epsilon.
    pub fn char_len(&self) -> usize {
        self.as_text().map_or(0, |t| t.chars().count())
    }

    pub fn is_single_char(&self) -> bool {
        self.char_len() == 1
    }

    /// Whether the symbol is a text symbol with no characters. Such symbols
    /// are rejected by every `add_transition`.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Symbol::Text(text) if text.is_empty())
    }

    /// The characters of the symbol as single-character symbols.
    pub fn chars(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.as_text()
            .into_iter()
            .flat_map(|t| t.chars())
            .map(Symbol::from)
    }
}

impl From<char> for Symbol {
    fn from(value: char) -> Self {
        Symbol::Text(value.to_string())
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::Text(value.to_string())
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol::Text(value)
    }
}

impl<T: Into<Symbol>> From<Option<T>> for Symbol {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(t) => t.into(),
            None => Symbol::Epsilon,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Text(text) => write!(f, "{}", text),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_persisted())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Symbol::from_persisted(&text))
    }
}
