//! The `text` module provides the `Text` type used by text-like meta events. MIDI recommends
//! ASCII for strings but does not enforce an encoding; everything this library produces is
//! UTF-8, which degrades to ASCII for the characters MIDI cares about.

use std::fmt::{Display, Formatter};

/// The payload of a text-like meta event (track name, copyright, lyric, and friends).
#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Text(String);

impl Text {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Text(s.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text(s)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text(s.into())
    }
}

impl From<Text> for String {
    fn from(t: Text) -> Self {
        t.0
    }
}
