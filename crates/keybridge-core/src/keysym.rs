//! X11 keysym values
//!
//! A [`Keysym`] is the canonical output vocabulary of the coalescer. Values
//! follow the X11 keysym encoding:
//!
//! - control characters map to `0xFF00 | codepoint`
//! - Latin-1 characters map to themselves (`0x0020..=0x00FF`)
//! - every other Unicode codepoint maps to `0x0100_0000 | codepoint`
//! - named keys (arrows, function keys, modifiers) use fixed constants
//!
//! "No keysym" is always expressed as `Option<Keysym>::None`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An X11 keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keysym(u32);

impl Keysym {
    pub const BACKSPACE: Keysym = Keysym(0xFF08);
    pub const TAB: Keysym = Keysym(0xFF09);
    pub const RETURN: Keysym = Keysym(0xFF0D);
    pub const ESCAPE: Keysym = Keysym(0xFF1B);
    pub const SHIFT_L: Keysym = Keysym(0xFFE1);
    pub const CONTROL_L: Keysym = Keysym(0xFFE3);
    pub const META_L: Keysym = Keysym(0xFFE7);
    pub const ALT_L: Keysym = Keysym(0xFFE9);
    pub const SUPER_L: Keysym = Keysym(0xFFEB);

    /// Offset OR-ed onto control characters.
    pub const CONTROL_CHAR_BASE: u32 = 0xFF00;
    /// Offset OR-ed onto codepoints outside Latin-1.
    pub const UNICODE_BASE: u32 = 0x0100_0000;

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this keysym was derived from a Unicode codepoint above Latin-1.
    pub const fn is_unicode(self) -> bool {
        self.0 & 0xFF00_0000 == Self::UNICODE_BASE
    }
}

impl From<Keysym> for u32 {
    fn from(keysym: Keysym) -> Self {
        keysym.0
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
