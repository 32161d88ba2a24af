//! Modifier tracking
//!
//! Tracks shift, ctrl and alt from raw down/up notifications. The host only
//! reports one raw code per modifier, so left and right variants are already
//! merged by the time they reach us.

use std::fmt;

/// Raw code of the shift key.
pub const SHIFT_CODE: u32 = 16;
/// Raw code of the ctrl key.
pub const CTRL_CODE: u32 = 17;
/// Raw code of the alt key.
pub const ALT_CODE: u32 = 18;

/// A tracked modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
}

impl ModifierKey {
    /// Check if a raw code is a modifier and return which one.
    pub fn from_raw_code(code: u32) -> Option<Self> {
        match code {
            SHIFT_CODE => Some(ModifierKey::Shift),
            CTRL_CODE => Some(ModifierKey::Ctrl),
            ALT_CODE => Some(ModifierKey::Alt),
            _ => None,
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierKey::Shift => write!(f, "Shift"),
            ModifierKey::Ctrl => write!(f, "Ctrl"),
            ModifierKey::Alt => write!(f, "Alt"),
        }
    }
}

/// Snapshot of the three tracked modifiers.
///
/// Down always sets, up always clears, so repeated notifications are harmless.
/// Reset whenever input focus is lost, since ups delivered while unfocused
/// never reach us.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierState {
    pub fn on_raw_down(&mut self, code: u32) {
        if let Some(modifier) = ModifierKey::from_raw_code(code) {
            self.set(modifier, true);
        }
    }

    pub fn on_raw_up(&mut self, code: u32) {
        if let Some(modifier) = ModifierKey::from_raw_code(code) {
            self.set(modifier, false);
        }
    }

    pub fn reset(&mut self) {
        *self = ModifierState::default();
    }

    pub fn is_held(&self, modifier: ModifierKey) -> bool {
        match modifier {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
        }
    }

    fn set(&mut self, modifier: ModifierKey, held: bool) {
        match modifier {
            ModifierKey::Shift => self.shift = held,
            ModifierKey::Ctrl => self.ctrl = held,
            ModifierKey::Alt => self.alt = held,
        }
    }
}
