//! Outbound key events

use serde::{Deserialize, Serialize};

use crate::keysym::Keysym;

/// Whether the host should still run its default behaviour for the
/// notification that produced an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostAction {
    #[default]
    PreventDefault,
    AllowDefault,
}

impl HostAction {
    pub fn is_prevented(self) -> bool {
        self == HostAction::PreventDefault
    }
}

/// Consumer of canonical key events.
///
/// Both methods default to suppressing the host behaviour, so a handler only
/// overrides what it cares about.
pub trait KeyHandler {
    fn key_pressed(&mut self, keysym: Keysym) -> HostAction {
        let _ = keysym;
        HostAction::PreventDefault
    }

    fn key_released(&mut self, keysym: Keysym) -> HostAction {
        let _ = keysym;
        HostAction::PreventDefault
    }
}

/// A canonical key event, as written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyEvent {
    Press { keysym: Keysym },
    Release { keysym: Keysym },
}

impl KeyEvent {
    pub fn keysym(&self) -> Keysym {
        match self {
            KeyEvent::Press { keysym } | KeyEvent::Release { keysym } => *keysym,
        }
    }
}

/// Handler that buffers every event for later draining.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<KeyEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl KeyHandler for EventQueue {
    fn key_pressed(&mut self, keysym: Keysym) -> HostAction {
        self.events.push(KeyEvent::Press { keysym });
        HostAction::PreventDefault
    }

    fn key_released(&mut self, keysym: Keysym) -> HostAction {
        self.events.push(KeyEvent::Release { keysym });
        HostAction::PreventDefault
    }
}
