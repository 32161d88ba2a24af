//! Keyboard input normalization for keybridge
//!
//! Turns raw host keyboard notifications (down, typed, up, focus lost) into a
//! deterministic stream of X11 keysym press/release events:
//!
//! - [`resolver`] maps raw codes, character codes and symbolic identifiers to
//!   keysyms using the static [`tables`]
//! - [`ModifierState`] tracks shift, ctrl and alt
//! - [`Coalescer`] merges the notifications of one physical keypress into a
//!   single press/release pair and synthesizes auto-repeat
//!
//! The crate does no I/O and never reads the clock. Callers pass the current
//! [`std::time::Instant`] in and drive deferred work with
//! [`Coalescer::run_due`].

mod coalescer;
mod handler;
mod host;
mod keysym;
mod modifiers;
mod registry;
pub mod resolver;
mod scheduler;
pub mod tables;

pub use coalescer::Coalescer;
pub use handler::{EventQueue, HostAction, KeyEvent, KeyHandler};
pub use host::{DecodeError, HostNotification, TraceEntry};
pub use keysym::Keysym;
pub use modifiers::{ModifierKey, ModifierState, ALT_CODE, CTRL_CODE, SHIFT_CODE};
pub use registry::PressedRegistry;
pub use scheduler::{DueTask, Scheduler, TaskId, MIN_INTERVAL};
