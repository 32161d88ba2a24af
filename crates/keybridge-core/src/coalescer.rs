//! Event coalescing
//!
//! # Slot State Machine
//!
//! Hosts describe one physical keypress with up to two "down" notifications
//! (a raw key down and a typed character) and later an "up". The coalescer
//! merges them into exactly one press and one release per physical key, which
//! is tracked by its raw code (a *slot*).
//!
//! ```text
//!  ┌───────┐   down / typed    ┌──────────────────────┐
//!  │ IDLE  │ ────────────────► │ AWAITING_RESOLUTION  │ ◄──┐
//!  └───────┘                   │                      │    │ down / typed
//!      ▲                       │ pending: down, typed │ ───┘ (same batch)
//!      │                       └──────────┬───────────┘
//!      │                                  │ deferred resolution
//!      │                                  │ - typed wins over down
//!      │                                  │ - press, start auto-repeat
//!      │                                  ▼
//!      │   deferred up         ┌──────────────────────┐
//!      └────────────────────── │    DOWN(keysym)      │
//!        - release keysym      │                      │
//!        - stop auto-repeat    │ slot attribution     │
//!                              └──────────────────────┘
//! ```
//!
//! ## Deferred work
//!
//! Nothing is emitted synchronously except the AltGr releases. Resolution is
//! queued at the time of the down so that a typed notification arriving in
//! the same batch can still replace the down's candidate. Ups are queued at
//! `now + release_delay`. Equal deadlines run in insertion order, so an up
//! always lands after the resolution of the down that preceded it.
//!
//! An up seals the slot's pending record. A down after it opens a new record
//! with its own resolution, so two taps delivered in one batch still produce
//! two presses. If the new record resolves while the previous tap's release
//! is still queued, that release runs early, right before the new press.
//!
//! The caller owns the clock: every operation takes the current [`Instant`],
//! and [`Coalescer::run_due`] must be called once
//! [`Coalescer::next_deadline`] has passed.
//!
//! ## AltGr
//!
//! Hosts report AltGr as ctrl and alt held together, then type the composed
//! character without ever sending ups for ctrl and alt. A printable typed
//! character while both are held therefore releases ctrl and alt right away.

use std::collections::HashMap;
use std::time::Instant;

use keybridge_config::KeyboardConfig;

use crate::handler::{HostAction, KeyHandler};
use crate::host::HostNotification;
use crate::keysym::Keysym;
use crate::modifiers::{ModifierKey, ModifierState};
use crate::registry::PressedRegistry;
use crate::resolver;
use crate::scheduler::{DueTask, Scheduler, TaskId};

/// Work queued on the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Resolve a pending record
    Resolve(u64),
    /// Process a raw up for a slot
    Release(u32),
    /// Auto-repeat tick
    Repeat(Keysym),
}

/// Candidates collected for one keypress before its deferred resolution runs.
#[derive(Debug, Clone, Copy)]
struct PendingResolution {
    code: u32,
    down: Option<Keysym>,
    typed: Option<Keysym>,
    /// Release of the slot's previous keypress, queued when this record opened
    prior_release: Option<TaskId>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveRepeat {
    code: u32,
    task: TaskId,
}

/// Coalescing state machine for one input source.
pub struct Coalescer<H> {
    handler: Option<H>,
    config: KeyboardConfig,
    modifiers: ModifierState,
    pressed: PressedRegistry,
    /// Raw code -> keysym currently attributed to that physical key
    slots: HashMap<u32, Keysym>,
    /// Unresolved records, open or sealed by an up
    pending: HashMap<u64, PendingResolution>,
    /// Raw code -> record still accepting candidates
    open: HashMap<u32, u64>,
    next_record: u64,
    /// Raw code -> most recently queued release
    queued_release: HashMap<u32, TaskId>,
    /// Slot that typed notifications attach to
    last_down: Option<u32>,
    scheduler: Scheduler<Deferred>,
    repeat: Option<ActiveRepeat>,
}

impl<H: KeyHandler> Coalescer<H> {
    /// Create a coalescer with no handler registered.
    ///
    /// Until a handler is set every notification is passed through to the
    /// host untouched.
    pub fn new(config: KeyboardConfig) -> Self {
        Self {
            handler: None,
            config,
            modifiers: ModifierState::default(),
            pressed: PressedRegistry::default(),
            slots: HashMap::new(),
            pending: HashMap::new(),
            open: HashMap::new(),
            next_record: 0,
            queued_release: HashMap::new(),
            last_down: None,
            scheduler: Scheduler::new(),
            repeat: None,
        }
    }

    pub fn with_handler(config: KeyboardConfig, handler: H) -> Self {
        let mut coalescer = Self::new(config);
        coalescer.handler = Some(handler);
        coalescer
    }

    pub fn set_handler(&mut self, handler: H) {
        self.handler = Some(handler);
    }

    pub fn take_handler(&mut self) -> Option<H> {
        self.handler.take()
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    pub fn pressed(&self) -> &PressedRegistry {
        &self.pressed
    }

    /// Keysym currently attributed to a physical key.
    pub fn attributed(&self, code: u32) -> Option<Keysym> {
        self.slots.get(&code).copied()
    }

    /// When [`Coalescer::run_due`] next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Route a decoded host notification to the matching operation.
    pub fn dispatch(&mut self, notification: &HostNotification, now: Instant) -> HostAction {
        match notification {
            HostNotification::Down { code, identifier } => {
                self.key_down(*code, identifier.as_deref(), now)
            }
            HostNotification::Typed { char_code } => self.key_typed(*char_code, now),
            HostNotification::Up { code } => self.key_up(*code, now),
            HostNotification::FocusLost => {
                self.focus_lost();
                HostAction::AllowDefault
            }
        }
    }

    /// Handle a raw key down.
    ///
    /// Returns whether the host default should be suppressed: always when the
    /// raw code resolved, and for identifiers that are not typable or that
    /// arrive with exactly one of ctrl/alt held. Ctrl and alt together are
    /// left alone so the host can still deliver the AltGr character.
    pub fn key_down(&mut self, code: u32, identifier: Option<&str>, now: Instant) -> HostAction {
        if self.handler.is_none() {
            return HostAction::AllowDefault;
        }

        if code == 0 && identifier.is_none() {
            tracing::trace!("Ignoring down without code or identifier");
            return HostAction::PreventDefault;
        }

        self.modifiers.on_raw_down(code);
        let shift = self.modifiers.shift;

        let from_code = resolver::keysym_from_raw_code(code, shift);
        let mut action = if from_code.is_some() {
            HostAction::PreventDefault
        } else {
            HostAction::AllowDefault
        };

        let mut candidate = from_code;
        if let Some(identifier) = identifier {
            if candidate.is_none() {
                candidate = resolver::keysym_from_identifier(identifier, shift);
            }
            let ctrl_xor_alt = self.modifiers.is_held(ModifierKey::Ctrl)
                != self.modifiers.is_held(ModifierKey::Alt);
            if !resolver::is_typable(identifier) || ctrl_xor_alt {
                action = HostAction::PreventDefault;
            }
        }

        tracing::debug!(
            "Down code={} identifier={:?} candidate={:?}",
            code,
            identifier,
            candidate
        );

        let record = self.open_record(code, now);
        if candidate.is_some() {
            if let Some(pending) = self.pending.get_mut(&record) {
                pending.down = candidate;
            }
        }
        self.last_down = Some(code);

        action
    }

    /// Handle a typed character for the most recent down.
    pub fn key_typed(&mut self, char_code: u32, now: Instant) -> HostAction {
        if self.handler.is_none() {
            return HostAction::AllowDefault;
        }

        if !resolver::is_control_character(char_code)
            && self.modifiers.is_held(ModifierKey::Ctrl)
            && self.modifiers.is_held(ModifierKey::Alt)
        {
            tracing::debug!("Typed {:#X} with ctrl+alt held, treating as AltGr", char_code);
            self.release_keysym(Keysym::CONTROL_L);
            self.release_keysym(Keysym::ALT_L);
        }

        let Some(code) = self.last_down else {
            tracing::debug!("Dropping typed {:#X} with no preceding down", char_code);
            return HostAction::PreventDefault;
        };

        let candidate = resolver::keysym_from_char_code(char_code);
        tracing::debug!("Typed {:#X} for code={} candidate={:?}", char_code, code, candidate);

        let record = self.open_record(code, now);
        if candidate.is_some() {
            if let Some(pending) = self.pending.get_mut(&record) {
                pending.typed = candidate;
            }
        }

        HostAction::PreventDefault
    }

    /// Handle a raw key up. The release itself is deferred by the configured
    /// release delay.
    ///
    /// The slot's pending record is sealed: typed characters arriving later
    /// are dropped and the next down starts a new keypress.
    pub fn key_up(&mut self, code: u32, now: Instant) -> HostAction {
        if self.handler.is_none() {
            return HostAction::AllowDefault;
        }

        self.open.remove(&code);
        if self.last_down == Some(code) {
            self.last_down = None;
        }

        let task = self
            .scheduler
            .schedule_at(now + self.config.release_delay, Deferred::Release(code));
        self.queued_release.insert(code, task);

        HostAction::PreventDefault
    }

    /// Forget modifier state after focus loss.
    ///
    /// Held keys are not released and timers keep running; only the modifier
    /// flags are cleared.
    pub fn focus_lost(&mut self) {
        tracing::debug!("Focus lost, resetting modifiers");
        self.modifiers.reset();
    }

    /// Run every deferred task due at or before `now`. Returns how many ran.
    pub fn run_due(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while let Some(DueTask { id, deadline, task }) = self.scheduler.pop_due(now) {
            match task {
                Deferred::Resolve(record) => self.resolve(record, deadline),
                Deferred::Release(code) => self.release_slot(code, id),
                Deferred::Repeat(keysym) => {
                    self.release_keysym(keysym);
                    self.press_keysym(keysym);
                }
            }
            ran += 1;
        }
        ran
    }

    /// Open record of a slot, creating one and scheduling its resolution when
    /// the slot has none.
    fn open_record(&mut self, code: u32, now: Instant) -> u64 {
        if let Some(record) = self.open.get(&code) {
            return *record;
        }

        let record = self.next_record;
        self.next_record += 1;

        let prior_release = self
            .queued_release
            .get(&code)
            .copied()
            .filter(|task| self.scheduler.is_scheduled(*task));

        self.pending.insert(
            record,
            PendingResolution {
                code,
                down: None,
                typed: None,
                prior_release,
            },
        );
        self.open.insert(code, record);
        self.scheduler.schedule_at(now, Deferred::Resolve(record));
        record
    }

    fn resolve(&mut self, record: u64, now: Instant) {
        let Some(pending) = self.pending.remove(&record) else {
            return;
        };
        let code = pending.code;
        if self.open.get(&code) == Some(&record) {
            self.open.remove(&code);
        }

        let Some(resolved) = pending.typed.or(pending.down) else {
            tracing::trace!("Code {} did not resolve to a keysym", code);
            return;
        };

        // The previous tap of this key still owes its release
        if let Some(task) = pending.prior_release {
            if self.scheduler.cancel(task) {
                tracing::debug!("Code {} pressed again before its release ran", code);
                self.queued_release.remove(&code);
                self.release_attribution(code);
            }
        }

        let previous = self.slots.get(&code).copied();
        if previous == Some(resolved) {
            return;
        }

        if let Some(previous) = previous {
            if self.pressed.is_pressed(previous) {
                self.release_keysym(previous);
            }
        }

        self.slots.insert(code, resolved);
        self.press_keysym(resolved);
        self.restart_repeat(code, resolved, now);
    }

    fn restart_repeat(&mut self, code: u32, keysym: Keysym, now: Instant) {
        if let Some(active) = self.repeat.take() {
            self.scheduler.cancel(active.task);
        }

        if !self.config.auto_repeat || ModifierKey::from_raw_code(code).is_some() {
            return;
        }

        let first = now + self.config.repeat_delay + self.config.repeat_interval;
        let task = self
            .scheduler
            .schedule_every(first, self.config.repeat_interval, Deferred::Repeat(keysym));
        self.repeat = Some(ActiveRepeat { code, task });
    }

    fn release_slot(&mut self, code: u32, task: TaskId) {
        if self.queued_release.get(&code) == Some(&task) {
            self.queued_release.remove(&code);
        }
        if ModifierKey::from_raw_code(code).is_some() {
            self.modifiers.on_raw_up(code);
        }
        self.release_attribution(code);
    }

    /// Stop the slot's repeat and release whatever it is attributed to.
    ///
    /// Modifier flags are left alone: when a queued release runs early the
    /// flag already reflects the newer down.
    fn release_attribution(&mut self, code: u32) {
        if let Some(active) = self.repeat {
            if active.code == code {
                self.scheduler.cancel(active.task);
                self.repeat = None;
            }
        }

        if let Some(keysym) = self.slots.remove(&code) {
            self.release_keysym(keysym);
        }
    }

    fn press_keysym(&mut self, keysym: Keysym) {
        self.pressed.mark_pressed(keysym);
        if let Some(handler) = self.handler.as_mut() {
            let action = handler.key_pressed(keysym);
            tracing::trace!("Pressed {} ({:?})", keysym, action);
        }
    }

    fn release_keysym(&mut self, keysym: Keysym) {
        self.pressed.mark_released(keysym);
        if let Some(handler) = self.handler.as_mut() {
            let action = handler.key_released(keysym);
            tracing::trace!("Released {} ({:?})", keysym, action);
        }
    }
}
