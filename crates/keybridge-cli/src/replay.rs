//! Replay of recorded host notification traces
//!
//! A trace is a JSON-lines file of host notifications, each optionally
//! stamped with `"at"` (milliseconds since the start of the recording).
//! Entries without a stamp share the previous entry's time.
//!
//! Replay runs on virtual time. Entries with the same stamp form one input
//! batch: deferred work due at that instant only runs once the whole batch
//! has been delivered, the same way a typed character reaches the coalescer
//! before the resolution of its down.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use keybridge_config::KeyboardConfig;
use keybridge_core::{Coalescer, DecodeError, EventQueue, KeyEvent, TraceEntry};
use miette::IntoDiagnostic;

/// One emitted key event and the virtual time it was emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayLine {
    pub at: u64,
    pub event: KeyEvent,
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, keysym) = match self.event {
            KeyEvent::Press { keysym } => ("press", keysym),
            KeyEvent::Release { keysym } => ("release", keysym),
        };
        write!(f, "{:>6}ms {:<7} {}", self.at, kind, keysym)
    }
}

struct Replay {
    coalescer: Coalescer<EventQueue>,
    start: Instant,
    output: Vec<ReplayLine>,
}

impl Replay {
    fn new(config: KeyboardConfig) -> Self {
        Self {
            coalescer: Coalescer::with_handler(config, EventQueue::new()),
            start: Instant::now(),
            output: Vec::new(),
        }
    }

    fn instant(&self, at: u64) -> Instant {
        self.start + Duration::from_millis(at)
    }

    fn millis(&self, instant: Instant) -> u64 {
        // Deadlines are whole milliseconds after the start
        u64::try_from(instant.duration_since(self.start).as_millis()).unwrap_or(u64::MAX)
    }

    /// Run deferred work one deadline at a time while `due` accepts it.
    fn advance(&mut self, due: impl Fn(Instant) -> bool) {
        while let Some(deadline) = self.coalescer.next_deadline() {
            if !due(deadline) {
                break;
            }
            self.coalescer.run_due(deadline);
            self.collect(deadline);
        }
    }

    fn collect(&mut self, now: Instant) {
        let at = self.millis(now);
        if let Some(queue) = self.coalescer.handler_mut() {
            self.output
                .extend(queue.drain().into_iter().map(|event| ReplayLine { at, event }));
        }
    }
}

/// Replay a trace held in memory.
pub fn replay_str(trace: &str, config: KeyboardConfig) -> miette::Result<Vec<ReplayLine>> {
    let release_delay = config.release_delay;
    let mut replay = Replay::new(config);
    let mut clock = 0u64;

    for (idx, line) in trace.lines().enumerate() {
        let line_no = idx + 1;
        let entry = match TraceEntry::from_json(line) {
            Ok(entry) => entry,
            Err(DecodeError::Empty) => continue,
            Err(e) => return Err(miette::miette!("line {}: {}", line_no, e)),
        };

        let at = entry.at.unwrap_or(clock);
        if at < clock {
            return Err(miette::miette!(
                "line {}: time goes backwards ({}ms after {}ms)",
                line_no,
                at,
                clock
            ));
        }
        clock = at;

        let now = replay.instant(at);
        replay.advance(|deadline| deadline < now);

        tracing::debug!("{}ms: {:?}", at, entry.notification);
        replay.coalescer.dispatch(&entry.notification, now);
        replay.collect(now);
    }

    let end = replay.instant(clock) + release_delay;
    replay.advance(|deadline| deadline <= end);

    Ok(replay.output)
}

/// Replay a trace file.
pub fn replay_file(path: &Path, config: KeyboardConfig) -> miette::Result<Vec<ReplayLine>> {
    let trace = std::fs::read_to_string(path).into_diagnostic()?;
    replay_str(&trace, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybridge_core::Keysym;

    fn line(at: u64, event: KeyEvent) -> ReplayLine {
        ReplayLine { at, event }
    }

    fn press(keysym: u32) -> KeyEvent {
        KeyEvent::Press {
            keysym: Keysym::new(keysym),
        }
    }

    fn release(keysym: u32) -> KeyEvent {
        KeyEvent::Release {
            keysym: Keysym::new(keysym),
        }
    }

    #[test]
    fn test_same_batch_typed_wins() {
        let trace = r#"
{"at":0,"type":"down","code":65,"identifier":"U+0041"}
{"at":0,"type":"typed","char_code":65}
{"at":80,"type":"up","code":65}
"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(lines, vec![line(0, press(0x41)), line(80, release(0x41))]);
    }

    #[test]
    fn test_unstamped_entries_share_previous_time() {
        let trace = r#"
{"at":10,"type":"down","code":65,"identifier":"U+0041"}
{"type":"typed","char_code":97}
{"type":"up","code":65}
"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(lines, vec![line(10, press(0x61)), line(10, release(0x61))]);
    }

    #[test]
    fn test_repeat_timestamps() {
        let trace = r#"
{"at":0,"type":"down","code":8}
{"at":620,"type":"up","code":8}
"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                line(0, press(0xFF08)),
                line(550, release(0xFF08)),
                line(550, press(0xFF08)),
                line(600, release(0xFF08)),
                line(600, press(0xFF08)),
                line(620, release(0xFF08)),
            ]
        );
    }

    #[test]
    fn test_held_key_at_end_does_not_repeat_forever() {
        let trace = r#"{"at":0,"type":"down","code":13}"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(lines, vec![line(0, press(0xFF0D))]);
    }

    #[test]
    fn test_trailing_release_delay_is_honoured() {
        let config = KeyboardConfig {
            release_delay: Duration::from_millis(15),
            ..KeyboardConfig::default()
        };
        let trace = "{\"at\":0,\"type\":\"down\",\"code\":9}\n{\"at\":5,\"type\":\"up\",\"code\":9}\n";

        let lines = replay_str(trace, config).unwrap();
        assert_eq!(lines, vec![line(0, press(0xFF09)), line(20, release(0xFF09))]);
    }

    #[test]
    fn test_altgr_release_stamped_at_typed_time() {
        let trace = r#"
{"at":0,"type":"down","code":17}
{"at":0,"type":"down","code":18}
{"at":30,"type":"down","code":69,"identifier":"U+0045"}
{"at":30,"type":"typed","char_code":8364}
"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                line(0, press(0xFFE3)),
                line(0, press(0xFFE9)),
                line(30, release(0xFFE3)),
                line(30, release(0xFFE9)),
                line(30, press(0x0100_20AC)),
            ]
        );
    }

    #[test]
    fn test_double_tap_with_equal_stamps() {
        let trace = r#"
{"at":40,"type":"down","code":13}
{"at":40,"type":"up","code":13}
{"at":40,"type":"down","code":13}
{"at":40,"type":"up","code":13}
"#;

        let lines = replay_str(trace, KeyboardConfig::default()).unwrap();
        assert_eq!(
            lines,
            vec![
                line(40, press(0xFF0D)),
                line(40, release(0xFF0D)),
                line(40, press(0xFF0D)),
                line(40, release(0xFF0D)),
            ]
        );
    }

    #[test]
    fn test_millis_since_start() {
        let replay = Replay::new(KeyboardConfig::default());
        assert_eq!(replay.millis(replay.start), 0);
        assert_eq!(replay.millis(replay.instant(1234)), 1234);
    }

    #[test]
    fn test_time_going_backwards_fails() {
        let trace = r#"
{"at":50,"type":"down","code":8}
{"at":40,"type":"up","code":8}
"#;

        let err = replay_str(trace, KeyboardConfig::default()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "got: {}", err);
    }

    #[test]
    fn test_malformed_line_fails_with_line_number() {
        let trace = "{\"type\":\"down\",\"code\":8}\n{\"type\":\"sideways\"}\n";

        let err = replay_str(trace, KeyboardConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "got: {}", err);
    }

    #[test]
    fn test_replay_line_display() {
        let text = line(550, release(0xFF08)).to_string();
        assert_eq!(text, "   550ms release 0xFF08");
    }

    #[test]
    fn test_replay_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"at\":0,\"type\":\"down\",\"code\":27}}").unwrap();
        writeln!(file, "{{\"at\":40,\"type\":\"up\",\"code\":27}}").unwrap();

        let lines = replay_file(file.path(), KeyboardConfig::default()).unwrap();
        assert_eq!(lines, vec![line(0, press(0xFF1B)), line(40, release(0xFF1B))]);
    }
}
