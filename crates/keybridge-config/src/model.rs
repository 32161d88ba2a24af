//! Configuration data model

use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub global: GlobalConfig,
    pub keyboard: KeyboardConfig,
}

/// Global settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Timing and repeat behaviour of the keyboard coalescer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardConfig {
    /// Synthesize release/press pairs while a non-modifier key is held
    pub auto_repeat: bool,
    /// Time between the press and the start of the repeat cycle
    pub repeat_delay: Duration,
    /// Time between two synthesized repeats
    pub repeat_interval: Duration,
    /// How long an up notification is deferred before its release is emitted
    pub release_delay: Duration,
}

impl KeyboardConfig {
    pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(50);
    pub const DEFAULT_RELEASE_DELAY: Duration = Duration::ZERO;
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            auto_repeat: true,
            repeat_delay: Self::DEFAULT_REPEAT_DELAY,
            repeat_interval: Self::DEFAULT_REPEAT_INTERVAL,
            release_delay: Self::DEFAULT_RELEASE_DELAY,
        }
    }
}
