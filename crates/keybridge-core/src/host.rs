//! Inbound host notifications
//!
//! The normalized shape every host adapter delivers, plus the JSON-lines form
//! used by the daemon and recorded traces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One raw notification from the host input source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostNotification {
    /// A key went down. `code` is the raw key code (0 when the host did not
    /// report one), `identifier` the optional symbolic name.
    Down {
        code: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<String>,
    },
    /// A character was typed for the most recent down.
    Typed { char_code: u32 },
    /// A key went up.
    Up { code: u32 },
    /// Input focus was lost.
    FocusLost,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Empty notification line")]
    Empty,

    #[error("Malformed notification: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostNotification {
    /// Decode one JSON line.
    pub fn from_json(line: &str) -> Result<Self, DecodeError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_str(line)?)
    }
}

/// A notification in a recorded trace, optionally stamped with its offset in
/// milliseconds from the start of the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<u64>,
    #[serde(flatten)]
    pub notification: HostNotification,
}

impl TraceEntry {
    pub fn from_json(line: &str) -> Result<Self, DecodeError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_str(line)?)
    }
}
