//! Stop hook input and the decision whether there is anything to inspect.

use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

use crate::HookError;
use crate::verdict::SkipReason;

/// The JSON object the host writes to stdin once per invocation.
///
/// Unknown fields are ignored. `session_id` and `hook_event_name` only
/// annotate diagnostics.
#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub transcript_path: Option<String>,
    /// Set by the host when this stop already follows a hook-forced retry.
    #[serde(default)]
    pub stop_hook_active: Option<bool>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

/// What to do with a parsed payload.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Approve without reading the transcript.
    ShortCircuit(SkipReason),
    /// Inspect the transcript at this path.
    Proceed(PathBuf),
}

impl HookInput {
    pub fn from_reader(mut reader: impl Read) -> Result<Self, HookError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Self::parse(&raw)
    }

    /// Parse a payload, insisting on a top-level JSON object.
    pub fn parse(raw: &str) -> Result<Self, HookError> {
        let value: Value = serde_json::from_str(raw)?;
        let kind = match &value {
            Value::Object(_) => return Ok(Self::deserialize(value)?),
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
        };
        Err(HookError::NotAnObject(kind))
    }

    pub fn already_retrying(&self) -> bool {
        self.stop_hook_active.unwrap_or(false)
    }

    /// The retry guard wins over everything else: once the host says this is
    /// a retry, the hook never rejects again.
    pub fn resolve(&self) -> Resolution {
        if self.already_retrying() {
            return Resolution::ShortCircuit(SkipReason::AlreadyRetrying);
        }

        match self.transcript_path.as_deref() {
            Some(path) if !path.is_empty() => Resolution::Proceed(PathBuf::from(path)),
            _ => Resolution::ShortCircuit(SkipReason::NoTranscriptPath),
        }
    }
}
