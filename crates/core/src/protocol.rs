//! Wire envelope and event routing for the relay channel.
//!
//! Every WebSocket text frame is a JSON object of the form
//! `{"event": "<name>", "data": <any JSON>}`. The relay never inspects
//! `data` beyond the configured alert field; it is forwarded verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::event_names::{
    COMMAND_FORCE_START, COMMAND_FORCE_STOP, COMMAND_PREFIX, COMMAND_SET_AUTO, COMMAND_WATER,
    EVENT_CONNECT, EVENT_DISCONNECT, EVENT_TELEMETRY_UPDATE, SIM_FORCE_START, SIM_FORCE_STOP,
    SIM_SET_AUTO, SIM_WATER_PLANT,
};

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A single named event travelling between a peer and the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    /// Event payload. Absent and `null` are equivalent.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// A frame with no payload.
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, Value::Null)
    }

    /// Decode a text frame received from a peer.
    pub fn decode(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::Validation(format!("Invalid frame: {e}")))
    }

    /// Encode the frame for sending as a WebSocket text message.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("Frame is always serialisable")
    }
}

// ---------------------------------------------------------------------------
// CommandTable
// ---------------------------------------------------------------------------

/// Static translation from browser-facing command names to the names the
/// telemetry source listens for.
#[derive(Debug, Clone)]
pub struct CommandTable {
    routes: HashMap<String, String>,
}

impl CommandTable {
    /// An empty table. Every `command_*` event is then unrecognised.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Add (or replace) a translation.
    pub fn with_route(mut self, command: impl Into<String>, device_event: impl Into<String>) -> Self {
        self.routes.insert(command.into(), device_event.into());
        self
    }

    /// Device-facing name for a browser command, if the command is known.
    pub fn translate(&self, command: &str) -> Option<&str> {
        self.routes.get(command).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::empty()
            .with_route(COMMAND_WATER, SIM_WATER_PLANT)
            .with_route(COMMAND_FORCE_START, SIM_FORCE_START)
            .with_route(COMMAND_FORCE_STOP, SIM_FORCE_STOP)
            .with_route(COMMAND_SET_AUTO, SIM_SET_AUTO)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How the hub should treat an inbound event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Rebroadcast verbatim and feed the threshold evaluator.
    Telemetry,
    /// Rebroadcast under the translated device-facing name.
    Command { device_event: &'a str },
    /// Connection lifecycle; log only.
    Lifecycle,
    /// Not a recognised event; ignore.
    Unknown,
}

/// Classify an event name against the command table.
pub fn route<'a>(event: &str, commands: &'a CommandTable) -> Route<'a> {
    match event {
        EVENT_TELEMETRY_UPDATE => Route::Telemetry,
        EVENT_CONNECT | EVENT_DISCONNECT => Route::Lifecycle,
        name if name.starts_with(COMMAND_PREFIX) => match commands.translate(name) {
            Some(device_event) => Route::Command { device_event },
            None => Route::Unknown,
        },
        _ => Route::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
