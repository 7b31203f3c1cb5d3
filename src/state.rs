use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Operational status reported by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Running,
    GracefullyTerminated,
    Crashed,
    Stopped,
    /// Anything the device reports that we don't know about,
    /// including a missing value (stored as the empty string).
    Unknown(String),
}

impl FromStr for DeviceState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<DeviceState, Self::Err> {
        let state = match s {
            "RUNNING" => DeviceState::Running,
            "GRACEFULLY_TERMINATED" => DeviceState::GracefullyTerminated,
            "CRASHED" => DeviceState::Crashed,
            "STOPPED" => DeviceState::Stopped,
            other => DeviceState::Unknown(other.to_string()),
        };
        return Ok(state);
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Running => "RUNNING",
            DeviceState::GracefullyTerminated => "GRACEFULLY_TERMINATED",
            DeviceState::Crashed => "CRASHED",
            DeviceState::Stopped => "STOPPED",
            DeviceState::Unknown(other) => other.as_str(),
        };
        write!(f, "{}", s)
    }
}

/// Body of `GET /state`, and the payload of a pushed `get_state` event.
///
/// Both fields are optional on the wire; the device sends `null` for the
/// pattern when nothing is running. A value that isn't a string is read
/// as missing, so it still renders as an unknown state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default, deserialize_with = "string_or_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub pattern: Option<String>,
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl StatusReport {
    pub fn new(state: DeviceState, pattern: Option<&str>) -> StatusReport {
        return StatusReport {
            state: Some(state.to_string()),
            pattern: pattern.map(str::to_string),
        };
    }

    pub fn device_state(&self) -> DeviceState {
        match &self.state {
            // Parsing is infallible.
            Some(s) => s.parse().unwrap_or(DeviceState::Unknown(String::new())),
            None => DeviceState::Unknown(String::new()),
        }
    }
}
