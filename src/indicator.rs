use crate::state::{DeviceState, StatusReport};

/// Title shown when the device state is unrecognized or no pattern is reported.
pub const PLACEHOLDER_TITLE: &str = "N/A";

/// The four mutually exclusive display states of the panel header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Indicator {
    Active,
    Ok,
    Error,
    Neutral,
}

impl Indicator {
    /// Every class an indicator may put on the header.
    pub const CLASSES: [&'static str; 3] = ["header--active", "header--ok", "header--error"];

    pub fn for_state(state: &DeviceState) -> Indicator {
        match state {
            DeviceState::Running => Indicator::Active,
            DeviceState::GracefullyTerminated => Indicator::Ok,
            DeviceState::Crashed => Indicator::Error,
            DeviceState::Stopped | DeviceState::Unknown(_) => Indicator::Neutral,
        }
    }

    /// The header class for this indicator. Neutral carries none.
    pub fn class(&self) -> Option<&'static str> {
        match self {
            Indicator::Active => Some(Indicator::CLASSES[0]),
            Indicator::Ok => Some(Indicator::CLASSES[1]),
            Indicator::Error => Some(Indicator::CLASSES[2]),
            Indicator::Neutral => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Active => "running",
            Indicator::Ok => "finished",
            Indicator::Error => "crashed",
            Indicator::Neutral => "idle",
        }
    }
}

/// What the panel displays for one state update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub indicator: Indicator,
    pub title: String,
}

/// Maps a status report to the frame to display.
pub fn render(report: &StatusReport) -> Frame {
    let state = report.device_state();
    let indicator = Indicator::for_state(&state);
    let title = match (&state, &report.pattern) {
        (DeviceState::Unknown(_), _) => PLACEHOLDER_TITLE.to_string(),
        (_, Some(pattern)) => pattern.clone(),
        (_, None) => PLACEHOLDER_TITLE.to_string(),
    };
    return Frame { indicator, title };
}
