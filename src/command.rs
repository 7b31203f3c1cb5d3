use anyhow::{bail, Context};
use rand::Rng;
use serde::Serialize;

use crate::color::HexColor;

/// Seconds per pattern step when no speed is given.
pub const DEFAULT_INTERVAL: f64 = 1.0;
pub const DEFAULT_BRIGHTNESS: u8 = 80;

/// Raw values as the user typed them. Empty strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandInput {
    /// Pattern script to start.
    pub file: Option<String>,
    pub color: Option<String>,
    pub speed: Option<String>,
    pub brightness: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Stop,
    SetColor,
    SetBrightness,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StartParams {
    pub file: String,
    pub color: HexColor,
    pub interval: f64,
    pub brightness: u8,
}

/// A fully resolved request to the device.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start(StartParams),
    Stop,
    SetColor(HexColor),
    SetBrightness(u8),
}

#[derive(Serialize)]
struct ColorBody {
    color: HexColor,
}

#[derive(Serialize)]
struct BrightnessBody {
    brightness: u8,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Start(_) => CommandKind::Start,
            Command::Stop => CommandKind::Stop,
            Command::SetColor(_) => CommandKind::SetColor,
            Command::SetBrightness(_) => CommandKind::SetBrightness,
        }
    }

    /// Endpoint path, relative to the device base url.
    pub fn path(&self) -> &'static str {
        match self {
            Command::Start(_) => "/control/start",
            Command::Stop => "/control/stop",
            Command::SetColor(_) => "/control/color",
            Command::SetBrightness(_) => "/brightness",
        }
    }

    /// JSON body of the request. `stop` is sent without one.
    pub fn body(&self) -> anyhow::Result<Option<serde_json::Value>> {
        let body = match self {
            Command::Start(params) => serde_json::to_value(params)?,
            Command::Stop => return Ok(None),
            Command::SetColor(color) => serde_json::to_value(ColorBody { color: *color })?,
            Command::SetBrightness(brightness) => serde_json::to_value(BrightnessBody {
                brightness: *brightness,
            })?,
        };
        return Ok(Some(body));
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Speed in seconds. Missing, zero or unparseable input falls back to the default.
pub fn parse_interval(input: Option<&str>) -> f64 {
    let raw = match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return DEFAULT_INTERVAL,
    };
    match raw.parse::<f64>() {
        Ok(interval) if interval.is_finite() && interval > 0.0 => interval,
        _ => {
            log::warn!("ignoring speed '{}', using {}", raw, DEFAULT_INTERVAL);
            DEFAULT_INTERVAL
        }
    }
}

/// Brightness clamped to [0, 255]. Missing or unparseable input falls back to the default.
pub fn parse_brightness(input: Option<&str>) -> u8 {
    let raw = match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return DEFAULT_BRIGHTNESS,
    };
    if let Ok(value) = raw.parse::<i64>() {
        return value.clamp(0, 255) as u8;
    }
    match raw.parse::<f64>() {
        Ok(value) if !value.is_nan() => value.round().clamp(0.0, 255.0) as u8,
        _ => {
            log::warn!("ignoring brightness '{}', using {}", raw, DEFAULT_BRIGHTNESS);
            DEFAULT_BRIGHTNESS
        }
    }
}

/// Builds any command from the current input, applying defaults,
/// clamping and random color resolution.
pub fn build_command<R: Rng + ?Sized>(
    kind: CommandKind,
    input: &CommandInput,
    rng: &mut R,
) -> anyhow::Result<Command> {
    let command = match kind {
        CommandKind::Start => {
            let file = match non_empty(&input.file) {
                Some(file) => file.to_string(),
                None => bail!("start needs a pattern file"),
            };
            let color = HexColor::resolve(non_empty(&input.color), rng)
                .context("can't build start command")?;
            Command::Start(StartParams {
                file,
                color,
                interval: parse_interval(input.speed.as_deref()),
                brightness: parse_brightness(input.brightness.as_deref()),
            })
        }
        CommandKind::Stop => Command::Stop,
        CommandKind::SetColor => {
            let color = HexColor::resolve(non_empty(&input.color), rng)
                .context("can't build color command")?;
            Command::SetColor(color)
        }
        CommandKind::SetBrightness => {
            Command::SetBrightness(parse_brightness(input.brightness.as_deref()))
        }
    };
    return Ok(command);
}
