//! An in-memory stand-in for the device's control api.
//!
//! It runs no patterns. It only tracks what the real device would report,
//! which is enough to drive the panel during development and in tests.

use std::path::Path;
use std::sync::{mpsc, Mutex};
use std::thread;

use rouille::{Request, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog;
use crate::push::STATE_EVENT;
use crate::state::{DeviceState, StatusReport};

/// Brightness the device uses when a start request doesn't give one.
pub const DEVICE_DEFAULT_BRIGHTNESS: u8 = 120;

#[derive(Deserialize)]
struct StartBody {
    file: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    interval: Value,
    #[serde(default)]
    brightness: Value,
}

#[derive(Deserialize)]
struct ColorBody {
    #[serde(default)]
    color: Option<String>,
}

#[derive(Deserialize)]
struct BrightnessBody {
    #[serde(default)]
    brightness: Value,
}

// The browser panel sent form values as strings, so accept both.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Zero, empty and null all mean "not given" to the device.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn clamp_brightness(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn accepted() -> Value {
    json!({"ok": true})
}

fn refused(error: String) -> Value {
    log::info!("refusing request: {}", error);
    json!({"ok": false, "error": error})
}

pub struct DummyDevice {
    pub state: DeviceState,
    pub pattern: Option<String>,
    pub file: Option<String>,
    pub color: Option<String>,
    pub interval: Option<f64>,
    pub brightness: u8,
    subscribers: Vec<mpsc::Sender<String>>,
}

impl Default for DummyDevice {
    fn default() -> DummyDevice {
        return DummyDevice::new();
    }
}

impl DummyDevice {
    pub fn new() -> DummyDevice {
        return DummyDevice {
            state: DeviceState::Stopped,
            pattern: None,
            file: None,
            color: None,
            interval: None,
            brightness: DEVICE_DEFAULT_BRIGHTNESS,
            subscribers: Vec::new(),
        };
    }

    pub fn report(&self) -> StatusReport {
        return StatusReport::new(self.state.clone(), self.pattern.as_deref());
    }

    fn frame(&self) -> String {
        json!({"event": STATE_EVENT, "data": self.report()}).to_string()
    }

    /// Pushes the current state to every live subscriber.
    fn publish(&mut self) {
        let frame = self.frame();
        self.subscribers.retain(|tx| tx.send(frame.clone()).is_ok());
    }

    /// Returns the frame to send right away, and a channel for later ones.
    pub fn subscribe(&mut self) -> (String, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        return (self.frame(), rx);
    }

    /// Forces a state, e.g. to simulate a pattern crashing.
    pub fn set_state(&mut self, state: DeviceState) {
        self.state = state;
        self.publish();
    }

    fn start(&mut self, body: StartBody) -> Value {
        let path = Path::new(&body.file);
        if !path.exists() {
            return refused(format!("path doesn't exist: {}", body.file));
        }
        let name = match catalog::pattern_name(path) {
            Ok(name) => name,
            Err(e) => {
                self.state = DeviceState::Crashed;
                self.publish();
                return refused(format!("script {} crashed when loaded: {:#}", body.file, e));
            }
        };
        log::info!(
            "starting '{}' color={:?} interval={:?} brightness={:?}",
            name,
            body.color,
            body.interval,
            body.brightness
        );
        self.state = DeviceState::Running;
        self.pattern = Some(name);
        self.file = Some(body.file);
        self.color = body.color;
        self.interval = number(&body.interval).filter(|i| *i > 0.0);
        self.brightness = if is_falsy(&body.brightness) {
            DEVICE_DEFAULT_BRIGHTNESS
        } else {
            number(&body.brightness)
                .map(clamp_brightness)
                .unwrap_or(DEVICE_DEFAULT_BRIGHTNESS)
        };
        self.publish();
        return accepted();
    }

    fn stop(&mut self) -> Value {
        log::info!("stopping {:?}", self.pattern);
        if self.file.is_some() {
            self.state = DeviceState::GracefullyTerminated;
            self.publish();
        }
        self.state = DeviceState::Stopped;
        self.pattern = None;
        self.file = None;
        self.color = None;
        self.interval = None;
        self.publish();
        return accepted();
    }

    fn set_color(&mut self, color: Option<String>) -> Value {
        let color = match color {
            Some(color) => color,
            None => return refused("request body requires arg for color".to_string()),
        };
        // Nothing to recolor.
        if self.file.is_none() {
            return accepted();
        }
        log::info!("changing color to {}", color);
        self.color = Some(color);
        self.publish();
        return accepted();
    }

    fn set_brightness(&mut self, brightness: &Value) -> Value {
        match number(brightness) {
            Some(value) => {
                self.brightness = clamp_brightness(value);
                log::info!("brightness now {}", self.brightness);
                accepted()
            }
            None => refused("request body requires numeric brightness".to_string()),
        }
    }
}

/// Routes one request against the shared device.
pub fn handle(device: &Mutex<DummyDevice>, request: &Request) -> Response {
    router!(request,
        (GET) (/state) => {
            let device = try_or_400!(device.lock());
            return Response::json(&device.report());
        },

        (POST) (/control/start) => {
            let reply = match rouille::input::json_input::<StartBody>(request) {
                Ok(body) => try_or_400!(device.lock()).start(body),
                Err(e) => refused(format!("request body requires path to script to start: {}", e)),
            };
            return Response::json(&reply);
        },

        (POST) (/control/stop) => {
            let reply = try_or_400!(device.lock()).stop();
            return Response::json(&reply);
        },

        (POST) (/control/color) => {
            let reply = match rouille::input::json_input::<ColorBody>(request) {
                Ok(body) => try_or_400!(device.lock()).set_color(body.color),
                Err(e) => refused(format!("request body requires color: {}", e)),
            };
            return Response::json(&reply);
        },

        (POST) (/brightness) => {
            let reply = match rouille::input::json_input::<BrightnessBody>(request) {
                Ok(body) => try_or_400!(device.lock()).set_brightness(&body.brightness),
                Err(e) => refused(format!("request body requires brightness: {}", e)),
            };
            return Response::json(&reply);
        },

        (GET) (/events) => {
            let (response, websocket) =
                try_or_400!(rouille::websocket::start(request, None::<&'static str>));
            let (initial, updates) = try_or_400!(device.lock()).subscribe();
            thread::spawn(move || {
                let mut ws = match websocket.recv() {
                    Ok(ws) => ws,
                    Err(_) => return,
                };
                if ws.send_text(&initial).is_err() {
                    return;
                }
                for frame in updates {
                    if ws.send_text(&frame).is_err() {
                        break;
                    }
                }
                log::debug!("push subscriber went away");
            });
            return response;
        },

        _ => Response::empty_404()
    )
}
