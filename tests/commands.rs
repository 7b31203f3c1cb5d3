mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use common::{recorder, Fixture};
use lightpanel::client::Ack;
use lightpanel::{build_command, CommandInput, CommandKind, ControlClient, DeviceState, StatusReport};

fn form(file: Option<&str>, color: &str, speed: &str, brightness: &str) -> CommandInput {
    CommandInput {
        file: file.map(str::to_string),
        color: Some(color.to_string()),
        speed: Some(speed.to_string()),
        brightness: Some(brightness.to_string()),
    }
}

#[test]
fn commands_hit_their_endpoints() {
    let (fixture, seen) = recorder(json!({"ok": true}));
    let client = ControlClient::new(&fixture.base_url).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let input = form(Some("scripts/light_scripts/wave.py"), "#123456", "", "300");

    for kind in [
        CommandKind::Start,
        CommandKind::Stop,
        CommandKind::SetColor,
        CommandKind::SetBrightness,
    ] {
        let command = build_command(kind, &input, &mut rng).unwrap();
        let ack = client.send(&command).unwrap();
        assert_eq!(ack, Some(Ack { ok: true, error: None }));
    }

    let seen = seen.lock().unwrap();
    let urls: Vec<&str> = seen.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["/control/start", "/control/stop", "/control/color", "/brightness"]);
    assert!(seen.iter().all(|r| r.method == "POST"));
    assert!(seen
        .iter()
        .all(|r| r.content_type.as_deref() == Some("application/json")));

    let start: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        start,
        json!({
            "file": "scripts/light_scripts/wave.py",
            "color": "#123456",
            "interval": 1.0,
            "brightness": 255,
        })
    );
    assert_eq!(seen[1].body, "");
    assert_eq!(seen[2].body, r##"{"color":"#123456"}"##);
    assert_eq!(seen[3].body, r#"{"brightness":255}"#);
}

#[test]
fn random_color_is_sent_as_hex() {
    let (fixture, seen) = recorder(json!({"ok": true}));
    let client = ControlClient::new(&fixture.base_url).unwrap();
    let mut rng = StdRng::seed_from_u64(12);

    let command = build_command(CommandKind::SetColor, &form(None, "RANDOM", "", ""), &mut rng).unwrap();
    client.send(&command).unwrap();

    let seen = seen.lock().unwrap();
    let body: Value = serde_json::from_str(&seen[0].body).unwrap();
    let color = body["color"].as_str().unwrap();
    assert_eq!(color.len(), 7);
    assert!(color.starts_with('#'));
    assert!(color[1..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn refusals_are_returned_not_raised() {
    let (fixture, _seen) = recorder(json!({"ok": false, "error": "path doesn't exist: nope.py"}));
    let client = ControlClient::new(&fixture.base_url).unwrap();
    let mut rng = StdRng::seed_from_u64(13);

    let command = build_command(CommandKind::Start, &form(Some("nope.py"), "", "", ""), &mut rng).unwrap();
    let ack = client.send(&command).unwrap().unwrap();
    assert!(!ack.ok);
    assert_eq!(ack.error.as_deref(), Some("path doesn't exist: nope.py"));
}

#[test]
fn unreachable_device_is_an_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ControlClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
    assert!(client.fetch_state().is_err());
    assert!(client.send(&lightpanel::Command::Stop).is_err());
}

#[test]
fn drives_the_dummy_device() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("rainbow_fill.py");
    std::fs::write(&script, "\"\"\"\n# NAME: Rainbow Fill\n\"\"\"\ndef run(**kwargs):\n    pass\n").unwrap();

    let (fixture, device): (Fixture, _) = Fixture::dummy();
    let client = ControlClient::new(&format!("{}/", fixture.base_url)).unwrap();
    let mut rng = StdRng::seed_from_u64(14);

    assert_eq!(
        client.fetch_state().unwrap(),
        StatusReport::new(DeviceState::Stopped, None)
    );

    let input = form(script.to_str(), "#ff8800", "0.5", "-5");
    let start = build_command(CommandKind::Start, &input, &mut rng).unwrap();
    assert_eq!(client.send(&start).unwrap(), Some(Ack { ok: true, error: None }));
    assert_eq!(
        client.fetch_state().unwrap(),
        StatusReport::new(DeviceState::Running, Some("Rainbow Fill"))
    );
    {
        let device = device.lock().unwrap();
        assert_eq!(device.color.as_deref(), Some("#ff8800"));
        assert_eq!(device.interval, Some(0.5));
        // -5 is clamped to 0 by the panel, which the device reads as "use the default".
        assert_eq!(device.brightness, lightpanel::dummy::DEVICE_DEFAULT_BRIGHTNESS);
    }

    let recolor = build_command(CommandKind::SetColor, &form(None, "0f0", "", ""), &mut rng).unwrap();
    client.send(&recolor).unwrap();
    let dim = build_command(CommandKind::SetBrightness, &form(None, "", "", "300"), &mut rng).unwrap();
    client.send(&dim).unwrap();
    {
        let device = device.lock().unwrap();
        assert_eq!(device.color.as_deref(), Some("#00ff00"));
        assert_eq!(device.brightness, 255);
    }

    let stop = build_command(CommandKind::Stop, &CommandInput::default(), &mut rng).unwrap();
    client.send(&stop).unwrap();
    assert_eq!(
        client.fetch_state().unwrap(),
        StatusReport::new(DeviceState::Stopped, None)
    );
}
