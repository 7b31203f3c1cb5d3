mod common;

use std::net::TcpListener;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::{wait_until, Fixture};
use lightpanel::session::Feed;
use lightpanel::{ControlClient, DeviceState, HeaderView, Session};

const PERIOD: Duration = Duration::from_millis(20);

fn shared_view() -> Arc<Mutex<HeaderView>> {
    Arc::new(Mutex::new(HeaderView::with_classes(&["header"])))
}

#[test]
fn poll_renders_device_state() {
    let (fixture, device) = Fixture::dummy();
    let view = shared_view();
    let client = ControlClient::new(&fixture.base_url).unwrap();
    let session = Session::poll(client, view.clone(), PERIOD);
    assert_eq!(session.feed(), &Feed::Poll { period: PERIOD });

    assert!(wait_until(|| view.lock().unwrap().updates() > 0));
    {
        let view = view.lock().unwrap();
        assert!(view.indicator_classes().is_empty());
        assert_eq!(view.title(), "N/A");
        assert!(view.has_class("header"));
    }

    {
        let mut device = device.lock().unwrap();
        device.pattern = Some("rainbow".to_string());
        device.set_state(DeviceState::Crashed);
    }
    assert!(wait_until(|| view.lock().unwrap().has_class("header--error")));
    {
        let view = view.lock().unwrap();
        assert_eq!(view.indicator_classes(), vec!["header--error"]);
        assert_eq!(view.title(), "rainbow");
    }

    device.lock().unwrap().set_state(DeviceState::Running);
    assert!(wait_until(|| view.lock().unwrap().has_class("header--active")));
    assert_eq!(view.lock().unwrap().indicator_classes(), vec!["header--active"]);

    session.shutdown();
    let frozen = view.lock().unwrap().updates();
    thread::sleep(PERIOD * 5);
    assert_eq!(view.lock().unwrap().updates(), frozen);
}

#[test]
fn failed_polls_leave_the_view_alone() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ControlClient::with_timeout(
        &format!("http://127.0.0.1:{}", port),
        Duration::from_millis(200),
    )
    .unwrap();
    let view = shared_view();
    let session = Session::poll(client, view.clone(), PERIOD);
    thread::sleep(PERIOD * 10);
    assert!(session.is_running());
    drop(session);

    let view = view.lock().unwrap();
    assert_eq!(view.updates(), 0);
    assert_eq!(view.title(), "");
}

#[test]
fn push_renders_pushed_state() {
    let (fixture, device) = Fixture::dummy();
    let view = shared_view();
    let session = Session::subscribe(&fixture.events_url(), view.clone()).unwrap();

    // The device pushes its current state on connect.
    assert!(wait_until(|| view.lock().unwrap().updates() > 0));
    assert_eq!(view.lock().unwrap().title(), "N/A");

    {
        let mut device = device.lock().unwrap();
        device.pattern = Some("DNA".to_string());
        device.set_state(DeviceState::GracefullyTerminated);
    }
    assert!(wait_until(|| view.lock().unwrap().has_class("header--ok")));
    {
        let view = view.lock().unwrap();
        assert_eq!(view.indicator_classes(), vec!["header--ok"]);
        assert_eq!(view.title(), "DNA");
    }

    session.shutdown();
}

#[test]
fn push_ignores_other_events_and_ends_on_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}/events", listener.local_addr().unwrap());
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        let frames = [
            r#"{"event": "log", "data": "warming up"}"#,
            "garbage",
            r#"{"event": "get_state", "data": {"state": "CRASHED", "pattern": "rainbow"}}"#,
        ];
        for frame in frames {
            ws.send(tungstenite::Message::Text(frame.to_string())).unwrap();
        }
        let _ = ws.close(None);
        // Drive the close handshake until the client answers.
        while ws.read().is_ok() {}
    });

    let view = shared_view();
    let session = Session::subscribe(&url, view.clone()).unwrap();
    assert!(wait_until(|| !session.is_running()));
    server.join().unwrap();

    let view = view.lock().unwrap();
    assert_eq!(view.updates(), 1);
    assert_eq!(view.indicator_classes(), vec!["header--error"]);
    assert_eq!(view.title(), "rainbow");
}

#[test]
fn subscribe_gives_up_on_a_silent_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}/events", listener.local_addr().unwrap());
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let peer = thread::spawn(move || {
        // Accept and never answer the upgrade.
        let (_stream, _) = listener.accept().unwrap();
        let _ = done_rx.recv_timeout(Duration::from_secs(30));
    });

    let started = Instant::now();
    let result = Session::subscribe(&url, HeaderView::new());
    assert!(result.is_err());
    assert!(started.elapsed() < lightpanel::push::HANDSHAKE_TIMEOUT * 3);

    done_tx.send(()).unwrap();
    peer.join().unwrap();
}

#[test]
fn subscribe_fails_without_a_device() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("ws://127.0.0.1:{}/events", port);
    assert!(Session::subscribe(&url, HeaderView::new()).is_err());
    assert!(Session::subscribe("wss://lights.example/events", HeaderView::new()).is_err());
}
