#![allow(dead_code)]

use std::io::Read;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rouille::{Request, Response};

use lightpanel::dummy::{self, DummyDevice};

/// A rouille server on an ephemeral port, stopped on drop.
pub struct Fixture {
    pub base_url: String,
    stop: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Fixture {
    pub fn serve<F>(handler: F) -> Fixture
    where
        F: Send + Sync + 'static + Fn(&Request) -> Response,
    {
        let server = rouille::Server::new("127.0.0.1:0", handler).unwrap();
        let base_url = format!("http://{}", server.server_addr());
        let (thread, stop) = server.stoppable();
        return Fixture {
            base_url,
            stop: Some(stop),
            thread: Some(thread),
        };
    }

    /// Serves the dummy device, returning a handle on its state.
    pub fn dummy() -> (Fixture, Arc<Mutex<DummyDevice>>) {
        let device = Arc::new(Mutex::new(DummyDevice::new()));
        let shared = device.clone();
        let fixture = Fixture::serve(move |request| dummy::handle(&shared, request));
        return (fixture, device);
    }

    pub fn events_url(&self) -> String {
        lightpanel::push::events_url(&self.base_url).unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Records every request and answers with `reply`.
pub fn recorder(reply: serde_json::Value) -> (Fixture, Arc<Mutex<Vec<Recorded>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let fixture = Fixture::serve(move |request| {
        let mut body = String::new();
        if let Some(mut data) = request.data() {
            let _ = data.read_to_string(&mut body);
        }
        log.lock().unwrap().push(Recorded {
            method: request.method().to_string(),
            url: request.url(),
            content_type: request.header("Content-Type").map(str::to_string),
            body,
        });
        Response::json(&reply)
    });
    return (fixture, seen);
}

/// Polls `condition` until it holds or five seconds pass.
pub fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    return condition();
}
