use std::sync::mpsc;
use std::time::Duration;

use crate::client::ControlClient;
use crate::indicator::render;
use crate::push::{PushConnection, PushEvent};
use crate::view::View;

pub const DEFAULT_POLL_PERIOD_MS: u64 = 1000;

/// How long a push read blocks before checking for shutdown.
const PUSH_READ_TIMEOUT: Duration = Duration::from_millis(100);

enum SessionMsg {
    Shutdown,
}

/// Where a session gets its state updates from.
#[derive(Clone, Debug, PartialEq)]
pub enum Feed {
    Poll { period: Duration },
    Push { url: String },
}

/// One live state feed rendering into a view.
///
/// The session owns its worker thread. Dropping the session (or calling
/// `shutdown`) stops the worker and waits for it.
pub struct Session {
    thread: Option<std::thread::JoinHandle<()>>,
    tx: mpsc::Sender<SessionMsg>,
    feed: Feed,
}

impl Session {
    /// Polls `GET /state` every `period`, starting immediately.
    /// Failed fetches are skipped without touching the view.
    pub fn poll<V>(client: ControlClient, mut view: V, period: Duration) -> Session
    where
        V: View + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let thread = std::thread::spawn(move || loop {
            match client.fetch_state() {
                Ok(report) => view.show(&render(&report)),
                Err(e) => log::debug!("no state update: {:#}", e),
            }
            match rx.recv_timeout(period) {
                Ok(SessionMsg::Shutdown) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
            }
        });
        return Session {
            thread: Some(thread),
            tx,
            feed: Feed::Poll { period },
        };
    }

    /// Subscribes to the push channel at `url` and renders every
    /// `get_state` event. The worker ends when the device closes the channel.
    pub fn subscribe<V>(url: &str, mut view: V) -> anyhow::Result<Session>
    where
        V: View + Send + 'static,
    {
        let mut connection = PushConnection::connect(url, PUSH_READ_TIMEOUT)?;
        let (tx, rx) = mpsc::channel();
        let thread = std::thread::spawn(move || {
            loop {
                match rx.try_recv() {
                    Ok(SessionMsg::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => break,
                    Err(mpsc::TryRecvError::Empty) => (),
                }
                match connection.next() {
                    Ok(PushEvent::State(report)) => view.show(&render(&report)),
                    Ok(PushEvent::Idle) => continue,
                    Ok(PushEvent::Closed) => {
                        log::info!("push channel closed by device");
                        break;
                    }
                    Err(e) => {
                        log::warn!("push channel failed: {:#}", e);
                        break;
                    }
                }
            }
            connection.close();
        });
        return Ok(Session {
            thread: Some(thread),
            tx,
            feed: Feed::Push { url: url.to_string() },
        });
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Whether the worker is still running. A push session finishes on its
    /// own when the channel closes.
    pub fn is_running(&self) -> bool {
        match &self.thread {
            Some(thread) => !thread.is_finished(),
            None => false,
        }
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(SessionMsg::Shutdown);
        if let Some(thread) = self.thread.take() {
            if let Err(err) = thread.join() {
                log::error!("session worker panicked: {:?}", err);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
