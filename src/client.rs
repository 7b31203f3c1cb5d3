use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::command::Command;
use crate::state::StatusReport;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply the device sends for every control request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Blocking HTTP client for the device API.
#[derive(Clone, Debug)]
pub struct ControlClient {
    http: Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: &str) -> anyhow::Result<ControlClient> {
        return ControlClient::with_timeout(base_url, DEFAULT_TIMEOUT);
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<ControlClient> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        return Ok(ControlClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        });
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /state`.
    pub fn fetch_state(&self) -> anyhow::Result<StatusReport> {
        let url = self.url("/state");
        let report = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?
            .json::<StatusReport>()
            .with_context(|| format!("GET {} returned an invalid state", url))?;
        return Ok(report);
    }

    /// Posts a command to its endpoint.
    ///
    /// Returns the device's acknowledgement if it sent one we could decode.
    /// A refused command is logged but is not an error: the next state
    /// update shows what the device is actually doing.
    pub fn send(&self, command: &Command) -> anyhow::Result<Option<Ack>> {
        let url = self.url(command.path());
        let request = match command.body()? {
            Some(body) => self.http.post(&url).json(&body),
            None => self.http.post(&url).header(CONTENT_TYPE, "application/json"),
        };
        log::debug!("POST {} {:?}", url, command);
        let response = request
            .send()
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()?;
        let text = response.text().unwrap_or_default();
        let ack = serde_json::from_str::<Ack>(&text).ok();
        match &ack {
            Some(Ack { ok: false, error }) => log::warn!(
                "device refused {:?}: {}",
                command.kind(),
                error.as_deref().unwrap_or("no reason given")
            ),
            Some(_) => log::debug!("device accepted {:?}", command.kind()),
            None => log::debug!("no acknowledgement for {:?}", command.kind()),
        }
        return Ok(ack);
    }
}
