//! HTTP client for the battle server.

use std::thread;

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::{RetryPolicy, SessionConfig};
use crate::error::TransportError;
use crate::transport::{BattleSession, Transport};

#[derive(Debug, Deserialize)]
struct BattleResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(rename = "battleSession")]
    battle_session: BattleSession,
}

#[derive(Debug, Deserialize)]
struct SendCommandResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReadBattleLogResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(rename = "battleLog", default)]
    battle_log: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: Option<String>,
}

const fn default_success() -> bool {
    true
}

/// Battle-server client over HTTP/JSON.
///
/// Each client holds its own server URL, so several can coexist in one
/// process.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Client for the server in `config`.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_url(&config.server_url, config.retry)
    }

    /// Client for `base_url` with the given retry schedule.
    #[must_use]
    pub fn with_url(base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Server base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// Send, retrying network-level failures with exponential backoff.
    /// HTTP error statuses are answers, not failures, and are returned as-is.
    fn send(&self, request: impl Fn() -> RequestBuilder) -> Result<Response, TransportError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            match request().send() {
                Ok(response) => return Ok(response),
                Err(source) if attempt + 1 >= attempts => {
                    return Err(TransportError::Network { attempts, source });
                }
                Err(err) => {
                    let delay = self.retry.delay(attempt);
                    warn!("request failed (attempt {}/{attempts}), retrying in {delay:?}: {err}", attempt + 1);
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("request failed");
            let message = match response.json::<ErrorResponse>() {
                Ok(body) if !body.error.is_empty() => body.error,
                Ok(body) => body.message.unwrap_or_else(|| reason.to_string()),
                Err(_) => reason.to_string(),
            };
            return Err(TransportError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .map_err(|err| TransportError::Decode(err.to_string()))
    }

    fn refused(message: impl Into<String>) -> TransportError {
        TransportError::Server {
            status: 200,
            message: message.into(),
        }
    }

    fn battle_call(&self, endpoint: &str, body: &serde_json::Value) -> Result<BattleSession, TransportError> {
        let url = self.url(endpoint);
        debug!("POST {url}");
        let response = self.send(|| self.client.post(&url).json(body))?;
        let reply: BattleResponse = Self::decode(response)?;
        if !reply.success {
            return Err(Self::refused(format!("{endpoint} refused")));
        }
        Ok(reply.battle_session)
    }
}

impl Transport for HttpTransport {
    fn create_battle(&self, session: &str) -> Result<BattleSession, TransportError> {
        self.battle_call("createBattle", &json!({ "sessionID": session }))
    }

    fn join_battle(&self, session: &str, battle: &str) -> Result<BattleSession, TransportError> {
        self.battle_call(
            "joinBattle",
            &json!({ "sessionID": session, "battleID": battle }),
        )
    }

    fn send_command(&self, session: &str, battle: &str, command: &str) -> Result<(), TransportError> {
        let url = self.url("sendBattleCommand");
        let body = json!({ "sessionID": session, "battleID": battle, "command": command });
        debug!("POST {url}: {command}");
        let response = self.send(|| self.client.post(&url).json(&body))?;
        let reply: SendCommandResponse = Self::decode(response)?;
        if reply.success {
            Ok(())
        } else {
            Err(Self::refused(reply.message))
        }
    }

    fn read_battle_log(&self, battle: &str) -> Result<String, TransportError> {
        let url = self.url("readBattleLog");
        let response = self.send(|| self.client.get(&url).query(&[("battleID", battle)]))?;
        let reply: ReadBattleLogResponse = Self::decode(response)?;
        if reply.success {
            Ok(reply.battle_log)
        } else {
            Err(Self::refused(format!("cannot read log of {battle}")))
        }
    }
}
