//! Push-socket framing.
//!
//! Outgoing messages are single lines `"{session} {VERB} {battle} {args}"`.
//! The server pushes `FULLLOG: [..]` and `UPDATE: [..]` frames carrying the
//! whole command log as a JSON array, and `ERROR: ..` frames.

use std::fmt;

/// Prefix of a full-log frame.
pub const FULLLOG_PREFIX: &str = "FULLLOG:";
/// Prefix of an update frame.
pub const UPDATE_PREFIX: &str = "UPDATE:";
/// Prefix of an error frame.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Request verbs understood by the socket server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketVerb {
    /// Open a new battle.
    Create,
    /// Join an existing battle.
    Join,
    /// Append a command to the battle log.
    Write,
    /// Ask for a `FULLLOG` frame.
    ReadFull,
}

impl SocketVerb {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SocketVerb::Create => "CREATE",
            SocketVerb::Join => "JOIN",
            SocketVerb::Write => "WRITE",
            SocketVerb::ReadFull => "READFULL",
        }
    }
}

impl fmt::Display for SocketVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode one outgoing line, without the trailing newline.
#[must_use]
pub fn encode_message(session: &str, verb: SocketVerb, battle: &str, args: &str) -> String {
    format!("{session} {verb} {battle} {args}").trim().to_string()
}

/// A frame pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Complete command log.
    FullLog(Vec<String>),
    /// Command log after a change; replayed the same way as a full log.
    Update(Vec<String>),
    /// Server-side error message.
    Error(String),
    /// Anything else; ignored by clients.
    Other(String),
}

impl Frame {
    /// Parse one incoming frame.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if a log frame's payload is not an array of
    /// strings.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let text = text.trim();
        if let Some(payload) = text.strip_prefix(FULLLOG_PREFIX) {
            return serde_json::from_str(payload.trim()).map(Frame::FullLog);
        }
        if let Some(payload) = text.strip_prefix(UPDATE_PREFIX) {
            return serde_json::from_str(payload.trim()).map(Frame::Update);
        }
        if let Some(message) = text.strip_prefix(ERROR_PREFIX) {
            return Ok(Frame::Error(message.trim().to_string()));
        }
        Ok(Frame::Other(text.to_string()))
    }

    /// Commands carried by a log frame.
    #[must_use]
    pub fn commands(&self) -> Option<&[String]> {
        match self {
            Frame::FullLog(commands) | Frame::Update(commands) => Some(commands),
            Frame::Error(_) | Frame::Other(_) => None,
        }
    }
}
