//! Response definitions
//!
//! Represents responses to clients and their wire frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::ParseError;

/// Help text sent after "too short" and "unknown command" errors, one frame per entry
pub const USAGE_FRAMES: [&str; 2] = [
    "Usage:\n<CMD> <key> [<value>]\nCommands:\n\tSET\tSet a new key-value record.\n",
    "\tGET\tGet the value of a key.\n\tDEL\tDelete a record by key.\n",
];

/// Message for storage failures that are not the client's fault
pub const INTERNAL_ERROR: &str = "internal storage error.";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    AlreadySet,
    Error,
}

impl Status {
    /// The status line as sent on the wire (without newline)
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NotFound => "NOTFOUND",
            Status::AlreadySet => "ALREADYSET",
            Status::Error => "ERROR",
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (value for GET, error message for ERROR)
    pub payload: Option<Bytes>,

    /// Append the usage block (ERROR only)
    pub usage: bool,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload,
            usage: false,
        }
    }

    /// Create a NOTFOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
            usage: false,
        }
    }

    /// Create an ALREADYSET response
    pub fn already_set() -> Self {
        Self {
            status: Status::AlreadySet,
            payload: None,
            usage: false,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(Bytes::copy_from_slice(message.as_bytes())),
            usage: false,
        }
    }

    /// Create an ERROR response followed by the usage block
    pub fn error_with_usage(message: &str) -> Self {
        Self {
            usage: true,
            ..Self::error(message)
        }
    }

    /// Create the ERROR response for a storage failure
    pub fn internal_error() -> Self {
        Self::error(INTERNAL_ERROR)
    }

    /// Map a rejected request to its response
    pub fn from_parse_error(err: &ParseError) -> Self {
        let message = err.to_string();
        if err.wants_usage() {
            Self::error_with_usage(&message)
        } else {
            Self::error(&message)
        }
    }

    /// The value carried by a successful GET
    pub fn value(&self) -> Option<&Bytes> {
        match self.status {
            Status::Ok => self.payload.as_ref(),
            _ => None,
        }
    }

    /// Wire frames, one write each
    ///
    /// ```text
    /// OK\n                      SET/DEL success
    /// OK\n | <value>\n          GET success (two frames)
    /// NOTFOUND\n
    /// ALREADYSET\n
    /// ERROR: <msg>\n [| usage | usage]
    /// ```
    pub fn frames(&self) -> Vec<Bytes> {
        let mut frames = Vec::with_capacity(3);

        match self.status {
            Status::Error => {
                let message = self.payload.as_deref().unwrap_or_default();
                let mut line = BytesMut::with_capacity(8 + message.len());
                line.put_slice(b"ERROR: ");
                line.put_slice(message);
                line.put_u8(b'\n');
                frames.push(line.freeze());

                if self.usage {
                    frames.extend(USAGE_FRAMES.into_iter().map(|f| Bytes::from_static(f.as_bytes())));
                }
            }
            status => {
                frames.push(Bytes::from(format!("{}\n", status.as_str())));

                if let Some(payload) = &self.payload {
                    let mut line = BytesMut::with_capacity(payload.len() + 1);
                    line.put_slice(payload);
                    line.put_u8(b'\n');
                    frames.push(line.freeze());
                }
            }
        }

        frames
    }
}
