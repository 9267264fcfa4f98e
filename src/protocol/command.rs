//! Command definitions
//!
//! Turns a request line into a validated command.

use bytes::Bytes;
use thiserror::Error;

use crate::error::Result;
use crate::storage::Key;

use super::tokenizer::{split_tokens, tokenize, MAX_TOKENS};

/// Shortest request worth parsing: 3-letter command + space + 1-char key
pub const MIN_REQUEST_LEN: usize = 5;

/// Why a request line was rejected
///
/// `Display` is the user-visible error text (the wire adds the `ERROR: `
/// prefix).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("command too short.")]
    TooShort,

    #[error("command too long.")]
    TooLong { max: usize },

    #[error("no valid command detected.")]
    UnknownCommand,

    #[error("SET requires key and value.")]
    SetArity,

    #[error("GET takes only a key.")]
    GetArity,

    #[error("DEL takes only a key.")]
    DelArity,

    #[error("invalid key.")]
    InvalidKey,

    #[error("value too large.")]
    ValueTooLarge { len: usize, max: usize },
}

impl ParseError {
    /// Whether the usage block follows the error line
    pub fn wants_usage(&self) -> bool {
        matches!(self, ParseError::TooShort | ParseError::UnknownCommand)
    }
}

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Set,
    Get,
    Del,
}

impl CommandType {
    /// Case-sensitive match of the command token
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"SET" => Some(CommandType::Set),
            b"GET" => Some(CommandType::Get),
            b"DEL" => Some(CommandType::Del),
            _ => None,
        }
    }

    /// Expected token count, command included
    pub fn arity(self) -> usize {
        match self {
            CommandType::Set => 3,
            CommandType::Get | CommandType::Del => 2,
        }
    }

    pub fn arity_error(self) -> ParseError {
        match self {
            CommandType::Set => ParseError::SetArity,
            CommandType::Get => ParseError::GetArity,
            CommandType::Del => ParseError::DelArity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::Set => "SET",
            CommandType::Get => "GET",
            CommandType::Del => "DEL",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new record
    Set { key: Key, value: Bytes },

    /// Fetch a record's value
    Get { key: Key },

    /// Remove a record
    Del { key: Key },
}

impl Command {
    /// Parse a request line (trailing newline already stripped)
    ///
    /// Checks run in wire order: length, token count, command name, arity,
    /// then key and value. Arity errors win over key errors.
    pub fn parse(line: &[u8], max_value_len: usize) -> std::result::Result<Self, ParseError> {
        if line.len() < MIN_REQUEST_LEN {
            return Err(ParseError::TooShort);
        }

        let tokens = match tokenize(line, MAX_TOKENS) {
            Ok(tokens) => tokens,
            Err(_) => {
                // Too many tokens: blame the arity when the command is known
                return Err(split_tokens(line)
                    .next()
                    .and_then(CommandType::from_token)
                    .map(CommandType::arity_error)
                    .unwrap_or(ParseError::UnknownCommand));
            }
        };

        if tokens.len() < 2 {
            return Err(ParseError::TooShort);
        }

        let command_type = CommandType::from_token(tokens[0]).ok_or(ParseError::UnknownCommand)?;
        if tokens.len() != command_type.arity() {
            return Err(command_type.arity_error());
        }

        let key = Key::parse(tokens[1]).map_err(|_| ParseError::InvalidKey)?;

        match command_type {
            CommandType::Set => {
                let value = tokens[2];
                if value.len() > max_value_len {
                    return Err(ParseError::ValueTooLarge {
                        len: value.len(),
                        max: max_value_len,
                    });
                }
                Ok(Command::Set {
                    key,
                    value: Bytes::copy_from_slice(value),
                })
            }
            CommandType::Get => Ok(Command::Get { key }),
            CommandType::Del => Ok(Command::Del { key }),
        }
    }

    /// Build a SET, validating the key
    pub fn set(key: &str, value: impl Into<Bytes>) -> Result<Self> {
        Ok(Command::Set {
            key: Key::parse(key.as_bytes())?,
            value: value.into(),
        })
    }

    /// Build a GET, validating the key
    pub fn get(key: &str) -> Result<Self> {
        Ok(Command::Get {
            key: Key::parse(key.as_bytes())?,
        })
    }

    /// Build a DEL, validating the key
    pub fn del(key: &str) -> Result<Self> {
        Ok(Command::Del {
            key: Key::parse(key.as_bytes())?,
        })
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Del { .. } => CommandType::Del,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            Command::Set { key, .. } | Command::Get { key } | Command::Del { key } => key,
        }
    }
}
