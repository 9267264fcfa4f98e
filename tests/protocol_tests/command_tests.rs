//! Command Parsing Tests
//!
//! Tests for request line validation and dispatch order.

use dirkv::protocol::{Command, CommandType, ParseError};
use dirkv::storage::Key;

const CAP: usize = 100;

fn key(s: &str) -> Key {
    Key::parse(s.as_bytes()).unwrap()
}

// =============================================================================
// Valid Commands
// =============================================================================

#[test]
fn test_parse_set() {
    let cmd = Command::parse(b"SET manzana apple", CAP).unwrap();
    assert_eq!(
        cmd,
        Command::Set {
            key: key("manzana"),
            value: "apple".into(),
        }
    );
    assert_eq!(cmd.command_type(), CommandType::Set);
}

#[test]
fn test_parse_get() {
    let cmd = Command::parse(b"GET perro", CAP).unwrap();
    assert_eq!(cmd, Command::Get { key: key("perro") });
}

#[test]
fn test_parse_del() {
    let cmd = Command::parse(b"DEL perro", CAP).unwrap();
    assert_eq!(cmd, Command::Del { key: key("perro") });
    assert_eq!(cmd.key().as_str(), "perro");
}

#[test]
fn test_parse_minimal_request() {
    // 3-letter command + space + 1-char key
    assert_eq!(
        Command::parse(b"GET k", CAP).unwrap(),
        Command::Get { key: key("k") }
    );
}

// =============================================================================
// Too Short / Unknown
// =============================================================================

#[test]
fn test_short_line() {
    assert_eq!(Command::parse(b"", CAP), Err(ParseError::TooShort));
    assert_eq!(Command::parse(b"GET", CAP), Err(ParseError::TooShort));
    assert_eq!(Command::parse(b"GET ", CAP), Err(ParseError::TooShort));
}

#[test]
fn test_single_token_is_too_short() {
    assert_eq!(Command::parse(b"GETPERRO", CAP), Err(ParseError::TooShort));
    assert_eq!(Command::parse(b"   SET   ", CAP), Err(ParseError::TooShort));
}

#[test]
fn test_unknown_command() {
    assert_eq!(Command::parse(b"FOO x", CAP), Err(ParseError::UnknownCommand));
    assert_eq!(Command::parse(b"PUT a b", CAP), Err(ParseError::UnknownCommand));
}

#[test]
fn test_command_is_case_sensitive() {
    assert_eq!(Command::parse(b"get perro", CAP), Err(ParseError::UnknownCommand));
    assert_eq!(Command::parse(b"Set a b", CAP), Err(ParseError::UnknownCommand));
}

#[test]
fn test_unknown_command_with_too_many_tokens() {
    assert_eq!(Command::parse(b"FOO a b c", CAP), Err(ParseError::UnknownCommand));
}

#[test]
fn test_usage_only_for_short_and_unknown() {
    assert!(ParseError::TooShort.wants_usage());
    assert!(ParseError::UnknownCommand.wants_usage());
    assert!(!ParseError::SetArity.wants_usage());
    assert!(!ParseError::GetArity.wants_usage());
    assert!(!ParseError::DelArity.wants_usage());
    assert!(!ParseError::InvalidKey.wants_usage());
    assert!(!ParseError::TooLong { max: 128 }.wants_usage());
}

// =============================================================================
// Arity
// =============================================================================

#[test]
fn test_set_missing_value() {
    assert_eq!(Command::parse(b"SET onlykey", CAP), Err(ParseError::SetArity));
}

#[test]
fn test_set_too_many_tokens() {
    assert_eq!(Command::parse(b"SET a b c", CAP), Err(ParseError::SetArity));
}

#[test]
fn test_get_extra_token() {
    assert_eq!(Command::parse(b"GET a b", CAP), Err(ParseError::GetArity));
    assert_eq!(Command::parse(b"GET a b c d", CAP), Err(ParseError::GetArity));
}

#[test]
fn test_del_extra_token() {
    assert_eq!(Command::parse(b"DEL a b", CAP), Err(ParseError::DelArity));
}

#[test]
fn test_arity_checked_before_key() {
    // "../x" is an invalid key, but the arity error is reported first
    assert_eq!(Command::parse(b"GET ../x extra", CAP), Err(ParseError::GetArity));
    assert_eq!(Command::parse(b"SET ../x", CAP), Err(ParseError::SetArity));
}

// =============================================================================
// Key / Value Validation
// =============================================================================

#[test]
fn test_invalid_key() {
    assert_eq!(Command::parse(b"GET ../etc", CAP), Err(ParseError::InvalidKey));
    assert_eq!(Command::parse(b"SET a/b v", CAP), Err(ParseError::InvalidKey));
    assert_eq!(Command::parse(b"DEL ..", CAP), Err(ParseError::InvalidKey));
}

#[test]
fn test_value_over_cap() {
    let line = format!("SET big {}", "x".repeat(11));
    assert_eq!(
        Command::parse(line.as_bytes(), 10),
        Err(ParseError::ValueTooLarge { len: 11, max: 10 })
    );
}

#[test]
fn test_value_at_cap() {
    let line = format!("SET big {}", "x".repeat(10));
    assert!(Command::parse(line.as_bytes(), 10).is_ok());
}

// =============================================================================
// Error Text
// =============================================================================

#[test]
fn test_error_messages() {
    assert_eq!(ParseError::TooShort.to_string(), "command too short.");
    assert_eq!(ParseError::UnknownCommand.to_string(), "no valid command detected.");
    assert_eq!(ParseError::SetArity.to_string(), "SET requires key and value.");
    assert_eq!(ParseError::GetArity.to_string(), "GET takes only a key.");
    assert_eq!(ParseError::DelArity.to_string(), "DEL takes only a key.");
    assert_eq!(ParseError::TooLong { max: 128 }.to_string(), "command too long.");
    assert_eq!(
        ParseError::ValueTooLarge { len: 101, max: 100 }.to_string(),
        "value too large."
    );
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn test_constructors_validate_key() {
    assert!(Command::set("perro", "dog").is_ok());
    assert!(Command::get("../x").is_err());
    assert!(Command::del("").is_err());
}
