//! Protocol codec
//!
//! Reading and writing the line protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! SET <key> <value>\n  |  GET <key>\n  |  DEL <key>\n      (<= max_message_len bytes)
//! ```
//!
//! ### Response
//! One `write` per line; see [`Response::frames`]. The server closes the
//! connection after the last frame, so a client reads to EOF.

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DirKvError, Result};

use super::{Command, ParseError, Response};

// =============================================================================
// Server side
// =============================================================================

/// Read one request with a single blocking read of up to `max_len` bytes
///
/// Returns `None` when the peer closed without sending anything. One
/// trailing `\n` is stripped, then one trailing `\r`. A read that fills
/// the whole buffer without ending in `\n` was cut off and is rejected with
/// [`ParseError::TooLong`]; the partial line is never returned.
pub fn read_request<R: Read>(reader: &mut R, max_len: usize) -> Result<Option<Bytes>> {
    let mut buf = vec![0u8; max_len];

    let n = loop {
        match reader.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };

    if n == 0 {
        return Ok(None);
    }

    if n == max_len && buf[n - 1] != b'\n' {
        return Err(ParseError::TooLong { max: max_len }.into());
    }

    buf.truncate(n);
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(Some(Bytes::from(buf)))
}

/// Discard the rest of a request that did not fit the buffer
///
/// Reads until a `\n`, EOF or `limit` bytes. Returns the number of bytes
/// dropped; read errors (typically a timeout) end the drain early.
pub fn discard_line<R: Read>(reader: &mut R, limit: usize) -> usize {
    let mut scratch = [0u8; 256];
    let mut dropped = 0;

    while dropped < limit {
        match reader.read(&mut scratch) {
            Ok(0) => break,
            Ok(n) => {
                dropped += n;
                if scratch[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    dropped
}

/// Write a response, one `write_all` per frame
///
/// Every frame is size-checked before the first byte goes out, so an
/// oversized response never reaches the client half-written.
pub fn write_response<W: Write>(writer: &mut W, response: &Response, max_frame: usize) -> Result<usize> {
    let frames = response.frames();

    if let Some(frame) = frames.iter().find(|f| f.len() > max_frame) {
        return Err(DirKvError::ResponseTooLarge {
            len: frame.len(),
            max: max_frame,
        });
    }

    let mut written = 0;
    for frame in &frames {
        writer.write_all(frame)?;
        written += frame.len();
    }
    writer.flush()?;

    Ok(written)
}

// =============================================================================
// Client side
// =============================================================================

/// Encode a command as a request line
pub fn encode_request(command: &Command) -> Result<Bytes> {
    let name = command.command_type().as_str();
    let key = command.key().as_str();

    let mut line = BytesMut::with_capacity(name.len() + key.len() + 2);
    line.put_slice(name.as_bytes());
    line.put_u8(b' ');
    line.put_slice(key.as_bytes());

    if let Command::Set { value, .. } = command {
        if value.is_empty() || value.iter().any(u8::is_ascii_whitespace) {
            return Err(DirKvError::Protocol(
                "value must be non-empty and contain no whitespace".to_string(),
            ));
        }
        line.put_u8(b' ');
        line.put_slice(value);
    }

    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Write a command to a stream
pub fn write_request<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_request(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Decode a complete response (everything the server sent before closing)
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    if let Some(rest) = bytes.strip_prefix(b"OK\n") {
        if rest.is_empty() {
            return Ok(Response::ok(None));
        }
        let value = rest.strip_suffix(b"\n").ok_or_else(|| {
            DirKvError::Protocol("value line is not newline-terminated".to_string())
        })?;
        return Ok(Response::ok(Some(Bytes::copy_from_slice(value))));
    }

    match bytes {
        b"NOTFOUND\n" => return Ok(Response::not_found()),
        b"ALREADYSET\n" => return Ok(Response::already_set()),
        _ => {}
    }

    if let Some(rest) = bytes.strip_prefix(b"ERROR: ") {
        let end = rest.iter().position(|&b| b == b'\n').ok_or_else(|| {
            DirKvError::Protocol("error line is not newline-terminated".to_string())
        })?;
        let message = String::from_utf8_lossy(&rest[..end]);
        return Ok(if rest.len() > end + 1 {
            Response::error_with_usage(&message)
        } else {
            Response::error(&message)
        });
    }

    Err(DirKvError::Protocol(format!(
        "unrecognized response: {:?}",
        String::from_utf8_lossy(bytes)
    )))
}

/// Read a complete response from a stream (until EOF)
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_response(&bytes)
}
