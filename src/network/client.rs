//! TCP Client
//!
//! One connection per request, mirroring the server.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{DirKvError, Result};
use crate::protocol::{decode_response, encode_request, Command, Response, Status};

/// Client for a dirkv server
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    timeout: Option<Duration>,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Read/write timeout per request (`None` blocks forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send raw request bytes and return everything the server answered
    ///
    /// Nothing is appended to `request`; an empty slice sends nothing and
    /// just closes the write side.
    pub fn send_raw(&self, request: &[u8]) -> Result<Vec<u8>> {
        let mut stream = TcpStream::connect(&self.addr)
            .map_err(|e| DirKvError::Network(format!("failed to connect to {}: {}", self.addr, e)))?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        if request.is_empty() {
            stream.shutdown(std::net::Shutdown::Write)?;
        } else {
            stream.write_all(request)?;
            stream.flush()?;
        }

        let mut response = Vec::new();
        stream.read_to_end(&mut response)?;
        Ok(response)
    }

    /// Send one request line (newline added when missing)
    pub fn send_line(&self, line: &str) -> Result<Vec<u8>> {
        let mut request = line.as_bytes().to_vec();
        if !request.ends_with(b"\n") {
            request.push(b'\n');
        }
        self.send_raw(&request)
    }

    /// Execute a command and decode the response
    pub fn request(&self, command: &Command) -> Result<Response> {
        let bytes = self.send_raw(&encode_request(command)?)?;
        decode_response(&bytes)
    }

    /// SET: `Ok(true)` if created, `Ok(false)` if the key was already set
    pub fn set(&self, key: &str, value: impl Into<Bytes>) -> Result<bool> {
        let response = self.request(&Command::set(key, value)?)?;
        match response.status {
            Status::Ok => Ok(true),
            Status::AlreadySet => Ok(false),
            _ => Err(unexpected(response)),
        }
    }

    /// GET: `Ok(None)` if the key is not set
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let response = self.request(&Command::get(key)?)?;
        match response.status {
            Status::Ok => Ok(Some(response.payload.unwrap_or_default())),
            Status::NotFound => Ok(None),
            _ => Err(unexpected(response)),
        }
    }

    /// DEL: `Ok(true)` if removed, `Ok(false)` if the key was not set
    pub fn del(&self, key: &str) -> Result<bool> {
        let response = self.request(&Command::del(key)?)?;
        match response.status {
            Status::Ok => Ok(true),
            Status::NotFound => Ok(false),
            _ => Err(unexpected(response)),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

fn unexpected(response: Response) -> DirKvError {
    let message = response
        .payload
        .map(|p| String::from_utf8_lossy(&p).into_owned())
        .unwrap_or_default();
    DirKvError::Protocol(format!(
        "unexpected {} response: {}",
        response.status.as_str(),
        message
    ))
}
