//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - Serial mode: each connection served inline before the next accept
//! - Pool mode: accepted streams handed to worker threads over a channel
//! - Exactly one request/response per connection

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::{Connection, State};
pub use client::Client;
