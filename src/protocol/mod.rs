//! Protocol Module
//!
//! Defines the line protocol for client-server communication.
//!
//! ## Protocol Format (plain text, one request per connection)
//!
//! ### Requests
//! ```text
//! SET <key> <value>\n
//! GET <key>\n
//! DEL <key>\n
//! ```
//! Tokens are split on whitespace runs; at most 3 tokens, so a value
//! cannot contain whitespace.
//!
//! ### Responses
//! - `OK\n`                  SET created / DEL removed
//! - `OK\n<value>\n`         GET hit
//! - `NOTFOUND\n`            GET/DEL miss
//! - `ALREADYSET\n`          SET on an existing key
//! - `ERROR: <msg>\n`        rejected request (plus usage block for
//!                           too-short and unknown commands)

mod command;
mod response;
mod codec;
mod tokenizer;

pub use command::{Command, CommandType, ParseError, MIN_REQUEST_LEN};
pub use response::{Response, Status, INTERNAL_ERROR, USAGE_FRAMES};
pub use codec::{
    decode_response, discard_line, encode_request, read_request, read_response, write_request,
    write_response,
};
pub use tokenizer::{split_tokens, tokenize, MAX_TOKENS};
