//! In-memory key-value client library.
//!
//! A complete client library that uses the native callback convention:
//! every command function takes its arguments followed by an error-first
//! `Callback`, and replies through it. The shapes mirror a networked client:
//!
//! - `MemoryLibrary`: the factory (`create_client`, `add_command`, `version`)
//! - `MemoryClient`: a connection (commands, `duplicate`, `multi`, `batch`, `on`)
//! - `MemoryTransaction`: a queue of commands run together by `exec`
//!
//! Data lives in a `Dataspace` shared by every client of one library.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use deferkv_callback::{args, Callback, ObjectExt, Value};
//! use deferkv_memory::MemoryLibrary;
//!
//! let library = MemoryLibrary::new();
//! let client = library.call("create_client", args![]).unwrap().into_object().unwrap();
//!
//! let reply = Arc::new(Mutex::new(None));
//! let sink = reply.clone();
//! let callback: Callback = Box::new(move |err, value| {
//!     assert!(err.is_none());
//!     *sink.lock().unwrap() = value;
//! });
//! client.call("ping", args![callback]).unwrap();
//! assert_eq!(*reply.lock().unwrap(), Some(Value::status("PONG")));
//! ```

mod client;
mod connection;
mod dataspace;
mod keyspace;
mod library;
mod session;
mod transaction;

pub use client::MemoryClient;
pub use dataspace::Dataspace;
pub use library::MemoryLibrary;
pub use transaction::{MemoryTransaction, TransactionMode};

/// Names of the commands memory clients understand.
pub fn supported_commands() -> impl Iterator<Item = &'static str> {
    connection::SUPPORTED.iter().map(|(name, _, _)| *name)
}
