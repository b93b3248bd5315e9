//! Callback-convention object model.
//!
//! This is the narrow waist of the deferkv stack. A key-value client library
//! is described here as a small graph of dynamic objects:
//! - `Object`: something you can read named properties from
//! - `Property`: either plain data (`Value`) or a callable (`Function`)
//! - `Arg` / `Output`: what goes into and comes out of a call
//! - `Callback`: the native error-first completion handler
//! - `Deferred`: the awaitable alternative to a callback
//!
//! Nothing at this level knows which property names are remote commands or
//! how a reply is produced. Client libraries implement `Object`; adapters read
//! through it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use deferkv_callback::{args, Function, Kind, Object, ObjectExt, Output, Property, Value};
//!
//! struct Counter {
//!     ping: Function,
//! }
//!
//! impl Object for Counter {
//!     fn kind(&self) -> Kind {
//!         Kind::Other
//!     }
//!
//!     fn type_name(&self) -> &str {
//!         "Counter"
//!     }
//!
//!     fn get(&self, name: &str) -> Option<Property> {
//!         (name == "ping").then(|| Property::Function(self.ping.clone()))
//!     }
//!
//!     fn keys(&self) -> Vec<String> {
//!         vec!["ping".to_string()]
//!     }
//! }
//!
//! let counter = Counter {
//!     ping: Function::new("ping", |_args| Ok(Output::Value(Value::status("PONG")))),
//! };
//! let reply = counter.call("ping", args![]).unwrap().into_value().unwrap();
//! assert_eq!(reply, Value::status("PONG"));
//! ```

mod deferred;
mod error;
mod object;
mod options;
mod value;

pub use deferred::{Deferred, Settle};
pub use error::{CallError, CommandError};
pub use object::{
    Arg, Callback, Function, Handle, Kind, Listener, Object, ObjectExt, Output, Property,
};
pub use options::ClientOptions;
pub use value::Value;

/// Build a `Vec<Arg>` from anything convertible into an `Arg`.
///
/// ```rust
/// use deferkv_callback::{args, Arg, Value};
///
/// let list = args!["hello", 42_i64];
/// assert!(matches!(&list[0], Arg::Value(Value::String(s)) if s == "hello"));
/// assert_eq!(list.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
