//! Awaitable key-value clients.
//!
//! Client libraries built on `deferkv_callback` reply through a trailing
//! error-first `Callback`. This crate puts a read-only view in front of such
//! a library, one of its clients, or one of their transaction builders, so
//! the same calls return a `Deferred` instead:
//!
//! - library: `create_client` returns a wrapped client
//! - client: catalog commands return a `Deferred`, `duplicate` returns a
//!   wrapped client, `multi` / `batch` return a wrapped builder
//! - transaction builder: `exec` returns a `Deferred`
//!
//! Everything else reads straight through to the original object, which is
//! never modified. Wrapping is idempotent: wrapping a view returns it as-is.
//!
//! # Example
//!
//! ```rust
//! use deferkv::{wrap, PromiseExt};
//! use deferkv_callback::{args, Handle, ObjectExt, Value};
//! use deferkv_memory::MemoryLibrary;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let library: Handle = MemoryLibrary::new();
//! let library = wrap(library).unwrap();
//!
//! let client = library.call("create_client", args![]).unwrap().into_object().unwrap();
//! client.command("set", args!["hello", "world"]).unwrap().await.unwrap();
//!
//! let reply = client.command("get", args!["hello"]).unwrap().await.unwrap();
//! assert_eq!(reply, Value::from("world"));
//! # }
//! ```

mod client;
mod combinator;
mod command;
mod error;
mod library;
mod names;
mod transaction;

use deferkv_callback::{Arg, CallError, Deferred, Handle, Kind, Object, ObjectExt, Value};

pub use client::{wrap_client, PromiseClient};
pub use command::promisify;
pub use error::Error;
pub use library::{wrap_library, PromiseLibrary};
pub use transaction::{wrap_transaction, PromiseTransaction};

/// Anything `wrap` may be handed.
#[derive(Clone, Default)]
pub enum Target {
    /// No value at all.
    #[default]
    Undefined,
    /// Plain data.
    Value(Value),
    Object(Handle),
}

impl From<Handle> for Target {
    fn from(handle: Handle) -> Self {
        Target::Object(handle)
    }
}

impl From<&Handle> for Target {
    fn from(handle: &Handle) -> Self {
        Target::Object(handle.clone())
    }
}

impl From<Option<Handle>> for Target {
    fn from(handle: Option<Handle>) -> Self {
        handle.map_or(Target::Undefined, Target::Object)
    }
}

impl From<Value> for Target {
    fn from(value: Value) -> Self {
        Target::Value(value)
    }
}

/// Wrap a client library, a client, or a transaction builder.
///
/// An object that is already wrapped comes back unchanged. Anything else,
/// including `Undefined` and plain values, fails with `Error::ArgumentType`.
pub fn wrap(target: impl Into<Target>) -> Result<Handle, Error> {
    let handle = match target.into() {
        Target::Undefined => return Err(Error::invalid_target("undefined")),
        Target::Value(value) => return Err(Error::invalid_target(value.type_name())),
        Target::Object(handle) => handle,
    };

    if handle.is_wrapped() {
        tracing::debug!(type_name = handle.type_name(), "already wrapped");
        return Ok(handle);
    }

    match handle.kind() {
        Kind::Library => {
            tracing::debug!(type_name = handle.type_name(), "wrapping library");
            Ok(wrap_library(handle))
        }
        Kind::Client => {
            tracing::debug!(type_name = handle.type_name(), "wrapping client");
            Ok(wrap_client(handle))
        }
        Kind::Transaction => {
            tracing::debug!(type_name = handle.type_name(), "wrapping transaction");
            Ok(wrap_transaction(handle))
        }
        Kind::Other => Err(Error::invalid_target(handle.type_name())),
    }
}

/// Call helpers for wrapped objects.
pub trait PromiseExt {
    /// Call a function property that returns a deferred result.
    fn command(&self, name: &str, args: Vec<Arg>) -> Result<Deferred, CallError>;
}

impl<T: Object + ?Sized> PromiseExt for T {
    fn command(&self, name: &str, args: Vec<Arg>) -> Result<Deferred, CallError> {
        self.call(name, args)?.into_deferred()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deferkv_callback::Property;
    use std::sync::Arc;

    struct Shaped(Kind);

    impl Object for Shaped {
        fn kind(&self) -> Kind {
            self.0
        }

        fn type_name(&self) -> &str {
            "Shaped"
        }

        fn get(&self, _name: &str) -> Option<Property> {
            None
        }

        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn shaped(kind: Kind) -> Handle {
        Arc::new(Shaped(kind))
    }

    #[test]
    fn dispatches_on_kind() {
        for kind in [Kind::Library, Kind::Client, Kind::Transaction] {
            let wrapped = wrap(shaped(kind)).unwrap();
            assert!(wrapped.is_wrapped());
            assert_eq!(wrapped.kind(), kind);
            assert_eq!(wrapped.type_name(), "Shaped");
        }
    }

    #[test]
    fn wrapped_objects_come_back_unchanged() {
        let wrapped = wrap(shaped(Kind::Client)).unwrap();
        assert!(Arc::ptr_eq(&wrapped, &wrap(&wrapped).unwrap()));
    }

    #[test]
    fn rejects_everything_else() {
        let cases: Vec<(Target, &str)> = vec![
            (Target::Undefined, "undefined"),
            (None::<Handle>.into(), "undefined"),
            (Value::Null.into(), "null"),
            (Value::from(42_i64).into(), "number"),
            (Value::from("redis").into(), "string"),
            (shaped(Kind::Other).into(), "Shaped"),
        ];
        for (target, actual) in cases {
            let err = wrap(target).err().unwrap();
            assert_eq!(err, Error::invalid_target(actual));
        }
    }

    #[test]
    fn error_message_names_the_argument() {
        let err = wrap(Value::Bool(true)).err().unwrap();
        assert!(err.to_string().starts_with("invalid argument \"target\""));
        assert!(err.to_string().ends_with("got boolean"));
    }
}
