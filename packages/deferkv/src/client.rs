//! Client view.
//!
//! Reads are routed in this order:
//! 1. `duplicate`: the clone comes back client-wrapped
//! 2. `multi` / `batch`: the builder comes back transaction-wrapped
//! 3. catalog commands: converted to return a deferred result
//! 4. everything else: the original property, untouched
//!
//! Event registration (`on` and friends) is not a catalog command, so pushed
//! messages keep arriving through listeners.

use std::sync::Arc;

use deferkv_callback::{
    Arg, CallError, Deferred, Function, Handle, Kind, Object, ObjectExt, Property,
};
use deferkv_commands::is_command;

use crate::combinator::{builder_result, factory_result, Conversions};
use crate::command::promisify;
use crate::names::{DUPLICATE, TRANSACTION_ACCESSORS};

/// A client whose catalog commands return deferred results.
pub struct PromiseClient {
    inner: Handle,
    conversions: Conversions,
}

impl PromiseClient {
    pub fn new(inner: Handle) -> Self {
        let client = Self {
            inner,
            conversions: Conversions::default(),
        };

        // Build the table once up front; later reads only check it is current.
        for name in [DUPLICATE]
            .into_iter()
            .chain(TRANSACTION_ACCESSORS)
            .chain(deferkv_commands::commands())
        {
            if let Some(original) = client.inner.function(name) {
                client.convert(name, original);
            }
        }

        tracing::debug!(
            type_name = client.inner.type_name(),
            commands = client.conversions.len(),
            "wrapped client"
        );
        client
    }

    /// The client being wrapped.
    pub fn inner(&self) -> &Handle {
        &self.inner
    }

    /// Call a catalog command and return its deferred result.
    pub fn command(&self, name: &str, args: Vec<Arg>) -> Result<Deferred, CallError> {
        self.call(name, args)?.into_deferred()
    }

    /// The converted form of `original`, or `None` if `name` passes through.
    fn convert(&self, name: &str, original: Function) -> Option<Function> {
        if name == DUPLICATE {
            Some(self.conversions.resolve(name, original, |f| factory_result(f.clone())))
        } else if TRANSACTION_ACCESSORS.contains(&name) {
            Some(self.conversions.resolve(name, original, |f| builder_result(f.clone())))
        } else if is_command(name) {
            Some(self.conversions.resolve(name, original, promisify))
        } else {
            None
        }
    }
}

impl Object for PromiseClient {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn get(&self, name: &str) -> Option<Property> {
        match self.inner.get(name)? {
            Property::Function(original) => Some(Property::Function(
                self.convert(name, original.clone()).unwrap_or(original),
            )),
            value => Some(value),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn is_wrapped(&self) -> bool {
        true
    }
}

/// Client-wrap `client`, unless it is already wrapped.
pub fn wrap_client(client: Handle) -> Handle {
    if client.is_wrapped() {
        return client;
    }
    Arc::new(PromiseClient::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deferkv_callback::{args, CommandError, Listener, Output, Value};
    use std::sync::Mutex;

    /// Client double that replies to `get` with the key and keeps a mutable
    /// `on` registry.
    struct Stub {
        get: Function,
        on: Function,
        multi: Function,
        swap: Mutex<Option<Function>>,
    }

    fn replying(name: &'static str, reply: Value) -> Function {
        Function::new(name, move |mut args| {
            if let Some(Arg::Callback(cb)) = args.pop() {
                cb(None, Some(reply.clone()));
            }
            Ok(Output::Unit)
        })
    }

    impl Stub {
        fn new() -> Arc<Self> {
            Arc::new(Stub {
                get: Function::new("get", |mut args| {
                    let callback = match args.pop() {
                        Some(Arg::Callback(cb)) => cb,
                        _ => return Ok(Output::Unit),
                    };
                    match args.pop() {
                        Some(Arg::Value(key)) => callback(None, Some(key)),
                        _ => callback(
                            Some(CommandError::new(
                                "get",
                                "ERR wrong number of arguments for 'get' command",
                            )),
                            None,
                        ),
                    }
                    Ok(Output::Unit)
                }),
                on: Function::new("on", |_| Ok(Output::Unit)),
                multi: Function::new("multi", |_| {
                    Ok(Output::Value(Value::from("not a builder")))
                }),
                swap: Mutex::new(None),
            })
        }
    }

    impl Object for Stub {
        fn kind(&self) -> Kind {
            Kind::Client
        }

        fn type_name(&self) -> &str {
            "Stub"
        }

        fn get(&self, name: &str) -> Option<Property> {
            match name {
                "get" => Some(Property::Function(self.get.clone())),
                "on" => Some(Property::Function(self.on.clone())),
                "multi" => Some(Property::Function(self.multi.clone())),
                "set" => self.swap.lock().unwrap().clone().map(Property::Function),
                "connected" => Some(Property::Value(Value::Bool(true))),
                "ttl" => Some(Property::Value(Value::Integer(-1))),
                _ => None,
            }
        }

        fn keys(&self) -> Vec<String> {
            ["connected", "get", "multi", "on", "set", "ttl"]
                .iter()
                .map(|k| k.to_string())
                .collect()
        }
    }

    #[tokio::test]
    async fn commands_return_deferred() {
        let client = PromiseClient::new(Stub::new());
        let reply = client.command("get", args!["hello"]).unwrap().await;
        assert_eq!(reply.unwrap(), Value::from("hello"));

        let err = client.command("get", args![]).unwrap().await.unwrap_err();
        assert_eq!(err.message, "ERR wrong number of arguments for 'get' command");
    }

    #[test]
    fn converted_commands_are_stable() {
        let stub = Stub::new();
        let client = PromiseClient::new(stub.clone());
        let first = client.function("get").unwrap();
        let second = client.function("get").unwrap();
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&stub.get));
        assert_eq!(first.name(), "get");
    }

    #[tokio::test]
    async fn late_commands_are_converted_on_read() {
        let stub = Stub::new();
        let client = PromiseClient::new(stub.clone());
        assert!(client.get("set").is_none());

        *stub.swap.lock().unwrap() = Some(replying("set", Value::ok()));
        let reply = client.command("set", args!["k", "v"]).unwrap().await;
        assert_eq!(reply.unwrap(), Value::ok());

        *stub.swap.lock().unwrap() = Some(replying("set", Value::status("QUEUED")));
        let reply = client.command("set", args!["k", "v"]).unwrap().await;
        assert_eq!(reply.unwrap(), Value::status("QUEUED"));
    }

    #[test]
    fn non_commands_pass_through() {
        let stub = Stub::new();
        let client = PromiseClient::new(stub.clone());
        assert!(client.function("on").unwrap().ptr_eq(&stub.on));
        assert_eq!(client.value("connected"), Some(Value::Bool(true)));
        assert!(client
            .call("on", args!["message", Listener::new(|_| {})])
            .is_ok());
    }

    #[test]
    fn accessors_follow_the_client() {
        let stub = Stub::new();
        let client = PromiseClient::new(stub.clone());
        let first = client.function("multi").unwrap();
        assert!(first.ptr_eq(&client.function("multi").unwrap()));
        assert!(!first.ptr_eq(&stub.multi));
        assert!(client.function("duplicate").is_none());
    }

    #[test]
    fn catalog_values_pass_through() {
        let client = PromiseClient::new(Stub::new());
        assert_eq!(client.value("ttl"), Some(Value::Integer(-1)));
    }

    #[test]
    fn accessor_results_that_are_not_objects_pass_through() {
        let client = PromiseClient::new(Stub::new());
        let output = client.call("multi", args![]).unwrap();
        assert_eq!(output.into_value().unwrap(), Value::from("not a builder"));
    }

    #[test]
    fn reports_inner_identity() {
        let stub = Stub::new();
        let client = PromiseClient::new(stub.clone());
        assert_eq!(client.kind(), Kind::Client);
        assert_eq!(client.type_name(), "Stub");
        assert_eq!(client.keys(), stub.keys());
        assert!(client.is_wrapped());
        assert!(!stub.is_wrapped());
    }

    #[test]
    fn wrapping_twice_is_identity() {
        let wrapped = wrap_client(Stub::new());
        assert!(Arc::ptr_eq(&wrapped, &wrap_client(wrapped.clone())));
    }
}
