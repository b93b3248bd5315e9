//! Transaction builders.
//!
//! Every command function on a builder queues the command and returns the
//! builder itself, so calls chain. `exec` runs the queue in order and replies
//! with one entry per queued command; failures are embedded as
//! `Value::Error` rather than failing the whole batch.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use deferkv_callback::{
    Arg, CallError, Callback, CommandError, Function, Kind, Object, Output, Property, Value,
};

use crate::connection::{deliver, split_call, Connection, SUPPORTED};
use crate::dataspace::lock;

/// Which client accessor produced a builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionMode {
    Multi,
    Batch,
}

impl TransactionMode {
    /// Name of the client property that creates this kind of builder.
    pub fn accessor(self) -> &'static str {
        match self {
            TransactionMode::Multi => "multi",
            TransactionMode::Batch => "batch",
        }
    }
}

struct Queued {
    command: String,
    args: Vec<String>,
    callback: Option<Callback>,
}

fn dropped() -> CallError {
    CallError::Other {
        message: "transaction builder was dropped".to_string(),
    }
}

/// A command queue bound to a client connection.
pub struct MemoryTransaction {
    connection: Arc<Connection>,
    mode: TransactionMode,
    queue: Mutex<Vec<Queued>>,
    executed: AtomicBool,
    this: Weak<Self>,
    methods: RwLock<BTreeMap<String, Function>>,
}

fn queue_function(this: &Weak<MemoryTransaction>, name: &str) -> Function {
    let this = this.clone();
    let command = name.to_string();
    Function::new(name, move |args| {
        let builder = this.upgrade().ok_or_else(dropped)?;
        builder.enqueue(&command, args)?;
        Ok(Output::Object(builder))
    })
}

impl MemoryTransaction {
    pub(crate) fn open(connection: Arc<Connection>, mode: TransactionMode) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let mut methods: BTreeMap<String, Function> = SUPPORTED
                .iter()
                .map(|(name, _, _)| (name.to_string(), queue_function(this, name)))
                .collect();

            let weak = this.clone();
            methods.insert(
                "exec".to_string(),
                Function::new("exec", move |args| {
                    weak.upgrade().ok_or_else(dropped)?.exec(args)
                }),
            );

            Self {
                connection,
                mode,
                queue: Mutex::new(Vec::new()),
                executed: AtomicBool::new(false),
                this: this.clone(),
                methods: RwLock::new(methods),
            }
        })
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Number of commands waiting for `exec`.
    pub fn queued(&self) -> usize {
        lock(&self.queue).len()
    }

    fn enqueue(&self, command: &str, args: Vec<Arg>) -> Result<(), CallError> {
        let (args, callback) = split_call(command, args)?;
        lock(&self.queue).push(Queued {
            command: command.to_string(),
            args,
            callback,
        });
        Ok(())
    }

    fn exec(&self, args: Vec<Arg>) -> Result<Output, CallError> {
        let (extra, callback) = split_call("exec", args)?;
        if !extra.is_empty() {
            return Err(CallError::InvalidArgument {
                function: "exec".to_string(),
                message: "expected only a callback".to_string(),
            });
        }

        let result = if self.executed.swap(true, Ordering::SeqCst) {
            Err(CommandError::new("exec", "ERR EXEC without MULTI"))
        } else {
            let queue = std::mem::take(&mut *lock(&self.queue));
            let replies = queue
                .into_iter()
                .map(|queued| {
                    let reply = self.connection.run(&queued.command, queued.args);
                    if let Some(callback) = queued.callback {
                        deliver(callback, reply.clone());
                    }
                    reply.unwrap_or_else(|e| Value::Error(e.message))
                })
                .collect();
            Ok(Value::Array(replies))
        };

        if let Some(callback) = callback {
            deliver(callback, result);
        }
        Ok(Output::Unit)
    }
}

impl Object for MemoryTransaction {
    fn kind(&self) -> Kind {
        Kind::Transaction
    }

    fn type_name(&self) -> &str {
        match self.mode {
            TransactionMode::Multi => "MemoryMulti",
            TransactionMode::Batch => "MemoryBatch",
        }
    }

    fn get(&self, name: &str) -> Option<Property> {
        if let Some(function) = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Property::Function(function.clone()));
        }

        match name {
            "queued" => Some(Property::Value(Value::Integer(self.queued() as i64))),
            _ if self.connection.dataspace().is_added_command(name) => {
                let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
                let function = methods
                    .entry(name.to_string())
                    .or_insert_with(|| queue_function(&self.this, name));
                Some(Property::Function(function.clone()))
            }
            _ => None,
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.extend(self.connection.dataspace().added_commands());
        keys.push("queued".to_string());
        keys.sort();
        keys.dedup();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataspace::Dataspace;
    use deferkv_callback::{args, ClientOptions, Handle, ObjectExt};

    type Reply = Arc<Mutex<Option<(Option<CommandError>, Option<Value>)>>>;

    fn capture() -> (Reply, Callback) {
        let reply: Reply = Arc::new(Mutex::new(None));
        let sink = reply.clone();
        (reply, Box::new(move |err, value| *sink.lock().unwrap() = Some((err, value))))
    }

    fn builder() -> Arc<MemoryTransaction> {
        let connection = Arc::new(Connection::open(
            Arc::new(Dataspace::new()),
            Arc::new(ClientOptions::default()),
        ));
        MemoryTransaction::open(connection, TransactionMode::Multi)
    }

    #[test]
    fn queuing_returns_same_builder() {
        let builder = builder();
        let handle: Handle = builder.clone();
        let returned = builder
            .call("set", args!["hello", "world"])
            .unwrap()
            .into_object()
            .unwrap();
        assert!(Arc::ptr_eq(&handle, &returned));
        assert_eq!(builder.queued(), 1);
    }

    #[test]
    fn exec_replies_in_order() {
        let builder = builder();
        builder.call("set", args!["hello", "world"]).unwrap();
        builder.call("get", args!["hello"]).unwrap();

        let (reply, callback) = capture();
        builder.call("exec", args![callback]).unwrap();
        assert_eq!(
            reply.lock().unwrap().take(),
            Some((
                None,
                Some(Value::Array(vec![Value::ok(), Value::from("world")]))
            ))
        );
        assert_eq!(builder.queued(), 0);
    }

    #[test]
    fn failures_are_embedded() {
        let builder = builder();
        builder.call("set", args!["only-key"]).unwrap();
        builder.call("ping", args![]).unwrap();

        let (reply, callback) = capture();
        builder.call("exec", args![callback]).unwrap();
        let (err, value) = reply.lock().unwrap().take().unwrap();
        assert!(err.is_none());
        let items = value.unwrap();
        let items = items.as_array().unwrap();
        assert!(items[0].is_error());
        assert_eq!(items[1], Value::status("PONG"));
    }

    #[test]
    fn queued_callbacks_fire_on_exec() {
        let builder = builder();
        let (reply, callback) = capture();
        builder.call("incr", args!["n", callback]).unwrap();
        assert!(reply.lock().unwrap().is_none());

        builder.call("exec", args![]).unwrap();
        assert_eq!(
            reply.lock().unwrap().take(),
            Some((None, Some(Value::Integer(1))))
        );
    }

    #[test]
    fn added_commands_can_be_queued() {
        let builder = builder();
        builder.connection.dataspace().add_command("hello_world");
        assert!(builder.keys().contains(&"hello_world".to_string()));

        let handle: Handle = builder.clone();
        let returned = builder
            .call("hello_world", args!["a"])
            .unwrap()
            .into_object()
            .unwrap();
        assert!(Arc::ptr_eq(&handle, &returned));
        assert!(builder
            .function("hello_world")
            .unwrap()
            .ptr_eq(&builder.function("hello_world").unwrap()));

        let (reply, callback) = capture();
        builder.call("exec", args![callback]).unwrap();
        assert_eq!(
            reply.lock().unwrap().take(),
            Some((
                None,
                Some(Value::Array(vec![Value::Array(vec![Value::from("a")])]))
            ))
        );
    }

    #[test]
    fn second_exec_fails() {
        let builder = builder();
        builder.call("exec", args![]).unwrap();

        let (reply, callback) = capture();
        builder.call("exec", args![callback]).unwrap();
        let (err, _) = reply.lock().unwrap().take().unwrap();
        assert_eq!(err.unwrap().message, "ERR EXEC without MULTI");
    }
}
