//! Command execution for one client connection.
//!
//! A `Connection` turns a command name plus call arguments into a reply and
//! hands it to the caller's error-first callback. Nothing here returns a
//! reply directly to the caller of a command function.

use std::sync::Arc;

use deferkv_callback::{Arg, CallError, Callback, ClientOptions, CommandError, Output, Value};

use crate::dataspace::Dataspace;
use crate::keyspace::arity_error;
use crate::session::Session;

/// Commands a memory client understands: (name, min args, max args).
pub(crate) const SUPPORTED: &[(&str, usize, Option<usize>)] = &[
    ("ping", 0, Some(1)),
    ("echo", 1, Some(1)),
    ("select", 1, Some(1)),
    ("quit", 0, Some(0)),
    ("publish", 2, Some(2)),
    ("subscribe", 1, None),
    ("unsubscribe", 0, None),
    ("get", 1, Some(1)),
    ("set", 2, None),
    ("del", 1, None),
    ("exists", 1, None),
    ("incr", 1, Some(1)),
    ("incrby", 2, Some(2)),
    ("decr", 1, Some(1)),
    ("append", 2, Some(2)),
    ("strlen", 1, Some(1)),
    ("mget", 1, None),
    ("mset", 2, None),
    ("keys", 1, Some(1)),
    ("dbsize", 0, Some(0)),
    ("flushdb", 0, Some(0)),
    ("hset", 3, None),
    ("hget", 2, Some(2)),
    ("hgetall", 1, Some(1)),
    ("hdel", 2, None),
    ("lpush", 2, None),
    ("rpush", 2, None),
    ("lrange", 3, Some(3)),
    ("llen", 1, Some(1)),
    ("lpop", 1, Some(1)),
    ("sadd", 2, None),
    ("smembers", 1, Some(1)),
    ("sismember", 2, Some(2)),
];

fn arity(command: &str) -> Option<(usize, Option<usize>)> {
    SUPPORTED
        .iter()
        .find(|(name, _, _)| *name == command)
        .map(|(_, min, max)| (*min, *max))
}

/// Which arguments of `command` are keys, and therefore get the prefix.
fn is_key_position(command: &str, index: usize) -> bool {
    match command {
        "ping" | "echo" | "select" | "quit" | "publish" | "subscribe" | "unsubscribe"
        | "dbsize" | "flushdb" => false,
        "del" | "exists" | "mget" | "keys" => true,
        "mset" => index % 2 == 0,
        _ => index == 0,
    }
}

fn to_text(function: &str, value: Value, out: &mut Vec<String>) -> Result<(), CallError> {
    match value {
        Value::String(s) | Value::Status(s) => out.push(s),
        Value::Integer(i) => out.push(i.to_string()),
        Value::Float(f) => out.push(f.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Bytes(b) => out.push(String::from_utf8_lossy(&b).into_owned()),
        Value::Array(items) => {
            for item in items {
                if matches!(item, Value::Array(_)) {
                    return Err(CallError::InvalidArgument {
                        function: function.to_string(),
                        message: "nested arrays are not accepted".to_string(),
                    });
                }
                to_text(function, item, out)?;
            }
        }
        other => {
            return Err(CallError::InvalidArgument {
                function: function.to_string(),
                message: format!("cannot send a {} as a command argument", other.type_name()),
            })
        }
    }
    Ok(())
}

/// Split call arguments into command text and an optional trailing callback.
pub(crate) fn split_call(
    function: &str,
    args: Vec<Arg>,
) -> Result<(Vec<String>, Option<Callback>), CallError> {
    let mut text = Vec::with_capacity(args.len());
    let mut callback = None;
    let last = args.len().saturating_sub(1);
    for (index, arg) in args.into_iter().enumerate() {
        match arg {
            Arg::Value(value) => to_text(function, value, &mut text)?,
            Arg::Callback(cb) if index == last => callback = Some(cb),
            other => {
                return Err(CallError::InvalidArgument {
                    function: function.to_string(),
                    message: format!("unexpected {} argument at position {}", other.type_name(), index),
                })
            }
        }
    }
    Ok((text, callback))
}

/// Hand a result to an error-first callback.
pub(crate) fn deliver(callback: Callback, result: Result<Value, CommandError>) {
    match result {
        Ok(reply) => callback(None, Some(reply)),
        Err(e) => callback(Some(e), None),
    }
}

pub(crate) struct Connection {
    dataspace: Arc<Dataspace>,
    options: Arc<ClientOptions>,
    session: Arc<Session>,
}

impl Connection {
    pub(crate) fn open(dataspace: Arc<Dataspace>, options: Arc<ClientOptions>) -> Self {
        let session = Arc::new(Session::new(options.db));
        dataspace.register(&session);
        Self {
            dataspace,
            options,
            session,
        }
    }

    pub(crate) fn dataspace(&self) -> &Arc<Dataspace> {
        &self.dataspace
    }

    pub(crate) fn options(&self) -> &Arc<ClientOptions> {
        &self.options
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Invoke `command` with call arguments, replying through the trailing
    /// callback if one was given.
    pub(crate) fn dispatch(&self, command: &str, args: Vec<Arg>) -> Result<Output, CallError> {
        let (args, callback) = split_call(command, args)?;
        let result = self.run(command, args);
        match callback {
            Some(callback) => deliver(callback, result),
            None => {
                if let Err(e) = result {
                    tracing::debug!(command, error = %e, "unhandled error reply");
                }
            }
        }
        Ok(Output::Unit)
    }

    fn prefixed(&self, command: &str, args: Vec<String>) -> Vec<String> {
        match &self.options.prefix {
            Some(prefix) => args
                .into_iter()
                .enumerate()
                .map(|(i, arg)| {
                    if is_key_position(command, i) {
                        format!("{}{}", prefix, arg)
                    } else {
                        arg
                    }
                })
                .collect(),
            None => args,
        }
    }

    /// Execute a command and produce its reply.
    pub(crate) fn run(&self, command: &str, args: Vec<String>) -> Result<Value, CommandError> {
        let command = command.to_ascii_lowercase();
        tracing::trace!(command = %command, db = self.session.db(), args = args.len(), "executing");

        if self.session.is_closed() {
            return Err(CommandError::new(&command, "ERR connection is closed"));
        }
        if self.dataspace.is_added_command(&command) {
            return Ok(Value::Array(args.into_iter().map(Value::from).collect()));
        }

        let (min, max) = arity(&command).ok_or_else(|| {
            CommandError::new(&command, format!("ERR unknown command '{}'", command))
        })?;
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(arity_error(&command));
        }

        match command.as_str() {
            "ping" => Ok(args
                .into_iter()
                .next()
                .map(Value::from)
                .unwrap_or_else(|| Value::status("PONG"))),
            "echo" => Ok(Value::from(args[0].as_str())),
            "select" => {
                let db = args[0]
                    .parse::<u32>()
                    .map_err(|_| CommandError::new(&command, "ERR DB index is out of range"))?;
                self.session.select(db);
                Ok(Value::ok())
            }
            "quit" => {
                self.session.close();
                Ok(Value::ok())
            }
            "publish" => Ok(Value::Integer(
                self.dataspace.publish(&args[0], &args[1]) as i64,
            )),
            "subscribe" | "unsubscribe" => {
                let channels = if args.is_empty() {
                    self.session.subscriptions()
                } else {
                    args
                };
                let mut last = Value::Null;
                for channel in channels {
                    let remaining = if command == "subscribe" {
                        self.session.subscribe(&channel)
                    } else {
                        self.session.unsubscribe(&channel)
                    };
                    self.session.emit(
                        &command,
                        &[Value::from(channel.as_str()), Value::Integer(remaining as i64)],
                    );
                    last = Value::from(channel);
                }
                Ok(last)
            }
            _ => {
                let args = self.prefixed(&command, args);
                self.dataspace
                    .with_db(self.session.db(), |keyspace| keyspace.execute(&command, &args))
            }
        }
    }
}
