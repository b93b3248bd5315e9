//! The client object: one function property per command, plus duplicate,
//! transaction accessors, and event registration.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use deferkv_callback::{
    Arg, CallError, ClientOptions, Function, Handle, Kind, Object, Output, Property, Value,
};

use crate::connection::{Connection, SUPPORTED};
use crate::dataspace::Dataspace;
use crate::transaction::{MemoryTransaction, TransactionMode};

fn invalid(function: &str, message: String) -> CallError {
    CallError::InvalidArgument {
        function: function.to_string(),
        message,
    }
}

fn command_function(connection: &Arc<Connection>, name: &str) -> Function {
    let connection = connection.clone();
    let command = name.to_string();
    Function::new(name, move |args| connection.dispatch(&command, args))
}

/// Pick the options for a new connection from `[]` or `[options]`.
pub(crate) fn options_arg(
    function: &str,
    args: Vec<Arg>,
    default: &ClientOptions,
) -> Result<ClientOptions, CallError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (None, _) => Ok(default.clone()),
        (Some(Arg::Options(options)), None) => Ok(options.as_ref().clone()),
        (Some(other), None) => Err(invalid(
            function,
            format!("expected options, got {}", other.type_name()),
        )),
        (Some(_), Some(_)) => Err(invalid(function, "expected at most one argument".to_string())),
    }
}

/// A connected in-memory client using the callback convention.
///
/// Commands reply through a trailing `Arg::Callback`:
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use deferkv_callback::{args, Callback, ObjectExt, Value};
/// use deferkv_memory::MemoryLibrary;
///
/// let library = MemoryLibrary::new();
/// let client = library.connect(Default::default());
///
/// let reply = Arc::new(Mutex::new(None));
/// let sink = reply.clone();
/// let callback: Callback = Box::new(move |_err, value| *sink.lock().unwrap() = value);
/// client.call("set", args!["hello", "world", callback]).unwrap();
///
/// assert_eq!(*reply.lock().unwrap(), Some(Value::ok()));
/// ```
pub struct MemoryClient {
    connection: Arc<Connection>,
    methods: RwLock<BTreeMap<String, Function>>,
}

impl MemoryClient {
    /// Open a client on `dataspace`.
    pub fn connect(dataspace: Arc<Dataspace>, options: ClientOptions) -> Arc<Self> {
        let connection = Arc::new(Connection::open(dataspace, Arc::new(options)));

        let mut methods: BTreeMap<String, Function> = SUPPORTED
            .iter()
            .map(|(name, _, _)| (name.to_string(), command_function(&connection, name)))
            .collect();

        let conn = connection.clone();
        methods.insert(
            "duplicate".to_string(),
            Function::new("duplicate", move |args| {
                let options = options_arg("duplicate", args, conn.options())?;
                let client: Handle = MemoryClient::connect(conn.dataspace().clone(), options);
                Ok(Output::Object(client))
            }),
        );

        for mode in [TransactionMode::Multi, TransactionMode::Batch] {
            let conn = connection.clone();
            let name = mode.accessor();
            methods.insert(
                name.to_string(),
                Function::new(name, move |args| {
                    if !args.is_empty() {
                        return Err(invalid(name, "expected no arguments".to_string()));
                    }
                    let transaction: Handle = MemoryTransaction::open(conn.clone(), mode);
                    Ok(Output::Object(transaction))
                }),
            );
        }

        let conn = connection.clone();
        methods.insert(
            "on".to_string(),
            Function::new("on", move |args| {
                let mut args = args.into_iter();
                match (args.next(), args.next(), args.next()) {
                    (Some(Arg::Value(Value::String(event))), Some(Arg::Listener(listener)), None) => {
                        conn.session().listen(&event, listener);
                        Ok(Output::Unit)
                    }
                    _ => Err(invalid("on", "expected (event, listener)".to_string())),
                }
            }),
        );

        Arc::new(Self {
            connection,
            methods: RwLock::new(methods),
        })
    }

    /// Options this client was opened with.
    pub fn options(&self) -> &ClientOptions {
        self.connection.options()
    }

    /// Currently selected database.
    pub fn selected_db(&self) -> u32 {
        self.connection.session().db()
    }
}

impl Object for MemoryClient {
    fn kind(&self) -> Kind {
        Kind::Client
    }

    fn type_name(&self) -> &str {
        "MemoryClient"
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
            "selected_db" => Some(Property::Value(Value::from(self.selected_db()))),
            "options" => Some(Property::Value(self.options().to_value())),
            "connected" => Some(Property::Value(Value::Bool(
                !self.connection.session().is_closed(),
            ))),
            _ if self.connection.dataspace().is_added_command(name) => {
                let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
                let function = methods
                    .entry(name.to_string())
                    .or_insert_with(|| command_function(&self.connection, name));
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
        keys.extend(["selected_db", "options", "connected"].map(String::from));
        keys.sort();
        keys.dedup();
        keys
    }
}
