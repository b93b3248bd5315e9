//! The library object: the factory clients are created from.

use std::collections::BTreeMap;
use std::sync::Arc;

use collection_literals::btree;
use deferkv_callback::{
    Arg, CallError, ClientOptions, Function, Handle, Kind, Object, Output, Property, Value,
};

use crate::client::{options_arg, MemoryClient};
use crate::dataspace::Dataspace;

/// In-memory client library.
///
/// Every client created from one library shares its `Dataspace`, so data
/// written by one client is visible to the others and published messages
/// reach every subscribed client.
pub struct MemoryLibrary {
    dataspace: Arc<Dataspace>,
    methods: BTreeMap<&'static str, Function>,
}

impl MemoryLibrary {
    /// Create a library with a fresh, empty dataspace.
    pub fn new() -> Arc<Self> {
        Self::with_dataspace(Arc::new(Dataspace::new()))
    }

    /// Create a library over an existing dataspace.
    pub fn with_dataspace(dataspace: Arc<Dataspace>) -> Arc<Self> {
        let ds = dataspace.clone();
        let create_client = Function::new("create_client", move |args| {
            let options = options_arg("create_client", args, &ClientOptions::default())?;
            let client: Handle = MemoryClient::connect(ds.clone(), options);
            Ok(Output::Object(client))
        });

        let ds = dataspace.clone();
        let add_command = Function::new("add_command", move |args| {
            match args.as_slice() {
                [Arg::Value(Value::String(name))] if !name.is_empty() => {
                    ds.add_command(name);
                    Ok(Output::Unit)
                }
                _ => Err(CallError::InvalidArgument {
                    function: "add_command".to_string(),
                    message: "expected a command name".to_string(),
                }),
            }
        });

        Arc::new(Self {
            dataspace,
            methods: btree! {
                "create_client" => create_client,
                "add_command" => add_command,
            },
        })
    }

    /// The shared dataspace.
    pub fn dataspace(&self) -> &Arc<Dataspace> {
        &self.dataspace
    }

    /// Open a client directly, bypassing the `create_client` property.
    pub fn connect(&self, options: ClientOptions) -> Arc<MemoryClient> {
        MemoryClient::connect(self.dataspace.clone(), options)
    }
}

impl Object for MemoryLibrary {
    fn kind(&self) -> Kind {
        Kind::Library
    }

    fn type_name(&self) -> &str {
        "MemoryLibrary"
    }

    fn get(&self, name: &str) -> Option<Property> {
        match name {
            "version" => Some(Property::Value(Value::from(env!("CARGO_PKG_VERSION")))),
            _ => self.methods.get(name).cloned().map(Property::Function),
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.methods.keys().map(|k| k.to_string()).collect();
        keys.push("version".to_string());
        keys.sort();
        keys
    }
}
