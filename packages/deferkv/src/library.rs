//! Library view: clients created through it come back wrapped.

use std::sync::Arc;

use deferkv_callback::{args, Arg, CallError, Handle, Kind, Object, ObjectExt, Property};

use crate::combinator::{factory_result, Conversions};
use crate::names::CREATE_CLIENT;

/// A client library whose `create_client` returns wrapped clients.
pub struct PromiseLibrary {
    inner: Handle,
    conversions: Conversions,
}

impl PromiseLibrary {
    pub fn new(inner: Handle) -> Self {
        Self {
            inner,
            conversions: Conversions::default(),
        }
    }

    /// The library being wrapped.
    pub fn inner(&self) -> &Handle {
        &self.inner
    }

    /// Create a client-wrapped client.
    pub fn create_client(&self, args: Vec<Arg>) -> Result<Handle, CallError> {
        self.call(CREATE_CLIENT, args)?.into_object()
    }

    /// Create a client with the library's default options.
    pub fn create_default_client(&self) -> Result<Handle, CallError> {
        self.create_client(args![])
    }
}

impl Object for PromiseLibrary {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn get(&self, name: &str) -> Option<Property> {
        match self.inner.get(name)? {
            Property::Function(original) if name == CREATE_CLIENT => Some(Property::Function(
                self.conversions.resolve(name, original, |f| factory_result(f.clone())),
            )),
            property => Some(property),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn is_wrapped(&self) -> bool {
        true
    }
}

/// Library-wrap `library`, unless it is already wrapped.
pub fn wrap_library(library: Handle) -> Handle {
    if library.is_wrapped() {
        return library;
    }
    Arc::new(PromiseLibrary::new(library))
}
