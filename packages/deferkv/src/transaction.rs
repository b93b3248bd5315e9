//! Transaction builder view.

use std::sync::Arc;

use deferkv_callback::{args, CallError, Deferred, Handle, Kind, Object, ObjectExt, Property};

use crate::combinator::Conversions;
use crate::command::promisify;
use crate::names::EXEC;

/// A transaction builder whose `exec` returns a deferred result.
///
/// Every other property reads straight through to the builder, so queuing
/// calls keep returning the original builder and keep accumulating on it.
pub struct PromiseTransaction {
    inner: Handle,
    conversions: Conversions,
}

impl PromiseTransaction {
    pub fn new(inner: Handle) -> Self {
        Self {
            inner,
            conversions: Conversions::default(),
        }
    }

    /// The builder being wrapped.
    pub fn inner(&self) -> &Handle {
        &self.inner
    }

    /// Run the queued commands.
    pub fn exec(&self) -> Result<Deferred, CallError> {
        self.call(EXEC, args![])?.into_deferred()
    }
}

impl Object for PromiseTransaction {
    fn kind(&self) -> Kind {
        self.inner.kind()
    }

    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn get(&self, name: &str) -> Option<Property> {
        match self.inner.get(name)? {
            Property::Function(original) if name == EXEC => Some(Property::Function(
                self.conversions.resolve(name, original, promisify),
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

/// Transaction-wrap `builder`, unless it is already wrapped.
pub fn wrap_transaction(builder: Handle) -> Handle {
    if builder.is_wrapped() {
        return builder;
    }
    Arc::new(PromiseTransaction::new(builder))
}
