//! Function conversions: wrapping what a function produces, and caching
//! converted functions against the original they were built from.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use deferkv_callback::{Function, Handle, Output};

use crate::{client, transaction};

fn rewrap(function: Function, wrapper: fn(Handle) -> Handle) -> Function {
    let name = function.name().to_string();
    Function::new(name, move |args| match function.call(args)? {
        Output::Object(produced) => Ok(Output::Object(wrapper(produced))),
        other => Ok(other),
    })
}

/// Call `function` unchanged, then client-wrap the client it returns.
pub(crate) fn factory_result(function: Function) -> Function {
    rewrap(function, client::wrap_client)
}

/// Call `function` unchanged, then transaction-wrap the builder it returns.
pub(crate) fn builder_result(function: Function) -> Function {
    rewrap(function, transaction::wrap_transaction)
}

/// A converted function and the original it was built from.
#[derive(Clone)]
struct Converted {
    original: Function,
    converted: Function,
}

/// Converted functions by property name.
///
/// A cached conversion is reused only while the target still hands out the
/// same original function; otherwise it is rebuilt. Reading a property twice
/// therefore yields the same converted function.
#[derive(Default)]
pub(crate) struct Conversions {
    table: RwLock<HashMap<String, Converted>>,
}

impl Conversions {
    pub(crate) fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The conversion of `original` stored under `name`, built with
    /// `convert` if missing or stale.
    pub(crate) fn resolve(
        &self,
        name: &str,
        original: Function,
        convert: impl FnOnce(&Function) -> Function,
    ) -> Function {
        let cached = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(entry) = cached {
            if entry.original.ptr_eq(&original) {
                return entry.converted;
            }
        }

        let converted = convert(&original);
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                name.to_string(),
                Converted {
                    original,
                    converted: converted.clone(),
                },
            );
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deferkv_callback::{args, Kind, Object, Property, Value};
    use std::sync::Arc;

    struct Bare(Kind);

    impl Object for Bare {
        fn kind(&self) -> Kind {
            self.0
        }

        fn type_name(&self) -> &str {
            "Bare"
        }

        fn get(&self, _name: &str) -> Option<Property> {
            None
        }

        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn produced_objects_are_wrapped() {
        let factory = Function::new("duplicate", |_| {
            let client: Handle = Arc::new(Bare(Kind::Client));
            Ok(Output::Object(client))
        });
        let produced = factory_result(factory)
            .call(args![])
            .unwrap()
            .into_object()
            .unwrap();
        assert!(produced.is_wrapped());
        assert_eq!(produced.kind(), Kind::Client);
    }

    #[test]
    fn conversions_follow_the_original() {
        let conversions = Conversions::default();
        let first = Function::new("exec", |_| Ok(Output::Unit));
        let a = conversions.resolve("exec", first.clone(), |f| factory_result(f.clone()));
        let b = conversions.resolve("exec", first.clone(), |_| panic!("rebuilt"));
        assert!(a.ptr_eq(&b));
        assert_eq!(conversions.len(), 1);

        let second = Function::new("exec", |_| Ok(Output::Unit));
        let c = conversions.resolve("exec", second, |f| factory_result(f.clone()));
        assert!(!c.ptr_eq(&a));
        assert_eq!(conversions.len(), 1);
    }

    #[test]
    fn other_outputs_pass_through() {
        let accessor = Function::new("multi", |_| Ok(Output::Value(Value::from(1_i64))));
        let converted = builder_result(accessor);
        assert_eq!(converted.name(), "multi");
        assert_eq!(
            converted.call(args![]).unwrap().into_value().unwrap(),
            Value::Integer(1)
        );
    }
}
