//! Dynamic objects: property reads, callables, and the shapes they exchange.

use std::fmt;
use std::sync::Arc;

use crate::{CallError, ClientOptions, CommandError, Deferred, Value};

/// Shared reference to any object. Identity is `Arc::ptr_eq`.
pub type Handle = Arc<dyn Object>;

/// Native error-first completion handler: `(error, reply)`.
pub type Callback = Box<dyn FnOnce(Option<CommandError>, Option<Value>) + Send>;

type Invoke = dyn Fn(Vec<Arg>) -> Result<Output, CallError> + Send + Sync;

/// Nominal type of an object, used to route it to the right adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The top-level factory that constructs clients.
    Library,
    /// A connected client.
    Client,
    /// A pipelined command builder.
    Transaction,
    /// Anything else.
    Other,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Library => write!(f, "library"),
            Kind::Client => write!(f, "client"),
            Kind::Transaction => write!(f, "transaction"),
            Kind::Other => write!(f, "object"),
        }
    }
}

/// A view over an object whose properties are read by name.
///
/// # Object Safety
///
/// This trait is object-safe: objects are passed around as `Handle`
/// (`Arc<dyn Object>`).
pub trait Object: Send + Sync {
    /// Nominal type of this object.
    fn kind(&self) -> Kind;

    /// Runtime type name, for diagnostics.
    fn type_name(&self) -> &str;

    /// Read a property.
    ///
    /// Reading the same function property twice must yield the same
    /// `Function` (see `Function::ptr_eq`).
    fn get(&self, name: &str) -> Option<Property>;

    /// Names of all readable properties.
    fn keys(&self) -> Vec<String>;

    /// Whether this object is an adapter produced by a wrapping layer.
    ///
    /// This probe is not a property: it never shows up in `keys()` and no
    /// property name can shadow it.
    fn is_wrapped(&self) -> bool {
        false
    }
}

/// The result of reading a property.
#[derive(Clone)]
pub enum Property {
    Value(Value),
    Function(Function),
}

impl Property {
    /// The function, if this property is callable.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Property::Function(f) => Some(f),
            Property::Value(_) => None,
        }
    }

    /// The value, if this property is plain data.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(v) => Some(v),
            Property::Function(_) => None,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Property::Function(func) => f.debug_tuple("Function").field(func).finish(),
        }
    }
}

/// A named callable bound to its receiver.
///
/// Clones share identity. Two functions are "the same function" when
/// `Function::ptr_eq` says so, regardless of name.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    invoke: Arc<Invoke>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, invoke: F) -> Self
    where
        F: Fn(Vec<Arg>) -> Result<Output, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            invoke: Arc::new(invoke),
        }
    }

    /// Declared name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function.
    pub fn call(&self, args: Vec<Arg>) -> Result<Output, CallError> {
        (self.invoke)(args)
    }

    /// Whether both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.invoke, &other.invoke)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// Listener for pushed events, called with the event payload.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&[Value]) + Send + Sync>);

impl Listener {
    pub fn new(listener: impl Fn(&[Value]) + Send + Sync + 'static) -> Self {
        Self(Arc::new(listener))
    }

    /// Deliver an event payload.
    pub fn notify(&self, payload: &[Value]) {
        (self.0)(payload)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Listener]")
    }
}

/// A single call argument.
pub enum Arg {
    Value(Value),
    Object(Handle),
    Options(Arc<ClientOptions>),
    Callback(Callback),
    Listener(Listener),
}

impl Arg {
    /// Short name of the argument's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Value(v) => v.type_name(),
            Arg::Object(_) => "object",
            Arg::Options(_) => "options",
            Arg::Callback(_) => "callback",
            Arg::Listener(_) => "listener",
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Arg::Object(o) => write!(f, "Object({})", o.type_name()),
            Arg::Options(o) => f.debug_tuple("Options").field(o).finish(),
            Arg::Callback(_) => write!(f, "Callback"),
            Arg::Listener(l) => f.debug_tuple("Listener").field(l).finish(),
        }
    }
}

macro_rules! value_args {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

value_args!(Value, &str, String, i64, i32, u32, f64, bool, Vec<u8>);

impl From<Handle> for Arg {
    fn from(handle: Handle) -> Self {
        Arg::Object(handle)
    }
}

impl From<Arc<ClientOptions>> for Arg {
    fn from(options: Arc<ClientOptions>) -> Self {
        Arg::Options(options)
    }
}

impl From<ClientOptions> for Arg {
    fn from(options: ClientOptions) -> Self {
        Arg::Options(Arc::new(options))
    }
}

impl From<Callback> for Arg {
    fn from(callback: Callback) -> Self {
        Arg::Callback(callback)
    }
}

impl From<Listener> for Arg {
    fn from(listener: Listener) -> Self {
        Arg::Listener(listener)
    }
}

/// What a call produced synchronously.
pub enum Output {
    /// Nothing; completion, if any, arrives through a callback.
    Unit,
    Value(Value),
    Object(Handle),
    /// A result that settles later.
    Deferred(Deferred),
}

impl Output {
    fn type_name(&self) -> &'static str {
        match self {
            Output::Unit => "unit",
            Output::Value(_) => "value",
            Output::Object(_) => "object",
            Output::Deferred(_) => "deferred",
        }
    }

    pub fn into_value(self) -> Result<Value, CallError> {
        match self {
            Output::Value(v) => Ok(v),
            other => Err(CallError::UnexpectedOutput {
                expected: "value",
                actual: other.type_name(),
            }),
        }
    }

    pub fn into_object(self) -> Result<Handle, CallError> {
        match self {
            Output::Object(o) => Ok(o),
            other => Err(CallError::UnexpectedOutput {
                expected: "object",
                actual: other.type_name(),
            }),
        }
    }

    pub fn into_deferred(self) -> Result<Deferred, CallError> {
        match self {
            Output::Deferred(d) => Ok(d),
            other => Err(CallError::UnexpectedOutput {
                expected: "deferred",
                actual: other.type_name(),
            }),
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Unit => write!(f, "Unit"),
            Output::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Output::Object(o) => write!(f, "Object({})", o.type_name()),
            Output::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// Convenience accessors for any `Object`.
pub trait ObjectExt {
    /// Read a function property.
    fn function(&self, name: &str) -> Option<Function>;

    /// Read a plain-data property.
    fn value(&self, name: &str) -> Option<Value>;

    /// Read a function property and invoke it.
    fn call(&self, name: &str, args: Vec<Arg>) -> Result<Output, CallError>;
}

impl<T: Object + ?Sized> ObjectExt for T {
    fn function(&self, name: &str) -> Option<Function> {
        match self.get(name)? {
            Property::Function(f) => Some(f),
            Property::Value(_) => None,
        }
    }

    fn value(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            Property::Value(v) => Some(v),
            Property::Function(_) => None,
        }
    }

    fn call(&self, name: &str, args: Vec<Arg>) -> Result<Output, CallError> {
        match self.get(name) {
            Some(Property::Function(f)) => f.call(args),
            Some(Property::Value(_)) => Err(CallError::NotAFunction {
                name: name.to_string(),
            }),
            None => Err(CallError::MissingProperty {
                name: name.to_string(),
            }),
        }
    }
}
