//! Command conversion: callback in, deferred result out.

use deferkv_callback::{Arg, CommandError, Deferred, Function, Output, Value};

/// Convert a callback-convention function into one that returns a deferred
/// result.
///
/// The returned function keeps the original's name. Calling it calls the
/// original with the same arguments followed by a synthesized completion
/// handler, and returns `Output::Deferred`. An error handed to the handler
/// fails the deferred result unchanged; otherwise it succeeds with the reply
/// (`Value::Null` when none was given). Errors the original raises
/// synchronously are returned as-is.
pub fn promisify(function: &Function) -> Function {
    let original = function.clone();
    Function::new(function.name(), move |mut args| {
        let command = original.name().to_string();
        tracing::trace!(command = %command, args = args.len(), "command issued");
        let (settle, deferred) = Deferred::channel(original.name());
        args.push(Arg::Callback(Box::new(
            move |err: Option<CommandError>, reply: Option<Value>| {
                let result = match err {
                    Some(e) => Err(e),
                    None => Ok(reply.unwrap_or(Value::Null)),
                };
                tracing::trace!(command = %command, ok = result.is_ok(), "command settled");
                settle.settle(result);
            },
        )));
        original.call(args)?;
        Ok(Output::Deferred(deferred))
    })
}
