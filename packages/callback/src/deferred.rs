//! Deferred results.
//!
//! A `Deferred` is the awaitable half of a one-shot channel; `Settle` is the
//! half handed to whoever produces the result. Exactly one settlement is
//! delivered. If the `Settle` half is dropped unused, the `Deferred` fails
//! with `CommandError::aborted`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{CommandError, Value};

type Settlement = Result<Value, CommandError>;

/// Awaitable result of a single command.
///
/// # Example
///
/// ```rust
/// use deferkv_callback::{Deferred, Value};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (settle, deferred) = Deferred::channel("get");
/// settle.settle(Ok(Value::from("world")));
/// assert_eq!(deferred.await.unwrap(), Value::from("world"));
///
/// let (settle, deferred) = Deferred::channel("get");
/// drop(settle);
/// assert_eq!(deferred.await.unwrap_err().code, "ABORT");
/// # }
/// ```
#[derive(Debug)]
pub struct Deferred {
    receiver: oneshot::Receiver<Settlement>,
    command: Arc<str>,
}

/// Producer half of a `Deferred`.
#[derive(Debug)]
pub struct Settle {
    sender: oneshot::Sender<Settlement>,
}

impl Deferred {
    /// Create a linked producer/consumer pair for `command`.
    pub fn channel(command: impl Into<Arc<str>>) -> (Settle, Deferred) {
        let (sender, receiver) = oneshot::channel();
        (
            Settle { sender },
            Deferred {
                receiver,
                command: command.into(),
            },
        )
    }

    /// Name of the command this result belongs to.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Settle {
    /// Deliver the result. A consumer that has stopped waiting is ignored.
    pub fn settle(self, result: Settlement) {
        let _ = self.sender.send(result);
    }
}

impl Future for Deferred {
    type Output = Settlement;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CommandError::aborted(&this.command))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settles_with_value() {
        let (settle, deferred) = Deferred::channel("get");
        settle.settle(Ok(Value::from("world")));
        assert_eq!(deferred.await.unwrap(), Value::from("world"));
    }

    #[tokio::test]
    async fn settles_with_error() {
        let (settle, deferred) = Deferred::channel("set");
        let err = CommandError::new("set", "ERR syntax error");
        settle.settle(Err(err.clone()));
        assert_eq!(deferred.await.unwrap_err(), err);
    }

    #[tokio::test]
    async fn dropped_producer_aborts() {
        let (settle, deferred) = Deferred::channel("get");
        drop(settle);
        let err = deferred.await.unwrap_err();
        assert_eq!(err.code, "ABORT");
    }

    #[tokio::test]
    async fn settles_from_another_task() {
        let (settle, deferred) = Deferred::channel("ping");
        tokio::spawn(async move {
            settle.settle(Ok(Value::status("PONG")));
        });
        assert_eq!(deferred.await.unwrap(), Value::status("PONG"));
    }

    #[test]
    fn settling_after_consumer_dropped_is_silent() {
        let (settle, deferred) = Deferred::channel("get");
        drop(deferred);
        settle.settle(Ok(Value::Null));
    }
}
