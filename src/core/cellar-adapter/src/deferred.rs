//! Manually settled results.
//!
//! Bridges completion callbacks to an awaitable value. A [`Settler`] and a
//! [`Pending`] are created together; whichever of [`Settler::resolve`] or
//! [`Settler::reject`] runs first decides the result, and every later call is
//! a no-op that returns `false`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

/// The settling side was dropped before a result was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deferred result dropped without being settled")]
pub struct Abandoned;

type Slot<T, E> = Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>;

/// Creates an unsettled result.
pub fn deferred<T, E>() -> (Settler<T, E>, Pending<T, E>) {
    let (tx, rx) = oneshot::channel();
    (
        Settler {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        Pending { rx },
    )
}

/// Settles a [`Pending`] result exactly once.
///
/// Clones share the same slot, so a result can be settled from whichever
/// callback finishes first.
pub struct Settler<T, E> {
    slot: Slot<T, E>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T, E> Settler<T, E> {
    /// Settles with a success value. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with a failure value. Returns false if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settles with `result`. Returns false if already settled.
    ///
    /// A result delivered after the [`Pending`] side was dropped still counts
    /// as settled.
    pub fn settle(&self, result: Result<T, E>) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(tx) => {
                let _ = tx.send(result);
                true
            },
            None => false,
        }
    }

    /// Returns true once the result has been settled.
    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Awaitable side of a deferred result.
///
/// Resolves to the settled value, or to `E::from(Abandoned)` if every
/// [`Settler`] was dropped first.
#[must_use = "a pending result does nothing unless awaited"]
pub struct Pending<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Pending<T, E>
where
    E: From<Abandoned>,
{
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(E::from(Abandoned))))
    }
}
