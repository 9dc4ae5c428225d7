// Copyright 2024 KV Client API Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The asynchronous result handle used at both the transport level and the
//! command level.
//!
//! [`ExecFuture`] is a single-assignment cell: it reaches exactly one of
//! three terminal states, [`Outcome::Completed`], [`Outcome::Failed`] or
//! [`Outcome::Cancelled`], exactly once. The producing side holds a
//! [`Completer`]; the consuming side may `.await` the future, attach
//! listeners, or both. Listeners attached after resolution are invoked
//! immediately with the recorded outcome, so no notification is ever missed.
//!
//! Nothing here blocks a thread: resolution happens on whatever execution
//! context settles the completer, and listeners run on that context.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::task::Context;
use std::task::Poll;
use std::task::Waker;

/// Terminal state of an [`ExecFuture`].
///
/// The query info identifies which request the outcome belongs to. It is
/// carried on both success and failure; on failure it is `None` only when the
/// producing side was torn down before it could echo the request context.
#[derive(Debug)]
pub enum Outcome<R, Q> {
    /// The operation finished and produced a response.
    Completed { response: R, query_info: Q },

    /// The operation failed. The original cause is shared, not re-wrapped, so
    /// it survives adaptation layers unchanged.
    Failed {
        error: Arc<io::Error>,
        query_info: Option<Q>,
    },

    /// The operation was cancelled before it resolved.
    Cancelled,
}

impl<R, Q> Outcome<R, Q> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The response, if the operation completed.
    pub fn response(&self) -> Option<&R> {
        match self {
            Outcome::Completed { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The failure cause, if the operation failed.
    pub fn error(&self) -> Option<&Arc<io::Error>> {
        match self {
            Outcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The echoed query info, on whichever terminal state carries one.
    pub fn query_info(&self) -> Option<&Q> {
        match self {
            Outcome::Completed { query_info, .. } => Some(query_info),
            Outcome::Failed { query_info, .. } => query_info.as_ref(),
            Outcome::Cancelled => None,
        }
    }
}

type Listener<R, Q> = Box<dyn FnOnce(&Outcome<R, Q>) + Send>;
type CancelHook = Box<dyn FnOnce() + Send>;

enum State<R, Q> {
    Pending {
        listeners: Vec<Listener<R, Q>>,
        wakers: Vec<Waker>,
    },
    Done(Arc<Outcome<R, Q>>),
}

struct Inner<R, Q> {
    state: Mutex<State<R, Q>>,
    cancel_hook: Mutex<Option<CancelHook>>,
}

impl<R, Q> Inner<R, Q> {
    fn lock_state(&self) -> MutexGuard<'_, State<R, Q>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move to the terminal state if still pending.
    ///
    /// Returns the listeners and wakers to notify if this call won, so that
    /// they run after the state lock is released: a listener is free to touch
    /// this same future again without deadlocking.
    fn settle(&self, outcome: Outcome<R, Q>) -> Option<(Arc<Outcome<R, Q>>, Vec<Listener<R, Q>>, Vec<Waker>)> {
        let mut state = self.lock_state();
        match &mut *state {
            State::Pending { listeners, wakers } => {
                let listeners = std::mem::take(listeners);
                let wakers = std::mem::take(wakers);
                let outcome = Arc::new(outcome);
                *state = State::Done(outcome.clone());
                Some((outcome, listeners, wakers))
            }
            State::Done(_) => None,
        }
    }
}

/// Settle and notify; returns `true` if this call determined the outcome.
fn resolve<R, Q>(inner: &Inner<R, Q>, outcome: Outcome<R, Q>) -> bool {
    match inner.settle(outcome) {
        Some((outcome, listeners, wakers)) => {
            for l in listeners {
                l(&outcome);
            }
            for w in wakers {
                w.wake();
            }
            true
        }
        None => false,
    }
}

/// The asynchronous result of a dispatched operation.
///
/// `ExecFuture` is cheap to clone; every clone observes the same resolution.
/// It implements [`Future`], yielding the shared [`Outcome`], and additionally
/// supports callback-style listeners via [`ExecFuture::add_listener`].
///
/// # Examples
///
/// ```
/// use kv_client_api::future::ExecFuture;
///
/// #[tokio::main]
/// async fn main() {
///     let (fut, completer) = ExecFuture::<u64, String>::new();
///     completer.complete(7, "req-1".to_string());
///
///     let outcome = fut.await;
///     assert_eq!(outcome.response(), Some(&7));
///     assert_eq!(outcome.query_info(), Some(&"req-1".to_string()));
/// }
/// ```
pub struct ExecFuture<R, Q> {
    inner: Arc<Inner<R, Q>>,
}

impl<R, Q> Clone for ExecFuture<R, Q> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R, Q> ExecFuture<R, Q>
where
    R: Send + 'static,
    Q: Send + 'static,
{
    /// Create an unresolved future together with the handle that settles it.
    pub fn new() -> (Self, Completer<R, Q>) {
        let inner = Arc::new(Inner {
            state: Mutex::new(State::Pending {
                listeners: Vec::new(),
                wakers: Vec::new(),
            }),
            cancel_hook: Mutex::new(None),
        });
        let fut = Self {
            inner: inner.clone(),
        };
        let completer = Completer {
            inner,
            settled: false,
        };
        (fut, completer)
    }

    /// Attach a listener invoked exactly once with the terminal outcome.
    ///
    /// If the future is already resolved the listener runs immediately on the
    /// calling thread; otherwise it runs on whatever context settles the
    /// completer.
    pub fn add_listener<F>(&self, f: F)
    where F: FnOnce(&Outcome<R, Q>) + Send + 'static {
        let replay = {
            let mut state = self.inner.lock_state();
            match &mut *state {
                State::Pending { listeners, .. } => {
                    listeners.push(Box::new(f));
                    None
                }
                State::Done(outcome) => Some((f, outcome.clone())),
            }
        };
        // Replay outside the lock.
        if let Some((f, outcome)) = replay {
            f(&outcome);
        }
    }

    /// The outcome, if the future has resolved.
    pub fn try_outcome(&self) -> Option<Arc<Outcome<R, Q>>> {
        match &*self.inner.lock_state() {
            State::Done(outcome) => Some(outcome.clone()),
            State::Pending { .. } => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(&*self.inner.lock_state(), State::Done(_))
    }

    /// Cancel the operation, best-effort.
    ///
    /// If the future is still pending it resolves as [`Outcome::Cancelled`]
    /// and the cancellation is propagated to the upstream future, if any.
    /// A future that already resolved is left untouched.
    pub fn cancel(&self) {
        if resolve(&self.inner, Outcome::Cancelled) {
            let hook = self.inner.cancel_hook.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(hook) = hook {
                hook();
            }
        }
    }

    /// Install the hook run when [`ExecFuture::cancel`] wins the race.
    ///
    /// Used by the future adapter to forward cancellation to the transport
    /// future it wraps.
    pub(crate) fn set_cancel_hook<F>(&self, hook: F)
    where F: FnOnce() + Send + 'static {
        *self.inner.cancel_hook.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
    }
}

impl<R, Q> Future for ExecFuture<R, Q>
where
    R: Send + 'static,
    Q: Send + 'static,
{
    type Output = Arc<Outcome<R, Q>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.inner.lock_state();
        match &mut *state {
            State::Done(outcome) => Poll::Ready(outcome.clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Producing-side handle of an [`ExecFuture`].
///
/// Consuming one of the settle methods resolves the paired future exactly
/// once. A completer dropped without settling fails the future with
/// [`io::ErrorKind::BrokenPipe`], so a torn-down transport cannot leave
/// callers waiting forever.
pub struct Completer<R, Q> {
    inner: Arc<Inner<R, Q>>,
    settled: bool,
}

impl<R, Q> Completer<R, Q>
where
    R: Send + 'static,
    Q: Send + 'static,
{
    /// Resolve the paired future successfully.
    pub fn complete(mut self, response: R, query_info: Q) {
        self.settled = true;
        resolve(&self.inner, Outcome::Completed {
            response,
            query_info,
        });
    }

    /// Resolve the paired future as failed, keeping the original cause.
    pub fn fail(mut self, error: io::Error, query_info: impl Into<Option<Q>>) {
        self.settled = true;
        resolve(&self.inner, Outcome::Failed {
            error: Arc::new(error),
            query_info: query_info.into(),
        });
    }

    /// Forward an already-shared failure cause, e.g. from an upstream future.
    pub fn fail_shared(mut self, error: Arc<io::Error>, query_info: impl Into<Option<Q>>) {
        self.settled = true;
        resolve(&self.inner, Outcome::Failed {
            error,
            query_info: query_info.into(),
        });
    }

    /// Resolve the paired future as cancelled.
    pub fn cancel(mut self) {
        self.settled = true;
        resolve(&self.inner, Outcome::Cancelled);
    }
}

impl<R, Q> Drop for Completer<R, Q> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        resolve(&self.inner, Outcome::Failed {
            error: Arc::new(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "operation dropped before completion",
            )),
            query_info: None,
        });
    }
}
