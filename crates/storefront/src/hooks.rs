//! Request state holders for the UI layer.
//!
//! A [`Remote`] wraps one gateway call and remembers its outcome, so a front
//! end can render idle / loading / ready / failed without tracking futures
//! itself.
//!
//! While a request runs the holder is mutably borrowed. Other tasks watch
//! progress through an [`InFlight`] handle instead.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared "request in flight" flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag until the returned guard is dropped.
    pub(crate) fn raise(&self) -> InFlightGuard<'_> {
        self.0.store(true, Ordering::Release);
        InFlightGuard(self)
    }
}

/// Lowers its flag on drop, including when the owning future is cancelled.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

/// Holds a state at `Loading` until settled. Dropped unsettled (the request
/// was cancelled) it falls back to `Idle`.
struct Pending<'a, T, E> {
    state: &'a mut RemoteState<T, E>,
    settled: bool,
}

impl<'a, T, E> Pending<'a, T, E> {
    fn begin(state: &'a mut RemoteState<T, E>) -> Self {
        *state = RemoteState::Loading;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, outcome: Result<T, E>) {
        *self.state = match outcome {
            Ok(data) => RemoteState::Ready(data),
            Err(error) => RemoteState::Failed(error),
        };
        self.settled = true;
    }
}

impl<T, E> Drop for Pending<'_, T, E> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state = RemoteState::Idle;
        }
    }
}

/// Outcome of the last request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteState<T, E> {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    Ready(T),
    Failed(E),
}

/// State of one remote query or mutation.
#[derive(Debug)]
pub struct Remote<T, E> {
    state: RemoteState<T, E>,
    settled_at: Option<Instant>,
    in_flight: InFlight,
}

impl<T, E> Default for Remote<T, E> {
    fn default() -> Self {
        Self {
            state: RemoteState::Idle,
            settled_at: None,
            in_flight: InFlight::default(),
        }
    }
}

impl<T, E> Remote<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request`, replacing any previous outcome, and return the new
    /// state (always `Ready` or `Failed`).
    ///
    /// If the returned future is dropped before `request` finishes, the
    /// state goes back to `Idle` and the in-flight flag is lowered.
    pub async fn run<F>(&mut self, request: F) -> &RemoteState<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        {
            let _loading = self.in_flight.raise();
            let pending = Pending::begin(&mut self.state);
            pending.settle(request.await);
        }
        self.settled_at = Some(Instant::now());
        &self.state
    }

    /// A handle that reports whether [`Remote::run`] is in progress.
    #[must_use]
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Forget the last outcome.
    pub fn reset(&mut self) {
        self.state = RemoteState::Idle;
        self.settled_at = None;
    }

    /// Take the settled state out of the holder.
    #[must_use]
    pub fn into_state(self) -> RemoteState<T, E> {
        self.state
    }

    #[must_use]
    pub const fn state(&self) -> &RemoteState<T, E> {
        &self.state
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match &self.state {
            RemoteState::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match &self.state {
            RemoteState::Failed(error) => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, RemoteState::Loading)
    }

    /// Whether the data is younger than `max_age`. Failed or idle state is
    /// never fresh.
    #[must_use]
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        matches!(self.state, RemoteState::Ready(_))
            && self.settled_at.is_some_and(|at| at.elapsed() < max_age)
    }
}
