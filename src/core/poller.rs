/// Periodic fetching of remote state with stale-value retention
///
/// A `Poller<T>` owns one `RemoteResource<T>`. It fetches immediately when
/// started, then on a fixed tick until stopped. Successful fetches replace the
/// value wholesale; failures are logged and recorded but never clear a value
/// that was already loaded.
///
/// Each tick's fetch runs as its own task, so a slow response can overlap the
/// next tick. Whichever success resolves last is the one shown.

use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::api::ApiError;

pub type FetchFuture<T> = BoxFuture<'static, Result<T, ApiError>>;
type FetchFn<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Lifecycle of a remote value, derived from what the resource holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never loaded and nothing in flight
    Uninitialized,
    /// First fetch in flight
    Loading,
    Ready,
    /// Holding a value while another fetch is in flight
    Refreshing,
    /// Holding a value but the most recent fetch failed
    Stale,
}

#[derive(Debug, Clone)]
pub struct RemoteResource<T> {
    value: Option<T>,
    in_flight: usize,
    last_error: Option<String>,
    updated_at: Option<DateTime<Local>>,
}

impl<T> Default for RemoteResource<T> {
    fn default() -> Self {
        Self {
            value: None,
            in_flight: 0,
            last_error: None,
            updated_at: None,
        }
    }
}

impl<T> RemoteResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time of the last successful fetch
    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    pub fn phase(&self) -> Phase {
        match (&self.value, self.in_flight > 0) {
            (None, true) => Phase::Loading,
            (None, false) => Phase::Uninitialized,
            (Some(_), _) if self.last_error.is_some() => Phase::Stale,
            (Some(_), true) => Phase::Refreshing,
            (Some(_), false) => Phase::Ready,
        }
    }

    fn begin_fetch(&mut self) {
        self.in_flight += 1;
    }

    /// Apply one fetch outcome. Only a success touches the value.
    fn settle<E: fmt::Display>(&mut self, outcome: Result<T, E>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            Ok(value) => {
                self.value = Some(value);
                self.last_error = None;
                self.updated_at = Some(Local::now());
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
            }
        }
    }
}

struct Shared<T> {
    name: String,
    fetch: FetchFn<T>,
    state: watch::Sender<RemoteResource<T>>,
    // Only flipped while holding the watch lock, so a result is either
    // applied before stop() returns or discarded.
    alive: AtomicBool,
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Mark a fetch in flight and invoke the fetch function, unless stopped
    fn begin(&self) -> Option<FetchFuture<T>> {
        let mut started = false;
        self.state.send_if_modified(|resource| {
            if !self.alive.load(Ordering::Acquire) {
                return false;
            }
            resource.begin_fetch();
            started = true;
            true
        });
        started.then(|| (self.fetch)())
    }

    /// Returns true when a new value was stored
    fn complete(&self, outcome: Result<T, ApiError>) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|resource| {
            if !self.alive.load(Ordering::Acquire) {
                debug!(poller = %self.name, "discarding result that arrived after stop");
                return false;
            }
            match &outcome {
                Ok(_) => debug!(poller = %self.name, "fetch succeeded"),
                Err(e) if resource.value.is_some() => {
                    warn!(poller = %self.name, error = %e, "fetch failed, keeping last value")
                }
                Err(e) => warn!(poller = %self.name, error = %e, "fetch failed, nothing loaded yet"),
            }
            applied = outcome.is_ok();
            resource.settle(outcome);
            true
        });
        applied
    }

    fn launch(self: &Arc<Self>) {
        if let Some(fetch) = self.begin() {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                shared.complete(fetch.await);
            });
        }
    }
}

/// Owner of one remote value and the timer that keeps it fresh
///
/// Must be started inside a tokio runtime. Dropping the poller stops it.
pub struct Poller<T> {
    shared: Arc<Shared<T>>,
    ticker: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    /// Fetch now, then every `schedule` until stopped
    ///
    /// `None` (or a zero interval) fetches once and schedules nothing.
    pub fn start<F, Fut>(name: impl Into<String>, schedule: Option<Duration>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let name = name.into();
        let fetch: FetchFn<T> = Arc::new(move || -> FetchFuture<T> { Box::pin(fetch()) });
        let (state, _) = watch::channel(RemoteResource::new());

        let shared = Arc::new(Shared {
            name,
            fetch,
            state,
            alive: AtomicBool::new(true),
        });

        let schedule = schedule.filter(|every| !every.is_zero());
        info!(poller = %shared.name, interval = ?schedule, "poller started");

        shared.launch();

        let ticker = schedule.map(|every| {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                let mut ticks =
                    tokio::time::interval_at(tokio::time::Instant::now() + every, every);
                loop {
                    ticks.tick().await;
                    shared.launch();
                }
            })
        });

        Self { shared, ticker }
    }

    /// Fetch outside the schedule and wait for the outcome
    ///
    /// Returns true if a new value was stored. Failures keep the old value,
    /// exactly like a scheduled tick.
    pub async fn refresh_now(&self) -> bool {
        match self.shared.begin() {
            Some(fetch) => self.shared.complete(fetch.await),
            None => false,
        }
    }

    /// Current value, if one has ever loaded
    pub fn value(&self) -> Option<T> {
        self.shared.state.borrow().value.clone()
    }

    pub fn snapshot(&self) -> RemoteResource<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver that is notified every time the resource changes
    pub fn subscribe(&self) -> watch::Receiver<RemoteResource<T>> {
        self.shared.state.subscribe()
    }
}

impl<T> Poller<T> {
    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase()
    }

    /// Borrow the resource without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&RemoteResource<T>) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    pub fn is_running(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    /// Cancel the schedule. Fetches already in flight finish but are ignored.
    pub fn stop(&mut self) {
        let mut was_alive = false;
        self.shared.state.send_if_modified(|_| {
            was_alive = self.shared.alive.swap(false, Ordering::AcqRel);
            false
        });

        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }

        if was_alive {
            info!(poller = %self.shared.name, "poller stopped");
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
