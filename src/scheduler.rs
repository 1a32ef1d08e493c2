//! Timer primitive
//!
//! Operators that need time (only `debounce_time` today) talk to a
//! `Scheduler` instead of sleeping directly. `TokioScheduler` runs on the
//! tokio timer wheel; `VirtualScheduler` keeps its own clock and is driven by
//! hand, which makes timing behaviour testable without waiting.

use crate::error::StreamResult;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Work scheduled on a `Scheduler`
pub type Task = Box<dyn FnOnce() + Send>;

/// Identifies a scheduled task so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelToken(u64);

impl CancelToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed.
    ///
    /// Fails when the scheduler has nothing to run the task on; the task is
    /// dropped in that case.
    fn schedule_after(&self, delay: Duration, task: Task) -> StreamResult<CancelToken>;

    /// Cancel a pending task. Unknown or already fired tokens are ignored.
    fn cancel(&self, token: CancelToken);

    /// Whether tasks can be scheduled right now
    fn ensure_ready(&self) -> StreamResult<()> {
        Ok(())
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule_after(&self, delay: Duration, task: Task) -> StreamResult<CancelToken> {
        (**self).schedule_after(delay, task)
    }

    fn ensure_ready(&self) -> StreamResult<()> {
        (**self).ensure_ready()
    }

    fn cancel(&self, token: CancelToken) {
        (**self).cancel(token)
    }
}

/// Scheduler backed by tokio timers
///
/// Every scheduled task is a spawned tokio task that sleeps for the delay and
/// then runs the callback; cancelling aborts it.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Option<Handle>,
    next_id: Arc<AtomicU64>,
    tasks: Arc<Mutex<HashMap<CancelToken, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Bind to the runtime the caller is running in
    pub fn try_current() -> StreamResult<Self> {
        let handle = Handle::try_current()?;
        Ok(Self::with_handle(handle))
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            next_id: Arc::new(AtomicU64::new(0)),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn runtime(&self) -> StreamResult<Handle> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Ok(Handle::try_current()?),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<CancelToken, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of timers that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        self.tasks().len()
    }
}

impl Default for TokioScheduler {
    /// A scheduler that looks the runtime up each time a task is scheduled
    fn default() -> Self {
        Self {
            handle: None,
            next_id: Arc::new(AtomicU64::new(0)),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("bound", &self.handle.is_some())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> StreamResult<CancelToken> {
        let handle = self.runtime().map_err(|e| {
            log::error!("Cannot schedule timer: {}", e);
            e
        })?;
        let token = CancelToken(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Hold the map lock across spawn so the task cannot remove its own
        // entry before it was inserted.
        let mut tasks = self.tasks();
        let registry = Arc::clone(&self.tasks);
        let join = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&token)
                .is_some();
            if still_pending {
                task();
            }
        });
        tasks.insert(token, join);
        Ok(token)
    }

    fn cancel(&self, token: CancelToken) {
        if let Some(join) = self.tasks().remove(&token) {
            join.abort();
        }
    }

    fn ensure_ready(&self) -> StreamResult<()> {
        self.runtime().map(|_| ())
    }
}

struct VirtualState {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), Task>,
    due: HashMap<u64, Duration>,
}

/// Scheduler driven by a virtual clock
///
/// Nothing runs until the clock is advanced. Tasks due at the same instant
/// run in the order they were scheduled.
#[derive(Clone)]
pub struct VirtualScheduler {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                now: Duration::ZERO,
                next_id: 0,
                queue: BTreeMap::new(),
                due: HashMap::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.state().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    pub fn advance_by(&self, delta: Duration) {
        let target = self.now() + delta;
        self.advance_to(target);
    }

    /// Move the clock to `target`, running every task due up to and
    /// including it. Tasks scheduled by running tasks are picked up if they
    /// fall inside the window. Moving backwards is a no-op.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut state = self.state();
                let next_key = match state.queue.keys().next() {
                    Some(&key) if key.0 <= target => key,
                    _ => break,
                };
                state.now = next_key.0;
                state.due.remove(&next_key.1);
                state.queue.remove(&next_key)
            };
            if let Some(task) = task {
                task();
            }
        }

        let mut state = self.state();
        if target > state.now {
            state.now = target;
        }
    }

    /// Run everything that is scheduled, advancing the clock as needed
    pub fn flush(&self) {
        loop {
            let last_due = self.state().queue.keys().next_back().map(|key| key.0);
            match last_due {
                Some(due) => self.advance_to(due),
                None => break,
            }
        }
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("VirtualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> StreamResult<CancelToken> {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + delay;
        state.queue.insert((due, id), task);
        state.due.insert(id, due);
        Ok(CancelToken(id))
    }

    fn cancel(&self, token: CancelToken) {
        let mut state = self.state();
        if let Some(due) = state.due.remove(&token.0) {
            state.queue.remove(&(due, token.0));
        }
    }
}
