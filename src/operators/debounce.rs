//! Trailing-edge debounce
//!
//! Only the last value of a burst survives. It is emitted once `delay` has
//! passed without a newer value arriving.

use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::pipe::Operator;
use crate::scheduler::{CancelToken, Scheduler, TokioScheduler};
use crate::stream_configuration::DebounceConfig;
use crate::subscriber::Subscriber;
use crate::subscription::{Subscription, Teardown};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Per-subscription debounce window
struct Window<T> {
    // Bumped whenever the pending timer is superseded or cancelled, so a
    // timer that was already firing can tell it is stale.
    generation: u64,
    timer: Option<CancelToken>,
    value: Option<T>,
}

struct WindowHandle<T> {
    window: Arc<Mutex<Window<T>>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<T> Clone for WindowHandle<T> {
    fn clone(&self) -> Self {
        WindowHandle {
            window: Arc::clone(&self.window),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<T> WindowHandle<T> {
    fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        WindowHandle {
            window: Arc::new(Mutex::new(Window {
                generation: 0,
                timer: None,
                value: None,
            })),
            scheduler,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Window<T>> {
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel the pending timer and hand back the value it was holding
    fn close(&self) -> Option<T> {
        let mut window = self.lock();
        window.generation += 1;
        if let Some(token) = window.timer.take() {
            self.scheduler.cancel(token);
        }
        window.value.take()
    }
}

struct DebounceObserver<T> {
    downstream: Subscriber<T>,
    handle: WindowHandle<T>,
    delay: Duration,
    flush_on_complete: bool,
}

impl<T: Send + 'static> Observer<T> for DebounceObserver<T> {
    fn next(&mut self, value: T) {
        let mut window = self.handle.lock();
        window.generation += 1;
        let generation = window.generation;
        if let Some(token) = window.timer.take() {
            log::trace!("[{}] debounce window restarted", self.downstream.label());
            self.handle.scheduler.cancel(token);
        }
        window.value = Some(value);

        let handle = self.handle.clone();
        let downstream = self.downstream.clone();
        let scheduled = self.handle.scheduler.schedule_after(
            self.delay,
            Box::new(move || {
                let value = {
                    let mut window = handle.lock();
                    if window.generation != generation {
                        return;
                    }
                    window.timer = None;
                    window.value.take()
                };
                if let Some(value) = value {
                    downstream.next(value);
                }
            }),
        );
        match scheduled {
            Ok(token) => window.timer = Some(token),
            Err(err) => {
                window.value = None;
                drop(window);
                self.downstream.error(err);
            }
        }
    }

    fn error(&mut self, err: StreamError) {
        if self.handle.close().is_some() {
            log::debug!("[{}] pending value dropped on error", self.downstream.label());
        }
        self.downstream.error(err);
    }

    fn complete(&mut self) {
        let pending = self.handle.close();
        match pending {
            Some(value) if self.flush_on_complete => self.downstream.next(value),
            Some(_) => log::debug!("[{}] pending value dropped on complete", self.downstream.label()),
            None => {}
        }
        self.downstream.complete();
    }
}

/// Debounce on the tokio timer of the current runtime
pub fn debounce_time<T>(delay: Duration) -> Operator<T, T>
where
    T: Send + 'static,
{
    debounce_with_config(DebounceConfig::new(delay), TokioScheduler::default())
}

/// Debounce on an explicit scheduler
pub fn debounce_time_on<T, S>(delay: Duration, scheduler: S) -> Operator<T, T>
where
    T: Send + 'static,
    S: Scheduler + 'static,
{
    debounce_with_config(DebounceConfig::new(delay), scheduler)
}

/// Debounce with full configuration.
///
/// Each subscription gets its own window. Errors and completion cancel the
/// pending timer and drop its value, unless `flush_on_complete` asks for the
/// value to be emitted ahead of completion. Unsubscribing cancels upstream
/// and the pending timer.
///
/// A scheduler that cannot run timers fails the subscription with its error
/// (`StreamError::NoRuntime` for a tokio scheduler outside a runtime) before
/// upstream is subscribed.
pub fn debounce_with_config<T, S>(config: DebounceConfig, scheduler: S) -> Operator<T, T>
where
    T: Send + 'static,
    S: Scheduler + 'static,
{
    let scheduler: Arc<dyn Scheduler> = Arc::new(scheduler);
    Operator::new(move |upstream: Observable<T>| {
        let scheduler = Arc::clone(&scheduler);
        let config = config.clone();
        Observable::with_label("debounce_time", move |downstream: Subscriber<T>| {
            if let Err(err) = scheduler.ensure_ready() {
                downstream.error(err);
                return Teardown::Empty;
            }

            let handle = WindowHandle::new(Arc::clone(&scheduler));
            let teardown = Subscription::with_config(downstream.subscription().config().clone());
            let upstream_subscriber = upstream.subscribe(DebounceObserver {
                downstream,
                handle: handle.clone(),
                delay: config.delay,
                flush_on_complete: config.flush_on_complete,
            });

            teardown.add(upstream_subscriber);
            teardown.add(Teardown::action(move || {
                handle.close();
            }));
            Teardown::from(teardown)
        })
    })
}
