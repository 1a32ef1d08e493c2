//! Teardown registry
//!
//! A `Subscription` is an ordered list of cleanup actions run on
//! `unsubscribe`. Every `Subscriber` owns one, and operators hand their
//! upstream subscriber back as a teardown so cancellation travels up the
//! chain.

use crate::stream_configuration::{SubscriptionConfig, TeardownPolicy};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

/// Anything that can be cancelled
pub trait Unsubscribable: Send + Sync {
    fn unsubscribe(&self);
}

/// A single cleanup action returned by a producer or added to a registry
pub enum Teardown {
    /// A plain cleanup closure
    Action(Box<dyn FnOnce() + Send>),
    /// Something with its own `unsubscribe`, usually an upstream subscriber
    Unsubscribable(Box<dyn Unsubscribable>),
    /// Nothing to clean up; never stored
    Empty,
}

impl Teardown {
    pub fn action<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Teardown::Action(Box::new(f))
    }

    pub fn unsubscribable<U>(u: U) -> Self
    where
        U: Unsubscribable + 'static,
    {
        Teardown::Unsubscribable(Box::new(u))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Teardown::Empty)
    }

    fn execute(self) {
        match self {
            Teardown::Action(f) => f(),
            Teardown::Unsubscribable(u) => u.unsubscribe(),
            Teardown::Empty => {}
        }
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Teardown::Empty
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::Action(_) => write!(f, "Teardown::Action"),
            Teardown::Unsubscribable(_) => write!(f, "Teardown::Unsubscribable"),
            Teardown::Empty => write!(f, "Teardown::Empty"),
        }
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::unsubscribable(subscription)
    }
}

impl From<Box<dyn FnOnce() + Send>> for Teardown {
    fn from(f: Box<dyn FnOnce() + Send>) -> Self {
        Teardown::Action(f)
    }
}

impl From<()> for Teardown {
    fn from(_: ()) -> Self {
        Teardown::Empty
    }
}

struct Registry {
    closed: bool,
    teardowns: Vec<Teardown>,
}

/// Shared handle to an ordered teardown registry.
///
/// Clones refer to the same registry. `unsubscribe` is idempotent: the first
/// call drains and closes the registry, later calls do nothing. A teardown
/// added after the registry closed runs immediately.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Mutex<Registry>>,
    config: SubscriptionConfig,
}

impl Subscription {
    pub fn new() -> Self {
        Self::with_config(SubscriptionConfig::default())
    }

    pub fn with_config(config: SubscriptionConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                closed: false,
                teardowns: Vec::new(),
            })),
            config,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // A panicking teardown never runs while the lock is held, so a
        // poisoned registry is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a teardown. `Teardown::Empty` is ignored.
    pub fn add(&self, teardown: impl Into<Teardown>) {
        let teardown = teardown.into();
        if teardown.is_empty() {
            return;
        }

        let mut registry = self.registry();
        if registry.closed {
            drop(registry);
            log::trace!("Registry already closed, running teardown immediately");
            self.run(vec![teardown]);
        } else {
            registry.teardowns.push(teardown);
        }
    }

    /// Run every registered teardown in registration order
    pub fn unsubscribe(&self) {
        let teardowns = {
            let mut registry = self.registry();
            if registry.closed {
                return;
            }
            registry.closed = true;
            std::mem::take(&mut registry.teardowns)
        };
        log::trace!("Running {} teardown(s)", teardowns.len());
        self.run(teardowns);
    }

    fn run(&self, teardowns: Vec<Teardown>) {
        match self.config.teardown_policy {
            TeardownPolicy::FailFast => {
                for teardown in teardowns {
                    teardown.execute();
                }
            }
            TeardownPolicy::Isolate => {
                let mut first_panic: Option<Box<dyn Any + Send>> = None;
                let mut failures = 0usize;
                for teardown in teardowns {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| teardown.execute())) {
                        failures += 1;
                        log::error!("Teardown failed: {}", panic_message(payload.as_ref()));
                        first_panic.get_or_insert(payload);
                    }
                }
                if let Some(payload) = first_panic {
                    log::warn!("{} teardown(s) failed during unsubscribe", failures);
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.registry().closed
    }

    /// Number of teardowns waiting to run
    pub fn len(&self) -> usize {
        self.registry().teardowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("Subscription")
            .field("closed", &registry.closed)
            .field("teardowns", &registry.teardowns.len())
            .field("policy", &self.config.teardown_policy)
            .finish()
    }
}

impl Unsubscribable for Subscription {
    fn unsubscribe(&self) {
        Subscription::unsubscribe(self)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
