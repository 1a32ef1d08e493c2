//! Subscriber: the stateful receiving end of one subscription
//!
//! Wraps a (possibly partial) observer, stops forwarding values once a
//! terminal event arrived, and owns the teardown registry of the
//! subscription.

use crate::error::StreamError;
use crate::observer::{Notification, Observer};
use crate::stream_configuration::SubscriptionConfig;
use crate::subscription::{Subscription, Teardown, Unsubscribable};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

struct Inner<T> {
    observer: Mutex<Box<dyn Observer<T>>>,
    // Thread currently inside an observer callback of this subscriber, and
    // whatever that callback emitted back into the subscriber.
    delivering: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<Notification<T>>>,
    stopped: AtomicBool,
    label: String,
    subscription: Subscription,
}

/// Shared handle to the endpoint of one subscription.
///
/// Clones refer to the same endpoint. Calls made on the subscriber from
/// inside one of its own observer callbacks are queued and delivered, in
/// order, as soon as that callback returns.
pub struct Subscriber<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Clears the delivering thread even if an observer callback panics
struct Delivery<'a> {
    delivering: &'a Mutex<Option<ThreadId>>,
}

impl<'a> Delivery<'a> {
    fn start(delivering: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(delivering) = Some(thread::current().id());
        Delivery { delivering }
    }
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        *lock(self.delivering) = None;
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<T> Subscriber<T> {
    pub fn new<O>(observer: O, label: impl Into<String>) -> Self
    where
        O: Observer<T> + 'static,
    {
        Self::with_config(observer, label, SubscriptionConfig::default())
    }

    pub fn with_config<O>(observer: O, label: impl Into<String>, config: SubscriptionConfig) -> Self
    where
        O: Observer<T> + 'static,
    {
        Subscriber {
            inner: Arc::new(Inner {
                observer: Mutex::new(Box::new(observer)),
                delivering: Mutex::new(None),
                deferred: Mutex::new(VecDeque::new()),
                stopped: AtomicBool::new(false),
                label: label.into(),
                subscription: Subscription::with_config(config),
            }),
        }
    }

    fn in_own_callback(&self) -> bool {
        *lock(&self.inner.delivering) == Some(thread::current().id())
    }

    /// Forward a value unless the subscriber has stopped
    pub fn next(&self, value: T) {
        if self.in_own_callback() {
            if self.is_stopped() {
                log::trace!("[{}] dropping value after terminal event", self.inner.label);
            } else {
                lock(&self.inner.deferred).push_back(Notification::Next(value));
            }
            return;
        }

        let observer = lock(&self.inner.observer);
        if self.is_stopped() {
            log::trace!("[{}] dropping value after terminal event", self.inner.label);
            return;
        }
        self.deliver(observer, Notification::Next(value));
    }

    /// Stop the subscriber and forward the error.
    ///
    /// Unlike `complete`, this does not run the teardowns.
    pub fn error(&self, err: StreamError) {
        log::debug!("[{}] error: {}", self.inner.label, err);
        self.terminate(Notification::Error(err));
    }

    /// Stop the subscriber, forward completion, then unsubscribe
    pub fn complete(&self) {
        log::trace!("[{}] complete", self.inner.label);
        self.terminate(Notification::Complete);
    }

    fn terminate(&self, notification: Notification<T>) {
        if self.in_own_callback() {
            self.inner.stopped.store(true, Ordering::SeqCst);
            lock(&self.inner.deferred).push_back(notification);
            return;
        }

        let observer = lock(&self.inner.observer);
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.deliver(observer, notification);
    }

    /// Run `first` and everything queued behind it while holding the
    /// observer, then unsubscribe if a completion went through.
    fn deliver(&self, mut observer: MutexGuard<'_, Box<dyn Observer<T>>>, first: Notification<T>) {
        let mut completed = false;
        {
            let _delivery = Delivery::start(&self.inner.delivering);
            let mut pending = Some(first);
            while let Some(notification) = pending {
                completed |= matches!(notification, Notification::Complete);
                notification.accept(&mut *observer);
                pending = lock(&self.inner.deferred).pop_front();
            }
        }
        drop(observer);

        if completed {
            self.unsubscribe();
        }
    }

    pub fn add(&self, teardown: impl Into<Teardown>) {
        self.inner.subscription.add(teardown);
    }

    pub fn unsubscribe(&self) {
        self.inner.subscription.unsubscribe();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// True once `unsubscribe` has run
    pub fn is_closed(&self) -> bool {
        self.inner.subscription.is_closed()
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The teardown registry owned by this subscriber
    pub fn subscription(&self) -> &Subscription {
        &self.inner.subscription
    }
}

impl<T: Send> Observer<T> for Subscriber<T> {
    fn next(&mut self, value: T) {
        Subscriber::next(self, value)
    }

    fn error(&mut self, err: StreamError) {
        Subscriber::error(self, err)
    }

    fn complete(&mut self) {
        Subscriber::complete(self)
    }
}

impl<T: Send> Unsubscribable for Subscriber<T> {
    fn unsubscribe(&self) {
        Subscriber::unsubscribe(self)
    }
}

impl<T: Send + 'static> From<Subscriber<T>> for Teardown {
    fn from(subscriber: Subscriber<T>) -> Self {
        Teardown::unsubscribable(subscriber)
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("label", &self.inner.label)
            .field("stopped", &self.is_stopped())
            .field("subscription", &self.inner.subscription)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::PartialObserver;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn error_does_not_run_teardowns() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let subscriber = Subscriber::<i32>::new(PartialObserver::new(), "test");
        let t = torn_down.clone();
        subscriber.add(Teardown::action(move || {
            t.fetch_add(1, Ordering::SeqCst);
        }));

        subscriber.error(StreamError::custom("boom"));
        assert!(subscriber.is_stopped());
        assert!(!subscriber.is_closed());
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);

        subscriber.unsubscribe();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn complete_runs_teardowns() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let subscriber = Subscriber::<i32>::new(PartialObserver::new(), "test");
        let t = torn_down.clone();
        subscriber.add(Teardown::action(move || {
            t.fetch_add(1, Ordering::SeqCst);
        }));

        subscriber.complete();
        assert!(subscriber.is_closed());
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn values_after_error_are_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let subscriber = Subscriber::new(
            PartialObserver::next(move |v: i32| s.lock().unwrap().push(v)),
            "test",
        );

        subscriber.next(1);
        subscriber.error(StreamError::Cancelled);
        subscriber.next(2);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn debug_includes_label() {
        let subscriber = Subscriber::<()>::new(PartialObserver::new(), "debug-me");
        assert!(format!("{:?}", subscriber).contains("debug-me"));
    }
}
