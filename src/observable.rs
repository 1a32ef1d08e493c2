//! Observable: a lazy, re-runnable producer of values
//!
//! An `Observable` holds nothing but its producer and a label. Each call to
//! `subscribe` builds a new `Subscriber` and runs the producer again from
//! scratch, so observables are always cold.

use crate::observer::Observer;
use crate::pipe::{pipe_from_array, Operator};
use crate::stream_configuration::SubscriptionConfig;
use crate::subscriber::Subscriber;
use crate::subscription::Teardown;
use std::fmt;
use std::sync::Arc;

/// Label given to observables built without one
pub const DEFAULT_LABEL: &str = "user";

type Producer<T> = Arc<dyn Fn(Subscriber<T>) -> Teardown + Send + Sync + 'static>;

pub struct Observable<T> {
    producer: Producer<T>,
    label: Arc<str>,
    config: SubscriptionConfig,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Arc::clone(&self.producer),
            label: Arc::clone(&self.label),
            config: self.config.clone(),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Create an observable from a producer.
    ///
    /// The producer runs once per subscription, receives the subscriber to
    /// emit into and returns whatever must run on unsubscribe (a `Teardown`,
    /// a `Subscription`, a `Subscriber`, a boxed closure, or `()`).
    ///
    /// ```
    /// use rx_lite::{Observable, PartialObserver, Subscriber};
    ///
    /// let numbers = Observable::new(|subscriber: Subscriber<i32>| {
    ///     subscriber.next(1);
    ///     subscriber.next(2);
    ///     subscriber.complete();
    /// });
    /// numbers.subscribe(PartialObserver::next(|v: i32| println!("{}", v)));
    /// ```
    pub fn new<F, R>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> R + Send + Sync + 'static,
        R: Into<Teardown>,
    {
        Self::with_label(DEFAULT_LABEL, producer)
    }

    pub fn with_label<F, R>(label: impl Into<Arc<str>>, producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> R + Send + Sync + 'static,
        R: Into<Teardown>,
    {
        Observable {
            producer: Arc::new(move |subscriber| producer(subscriber).into()),
            label: label.into(),
            config: SubscriptionConfig::default(),
        }
    }

    /// Subscribers created by this observable use `config`
    pub fn with_subscription_config(mut self, config: SubscriptionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the producer against `observer`.
    ///
    /// Anything the producer emits synchronously reaches the observer before
    /// this returns. The returned subscriber cancels the subscription.
    pub fn subscribe<O>(&self, observer: O) -> Subscriber<T>
    where
        O: Observer<T> + 'static,
    {
        let subscriber = Subscriber::with_config(observer, self.label.as_ref(), self.config.clone());
        log::trace!("[{}] subscribe", self.label);
        let teardown = (self.producer)(subscriber.clone());
        subscriber.add(teardown);
        subscriber
    }

    /// Apply an operator, producing a new observable
    pub fn pipe<R>(&self, operator: Operator<T, R>) -> Observable<R> {
        operator.apply(self.clone())
    }

    /// Apply a list of same-typed operators in order
    pub fn pipe_all(&self, operators: Vec<Operator<T, T>>) -> Observable<T> {
        let fns = operators.into_iter().map(Operator::into_fn).collect();
        pipe_from_array(fns)(self.clone())
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("label", &self.label)
            .finish()
    }
}
