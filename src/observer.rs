//! Observer capability set
//!
//! An observer may react to any subset of `next`, `error` and `complete`.
//! The trait methods default to no-ops, so a missing capability is simply
//! ignored.

use crate::error::StreamError;
use std::fmt;

pub trait Observer<T>: Send {
    fn next(&mut self, _value: T) {}

    fn error(&mut self, _err: StreamError) {}

    fn complete(&mut self) {}
}

impl<T, O> Observer<T> for Box<O>
where
    O: Observer<T> + ?Sized,
{
    fn next(&mut self, value: T) {
        (**self).next(value)
    }

    fn error(&mut self, err: StreamError) {
        (**self).error(err)
    }

    fn complete(&mut self) {
        (**self).complete()
    }
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(StreamError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Observer assembled from optional callbacks
///
/// ```
/// use rx_lite::PartialObserver;
///
/// let observer = PartialObserver::<i32>::next(|v| println!("got {}", v))
///     .on_complete(|| println!("done"));
/// ```
pub struct PartialObserver<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> PartialObserver<T> {
    /// An observer with no callbacks at all
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// An observer that only handles values
    pub fn next<F>(f: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::new().on_next(f)
    }

    pub fn on_next<F>(mut self, f: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.next = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(StreamError) + Send + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_complete(&self) -> bool {
        self.complete.is_some()
    }
}

impl<T> Default for PartialObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PartialObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialObserver")
            .field("next", &self.has_next())
            .field("error", &self.has_error())
            .field("complete", &self.has_complete())
            .finish()
    }
}

impl<T> Observer<T> for PartialObserver<T> {
    fn next(&mut self, value: T) {
        if let Some(f) = self.next.as_mut() {
            f(value);
        }
    }

    fn error(&mut self, err: StreamError) {
        if let Some(f) = self.error.as_mut() {
            f(err);
        }
    }

    fn complete(&mut self) {
        if let Some(f) = self.complete.as_mut() {
            f();
        }
    }
}

/// A materialized stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

impl<T> Notification<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Next(_))
    }

    /// Deliver this event to an observer
    pub fn accept<O>(self, observer: &mut O)
    where
        O: Observer<T> + ?Sized,
    {
        match self {
            Notification::Next(v) => observer.next(v),
            Notification::Error(e) => observer.error(e),
            Notification::Complete => observer.complete(),
        }
    }
}
