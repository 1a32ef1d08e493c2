//! Ready-made observables

use crate::bridge::from_stream;
use crate::error::StreamError;
use crate::observable::Observable;
use crate::subscriber::Subscriber;
use futures_util::StreamExt;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;

/// Emit a single value, then complete
pub fn of<T>(value: T) -> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    Observable::with_label("of", move |subscriber: Subscriber<T>| {
        subscriber.next(value.clone());
        subscriber.complete();
    })
}

/// Emit every item of `iterable`, then complete.
///
/// The iterable is cloned for each subscription. Emission stops early if
/// the subscriber is unsubscribed from inside one of its callbacks.
pub fn from_iter<I>(iterable: I) -> Observable<I::Item>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::Item: 'static,
{
    Observable::with_label("from_iter", move |subscriber: Subscriber<I::Item>| {
        for item in iterable.clone() {
            if subscriber.is_stopped() || subscriber.is_closed() {
                return;
            }
            subscriber.next(item);
        }
        subscriber.complete();
    })
}

/// Complete immediately without emitting
pub fn empty<T: 'static>() -> Observable<T> {
    Observable::with_label("empty", |subscriber: Subscriber<T>| subscriber.complete())
}

/// Never emit and never terminate
pub fn never<T: 'static>() -> Observable<T> {
    Observable::with_label("never", |_subscriber: Subscriber<T>| {})
}

/// Fail immediately with `err`
pub fn throw_error<T: 'static>(err: StreamError) -> Observable<T> {
    Observable::with_label("throw_error", move |subscriber: Subscriber<T>| {
        subscriber.error(err.clone())
    })
}

/// Emit 0, 1, 2, ... every `period`, starting one period after subscribing.
/// Runs on tokio. A zero period errors on subscribe.
pub fn interval(period: Duration) -> Observable<u64> {
    if period.is_zero() {
        return throw_error(StreamError::custom("interval period must be non-zero"));
    }
    from_stream(move || {
        let start = tokio::time::Instant::now() + period;
        IntervalStream::new(tokio::time::interval_at(start, period))
            .enumerate()
            .map(|(tick, _)| tick as u64)
    })
}
