//! Bridging observables and async streams
//!
//! `Observable::into_stream` turns a push source into a pull-based
//! `futures` stream; `from_stream` and `from_try_stream` drive an async
//! stream into subscribers on a tokio task.

use crate::error::{StreamError, StreamResult};
use crate::observable::Observable;
use crate::observer::{Notification, Observer};
use crate::subscriber::Subscriber;
use crate::subscription::Teardown;
use async_stream::stream;
use futures_core::Stream;
use futures_util::stream::{BoxStream, StreamExt};
use futures_util::pin_mut;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

struct ChannelObserver<T> {
    tx: UnboundedSender<Notification<T>>,
}

impl<T: Send> Observer<T> for ChannelObserver<T> {
    fn next(&mut self, value: T) {
        let _ = self.tx.send(Notification::Next(value));
    }

    fn error(&mut self, err: StreamError) {
        let _ = self.tx.send(Notification::Error(err));
    }

    fn complete(&mut self) {
        let _ = self.tx.send(Notification::Complete);
    }
}

struct UnsubscribeOnDrop<T>(Subscriber<T>);

impl<T> Drop for UnsubscribeOnDrop<T> {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Subscribe now and expose the notifications as a stream.
    ///
    /// Values arrive as `Ok`, an error arrives as a single `Err` and ends the
    /// stream, completion ends it. Values are buffered without bound until
    /// polled. Dropping the stream unsubscribes.
    pub fn into_stream(self) -> BoxStream<'static, StreamResult<T>> {
        let (tx, mut rx) = unbounded_channel();
        let guard = UnsubscribeOnDrop(self.subscribe(ChannelObserver { tx }));

        stream! {
            let _guard = guard;
            while let Some(notification) = rx.recv().await {
                match notification {
                    Notification::Next(value) => yield Ok(value),
                    Notification::Error(err) => {
                        yield Err(err);
                        break;
                    }
                    Notification::Complete => break,
                }
            }
        }
        .boxed()
    }
}

/// Observable over an async stream built by `factory`.
///
/// Every subscription calls `factory` on a fresh tokio task and forwards
/// each item, completing when the stream ends. Unsubscribing aborts the
/// task. Subscribing outside a runtime errors with `StreamError::NoRuntime`.
pub fn from_stream<T, S, F>(factory: F) -> Observable<T>
where
    T: Send + 'static,
    S: Stream<Item = T> + Send + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    from_try_stream(move || factory().map(Ok))
}

/// Like `from_stream`, but an `Err` item is delivered as the stream error and
/// ends the subscription.
pub fn from_try_stream<T, S, F>(factory: F) -> Observable<T>
where
    T: Send + 'static,
    S: Stream<Item = StreamResult<T>> + Send + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    let factory = Arc::new(factory);
    Observable::with_label("from_stream", move |subscriber: Subscriber<T>| {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("[{}] cannot drive stream: {}", subscriber.label(), e);
                subscriber.error(e.into());
                return Teardown::Empty;
            }
        };

        let factory = Arc::clone(&factory);
        let target = subscriber.clone();
        let task = handle.spawn(async move {
            let source = factory();
            pin_mut!(source);
            while let Some(item) = source.next().await {
                if target.is_stopped() || target.is_closed() {
                    return;
                }
                match item {
                    Ok(value) => target.next(value),
                    Err(err) => {
                        target.error(err);
                        return;
                    }
                }
            }
            target.complete();
        });

        Teardown::action(move || task.abort())
    })
}
