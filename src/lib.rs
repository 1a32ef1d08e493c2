//! rx-lite: a minimal push-based reactive stream library.
//!
//! An [`Observable`] is a lazy producer of values. Subscribing with an
//! [`Observer`] runs the producer against a fresh [`Subscriber`], which
//! enforces terminal-event rules and owns the teardowns of the
//! subscription. Operators such as [`map`] and [`debounce_time`] are
//! chained with [`Observable::pipe`].
//!
//! ```
//! use rx_lite::{from_iter, map, PartialObserver};
//!
//! from_iter(vec![1, 2, 3])
//!     .pipe(map(|x: i32, _| x * 10))
//!     .subscribe(PartialObserver::next(|v: i32| println!("{}", v)));
//! ```

pub mod bridge;
pub mod constructors;
pub mod error;
pub mod observable;
pub mod observer;
pub mod operators;
pub mod pipe;
pub mod scheduler;
pub mod stream_configuration;
pub mod subscriber;
pub mod subscription;

pub use bridge::{from_stream, from_try_stream};
pub use constructors::{empty, from_iter, interval, never, of, throw_error};
pub use error::{ErrorPayload, StreamError, StreamResult};
pub use observable::{Observable, DEFAULT_LABEL};
pub use observer::{Notification, Observer, PartialObserver};
pub use operators::{debounce_time, debounce_time_on, debounce_with_config, map};
pub use pipe::{compose, identity, pipe_from_array, Operator, OperatorExt, UnaryFn};
pub use scheduler::{CancelToken, Scheduler, Task, TokioScheduler, VirtualScheduler};
pub use stream_configuration::{DebounceConfig, SubscriptionConfig, TeardownPolicy};
pub use subscriber::Subscriber;
pub use subscription::{Subscription, Teardown, Unsubscribable};
