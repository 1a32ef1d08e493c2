use rx_lite::{
    empty, from_iter, never, of, throw_error, Notification, Observable, Observer, PartialObserver,
    StreamError, Subscriber, SubscriptionConfig, Teardown, TeardownPolicy, DEFAULT_LABEL,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Observer that records every notification it receives
struct Recorder<T> {
    events: Arc<Mutex<Vec<Notification<T>>>>,
}

impl<T: Send> Observer<T> for Recorder<T> {
    fn next(&mut self, value: T) {
        self.events.lock().unwrap().push(Notification::Next(value));
    }

    fn error(&mut self, err: StreamError) {
        self.events.lock().unwrap().push(Notification::Error(err));
    }

    fn complete(&mut self) {
        self.events.lock().unwrap().push(Notification::Complete);
    }
}

fn recorder<T>() -> (Recorder<T>, Arc<Mutex<Vec<Notification<T>>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    (Recorder { events: events.clone() }, events)
}

fn one_two_three() -> Observable<i32> {
    Observable::new(|s: Subscriber<i32>| {
        s.next(1);
        s.next(2);
        s.next(3);
        s.complete();
    })
}

#[test]
fn test_synchronous_values_arrive_before_subscribe_returns() {
    let (observer, events) = recorder();
    one_two_three().subscribe(observer);

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            Notification::Next(1),
            Notification::Next(2),
            Notification::Next(3),
            Notification::Complete,
        ]
    );
}

#[test]
fn test_each_subscription_runs_the_producer() {
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    let source = Observable::new(move |s: Subscriber<i32>| {
        r.fetch_add(1, Ordering::SeqCst);
        for v in 1..=3 {
            s.next(v);
        }
        s.complete();
    });

    let (first, first_events) = recorder();
    let (second, second_events) = recorder();
    source.subscribe(first);
    source.subscribe(second);

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(*first_events.lock().unwrap(), *second_events.lock().unwrap());
    assert_eq!(first_events.lock().unwrap().len(), 4);
}

#[test]
fn test_next_after_complete_is_dropped() {
    let source = Observable::new(|s: Subscriber<i32>| {
        s.next(1);
        s.complete();
        s.next(2);
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    source.subscribe(PartialObserver::next(move |_: i32| {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_next_only_observer_ignores_terminal_events() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let s = seen.clone();
    let errored = throw_error::<i32>(StreamError::custom("boom"))
        .subscribe(PartialObserver::next(move |v: i32| s.lock().unwrap().push(v)));
    assert!(errored.is_stopped());

    let s = seen.clone();
    let completed = empty::<i32>().subscribe(PartialObserver::next(move |v: i32| s.lock().unwrap().push(v)));
    assert!(completed.is_stopped());
    assert!(completed.is_closed());

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_producer_teardown_runs_on_unsubscribe() {
    let torn_down = Arc::new(AtomicUsize::new(0));
    let t = torn_down.clone();
    let source = Observable::new(move |_s: Subscriber<i32>| {
        let t = t.clone();
        Teardown::action(move || {
            t.fetch_add(1, Ordering::SeqCst);
        })
    });

    let subscriber = source.subscribe(PartialObserver::new());
    assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    subscriber.unsubscribe();
    subscriber.unsubscribe();
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}

#[test]
fn test_teardown_of_synchronously_completed_producer_still_runs() {
    let torn_down = Arc::new(AtomicUsize::new(0));
    let t = torn_down.clone();
    let source = Observable::new(move |s: Subscriber<i32>| {
        s.complete();
        let t = t.clone();
        Teardown::action(move || {
            t.fetch_add(1, Ordering::SeqCst);
        })
    });

    source.subscribe(PartialObserver::new());
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}

#[test]
fn test_error_does_not_tear_down_but_complete_does() {
    let torn_down = Arc::new(AtomicUsize::new(0));

    let t = torn_down.clone();
    let failing = Observable::new(move |s: Subscriber<i32>| {
        s.error(StreamError::Cancelled);
        let t = t.clone();
        Teardown::action(move || {
            t.fetch_add(1, Ordering::SeqCst);
        })
    });
    let subscriber = failing.subscribe(PartialObserver::new());
    assert!(subscriber.is_stopped());
    assert_eq!(torn_down.load(Ordering::SeqCst), 0);

    subscriber.unsubscribe();
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}

#[test]
fn test_labels() {
    assert_eq!(one_two_three().label(), DEFAULT_LABEL);

    let labelled = Observable::with_label("sensor", |s: Subscriber<u8>| s.complete());
    let subscriber = labelled.subscribe(PartialObserver::new());
    assert_eq!(labelled.label(), "sensor");
    assert_eq!(subscriber.label(), "sensor");
}

#[test]
fn test_subscription_config_reaches_subscribers() {
    let source = never::<i32>().with_subscription_config(SubscriptionConfig::isolating());
    let subscriber = source.subscribe(PartialObserver::new());
    assert_eq!(
        subscriber.subscription().config().teardown_policy,
        TeardownPolicy::Isolate
    );
}

#[test]
fn test_observer_can_unsubscribe_mid_stream() {
    let slot: Arc<Mutex<Option<Subscriber<i32>>>> = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));

    // The producer publishes its subscriber before emitting, so the observer
    // can cancel from inside its own callback.
    let publish = slot.clone();
    let source = Observable::new(move |s: Subscriber<i32>| {
        *publish.lock().unwrap() = Some(s.clone());
        for v in 0..10 {
            if s.is_closed() {
                break;
            }
            s.next(v);
        }
    });

    let cancel = slot.clone();
    let s = seen.clone();
    source.subscribe(PartialObserver::next(move |v: i32| {
        s.lock().unwrap().push(v);
        if v == 2 {
            if let Some(sub) = cancel.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        }
    }));

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_constructors() {
    let (observer, events) = recorder();
    of("hello").subscribe(observer);
    assert_eq!(
        *events.lock().unwrap(),
        vec![Notification::Next("hello"), Notification::Complete]
    );

    let (observer, events) = recorder();
    from_iter(vec![1, 2]).subscribe(observer);
    assert_eq!(
        *events.lock().unwrap(),
        vec![Notification::Next(1), Notification::Next(2), Notification::Complete]
    );

    let (observer, events) = recorder::<i32>();
    let subscriber = never::<i32>().subscribe(observer);
    assert!(events.lock().unwrap().is_empty());
    assert!(!subscriber.is_stopped());

    let (observer, events) = recorder::<i32>();
    throw_error(StreamError::Timeout).subscribe(observer);
    assert_eq!(*events.lock().unwrap(), vec![Notification::Error(StreamError::Timeout)]);
}
