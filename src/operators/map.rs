use crate::error::StreamError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::pipe::Operator;
use crate::subscriber::Subscriber;
use std::sync::Arc;

struct MapObserver<R, F> {
    downstream: Subscriber<R>,
    project: Arc<F>,
    index: usize,
}

impl<T, R, F> Observer<T> for MapObserver<R, F>
where
    F: Fn(T, usize) -> R + Send + Sync,
    R: Send,
{
    fn next(&mut self, value: T) {
        let index = self.index;
        self.index += 1;
        self.downstream.next((self.project)(value, index));
    }

    fn error(&mut self, err: StreamError) {
        self.downstream.error(err);
    }

    fn complete(&mut self) {
        self.downstream.complete();
    }
}

/// Create an operator that applies `project` to every value.
///
/// `project` also receives the position of the value within the current
/// subscription, starting at 0. Errors and completion pass through
/// untouched, and unsubscribing downstream unsubscribes upstream.
pub fn map<T, R, F>(project: F) -> Operator<T, R>
where
    F: Fn(T, usize) -> R + Send + Sync + 'static,
    T: Send + 'static,
    R: Send + 'static,
{
    let project = Arc::new(project);
    Operator::new(move |upstream: Observable<T>| {
        let project = Arc::clone(&project);
        Observable::with_label("map", move |downstream: Subscriber<R>| {
            upstream.subscribe(MapObserver {
                downstream,
                project: Arc::clone(&project),
                index: 0,
            })
        })
    })
}
