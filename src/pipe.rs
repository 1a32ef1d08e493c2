//! Operator composition
//!
//! An `Operator` is a function from `Observable<I>` to `Observable<O>`.
//! Operators chain with `compose`, observables apply them with
//! `Observable::pipe`, and `pipe_from_array` folds any number of unary
//! functions into one.

use crate::observable::Observable;
use std::sync::Arc;

/// A shareable unary function
pub type UnaryFn<A> = Arc<dyn Fn(A) -> A + Send + Sync + 'static>;

/// Fold a list of unary functions into a single function.
///
/// No functions gives the identity, a single function is handed back as is,
/// otherwise the input runs through every function left to right.
pub fn pipe_from_array<A>(fns: Vec<UnaryFn<A>>) -> UnaryFn<A>
where
    A: 'static,
{
    match fns.len() {
        0 => Arc::new(|input| input),
        1 => fns.into_iter().next().unwrap_or_else(|| Arc::new(|input| input)),
        _ => Arc::new(move |input| fns.iter().fold(input, |acc, f| f(acc))),
    }
}

/// Recipe for deriving one observable from another.
///
/// Applying an operator does not subscribe to anything: it wraps the source
/// in a new cold observable, and the operator's per-subscription state only
/// comes to life when that observable is subscribed. The same operator can
/// therefore be applied to many sources.
pub struct Operator<I, O> {
    build: Arc<dyn Fn(Observable<I>) -> Observable<O> + Send + Sync + 'static>,
}

impl<I, O> Clone for Operator<I, O> {
    fn clone(&self) -> Self {
        Operator {
            build: Arc::clone(&self.build),
        }
    }
}

impl<I, O> Operator<I, O> {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(Observable<I>) -> Observable<O> + Send + Sync + 'static,
    {
        Operator { build: Arc::new(build) }
    }

    /// Wrap `source`; see `Observable::pipe`
    pub fn apply(&self, source: Observable<I>) -> Observable<O> {
        (self.build)(source)
    }
}

impl<T: 'static> Operator<T, T> {
    /// Element type preserving operators fit `pipe_from_array`
    pub fn into_fn(self) -> UnaryFn<Observable<T>> {
        self.build
    }

    pub fn from_fn(build: UnaryFn<Observable<T>>) -> Self {
        Operator { build }
    }
}

/// `first` then `second`, as one operator
pub fn compose<I, M, O>(first: Operator<I, M>, second: Operator<M, O>) -> Operator<I, O>
where
    I: 'static,
    M: 'static,
    O: 'static,
{
    Operator::new(move |source| second.apply(first.apply(source)))
}

/// Hands the source back untouched
pub fn identity<T>() -> Operator<T, T>
where
    T: 'static,
{
    Operator::new(|source| source)
}

/// Method form of `compose`, for building chains left to right
pub trait OperatorExt<I, O> {
    fn compose<P>(self, next: Operator<O, P>) -> Operator<I, P>
    where
        P: 'static;
}

impl<I, O> OperatorExt<I, O> for Operator<I, O>
where
    I: 'static,
    O: 'static,
{
    fn compose<P>(self, next: Operator<O, P>) -> Operator<I, P>
    where
        P: 'static,
    {
        compose(self, next)
    }
}

/// Chain any number of operators onto an observable.
///
/// `pipe!(source)` is a clone of `source`; `pipe!(source, a, b)` is
/// `source.pipe(a).pipe(b)`. Operators may change the item type.
#[macro_export]
macro_rules! pipe {
    ($source:expr $(,)?) => {
        ::std::clone::Clone::clone(&$source)
    };
    ($source:expr, $($op:expr),+ $(,)?) => {{
        let observable = ::std::clone::Clone::clone(&$source);
        $(
            let observable = observable.pipe($op);
        )+
        observable
    }};
}
