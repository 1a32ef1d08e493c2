//! Error types for rx-lite
//!
//! A stream has a single error channel. Whatever is passed to
//! `Subscriber::error` is a `StreamError`; it is terminal and travels
//! unchanged through every operator.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Arbitrary user error carried through the stream without losing its type
#[derive(Clone)]
pub struct ErrorPayload(Arc<dyn Error + Send + Sync + 'static>);

impl ErrorPayload {
    pub fn new<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        ErrorPayload(Arc::new(err))
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn get(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Two payloads are equal when they are the same error instance
impl PartialEq for ErrorPayload {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ErrorPayload {}

/// Error payload carried by the stream error channel
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Error raised by user code with a message
    #[error("Stream error: {0}")]
    Custom(String),
    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,
    /// A timer or task needed a tokio runtime and none was running
    #[error("No tokio runtime available")]
    NoRuntime,
    /// Error coming out of a bridged source (an async stream, a task, ...)
    #[error("Source error: {0}")]
    Source(String),
    /// User error kept as-is, see `StreamError::payload`
    #[error("{0}")]
    Payload(ErrorPayload),
}

impl StreamError {
    /// Shorthand for `StreamError::Custom`
    pub fn custom(msg: impl Into<String>) -> Self {
        StreamError::Custom(msg.into())
    }

    /// Wrap a user error so observers can recover its concrete type
    pub fn payload<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        StreamError::Payload(ErrorPayload::new(err))
    }

    /// The wrapped user error, if this is a `Payload` of type `E`
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            StreamError::Payload(payload) => payload.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Source(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StreamError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        StreamError::Timeout
    }
}

impl From<tokio::runtime::TryCurrentError> for StreamError {
    fn from(_: tokio::runtime::TryCurrentError) -> Self {
        StreamError::NoRuntime
    }
}

/// Result type for fallible rx-lite calls
pub type StreamResult<T> = Result<T, StreamError>;
