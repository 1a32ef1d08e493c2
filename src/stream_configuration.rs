//! Configuration types for rx-lite subscriptions and operators

use std::time::Duration;

/// What a `Subscription` does when one of its teardowns panics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeardownPolicy {
    /// The panic propagates immediately; teardowns after it never run
    #[default]
    FailFast,
    /// Every teardown runs; failures are logged and the first panic is
    /// resumed once the whole registry has been drained
    Isolate,
}

/// Subscription configuration
#[derive(Debug, Clone, Default)]
pub struct SubscriptionConfig {
    pub teardown_policy: TeardownPolicy,
}

impl SubscriptionConfig {
    pub fn isolating() -> Self {
        Self {
            teardown_policy: TeardownPolicy::Isolate,
        }
    }
}

/// Configuration for the debounce operator
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet period after the last value before it is emitted
    pub delay: Duration,
    /// Emit a value still waiting for its window when upstream completes.
    /// Off by default: completion drops the pending value.
    pub flush_on_complete: bool,
}

impl DebounceConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn flush_on_complete(mut self, flush: bool) -> Self {
        self.flush_on_complete = flush;
        self
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            flush_on_complete: false,
        }
    }
}
