//! Operators: factories returning observable-to-observable transforms

pub mod debounce;
pub mod map;

pub use debounce::{debounce_time, debounce_time_on, debounce_with_config};
pub use map::map;
