//! Live synchronization primitives: debouncing and mutation monitoring.

pub mod debounce;
pub mod monitor;

pub use debounce::*;
pub use monitor::*;
