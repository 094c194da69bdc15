//! Core traits defined in `socialhub-core` and implemented by other crates.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
