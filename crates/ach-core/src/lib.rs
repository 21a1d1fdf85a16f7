//! Effect abstractions shared by every crate in the gateway: clock and
//! metrics. Nothing in here knows about ACH, NACHA, or transfers — it exists
//! purely so the pipeline crates can be tested without touching a real clock
//! or metrics backend.

pub mod clock;
pub mod metrics;

pub use clock::{Clock, FixedClock, SystemClock};
pub use metrics::{InMemoryMetrics, Metrics};
