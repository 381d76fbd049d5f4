//! Coordination primitives shared by the handoff buffer.

mod count_gate;

pub use count_gate::{AcquireFuture, ClosePolicy, CountGate, TryAcquire};
