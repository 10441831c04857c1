//! Runtime instrumentation for the admission protocol.
//!
//! Every list embeds an [`ActivityGauge`] that tracks how many threads of
//! each operation class are inside the list at once. The gauge never blocks
//! and never influences admission; it exists so that tests and stress
//! harnesses can check the class-exclusion contract against a real
//! execution instead of trusting the protocol by inspection.

pub use self::gauge::ActivityGauge;
mod gauge;
