//! # Timebase and Deferred-Work Ports
//!
//! The scheduler consumes platform time through two narrow traits rather
//! than talking to hardware directly. The Cortex-M4 port in `arch`
//! implements both over SysTick; unit tests substitute in-memory fakes.

/// Monotonic hardware-clock unit. Conversions to and from microseconds
/// are specific to the configured clock source.
pub type Tick = u64;

/// A monotonic tick source.
pub trait Clock {
    /// Current tick. Callable from interrupt context, never blocks.
    fn now(&self) -> Tick;

    /// Convert a microsecond duration to ticks for this clock source.
    fn us_to_ticks(&self, us: u64) -> Tick;
}

/// One-shot "call the dispatcher back at tick T" primitive.
///
/// The callback must re-enter the dispatcher no earlier than the given
/// absolute tick. Arming replaces any previously armed wake.
pub trait DeferredWork {
    fn arm_at(&self, tick: Tick);
}
