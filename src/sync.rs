//! # Synchronization Primitives
//!
//! Interrupt-safe critical section used as the task-registry lock.
//! Masking interrupts around the critical section keeps a nested
//! scheduling or timer interrupt from observing a half-updated registry;
//! entering never blocks, so the lock is usable from interrupt context.

use cortex_m::interrupt;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Every registry access (scan, insertion, removal, state transitions)
/// goes through here. Task bodies are executed *outside* the critical
/// section, since a body may call back into the scheduling API.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|_cs| {
///     // Registry access
/// });
/// ```
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
