//! # TempOS Configuration
//!
//! Compile-time constants governing the scheduler and the demo platform.
//! All limits are fixed at compile time — no dynamic allocation.

use crate::time::Tick;

/// Maximum number of tasks the scheduler can manage simultaneously.
/// This bounds the static task-slot array. Audio pipelines on the target
/// class of DSP run a handful of periodic tasks, so the registry stays
/// small and a full linear scan per dispatch is cheap.
pub const MAX_TASKS: usize = 8;

/// Scheduler timebase frequency in Hz. One tick is 100 µs, fine enough
/// to place 1 ms audio periods without audible jitter.
pub const TICK_HZ: u32 = 10_000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Number of slot-advance attempts made when repairing a missed deadline
/// before giving up on cadence alignment and restarting relative to the
/// current tick. Bounds the repair loop for interrupt context.
pub const SLOT_ALIGN_TRIES: u32 = 10;

/// Scheduling overhead in ticks, subtracted when deriving a periodic
/// task's next start from its previous one so that back-to-back periods
/// do not drift late by the dispatcher's own cost.
pub const SCHEDULE_COST_TICKS: Tick = 1;
