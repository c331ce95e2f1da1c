//! # Kernel
//!
//! Top-level initialization and the public scheduling API for TempOS.
//!
//! This module owns the process-wide scheduler instance and wraps every
//! scheduler operation in the registry critical section. Pipeline
//! components use only this surface: `create_task`, `free_task`,
//! `admit`, `delete`, `complete`, `trigger`, plus the `task_state` and
//! `stats` observers.
//!
//! ## Control flow
//!
//! ```text
//! admit(task, start, deadline)            any context
//!   └─► registry update (critical section)
//!   └─► trigger()  ── pends the scheduling interrupt
//!         └─► scheduler_run()             interrupt context
//!               ├─► Scheduler::dispatch() (critical section)
//!               ├─► run chosen body       (outside the lock)
//!               └─► arm deferred wake for the next candidate
//! ```

use core::ptr::NonNull;

use crate::arch::cortex_m4;
use crate::scheduler::{Dispatch, ScheduleError, Scheduler, SchedulerStats};
use crate::sync;
use crate::task::{Runnable, TaskId, TaskState};

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// SysTick-backed ports the system scheduler is built over.
static CLOCK: cortex_m4::SysTickClock = cortex_m4::SysTickClock;
static WAKE: cortex_m4::SysTickWake = cortex_m4::SysTickWake;

/// Global scheduler instance, constructed by `init()`.
///
/// # Safety
/// Accessed via `SCHEDULER_PTR`, which is published during `init()`.
/// All access happens inside critical sections or from the scheduling
/// interrupt (serialized by interrupt priority).
static mut SCHEDULER: Option<Scheduler<'static>> = None;

/// Raw pointer to the global scheduler for ISR-context access.
///
/// # Safety
/// Set once during `init()`, read afterwards.
static mut SCHEDULER_PTR: *mut Scheduler<'static> = core::ptr::null_mut();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the TempOS scheduler.
///
/// One-time, process-wide setup of the registry, its lock, the clock
/// wiring and the deferred-work port. Not reentrant; must run exactly
/// once, before any other API call, from the main thread.
pub fn init() {
    unsafe {
        let slot = core::ptr::addr_of_mut!(SCHEDULER);
        *slot = Some(Scheduler::new(&CLOCK, &WAKE));
        if let Some(sched) = (*slot).as_mut() {
            SCHEDULER_PTR = sched;
        }
    }

    // Scheduling interrupt runs at the lowest priority so dispatch never
    // preempts other ISRs.
    cortex_m4::set_interrupt_priorities();
}

/// Start the scheduler timebase and pend a first dispatch.
///
/// `init()` and task creation must have happened already; after this
/// call admitted tasks begin to run from the scheduling interrupt.
pub fn start(syst: &mut cortex_m::peripheral::SYST) {
    cortex_m4::configure_systick(syst);
    trigger();
}

/// Register a new task with the scheduler.
///
/// The runnable is the task's opaque body, invoked once per dispatch;
/// `max_rtime_us` is its worst-case run time, folded into selection as
/// the effective deadline. The task starts out unscheduled — admit it
/// with [`admit`] to give it a window.
pub fn create_task(
    runnable: &'static mut dyn Runnable,
    max_rtime_us: u64,
) -> Result<TaskId, ScheduleError> {
    let runnable = NonNull::from(runnable);
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).create_task(runnable, max_rtime_us) })
}

/// Release a task's slot once its owner is done with it.
/// Fails with [`ScheduleError::Busy`] while the task is running.
pub fn free_task(id: TaskId) -> Result<(), ScheduleError> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).free_task(id) })
}

/// Admit a task with a scheduling window and pend a dispatch so it is
/// considered promptly.
///
/// `start_us` is relative to the task's previous start (`0` = now);
/// `deadline_us` is relative to the new start. Admitting a running task
/// is ignored apart from a diagnostic trace.
pub fn admit(id: TaskId, start_us: u64, deadline_us: u64) {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).admit(id, start_us, deadline_us) });
    trigger();
}

/// Remove a task from the registry before it has run.
/// Fails with [`ScheduleError::Busy`] while the task is running.
pub fn delete(id: TaskId) -> Result<(), ScheduleError> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).delete(id) })
}

/// Mark a task completed and remove it from the registry. Idempotent;
/// normally called by the task's own body at the end of its work.
pub fn complete(id: TaskId) {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).complete(id) });
}

/// Current lifecycle state of a task. Owners poll this to detect an
/// unrecoverable overrun (`Cancelled`).
pub fn task_state(id: TaskId) -> TaskState {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).task_state(id) })
}

/// Diagnostic counters (dispatches, repaired misses, xruns).
pub fn stats() -> SchedulerStats {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).stats() })
}

/// Request a dispatch at the next opportunity.
///
/// Asynchronous: pends the scheduling interrupt rather than dispatching
/// inline, so it may be issued from any context. Re-raising is
/// idempotent; concurrent triggers coalesce into one dispatch.
pub fn trigger() {
    cortex_m4::trigger_schedule_irq();
}

// ---------------------------------------------------------------------------
// Scheduling interrupt body
// ---------------------------------------------------------------------------

/// One dispatch round; called from the scheduling interrupt handler.
///
/// Takes the dispatch decision under the registry lock, then acts on it
/// with the lock released: runs the chosen task body inline and arms the
/// deferred wake for the next candidate.
pub(crate) fn scheduler_run() {
    let decision = sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).dispatch() });
    cortex_m4::clear_schedule_irq();

    match decision {
        Dispatch::Idle => {}
        Dispatch::WakeAt(tick) => unsafe { (*SCHEDULER_PTR).arm_wake(tick) },
        Dispatch::Run {
            mut runnable,
            next_wake,
            ..
        } => {
            // The body runs without the lock held; it may call back into
            // this API (complete, admit) itself.
            unsafe { runnable.as_mut().run() };
            if let Some(tick) = next_wake {
                unsafe { (*SCHEDULER_PTR).arm_wake(tick) };
            }
        }
    }
}
