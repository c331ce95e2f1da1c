//! # EDF Scheduler Core
//!
//! Earliest-Deadline-First selection, deadline-miss recovery, and the
//! dispatch decision procedure for TempOS.
//!
//! ## Scheduling Algorithm
//!
//! Each time the scheduling interrupt fires:
//! 1. **Scan the registry** under the lock: among `Queued` tasks whose
//!    effective deadline (`deadline - max_rtime`) is still ahead of the
//!    current tick, pick the one closest to its deadline.
//! 2. **Repair misses** found during the same scan: the first task whose
//!    effective deadline has already passed is rescheduled onto a later
//!    window; any further miss in the same scan is cancelled outright.
//!    One repair per pass bounds recovery work in interrupt context —
//!    multiple simultaneous misses mean overload, and that work is shed.
//! 3. **Decide**: nothing eligible → idle; candidate not yet due → arm a
//!    deferred wake at its start tick; candidate due → mark it `Running`,
//!    rewrite its `start` to the current tick, and hand the body to the
//!    caller to execute *outside* the lock, together with the follow-up
//!    candidate's start tick so the caller can arm the next wake without
//!    a second full dispatch.
//!
//! All methods assume the caller holds the registry lock (`kernel.rs`
//! wraps every call in a critical section); none of them block, and task
//! bodies never run with the lock held, since a body may call back into
//! the scheduling API.

use core::ptr::NonNull;

use crate::config::{MAX_TASKS, SCHEDULE_COST_TICKS, SLOT_ALIGN_TRIES};
use crate::task::{Runnable, TaskId, TaskSlot, TaskState};
use crate::time::{Clock, DeferredWork, Tick};

// ---------------------------------------------------------------------------
// Errors and decisions
// ---------------------------------------------------------------------------

/// Scheduling API failures. Everything here is recoverable; the scheduler
/// never aborts the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// The task is currently running; retry once it has completed.
    Busy,
    /// All task slots are in use.
    Capacity,
}

/// Outcome of one dispatch pass. The caller (the scheduling interrupt
/// handler) acts on this after releasing the registry lock.
#[derive(Debug, Clone, Copy)]
pub enum Dispatch {
    /// No eligible task in the registry.
    Idle,
    /// The best candidate's start time is still in the future; arm the
    /// deferred-work port to re-trigger the dispatcher at this tick.
    WakeAt(Tick),
    /// A task is due now and has been marked `Running`. The caller must
    /// invoke `runnable` outside the lock, then arm `next_wake` if some
    /// follow-up candidate exists.
    Run {
        id: TaskId,
        runnable: NonNull<dyn Runnable>,
        next_wake: Option<Tick>,
    },
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Counters exposed to operators. `xruns` is the unrecoverable-miss
/// signal the owning pipeline propagates toward its consumer.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerStats {
    /// Dispatch passes taken.
    pub dispatches: u32,
    /// Deadline misses repaired by rescheduling.
    pub deadline_misses: u32,
    /// Tasks cancelled after an unrecoverable miss.
    pub xruns: u32,
}

impl SchedulerStats {
    pub const fn new() -> Self {
        Self {
            dispatches: 0,
            deadline_misses: 0,
            xruns: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The scheduler state: task registry, diagnostics, and the platform
/// ports it consumes. Explicitly constructed (one instance per system at
/// runtime, any number in unit tests) and shared behind the registry
/// lock owned by `kernel.rs`.
pub struct Scheduler<'a> {
    /// Fixed-size task registry, scanned linearly each dispatch.
    tasks: [TaskSlot; MAX_TASKS],

    /// Diagnostic counters.
    stats: SchedulerStats,

    /// Monotonic tick source and µs conversion for the configured clock.
    clock: &'a dyn Clock,

    /// Deferred re-invocation of the dispatcher at a future tick.
    work: &'a dyn DeferredWork,
}

impl<'a> Scheduler<'a> {
    pub fn new(clock: &'a dyn Clock, work: &'a dyn DeferredWork) -> Self {
        Self {
            tasks: [TaskSlot::EMPTY; MAX_TASKS],
            stats: SchedulerStats::new(),
            clock,
            work,
        }
    }

    /// Register a new task with the scheduler.
    ///
    /// `max_rtime_us` is the body's worst-case run time; it is folded
    /// into every selection as the task's effective deadline.
    ///
    /// # Safety
    /// The caller must keep the object behind `runnable` alive and
    /// otherwise untouched until the slot is released via `free_task`.
    pub unsafe fn create_task(
        &mut self,
        runnable: NonNull<dyn Runnable>,
        max_rtime_us: u64,
    ) -> Result<TaskId, ScheduleError> {
        let max_rtime = self.clock.us_to_ticks(max_rtime_us);
        for (i, slot) in self.tasks.iter_mut().enumerate() {
            if !slot.active {
                slot.init(runnable, max_rtime);
                log::trace!("edf: task {} created", i);
                return Ok(TaskId(i));
            }
        }
        Err(ScheduleError::Capacity)
    }

    /// Release a task slot once its owner is done with it.
    ///
    /// Refused while the task is running; retry after completion.
    pub fn free_task(&mut self, id: TaskId) -> Result<(), ScheduleError> {
        let slot = &mut self.tasks[id.0];
        if slot.state == TaskState::Running {
            return Err(ScheduleError::Busy);
        }
        *slot = TaskSlot::EMPTY;
        log::trace!("edf: task {} freed", id.0);
        Ok(())
    }

    /// Admit a task with a scheduling window relative to its own timeline.
    ///
    /// `start_us == 0` means "eligible now". Otherwise the new start is
    /// derived from the task's *previous* start plus the offset, minus
    /// the fixed scheduling overhead, so periodic re-admissions keep
    /// their cadence instead of drifting late. The deadline is always
    /// relative to the new start.
    ///
    /// Admitting a running task is a caller error: there were not enough
    /// cycles to complete the previous window. It is ignored apart from
    /// a diagnostic trace.
    pub fn admit(&mut self, id: TaskId, start_us: u64, deadline_us: u64) {
        let current = self.clock.now();
        let start = self.clock.us_to_ticks(start_us);
        let deadline = self.clock.us_to_ticks(deadline_us);

        let slot = &mut self.tasks[id.0];
        if slot.state == TaskState::Running {
            log::trace!("edf: admit of task {} rejected, still running", id.0);
            return;
        }

        slot.start = if start_us == 0 {
            current
        } else {
            (slot.start + start).saturating_sub(SCHEDULE_COST_TICKS)
        };
        slot.deadline = slot.start + deadline;
        slot.state = TaskState::Queued;
        log::trace!(
            "edf: task {} admitted, window {}..{}",
            id.0,
            slot.start,
            slot.deadline
        );
    }

    /// Remove a task from the registry before it has run.
    ///
    /// Fails with [`ScheduleError::Busy`] while the task is running; the
    /// caller retries after completion.
    pub fn delete(&mut self, id: TaskId) -> Result<(), ScheduleError> {
        let slot = &mut self.tasks[id.0];
        if slot.state == TaskState::Running {
            return Err(ScheduleError::Busy);
        }
        slot.state = TaskState::Completed;
        log::trace!("edf: task {} deleted", id.0);
        Ok(())
    }

    /// Mark a task completed and remove it from the registry.
    ///
    /// Called by the task's own body at the end of its work, or by the
    /// owner after an asynchronous completion signal. Idempotent.
    pub fn complete(&mut self, id: TaskId) {
        self.tasks[id.0].state = TaskState::Completed;
        log::trace!("edf: task {} completed", id.0);
    }

    /// Current lifecycle state of a task. `Cancelled` here is how an
    /// owner awaiting completion observes an unrecoverable overrun.
    pub fn task_state(&self, id: TaskId) -> TaskState {
        self.tasks[id.0].state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Arm the deferred-work port. Called by the dispatch caller outside
    /// the registry lock.
    pub fn arm_wake(&self, tick: Tick) {
        log::trace!("edf: wake armed at {}", tick);
        self.work.arm_at(tick);
    }

    /// One dispatch pass: select under the lock, decide what the caller
    /// should do once the lock is dropped.
    pub fn dispatch(&mut self) -> Dispatch {
        self.stats.dispatches += 1;
        let current = self.clock.now();

        let Some(id) = self.edf_next(current, None) else {
            return Dispatch::Idle;
        };

        if self.tasks[id.0].start > current {
            // Not due yet; wake up again when it is.
            return Dispatch::WakeAt(self.tasks[id.0].start);
        }

        // Due now. Line up the follow-up candidate first; the chosen
        // task is still queued at this point, so it is excluded by id.
        let next = self.edf_next(current, Some(id));
        let next_wake = next.map(|n| self.tasks[n.0].start);

        let slot = &mut self.tasks[id.0];
        slot.state = TaskState::Running;
        // Restart the window from the dispatch tick so the next period's
        // math does not inherit this cycle's scheduling error.
        slot.start = current;
        log::trace!("edf: run task {} at {}", id.0, current);

        match slot.runnable {
            Some(runnable) => Dispatch::Run {
                id,
                runnable,
                next_wake,
            },
            // Unreachable for slots that went through create_task; treat
            // as an empty registry rather than faulting in IRQ context.
            None => Dispatch::Idle,
        }
    }

    /// Find the queued task with the earliest effective deadline still
    /// ahead of `current`, repairing missed windows along the way.
    ///
    /// `ignore` excludes one task from consideration; the dispatcher uses
    /// it to ask for the candidate *after* the one it is about to run.
    fn edf_next(&mut self, current: Tick, ignore: Option<TaskId>) -> Option<TaskId> {
        let mut next: Option<TaskId> = None;
        let mut next_delta = Tick::MAX;
        let mut repaired = false;

        for i in 0..MAX_TASKS {
            if ignore == Some(TaskId(i)) {
                continue;
            }
            // Only queued tasks compete; running, completed and cancelled
            // slots are skipped (over-time runners stay visible to their
            // owners but are not selection candidates).
            if !self.tasks[i].active || self.tasks[i].state != TaskState::Queued {
                continue;
            }

            let deadline = self.tasks[i].effective_deadline();
            if current < deadline {
                // Viable candidate; earliest effective deadline wins,
                // first-found wins exact ties.
                let delta = deadline - current;
                if delta < next_delta {
                    next_delta = delta;
                    next = Some(TaskId(i));
                }
            } else if !repaired {
                // Missed window: repair the first one seen this scan.
                repaired = true;
                edf_reschedule(&mut self.tasks[i], current);
                self.stats.deadline_misses += 1;
                log::warn!(
                    "edf: task {} missed its window, rescheduled to {}..{}",
                    i,
                    self.tasks[i].start,
                    self.tasks[i].deadline
                );
            } else {
                // Another miss in the same scan: the system is overloaded
                // and this work is shed. The owner observes `Cancelled`
                // and raises an XRUN toward the pipeline consumer.
                self.tasks[i].state = TaskState::Cancelled;
                self.stats.xruns += 1;
                log::error!("edf: task {} missed its window, cancelled (xrun)", i);
            }
        }

        next
    }
}

// ---------------------------------------------------------------------------
// Deadline-miss repair
// ---------------------------------------------------------------------------

/// Compute a new window for a task whose previous one was missed.
///
/// Keeps the task's period (window doubled as a slack margin) and tries
/// to stay aligned with its original cadence by advancing whole slots.
/// The attempt count is a fixed bound — this runs in interrupt context —
/// so a task that has slipped too far behind is instead restarted
/// relative to the current tick.
fn edf_reschedule(task: &mut TaskSlot, current: Tick) {
    let delta = (task.deadline - task.start) << 1;

    // Try to align with the task's own scheduling slots.
    for _ in 0..SLOT_ALIGN_TRIES {
        task.start += delta;

        if task.start > current + delta {
            task.deadline = task.start + delta;
            return;
        }
    }

    // Slipped a lot; just add the delay onto the current tick.
    task.start = current + delta;
    task.deadline = task.start + delta;
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Test clock: one tick per microsecond, manually advanced.
    struct TestClock(Cell<Tick>);

    impl TestClock {
        fn at(tick: Tick) -> Self {
            TestClock(Cell::new(tick))
        }
        fn advance_to(&self, tick: Tick) {
            self.0.set(tick);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Tick {
            self.0.get()
        }
        fn us_to_ticks(&self, us: u64) -> Tick {
            us
        }
    }

    /// Records the most recent armed wake tick.
    struct TestWake(Cell<Option<Tick>>);

    impl TestWake {
        fn new() -> Self {
            TestWake(Cell::new(None))
        }
    }

    impl DeferredWork for TestWake {
        fn arm_at(&self, tick: Tick) {
            self.0.set(Some(tick));
        }
    }

    /// Counts invocations of its body.
    struct Counter(Cell<u32>);

    impl Runnable for Counter {
        fn run(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn counter() -> Counter {
        Counter(Cell::new(0))
    }

    fn create(sched: &mut Scheduler<'_>, body: &mut Counter, max_rtime_us: u64) -> TaskId {
        let ptr = NonNull::from(body as &mut dyn Runnable);
        unsafe { sched.create_task(ptr, max_rtime_us) }.unwrap()
    }

    fn running_count(sched: &Scheduler<'_>) -> usize {
        sched
            .tasks
            .iter()
            .filter(|t| t.active && t.state == TaskState::Running)
            .count()
    }

    #[test]
    fn test_due_task_selected_immediately() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);

        match sched.dispatch() {
            Dispatch::Run {
                id: run_id,
                mut runnable,
                next_wake,
            } => {
                assert_eq!(run_id, id);
                assert_eq!(next_wake, None);
                unsafe { runnable.as_mut().run() };
            }
            other => panic!("expected Run, got {:?}", other),
        }
        assert_eq!(body.0.get(), 1);
        assert_eq!(sched.task_state(id), TaskState::Running);
        assert_eq!(sched.tasks[id.0].start, 0);
    }

    #[test]
    fn test_future_start_defers_and_reports_wake_tick() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 5000, 1000);

        let expected_start = 5000 - SCHEDULE_COST_TICKS;
        match sched.dispatch() {
            Dispatch::WakeAt(tick) => assert_eq!(tick, expected_start),
            other => panic!("expected WakeAt, got {:?}", other),
        }
        // Not run, still queued for its window.
        assert_eq!(sched.task_state(id), TaskState::Queued);
        assert_eq!(body.0.get(), 0);
    }

    #[test]
    fn test_earliest_effective_deadline_wins() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut a = counter();
        let mut b = counter();

        // b has the later raw deadline but the earlier effective one.
        let id_a = create(&mut sched, &mut a, 100);
        let id_b = create(&mut sched, &mut b, 900);
        sched.admit(id_a, 0, 1000); // effective deadline 900
        sched.admit(id_b, 0, 1500); // effective deadline 600

        match sched.dispatch() {
            Dispatch::Run { id, next_wake, .. } => {
                assert_eq!(id, id_b);
                assert_eq!(next_wake, Some(0));
            }
            other => panic!("expected Run, got {:?}", other),
        }
        assert_eq!(sched.task_state(id_a), TaskState::Queued);
    }

    #[test]
    fn test_elapsed_effective_deadline_is_never_selected() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut missed = counter();
        let mut live = counter();

        let id_missed = create(&mut sched, &mut missed, 100);
        let id_live = create(&mut sched, &mut live, 100);
        sched.admit(id_missed, 0, 1000);
        sched.admit(id_live, 0, 4000);

        // Move past the first task's effective deadline (900) but not
        // the second's (3900).
        clock.advance_to(2000);

        match sched.dispatch() {
            Dispatch::Run { id, .. } => assert_eq!(id, id_live),
            other => panic!("expected Run, got {:?}", other),
        }
        // The missed task was rerouted to repair, not selected.
        assert_eq!(sched.task_state(id_missed), TaskState::Queued);
        assert_eq!(sched.stats().deadline_misses, 1);
    }

    #[test]
    fn test_single_miss_is_rescheduled_in_place() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);
        clock.advance_to(5000);

        let next = sched.edf_next(5000, None);
        assert_eq!(next, None);

        // Still queued, window pushed out beyond the current tick with
        // the doubled-period margin.
        assert_eq!(sched.task_state(id), TaskState::Queued);
        let slot = &sched.tasks[id.0];
        assert!(slot.start > 5000);
        assert_eq!(slot.deadline, slot.start + 2000);
        assert_eq!(sched.stats().deadline_misses, 1);
        assert_eq!(sched.stats().xruns, 0);
    }

    #[test]
    fn test_second_miss_in_same_scan_is_cancelled() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut a = counter();
        let mut b = counter();

        let id_a = create(&mut sched, &mut a, 100);
        let id_b = create(&mut sched, &mut b, 100);
        sched.admit(id_a, 0, 1000);
        sched.admit(id_b, 0, 1000);
        clock.advance_to(10_000);

        assert!(matches!(sched.dispatch(), Dispatch::Idle));

        // Exactly one repaired, one shed. Scan order makes it the first
        // slot that gets the repair.
        assert_eq!(sched.task_state(id_a), TaskState::Queued);
        assert_eq!(sched.task_state(id_b), TaskState::Cancelled);
        assert!(!sched.tasks[id_b.0].in_registry());
        assert_eq!(sched.stats().deadline_misses, 1);
        assert_eq!(sched.stats().xruns, 1);
    }

    #[test]
    fn test_reschedule_aligns_with_cadence() {
        let mut slot = TaskSlot::EMPTY;
        slot.start = 0;
        slot.deadline = 10; // delta = 20

        edf_reschedule(&mut slot, 25);

        // Advances by whole slots until clear of current + delta.
        assert_eq!(slot.start, 60);
        assert_eq!(slot.deadline, 80);
    }

    #[test]
    fn test_reschedule_falls_back_when_far_behind() {
        let mut slot = TaskSlot::EMPTY;
        slot.start = 0;
        slot.deadline = 10; // delta = 20, ten tries reach start = 200

        let current = 10_000;
        edf_reschedule(&mut slot, current);

        assert_eq!(slot.start, current + 20);
        assert_eq!(slot.deadline, current + 40);
        assert!(slot.deadline > slot.start && slot.start >= current);
    }

    #[test]
    fn test_delete_running_task_is_busy() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);
        assert!(matches!(sched.dispatch(), Dispatch::Run { .. }));

        assert_eq!(sched.delete(id), Err(ScheduleError::Busy));
        assert_eq!(sched.task_state(id), TaskState::Running);

        // After completion the delete goes through.
        sched.complete(id);
        assert_eq!(sched.delete(id), Ok(()));
        assert_eq!(sched.task_state(id), TaskState::Completed);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);

        sched.complete(id);
        assert_eq!(sched.task_state(id), TaskState::Completed);
        sched.complete(id);
        assert_eq!(sched.task_state(id), TaskState::Completed);
        assert!(!sched.tasks[id.0].in_registry());
    }

    #[test]
    fn test_admit_while_running_is_rejected() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);
        assert!(matches!(sched.dispatch(), Dispatch::Run { .. }));

        let window = (sched.tasks[id.0].start, sched.tasks[id.0].deadline);
        sched.admit(id, 1000, 1000);

        assert_eq!(sched.task_state(id), TaskState::Running);
        assert_eq!((sched.tasks[id.0].start, sched.tasks[id.0].deadline), window);
    }

    #[test]
    fn test_periodic_readmission_keeps_cadence() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);
        assert!(matches!(sched.dispatch(), Dispatch::Run { .. }));

        // Body finishes and re-arms for the next 1 ms window; the new
        // start derives from the previous one minus the fixed overhead.
        sched.complete(id);
        sched.admit(id, 1000, 1000);

        let slot = &sched.tasks[id.0];
        assert_eq!(slot.start, 1000 - SCHEDULE_COST_TICKS);
        assert_eq!(slot.deadline, slot.start + 1000);
        assert_eq!(sched.task_state(id), TaskState::Queued);
    }

    #[test]
    fn test_running_is_a_singleton_through_normal_flow() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut a = counter();
        let mut b = counter();

        let id_a = create(&mut sched, &mut a, 100);
        let id_b = create(&mut sched, &mut b, 100);
        sched.admit(id_a, 0, 1000);
        sched.admit(id_b, 0, 2000);

        let first = match sched.dispatch() {
            Dispatch::Run { id, .. } => id,
            other => panic!("expected Run, got {:?}", other),
        };
        assert_eq!(first, id_a);
        assert_eq!(running_count(&sched), 1);

        sched.complete(first);
        assert_eq!(running_count(&sched), 0);

        match sched.dispatch() {
            Dispatch::Run { id, .. } => assert_eq!(id, id_b),
            other => panic!("expected Run, got {:?}", other),
        }
        assert_eq!(running_count(&sched), 1);
    }

    #[test]
    fn test_follow_up_wake_excludes_chosen_task() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut now_task = counter();
        let mut later_task = counter();

        let id_now = create(&mut sched, &mut now_task, 100);
        let id_later = create(&mut sched, &mut later_task, 100);
        sched.admit(id_now, 0, 1000);
        sched.admit(id_later, 8000, 1000);

        let later_start = sched.tasks[id_later.0].start;
        match sched.dispatch() {
            Dispatch::Run { id, next_wake, .. } => {
                assert_eq!(id, id_now);
                assert_eq!(next_wake, Some(later_start));
            }
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity_and_slot_reuse() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut bodies: [Counter; MAX_TASKS] = core::array::from_fn(|_| counter());

        let mut ids = [TaskId(0); MAX_TASKS];
        for (i, body) in bodies.iter_mut().enumerate() {
            ids[i] = create(&mut sched, body, 100);
        }

        let mut extra = counter();
        let ptr = NonNull::from(&mut extra as &mut dyn Runnable);
        assert_eq!(
            unsafe { sched.create_task(ptr, 100) },
            Err(ScheduleError::Capacity)
        );

        // Freeing a slot makes room again.
        assert_eq!(sched.free_task(ids[3]), Ok(()));
        let reused = unsafe { sched.create_task(ptr, 100) }.unwrap();
        assert_eq!(reused, ids[3]);
    }

    #[test]
    fn test_free_running_task_is_busy() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);
        let mut body = counter();

        let id = create(&mut sched, &mut body, 100);
        sched.admit(id, 0, 1000);
        assert!(matches!(sched.dispatch(), Dispatch::Run { .. }));

        assert_eq!(sched.free_task(id), Err(ScheduleError::Busy));
        assert!(sched.tasks[id.0].active);
    }

    #[test]
    fn test_empty_registry_dispatch_is_idle() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let mut sched = Scheduler::new(&clock, &wake);

        assert!(matches!(sched.dispatch(), Dispatch::Idle));
        assert_eq!(sched.stats().dispatches, 1);
    }

    #[test]
    fn test_wake_port_receives_armed_tick() {
        let clock = TestClock::at(0);
        let wake = TestWake::new();
        let sched = Scheduler::new(&clock, &wake);

        sched.arm_wake(4321);
        assert_eq!(wake.0.get(), Some(4321));
    }
}
