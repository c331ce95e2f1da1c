//! # Task Model
//!
//! Defines the schedulable unit for TempOS. A task couples a timing window
//! (start tick, deadline tick, worst-case run time) with an opaque runnable
//! body owned by the pipeline component that created it. The scheduler
//! never inspects the body; it only decides *when* to invoke it.

use core::ptr::NonNull;

use crate::time::Tick;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Execution state of a task in the scheduler's state machine.
///
/// A task is a member of the registry if and only if it is `Queued` or
/// `Running`. `Completed` and `Cancelled` slots stay owned by the caller
/// and may be re-admitted.
///
/// ```text
///   ┌──────┐  admit()   ┌────────┐  dispatch, start due  ┌─────────┐
///   │ Init │ ─────────► │ Queued │ ────────────────────► │ Running │
///   └──────┘            └────────┘                       └─────────┘
///                        │  ▲   │                             │
///          miss repaired │  │   │ 2nd+ miss        complete() │
///          (new window)  └──┘   │ in one scan                 ▼
///                               ▼                        ┌───────────┐
///                        ┌───────────┐   complete(),     │ Completed │
///                        │ Cancelled │   delete() ─────► └───────────┘
///                        └───────────┘   (from Queued)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created but never admitted; not a registry member.
    Init,
    /// Admitted, waiting for its start time or for selection.
    Queued,
    /// Currently executing inline in the scheduling interrupt. Exclusive.
    Running,
    /// Finished normally (or explicitly deleted); left the registry.
    Completed,
    /// Removed by unrecoverable deadline-miss recovery; left the registry.
    /// The pipeline surfaces this upward as an overrun (XRUN) condition.
    Cancelled,
}

impl TaskState {
    /// Registry membership follows directly from the state.
    #[inline]
    pub fn in_registry(self) -> bool {
        matches!(self, TaskState::Queued | TaskState::Running)
    }
}

// ---------------------------------------------------------------------------
// Runnable capability
// ---------------------------------------------------------------------------

/// The opaque behavior a task executes when dispatched.
///
/// Bodies run synchronously in the scheduling interrupt and must return
/// promptly; there is no preemption between scheduled tasks. A body
/// normally ends by completing its task (and, for periodic work,
/// re-admitting it for the next window).
pub trait Runnable {
    fn run(&mut self);
}

// ---------------------------------------------------------------------------
// Task identity and slot
// ---------------------------------------------------------------------------

/// Handle to a task slot, returned at creation and passed to every
/// scheduling operation. Plain index into the scheduler's slot array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Slot index, for diagnostics.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One entry in the scheduler's fixed task array.
///
/// `start` and `deadline` are absolute ticks; `max_rtime` is the task's
/// worst-case run time, folded into selection as an *effective deadline*
/// (`deadline - max_rtime`): the latest start tick that still allows
/// on-time completion.
pub struct TaskSlot {
    /// Current lifecycle state.
    pub state: TaskState,

    /// Absolute tick at which the task becomes eligible to run.
    pub start: Tick,

    /// Absolute tick by which the task must have completed.
    pub deadline: Tick,

    /// Worst-case run time in ticks. The caller keeps
    /// `max_rtime <= deadline - start` for the effective-deadline math
    /// to stay meaningful; the scheduler does not enforce it.
    pub max_rtime: Tick,

    /// Opaque body, supplied at creation and invoked on dispatch.
    pub(crate) runnable: Option<NonNull<dyn Runnable>>,

    /// Whether this slot is allocated (true) or free (false).
    pub active: bool,
}

// Safety: the runnable pointer targets an object the creating pipeline
// component keeps alive for the task's registration lifetime, and all
// slot access happens inside the registry critical section (or in the
// single dispatch context that executes bodies).
unsafe impl Send for TaskSlot {}
unsafe impl Sync for TaskSlot {}

impl TaskSlot {
    /// Free slot used to initialize the static array.
    pub const EMPTY: TaskSlot = TaskSlot {
        state: TaskState::Init,
        start: 0,
        deadline: 0,
        max_rtime: 0,
        runnable: None,
        active: false,
    };

    /// Claim this slot for a new task.
    pub fn init(&mut self, runnable: NonNull<dyn Runnable>, max_rtime: Tick) {
        self.state = TaskState::Init;
        self.start = 0;
        self.deadline = 0;
        self.max_rtime = max_rtime;
        self.runnable = Some(runnable);
        self.active = true;
    }

    /// Latest start tick that still allows on-time completion.
    #[inline]
    pub fn effective_deadline(&self) -> Tick {
        self.deadline.saturating_sub(self.max_rtime)
    }

    /// Whether this slot is currently linked into the registry.
    #[inline]
    pub fn in_registry(&self) -> bool {
        self.active && self.state.in_registry()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl Runnable for Nop {
        fn run(&mut self) {}
    }

    #[test]
    fn test_slot_initialization() {
        let mut slot = TaskSlot::EMPTY;
        assert!(!slot.active);
        assert_eq!(slot.state, TaskState::Init);

        let mut body = Nop;
        slot.init(NonNull::from(&mut body as &mut dyn Runnable), 10);

        assert!(slot.active);
        assert_eq!(slot.state, TaskState::Init);
        assert_eq!(slot.max_rtime, 10);
        assert!(slot.runnable.is_some());
        assert!(!slot.in_registry());
    }

    #[test]
    fn test_effective_deadline() {
        let mut slot = TaskSlot::EMPTY;
        slot.start = 100;
        slot.deadline = 1000;
        slot.max_rtime = 80;
        assert_eq!(slot.effective_deadline(), 920);

        // Degenerate window: caller broke the max_rtime assumption.
        slot.deadline = 50;
        assert_eq!(slot.effective_deadline(), 0);
    }

    #[test]
    fn test_registry_membership_follows_state() {
        let mut slot = TaskSlot::EMPTY;
        let mut body = Nop;
        slot.init(NonNull::from(&mut body as &mut dyn Runnable), 0);

        for (state, member) in [
            (TaskState::Init, false),
            (TaskState::Queued, true),
            (TaskState::Running, true),
            (TaskState::Completed, false),
            (TaskState::Cancelled, false),
        ] {
            slot.state = state;
            assert_eq!(slot.in_registry(), member);
        }
    }
}
