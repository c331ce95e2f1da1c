//! # TempOS — EDF Audio Task Scheduler
//!
//! An Earliest-Deadline-First (EDF) real-time task scheduler for audio
//! processing pipelines on constrained ARM Cortex-M4 targets.
//!
//! ## Overview
//!
//! TempOS decides, at interrupt time, which unit of pipeline work runs
//! next. Each task carries an absolute scheduling window — a start tick
//! and a deadline tick — plus its worst-case run time. Selection always
//! picks the queued task with the earliest *effective* deadline
//! (`deadline - max_rtime`): the latest start that still allows on-time
//! completion. Missed windows are repaired in bounded time; when the
//! system is overloaded, excess work is shed and surfaced as an
//! overrun (XRUN) toward the pipeline consumer.
//!
//! - **Run-to-completion**: task bodies execute synchronously inside the
//!   scheduling interrupt; there is no preemption between tasks and only
//!   one body runs at a time.
//! - **No blocking**: waiting takes the form of a deferred hardware
//!   wake-up at the next candidate's start tick, never a blocked thread.
//! - **No heap**: all state is statically allocated; pure `core` only.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │               Audio Pipeline Components                 │
//! ├────────────────────────────────────────────────────────┤
//! │                Kernel API (kernel.rs)                   │
//! │   init() · create_task() · admit() · delete()          │
//! │   complete() · trigger() · task_state() · stats()      │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │ EDF Core     │  Task Model        │  Sync Primitives  │
//! │ scheduler.rs │  task.rs           │  sync.rs          │
//! │ ─ dispatch() │  ─ TaskSlot        │  ─ critical_section│
//! │ ─ edf_next() │  ─ TaskState       │                   │
//! │ ─ reschedule │  ─ Runnable        │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │            Port Traits (time.rs)                        │
//! │    Clock · DeferredWork · Tick                          │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │    SysTick timebase · PendSV scheduling IRQ             │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)                │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling Model
//!
//! A pipeline component admits a task with a window relative to the
//! task's own timeline. The admission pends the scheduling interrupt
//! (PendSV); the dispatcher selects under the registry lock, runs the
//! chosen body with the lock released, and arms a SysTick-driven wake
//! for the next candidate's start tick when nothing further is due.
//! Periodic tasks re-admit themselves at the end of each run; the new
//! start derives from the previous one, minus a fixed scheduling-cost
//! compensation, so cadence does not drift from dispatcher overhead.
//!
//! ## Deadline-Miss Recovery
//!
//! A queued task found past its effective deadline is a recoverable
//! fault: the first one seen in a scan is pushed onto a later window
//! aligned with its own cadence (bounded attempts, then a restart
//! relative to now). Any further miss in the same scan means overload;
//! that task is cancelled, leaves the registry, and its owner observes
//! the failure as an XRUN.

#![no_std]

pub mod arch;
pub mod config;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod time;
