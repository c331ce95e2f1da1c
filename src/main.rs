//! # TempOS Example Firmware
//!
//! Demonstrates the EDF scheduler with a small three-stage audio
//! pipeline, each stage a periodic task with its own window:
//!
//! | Task | Period | Window | WCRT | Role |
//! |------|--------|--------|------|------|
//! | `MixTask` | 1 ms | 1 ms | 200 µs | Sum two source buffers into the output block |
//! | `GainTask` | 4 ms | 4 ms | 800 µs | Apply a Q15 gain to a 4 ms block |
//! | `MeterTask` | 10 ms | 10 ms | 500 µs | Peak-scan the last 10 ms of output |
//!
//! ## Expected Scheduling Dynamics
//!
//! 1. All three tasks are admitted with `start = now`; the first
//!    dispatch runs the mixer (smallest effective deadline), then the
//!    gain stage, then the meter as the tick advances through their
//!    windows.
//! 2. Each body completes its task and re-admits it one period ahead,
//!    deriving the new start from the previous one so the cadence holds
//!    regardless of where in the window the body actually ran.
//! 3. Between activations the deferred wake re-pends the scheduling
//!    interrupt exactly at the next candidate's start tick — the core
//!    idles in `wfi` the rest of the time.
//! 4. If a stage overruns far enough to drag others past their windows,
//!    one victim per scan is pushed onto a later slot and any further
//!    one is shed as an XRUN, visible through `kernel::stats()`.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use cortex_m_rt::entry;
#[cfg(target_os = "none")]
use panic_halt as _;

#[cfg(target_os = "none")]
use core::ptr::addr_of_mut;

use tempos::kernel;
use tempos::task::{Runnable, TaskId};

// ---------------------------------------------------------------------------
// Pipeline timing
// ---------------------------------------------------------------------------

/// Frames per 1 ms block at 48 kHz.
const BLOCK_FRAMES: usize = 48;

const MIX_PERIOD_US: u64 = 1_000;
const GAIN_PERIOD_US: u64 = 4_000;
const METER_PERIOD_US: u64 = 10_000;

const MIX_MAX_RTIME_US: u64 = 200;
const GAIN_MAX_RTIME_US: u64 = 800;
const METER_MAX_RTIME_US: u64 = 500;

// ---------------------------------------------------------------------------
// Pipeline tasks
// ---------------------------------------------------------------------------

/// **Mixer** — the low-latency stage. Every millisecond it folds two
/// source buffers into one output block. Tightest window of the three,
/// so EDF keeps it first in line whenever it is queued.
struct MixTask {
    id: Option<TaskId>,
    sources: [[i32; BLOCK_FRAMES]; 2],
    out: [i32; BLOCK_FRAMES],
    blocks: u32,
}

impl MixTask {
    const fn new() -> Self {
        Self {
            id: None,
            sources: [[0; BLOCK_FRAMES]; 2],
            out: [0; BLOCK_FRAMES],
            blocks: 0,
        }
    }
}

impl Runnable for MixTask {
    fn run(&mut self) {
        for i in 0..BLOCK_FRAMES {
            // Half-gain sum keeps the headroom without a divide.
            self.out[i] = (self.sources[0][i] >> 1) + (self.sources[1][i] >> 1);
        }
        self.blocks = self.blocks.wrapping_add(1);

        if let Some(id) = self.id {
            kernel::complete(id);
            kernel::admit(id, MIX_PERIOD_US, MIX_PERIOD_US);
        }
    }
}

/// **Gain stage** — bulk DSP over a 4 ms block. Larger window and run
/// time than the mixer; EDF slots it into the gaps between mixer
/// activations.
struct GainTask {
    id: Option<TaskId>,
    gain_q15: i32,
    buf: [i32; 4 * BLOCK_FRAMES],
}

impl GainTask {
    const fn new() -> Self {
        Self {
            id: None,
            gain_q15: 26_214, // ~0.8 in Q15
            buf: [0; 4 * BLOCK_FRAMES],
        }
    }
}

impl Runnable for GainTask {
    fn run(&mut self) {
        for sample in self.buf.iter_mut() {
            *sample = ((*sample as i64 * self.gain_q15 as i64) >> 15) as i32;
        }

        if let Some(id) = self.id {
            kernel::complete(id);
            kernel::admit(id, GAIN_PERIOD_US, GAIN_PERIOD_US);
        }
    }
}

/// **Meter** — housekeeping-rate peak measurement over the last 10 ms.
/// The widest window; it runs whenever nothing tighter is due and is
/// the natural first victim of a reschedule under overload.
struct MeterTask {
    id: Option<TaskId>,
    buf: [i32; 10 * BLOCK_FRAMES],
    peak: i32,
}

impl MeterTask {
    const fn new() -> Self {
        Self {
            id: None,
            buf: [0; 10 * BLOCK_FRAMES],
            peak: 0,
        }
    }
}

impl Runnable for MeterTask {
    fn run(&mut self) {
        let mut peak = 0;
        for sample in self.buf.iter() {
            let level = sample.saturating_abs();
            if level > peak {
                peak = level;
            }
        }
        self.peak = peak;

        if let Some(id) = self.id {
            kernel::complete(id);
            kernel::admit(id, METER_PERIOD_US, METER_PERIOD_US);
        }
    }
}

// ---------------------------------------------------------------------------
// Static task instances
// ---------------------------------------------------------------------------

// Task bodies live in statics for the whole firmware lifetime; the
// scheduler keeps non-owning pointers into them.
static mut MIX_TASK: MixTask = MixTask::new();
static mut GAIN_TASK: GainTask = GainTask::new();
static mut METER_TASK: MeterTask = MeterTask::new();

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Initializes the kernel, registers the pipeline
/// tasks, admits their first windows and starts the timebase. The main
/// thread then only sleeps; all processing happens in the scheduling
/// interrupt.
#[cfg(target_os = "none")]
#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("core peripherals");

    kernel::init();

    // Safety: each static is handed to the scheduler exactly once and
    // the id write-back happens before the timebase starts dispatching.
    let mix = kernel::create_task(unsafe { &mut *addr_of_mut!(MIX_TASK) }, MIX_MAX_RTIME_US)
        .expect("Failed to create mix task");
    unsafe { (*addr_of_mut!(MIX_TASK)).id = Some(mix) };

    let gain = kernel::create_task(unsafe { &mut *addr_of_mut!(GAIN_TASK) }, GAIN_MAX_RTIME_US)
        .expect("Failed to create gain task");
    unsafe { (*addr_of_mut!(GAIN_TASK)).id = Some(gain) };

    let meter = kernel::create_task(unsafe { &mut *addr_of_mut!(METER_TASK) }, METER_MAX_RTIME_US)
        .expect("Failed to create meter task");
    unsafe { (*addr_of_mut!(METER_TASK)).id = Some(meter) };

    // First windows: eligible immediately, one period to complete.
    kernel::admit(mix, 0, MIX_PERIOD_US);
    kernel::admit(gain, 0, GAIN_PERIOD_US);
    kernel::admit(meter, 0, METER_PERIOD_US);

    kernel::start(&mut cp.SYST);

    loop {
        cortex_m::asm::wfi();
    }
}

/// Host builds only check that the firmware compiles; there is no
/// hardware to run against.
#[cfg(not(target_os = "none"))]
fn main() {}
