//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) target.
//! Provides the scheduler's monotonic timebase (SysTick), the scheduling
//! interrupt (PendSV), and the deferred-wake comparator that re-pends
//! the scheduling interrupt once an armed future tick comes due.
//!
//! ## Interrupt Layout
//!
//! - **SysTick** — timebase at `TICK_HZ`. Advances the tick counter and
//!   pends PendSV when the armed wake tick is reached.
//! - **PendSV** — the scheduling interrupt. Dispatch and the task bodies
//!   it runs inline both execute here. Set to the lowest priority so the
//!   scheduler never preempts application-level ISRs; pending it from
//!   any context is the asynchronous "run the scheduler" request.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::time::{Clock, DeferredWork, Tick};

// ---------------------------------------------------------------------------
// Timebase state
// ---------------------------------------------------------------------------

/// Monotonic tick counter, advanced by the SysTick handler.
///
/// # Safety
/// Written only by the SysTick handler; read elsewhere under masked
/// interrupts (`current_tick`).
static mut TICKS: Tick = 0;

/// Armed deferred-wake tick, compared against `TICKS` every SysTick.
///
/// # Safety
/// Accessed by the SysTick handler and, under masked interrupts, by
/// `SysTickWake::arm_at`.
static mut WAKE_AT: Option<Tick> = None;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer as the scheduler timebase.
///
/// Sets up SysTick to fire at `TICK_HZ` using the processor clock. Each
/// tick advances the monotonic counter and services the deferred wake.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Scheduling interrupt (PendSV)
// ---------------------------------------------------------------------------

/// Pend the scheduling interrupt.
///
/// PendSV fires at the lowest priority, so the dispatch it triggers only
/// runs once no other ISR is active. Sets the PENDSVSET bit in the
/// Interrupt Control and State Register (ICSR).
#[inline]
pub fn trigger_schedule_irq() {
    // ICSR address: 0xE000_ED04, PENDSVSET = bit 28
    const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
    unsafe {
        core::ptr::write_volatile(ICSR, 1 << 28);
    }
}

/// Clear a pending scheduling interrupt (PENDSVCLR, ICSR bit 27).
/// Called by the dispatcher once it has taken its decision.
#[inline]
pub fn clear_schedule_irq() {
    const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
    unsafe {
        core::ptr::write_volatile(ICSR, 1 << 27);
    }
}

/// Set PendSV and SysTick to the lowest interrupt priority.
///
/// Dispatch (PendSV) must never preempt application-level ISRs, and the
/// timebase tick must not interfere with higher-priority interrupts.
/// Both use priority 0xFF (lowest on Cortex-M4 with 4 priority bits).
pub fn set_interrupt_priorities() {
    unsafe {
        // System Handler Priority Register 3 (SHPR3): 0xE000_ED20
        // Bits [23:16] = PendSV priority
        // Bits [31:24] = SysTick priority
        let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
        let val = core::ptr::read_volatile(shpr3);
        let val = val | (0xFF << 16) | (0xFF << 24);
        core::ptr::write_volatile(shpr3, val);
    }
}

// ---------------------------------------------------------------------------
// Port trait implementations
// ---------------------------------------------------------------------------

/// Current monotonic tick, read atomically with respect to SysTick.
pub fn current_tick() -> Tick {
    cortex_m::interrupt::free(|_| unsafe { core::ptr::addr_of!(TICKS).read() })
}

/// SysTick-backed [`Clock`] port.
pub struct SysTickClock;

impl Clock for SysTickClock {
    fn now(&self) -> Tick {
        current_tick()
    }

    fn us_to_ticks(&self, us: u64) -> Tick {
        us * TICK_HZ as u64 / 1_000_000
    }
}

/// SysTick-backed [`DeferredWork`] port.
///
/// Arming stores the wake tick for the SysTick handler to compare
/// against; a tick that is already due pends the scheduling interrupt
/// immediately instead.
pub struct SysTickWake;

impl DeferredWork for SysTickWake {
    fn arm_at(&self, tick: Tick) {
        let due = cortex_m::interrupt::free(|_| unsafe {
            if tick <= core::ptr::addr_of!(TICKS).read() {
                true
            } else {
                core::ptr::addr_of_mut!(WAKE_AT).write(Some(tick));
                false
            }
        });
        if due {
            trigger_schedule_irq();
        }
    }
}

// ---------------------------------------------------------------------------
// Exception handlers
// ---------------------------------------------------------------------------

/// SysTick exception handler — timebase tick.
///
/// Advances the monotonic counter and pends the scheduling interrupt
/// when an armed deferred wake comes due.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    let ticks = core::ptr::addr_of_mut!(TICKS);
    *ticks += 1;

    let wake = core::ptr::addr_of_mut!(WAKE_AT);
    if let Some(at) = *wake {
        if *ticks >= at {
            *wake = None;
            trigger_schedule_irq();
        }
    }
}

/// PendSV exception handler — scheduling interrupt entry point.
///
/// Runs one dispatch round: selection under the registry lock, then the
/// chosen task body inline, then the deferred wake for the follow-up
/// candidate.
#[no_mangle]
pub unsafe extern "C" fn PendSV() {
    crate::kernel::scheduler_run();
}
