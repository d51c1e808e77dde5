// Licensed under the Apache-2.0 license

//! Cycle-driven simulation of the board peripherals the battery touches:
//! the watchdog, the software reset path, and the retention cells.

use std::panic::panic_any;

use vigil_drivers::{
    BoardOps, LedgerStore, ResetCause, WdtFunction, WdtTimeout, RETENTION_WORD_COUNT,
};
use vigil_error::{VigilError, VigilResult};

/// Panic payload modeling a device reset.
///
/// The unwind destroys the booting stack the way a real reset destroys
/// execution state; only the retention cells carry over to the next boot.
#[derive(Debug, Clone, Copy)]
pub struct SimReset {
    pub cause: ResetCause,
}

/// Retention cells of the model. Contents survive resets; a power cycle
/// clears them.
#[derive(Default)]
pub struct SimRetention {
    pub(crate) words: [u32; RETENTION_WORD_COUNT],
    pub(crate) fail_stores: bool,
}

impl LedgerStore for SimRetention {
    fn load(&mut self) -> [u32; RETENTION_WORD_COUNT] {
        self.words
    }

    fn store(&mut self, words: &[u32; RETENTION_WORD_COUNT]) -> VigilResult<()> {
        if self.fail_stores {
            return Err(VigilError::DRIVER_RETENTION_STORE_FAILED);
        }
        self.words = *words;
        Ok(())
    }
}

/// The board itself. Time only moves inside `delay_cycles`; any event
/// that falls within a delay is serviced at its exact cycle, in order.
pub struct SimBoard {
    cycles: u64,
    wdt_period: u64,
    wdt_deadline: Option<u64>,
    wdt_function: WdtFunction,
    event_pending: bool,
    pending_sw_reset: Option<u64>,
    pub(crate) suppress_sw_reset: bool,
}

impl SimBoard {
    /// Cycles between a software reset request and the reset taking hold.
    pub const SW_RESET_LATENCY_CYCLES: u64 = 16;

    pub fn new() -> SimBoard {
        SimBoard {
            cycles: 0,
            wdt_period: 0,
            wdt_deadline: None,
            wdt_function: WdtFunction::empty(),
            event_pending: false,
            pending_sw_reset: None,
            suppress_sw_reset: false,
        }
    }

    /// Model a reset taking hold: peripheral state clears, the cycle
    /// counter keeps running.
    pub(crate) fn hardware_reset(&mut self) {
        self.wdt_deadline = None;
        self.wdt_function = WdtFunction::empty();
        self.event_pending = false;
        self.pending_sw_reset = None;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn wdt_armed(&self) -> bool {
        self.wdt_deadline.is_some()
    }

    fn advance(&mut self, cycles: u64) {
        enum Due {
            Idle,
            Wdt(u64),
            Sw(u64),
        }

        let target = self.cycles.saturating_add(cycles);
        loop {
            let wdt_due = self.wdt_deadline.filter(|at| *at <= target);
            let sw_due = self.pending_sw_reset.filter(|at| *at <= target);
            let due = match (wdt_due, sw_due) {
                (None, None) => Due::Idle,
                (Some(wdt), None) => Due::Wdt(wdt),
                (None, Some(sw)) => Due::Sw(sw),
                // On a tie the watchdog line wins.
                (Some(wdt), Some(sw)) => {
                    if wdt <= sw {
                        Due::Wdt(wdt)
                    } else {
                        Due::Sw(sw)
                    }
                }
            };
            match due {
                Due::Idle => {
                    self.cycles = target;
                    return;
                }
                Due::Wdt(at) => {
                    self.cycles = at;
                    if self.wdt_function.contains(WdtFunction::RESET) {
                        panic_any(SimReset {
                            cause: ResetCause::Watchdog,
                        });
                    }
                    // Interrupt-only underflow: latch the event and let
                    // the counter reload.
                    self.event_pending = true;
                    self.wdt_deadline = Some(at + self.wdt_period);
                }
                Due::Sw(at) => {
                    self.cycles = at;
                    panic_any(SimReset {
                        cause: ResetCause::Software,
                    });
                }
            }
        }
    }
}

impl Default for SimBoard {
    fn default() -> SimBoard {
        SimBoard::new()
    }
}

impl BoardOps for SimBoard {
    fn arm_watchdog(&mut self, timeout: WdtTimeout, function: WdtFunction) -> VigilResult<()> {
        let period = u64::from(timeout);
        self.wdt_period = period;
        self.wdt_function = function;
        self.wdt_deadline = Some(self.cycles + period);
        Ok(())
    }

    fn refresh_watchdog(&mut self) -> VigilResult<()> {
        if self.wdt_deadline.is_none() {
            return Err(VigilError::DRIVER_WDT_NOT_ARMED);
        }
        self.wdt_deadline = Some(self.cycles + self.wdt_period);
        Ok(())
    }

    fn disarm_watchdog(&mut self) -> VigilResult<()> {
        self.wdt_deadline = None;
        Ok(())
    }

    fn watchdog_event_pending(&mut self) -> bool {
        self.event_pending
    }

    fn clear_watchdog_event(&mut self) {
        self.event_pending = false;
    }

    fn request_software_reset(&mut self) {
        if !self.suppress_sw_reset {
            self.pending_sw_reset = Some(self.cycles + Self::SW_RESET_LATENCY_CYCLES);
        }
    }

    fn delay_cycles(&mut self, cycles: u64) {
        self.advance(cycles);
    }
}
