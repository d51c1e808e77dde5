/*++

Licensed under the Apache-2.0 license.

File Name:

    ht32.rs

Abstract:

    File contains the board operations port for the HT32F125x reference
    board. Clock and pin bring-up happen before the harness is entered.

--*/

use crate::board::BoardOps;
use crate::memory_layout;
use crate::wdt::{WdtFunction, WdtTimeout};
use vigil_error::VigilResult;

const WDT_CR: u32 = memory_layout::WDT_ORG;
const WDT_MR0: u32 = memory_layout::WDT_ORG + 0x04;
const WDT_MR1: u32 = memory_layout::WDT_ORG + 0x08;
const WDT_SR: u32 = memory_layout::WDT_ORG + 0x0C;
const WDT_PR: u32 = memory_layout::WDT_ORG + 0x10;

const RSTCU_GRSR: u32 = memory_layout::RSTCU_ORG;

// Cortex-M application interrupt and reset control register.
const SCB_AIRCR: u32 = 0xE000_ED0C;
const AIRCR_SYSRESETREQ: u32 = 0x05FA_0004;

// Counter reload goes through the control register with its write key.
const WDT_CR_RESTART: u32 = 0x5FA0_0001;

const WDT_MR0_WDTV_MASK: u32 = 0x0000_0FFF;
const WDT_MR0_WDTFIEN: u32 = 1 << 12;
const WDT_MR0_WDTRSTEN: u32 = 1 << 13;
const WDT_MR0_WDTEN: u32 = 1 << 16;

const WDT_MR1_WPSC_SHIFT: u32 = 12;
const WDT_MR1_WPSC_MAX: u32 = 7;

const WDT_SR_WDTUF: u32 = 1 << 0;

const WDT_PR_UNLOCK: u32 = 0x35CA;
const WDT_PR_LOCK: u32 = 0;

const GRSR_CLEAR_ALL: u32 = 0b111;

fn reg_read(addr: u32) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

fn reg_write(addr: u32, val: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, val) }
}

/// Map a cycle count onto the prescaler and 12-bit reload value of the
/// watchdog counter. Periods beyond the longest programmable one saturate.
fn wdt_reload_for_cycles(cycles: u64) -> (u32, u32) {
    let mut prescale = 0;
    let mut reload = cycles;
    while reload > WDT_MR0_WDTV_MASK as u64 && prescale < WDT_MR1_WPSC_MAX {
        // Round the halving up without overflowing near u64::MAX.
        reload = reload / 2 + (reload & 1);
        prescale += 1;
    }
    (prescale, reload.min(WDT_MR0_WDTV_MASK as u64) as u32)
}

/// HT32F125x board port
pub struct Ht32Board {
    armed: bool,
}

impl Ht32Board {
    /// Create the board port.
    ///
    /// # Safety
    ///
    /// The caller must be running on the target part with the watchdog and
    /// reset control blocks mapped at the `memory_layout` addresses, and
    /// must create at most one instance.
    pub unsafe fn new() -> Self {
        Self { armed: false }
    }

    /// Read the raw global reset status word for classification.
    pub fn read_reset_status(&mut self) -> u32 {
        reg_read(RSTCU_GRSR)
    }

    /// Clear the sticky reset status flags so the next boot observes only
    /// its own cause.
    pub fn clear_reset_status(&mut self) {
        reg_write(RSTCU_GRSR, GRSR_CLEAR_ALL);
    }
}

impl BoardOps for Ht32Board {
    fn arm_watchdog(&mut self, timeout: WdtTimeout, function: WdtFunction) -> VigilResult<()> {
        let (prescale, reload) = wdt_reload_for_cycles(timeout.into());

        let mut mr0 = reload | WDT_MR0_WDTEN;
        if function.contains(WdtFunction::RESET) {
            mr0 |= WDT_MR0_WDTRSTEN;
        }
        if function.contains(WdtFunction::INTERRUPT) {
            mr0 |= WDT_MR0_WDTFIEN;
        }

        reg_write(WDT_PR, WDT_PR_UNLOCK);
        // Delta equal to the reload value disables the windowed compare.
        reg_write(WDT_MR1, (prescale << WDT_MR1_WPSC_SHIFT) | reload);
        reg_write(WDT_MR0, mr0);
        reg_write(WDT_CR, WDT_CR_RESTART);
        reg_write(WDT_PR, WDT_PR_LOCK);

        self.armed = true;
        Ok(())
    }

    fn refresh_watchdog(&mut self) -> VigilResult<()> {
        if !self.armed {
            return Err(vigil_error::VigilError::DRIVER_WDT_NOT_ARMED);
        }
        reg_write(WDT_PR, WDT_PR_UNLOCK);
        reg_write(WDT_CR, WDT_CR_RESTART);
        reg_write(WDT_PR, WDT_PR_LOCK);
        Ok(())
    }

    fn disarm_watchdog(&mut self) -> VigilResult<()> {
        reg_write(WDT_PR, WDT_PR_UNLOCK);
        reg_write(WDT_MR0, reg_read(WDT_MR0) & !WDT_MR0_WDTEN);
        reg_write(WDT_PR, WDT_PR_LOCK);
        self.armed = false;
        Ok(())
    }

    fn watchdog_event_pending(&mut self) -> bool {
        reg_read(WDT_SR) & WDT_SR_WDTUF != 0
    }

    fn clear_watchdog_event(&mut self) {
        reg_write(WDT_SR, WDT_SR_WDTUF);
    }

    fn request_software_reset(&mut self) {
        reg_write(SCB_AIRCR, AIRCR_SYSRESETREQ);
    }

    fn delay_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_mapping_small_period() {
        // Fits the 12-bit counter directly, no prescaling.
        assert_eq!(wdt_reload_for_cycles(1), (0, 1));
        assert_eq!(wdt_reload_for_cycles(0xFFF), (0, 0xFFF));
    }

    #[test]
    fn test_reload_mapping_prescaled() {
        // 0x1000 cycles needs one halving step.
        assert_eq!(wdt_reload_for_cycles(0x1000), (1, 0x800));
        // Halving rounds up so the period is never shortened.
        assert_eq!(wdt_reload_for_cycles(0x1001), (1, 0x801));
    }

    #[test]
    fn test_reload_mapping_saturates() {
        let max_period = (0xFFFu64) << WDT_MR1_WPSC_MAX;
        assert_eq!(wdt_reload_for_cycles(max_period), (7, 0xFFF));
        assert_eq!(wdt_reload_for_cycles(u64::MAX), (7, 0xFFF));
    }
}
