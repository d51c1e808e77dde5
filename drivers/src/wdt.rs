/*++

Licensed under the Apache-2.0 license.

File Name:

    wdt.rs

Abstract:

    File contains the value types used to program the Watchdog Timer.

--*/

use bitflags::bitflags;

pub struct WdtTimeout(pub core::num::NonZeroU64);

impl Default for WdtTimeout {
    fn default() -> WdtTimeout {
        WdtTimeout::new_const(WDT_MIN_TIMEOUT_IN_CYCLES)
    }
}

impl WdtTimeout {
    /// Period used by the validation battery; short enough that an armed
    /// watchdog fires well inside a single case budget.
    pub const BATTERY_TIMEOUT_IN_CYCLES: WdtTimeout = WdtTimeout::new_const(8 * 1024);

    pub const fn new_const(timeout_cycles: u64) -> Self {
        match core::num::NonZeroU64::new(timeout_cycles) {
            Some(val) => Self(val),
            None => panic!("WdtTimeout cannot be 0"),
        }
    }
}

impl From<core::num::NonZeroU64> for WdtTimeout {
    fn from(val: core::num::NonZeroU64) -> Self {
        WdtTimeout(val)
    }
}
impl From<WdtTimeout> for core::num::NonZeroU64 {
    fn from(val: WdtTimeout) -> Self {
        val.0
    }
}
impl From<WdtTimeout> for u64 {
    fn from(val: WdtTimeout) -> Self {
        core::num::NonZeroU64::from(val).get()
    }
}

const WDT_MIN_TIMEOUT_IN_CYCLES: u64 = 1024;

bitflags! {
    /// Watchdog function selection
    pub struct WdtFunction: u32 {
        /// Underflow requests a system reset
        const RESET = 0b01;

        /// Underflow raises the underflow event flag
        const INTERRUPT = 0b10;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_conversions() {
        let timeout = WdtTimeout::new_const(500);
        assert_eq!(u64::from(timeout), 500);

        let nz = core::num::NonZeroU64::new(77).unwrap();
        assert_eq!(u64::from(WdtTimeout::from(nz)), 77);
    }

    #[test]
    fn test_function_flags_compose() {
        let both = WdtFunction::RESET | WdtFunction::INTERRUPT;
        assert!(both.contains(WdtFunction::RESET));
        assert!(both.contains(WdtFunction::INTERRUPT));
        assert!(!WdtFunction::INTERRUPT.contains(WdtFunction::RESET));
    }
}
