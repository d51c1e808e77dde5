/*++

Licensed under the Apache-2.0 license.

File Name:

    board.rs

Abstract:

    File contains the board operations trait consumed by the test engine.

--*/

use crate::wdt::{WdtFunction, WdtTimeout};
use vigil_error::VigilResult;

/// Operations the test engine needs from the board under test.
///
/// Every hardware effect of a test payload goes through this trait, so the
/// same payloads run against real silicon and against a software model.
pub trait BoardOps {
    /// Program the watchdog with the given period and function selection
    /// and start it counting down.
    fn arm_watchdog(&mut self, timeout: WdtTimeout, function: WdtFunction) -> VigilResult<()>;

    /// Reload the armed watchdog counter to its programmed period.
    fn refresh_watchdog(&mut self) -> VigilResult<()>;

    /// Stop the watchdog counting. Used by teardown to quiesce the
    /// peripheral between cases.
    fn disarm_watchdog(&mut self) -> VigilResult<()>;

    /// Whether the watchdog underflow event flag is raised.
    fn watchdog_event_pending(&mut self) -> bool;

    /// Clear the watchdog underflow event flag.
    fn clear_watchdog_event(&mut self);

    /// Request a system reset. On hardware the reset takes effect a few
    /// cycles after the request, so this returns and the caller waits.
    fn request_software_reset(&mut self);

    /// Busy-wait for approximately the given number of cycles.
    fn delay_cycles(&mut self, cycles: u64);
}
