// Licensed under the Apache-2.0 license

//! The WDT validation battery. Shared between the on-device binary and
//! the host-side tests that run the same registry against the hw-model.

#![cfg_attr(not(feature = "std"), no_std)]

use vigil_drivers::{BoardOps, LedgerStore, ResetCause, WdtFunction, WdtTimeout};
use vigil_error::{VigilError, VigilResult};
use vigil_harness::{
    BuildInfo, CaseCtx, Dispatcher, Reporter, RunSummary, StepVerdict, SuiteRegistry, TestCase,
    TestSuite,
};

pub const COMPONENT_NAME: &str = "HT32F125x WDT Packet";
pub const COMPONENT_VERSION: &str = "V1.0.0";
pub const BOARD_NAME: &str = "HT32F125x board";

fn clear_event_setup(ctx: &mut CaseCtx) -> VigilResult<()> {
    ctx.board().clear_watchdog_event();
    Ok(())
}

fn quiesce_setup(ctx: &mut CaseCtx) -> VigilResult<()> {
    ctx.board().disarm_watchdog()
}

fn disarm_teardown(ctx: &mut CaseCtx) -> VigilResult<()> {
    ctx.board().disarm_watchdog()
}

/// Arm the watchdog in reset mode and let it expire. The case passes by
/// never reaching the end of its first step; the engine re-enters at step
/// 1 once the part comes back with a watchdog reset on record.
fn wdt_reset_execute(ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
    match ctx.step() {
        0 => {
            let period = u64::from(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES);
            ctx.checkpoint(1, ResetCause::Watchdog)?;
            ctx.board()
                .arm_watchdog(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES, WdtFunction::RESET)?;
            ctx.board().delay_cycles(2 * period);
            // Still running two periods past arming.
            Err(VigilError::TEST_WDT_RESET_MISSED)
        }
        _ => Ok(StepVerdict::Done),
    }
}

/// Keep refreshing at a quarter of the period for two full periods; the
/// watchdog must never bite.
fn wdt_refresh_execute(ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
    let period = u64::from(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES);
    ctx.board()
        .arm_watchdog(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES, WdtFunction::RESET)?;
    for _ in 0..8 {
        ctx.board().delay_cycles(period / 4);
        ctx.board().refresh_watchdog()?;
    }
    Ok(StepVerdict::Done)
}

/// Underflow in interrupt mode must latch the event flag, and the flag
/// must stay down once cleared.
fn wdt_interrupt_execute(ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
    let period = u64::from(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES);
    ctx.board()
        .arm_watchdog(WdtTimeout::BATTERY_TIMEOUT_IN_CYCLES, WdtFunction::INTERRUPT)?;
    ctx.board().delay_cycles(2 * period);
    if !ctx.board().watchdog_event_pending() {
        return Err(VigilError::TEST_WDT_EVENT_NOT_PENDING);
    }
    ctx.board().clear_watchdog_event();
    if ctx.board().watchdog_event_pending() {
        return Err(VigilError::TEST_WDT_EVENT_NOT_CLEARED);
    }
    Ok(StepVerdict::Done)
}

/// Request a software reset and verify the next boot classifies it as
/// one. The request takes effect a few cycles later, hence the delay.
fn sw_reset_execute(ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
    match ctx.step() {
        0 => {
            ctx.checkpoint(1, ResetCause::Software)?;
            ctx.board().request_software_reset();
            ctx.board().delay_cycles(1024);
            Err(VigilError::TEST_SW_RESET_MISSED)
        }
        _ => Ok(StepVerdict::Done),
    }
}

static WDT_RESET_FIRES: TestCase = TestCase {
    name: "wdt_reset_fires",
    setup: clear_event_setup,
    execute: wdt_reset_execute,
    teardown: disarm_teardown,
    multi_step: true,
};

static WDT_REFRESH_HOLDS_OFF_RESET: TestCase = TestCase {
    name: "wdt_refresh_holds_off_reset",
    setup: quiesce_setup,
    execute: wdt_refresh_execute,
    teardown: disarm_teardown,
    multi_step: false,
};

static WDT_INTERRUPT_RAISES_EVENT: TestCase = TestCase {
    name: "wdt_interrupt_raises_event",
    setup: clear_event_setup,
    execute: wdt_interrupt_execute,
    teardown: disarm_teardown,
    multi_step: false,
};

static SOFTWARE_RESET_CAUSE_CLASSIFIED: TestCase = TestCase {
    name: "software_reset_cause_classified",
    setup: quiesce_setup,
    execute: sw_reset_execute,
    teardown: disarm_teardown,
    multi_step: true,
};

static RESET_FUNCTION_CASES: [&TestCase; 2] = [&WDT_RESET_FIRES, &WDT_REFRESH_HOLDS_OFF_RESET];
static RESET_FUNCTION_SUITE: TestSuite = TestSuite {
    name: "wdt reset function",
    cases: &RESET_FUNCTION_CASES,
    continue_on_failure: false,
};

static INTERRUPT_FUNCTION_CASES: [&TestCase; 1] = [&WDT_INTERRUPT_RAISES_EVENT];
static INTERRUPT_FUNCTION_SUITE: TestSuite = TestSuite {
    name: "wdt interrupt function",
    cases: &INTERRUPT_FUNCTION_CASES,
    continue_on_failure: false,
};

static RESET_CLASSIFICATION_CASES: [&TestCase; 1] = [&SOFTWARE_RESET_CAUSE_CLASSIFIED];
static RESET_CLASSIFICATION_SUITE: TestSuite = TestSuite {
    name: "reset classification",
    cases: &RESET_CLASSIFICATION_CASES,
    continue_on_failure: false,
};

static SUITES: [&TestSuite; 3] = [
    &RESET_FUNCTION_SUITE,
    &INTERRUPT_FUNCTION_SUITE,
    &RESET_CLASSIFICATION_SUITE,
];

/// The full battery. Suites keep dispatching after one concludes failed
/// so a single broken function does not hide the state of the others.
pub static REGISTRY: SuiteRegistry = SuiteRegistry {
    build: BuildInfo {
        component: COMPONENT_NAME,
        version: COMPONENT_VERSION,
        board: BOARD_NAME,
    },
    suites: &SUITES,
    continue_on_failure: true,
};

/// Run (or resume) the battery for this boot.
pub fn run_battery(
    board: &mut dyn BoardOps,
    store: &mut dyn LedgerStore,
    reporter: &mut dyn Reporter,
    cause: ResetCause,
) -> VigilResult<RunSummary> {
    Dispatcher::new(board, store, reporter, &REGISTRY).boot(cause)
}
