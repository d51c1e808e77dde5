/*++

Licensed under the Apache-2.0 license.

File Name:

    case.rs

Abstract:

    File contains the test case data model and the per-attempt execution
    context handed to case payloads.

--*/

use vigil_drivers::{BoardOps, LedgerStore, ResetCause};
use vigil_error::{VigilError, VigilResult};

use crate::ledger::{self, LedgerFlags, LedgerRecord};

/// What an execute invocation tells the engine to do next.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepVerdict {
    /// The attempt concluded with a passing verdict.
    Done,

    /// Re-enter execute at the given step ordinal within this boot.
    Next(u32),

    /// The run cannot continue. Terminal for the whole battery.
    Abort(VigilError),
}

/// Outcome of one test case.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CaseOutcome {
    Pass,
    Fail,
    Skipped,
    Aborted,
}

/// A single hardware validation check.
///
/// The three phases are a closed capability set: the engine drives them
/// through plain fn pointers and every hardware effect goes through the
/// `CaseCtx` handed in, so payloads stay portable between silicon and the
/// software model.
pub struct TestCase {
    pub name: &'static str,
    pub setup: fn(&mut CaseCtx) -> VigilResult<()>,
    pub execute: fn(&mut CaseCtx) -> VigilResult<StepVerdict>,
    pub teardown: fn(&mut CaseCtx) -> VigilResult<()>,

    /// Whether execute may span reboots via `CaseCtx::checkpoint`.
    pub multi_step: bool,
}

/// Execution context of one case attempt.
pub struct CaseCtx<'a> {
    board: &'a mut dyn BoardOps,
    store: &'a mut dyn LedgerStore,
    suite_index: u32,
    case_index: u32,
    boot_cause: ResetCause,
    flags: LedgerFlags,
    step: u32,
    resumed: bool,
}

impl<'a> CaseCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        board: &'a mut dyn BoardOps,
        store: &'a mut dyn LedgerStore,
        suite_index: u32,
        case_index: u32,
        boot_cause: ResetCause,
        flags: LedgerFlags,
        step: u32,
        resumed: bool,
    ) -> Self {
        Self {
            board,
            store,
            suite_index,
            case_index,
            boot_cause,
            flags,
            step,
            resumed,
        }
    }

    /// Board under test.
    pub fn board(&mut self) -> &mut dyn BoardOps {
        &mut *self.board
    }

    /// Step ordinal this invocation entered at.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Classified cause of the boot this attempt is running in.
    pub fn boot_cause(&self) -> ResetCause {
        self.boot_cause
    }

    /// Whether this attempt re-entered execute after a reset.
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    /// Record where execution must resume and which reset cause the next
    /// boot is expected to observe. The ledger write completes before
    /// this returns, so the caller may trigger the reset on the very next
    /// instruction.
    pub fn checkpoint(&mut self, resume_step: u32, expected: ResetCause) -> VigilResult<()> {
        let record = LedgerRecord::for_checkpoint(
            self.suite_index,
            self.case_index,
            resume_step,
            expected,
            self.flags,
            self.boot_cause,
        );
        ledger::commit(self.store, &record)
    }

    pub(crate) fn set_step(&mut self, step: u32) {
        self.step = step;
    }
}
