/*++

Licensed under the Apache-2.0 license.

File Name:

    dispatcher.rs

Abstract:

    File contains the dispatcher that walks the suite registry, runs case
    phases, and stitches a run back together after a device reset.

--*/

use vigil_drivers::{BoardOps, LedgerStore, ResetCause};
use vigil_error::{VigilError, VigilResult};

use crate::case::{CaseCtx, CaseOutcome, StepVerdict, TestCase};
use crate::ledger::{self, classify_ledger, LedgerFlags, LedgerRecord, LedgerState};
use crate::report::Reporter;
use crate::suite::SuiteRegistry;

/// Per-suite outcome counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuiteTally {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl SuiteTally {
    pub(crate) fn count(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Pass => self.passed += 1,
            CaseOutcome::Fail | CaseOutcome::Aborted => self.failed += 1,
            CaseOutcome::Skipped => self.skipped += 1,
        }
    }

    pub(crate) fn fold(&mut self, other: &SuiteTally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Result of one boot of the engine.
///
/// The counters cover the cases concluded since the last reset; earlier
/// boots of the same run already reported theirs. `overall_pass` folds in
/// the ledger's run-failed flag, so it is authoritative for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub tally: SuiteTally,
    pub overall_pass: bool,
}

/// How the first dispatched case of this boot is entered.
#[derive(Debug, Copy, Clone)]
enum CaseEntry {
    /// Start from setup.
    Fresh,

    /// The previous boot ended this case with an unexplained reset.
    /// Start over from setup and burn the one retry.
    Retry,

    /// The recorded expectation matched. Re-enter execute at `step`
    /// without re-running setup.
    Resume { step: u32 },

    /// Unexplained reset with the retry already spent. Conclude the
    /// case as failed without running its payload again.
    RetryExhausted,
}

struct BootPlan {
    suite_index: usize,
    case_index: usize,
    entry: CaseEntry,
    run_failed: bool,
    retry_consumed: bool,
    fresh_run: bool,
}

impl BootPlan {
    fn fresh() -> BootPlan {
        BootPlan {
            suite_index: 0,
            case_index: 0,
            entry: CaseEntry::Fresh,
            run_failed: false,
            retry_consumed: false,
            fresh_run: true,
        }
    }
}

/// The test engine. One instance is built per boot; continuity between
/// instances lives entirely in the ledger.
pub struct Dispatcher<'a> {
    board: &'a mut dyn BoardOps,
    store: &'a mut dyn LedgerStore,
    reporter: &'a mut dyn Reporter,
    registry: &'static SuiteRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        board: &'a mut dyn BoardOps,
        store: &'a mut dyn LedgerStore,
        reporter: &'a mut dyn Reporter,
        registry: &'static SuiteRegistry,
    ) -> Self {
        Self {
            board,
            store,
            reporter,
            registry,
        }
    }

    /// Run the battery for this boot, starting fresh or resuming the run
    /// the ledger records. `cause` is the classified reason the device
    /// booted. Returns the abort diagnostic as `Err` when a case declares
    /// the run unable to continue.
    pub fn boot(&mut self, cause: ResetCause) -> VigilResult<RunSummary> {
        let plan = self.plan_boot(cause)?;
        if plan.fresh_run {
            self.reporter.on_run_start(&self.registry.build);
        }
        self.walk(cause, plan)
    }

    /// Turn the ledger and the boot cause into a dispatch position.
    fn plan_boot(&mut self, cause: ResetCause) -> VigilResult<BootPlan> {
        let record = match classify_ledger(self.store.load(), self.registry) {
            LedgerState::Blank => return Ok(BootPlan::fresh()),
            LedgerState::Corrupt => {
                // A run was lost; say so, scrub the bank, start over.
                self.reporter.on_warning(VigilError::ENGINE_LEDGER_CORRUPT);
                ledger::clear(self.store)?;
                return Ok(BootPlan::fresh());
            }
            LedgerState::InProgress(record) => record,
        };
        let flags = record.flags();
        let retry_consumed = flags.contains(LedgerFlags::RETRY_CONSUMED);
        let entry = match record.expected() {
            Some(expected) if cause == expected => CaseEntry::Resume {
                step: record.step_ordinal,
            },
            _ if retry_consumed => CaseEntry::RetryExhausted,
            _ => CaseEntry::Retry,
        };
        Ok(BootPlan {
            suite_index: record.suite_index as usize,
            case_index: record.case_index as usize,
            entry,
            run_failed: flags.contains(LedgerFlags::RUN_FAILED),
            // A retry attempt spends the budget the moment it starts.
            retry_consumed: match entry {
                CaseEntry::Resume { .. } => retry_consumed,
                _ => true,
            },
            fresh_run: false,
        })
    }

    fn walk(&mut self, cause: ResetCause, plan: BootPlan) -> VigilResult<RunSummary> {
        let mut totals = SuiteTally::default();
        let mut run_failed = plan.run_failed;
        let mut registry_halted = false;
        let mut abort_code = None;

        for suite_index in plan.suite_index..self.registry.suites.len() {
            let suite = self.registry.suites[suite_index];
            self.reporter.on_suite_start(suite_index, suite.name);

            let mut tally = SuiteTally::default();
            let mut suite_failed = false;
            let mut suite_halted = registry_halted;
            let start_case = if suite_index == plan.suite_index {
                plan.case_index
            } else {
                0
            };

            for case_index in start_case..suite.cases.len() {
                let case = suite.cases[case_index];
                if suite_halted {
                    tally.count(CaseOutcome::Skipped);
                    self.reporter.on_case_result(
                        suite_index,
                        case_index,
                        case.name,
                        CaseOutcome::Skipped,
                        None,
                    );
                    continue;
                }

                let (entry, retry_bit) =
                    if suite_index == plan.suite_index && case_index == plan.case_index {
                        (plan.entry, plan.retry_consumed)
                    } else {
                        (CaseEntry::Fresh, false)
                    };
                let mut flags = LedgerFlags::empty();
                if run_failed {
                    flags |= LedgerFlags::RUN_FAILED;
                }
                if retry_bit {
                    flags |= LedgerFlags::RETRY_CONSUMED;
                }

                let (outcome, diagnostic) = self.run_case(
                    suite_index as u32,
                    case_index as u32,
                    case,
                    entry,
                    flags,
                    cause,
                )?;
                tally.count(outcome);
                self.reporter
                    .on_case_result(suite_index, case_index, case.name, outcome, diagnostic);

                match outcome {
                    CaseOutcome::Fail => {
                        run_failed = true;
                        suite_failed = true;
                        if !suite.continue_on_failure {
                            suite_halted = true;
                        }
                    }
                    CaseOutcome::Aborted => {
                        run_failed = true;
                        suite_failed = true;
                        abort_code = Some(diagnostic.unwrap_or(VigilError::ENGINE_RUN_ABORTED));
                        suite_halted = true;
                        registry_halted = true;
                    }
                    _ => {}
                }
            }

            self.reporter.on_suite_complete(suite_index, &tally);
            totals.fold(&tally);
            if suite_failed && !self.registry.continue_on_failure {
                registry_halted = true;
            }
        }

        // The run is over either way; leave no footprint for the next boot.
        ledger::clear(self.store)?;
        let overall_pass = !run_failed;
        self.reporter.on_run_complete(overall_pass);
        match abort_code {
            Some(code) => Err(code),
            None => Ok(RunSummary {
                tally: totals,
                overall_pass,
            }),
        }
    }

    /// Run one case attempt through its phases and fold the phase results
    /// into a single outcome. Teardown always runs, and a teardown error
    /// only surfaces when the case would otherwise pass.
    fn run_case(
        &mut self,
        suite_index: u32,
        case_index: u32,
        case: &TestCase,
        entry: CaseEntry,
        flags: LedgerFlags,
        cause: ResetCause,
    ) -> VigilResult<(CaseOutcome, Option<VigilError>)> {
        let (start_step, resumed, run_body) = match entry {
            CaseEntry::Fresh | CaseEntry::Retry => (0, false, true),
            CaseEntry::Resume { step } => (step, true, true),
            CaseEntry::RetryExhausted => (0, false, false),
        };
        if run_body {
            // Mark the case in flight before any payload code runs. A
            // resumed attempt rewrites the record so its stale expectation
            // cannot match a later unrelated reset.
            let record =
                LedgerRecord::for_position(suite_index, case_index, start_step, flags, cause);
            ledger::commit(self.store, &record)?;
        }

        let mut ctx = CaseCtx::new(
            &mut *self.board,
            &mut *self.store,
            suite_index,
            case_index,
            cause,
            flags,
            start_step,
            resumed,
        );

        enum Concluded {
            Pass,
            Fail(VigilError),
            Abort(VigilError),
        }

        let concluded = if !run_body {
            Concluded::Fail(VigilError::ENGINE_UNEXPECTED_RESET_CAUSE)
        } else {
            let setup_result = if resumed {
                Ok(())
            } else {
                (case.setup)(&mut ctx)
            };
            match setup_result {
                Err(code) => Concluded::Fail(code),
                Ok(()) => loop {
                    match (case.execute)(&mut ctx) {
                        Ok(StepVerdict::Done) => break Concluded::Pass,
                        Ok(StepVerdict::Next(step)) => ctx.set_step(step),
                        Ok(StepVerdict::Abort(code)) => break Concluded::Abort(code),
                        Err(code) => break Concluded::Fail(code),
                    }
                },
            }
        };

        let teardown_result = (case.teardown)(&mut ctx);

        Ok(match concluded {
            Concluded::Pass => match teardown_result {
                Ok(()) => (CaseOutcome::Pass, None),
                Err(code) => (CaseOutcome::Fail, Some(code)),
            },
            Concluded::Fail(code) => (CaseOutcome::Fail, Some(code)),
            Concluded::Abort(code) => (CaseOutcome::Aborted, Some(code)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{BuildInfo, TestSuite};
    use vigil_drivers::{WdtFunction, WdtTimeout, RETENTION_WORD_COUNT};

    struct FakeBoard;

    impl BoardOps for FakeBoard {
        fn arm_watchdog(&mut self, _timeout: WdtTimeout, _function: WdtFunction) -> VigilResult<()> {
            Ok(())
        }
        fn refresh_watchdog(&mut self) -> VigilResult<()> {
            Ok(())
        }
        fn disarm_watchdog(&mut self) -> VigilResult<()> {
            Ok(())
        }
        fn watchdog_event_pending(&mut self) -> bool {
            false
        }
        fn clear_watchdog_event(&mut self) {}
        fn request_software_reset(&mut self) {}
        fn delay_cycles(&mut self, _cycles: u64) {}
    }

    #[derive(Default)]
    struct FakeStore {
        words: [u32; RETENTION_WORD_COUNT],
    }

    impl LedgerStore for FakeStore {
        fn load(&mut self) -> [u32; RETENTION_WORD_COUNT] {
            self.words
        }
        fn store(&mut self, words: &[u32; RETENTION_WORD_COUNT]) -> VigilResult<()> {
            self.words = *words;
            Ok(())
        }
    }

    #[derive(Default)]
    struct EventLog {
        lines: Vec<String>,
    }

    impl Reporter for EventLog {
        fn on_run_start(&mut self, build: &BuildInfo) {
            self.lines.push(format!("start {}", build.component));
        }
        fn on_suite_start(&mut self, suite_index: usize, name: &'static str) {
            self.lines.push(format!("suite{} {}", suite_index, name));
        }
        fn on_case_result(
            &mut self,
            _suite_index: usize,
            _case_index: usize,
            name: &'static str,
            outcome: CaseOutcome,
            _diagnostic: Option<VigilError>,
        ) {
            self.lines.push(format!("{} {:?}", name, outcome));
        }
        fn on_suite_complete(&mut self, suite_index: usize, tally: &SuiteTally) {
            self.lines.push(format!(
                "done{} {}/{}/{}",
                suite_index, tally.passed, tally.failed, tally.skipped
            ));
        }
        fn on_warning(&mut self, code: VigilError) {
            self.lines.push(format!("warn {:#010x}", u32::from(code)));
        }
        fn on_run_complete(&mut self, overall_pass: bool) {
            self.lines.push(format!("complete {}", overall_pass));
        }
    }

    fn nop_setup(_ctx: &mut CaseCtx) -> VigilResult<()> {
        Ok(())
    }
    fn nop_execute(_ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
        Ok(StepVerdict::Done)
    }
    fn failing_execute(_ctx: &mut CaseCtx) -> VigilResult<StepVerdict> {
        Err(VigilError::try_from(0x1000_0001).unwrap())
    }
    fn nop_teardown(_ctx: &mut CaseCtx) -> VigilResult<()> {
        Ok(())
    }

    static PASS_A: TestCase = TestCase {
        name: "pass_a",
        setup: nop_setup,
        execute: nop_execute,
        teardown: nop_teardown,
        multi_step: false,
    };
    static PASS_B: TestCase = TestCase {
        name: "pass_b",
        setup: nop_setup,
        execute: nop_execute,
        teardown: nop_teardown,
        multi_step: false,
    };
    static FAILER: TestCase = TestCase {
        name: "failer",
        setup: nop_setup,
        execute: failing_execute,
        teardown: nop_teardown,
        multi_step: false,
    };

    #[test]
    fn test_tally_counts_outcomes() {
        let mut tally = SuiteTally::default();
        tally.count(CaseOutcome::Pass);
        tally.count(CaseOutcome::Fail);
        tally.count(CaseOutcome::Aborted);
        tally.count(CaseOutcome::Skipped);
        assert_eq!(
            tally,
            SuiteTally {
                passed: 1,
                failed: 2,
                skipped: 1,
            }
        );
    }

    #[test]
    fn test_boot_walks_registry_in_order() {
        static CASES: [&TestCase; 2] = [&PASS_A, &PASS_B];
        static SUITE: TestSuite = TestSuite {
            name: "all_pass",
            cases: &CASES,
            continue_on_failure: false,
        };
        static SUITES: [&TestSuite; 1] = [&SUITE];
        static REGISTRY: SuiteRegistry = SuiteRegistry {
            build: BuildInfo {
                component: "unit",
                version: "v0",
                board: "fake",
            },
            suites: &SUITES,
            continue_on_failure: false,
        };

        let mut board = FakeBoard;
        let mut store = FakeStore::default();
        let mut log = EventLog::default();
        let summary = Dispatcher::new(&mut board, &mut store, &mut log, &REGISTRY)
            .boot(ResetCause::PowerOn)
            .unwrap();

        assert!(summary.overall_pass);
        assert_eq!(
            summary.tally,
            SuiteTally {
                passed: 2,
                failed: 0,
                skipped: 0,
            }
        );
        assert_eq!(
            log.lines,
            vec![
                "start unit",
                "suite0 all_pass",
                "pass_a Pass",
                "pass_b Pass",
                "done0 2/0/0",
                "complete true",
            ]
        );
        // The run leaves the ledger blank.
        assert_eq!(store.words, [0; RETENTION_WORD_COUNT]);
    }

    #[test]
    fn test_failure_skips_rest_of_suite() {
        static CASES: [&TestCase; 2] = [&FAILER, &PASS_B];
        static SUITE: TestSuite = TestSuite {
            name: "fail_fast",
            cases: &CASES,
            continue_on_failure: false,
        };
        static SUITES: [&TestSuite; 1] = [&SUITE];
        static REGISTRY: SuiteRegistry = SuiteRegistry {
            build: BuildInfo {
                component: "unit",
                version: "v0",
                board: "fake",
            },
            suites: &SUITES,
            continue_on_failure: false,
        };

        let mut board = FakeBoard;
        let mut store = FakeStore::default();
        let mut log = EventLog::default();
        let summary = Dispatcher::new(&mut board, &mut store, &mut log, &REGISTRY)
            .boot(ResetCause::PowerOn)
            .unwrap();

        assert!(!summary.overall_pass);
        assert_eq!(
            summary.tally,
            SuiteTally {
                passed: 0,
                failed: 1,
                skipped: 1,
            }
        );
        assert!(log.lines.contains(&"pass_b Skipped".to_string()));
    }

    #[test]
    fn test_continue_on_failure_runs_rest_of_suite() {
        static CASES: [&TestCase; 2] = [&FAILER, &PASS_B];
        static SUITE: TestSuite = TestSuite {
            name: "keep_going",
            cases: &CASES,
            continue_on_failure: true,
        };
        static SUITES: [&TestSuite; 1] = [&SUITE];
        static REGISTRY: SuiteRegistry = SuiteRegistry {
            build: BuildInfo {
                component: "unit",
                version: "v0",
                board: "fake",
            },
            suites: &SUITES,
            continue_on_failure: false,
        };

        let mut board = FakeBoard;
        let mut store = FakeStore::default();
        let mut log = EventLog::default();
        let summary = Dispatcher::new(&mut board, &mut store, &mut log, &REGISTRY)
            .boot(ResetCause::PowerOn)
            .unwrap();

        assert!(!summary.overall_pass);
        assert_eq!(
            summary.tally,
            SuiteTally {
                passed: 1,
                failed: 1,
                skipped: 0,
            }
        );
        assert!(log.lines.contains(&"pass_b Pass".to_string()));
    }
}
