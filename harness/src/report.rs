/*++

Licensed under the Apache-2.0 license.

File Name:

    report.rs

Abstract:

    File contains the reporter interface the dispatcher emits run events
    through, and the console implementation of it.

--*/

use vigil_drivers::cprintln;
use vigil_error::VigilError;

use crate::case::CaseOutcome;
use crate::dispatcher::SuiteTally;
use crate::suite::BuildInfo;

/// Sink for run lifecycle events.
///
/// The dispatcher calls these in order as the run unfolds. Reporters must
/// not drive the board or the ledger; they observe.
pub trait Reporter {
    /// A run is starting from the beginning. Not emitted when a boot
    /// resumes a run already in progress.
    fn on_run_start(&mut self, build: &BuildInfo);

    /// A suite is about to dispatch cases. Emitted again on every boot
    /// that resumes inside the suite.
    fn on_suite_start(&mut self, suite_index: usize, name: &'static str);

    /// A case concluded with the given outcome. `diagnostic` carries the
    /// failure code for `Fail` and `Aborted` outcomes.
    fn on_case_result(
        &mut self,
        suite_index: usize,
        case_index: usize,
        name: &'static str,
        outcome: CaseOutcome,
        diagnostic: Option<VigilError>,
    );

    /// All cases of a suite have been dispatched on this boot.
    fn on_suite_complete(&mut self, suite_index: usize, tally: &SuiteTally);

    /// A non-fatal condition the run recovered from.
    fn on_warning(&mut self, code: VigilError);

    /// The run is over. `overall_pass` covers every boot of the run.
    fn on_run_complete(&mut self, overall_pass: bool);
}

/// Reporter that prints over the harness console.
#[derive(Default)]
pub struct ConsoleReporter;

fn outcome_label(outcome: CaseOutcome) -> &'static str {
    match outcome {
        CaseOutcome::Pass => "ok",
        CaseOutcome::Fail => "failed",
        CaseOutcome::Skipped => "skipped",
        CaseOutcome::Aborted => "aborted",
    }
}

impl Reporter for ConsoleReporter {
    fn on_run_start(&mut self, build: &BuildInfo) {
        cprintln!(
            "[vigil] {} {} on {}",
            build.component,
            build.version,
            build.board
        );
    }

    fn on_suite_start(&mut self, suite_index: usize, name: &'static str) {
        cprintln!("[suite{}] {}", suite_index, name);
    }

    fn on_case_result(
        &mut self,
        _suite_index: usize,
        _case_index: usize,
        name: &'static str,
        outcome: CaseOutcome,
        diagnostic: Option<VigilError>,
    ) {
        match diagnostic {
            Some(code) => cprintln!(
                "[case] {} [{}] err=0x{:08x}",
                name,
                outcome_label(outcome),
                u32::from(code)
            ),
            None => cprintln!("[case] {} [{}]", name, outcome_label(outcome)),
        }
    }

    fn on_suite_complete(&mut self, suite_index: usize, tally: &SuiteTally) {
        cprintln!(
            "[suite{}] {} passed {} failed {} skipped",
            suite_index,
            tally.passed,
            tally.failed,
            tally.skipped
        );
    }

    fn on_warning(&mut self, code: VigilError) {
        cprintln!("[warn] err=0x{:08x}", u32::from(code));
    }

    fn on_run_complete(&mut self, overall_pass: bool) {
        if overall_pass {
            cprintln!("[vigil] result PASS");
        } else {
            cprintln!("[vigil] result FAIL");
        }
    }
}
