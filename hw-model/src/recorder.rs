// Licensed under the Apache-2.0 license

use vigil_error::VigilError;
use vigil_harness::{BuildInfo, CaseOutcome, Reporter, SuiteTally};

/// One reporter callback, captured verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RunStart {
        component: &'static str,
        version: &'static str,
        board: &'static str,
    },
    SuiteStart {
        suite: usize,
        name: &'static str,
    },
    CaseResult {
        suite: usize,
        case: usize,
        name: &'static str,
        outcome: CaseOutcome,
        diagnostic: Option<VigilError>,
    },
    SuiteComplete {
        suite: usize,
        passed: u32,
        failed: u32,
        skipped: u32,
    },
    Warning {
        code: VigilError,
    },
    RunComplete {
        overall_pass: bool,
    },
}

/// Reporter that records every event for later assertions. Events from
/// successive boots of the same model append to one list.
#[derive(Default)]
pub struct RecordingReporter {
    events: Vec<Event>,
}

impl RecordingReporter {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Concluded cases in dispatch order.
    pub fn outcomes(&self) -> Vec<(&'static str, CaseOutcome)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::CaseResult { name, outcome, .. } => Some((*name, *outcome)),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn on_run_start(&mut self, build: &BuildInfo) {
        self.events.push(Event::RunStart {
            component: build.component,
            version: build.version,
            board: build.board,
        });
    }

    fn on_suite_start(&mut self, suite_index: usize, name: &'static str) {
        self.events.push(Event::SuiteStart {
            suite: suite_index,
            name,
        });
    }

    fn on_case_result(
        &mut self,
        suite_index: usize,
        case_index: usize,
        name: &'static str,
        outcome: CaseOutcome,
        diagnostic: Option<VigilError>,
    ) {
        self.events.push(Event::CaseResult {
            suite: suite_index,
            case: case_index,
            name,
            outcome,
            diagnostic,
        });
    }

    fn on_suite_complete(&mut self, suite_index: usize, tally: &SuiteTally) {
        self.events.push(Event::SuiteComplete {
            suite: suite_index,
            passed: tally.passed,
            failed: tally.failed,
            skipped: tally.skipped,
        });
    }

    fn on_warning(&mut self, code: VigilError) {
        self.events.push(Event::Warning { code });
    }

    fn on_run_complete(&mut self, overall_pass: bool) {
        self.events.push(Event::RunComplete { overall_pass });
    }
}
