// Licensed under the Apache-2.0 license

//! Software model of a board running the validation battery, to be called
//! from tests. The model boots the engine repeatedly, carrying the
//! retention cells across simulated resets, until a boot runs to a
//! conclusion instead of resetting.

use std::collections::VecDeque;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

use vigil_drivers::{ResetCause, RETENTION_WORD_COUNT};
use vigil_error::VigilResult;
use vigil_harness::{Dispatcher, RunSummary, SuiteRegistry};

mod recorder;
mod sim;

pub use recorder::{Event, RecordingReporter};
pub use sim::{SimBoard, SimReset, SimRetention};

// Enough boots for any legitimate battery; a run still resetting past
// this is stuck in a loop.
const DEFAULT_MAX_BOOTS: u32 = 16;

/// A simulated device running a battery end to end.
pub struct Model {
    registry: &'static SuiteRegistry,
    board: SimBoard,
    retention: SimRetention,
    reporter: RecordingReporter,
    next_cause: ResetCause,
    cause_overrides: VecDeque<ResetCause>,
    max_boots: u32,
    boots: u32,
}

impl Model {
    pub fn new(registry: &'static SuiteRegistry) -> Model {
        Model {
            registry,
            board: SimBoard::new(),
            retention: SimRetention::default(),
            reporter: RecordingReporter::default(),
            next_cause: ResetCause::PowerOn,
            cause_overrides: VecDeque::new(),
            max_boots: DEFAULT_MAX_BOOTS,
            boots: 0,
        }
    }

    /// Make an upcoming boot observe `cause` instead of the cause the
    /// model would classify. Calls queue in boot order.
    pub fn override_next_boot_cause(&mut self, cause: ResetCause) {
        self.cause_overrides.push_back(cause);
    }

    pub fn set_max_boots(&mut self, max_boots: u32) {
        self.max_boots = max_boots;
    }

    /// Swallow software reset requests from here on.
    pub fn suppress_software_reset(&mut self) {
        self.board.suppress_sw_reset = true;
    }

    /// Make every retention store report a write failure from here on.
    pub fn fail_retention_stores(&mut self) {
        self.retention.fail_stores = true;
    }

    /// Preload the retention cells, as if a previous run left them there.
    pub fn seed_retention(&mut self, words: [u32; RETENTION_WORD_COUNT]) {
        self.retention.words = words;
    }

    pub fn retention_words(&self) -> [u32; RETENTION_WORD_COUNT] {
        self.retention.words
    }

    pub fn events(&self) -> &[Event] {
        self.reporter.events()
    }

    /// Concluded cases in dispatch order, across all boots so far.
    pub fn outcomes(&self) -> Vec<(&'static str, vigil_harness::CaseOutcome)> {
        self.reporter.outcomes()
    }

    pub fn boots(&self) -> u32 {
        self.boots
    }

    pub fn board(&self) -> &SimBoard {
        &self.board
    }

    /// Remove power: the board state and the retention cells clear, and
    /// the next boot classifies as power-on.
    pub fn power_cycle(&mut self) {
        self.board.hardware_reset();
        self.retention.words = [0; RETENTION_WORD_COUNT];
        self.next_cause = ResetCause::PowerOn;
    }

    /// Boot the engine until a boot concludes the run, re-booting after
    /// every simulated reset.
    ///
    /// Panics when `max_boots` boots all ended in a reset.
    pub fn run_to_completion(&mut self) -> VigilResult<RunSummary> {
        for _ in 0..self.max_boots {
            let cause = self.cause_overrides.pop_front().unwrap_or(self.next_cause);
            self.boots += 1;

            let board = &mut self.board;
            let retention = &mut self.retention;
            let reporter = &mut self.reporter;
            let registry = self.registry;
            let result = catch_unwind(AssertUnwindSafe(|| {
                Dispatcher::new(board, retention, reporter, registry).boot(cause)
            }));

            match result {
                Ok(result) => return result,
                Err(payload) => match payload.downcast::<SimReset>() {
                    Ok(reset) => {
                        self.board.hardware_reset();
                        self.next_cause = reset.cause;
                    }
                    Err(payload) => resume_unwind(payload),
                },
            }
        }
        panic!(
            "no conclusion after {} boots; the battery appears to be reset-looping",
            self.max_boots
        );
    }
}
