/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Vigil test engine.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod case;
mod dispatcher;
mod ledger;
mod report;
mod suite;

pub use case::{CaseCtx, CaseOutcome, StepVerdict, TestCase};
pub use dispatcher::{Dispatcher, RunSummary, SuiteTally};
pub use ledger::{classify_ledger, LedgerFlags, LedgerRecord, LedgerState, LEDGER_MARKER};
pub use report::{ConsoleReporter, Reporter};
pub use suite::{BuildInfo, SuiteRegistry, TestSuite};
