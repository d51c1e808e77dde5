/*++

Licensed under the Apache-2.0 license.

File Name:

    ledger.rs

Abstract:

    File contains the reset-continuation ledger: the record that carries
    run progress across device resets, its consistency check, and the
    write discipline around it.

--*/

use bitflags::bitflags;
use vigil_drivers::{LedgerStore, ResetCause, RETENTION_WORD_COUNT};
use vigil_error::VigilResult;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroize;

use crate::suite::SuiteRegistry;

/// Marker word of a live record ('WDT').
pub const LEDGER_MARKER: u32 = 0x57_4454;

bitflags! {
    /// Run state carried in the ledger across boots.
    pub struct LedgerFlags: u32 {
        /// Some case concluded as a failure earlier in this run.
        const RUN_FAILED = 0b01;

        /// The in-flight case already spent its one retry.
        const RETRY_CONSUMED = 0b10;
    }
}

/// The reset-continuation record, exactly one retention bank wide.
///
/// The engine is the single writer. A record is committed before every
/// action that may reset the device, so the next boot resumes the run in
/// O(1) by indexing straight to the recorded position.
#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq, FromBytes, Immutable, IntoBytes, KnownLayout, Zeroize)]
pub struct LedgerRecord {
    pub marker: u32,
    pub suite_index: u32,
    pub case_index: u32,
    pub step_ordinal: u32,
    pub expected_cause: u32,
    pub flags: u32,
    pub last_cause: u32,
    pub checksum: u32,
}

impl LedgerRecord {
    /// Record marking the given case as in flight with no reset
    /// expectation. Written at every case start.
    pub fn for_position(
        suite_index: u32,
        case_index: u32,
        step_ordinal: u32,
        flags: LedgerFlags,
        last_cause: ResetCause,
    ) -> LedgerRecord {
        let mut record = LedgerRecord {
            marker: LEDGER_MARKER,
            suite_index,
            case_index,
            step_ordinal,
            expected_cause: 0,
            flags: flags.bits(),
            last_cause: last_cause.into(),
            checksum: 0,
        };
        record.seal();
        record
    }

    /// Record announcing an imminent reset: where execute re-enters and
    /// which cause the next boot must observe.
    pub fn for_checkpoint(
        suite_index: u32,
        case_index: u32,
        resume_step: u32,
        expected: ResetCause,
        flags: LedgerFlags,
        last_cause: ResetCause,
    ) -> LedgerRecord {
        let mut record = LedgerRecord {
            marker: LEDGER_MARKER,
            suite_index,
            case_index,
            step_ordinal: resume_step,
            expected_cause: expected.into(),
            flags: flags.bits(),
            last_cause: last_cause.into(),
            checksum: 0,
        };
        record.seal();
        record
    }

    /// Recorded expectation for the next boot's reset cause, if any.
    pub fn expected(&self) -> Option<ResetCause> {
        ResetCause::from_tag(self.expected_cause)
    }

    pub fn flags(&self) -> LedgerFlags {
        LedgerFlags::from_bits_truncate(self.flags)
    }

    pub fn to_words(&self) -> [u32; RETENTION_WORD_COUNT] {
        zerocopy::transmute!(self.clone())
    }

    pub fn from_words(words: [u32; RETENTION_WORD_COUNT]) -> LedgerRecord {
        zerocopy::transmute!(words)
    }

    /// Install the zero-sum checksum word.
    pub fn seal(&mut self) {
        let words = self.to_words();
        let mut sum = 0u32;
        for word in &words[..RETENTION_WORD_COUNT - 1] {
            sum = sum.wrapping_add(*word);
        }
        self.checksum = 0u32.wrapping_sub(sum);
    }

    /// All eight words sum to zero when the record is intact.
    pub fn checksum_ok(&self) -> bool {
        let mut sum = 0u32;
        for word in self.to_words() {
            sum = sum.wrapping_add(word);
        }
        sum == 0
    }
}

/// Boot-time disposition of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerState {
    /// No run in progress.
    Blank,

    /// A run is in progress at the recorded position.
    InProgress(LedgerRecord),

    /// The bank holds data that fails the consistency check.
    Corrupt,
}

/// Validate the raw retention words against the registry.
///
/// Consistency means: live marker, zero-sum checksum, known flag bits,
/// in-range suite and case indices, decodable cause tags, and a
/// boot-spanning position only on a case declared `multi_step`.
pub fn classify_ledger(
    words: [u32; RETENTION_WORD_COUNT],
    registry: &SuiteRegistry,
) -> LedgerState {
    if words == [0; RETENTION_WORD_COUNT] {
        return LedgerState::Blank;
    }
    let record = LedgerRecord::from_words(words);
    if record.marker != LEDGER_MARKER || !record.checksum_ok() {
        return LedgerState::Corrupt;
    }
    if LedgerFlags::from_bits(record.flags).is_none() {
        return LedgerState::Corrupt;
    }
    let suite = match registry.suites.get(record.suite_index as usize) {
        Some(suite) => suite,
        None => return LedgerState::Corrupt,
    };
    let case = match suite.cases.get(record.case_index as usize) {
        Some(case) => case,
        None => return LedgerState::Corrupt,
    };
    if record.expected_cause != 0 && ResetCause::from_tag(record.expected_cause).is_none() {
        return LedgerState::Corrupt;
    }
    if ResetCause::from_tag(record.last_cause).is_none() {
        return LedgerState::Corrupt;
    }
    if (record.expected_cause != 0 || record.step_ordinal != 0) && !case.multi_step {
        return LedgerState::Corrupt;
    }
    LedgerState::InProgress(record)
}

/// Persist a record. Returns only once the words are committed.
pub(crate) fn commit(store: &mut dyn LedgerStore, record: &LedgerRecord) -> VigilResult<()> {
    store.store(&record.to_words())
}

/// Scrub the record and leave the bank blank. Ends the run's footprint.
pub(crate) fn clear(store: &mut dyn LedgerStore) -> VigilResult<()> {
    let mut record = LedgerRecord::from_words(store.load());
    record.zeroize();
    store.store(&record.to_words())
}
