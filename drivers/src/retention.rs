/*++

Licensed under the Apache-2.0 license.

File Name:

    retention.rs

Abstract:

    File contains the reset-surviving storage used by the continuation
    ledger.

--*/

use crate::memory_layout;
use vigil_error::{VigilError, VigilResult};

/// Width of the retention bank in 32-bit words.
pub const RETENTION_WORD_COUNT: usize = 8;

/// Reset-surviving storage, one ledger record wide.
///
/// The bank keeps its contents across watchdog and software resets but not
/// across power removal; a bank that was never written reads back as noise
/// the record-level consistency check rejects.
pub trait LedgerStore {
    /// Read the whole bank.
    fn load(&mut self) -> [u32; RETENTION_WORD_COUNT];

    /// Persist the whole bank. The words are committed before this
    /// returns, so a reset on the very next instruction loses nothing.
    fn store(&mut self, words: &[u32; RETENTION_WORD_COUNT]) -> VigilResult<()>;
}

/// Retention cells at the reserved top of SRAM, kept out of the linker
/// map so firmware loads never touch them.
pub struct RetentionCells {
    base: *mut u32,
}

impl RetentionCells {
    /// Map the retention bank.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `memory_layout::RETENTION_ORG` is
    /// backed by memory that survives the resets under test and that no
    /// other code aliases the bank.
    pub unsafe fn new() -> Self {
        Self {
            base: memory_layout::RETENTION_ORG as *mut u32,
        }
    }
}

impl LedgerStore for RetentionCells {
    fn load(&mut self) -> [u32; RETENTION_WORD_COUNT] {
        let mut words = [0; RETENTION_WORD_COUNT];
        for (i, word) in words.iter_mut().enumerate() {
            *word = unsafe { core::ptr::read_volatile(self.base.add(i)) };
        }
        words
    }

    fn store(&mut self, words: &[u32; RETENTION_WORD_COUNT]) -> VigilResult<()> {
        for (i, word) in words.iter().enumerate() {
            unsafe { core::ptr::write_volatile(self.base.add(i), *word) };
        }
        // Banks in a locked power domain drop writes silently; read back
        // so a failed commit is caught before any reset-inducing action.
        for (i, word) in words.iter().enumerate() {
            if unsafe { core::ptr::read_volatile(self.base.add(i)) } != *word {
                return Err(VigilError::DRIVER_RETENTION_STORE_FAILED);
            }
        }
        Ok(())
    }
}
