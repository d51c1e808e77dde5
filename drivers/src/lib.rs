/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Vigil hardware interface library.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod board;
mod ht32;
pub mod memory_layout;
pub mod printer;
mod reset;
mod retention;
mod wdt;

pub use board::BoardOps;
pub use ht32::Ht32Board;
pub use reset::{classify_reset_status, GlobalResetStatus, ResetCause};
pub use retention::{LedgerStore, RetentionCells, RETENTION_WORD_COUNT};
pub use wdt::{WdtFunction, WdtTimeout};
