/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the workspace for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Vigil Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VigilError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: VigilError = VigilError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(& 'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl VigilError {
    /// Create a vigil error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get a VigilError from a u32 is to
    /// use `VigilError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("VigilError cannot be 0"),
        }
    }

    // Use the macro to define all error constants
    define_error_constants![
        (
            ENGINE_LEDGER_CORRUPT,
            0x00010001,
            "Engine Error: continuation ledger failed its consistency check"
        ),
        (
            ENGINE_UNEXPECTED_RESET_CAUSE,
            0x00010002,
            "Engine Error: observed reset cause did not match the recorded expectation"
        ),
        (
            ENGINE_RUN_ABORTED,
            0x00010003,
            "Engine Error: a test case declared the run unable to continue"
        ),
        (
            DRIVER_WDT_INVALID_TIMEOUT,
            0x00020001,
            "Driver Error: WDT timeout interval of zero cycles"
        ),
        (
            DRIVER_WDT_NOT_ARMED,
            0x00020002,
            "Driver Error: WDT operation requires an armed watchdog"
        ),
        (
            DRIVER_RETENTION_STORE_FAILED,
            0x00030001,
            "Driver Error: retention cell write did not read back"
        ),
        (
            TEST_WDT_RESET_MISSED,
            0x00040001,
            "Test Error: armed watchdog expired without resetting the device"
        ),
        (
            TEST_WDT_EVENT_NOT_PENDING,
            0x00040002,
            "Test Error: WDT underflow event flag was never raised"
        ),
        (
            TEST_WDT_EVENT_NOT_CLEARED,
            0x00040003,
            "Test Error: WDT underflow event flag survived a clear"
        ),
        (
            TEST_SW_RESET_MISSED,
            0x00040004,
            "Test Error: requested software reset did not occur"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::VigilError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::VigilError(val)
    }
}

impl From<VigilError> for core::num::NonZeroU32 {
    fn from(val: VigilError) -> Self {
        val.0
    }
}

impl From<VigilError> for u32 {
    fn from(val: VigilError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for VigilError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(VigilError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type VigilResult<T> = Result<T, VigilError>;
