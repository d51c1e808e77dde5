/*++

Licensed under the Apache-2.0 license.

File Name:

    reset.rs

Abstract:

    File contains the reset cause model and the classifier for the raw
    global reset status register.

--*/

use bitfield::bitfield;

/// Classified cause of the most recent device reset
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResetCause {
    /// Power-On Reset
    PowerOn = 1,

    /// Watchdog Reset
    Watchdog = 2,

    /// Software Requested Reset
    Software = 3,

    /// Unknown Reset
    Unknown = 4,
}

impl ResetCause {
    /// Decode a cause previously encoded with `u32::from`. Returns `None`
    /// for any value outside the tag space, including the reserved 0.
    pub const fn from_tag(tag: u32) -> Option<ResetCause> {
        match tag {
            1 => Some(ResetCause::PowerOn),
            2 => Some(ResetCause::Watchdog),
            3 => Some(ResetCause::Software),
            4 => Some(ResetCause::Unknown),
            _ => None,
        }
    }
}

impl From<ResetCause> for u32 {
    fn from(cause: ResetCause) -> Self {
        cause as Self
    }
}

bitfield! {
    /// Raw view of the reset control unit's global reset status register.
    /// Flags are sticky; write-one-to-clear.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct GlobalResetStatus(u32);

    /// System (software requested) reset flag
    pub sys_reset, set_sys_reset: 0;

    /// Watchdog underflow reset flag
    pub wdt_reset, set_wdt_reset: 1;

    /// Power-on reset flag
    pub por_reset, set_por_reset: 2;
}

/// Classify a raw global reset status word.
///
/// A power-on event leaves every flag set, so the flags are consulted in
/// precedence order: power-on, then watchdog, then software. A word with
/// no recognized flag set classifies as `Unknown`.
pub fn classify_reset_status(raw: u32) -> ResetCause {
    let status = GlobalResetStatus(raw);
    if status.por_reset() {
        ResetCause::PowerOn
    } else if status.wdt_reset() {
        ResetCause::Watchdog
    } else if status.sys_reset() {
        ResetCause::Software
    } else {
        ResetCause::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_flags() {
        let mut status = GlobalResetStatus(0);
        status.set_por_reset(true);
        assert_eq!(classify_reset_status(status.0), ResetCause::PowerOn);

        let mut status = GlobalResetStatus(0);
        status.set_wdt_reset(true);
        assert_eq!(classify_reset_status(status.0), ResetCause::Watchdog);

        let mut status = GlobalResetStatus(0);
        status.set_sys_reset(true);
        assert_eq!(classify_reset_status(status.0), ResetCause::Software);
    }

    #[test]
    fn test_classify_precedence() {
        // Power-on sets every flag; it must win.
        assert_eq!(classify_reset_status(0b111), ResetCause::PowerOn);
        // Watchdog reset also latches the system reset flag on some parts.
        assert_eq!(classify_reset_status(0b011), ResetCause::Watchdog);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_reset_status(0), ResetCause::Unknown);
        // Unrecognized high bits alone do not classify.
        assert_eq!(classify_reset_status(0xFFFF_FFF8), ResetCause::Unknown);
    }

    #[test]
    fn test_cause_tag_round_trip() {
        for cause in [
            ResetCause::PowerOn,
            ResetCause::Watchdog,
            ResetCause::Software,
            ResetCause::Unknown,
        ] {
            assert_eq!(ResetCause::from_tag(u32::from(cause)), Some(cause));
        }
        assert_eq!(ResetCause::from_tag(0), None);
        assert_eq!(ResetCause::from_tag(5), None);
    }
}
