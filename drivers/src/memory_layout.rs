/*++
Licensed under the Apache-2.0 license.

File Name:

    memory_layout.rs

Abstract:

    The file contains the memory layout of the reference board. The
    constants defined in this file define the memory layout.

--*/

#[cfg(test)]
use crate::retention::RETENTION_WORD_COUNT;

//
// Memory Addresses
//
pub const FLASH_ORG: u32 = 0x00000000;
pub const SRAM_ORG: u32 = 0x20000000;
pub const RETENTION_ORG: u32 = 0x20000FE0;
pub const WDT_ORG: u32 = 0x40068000;
pub const RSTCU_ORG: u32 = 0x40088000;

//
// Memory Sizes In Bytes
//
pub const FLASH_SIZE: u32 = 32 * 1024;
pub const SRAM_SIZE: u32 = 4 * 1024;
pub const RETENTION_SIZE: u32 = 32;

#[test]
#[allow(clippy::assertions_on_constants)]
fn mem_layout_test_retention() {
    assert_eq!(RETENTION_SIZE as usize, RETENTION_WORD_COUNT * 4);
    // The bank claims the top of SRAM; the linker script must end RAM at
    // RETENTION_ORG so firmware data never lands on it.
    assert_eq!(RETENTION_ORG + RETENTION_SIZE, SRAM_ORG + SRAM_SIZE);
    assert_eq!(RETENTION_ORG % 4, 0);
}
