// Licensed under the Apache-2.0 license

//! On-device entry point for the WDT validation battery. The board
//! support bring-up hands control here with RAM initialized; the reset
//! status register still holds the cause bits from the reset that
//! started this boot.

#![no_main]
#![no_std]

use vigil_drivers::{classify_reset_status, Ht32Board, RetentionCells};
use vigil_harness::ConsoleReporter;
use vigil_test_fw::run_battery;

#[no_mangle]
pub extern "C" fn main() -> ! {
    // Only one instance of each exists for the life of the boot.
    let mut board = unsafe { Ht32Board::new() };
    let mut store = unsafe { RetentionCells::new() };

    let cause = classify_reset_status(board.read_reset_status());
    board.clear_reset_status();

    let mut reporter = ConsoleReporter::default();
    if let Err(code) = run_battery(&mut board, &mut store, &mut reporter, cause) {
        vigil_drivers::cprintln!("[vigil] fatal err=0x{:08x}", u32::from(code));
    }

    // The run concluded; hold here until the next reset.
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(not(feature = "std"))]
#[panic_handler]
pub fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
