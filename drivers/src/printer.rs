/*++

Licensed under the Apache-2.0 license.

File Name:

    printer.rs

Abstract:

    File contains support routines and macros to print to the console

--*/
use core::fmt;

#[macro_export]
macro_rules! cprint {
    ($($arg:tt)*) => ($crate::printer::_print(core::format_args!($($arg)*)));
}

#[macro_export]
macro_rules! cprintln {
    () => ($crate::cprint!("\n"));
    ($($arg:tt)*) => ($crate::cprint!("{}\n", core::format_args!($($arg)*)));
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "std")] {
            print!("{args}");
        } else {
            let _ = args;
        }
    }
}
