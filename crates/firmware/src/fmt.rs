//! Logging shim.
//!
//! `defmt` on the target, `tracing` on the desktop, nothing otherwise.
//! Arguments are limited to what both backends format with `{}`: integers
//! and `&str`.
#![allow(unused_macros)]

macro_rules! log_with {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($s $(, $x)*);
        #[cfg(all(feature = "std", not(feature = "defmt")))]
        ::tracing::$level!($s $(, $x)*);
        #[cfg(not(any(feature = "std", feature = "defmt")))]
        let _ = ($(&$x),*);
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => {
        log_with!(trace, $($arg)*)
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        log_with!(debug, $($arg)*)
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        log_with!(info, $($arg)*)
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        log_with!(warn, $($arg)*)
    };
}

macro_rules! error {
    ($($arg:tt)*) => {
        log_with!(error, $($arg)*)
    };
}
