//! Logging macros.
//! With the `defmt` feature these are the defmt macros, otherwise they
//! compile to nothing while still type-checking their arguments.

#![allow(unused_macros, unused_imports)]

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, trace};

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($($arg:tt)+) => {{
        let _ = ::core::format_args!($($arg)+);
    }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)+) => {{
        let _ = ::core::format_args!($($arg)+);
    }};
}

#[cfg(not(feature = "defmt"))]
pub(crate) use debug;
#[cfg(not(feature = "defmt"))]
pub(crate) use trace;
