//! Operator-facing output.
//!
//! Everything meant for the person running a deployment goes through the `sh_*` macros so that
//! `--quiet` and `--json` are honoured in one place. Diagnostics belong in `tracing` instead.

use std::{
    fmt,
    io::{self, Write},
    sync::atomic::{AtomicU8, Ordering},
};
use yansi::Paint;

/// How output is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputMode {
    /// Human readable output.
    #[default]
    Normal = 0,
    /// Nothing is written to stdout; errors are still reported.
    Quiet = 1,
    /// Results are written to stdout as JSON.
    Json = 2,
}

static OUTPUT_MODE: AtomicU8 = AtomicU8::new(OutputMode::Normal as u8);

/// Sets the process-wide output mode.
pub fn set_output_mode(mode: OutputMode) {
    OUTPUT_MODE.store(mode as u8, Ordering::Relaxed);
}

/// Returns the process-wide output mode.
pub fn output_mode() -> OutputMode {
    match OUTPUT_MODE.load(Ordering::Relaxed) {
        1 => OutputMode::Quiet,
        2 => OutputMode::Json,
        _ => OutputMode::Normal,
    }
}

/// Returns `true` if results should be printed as JSON.
pub fn is_json() -> bool {
    output_mode() == OutputMode::Json
}

/// Returns `true` if stdout output is suppressed.
pub fn is_quiet() -> bool {
    output_mode() == OutputMode::Quiet
}

#[doc(hidden)]
pub fn __println(args: fmt::Arguments<'_>) -> io::Result<()> {
    if is_quiet() {
        return Ok(());
    }
    let mut out = anstream::stdout().lock();
    writeln!(out, "{args}")
}

#[doc(hidden)]
pub fn __eprintln(args: fmt::Arguments<'_>) -> io::Result<()> {
    if is_quiet() {
        return Ok(());
    }
    let mut err = anstream::stderr().lock();
    writeln!(err, "{args}")
}

#[doc(hidden)]
pub fn __warn(args: fmt::Arguments<'_>) -> io::Result<()> {
    if is_quiet() {
        return Ok(());
    }
    let mut err = anstream::stderr().lock();
    writeln!(err, "{} {args}", "Warning:".yellow().bold())
}

#[doc(hidden)]
pub fn __err(args: fmt::Arguments<'_>) -> io::Result<()> {
    let mut err = anstream::stderr().lock();
    writeln!(err, "{} {args}", "Error:".red().bold())
}

/// Prints a line to stdout, unless quiet.
#[macro_export]
macro_rules! sh_println {
    () => {
        $crate::shell::__println(::core::format_args!(""))
    };
    ($($t:tt)*) => {
        $crate::shell::__println(::core::format_args!($($t)*))
    };
}

/// Prints a line to stderr, unless quiet.
#[macro_export]
macro_rules! sh_eprintln {
    () => {
        $crate::shell::__eprintln(::core::format_args!(""))
    };
    ($($t:tt)*) => {
        $crate::shell::__eprintln(::core::format_args!($($t)*))
    };
}

/// Prints a warning to stderr, unless quiet.
#[macro_export]
macro_rules! sh_warn {
    ($($t:tt)*) => {
        $crate::shell::__warn(::core::format_args!($($t)*))
    };
}

/// Prints an error to stderr. Never suppressed.
#[macro_export]
macro_rules! sh_err {
    ($($t:tt)*) => {
        $crate::shell::__err(::core::format_args!($($t)*))
    };
}
