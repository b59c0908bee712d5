//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Formula evaluated to an error (invalid, div by zero) |
//! | 2    | Usage error (bad arguments, unrecognized token)      |
//! | 3    | Suggestion source unreachable or returned garbage    |
//! | 4    | Local I/O failure (settings, records file, stdout)   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The formula was well-formed input but evaluates to an error.
pub const EXIT_EVAL_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Suggestion fetch failed (network, HTTP status, bad JSON).
pub const EXIT_SUGGEST: u8 = 3;

/// Reading or writing a local file failed.
pub const EXIT_IO: u8 = 4;
