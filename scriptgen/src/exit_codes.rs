//! Stable exit codes for scriptgen CLI commands.

/// Script generated / validated, or hearing question produced.
pub const OK: i32 = 0;
/// Invalid input, config or I/O failure, or an oracle-level error.
pub const INVALID: i32 = 1;
/// The script failed validation.
pub const REJECTED: i32 = 2;
/// Generation needs more hearing material before it can succeed.
pub const NEEDS_MORE_INFO: i32 = 3;
