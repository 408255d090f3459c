//! Process exit codes of the `lleval` binary.

pub const SUCCESS: i32 = 0;
pub const ALL_FAILED: i32 = 1; // Every judge verdict failed to parse
pub const CONFIG_ERROR: i32 = 2; // Bad flags, missing files or unreadable input
