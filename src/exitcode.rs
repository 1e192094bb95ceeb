//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Fixture on disk differs from a fresh rendering (or is missing)
pub const STALE: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error: malformed tree notation or tree structure
pub const DATAERR: i32 = 65;

/// Can't create output file
pub const CANTCREAT: i32 = 73;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
