//!
//! # Global defaults
//!
//! Default values and environment variable names shared across weft crates.
//!

// -----------------------------------
// Data directory
// -----------------------------------

/// Base directory for partition data
pub const WEFT_DATA_DIR: &str = "/var/lib/weft";

pub const ENV_WEFT_DATA_DIR: &str = "WEFT_DATA_DIR";

// -----------------------------------
// Disk space monitoring
// -----------------------------------

/// Minimum free bytes on the data volume before processing is paused (2 GiB)
pub const DISK_FREE_MIN_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// How often the disk space watermark is evaluated
pub const DISK_CHECK_INTERVAL_MS: u32 = 5_000;

pub const ENV_WEFT_DISK_FREE_MIN_BYTES: &str = "WEFT_DISK_FREE_MIN_BYTES";
pub const ENV_WEFT_DISK_CHECK_INTERVAL_MS: &str = "WEFT_DISK_CHECK_INTERVAL_MS";

// -----------------------------------
// Health supervision
// -----------------------------------

/// How often the health supervisor re-evaluates its components in addition
/// to push events
pub const HEALTH_CHECK_INTERVAL_MS: u32 = 60_000;

pub const ENV_WEFT_HEALTH_CHECK_INTERVAL_MS: &str = "WEFT_HEALTH_CHECK_INTERVAL_MS";
