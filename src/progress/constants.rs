//! Progress display constants

/// Width of the progress bar display
#[allow(dead_code)]
pub const PROGRESS_BAR_WIDTH: usize = 30;

/// Bytes per megabyte for display conversions
#[allow(dead_code)]
pub const BYTES_PER_MB: f64 = 1_000_000.0;
