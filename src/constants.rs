/// Shared constants for the garbled circuits library
/// Buffer size for binary file operations (256MB)
pub const BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Progress update interval - update progress bar/spinner every N operations
pub const PROGRESS_UPDATE_INTERVAL: u32 = 1000;
