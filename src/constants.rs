// src/constants.rs

/// Greeting sent with the 220 reply on a new control connection.
pub const DEFAULT_GREETING: &str = "Welcome.";

/// Goodbye message used for QUIT and 421 teardown replies.
pub const DEFAULT_GOODBYE: &str = "Goodbye.";

/// Control-channel bind address when none is configured (TCP 21).
pub const DEFAULT_ADDR: &str = "0.0.0.0:21";

/// Flush threshold of the data-channel write buffer.
pub const DATA_BUFFER_SIZE: usize = 8 * 1024;

/// MDTM timestamp layout (YYYYMMDDHHMMSS).
pub const MDTM_FORMAT: &str = "%Y%m%d%H%M%S";
