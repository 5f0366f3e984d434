//! Server defaults and input limits.
//!
//! Runtime values come from CLI arguments and environment variables in
//! `main.rs`; these constants are their defaults.

/// Address the HTTP server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

/// Backing CSV file.
pub const DEFAULT_DATA_FILE: &str = "friends_data.csv";

/// Page size used when `per_page` is omitted.
pub const DEFAULT_PER_PAGE: usize = 5;

/// Requested page sizes above this are clamped.
pub const DEFAULT_MAX_PER_PAGE: usize = 100;

/// Capacity of the store runtime command channel.
pub const DEFAULT_QUEUE_BOUND: usize = 256;

/// Largest accepted request body (update payloads are small objects).
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
