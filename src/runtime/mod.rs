//! Single-writer store runtime.

/// Handle and command loop implementation.
pub mod handle;
