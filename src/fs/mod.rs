//! Filesystem utilities for proxysweep.
//!
//! Atomic write support for configuration-file rewrites: a half-written
//! shell profile or sources.list must never be observable.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_text;
