//! Bounded datagram IPC channels over Unix domain sockets.
//!
//! This crate is the convenience facade over the workspace: depend on it and
//! use [`channel`], or install the `udsgram` binary for the CLI.
//!
//! # Crate Structure
//!
//! - [`channel`] — the datagram channel endpoint, name validation, and the
//!   error taxonomy

/// Re-export channel types.
pub mod channel {
    pub use udsgram_channel::*;
}
