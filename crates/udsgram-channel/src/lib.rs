//! Bounded datagram IPC channels over Unix domain sockets.
//!
//! A channel is a named, message-oriented, side-asymmetric IPC primitive:
//! the server side binds a filesystem name and receives, the client side
//! connects and sends. The kernel preserves message boundaries; all blocking
//! is delegated to it via per-call timeouts. OS error numbers are translated
//! into a compact domain taxonomy at a single point.
//!
//! # Crate Structure
//!
//! - [`name`] — channel name validation and path resolution
//! - [`error`] — the error taxonomy and errno translation
//! - [`platform`] — per-platform constants and capabilities
//! - [`channel`] — the channel endpoint itself
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use udsgram_channel::{ChannelSide, DgramChannel};
//!
//! # fn main() -> udsgram_channel::Result<()> {
//! let server = DgramChannel::create("registry", ChannelSide::Server)?;
//! let client = DgramChannel::create("registry", ChannelSide::Client)?;
//!
//! client.timed_send(b"ping", Duration::from_secs(1))?;
//! assert_eq!(server.timed_receive(Duration::from_secs(1))?, "ping");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
pub mod name;
pub mod platform;

pub use channel::{
    ChannelConfig, ChannelMode, ChannelSide, DgramChannel, MAX_MESSAGE_SIZE,
};
pub use error::{ChannelError, Result};
pub use name::{is_valid, LONGEST_VALID_NAME, PATH_PREFIX, SHORTEST_VALID_NAME};
