//! Platform facts for local datagram sockets.
//!
//! Everything the channel needs to know about the host platform lives here,
//! so the send/receive paths stay free of conditional compilation.

/// Capacity of `sockaddr_un.sun_path` in bytes.
///
/// 108 on Linux, 104 on macOS and the BSDs. A bound path must fit in
/// `SUN_PATH_CAPACITY - 1` bytes to leave room for the terminator.
#[cfg(target_os = "linux")]
pub const SUN_PATH_CAPACITY: usize = 108;
#[cfg(target_os = "macos")]
pub const SUN_PATH_CAPACITY: usize = 104;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub const SUN_PATH_CAPACITY: usize = 104;

/// Whether `SO_SNDTIMEO` is honored for local datagram sockets.
///
/// macOS accepts the option but does not apply it to `AF_LOCAL` datagram
/// sends. When this is `false`, a non-zero send timeout degrades to "no
/// timeout" and the send path emits a diagnostic.
#[cfg(target_os = "macos")]
pub const HAS_SEND_TIMEOUT: bool = false;
#[cfg(not(target_os = "macos"))]
pub const HAS_SEND_TIMEOUT: bool = true;
