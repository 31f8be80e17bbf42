//! Domain error taxonomy and errno translation.
//!
//! Every fallible channel operation returns one of the kinds below instead
//! of a raw OS error number. The variants are fieldless so callers can
//! compare kinds directly.

use std::io;

use tracing::error;

/// Errors reported by datagram channel operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel name failed validation or the resolved path does not fit
    /// the platform address structure.
    #[error("invalid channel name")]
    InvalidChannelName,

    /// The requested message size exceeds [`MAX_MESSAGE_SIZE`].
    ///
    /// [`MAX_MESSAGE_SIZE`]: crate::channel::MAX_MESSAGE_SIZE
    #[error("maximum message size exceeded")]
    MaxMessageSizeExceeded,

    /// The payload plus its terminator does not fit the channel's message
    /// size bound.
    #[error("message too long")]
    MessageTooLong,

    /// Filesystem or socket permissions forbid the operation.
    #[error("access denied")]
    AccessDenied,

    /// The OS rejected an argument of the underlying call.
    #[error("invalid arguments")]
    InvalidArguments,

    /// The per-process file descriptor limit is reached.
    #[error("process file descriptor limit reached")]
    ProcessLimit,

    /// The system-wide file descriptor limit is reached.
    #[error("system file descriptor limit reached")]
    SystemLimit,

    /// The kernel could not allocate memory or buffers.
    #[error("out of memory")]
    OutOfMemory,

    /// A server endpoint is already bound under this name.
    #[error("channel already exists")]
    ChannelAlreadyExists,

    /// The descriptor is not an open socket.
    #[error("invalid file descriptor")]
    InvalidFileDescriptor,

    /// No server endpoint exists under this name.
    #[error("no such channel")]
    NoSuchChannel,

    /// The peer closed the channel underneath us.
    #[error("connection reset by peer")]
    ConnectionResetByPeer,

    /// A low-level I/O error occurred.
    #[error("i/o error")]
    Io,

    /// The operation did not complete within the configured timeout.
    ///
    /// Expected outcome of a timed receive; never logged.
    #[error("timed out")]
    Timeout,

    /// A condition that indicates a bug rather than an environment problem:
    /// an unexpected errno or a role violation. A diagnostic line has been
    /// emitted.
    #[error("internal logic error")]
    InternalLogicError,
}

pub type Result<T> = std::result::Result<T, ChannelError>;

impl ChannelError {
    /// Translate an OS error number into its domain error.
    ///
    /// The catch-all arm is the only one that logs: an unexpected errno on a
    /// local datagram socket is a bug, not an environment condition, and the
    /// diagnostic names the channel that hit it.
    pub fn from_errno(errno: i32, channel: &str) -> Self {
        match errno {
            libc::EACCES => Self::AccessDenied,
            libc::EAFNOSUPPORT | libc::EINVAL | libc::EPROTONOSUPPORT | libc::ENOPROTOOPT => {
                Self::InvalidArguments
            }
            libc::EMFILE => Self::ProcessLimit,
            libc::ENFILE => Self::SystemLimit,
            libc::ENOBUFS | libc::ENOMEM => Self::OutOfMemory,
            libc::EADDRINUSE => Self::ChannelAlreadyExists,
            libc::EBADF | libc::ENOTSOCK => Self::InvalidFileDescriptor,
            libc::EADDRNOTAVAIL
            | libc::EFAULT
            | libc::ELOOP
            | libc::ENAMETOOLONG
            | libc::ENOTDIR
            | libc::EROFS => Self::InvalidChannelName,
            libc::ENOENT | libc::ECONNREFUSED => Self::NoSuchChannel,
            libc::ECONNRESET => Self::ConnectionResetByPeer,
            libc::EIO => Self::Io,
            // EAGAIN has the same value on every supported platform.
            libc::EWOULDBLOCK => Self::Timeout,
            other => {
                error!(channel, errno = other, "unexpected errno on datagram channel");
                Self::InternalLogicError
            }
        }
    }

    /// Translate a std I/O error via its raw OS error number.
    ///
    /// An error without an errno (a synthetic `io::Error`) has no row in the
    /// table and lands in the catch-all.
    pub(crate) fn from_io(err: &io::Error, channel: &str) -> Self {
        Self::from_errno(err.raw_os_error().unwrap_or(0), channel)
    }
}
