use std::fmt;
use std::io;

use udsgram_channel::ChannelError;

// Exit codes: sysexits-style usage/data values, 124 for timeouts as in
// coreutils timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CHANNEL_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    let code = match err {
        ChannelError::AccessDenied => PERMISSION_DENIED,
        ChannelError::Timeout => TIMEOUT,
        ChannelError::InvalidChannelName
        | ChannelError::InvalidArguments
        | ChannelError::MaxMessageSizeExceeded => USAGE,
        ChannelError::MessageTooLong => DATA_INVALID,
        ChannelError::NoSuchChannel
        | ChannelError::ChannelAlreadyExists
        | ChannelError::ConnectionResetByPeer => FAILURE,
        ChannelError::InternalLogicError => INTERNAL,
        _ => CHANNEL_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}
