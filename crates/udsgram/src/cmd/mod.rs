use std::time::Duration;

use clap::{Args, Subcommand};
use udsgram_channel::{ChannelConfig, ChannelSide, DgramChannel, MAX_MESSAGE_SIZE};

use crate::exit::{channel_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod listen;
pub mod send;
pub mod unlink;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind a server endpoint and print received messages.
    Listen(ListenArgs),
    /// Send a single message to a server endpoint.
    Send(SendArgs),
    /// Remove a stale endpoint left behind by a crashed server.
    Unlink(UnlinkArgs),
    /// Print platform limits and name resolution details.
    Info(InfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Unlink(args) => unlink::run(args, format),
        Command::Info(args) => info::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Channel name (a full socket path with --no-prefix).
    pub name: String,
    /// Use NAME as a verbatim filesystem path instead of prefixing it.
    #[arg(long)]
    pub no_prefix: bool,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Receive timeout per poll iteration (e.g. 5s, 500ms).
    #[arg(long, default_value = "500ms")]
    pub poll: String,
    /// Message size bound, including the trailing terminator.
    #[arg(long, default_value_t = MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Channel name (a full socket path with --no-prefix).
    pub name: String,
    /// Use NAME as a verbatim filesystem path instead of prefixing it.
    #[arg(long)]
    pub no_prefix: bool,
    /// Message payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the payload from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<std::path::PathBuf>,
    /// Send timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Message size bound, including the trailing terminator.
    #[arg(long, default_value_t = MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    /// Channel name (a full socket path with --no-prefix).
    pub name: String,
    /// Use NAME as a verbatim filesystem path instead of prefixing it.
    #[arg(long)]
    pub no_prefix: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Show resolution details for this channel name.
    pub name: Option<String>,
    /// Use NAME as a verbatim filesystem path instead of prefixing it.
    #[arg(long)]
    pub no_prefix: bool,
}

pub(crate) fn open_channel(
    name: &str,
    no_prefix: bool,
    side: ChannelSide,
    max_message_size: usize,
) -> CliResult<DgramChannel> {
    let config = ChannelConfig {
        max_message_size,
        ..ChannelConfig::default()
    };
    let result = if no_prefix {
        DgramChannel::create_at(name, side, &config)
    } else {
        DgramChannel::create_with_config(name, side, &config)
    };
    result.map_err(|err| channel_error("channel setup failed", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
