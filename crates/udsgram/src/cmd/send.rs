use std::fs;

use udsgram_channel::ChannelSide;

use crate::cmd::{open_channel, parse_duration, SendArgs};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let payload = resolve_payload(&args)?;

    let channel = open_channel(
        &args.name,
        args.no_prefix,
        ChannelSide::Client,
        args.max_message_size,
    )?;

    channel
        .timed_send(&payload, timeout)
        .map_err(|err| channel_error("send failed", err))?;

    tracing::debug!(
        channel = %channel.name(),
        size = payload.len(),
        "message sent"
    );

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}
