use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use udsgram_channel::{ChannelError, ChannelSide};

use crate::cmd::{open_channel, parse_duration, ListenArgs};
use crate::exit::{channel_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let poll = parse_duration(&args.poll)?;
    let channel = open_channel(
        &args.name,
        args.no_prefix,
        ChannelSide::Server,
        args.max_message_size,
    )?;

    tracing::info!(
        channel = %channel.name(),
        path = %channel.path().display(),
        "listening for datagrams"
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let payload = match channel.timed_receive(poll) {
            Ok(payload) => payload,
            Err(ChannelError::Timeout) => continue,
            Err(err) => {
                // A signal mid-receive surfaces as an internal error; when we
                // were asked to stop that is a clean exit, not a failure.
                if !running.load(Ordering::SeqCst) {
                    tracing::info!(channel = %channel.name(), "interrupted; shutting down");
                    break;
                }
                return Err(channel_error("receive failed", err));
            }
        };

        tracing::debug!(size = payload.len(), "received message");
        print_message(channel.name(), &payload, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
