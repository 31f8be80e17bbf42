use serde::Serialize;
use udsgram_channel::DgramChannel;

use crate::cmd::UnlinkArgs;
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct UnlinkOutput<'a> {
    schema_id: &'a str,
    name: &'a str,
    removed: bool,
}

pub fn run(args: UnlinkArgs, format: OutputFormat) -> CliResult<i32> {
    let removed = if args.no_prefix {
        DgramChannel::unlink_if_exists_at(&args.name)
    } else {
        DgramChannel::unlink_if_exists(&args.name)
    }
    .map_err(|err| channel_error("unlink failed", err))?;

    if removed {
        tracing::info!(name = %args.name, "removed stale endpoint");
    }

    match format {
        OutputFormat::Json => {
            let out = UnlinkOutput {
                schema_id: "https://schemas.3leaps.dev/udsgram/cli/v1/unlink-result.schema.json",
                name: &args.name,
                removed,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            if removed {
                println!("removed stale endpoint for {}", args.name);
            } else {
                println!("no endpoint found for {}", args.name);
            }
        }
    }

    Ok(SUCCESS)
}
