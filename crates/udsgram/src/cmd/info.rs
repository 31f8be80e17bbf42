use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use udsgram_channel::{
    is_valid, platform, LONGEST_VALID_NAME, MAX_MESSAGE_SIZE, PATH_PREFIX, SHORTEST_VALID_NAME,
};

use crate::cmd::InfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput<'a> {
    schema_id: &'a str,
    path_prefix: &'a str,
    shortest_valid_name: usize,
    longest_valid_name: usize,
    max_message_size: usize,
    sun_path_capacity: usize,
    send_timeout_supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<ResolvedName>,
}

#[derive(Serialize)]
struct ResolvedName {
    name: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let resolved = args.name.map(|name| {
        let valid = is_valid(&name);
        let path = valid.then(|| {
            if args.no_prefix {
                name.clone()
            } else {
                format!("{PATH_PREFIX}{name}")
            }
        });
        ResolvedName { name, valid, path }
    });

    let out = InfoOutput {
        schema_id: "https://schemas.3leaps.dev/udsgram/cli/v1/info.schema.json",
        path_prefix: PATH_PREFIX,
        shortest_valid_name: SHORTEST_VALID_NAME,
        longest_valid_name: LONGEST_VALID_NAME,
        max_message_size: MAX_MESSAGE_SIZE,
        sun_path_capacity: platform::SUN_PATH_CAPACITY,
        send_timeout_supported: platform::HAS_SEND_TIMEOUT,
        resolved,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["path_prefix".to_string(), out.path_prefix.to_string()]);
            table.add_row(vec![
                "name_length".to_string(),
                format!("{}..={}", out.shortest_valid_name, out.longest_valid_name),
            ]);
            table.add_row(vec![
                "max_message_size".to_string(),
                out.max_message_size.to_string(),
            ]);
            table.add_row(vec![
                "sun_path_capacity".to_string(),
                out.sun_path_capacity.to_string(),
            ]);
            table.add_row(vec![
                "send_timeout_supported".to_string(),
                out.send_timeout_supported.to_string(),
            ]);
            if let Some(resolved) = &out.resolved {
                table.add_row(vec!["name".to_string(), resolved.name.clone()]);
                table.add_row(vec!["valid".to_string(), resolved.valid.to_string()]);
                if let Some(path) = &resolved.path {
                    table.add_row(vec!["path".to_string(), path.clone()]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("path_prefix={}", out.path_prefix);
            println!(
                "name_length={}..={}",
                out.shortest_valid_name, out.longest_valid_name
            );
            println!("max_message_size={}", out.max_message_size);
            println!("sun_path_capacity={}", out.sun_path_capacity);
            println!("send_timeout_supported={}", out.send_timeout_supported);
            if let Some(resolved) = &out.resolved {
                println!("name={} valid={}", resolved.name, resolved.valid);
                if let Some(path) = &resolved.path {
                    println!("path={path}");
                }
            }
        }
    }

    Ok(SUCCESS)
}
