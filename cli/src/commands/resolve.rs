use ipsync_common::config::Config;
use ipsync_common::network::Endpoint;
use ipsync_core::{AddressResolver, Resolution};
use serde_json::json;

use crate::commands::{CommandLine, OutputMode};
use crate::terminal::{format, print};

const KEY_WIDTH: usize = 8;

pub fn resolve(cli: &CommandLine) -> anyhow::Result<()> {
    let cfg = cli.build_config(&[])?;
    let resolution = cli.resolver(&cfg).resolve();
    let endpoint = Endpoint::new(resolution.address, cfg.port);

    match cli.output_mode() {
        OutputMode::Json => {
            let report = json!({
                "address": resolution.address,
                "endpoint": endpoint,
                "fallback": resolution.fallback,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputMode::Quiet => println!("{}", plain_line(&resolution, &endpoint)),
        OutputMode::Pretty => print_resolution(cli, &cfg, &resolution, &endpoint),
    }
    Ok(())
}

/// `address endpoint`, with a trailing marker when discovery fell back.
pub fn plain_line(resolution: &Resolution, endpoint: &Endpoint) -> String {
    let mut line = format!("{} {}", resolution.address, endpoint);
    if resolution.fallback {
        line.push_str(" (fallback)");
    }
    line
}

fn print_resolution(cli: &CommandLine, cfg: &Config, resolution: &Resolution, endpoint: &Endpoint) {
    print::title("local address");
    let source: String = match cli.address {
        Some(_) => "--address override".to_string(),
        None => format!("route lookup via {}", cfg.probe),
    };
    print::key_value("Source", KEY_WIDTH, source);
    print::key_value("Address", KEY_WIDTH, format::address_value(&resolution.address));
    print::key_value("Endpoint", KEY_WIDTH, format::endpoint_value(endpoint));
    if resolution.fallback {
        print::key_value("Fallback", KEY_WIDTH, "yes, no outbound route was found");
    }
}
