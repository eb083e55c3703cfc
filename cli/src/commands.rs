pub mod resolve;
pub mod sync;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipsync_common::config::{Config, MatchPolicy, TargetConfig};
use ipsync_common::network::Address;
use ipsync_core::{AddressResolver, FixedResolver, RouteProbeResolver};
use tracing::debug;

#[derive(Parser)]
#[command(name = "ipsync")]
#[command(version)]
#[command(about = "Keeps embedded server endpoints in sync with this host's LAN address.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./ipsync.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Port used to build and match endpoint URLs
    #[arg(short, long, global = true, env = "IPSYNC_PORT")]
    pub port: Option<u16>,

    /// Destination used for the route probe; nothing is sent to it
    #[arg(long, global = true, env = "IPSYNC_PROBE")]
    pub probe: Option<SocketAddr>,

    /// Match policy for targets that do not name one
    #[arg(long, global = true)]
    pub policy: Option<MatchPolicy>,

    /// Announce this address instead of discovering one
    #[arg(short, long, global = true)]
    pub address: Option<Address>,

    /// Print the run report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite the endpoint in every target file
    #[command(alias = "s")]
    Sync {
        /// Target files, optionally suffixed with `=bare` or `=scoped`.
        /// Replaces the targets from the config file.
        targets: Vec<TargetConfig>,
    },
    /// Show what `sync` would change without writing anything
    #[command(alias = "c")]
    Check { targets: Vec<TargetConfig> },
    /// Print the address and endpoint this host would announce
    #[command(alias = "r")]
    Resolve,
}

/// How a command renders its result on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    /// One plain line, nothing else.
    Quiet,
    Json,
}

/// Process outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// A run finished but no target could be handled.
    TotalFailure,
    /// Configuration problems no run can recover from.
    Fatal,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::TotalFailure => 1,
            Status::Fatal => 2,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// `--json` wins over `--quiet`.
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Pretty
        }
    }

    /// Layers flags over the config file over the built-in defaults.
    pub fn build_config(&self, targets: &[TargetConfig]) -> anyhow::Result<Config> {
        let (mut cfg, source) =
            Config::discover(self.config.as_deref()).context("failed to load configuration")?;

        if let Some(source) = source {
            debug!("Loaded configuration from {}", source.display());
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(probe) = self.probe {
            cfg.probe = probe;
        }
        if let Some(policy) = self.policy {
            cfg.default_policy = policy;
        }
        if !targets.is_empty() {
            cfg.targets = targets.to_vec();
        }

        Ok(cfg)
    }

    pub fn resolver(&self, cfg: &Config) -> Box<dyn AddressResolver> {
        match self.address {
            Some(address) => Box::new(FixedResolver(address)),
            None => Box::new(RouteProbeResolver::new(cfg.probe)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        CommandLine::command().debug_assert();
    }

    #[test]
    fn sync_accepts_targets_with_policies() {
        let cli = CommandLine::try_parse_from([
            "ipsync",
            "sync",
            "frontend/script.js=bare",
            "client.conf",
            "--port",
            "8080",
        ])
        .unwrap();

        assert_eq!(cli.port, Some(8080));
        match cli.command {
            Commands::Sync { targets } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(targets[0].policy, Some(MatchPolicy::BareAddress));
                assert_eq!(targets[1].path, PathBuf::from("client.conf"));
                assert_eq!(targets[1].policy, None);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn output_mode_follows_flags() {
        let mode = |args: &[&str]| CommandLine::try_parse_from(args).unwrap().output_mode();

        assert_eq!(mode(&["ipsync", "resolve"]), OutputMode::Pretty);
        assert_eq!(mode(&["ipsync", "resolve", "-q"]), OutputMode::Quiet);
        assert_eq!(mode(&["ipsync", "sync", "--json"]), OutputMode::Json);
        assert_eq!(mode(&["ipsync", "sync", "--json", "--quiet"]), OutputMode::Json);
    }

    #[test]
    fn status_codes_are_distinct() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::TotalFailure.code(), 1);
        assert_eq!(Status::Fatal.code(), 2);
    }

    #[test]
    fn address_override_must_be_unicast() {
        let result = CommandLine::try_parse_from(["ipsync", "resolve", "--address", "0.0.0.0"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ipsync.toml");
        std::fs::write(&path, "port = 7000\n[[targets]]\npath = \"a.js\"\n").unwrap();

        let cli = CommandLine::try_parse_from([
            "ipsync",
            "check",
            "--config",
            path.to_str().unwrap(),
            "--policy",
            "bare",
        ])
        .unwrap();
        let cfg = cli.build_config(&[]).unwrap();

        assert_eq!(cfg.default_policy, MatchPolicy::BareAddress);
        assert_eq!(cfg.targets[0].path, dir.path().join("a.js"));
        if std::env::var_os("IPSYNC_PORT").is_none() {
            assert_eq!(cfg.port, 7000);
        }
    }
}
