mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, Status, resolve, sync};
use terminal::logging;
use tracing::error;

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet, commands.json);

    ExitCode::from(run(&commands))
}

fn run(commands: &CommandLine) -> Status {
    let outcome = match &commands.command {
        Commands::Sync { targets } => sync::sync(commands, targets, false),
        Commands::Check { targets } => sync::sync(commands, targets, true),
        Commands::Resolve => resolve::resolve(commands).map(|()| Status::Success),
    };

    outcome.unwrap_or_else(|e| {
        error!("{e:#}");
        Status::Fatal
    })
}
