use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tkt::commands;
use tkt::commands::end::EndArgs;
use tkt::commands::gate::GateCommand;
use tkt::commands::start::StartArgs;
use tkt::telemetry;

#[derive(Debug, Parser)]
#[command(
    name = "tkt",
    version,
    about = "Ticket lifecycle orchestrator: start work in an isolated worktree, end it with a verified squash-merge"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start work on a ticket (classify, branch, worktree, delegate)
    Start(StartArgs),
    /// End work on a ticket (tests, PR, review, squash-merge, close)
    End(EndArgs),
    /// Safety gate classifiers, wired as shell hooks
    Gate {
        #[command(subcommand)]
        command: GateCommand,
    },
    /// Print the JSON Schema for .tkt.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::End(_) => "end",
            Self::Gate { .. } => "gate",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Start(args) => args.execute(),
        Commands::End(args) => args.execute(),
        Commands::Gate { command } => command.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(err) = e.downcast_ref::<tkt::error::Error>() {
                eprintln!("error: {err}");
                err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
