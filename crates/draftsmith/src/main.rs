use clap::Parser;
use draftsmith::cli::{self, Cli, Commands};
use draftsmith_logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Plan runs stream JSON events on stdout; keep the console quiet there.
    let quiet_console = matches!(
        cli.command,
        Commands::Plan {
            action: cli::plan::PlanAction::Run(_)
        }
    );
    if let Err(err) = init_logging(LogConfig {
        app_name: "draftsmith",
        verbose: cli.verbose,
        quiet_console,
    }) {
        eprintln!("warning: logging unavailable: {err:#}");
    }

    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
