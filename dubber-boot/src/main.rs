use clap::Parser;
use dubber_boot::bootstrap::{BootstrapError, FATAL_EXIT_CODE};
use dubber_boot::commands::{BootstrapCommands, GlobalArgs, handle_bootstrap_command};
use dubber_boot::logging::init_tracing;

/// Prepare this machine for the Khmer AI video dubber and launch it
#[derive(Debug, Parser)]
#[command(name = "dubber-boot", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<BootstrapCommands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose, cli.global.quiet);

    let command = cli.command.unwrap_or_default();
    let code = match handle_bootstrap_command(command, &cli.global).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(failure) = e.downcast_ref::<BootstrapError>() {
                eprintln!("❌ Bootstrap stopped at the {} step", failure.step());
            }
            eprintln!("❌ {:#}", e);
            FATAL_EXIT_CODE
        }
    };

    std::process::exit(code);
}
