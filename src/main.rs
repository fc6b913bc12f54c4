use clap::Parser;
use mentions::cli::commands::{Cli, Commands};
use mentions::cli::handlers;

fn main() {
    let cli = Cli::parse();

    // The terminal belongs to the editor; it only logs when given a file
    let interactive = matches!(cli.command, None | Some(Commands::Edit(_)));
    if (cli.log.is_some() || !interactive)
        && let Err(e) = handlers::init_logging(cli.log.as_deref())
    {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
