use clap::Parser;

use beam::cli::commands::{Cli, Commands};
use beam::cli::handlers;

fn main() {
    let cli = Cli::parse();
    let project_dir = cli.project_dir.clone();

    match cli.command {
        None => {
            // No subcommand → launch TUI
            let today = match cli.today.as_deref().map(str::parse) {
                None => None,
                Some(Ok(d)) => Some(d),
                Some(Err(_)) => {
                    eprintln!("error: invalid --today date (expected YYYY-MM-DD)");
                    std::process::exit(1);
                }
            };
            if let Err(e) = beam::tui::run(project_dir.as_deref(), today) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            // Init is handled before project discovery
            if let Err(e) = handlers::cmd_init(args) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
