use clap::Parser;
use mobile_locator::cli::commands::{cmd_groups, cmd_probe, cmd_show};
use mobile_locator::cli::config::{Cli, Commands, load_config};
use mobile_locator::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let log_file = logging::init(cli.verbose, &config.reports_dir())?;
    tracing::debug!(log_file = %log_file.display(), "logging initialised");

    match cli.command {
        Commands::Groups { locators } => {
            cmd_groups(locators.as_deref(), &config)?;
        }
        Commands::Show {
            group,
            platform,
            locators,
        } => {
            cmd_show(&group, &platform, locators.as_deref(), &config)?;
        }
        Commands::Probe {
            group,
            element,
            platform,
            timeout_ms,
            click,
        } => {
            let found = cmd_probe(&group, &element, &platform, timeout_ms, click, &config)?;
            if !found {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
