use clap::Parser;
use color_eyre::Result;
use appligo::{Config, Database, Profile, cli::Cli};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(path, profile)?,
        None => Config::load_with_profile(profile)?,
    };

    appligo::logging::init(&config.log_filter);

    let db = Database::new(config.get_database_path())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    appligo::cli::run(cli.command, &db, cli.json, &mut out)?;

    Ok(())
}
