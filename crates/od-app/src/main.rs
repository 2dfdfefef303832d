use anyhow::Result;
use clap::Parser;
use od_app::cli::Cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger, tramer, écrire
    let path = od_app::run(&cli)?;
    println!("{}", path.display());
    Ok(())
}
