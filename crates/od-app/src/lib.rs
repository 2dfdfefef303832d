/// Application ordith : image → niveaux de gris → tramage ordonné → fichier.

pub mod cli;
pub mod source;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use od_core::config::DitherConfig;
use od_dither::engine::OrderedDither;

/// Résout la config : fichier `--config` s'il existe, défauts sinon,
/// puis overrides CLI.
///
/// # Errors
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn resolve_config(cli: &cli::Cli) -> Result<DitherConfig> {
    let mut config = if cli.config.exists() {
        od_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        DitherConfig::default()
    };
    cli.apply_overrides(&mut config);
    Ok(config)
}

/// Pipeline complet. Retourne le chemin écrit.
///
/// # Errors
/// Returns an error if the config, the input image or the output file fails.
pub fn run(cli: &cli::Cli) -> Result<PathBuf> {
    let config = resolve_config(cli)?;
    let ditherer = OrderedDither::from_config(&config)?;

    let gray = source::decode(&cli.image)?;
    log::info!(
        "Traitement de l'image {}x{} (Bayer {n}x{n}, {} niveaux)...",
        gray.width(),
        gray.height(),
        config.levels,
        n = config.matrix_size
    );

    let start = Instant::now();
    let dithered = if config.parallel {
        ditherer.apply_par(&gray)
    } else {
        ditherer.apply(&gray)
    };
    log::debug!("Tramage en {:?}", start.elapsed());

    let output = if cli.side_by_side {
        source::side_by_side(&gray, &dithered)?
    } else {
        dithered
    };

    let path = cli.output_path();
    source::encode(&path, output)?;
    log::info!("Résultat écrit dans {}", path.display());
    Ok(path)
}
