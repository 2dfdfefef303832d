use std::path::PathBuf;

use clap::Parser;
use od_core::config::DitherConfig;

/// ordith — tramage ordonné (Bayer) d'images en niveaux de gris.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image source (PNG, JPEG, BMP, GIF). Convertie en niveaux de gris.
    #[arg(long)]
    pub image: PathBuf,

    /// Fichier de sortie. Défaut : `<image>_dithered.png` à côté de la source.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Côté de la matrice de Bayer (2, 4, 8, ...). Remplace la config.
    #[arg(long)]
    pub matrix_size: Option<u32>,

    /// Nombre de niveaux de sortie (2 = noir/blanc). Remplace la config.
    #[arg(long)]
    pub levels: Option<u32>,

    /// Désactiver le traitement parallèle.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Écrire l'original et le résultat côte à côte.
    #[arg(long, default_value_t = false)]
    pub side_by_side: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Chemin de sortie effectif.
    ///
    /// # Example
    /// ```
    /// use clap::Parser;
    /// use od_app::cli::Cli;
    /// use std::path::Path;
    /// let cli = Cli::parse_from(["ordith", "--image", "photos/chat.jpg"]);
    /// assert_eq!(cli.output_path(), Path::new("photos/chat_dithered.png"));
    /// ```
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        if let Some(ref path) = self.output {
            return path.clone();
        }
        let stem = self
            .image
            .file_stem()
            .map_or_else(|| "image".into(), |s| s.to_string_lossy());
        self.image.with_file_name(format!("{stem}_dithered.png"))
    }

    /// Applique les overrides CLI puis re-clampe.
    pub fn apply_overrides(&self, config: &mut DitherConfig) {
        if let Some(size) = self.matrix_size {
            config.matrix_size = size;
        }
        if let Some(levels) = self.levels {
            config.levels = levels;
        }
        if self.sequential {
            config.parallel = false;
        }
        config.clamp_all();
    }
}
