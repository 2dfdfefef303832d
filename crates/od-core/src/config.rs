use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Nombre minimal de niveaux de sortie (noir/blanc).
pub const MIN_LEVELS: u32 = 2;

/// Nombre maximal de niveaux : autant que de codes u8 distincts.
pub const MAX_LEVELS: u32 = 256;

/// Plus petite matrice de Bayer utilisable depuis la config.
pub const MIN_MATRIX_SIZE: u32 = 2;

/// Plus grande matrice de Bayer utilisable depuis la config.
pub const MAX_MATRIX_SIZE: u32 = 64;

/// Configuration du tramage ordonné.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine :
/// matrice 4×4, sortie binaire, traitement parallèle.
///
/// # Example
/// ```
/// use od_core::config::DitherConfig;
/// let config = DitherConfig::default();
/// assert_eq!(config.matrix_size, 4);
/// assert_eq!(config.levels, 2);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DitherConfig {
    /// Côté N de la matrice de Bayer (puissance de deux).
    pub matrix_size: u32,
    /// Nombre de niveaux de sortie, 2 = binaire.
    pub levels: u32,
    /// Découper le travail par ligne sur le pool rayon.
    pub parallel: bool,
}

impl Default for DitherConfig {
    fn default() -> Self {
        Self {
            matrix_size: 4,
            levels: 2,
            parallel: true,
        }
    }
}

impl DitherConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and CLI overrides.
    ///
    /// # Example
    /// ```
    /// use od_core::config::DitherConfig;
    /// let mut config = DitherConfig { matrix_size: 5, levels: 1, parallel: false };
    /// config.clamp_all();
    /// assert_eq!(config.matrix_size, 8);
    /// assert_eq!(config.levels, 2);
    /// ```
    pub fn clamp_all(&mut self) {
        let levels = self.levels.clamp(MIN_LEVELS, MAX_LEVELS);
        if levels != self.levels {
            log::warn!("levels = {} hors bornes, ramené à {levels}", self.levels);
            self.levels = levels;
        }

        let size = self
            .matrix_size
            .clamp(MIN_MATRIX_SIZE, MAX_MATRIX_SIZE)
            .next_power_of_two();
        if size != self.matrix_size {
            log::warn!(
                "matrix_size = {} invalide (puissance de deux {MIN_MATRIX_SIZE}..={MAX_MATRIX_SIZE}), ramené à {size}",
                self.matrix_size
            );
            self.matrix_size = size;
        }
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    dither: Option<DitherSection>,
}

/// Dither section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct DitherSection {
    matrix_size: Option<u32>,
    levels: Option<u32>,
    parallel: Option<bool>,
}

/// Parse une config TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns [`CoreError::Config`] if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use od_core::config::parse_config;
/// let config = parse_config("[dither]\nlevels = 4\n").unwrap();
/// assert_eq!(config.levels, 4);
/// assert_eq!(config.matrix_size, 4);
/// ```
pub fn parse_config(content: &str) -> Result<DitherConfig> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;

    let mut config = DitherConfig::default();

    if let Some(d) = file.dither {
        if let Some(v) = d.matrix_size {
            config.matrix_size = v;
        }
        if let Some(v) = d.levels {
            config.levels = v;
        }
        if let Some(v) = d.parallel {
            config.parallel = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, or [`CoreError::Config`]
/// (under a path context) if it cannot be parsed.
///
/// # Example
/// ```no_run
/// use od_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<DitherConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}
