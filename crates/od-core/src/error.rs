use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Mauvaises dimensions, matrice dégénérée ou nombre de niveaux invalide.
    ///
    /// Signale toujours une erreur d'intégration en amont : l'appel est pur,
    /// le relancer avec les mêmes entrées échouera de la même façon.
    #[error("Argument invalide : {0}")]
    InvalidArgument(String),

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}

impl CoreError {
    /// Raccourci pour construire un [`CoreError::InvalidArgument`].
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// `true` pour toute erreur de la famille `InvalidArgument`.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_message() {
        let err = CoreError::invalid("buffer de 3 octets pour 2×2");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "Argument invalide : buffer de 3 octets pour 2×2");
    }

    #[test]
    fn config_is_not_invalid_argument() {
        assert!(!CoreError::Config("levels".into()).is_invalid_argument());
    }
}
