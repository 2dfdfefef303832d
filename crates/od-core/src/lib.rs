/// Types partagés, configuration et erreurs pour ordith.
///
/// Ce crate contient le buffer de pixels en niveaux de gris, la configuration
/// TOML et la taxonomie d'erreurs utilisés par le moteur et l'application.

pub mod config;
pub mod error;
pub mod frame;

pub use config::DitherConfig;
pub use error::CoreError;
pub use frame::GrayBuffer;
