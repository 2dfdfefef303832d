/// Moteur de tramage ordonné (Ordered Dithering) pour ordith.
///
/// Convertit un buffer en niveaux de gris en une image binaire ou à niveaux
/// réduits, par comparaison de chaque pixel à une matrice de seuils tuilée.
pub mod engine;
pub mod matrix;

pub use engine::{OrderedDither, dither, dither_par};
pub use matrix::ThresholdMatrix;
