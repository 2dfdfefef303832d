use std::path::Path;

use anyhow::{Context, Result, ensure};
use image::GrayImage;
use od_core::frame::GrayBuffer;

/// Charge une image depuis le disque et la convertit en niveaux de gris.
///
/// # Errors
/// Returns an error if the image cannot be opened or decoded.
///
/// # Example
/// ```no_run
/// use od_app::source::decode;
/// use std::path::Path;
/// let gray = decode(Path::new("test.png")).unwrap();
/// ```
pub fn decode(path: &Path) -> Result<GrayBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    Ok(GrayBuffer::from_raw(luma.into_raw(), width, height)?)
}

/// Écrit un buffer en niveaux de gris. Le format suit l'extension du chemin.
/// Le buffer est consommé : ses pixels passent à l'encodeur sans copie.
///
/// # Errors
/// Returns an error if the file cannot be encoded or written.
pub fn encode(path: &Path, buffer: GrayBuffer) -> Result<()> {
    let (width, height) = (buffer.width(), buffer.height());
    let img = GrayImage::from_raw(width, height, buffer.into_raw())
        .context("Buffer incohérent avec ses dimensions")?;
    img.save(path)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))
}

/// Concatène deux images de même hauteur horizontalement (gauche | droite).
///
/// # Errors
/// Returns an error if the heights differ.
///
/// # Example
/// ```
/// use od_app::source::side_by_side;
/// use od_core::frame::GrayBuffer;
/// let left = GrayBuffer::filled(2, 1, 10).unwrap();
/// let right = GrayBuffer::filled(1, 1, 20).unwrap();
/// let both = side_by_side(&left, &right).unwrap();
/// assert_eq!(both.data(), &[10, 10, 20]);
/// ```
pub fn side_by_side(left: &GrayBuffer, right: &GrayBuffer) -> Result<GrayBuffer> {
    ensure!(
        left.height() == right.height(),
        "Hauteurs différentes : {} ≠ {}",
        left.height(),
        right.height()
    );

    let width = left.width() + right.width();
    let mut data = Vec::with_capacity(left.data().len() + right.data().len());
    for (l, r) in left.rows().zip(right.rows()) {
        data.extend_from_slice(l);
        data.extend_from_slice(r);
    }
    Ok(GrayBuffer::from_raw(data, width, left.height())?)
}
