//! Moteur de tramage ordonné.
//!
//! Chaque pixel est comparé au seuil de la cellule `(x mod N, y mod N)` de la
//! matrice, indépendamment de ses voisins. Le résultat est une fonction pure des
//! entrées : aucune ligne ne dépend d'une autre, d'où le découpage par ligne
//! (séquentiel, par blocs, ou sur le pool rayon) sans synchronisation.
//!
//! Pour `levels = L`, l'intervalle `[0, 1]` est découpé en `L - 1` bandes égales ;
//! la matrice décide, à l'intérieur de la bande du pixel, entre le niveau bas et
//! le niveau haut de cette bande. Avec `L = 2` il n'y a qu'une bande et on
//! retrouve la décision binaire `255 si i > T sinon 0`.

use od_core::config::{DitherConfig, MAX_LEVELS, MIN_LEVELS};
use od_core::error::CoreError;
use od_core::frame::{GrayBuffer, check_shape};
use rayon::prelude::*;

use crate::matrix::ThresholdMatrix;

/// Tramage ordonné validé : matrice, nombre de niveaux et table niveau → code.
///
/// # Example
/// ```
/// use od_core::frame::GrayBuffer;
/// use od_dither::engine::OrderedDither;
/// use od_dither::matrix::ThresholdMatrix;
///
/// let ditherer = OrderedDither::new(ThresholdMatrix::default(), 2).unwrap();
/// let gray = GrayBuffer::filled(8, 8, 128).unwrap();
/// let out = ditherer.apply(&gray);
/// assert_eq!(out.data().iter().filter(|&&v| v == 255).count(), 32);
/// ```
#[derive(Clone, Debug)]
pub struct OrderedDither {
    matrix: ThresholdMatrix,
    levels: u32,
    /// `2 · N²`, dénominateur commun des seuils centrés `(2v + 1) / (2N²)`.
    twice_cells: u64,
    /// Code de sortie [0..255] de chaque niveau.
    codes: Vec<u8>,
}

impl OrderedDither {
    /// Valide `levels` et précalcule la table des codes de sortie.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `levels` is outside `2..=256`.
    pub fn new(matrix: ThresholdMatrix, levels: u32) -> Result<Self, CoreError> {
        if !(MIN_LEVELS..=MAX_LEVELS).contains(&levels) {
            return Err(CoreError::invalid(format!(
                "levels = {levels}, attendu {MIN_LEVELS}..={MAX_LEVELS}"
            )));
        }

        let top = u64::from(levels - 1);
        let codes = (0..u64::from(levels))
            .map(|k| ((k * 255 * 2 + top) / (2 * top)) as u8)
            .collect();
        let twice_cells = 2 * matrix.cell_count() as u64;

        log::debug!(
            "OrderedDither : matrice {n}×{n}, {levels} niveaux",
            n = matrix.side()
        );

        Ok(Self {
            matrix,
            levels,
            twice_cells,
            codes,
        })
    }

    /// Matrice de Bayer `config.matrix_size` et `config.levels` niveaux.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if the config holds an unsupported
    /// matrix size or level count (see [`DitherConfig::clamp_all`]).
    ///
    /// # Example
    /// ```
    /// use od_core::config::DitherConfig;
    /// use od_dither::engine::OrderedDither;
    /// let d = OrderedDither::from_config(&DitherConfig::default()).unwrap();
    /// assert_eq!(d.matrix().side(), 4);
    /// assert_eq!(d.levels(), 2);
    /// ```
    pub fn from_config(config: &DitherConfig) -> Result<Self, CoreError> {
        let matrix = ThresholdMatrix::bayer(config.matrix_size as usize)?;
        Self::new(matrix, config.levels)
    }

    /// Matrice de seuils utilisée.
    #[must_use]
    pub fn matrix(&self) -> &ThresholdMatrix {
        &self.matrix
    }

    /// Nombre de niveaux de sortie.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Codes de sortie, du plus sombre au plus clair.
    #[must_use]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Code [0..255] du niveau `level` : `round(level · 255 / (levels - 1))`.
    ///
    /// # Panics
    /// Panics if `level >= self.levels()`.
    #[inline(always)]
    #[must_use]
    pub fn code_of(&self, level: u32) -> u8 {
        self.codes[level as usize]
    }

    /// Niveau de sortie [0, levels) du pixel d'intensité `intensity` en (x, y).
    ///
    /// # Example
    /// ```
    /// use od_dither::engine::OrderedDither;
    /// use od_dither::matrix::ThresholdMatrix;
    /// let d = OrderedDither::new(ThresholdMatrix::default(), 2).unwrap();
    /// assert_eq!(d.level_of(0, 0, 0), 0);
    /// assert_eq!(d.level_of(255, 3, 3), 1);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn level_of(&self, intensity: u8, x: u32, y: u32) -> u32 {
        self.level_for(intensity, self.matrix.value(x, y))
    }

    /// Décision par pixel, en arithmétique entière exacte.
    ///
    /// `s = I·(L-1)/255`, bande `k = min(⌊s⌋, L-2)`, reste `f = s - k`.
    /// Le niveau monte à `k + 1` ssi `f > (2v + 1) / (2N²)` ; l'égalité resterait
    /// au niveau sombre, mais `2N²·rem` est pair et `(2v + 1)·255` impair.
    #[inline(always)]
    fn level_for(&self, intensity: u8, cell: u32) -> u32 {
        let top = u64::from(self.levels - 1);
        let scaled = u64::from(intensity) * top;
        let band = (scaled / 255).min(top - 1);
        let rem = scaled - band * 255;
        let up = self.twice_cells * rem > (2 * u64::from(cell) + 1) * 255;
        band as u32 + u32::from(up)
    }

    #[inline(always)]
    fn process_row(&self, row_in: &[u8], y: u32, row_out: &mut [u8]) {
        let cells = self.matrix.row(y);
        for ((out, &lum), &cell) in row_out.iter_mut().zip(row_in).zip(cells.iter().cycle()) {
            *out = self.codes[self.level_for(lum, cell) as usize];
        }
    }

    /// Trame un bloc de lignes consécutives commençant à la ligne image
    /// `first_row`. `input` et `output` couvrent exactement ces lignes.
    ///
    /// Permet de découper le travail côté appelant (annulation coopérative,
    /// progression) : le résultat concaténé est identique à [`Self::apply`].
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `width` is zero, the slices
    /// differ in length, their length is not a multiple of `width`, or the
    /// last row index `first_row + rows - 1` does not fit in `u32`.
    ///
    /// # Example
    /// ```
    /// use od_dither::engine::OrderedDither;
    /// use od_dither::matrix::ThresholdMatrix;
    /// let d = OrderedDither::new(ThresholdMatrix::default(), 2).unwrap();
    /// let input = vec![128u8; 4 * 6];
    /// let mut output = vec![0u8; input.len()];
    /// for (block, (src, dst)) in input.chunks(8).zip(output.chunks_mut(8)).enumerate() {
    ///     d.dither_rows(src, 4, block as u32 * 2, dst).unwrap();
    /// }
    /// assert_eq!(output, od_dither::engine::dither(&input, 4, 6, d.matrix(), 2).unwrap());
    /// ```
    pub fn dither_rows(
        &self,
        input: &[u8],
        width: u32,
        first_row: u32,
        output: &mut [u8],
    ) -> Result<(), CoreError> {
        if width == 0 {
            return Err(CoreError::invalid("largeur nulle"));
        }
        if input.len() != output.len() {
            return Err(CoreError::invalid(format!(
                "entrée de {} octets, sortie de {}",
                input.len(),
                output.len()
            )));
        }
        let w = width as usize;
        if input.len() % w != 0 {
            return Err(CoreError::invalid(format!(
                "bloc de {} octets non multiple de la largeur {width}",
                input.len()
            )));
        }
        let rows = input.len() / w;
        if rows > 0 {
            let last = u32::try_from(rows - 1)
                .ok()
                .and_then(|extra| first_row.checked_add(extra));
            if last.is_none() {
                return Err(CoreError::invalid(format!(
                    "{rows} lignes à partir de {first_row} dépassent u32::MAX"
                )));
            }
        }

        self.fill(input, w, first_row, output);
        Ok(())
    }

    /// Boucle séquentielle sur des lignes déjà validées ; `first_row + dy`
    /// ne déborde pas.
    fn fill(&self, input: &[u8], width: usize, first_row: u32, output: &mut [u8]) {
        for (dy, (row_in, row_out)) in input
            .chunks_exact(width)
            .zip(output.chunks_exact_mut(width))
            .enumerate()
        {
            self.process_row(row_in, first_row + dy as u32, row_out);
        }
    }

    /// Boucle parallèle : une tâche rayon par ligne, sorties disjointes.
    fn fill_par(&self, input: &[u8], width: usize, output: &mut [u8]) {
        output
            .par_chunks_mut(width)
            .zip(input.par_chunks(width))
            .enumerate()
            .for_each(|(y, (row_out, row_in))| self.process_row(row_in, y as u32, row_out));
    }

    /// Trame une image entière, en un seul passage séquentiel.
    ///
    /// L'entrée n'est pas modifiée ; la sortie est un nouveau buffer de même forme.
    #[must_use]
    pub fn apply(&self, input: &GrayBuffer) -> GrayBuffer {
        let mut output = input.blank_like();
        self.fill(input.data(), input.width() as usize, 0, output.data_mut());
        output
    }

    /// Comme [`Self::apply`], lignes réparties sur le pool rayon.
    /// Sortie identique octet pour octet.
    #[must_use]
    pub fn apply_par(&self, input: &GrayBuffer) -> GrayBuffer {
        let mut output = input.blank_like();
        self.fill_par(input.data(), input.width() as usize, output.data_mut());
        output
    }
}

/// Trame `buffer` (`width × height`, row-major) avec `matrix` sur `levels`
/// niveaux et rend un nouveau buffer de même longueur.
///
/// # Errors
/// Returns [`CoreError::InvalidArgument`] if a dimension is zero,
/// `buffer.len() != width * height`, or `levels` is outside `2..=256`.
/// Matrix invariants are enforced when the [`ThresholdMatrix`] is built.
/// No output is produced on error.
///
/// # Example
/// ```
/// use od_dither::engine::dither;
/// use od_dither::matrix::ThresholdMatrix;
/// let out = dither(&[0, 64, 220, 255], 2, 2, &ThresholdMatrix::default(), 2).unwrap();
/// assert_eq!(out, vec![0, 0, 255, 255]);
/// ```
pub fn dither(
    buffer: &[u8],
    width: u32,
    height: u32,
    matrix: &ThresholdMatrix,
    levels: u32,
) -> Result<Vec<u8>, CoreError> {
    check_shape(buffer, width, height)?;
    let ditherer = OrderedDither::new(matrix.clone(), levels)?;
    let mut output = vec![0u8; buffer.len()];
    ditherer.fill(buffer, width as usize, 0, &mut output);
    Ok(output)
}

/// Version parallèle de [`dither`], même résultat.
///
/// # Errors
/// Same as [`dither`].
pub fn dither_par(
    buffer: &[u8],
    width: u32,
    height: u32,
    matrix: &ThresholdMatrix,
    levels: u32,
) -> Result<Vec<u8>, CoreError> {
    check_shape(buffer, width, height)?;
    let ditherer = OrderedDither::new(matrix.clone(), levels)?;
    let mut output = vec![0u8; buffer.len()];
    ditherer.fill_par(buffer, width as usize, &mut output);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::matrix::BAYER_4X4;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn output_has_input_shape() {
        for (w, h) in [(1, 1), (3, 7), (16, 5), (33, 2)] {
            let input = gradient(w, h);
            let out = dither(&input, w, h, &ThresholdMatrix::default(), 2).unwrap();
            assert_eq!(out.len(), (w * h) as usize);
        }
    }

    #[test]
    fn gray_128_gives_checkerboard_on_8x8() {
        let out = dither(&[128; 64], 8, 8, &ThresholdMatrix::default(), 2).unwrap();
        assert_eq!(out.iter().filter(|&&v| v == 255).count(), 32);
        assert!(out.iter().all(|&v| v == 0 || v == 255));
        for (y, row) in out.chunks_exact(8).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                let expected = if BAYER_4X4[y % 4][x % 4] < 8 { 255 } else { 0 };
                assert_eq!(v, expected, "({x}, {y})");
            }
        }
        // 8 pixels allumés dans chacune des quatre tuiles 4×4.
        for ty in 0..2 {
            for tx in 0..2 {
                let on = (0..4)
                    .flat_map(|y| (0..4).map(move |x| (tx * 4 + x, ty * 4 + y)))
                    .filter(|&(x, y)| out[y * 8 + x] == 255)
                    .count();
                assert_eq!(on, 8);
            }
        }
    }

    #[test]
    fn uniform_density_matches_intensity() {
        for side in [2usize, 4, 8] {
            let matrix = ThresholdMatrix::bayer(side).unwrap();
            let cells = side * side;
            let s = side as u32;
            for intensity in 0..=255u8 {
                let out = dither(&vec![intensity; cells], s, s, &matrix, 2).unwrap();
                let on = out.iter().filter(|&&v| v == 255).count();
                let expected = (f64::from(intensity) * cells as f64 / 255.0).round() as usize;
                assert_eq!(on, expected, "side {side}, intensity {intensity}");
            }
        }
    }

    #[test]
    fn outputs_use_exactly_level_codes() {
        for levels in [2u32, 3, 4, 5, 16, 256] {
            let d = OrderedDither::new(ThresholdMatrix::default(), levels).unwrap();
            let codes: BTreeSet<u8> = d.codes().iter().copied().collect();
            assert_eq!(codes.len(), levels as usize);
            assert_eq!(d.code_of(0), 0);
            assert_eq!(d.code_of(levels - 1), 255);

            let input = gradient(256, 8);
            let out = dither(&input, 256, 8, d.matrix(), levels).unwrap();
            let seen: BTreeSet<u8> = out.iter().copied().collect();
            assert_eq!(seen, codes, "levels {levels}");
        }
    }

    #[test]
    fn binary_codes_are_black_and_white() {
        let d = OrderedDither::new(ThresholdMatrix::default(), 2).unwrap();
        assert_eq!(d.codes(), &[0, 255]);
        let d = OrderedDither::new(ThresholdMatrix::default(), 3).unwrap();
        assert_eq!(d.codes(), &[0, 128, 255]);
    }

    #[test]
    fn monotonic_in_intensity() {
        for levels in [2u32, 3, 7, 256] {
            let d = OrderedDither::new(ThresholdMatrix::bayer(8).unwrap(), levels).unwrap();
            for y in 0..8 {
                for x in 0..8 {
                    let mut prev = 0;
                    for intensity in 0..=255u8 {
                        let level = d.level_of(intensity, x, y);
                        assert!(level >= prev, "levels {levels}, ({x}, {y}), I={intensity}");
                        assert!(level < levels);
                        prev = level;
                    }
                }
            }
        }
    }

    #[test]
    fn extremes_map_to_extreme_codes() {
        for levels in [2u32, 3, 10, 256] {
            let out = dither(&[0; 64], 8, 8, &ThresholdMatrix::bayer(8).unwrap(), levels).unwrap();
            assert!(out.iter().all(|&v| v == 0));
            let out = dither(&[255; 64], 8, 8, &ThresholdMatrix::bayer(8).unwrap(), levels).unwrap();
            assert!(out.iter().all(|&v| v == 255));
        }
    }

    #[test]
    fn three_levels_dither_inside_band() {
        // I = 64 : bande basse [0, 0.5], f ≈ 0.502 ; seuils 2×2 centrés 1/8, 3/8, 5/8, 7/8.
        let out = dither(&[64; 4], 2, 2, &ThresholdMatrix::bayer(2).unwrap(), 3).unwrap();
        assert_eq!(out, vec![128, 0, 0, 128]);
    }

    #[test]
    fn single_pixel_uses_first_cell() {
        // matrix[0][0] = 0 : seuil 1/32, allumé dès I = 8.
        let m = ThresholdMatrix::default();
        assert_eq!(dither(&[7], 1, 1, &m, 2).unwrap(), vec![0]);
        assert_eq!(dither(&[8], 1, 1, &m, 2).unwrap(), vec![255]);

        // matrix[0][0] = 15 : seuil 31/32, allumé dès I = 248.
        let m = ThresholdMatrix::new(&[[15u32, 7, 13, 5], [3, 11, 1, 9], [12, 4, 14, 6], [0, 8, 2, 10]])
            .unwrap();
        assert_eq!(dither(&[247], 1, 1, &m, 2).unwrap(), vec![0]);
        assert_eq!(dither(&[248], 1, 1, &m, 2).unwrap(), vec![255]);
    }

    #[test]
    fn deterministic_and_parallel_identical() {
        let (w, h) = (97, 61);
        let input: Vec<u8> = (0..w * h).map(|i| ((i * 37 + i / 7) % 256) as u8).collect();
        let matrix = ThresholdMatrix::bayer(8).unwrap();
        for levels in [2, 4] {
            let a = dither(&input, w, h, &matrix, levels).unwrap();
            let b = dither(&input, w, h, &matrix, levels).unwrap();
            let c = dither_par(&input, w, h, &matrix, levels).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, c);

            let d = OrderedDither::new(matrix.clone(), levels).unwrap();
            let gray = GrayBuffer::from_raw(input.clone(), w, h).unwrap();
            assert_eq!(d.apply(&gray).data(), &a[..]);
            assert_eq!(d.apply_par(&gray).data(), &a[..]);
            // L'entrée n'est pas touchée.
            assert_eq!(gray.data(), &input[..]);
        }
    }

    #[test]
    fn chunked_rows_match_full_pass() {
        let (w, h) = (10u32, 11u32);
        let input = gradient(w, h);
        let d = OrderedDither::new(ThresholdMatrix::default(), 2).unwrap();
        let full = dither(&input, w, h, d.matrix(), 2).unwrap();

        let cancel_after = 2;
        let mut output = vec![0u8; input.len()];
        let chunk = 3 * w as usize;
        for (i, (src, dst)) in input.chunks(chunk).zip(output.chunks_mut(chunk)).enumerate() {
            d.dither_rows(src, w, (i * 3) as u32, dst).unwrap();
            if i + 1 == cancel_after {
                break;
            }
        }
        let done = cancel_after * chunk;
        assert_eq!(&output[..done], &full[..done]);
        assert!(output[done..].iter().all(|&v| v == 0));
    }

    #[test]
    fn rows_near_u32_max_keep_tiling() {
        // 3 ne divise pas 2^32 : un retour à la ligne 0 casserait `y mod 3`.
        let m = ThresholdMatrix::new(&[[0u32, 5, 2], [7, 4, 8], [3, 6, 1]]).unwrap();
        let d = OrderedDither::new(m, 2).unwrap();
        let width = 3u32;

        let mut out = [0u8; 3];
        d.dither_rows(&[128; 3], width, u32::MAX, &mut out).unwrap();
        let expected: Vec<u8> = (0..width)
            .map(|x| d.code_of(d.level_of(128, x, u32::MAX)))
            .collect();
        assert_eq!(out.to_vec(), expected);
        // u32::MAX mod 3 = 0 : première ligne de la matrice (0, 5, 2 allumés à 128).
        assert_eq!(out, [255, 0, 255]);

        let mut out = [0u8; 6];
        let err = d.dither_rows(&[128; 6], width, u32::MAX, &mut out).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(out.iter().all(|&v| v == 0));

        let mut out = [0u8; 6];
        assert!(d.dither_rows(&[128; 6], width, u32::MAX - 1, &mut out).is_ok());
    }

    #[test]
    fn invalid_arguments() {
        let m = ThresholdMatrix::default();
        assert!(dither(&[0; 5], 2, 2, &m, 2).unwrap_err().is_invalid_argument());
        assert!(dither(&[], 0, 0, &m, 2).unwrap_err().is_invalid_argument());
        assert!(dither(&[0; 4], 0, 4, &m, 2).unwrap_err().is_invalid_argument());
        assert!(dither(&[0; 4], 2, 2, &m, 1).unwrap_err().is_invalid_argument());
        assert!(dither(&[0; 4], 2, 2, &m, 257).unwrap_err().is_invalid_argument());
        assert!(dither_par(&[0; 3], 2, 2, &m, 2).unwrap_err().is_invalid_argument());

        let d = OrderedDither::new(m, 2).unwrap();
        let mut out = [0u8; 4];
        assert!(d.dither_rows(&[0; 4], 0, 0, &mut out).is_err());
        assert!(d.dither_rows(&[0; 4], 3, 0, &mut out).is_err());
        assert!(d.dither_rows(&[0; 6], 3, 0, &mut out).is_err());
    }

    #[test]
    fn from_config_uses_bayer_size() {
        let config = DitherConfig {
            matrix_size: 8,
            levels: 4,
            parallel: false,
        };
        let d = OrderedDither::from_config(&config).unwrap();
        assert_eq!(d.matrix(), &ThresholdMatrix::bayer(8).unwrap());
        assert_eq!(d.levels(), 4);

        let bad = DitherConfig {
            matrix_size: 3,
            ..config
        };
        assert!(OrderedDither::from_config(&bad).is_err());
    }
}
