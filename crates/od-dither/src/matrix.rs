//! Matrices de seuils pour le tramage ordonné (Ordered Dithering).
//! Une matrice N×N contient exactement les N² entiers `0..N²`, un par cellule,
//! et se répète sur l'image par indexation modulo N.

use od_core::error::CoreError;

/// Matrice de Bayer 2x2. Normalisée sur 4 niveaux (0-3).
pub const BAYER_2X2: [[u8; 2]; 2] = [[0, 2], [3, 1]];

/// Matrice de Bayer 4x4. Normalisée sur 16 niveaux (0-15).
pub const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Matrice de Bayer 8x8. Normalisée sur 64 niveaux (0-63).
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Plus grand côté accepté par [`ThresholdMatrix::bayer`].
pub const MAX_BAYER_SIZE: usize = 256;

/// Tolérance pour reconnaître un multiple de `1/N²` dans la forme normalisée.
const NORMALIZED_EPSILON: f32 = 1e-3;

/// Matrice de seuils carrée N×N, N ≥ 2, stockée row-major sous forme entière.
///
/// Invariant : les N² cellules contiennent chacune une valeur distincte de
/// `0..N²`. Chaque niveau de gris `k/N²` est donc représenté par une seule
/// cellule, et un aplat produit une densité de points uniforme.
///
/// # Example
/// ```
/// use od_dither::matrix::ThresholdMatrix;
/// let m = ThresholdMatrix::default();
/// assert_eq!(m.side(), 4);
/// assert_eq!(m.value(0, 0), 0);
/// assert_eq!(m.value(5, 4), 8); // tuilage : (5 mod 4, 4 mod 4) = (1, 0)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdMatrix {
    side: usize,
    cells: Vec<u32>,
}

impl Default for ThresholdMatrix {
    /// La matrice de Bayer 4×4 canonique.
    fn default() -> Self {
        Self {
            side: 4,
            cells: BAYER_4X4.iter().flatten().map(|&v| u32::from(v)).collect(),
        }
    }
}

impl ThresholdMatrix {
    /// Construit une matrice à partir de lignes d'entiers dans `0..N²`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if the matrix is empty, smaller
    /// than 2×2, not square, holds a value outside `0..N²`, or repeats a value.
    ///
    /// # Example
    /// ```
    /// use od_dither::matrix::ThresholdMatrix;
    /// assert!(ThresholdMatrix::new(&[[0u32, 2], [3, 1]]).is_ok());
    /// assert!(ThresholdMatrix::new(&[[0u32, 2], [2, 1]]).is_err());
    /// ```
    pub fn new<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, CoreError> {
        let side = check_square(rows.iter().map(|r| r.as_ref().len()), rows.len())?;
        let count = side * side;

        let mut seen = vec![false; count];
        let mut cells = Vec::with_capacity(count);
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.as_ref().iter().enumerate() {
                let Some(slot) = seen.get_mut(v as usize) else {
                    return Err(CoreError::invalid(format!(
                        "seuil {v} en ({x}, {y}) hors de 0..{count}"
                    )));
                };
                if *slot {
                    return Err(CoreError::invalid(format!(
                        "matrice dégénérée : seuil {v} répété en ({x}, {y})"
                    )));
                }
                *slot = true;
                cells.push(v);
            }
        }

        Ok(Self { side, cells })
    }

    /// Construit une matrice à partir de seuils normalisés dans `[0, 1)`.
    ///
    /// Chaque valeur doit être un multiple de `1/N²` ; elle est convertie en
    /// rang entier puis validée comme pour [`ThresholdMatrix::new`].
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] on a shape problem, a value
    /// outside `[0, 1)`, a value that is not a multiple of `1/N²`, or duplicates.
    ///
    /// # Example
    /// ```
    /// use od_dither::matrix::ThresholdMatrix;
    /// let m = ThresholdMatrix::from_normalized(&[[0.0f32, 0.5], [0.75, 0.25]]).unwrap();
    /// assert_eq!(m, ThresholdMatrix::bayer(2).unwrap());
    /// ```
    pub fn from_normalized<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, CoreError> {
        let side = check_square(rows.iter().map(|r| r.as_ref().len()), rows.len())?;
        let count = (side * side) as f32;

        let mut ranks = Vec::with_capacity(side);
        for row in rows {
            let mut out = Vec::with_capacity(side);
            for &t in row.as_ref() {
                if !(0.0..1.0).contains(&t) {
                    return Err(CoreError::invalid(format!("seuil normalisé {t} hors de [0, 1)")));
                }
                let scaled = t * count;
                let rank = scaled.round();
                if (scaled - rank).abs() > NORMALIZED_EPSILON {
                    return Err(CoreError::invalid(format!(
                        "seuil normalisé {t} n'est pas un multiple de 1/{count}"
                    )));
                }
                out.push(rank as u32);
            }
            ranks.push(out);
        }

        Self::new(&ranks)
    }

    /// Matrice de Bayer de côté `size`, construite récursivement :
    /// `M(2n) = [[4M, 4M+2], [4M+3, 4M+1]]`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] unless `size` is a power of two
    /// in `2..=256`.
    ///
    /// # Example
    /// ```
    /// use od_dither::matrix::{ThresholdMatrix, BAYER_8X8};
    /// let m = ThresholdMatrix::bayer(8).unwrap();
    /// assert_eq!(m.value(3, 1), u32::from(BAYER_8X8[1][3]));
    /// ```
    pub fn bayer(size: usize) -> Result<Self, CoreError> {
        if !(2..=MAX_BAYER_SIZE).contains(&size) || !size.is_power_of_two() {
            return Err(CoreError::invalid(format!(
                "taille de Bayer {size} : puissance de deux 2..={MAX_BAYER_SIZE} attendue"
            )));
        }

        let mut cells = vec![0u32];
        let mut side = 1usize;
        while side < size {
            let next = side * 2;
            let mut grown = vec![0u32; next * next];
            for y in 0..next {
                for x in 0..next {
                    let base = cells[(y % side) * side + x % side];
                    let offset = match (y < side, x < side) {
                        (true, true) => 0,
                        (true, false) => 2,
                        (false, true) => 3,
                        (false, false) => 1,
                    };
                    grown[y * next + x] = 4 * base + offset;
                }
            }
            cells = grown;
            side = next;
        }

        Ok(Self { side, cells })
    }

    /// Côté N.
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    /// N², aussi le nombre de seuils distincts.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Seuil entier à la position image (x, y), tuilé modulo N.
    #[inline(always)]
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> u32 {
        let s = self.side;
        self.cells[(y as usize % s) * s + x as usize % s]
    }

    /// Ligne de la matrice utilisée pour la ligne image `y`.
    #[inline(always)]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u32] {
        let start = (y as usize % self.side) * self.side;
        &self.cells[start..start + self.side]
    }
}

/// Vérifie la forme carrée et rend le côté.
fn check_square(row_lens: impl Iterator<Item = usize>, rows: usize) -> Result<usize, CoreError> {
    if rows == 0 {
        return Err(CoreError::invalid("matrice vide"));
    }
    if rows < 2 {
        return Err(CoreError::invalid(format!("matrice {rows}×{rows} : côté ≥ 2 attendu")));
    }
    for (y, len) in row_lens.enumerate() {
        if len != rows {
            return Err(CoreError::invalid(format!(
                "matrice non carrée : ligne {y} de longueur {len}, {rows} attendu"
            )));
        }
    }
    Ok(rows)
}
