use crate::error::CoreError;

/// Buffer de pixels en niveaux de gris, row-major, 1 octet par pixel.
///
/// Les dimensions sont validées à la construction : `data.len() == width * height`
/// et aucune dimension n'est nulle.
///
/// # Example
/// ```
/// use od_core::frame::GrayBuffer;
/// let buf = GrayBuffer::new(10, 10).unwrap();
/// assert_eq!(buf.data().len(), 100);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Nombre de pixels attendu pour `width × height`, sans débordement.
///
/// # Errors
/// Returns [`CoreError::InvalidArgument`] if a dimension is zero or the
/// product does not fit in `usize`.
pub fn pixel_count(width: u32, height: u32) -> Result<usize, CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::invalid(format!(
            "dimensions non positives : {width}×{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| CoreError::invalid(format!("dimensions trop grandes : {width}×{height}")))
}

/// Vérifie qu'un buffer plat correspond aux dimensions annoncées.
///
/// # Errors
/// Returns [`CoreError::InvalidArgument`] on zero dimensions or length mismatch.
///
/// # Example
/// ```
/// use od_core::frame::check_shape;
/// assert!(check_shape(&[0u8; 6], 3, 2).is_ok());
/// assert!(check_shape(&[0u8; 5], 3, 2).is_err());
/// ```
pub fn check_shape(data: &[u8], width: u32, height: u32) -> Result<(), CoreError> {
    let expected = pixel_count(width, height)?;
    if data.len() != expected {
        return Err(CoreError::invalid(format!(
            "longueur du buffer {} ≠ {width}×{height} = {expected}",
            data.len()
        )));
    }
    Ok(())
}

impl GrayBuffer {
    /// Crée un buffer noir aux dimensions données.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if a dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, CoreError> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            data: vec![0u8; len],
            width,
            height,
        })
    }

    /// Buffer uniforme d'intensité `value`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if a dimension is zero.
    ///
    /// # Example
    /// ```
    /// use od_core::frame::GrayBuffer;
    /// let buf = GrayBuffer::filled(4, 2, 128).unwrap();
    /// assert!(buf.data().iter().all(|&v| v == 128));
    /// ```
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, CoreError> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            data: vec![value; len],
            width,
            height,
        })
    }

    /// Adopte un buffer existant après validation de sa forme.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `data.len() != width * height`
    /// or a dimension is zero.
    ///
    /// # Example
    /// ```
    /// use od_core::frame::GrayBuffer;
    /// assert!(GrayBuffer::from_raw(vec![0; 6], 3, 2).is_ok());
    /// assert!(GrayBuffer::from_raw(vec![0; 6], 4, 2).is_err());
    /// ```
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self, CoreError> {
        check_shape(&data, width, height)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixels row-major, mutables. La forme ne peut pas changer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Nouveau buffer noir de même forme.
    ///
    /// # Example
    /// ```
    /// use od_core::frame::GrayBuffer;
    /// let src = GrayBuffer::filled(3, 2, 200).unwrap();
    /// let dst = src.blank_like();
    /// assert_eq!((dst.width(), dst.height()), (3, 2));
    /// assert!(dst.data().iter().all(|&v| v == 0));
    /// ```
    #[must_use]
    pub fn blank_like(&self) -> Self {
        Self {
            data: vec![0u8; self.data.len()],
            width: self.width,
            height: self.height,
        }
    }

    /// Consomme le buffer et rend le `Vec` sous-jacent.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Intensité du pixel (x, y).
    ///
    /// # Example
    /// ```
    /// use od_core::frame::GrayBuffer;
    /// let buf = GrayBuffer::from_raw(vec![1, 2, 3, 4], 2, 2).unwrap();
    /// assert_eq!(buf.pixel(1, 1), 4);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Itère sur les lignes.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.width as usize)
    }
}
