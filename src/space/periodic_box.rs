use crate::error::{Result, WrapError};
use ndarray::ArrayView1;

/// Number of whole box lengths between the origin and `x` along one axis.
///
/// Uses floor semantics, so points below the origin get negative images. A point just below a
/// box face whose wrapped value `x - length * n` rounds up to `length` is assigned the next
/// image instead, which keeps the wrapped value below `length`.
#[inline]
pub fn image_index(x: f64, length: f64) -> i64 {
    let n = (x / length).floor();
    if x - length * n >= length {
        n as i64 + 1
    } else {
        n as i64
    }
}

/// A struct to represent an orthogonal box with periodic boundary conditions.
///
/// The `PeriodicBox` describes the simulation cell of a single frame. Its lower corner sits at
/// the origin and its edges are aligned with the coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicBox<const D: usize> {
    /// The lengths of the box in each spatial dimension.
    length: [f64; D],
}

impl<const D: usize> PeriodicBox<D> {
    /// Creates a new `PeriodicBox` instance.
    ///
    /// # Arguments
    /// * `length` - The length of the box in each spatial dimension.
    ///
    /// # Errors
    /// Returns `WrapError::InvalidBox` if any length is not finite or not strictly positive.
    /// The reported frame index is 0.
    pub fn new(length: [f64; D]) -> Result<Self> {
        Self::for_frame(0, length)
    }

    /// Creates the box of frame `frame` from one row of a box-length array.
    ///
    /// # Errors
    /// Returns `WrapError::ShapeMismatch` if the row does not hold `D` values and
    /// `WrapError::InvalidBox` (tagged with `frame`) for an invalid length.
    pub fn from_row(frame: usize, row: ArrayView1<f64>) -> Result<Self> {
        if row.len() != D {
            return Err(WrapError::shape(format!(
                "box lengths of frame {} have {} components, expected {}",
                frame,
                row.len(),
                D
            )));
        }
        let mut length = [0.0; D];
        for (l, &value) in length.iter_mut().zip(row.iter()) {
            *l = value;
        }
        Self::for_frame(frame, length)
    }

    fn for_frame(frame: usize, length: [f64; D]) -> Result<Self> {
        if let Some((axis, &value)) = length
            .iter()
            .enumerate()
            .find(|(_, &l)| !(l.is_finite() && l > 0.0))
        {
            return Err(WrapError::InvalidBox { frame, axis, value });
        }
        Ok(Self { length })
    }

    /// Returns the lengths of the box.
    pub fn lengths(&self) -> &[f64; D] {
        &self.length
    }

    /// Computes the periodic image of a position.
    ///
    /// # Arguments
    /// * `r` - The position.
    ///
    /// # Returns
    /// For each dimension, the number of box lengths separating `r` from the origin.
    pub fn image<'a, A>(&self, r: A) -> [i64; D]
    where
        A: Into<ArrayView1<'a, f64>>,
    {
        let r_view = r.into();
        debug_assert_eq!(
            r_view.len(),
            D,
            "Input array length must match the dimensionality of the box"
        );

        let mut result = [0; D];
        for i in 0..D {
            result[i] = image_index(r_view[i], self.length[i]);
        }
        result
    }

    /// Maps a position to its fundamental image within the periodic box.
    ///
    /// Components lie in `[0, length)`, except that a point a rounding error below a face is
    /// left where it is.
    pub fn fundamental_image<'a, A>(&self, r: A) -> [f64; D]
    where
        A: Into<ArrayView1<'a, f64>>,
    {
        let r_view = r.into();
        debug_assert_eq!(
            r_view.len(),
            D,
            "Input array length must match the dimensionality of the box"
        );

        let mut result = [0.0; D];
        for i in 0..D {
            let l = self.length[i];
            result[i] = r_view[i] - l * image_index(r_view[i], l) as f64;
        }
        result
    }

    /// Computes the nearest-image difference `r1 - r2`.
    ///
    /// # Arguments
    /// * `r1` - The first position.
    /// * `r2` - The second position.
    ///
    /// # Returns
    /// The difference with each component reduced to `[-length/2, length/2]`.
    ///
    /// # Panics
    /// Panics in debug builds if the inputs do not have `D` components.
    pub fn difference<'a, A, B>(&self, r1: A, r2: B) -> [f64; D]
    where
        A: Into<ArrayView1<'a, f64>>,
        B: Into<ArrayView1<'a, f64>>,
    {
        let (r1, r2) = (r1.into(), r2.into());
        debug_assert_eq!(r1.len(), D, "Input array length must match the box");
        debug_assert_eq!(r2.len(), D, "Input array length must match the box");

        let mut result = [0.0; D];
        for (i, d) in result.iter_mut().enumerate() {
            let diff = r1[i] - r2[i];
            *d = diff - self.length[i] * (diff / self.length[i]).round();
        }
        result
    }
}
