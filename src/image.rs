use crate::error::{Result, WrapError};
use crate::options::{Execution, SPATIAL_DIMENSIONS};
use crate::space::periodic_box::image_index;
use log::trace;
use ndarray::{Array3, ArrayView2, ArrayView3, Axis, Zip};

/// Checks that a `(frames, entities, axes)` array and a `(frames, axes)` box array agree.
pub(crate) fn check_shapes(
    coordinates: (usize, usize, usize),
    box_lengths: (usize, usize),
) -> Result<()> {
    let (n_frames, _, n_axes) = coordinates;
    if n_axes != SPATIAL_DIMENSIONS {
        return Err(WrapError::shape(format!(
            "coordinates have {} components per point, expected {}",
            n_axes, SPATIAL_DIMENSIONS
        )));
    }
    if box_lengths != (n_frames, SPATIAL_DIMENSIONS) {
        return Err(WrapError::shape(format!(
            "box lengths have shape {:?}, expected ({}, {})",
            box_lengths, n_frames, SPATIAL_DIMENSIONS
        )));
    }
    Ok(())
}

/// Computes the periodic image of every point of every frame.
///
/// Entry `(f, k, a)` of the result is `floor(coordinates[f, k, a] / box_lengths[f, a])`, the
/// number of box lengths separating point `k` from the origin along axis `a` (see
/// [`image_index`] for points a rounding error below a face).
///
/// # Arguments
/// * `coordinates` - Points with shape `(frames, entities, 3)`.
/// * `box_lengths` - Box edge lengths with shape `(frames, 3)`.
/// * `execution` - Serial or data-parallel evaluation.
///
/// # Errors
/// Returns `WrapError::ShapeMismatch` if the shapes of the two arrays do not agree.
///
/// # Example
/// ```
/// use fast_wrap::image::images;
/// use fast_wrap::options::Execution;
/// use ndarray::array;
///
/// let xyz = array![[[12.0, 3.0, -0.5]]];
/// let lengths = array![[10.0, 10.0, 10.0]];
/// let images = images(xyz.view(), lengths.view(), Execution::Serial).unwrap();
/// assert_eq!(images, array![[[1, 0, -1]]]);
/// ```
pub fn images(
    coordinates: ArrayView3<f64>,
    box_lengths: ArrayView2<f64>,
    execution: Execution,
) -> Result<Array3<i64>> {
    check_shapes(coordinates.dim(), box_lengths.dim())?;
    trace!("Computing images for shape {:?}", coordinates.dim());

    let expanded = box_lengths.insert_axis(Axis(1));
    let lengths = expanded
        .broadcast(coordinates.raw_dim())
        .ok_or_else(|| WrapError::shape("box lengths cannot be broadcast over coordinates"))?;

    let mut images = Array3::<i64>::zeros(coordinates.raw_dim());
    let kernel = |image: &mut i64, &x: &f64, &l: &f64| *image = image_index(x, l);
    let zip = Zip::from(&mut images).and(coordinates).and(lengths);
    match execution {
        Execution::Serial => zip.for_each(kernel),
        Execution::Parallel => zip.par_for_each(kernel),
    }
    Ok(images)
}
