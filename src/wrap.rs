//! Wrapping of trajectories into the periodic simulation cell.
//!
//! The wrap of a point is `x - L * floor(x / L)` along each axis. With `whole_molecules`
//! enabled, the image is taken from the center of geometry of the point's group and shared by
//! all members, so bonds crossing a box face stay intact. A custom center is handled by shifting
//! the coordinates so the center lands on half the box, wrapping, and shifting back.

use crate::error::{Result, WrapError};
use crate::groups::Groups;
use crate::image::{check_shapes, images};
use crate::options::{Execution, WrapOptions};
use crate::reduce::{centers_of_geometry, scatter_images};
use crate::trajectory::{validate_box_lengths, Trajectory};
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis, Zip};

/// Wraps a trajectory, leaving the input untouched.
///
/// The whole trajectory, topology included, is copied and only the coordinates of the copy
/// are replaced.
///
/// # Errors
/// See [`wrap_coordinates_in_place`].
///
/// # Example
/// ```
/// use fast_wrap::options::WrapOptions;
/// use fast_wrap::trajectory::{Residue, Topology, Trajectory};
/// use fast_wrap::wrap::wrap;
/// use ndarray::array;
///
/// // A bond crossing the x = 10 face of the box.
/// let traj = Trajectory::new(
///     array![[[9.0, 5.0, 5.0], [11.0, 5.0, 5.0]]],
///     array![[10.0, 10.0, 10.0]],
///     Topology::new(vec![Residue::new("DIM", vec![0, 1])]),
/// )
/// .unwrap();
///
/// let wrapped = wrap(&traj, &WrapOptions::default()).unwrap();
/// assert_eq!(wrapped.xyz(), array![[[-1.0, 5.0, 5.0], [1.0, 5.0, 5.0]]]);
/// assert_eq!(traj.xyz(), array![[[9.0, 5.0, 5.0], [11.0, 5.0, 5.0]]]);
/// ```
pub fn wrap(trajectory: &Trajectory, options: &WrapOptions) -> Result<Trajectory> {
    let xyz = wrap_coordinates(
        trajectory.xyz(),
        trajectory.unitcell_lengths(),
        &trajectory.residue_groups(),
        options,
    )?;
    let mut wrapped = trajectory.clone();
    wrapped.set_xyz(xyz)?;
    Ok(wrapped)
}

/// Wraps a trajectory by overwriting its coordinates.
///
/// # Errors
/// See [`wrap_coordinates_in_place`]. On error the trajectory is left unchanged.
pub fn wrap_in_place(trajectory: &mut Trajectory, options: &WrapOptions) -> Result<()> {
    let (xyz, box_lengths, groups) = trajectory.wrapping_parts();
    wrap_coordinates_in_place(xyz.view_mut(), box_lengths, &groups, options)
}

/// Wraps a coordinate array, returning the wrapped copy.
///
/// # Errors
/// See [`wrap_coordinates_in_place`].
pub fn wrap_coordinates(
    coordinates: ArrayView3<f64>,
    box_lengths: ArrayView2<f64>,
    groups: &Groups,
    options: &WrapOptions,
) -> Result<Array3<f64>> {
    let mut wrapped = coordinates.to_owned();
    wrap_coordinates_in_place(wrapped.view_mut(), box_lengths, groups, options)?;
    Ok(wrapped)
}

/// Wraps a coordinate array in place.
///
/// # Arguments
/// * `coordinates` - Positions with shape `(frames, particles, 3)`, overwritten on success.
/// * `box_lengths` - Box edge lengths with shape `(frames, 3)`.
/// * `groups` - Partition of the particles; only read when `options.whole_molecules` is set.
/// * `options` - Whole-molecule mode, center and execution mode.
///
/// A point a rounding error below a box face keeps its image rather than landing exactly on
/// the opposite face, so wrapping is idempotent there too.
///
/// # Errors
/// All checks run before the first write, so on error `coordinates` is unchanged:
/// - `WrapError::ShapeMismatch` if the shapes of the arrays disagree,
/// - `WrapError::InvalidBox` if a box length is not finite and positive,
/// - `WrapError::EmptyGroup`, `WrapError::IndexOutOfBounds`,
///   `WrapError::DuplicateMembership` or `WrapError::UncoveredParticle` if whole molecules are
///   requested and `groups` is not a partition of the particles.
pub fn wrap_coordinates_in_place(
    mut coordinates: ArrayViewMut3<f64>,
    box_lengths: ArrayView2<f64>,
    groups: &Groups,
    options: &WrapOptions,
) -> Result<()> {
    let (n_frames, n_particles, _) = coordinates.dim();
    check_shapes(coordinates.dim(), box_lengths.dim())?;
    validate_box_lengths(box_lengths)?;
    if options.whole_molecules {
        groups.validate_partition(n_particles)?;
    }
    debug!(
        "Wrapping {} particles over {} frames (whole molecules: {}, center: {:?}, {:?})",
        n_particles, n_frames, options.whole_molecules, options.center, options.execution
    );

    let execution = options.execution;
    let offset = options
        .center
        .map(|center| center_offset(box_lengths, center.coordinates()));

    if let Some(offset) = &offset {
        translate(coordinates.view_mut(), offset.view(), 1.0, execution)?;
    }

    let particle_images = if options.whole_molecules {
        let centers = centers_of_geometry(coordinates.view(), groups, execution)?;
        let group_images = images(centers.view(), box_lengths, execution)?;
        scatter_images(group_images.view(), groups, n_particles)?
    } else {
        images(coordinates.view(), box_lengths, execution)?
    };
    debug!("Computed images of shape {:?}", particle_images.dim());

    let expanded = box_lengths.insert_axis(Axis(1));
    let lengths = expanded
        .broadcast(coordinates.raw_dim())
        .ok_or_else(|| WrapError::shape("box lengths cannot be broadcast over coordinates"))?;
    let kernel = |x: &mut f64, &image: &i64, &l: &f64| *x -= l * image as f64;
    let zip = Zip::from(&mut coordinates).and(&particle_images).and(lengths);
    match execution {
        Execution::Serial => zip.for_each(kernel),
        Execution::Parallel => zip.par_for_each(kernel),
    }

    if let Some(offset) = &offset {
        translate(coordinates.view_mut(), offset.view(), -1.0, execution)?;
    }
    Ok(())
}

/// Adds `sign * offset[f, :]` to every point of frame `f`.
fn translate(
    coordinates: ArrayViewMut3<f64>,
    offset: ArrayView2<f64>,
    sign: f64,
    execution: Execution,
) -> Result<()> {
    let expanded = offset.insert_axis(Axis(1));
    let offset = expanded
        .broadcast(coordinates.raw_dim())
        .ok_or_else(|| WrapError::shape("center offset cannot be broadcast over coordinates"))?;
    let kernel = |x: &mut f64, &o: &f64| *x += sign * o;
    let zip = Zip::from(coordinates).and(offset);
    match execution {
        Execution::Serial => zip.for_each(kernel),
        Execution::Parallel => zip.par_for_each(kernel),
    }
    Ok(())
}

/// Offset `box / 2 - center` of every frame, which moves `center` onto the middle of the box.
fn center_offset(box_lengths: ArrayView2<f64>, center: &[f64; 3]) -> Array2<f64> {
    &box_lengths * 0.5 - &ndarray::arr1(center)
}
