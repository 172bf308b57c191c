use crate::error::{Result, WrapError};
use crate::groups::Groups;
use crate::options::{Execution, SPATIAL_DIMENSIONS};
use log::trace;
use ndarray::{s, Array3, ArrayView3, ArrayViewMut2, Axis};
use rayon::prelude::*;

/// Computes the center of geometry of every group in every frame.
///
/// Entry `(f, m, :)` of the result is the arithmetic mean of the positions of the members of
/// group `m` at frame `f`. Each group is reduced on its own, vectorized over the frame axis.
///
/// # Arguments
/// * `coordinates` - Particle positions with shape `(frames, particles, 3)`.
/// * `groups` - The index groups to reduce.
/// * `execution` - `Parallel` reduces groups concurrently.
///
/// # Errors
/// Returns `WrapError::EmptyGroup` for a group without members,
/// `WrapError::IndexOutOfBounds` for a member index past the particle axis, and
/// `WrapError::ShapeMismatch` if the coordinates are not 3D points.
pub fn centers_of_geometry(
    coordinates: ArrayView3<f64>,
    groups: &Groups,
    execution: Execution,
) -> Result<Array3<f64>> {
    let (n_frames, n_particles, n_axes) = coordinates.dim();
    if n_axes != SPATIAL_DIMENSIONS {
        return Err(WrapError::shape(format!(
            "coordinates have {} components per point, expected {}",
            n_axes, SPATIAL_DIMENSIONS
        )));
    }
    groups.validate(n_particles)?;
    trace!("Reducing {} groups over {} frames", groups.len(), n_frames);

    let mut centers = Array3::<f64>::zeros((n_frames, groups.len(), n_axes));
    let reduce = |(m, mut center): (usize, ArrayViewMut2<f64>)| {
        let members = groups.group(m);
        for &particle in members {
            center += &coordinates.index_axis(Axis(1), particle);
        }
        center /= members.len() as f64;
    };
    match execution {
        Execution::Serial => centers.axis_iter_mut(Axis(1)).enumerate().for_each(reduce),
        Execution::Parallel => centers
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .enumerate()
            .for_each(reduce),
    }
    Ok(centers)
}

/// Copies the image of each group onto every member of the group.
///
/// Particles that belong to no group keep a zero image.
///
/// # Arguments
/// * `group_images` - Images with shape `(frames, groups, 3)`.
/// * `groups` - The index groups the images belong to.
/// * `n_particles` - Size of the particle axis of the result.
///
/// # Errors
/// Returns `WrapError::ShapeMismatch` if `group_images` does not hold one entry per group,
/// and `WrapError::IndexOutOfBounds` if a member index is not below `n_particles`.
pub fn scatter_images(
    group_images: ArrayView3<i64>,
    groups: &Groups,
    n_particles: usize,
) -> Result<Array3<i64>> {
    let (n_frames, n_groups, n_axes) = group_images.dim();
    if n_groups != groups.len() {
        return Err(WrapError::shape(format!(
            "{} group images given for {} groups",
            n_groups,
            groups.len()
        )));
    }
    groups.validate(n_particles)?;

    let mut images = Array3::<i64>::zeros((n_frames, n_particles, n_axes));
    for (m, members) in groups.iter().enumerate() {
        let image = group_images.index_axis(Axis(1), m);
        for &particle in members {
            images.slice_mut(s![.., particle, ..]).assign(&image);
        }
    }
    Ok(images)
}
