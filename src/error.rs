use thiserror::Error;

/// Errors raised while validating or wrapping a trajectory.
///
/// Every variant except `Io` and `Serialization` is a precondition violation detected before
/// any coordinate is touched, so a failed call never leaves a partially wrapped buffer behind.
#[derive(Error, Debug)]
pub enum WrapError {
    /// Coordinate, box or image arrays have inconsistent shapes.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A box edge length is not finite and strictly positive.
    #[error("Invalid box length {value} at frame {frame}, axis {axis}")]
    InvalidBox { frame: usize, axis: usize, value: f64 },

    /// The requested center is not made of exactly 3 finite numbers.
    #[error("Invalid center: {0}")]
    InvalidCenter(String),

    /// A group without members has no center of geometry.
    #[error("Group {0} is empty")]
    EmptyGroup(usize),

    /// A group refers to a particle that does not exist.
    #[error("Group {group} refers to particle {index}, but there are only {n_particles} particles")]
    IndexOutOfBounds {
        group: usize,
        index: usize,
        n_particles: usize,
    },

    /// A particle belongs to more than one group.
    #[error("Particle {index} belongs to more than one group")]
    DuplicateMembership { index: usize },

    /// A particle belongs to no group while whole molecules are requested.
    #[error("Particle {index} does not belong to any group")]
    UncoveredParticle { index: usize },

    /// I/O errors while loading or saving a trajectory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WrapError {
    /// Creates a shape mismatch error.
    pub fn shape(message: impl Into<String>) -> Self {
        WrapError::ShapeMismatch(message.into())
    }

    /// Creates a center validation error.
    pub fn center(message: impl Into<String>) -> Self {
        WrapError::InvalidCenter(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WrapError>;
