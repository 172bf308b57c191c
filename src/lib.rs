//! Wrap molecular dynamics trajectories into an orthogonal periodic simulation box.
//!
//! Coordinates are mapped into the fundamental cell either atom by atom or residue by
//! residue, optionally around an arbitrary center. See [`wrap::wrap`] for the entry point.

pub mod error;
pub mod groups;
pub mod image;
pub mod options;
pub mod reduce;
pub mod space;
pub mod trajectory;
pub mod wrap;

pub use error::{Result, WrapError};
pub use groups::Groups;
pub use options::{Center, Execution, WrapOptions};
pub use trajectory::{Residue, Topology, Trajectory};
pub use wrap::{wrap, wrap_coordinates, wrap_coordinates_in_place, wrap_in_place};
