use crate::error::{Result, WrapError};
use crate::groups::Groups;
use crate::image::check_shapes;
use crate::space::periodic_box::PeriodicBox;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A named group of atoms, such as an amino acid or a water molecule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residue {
    /// Residue name, e.g. `"SOL"`.
    pub name: String,

    /// Indices of the atoms in the residue.
    pub atoms: Vec<usize>,
}

impl Residue {
    /// Creates a new residue.
    pub fn new(name: impl Into<String>, atoms: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            atoms,
        }
    }
}

/// The residues of a system, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub residues: Vec<Residue>,
}

impl Topology {
    /// Creates a topology from its residues.
    pub fn new(residues: Vec<Residue>) -> Self {
        Self { residues }
    }

    /// Partition of the atoms into residues.
    pub fn groups(&self) -> Groups {
        Groups::from_nested(self.residues.iter().map(|r| r.atoms.as_slice()))
    }

    /// Loads a topology from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }

    /// Saves the topology to a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path, self)
    }
}

/// A trajectory: per-frame coordinates and orthogonal box lengths plus the topology.
///
/// A `Trajectory` always satisfies:
/// - `xyz` has shape `(frames, atoms, 3)`,
/// - `unitcell_lengths` has shape `(frames, 3)` and holds finite positive values,
/// - every residue is non-empty and refers to atoms that exist.
///
/// # Example
/// ```
/// use fast_wrap::trajectory::{Residue, Topology, Trajectory};
/// use ndarray::array;
///
/// let traj = Trajectory::new(
///     array![[[12.0, 3.0, 3.0]]],
///     array![[10.0, 10.0, 10.0]],
///     Topology::new(vec![Residue::new("AR", vec![0])]),
/// )
/// .unwrap();
/// assert_eq!(traj.n_frames(), 1);
/// assert_eq!(traj.n_atoms(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Coordinates with shape `(frames, atoms, 3)`.
    xyz: Array3<f64>,

    /// Box edge lengths with shape `(frames, 3)`.
    unitcell_lengths: Array2<f64>,

    topology: Topology,
}

impl Trajectory {
    /// Creates a new trajectory.
    ///
    /// # Errors
    /// Returns an error if the arrays have inconsistent shapes, a box length is not finite and
    /// positive, or a residue is empty or refers to a missing atom.
    pub fn new(
        xyz: Array3<f64>,
        unitcell_lengths: Array2<f64>,
        topology: Topology,
    ) -> Result<Self> {
        let trajectory = Self {
            xyz,
            unitcell_lengths,
            topology,
        };
        trajectory.validate()?;
        Ok(trajectory)
    }

    /// Checks the invariants of the trajectory.
    pub fn validate(&self) -> Result<()> {
        check_shapes(self.xyz.dim(), self.unitcell_lengths.dim())?;
        validate_box_lengths(self.unitcell_lengths.view())?;
        self.topology.groups().validate(self.n_atoms())
    }

    /// Number of frames.
    pub fn n_frames(&self) -> usize {
        self.xyz.dim().0
    }

    /// Number of atoms.
    pub fn n_atoms(&self) -> usize {
        self.xyz.dim().1
    }

    /// Coordinates with shape `(frames, atoms, 3)`.
    pub fn xyz(&self) -> ArrayView3<'_, f64> {
        self.xyz.view()
    }

    /// Box edge lengths with shape `(frames, 3)`.
    pub fn unitcell_lengths(&self) -> ArrayView2<'_, f64> {
        self.unitcell_lengths.view()
    }

    /// The residues of the system.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Partition of the atoms into residues.
    pub fn residue_groups(&self) -> Groups {
        self.topology.groups()
    }

    /// Replaces the coordinates, keeping everything else.
    ///
    /// # Errors
    /// Returns `WrapError::ShapeMismatch` if `xyz` does not have the shape of the current
    /// coordinates.
    pub fn set_xyz(&mut self, xyz: Array3<f64>) -> Result<()> {
        if xyz.dim() != self.xyz.dim() {
            return Err(WrapError::shape(format!(
                "new coordinates have shape {:?}, expected {:?}",
                xyz.dim(),
                self.xyz.dim()
            )));
        }
        self.xyz = xyz;
        Ok(())
    }

    /// Replaces the topology.
    ///
    /// # Errors
    /// Returns an error if a residue is empty or refers to a missing atom.
    pub fn with_topology(mut self, topology: Topology) -> Result<Self> {
        topology.groups().validate(self.n_atoms())?;
        self.topology = topology;
        Ok(self)
    }

    /// Mutable coordinates alongside the box lengths and residue groups they are wrapped with.
    pub(crate) fn wrapping_parts(&mut self) -> (&mut Array3<f64>, ArrayView2<'_, f64>, Groups) {
        let groups = self.topology.groups();
        (&mut self.xyz, self.unitcell_lengths.view(), groups)
    }

    /// Saves the trajectory to a file in JSON format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(path, self)
    }

    /// Loads a trajectory from a JSON file and checks its invariants.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or describes an
    /// inconsistent trajectory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let trajectory: Self = load_json(path)?;
        trajectory.validate()?;
        Ok(trajectory)
    }
}

/// Checks that every box length is finite and strictly positive.
pub(crate) fn validate_box_lengths(box_lengths: ArrayView2<f64>) -> Result<()> {
    for (frame, row) in box_lengths.outer_iter().enumerate() {
        PeriodicBox::<3>::from_row(frame, row)?;
    }
    Ok(())
}

fn save_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, value)?;
    Ok(())
}

fn load_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::NamedTempFile;

    fn argon(n_atoms: usize) -> Topology {
        Topology::new((0..n_atoms).map(|i| Residue::new("AR", vec![i])).collect())
    }

    fn water_dimer() -> Trajectory {
        let xyz = array![
            [[9.0, 5.0, 5.0], [11.0, 5.0, 5.0], [1.0, 1.0, 1.0]],
            [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
        ];
        let lengths = array![[10.0, 10.0, 10.0], [12.0, 12.0, 12.0]];
        let topology = Topology::new(vec![
            Residue::new("DIM", vec![0, 1]),
            Residue::new("AR", vec![2]),
        ]);
        Trajectory::new(xyz, lengths, topology).unwrap()
    }

    #[test]
    fn test_new_trajectory() {
        let traj = water_dimer();
        assert_eq!(traj.n_frames(), 2);
        assert_eq!(traj.n_atoms(), 3);
        assert_eq!(traj.residue_groups().len(), 2);
        assert_eq!(traj.residue_groups().group(0), &[0, 1]);
        assert_eq!(traj.topology().residues[1].name, "AR");
    }

    #[test]
    fn test_new_trajectory_rejects_bad_input() {
        let topology = argon(2);

        let result = Trajectory::new(
            Array3::zeros((2, 2, 3)),
            array![[1.0, 1.0, 1.0]],
            topology.clone(),
        );
        assert!(matches!(result, Err(WrapError::ShapeMismatch(_))));

        let result = Trajectory::new(
            Array3::zeros((1, 2, 3)),
            array![[1.0, 0.0, 1.0]],
            topology.clone(),
        );
        assert!(matches!(result, Err(WrapError::InvalidBox { axis: 1, .. })));

        let result = Trajectory::new(
            Array3::zeros((1, 1, 3)),
            array![[1.0, 1.0, 1.0]],
            topology,
        );
        assert!(matches!(result, Err(WrapError::IndexOutOfBounds { .. })));
    }

    #[test]
    fn test_set_xyz() {
        let mut traj = water_dimer();
        let xyz = Array3::from_elem((2, 3, 3), 1.5);
        traj.set_xyz(xyz.clone()).unwrap();
        assert_eq!(traj.xyz(), xyz);

        assert!(traj.set_xyz(Array3::zeros((2, 2, 3))).is_err());
        assert_eq!(traj.xyz(), xyz);
    }

    #[test]
    fn test_with_topology() {
        let traj = water_dimer();
        let traj = traj
            .with_topology(argon(3))
            .unwrap();
        assert_eq!(traj.residue_groups(), Groups::singletons(3));

        let result = water_dimer().with_topology(argon(4));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_json_temp() -> Result<()> {
        let traj = water_dimer();

        let temp_file = NamedTempFile::new()?;
        traj.save_to_file(temp_file.path())?;
        let loaded = Trajectory::load_from_file(temp_file.path())?;
        assert_eq!(loaded, traj);

        let topology_file = NamedTempFile::new()?;
        traj.topology().save_to_file(topology_file.path())?;
        let topology = Topology::load_from_file(topology_file.path())?;
        assert_eq!(&topology, traj.topology());

        Ok(())
    }

    #[test]
    fn test_load_rejects_inconsistent_file() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let bad = Trajectory {
            xyz: Array3::zeros((2, 1, 3)),
            unitcell_lengths: array![[1.0, 1.0, 1.0]],
            topology: Topology::default(),
        };
        save_json(temp_file.path(), &bad)?;
        assert!(matches!(
            Trajectory::load_from_file(temp_file.path()),
            Err(WrapError::ShapeMismatch(_))
        ));

        std::fs::write(temp_file.path(), "not json")?;
        assert!(matches!(
            Trajectory::load_from_file(temp_file.path()),
            Err(WrapError::Serialization(_))
        ));
        Ok(())
    }
}
