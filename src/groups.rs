use crate::error::{Result, WrapError};
use serde::{Deserialize, Serialize};

/// A ragged partition of particle indices into groups (usually residues).
///
/// All indices live in one flat buffer; `offsets[m]..offsets[m + 1]` delimits group `m`.
///
/// # Example
/// ```
/// use fast_wrap::groups::Groups;
///
/// let groups = Groups::from_nested(vec![vec![0, 1, 2], vec![3], vec![4, 5]]);
/// assert_eq!(groups.len(), 3);
/// assert_eq!(groups.group(2), &[4, 5]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<usize>>", into = "Vec<Vec<usize>>")]
pub struct Groups {
    /// Member indices of all groups, stored one group after the other.
    indices: Vec<usize>,

    /// Start of each group in `indices`, followed by `indices.len()`.
    offsets: Vec<usize>,
}

impl Default for Groups {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            offsets: vec![0],
        }
    }
}

impl From<Vec<Vec<usize>>> for Groups {
    fn from(groups: Vec<Vec<usize>>) -> Self {
        Self::from_nested(groups)
    }
}

impl From<Groups> for Vec<Vec<usize>> {
    fn from(groups: Groups) -> Self {
        groups.iter().map(|g| g.to_vec()).collect()
    }
}

impl Groups {
    /// Builds the partition from a sequence of index groups, keeping their order.
    pub fn from_nested<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<[usize]>,
    {
        let mut partition = Self::default();
        for group in groups {
            partition.push(group.as_ref());
        }
        partition
    }

    /// Builds one group per particle.
    pub fn singletons(n_particles: usize) -> Self {
        Self {
            indices: (0..n_particles).collect(),
            offsets: (0..=n_particles).collect(),
        }
    }

    /// Appends a group at the end of the partition.
    pub fn push(&mut self, group: &[usize]) {
        self.indices.extend_from_slice(group);
        self.offsets.push(self.indices.len());
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Member indices of group `m`.
    ///
    /// # Panics
    /// Panics if `m >= self.len()`.
    pub fn group(&self, m: usize) -> &[usize] {
        &self.indices[self.offsets[m]..self.offsets[m + 1]]
    }

    /// Iterates over the groups in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    /// Checks that every group is non-empty and only refers to particles below `n_particles`.
    pub fn validate(&self, n_particles: usize) -> Result<()> {
        for (group, members) in self.iter().enumerate() {
            if members.is_empty() {
                return Err(WrapError::EmptyGroup(group));
            }
            if let Some(&index) = members.iter().find(|&&i| i >= n_particles) {
                return Err(WrapError::IndexOutOfBounds {
                    group,
                    index,
                    n_particles,
                });
            }
        }
        Ok(())
    }

    /// Checks that the groups form a partition of `0..n_particles`: valid groups, no particle
    /// in two groups, and no particle left out.
    pub fn validate_partition(&self, n_particles: usize) -> Result<()> {
        self.validate(n_particles)?;
        let mut owned = vec![false; n_particles];
        for &index in &self.indices {
            if owned[index] {
                return Err(WrapError::DuplicateMembership { index });
            }
            owned[index] = true;
        }
        match owned.iter().position(|&o| !o) {
            Some(index) => Err(WrapError::UncoveredParticle { index }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nested_keeps_order() {
        let groups = Groups::from_nested(vec![vec![3, 1], vec![0], vec![2, 4, 5]]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.group(0), &[3, 1]);
        assert_eq!(groups.group(1), &[0]);
        assert_eq!(groups.group(2), &[2, 4, 5]);
        let collected: Vec<&[usize]> = groups.iter().collect();
        let expected: Vec<&[usize]> = vec![&[3, 1], &[0], &[2, 4, 5]];
        assert_eq!(collected, expected);
    }

    #[test]
    fn test_empty_partition() {
        let groups = Groups::default();
        assert!(groups.is_empty());
        assert_eq!(groups.iter().count(), 0);
        assert!(groups.validate(0).is_ok());
        assert!(groups.validate_partition(0).is_ok());
        assert!(matches!(
            groups.validate_partition(1),
            Err(WrapError::UncoveredParticle { index: 0 })
        ));
    }

    #[test]
    fn test_singletons() {
        let groups = Groups::singletons(4);
        assert_eq!(groups.len(), 4);
        for m in 0..4 {
            assert_eq!(groups.group(m), &[m]);
        }
        assert!(groups.validate_partition(4).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_out_of_bounds() {
        let groups = Groups::from_nested(vec![vec![0, 1], vec![]]);
        assert!(matches!(groups.validate(2), Err(WrapError::EmptyGroup(1))));

        let groups = Groups::from_nested(vec![vec![0], vec![1, 7]]);
        match groups.validate(3) {
            Err(WrapError::IndexOutOfBounds {
                group,
                index,
                n_particles,
            }) => {
                assert_eq!((group, index, n_particles), (1, 7, 3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_partition() {
        let groups = Groups::from_nested(vec![vec![0, 1], vec![1, 2]]);
        assert!(groups.validate(3).is_ok());
        assert!(matches!(
            groups.validate_partition(3),
            Err(WrapError::DuplicateMembership { index: 1 })
        ));

        let groups = Groups::from_nested(vec![vec![0, 2]]);
        assert!(matches!(
            groups.validate_partition(3),
            Err(WrapError::UncoveredParticle { index: 1 })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let groups = Groups::from_nested(vec![vec![0, 1], vec![2]]);
        let json = serde_json::to_string(&groups).unwrap();
        assert_eq!(json, "[[0,1],[2]]");
        let back: Groups = serde_json::from_str(&json).unwrap();
        assert_eq!(back, groups);
    }
}
