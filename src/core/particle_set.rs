//! Material points stored as parallel arrays indexed by particle id.
//!
//! The particle count and ordering are fixed for the whole run.

use rayon::prelude::*;

use crate::math::{
    Matrix, PositionTable, Real, Vector, identity_matrix, zero_matrix, zero_vector,
};

/// Mutable view of one particle's state.
pub struct ParticleMut<'a> {
    pub x: &'a mut Vector,
    pub v: &'a mut Vector,
    pub f: &'a mut Matrix,
    pub c: &'a mut Matrix,
    pub jp: &'a mut Real,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSet {
    /// Positions
    pub x: Vec<Vector>,
    /// Velocities
    pub v: Vec<Vector>,
    /// Deformation gradients
    pub f: Vec<Matrix>,
    /// APIC affine velocity fields, overwritten every G2P
    pub c: Vec<Matrix>,
    /// Plastic volume ratios, kept in `[JP_MIN, JP_MAX]`
    pub jp: Vec<Real>,
}

impl ParticleSet {
    /// Particles at rest: zero velocity and affine field, identity `F`, `Jp = 1`.
    pub fn from_positions(positions: &PositionTable) -> Self {
        let x: Vec<Vector> = positions.row_iter().map(|row| row.transpose()).collect();
        let n = x.len();
        Self {
            x,
            v: vec![zero_vector(); n],
            f: vec![identity_matrix(); n],
            c: vec![zero_matrix(); n],
            jp: vec![1.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Copy of the current positions as an N x 3 table.
    pub fn positions_table(&self) -> PositionTable {
        PositionTable::from_fn(self.len(), |row, axis| self.x[row][axis])
    }

    /// Parallel iterator over `(particle id, state)`, in particle order.
    pub fn par_iter_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, ParticleMut<'_>)> {
        self.x
            .par_iter_mut()
            .zip(self.v.par_iter_mut())
            .zip(self.f.par_iter_mut())
            .zip(self.c.par_iter_mut())
            .zip(self.jp.par_iter_mut())
            .enumerate()
            .map(|(index, ((((x, v), f), c), jp))| (index, ParticleMut { x, v, f, c, jp }))
    }

    pub fn total_momentum(&self, mass: Real) -> Vector {
        self.v.iter().fold(zero_vector(), |acc, v| acc + v * mass)
    }

    pub fn kinetic_energy(&self, mass: Real) -> Real {
        self.v.iter().map(|v| 0.5 * mass * v.norm_squared()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_round_trip_through_table() {
        let table = PositionTable::from_row_slice(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let particles = ParticleSet::from_positions(&table);

        assert_eq!(particles.len(), 2);
        assert_eq!(particles.x[1], Vector::new(0.4, 0.5, 0.6));
        assert_eq!(particles.f[0], identity_matrix());
        assert_eq!(particles.jp, vec![1.0, 1.0]);
        assert_eq!(particles.positions_table(), table);
    }

    #[test]
    fn empty_table_gives_empty_set() {
        let table = PositionTable::zeros(0);
        let particles = ParticleSet::from_positions(&table);
        assert!(particles.is_empty());
        assert_eq!(particles.positions_table().nrows(), 0);
    }

    #[test]
    fn momentum_and_energy() {
        let table = PositionTable::from_row_slice(&[0.5, 0.5, 0.5, 0.6, 0.6, 0.6]);
        let mut particles = ParticleSet::from_positions(&table);
        particles.v[0] = Vector::new(1.0, 0.0, 0.0);
        particles.v[1] = Vector::new(0.0, -2.0, 0.0);

        assert_eq!(particles.total_momentum(2.0), Vector::new(2.0, -4.0, 0.0));
        assert_eq!(particles.kinetic_energy(2.0), 5.0);
    }
}
