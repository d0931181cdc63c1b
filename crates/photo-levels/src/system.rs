//! Populations of a small closed set of levels.

use photo_types::constants::{ERG1CM, T1CM};
use photo_types::state::PlasmaConditions;

/// Levels of one ion, ground level first. Energies are measured from the
/// ground level in cm⁻¹.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSystem<const N: usize> {
    pub g: [f64; N],
    pub energy_wn: [f64; N],
    pub populations: [f64; N],
}

impl<const N: usize> LevelSystem<N> {
    pub fn new(g: [f64; N], energy_wn: [f64; N]) -> Self {
        LevelSystem {
            g,
            energy_wn,
            populations: [0.0; N],
        }
    }

    /// Levels from the gaps between consecutive levels; `gaps[i]` separates
    /// level `i` from level `i + 1`.
    pub fn from_gaps(g: [f64; N], gaps: &[f64]) -> Self {
        let mut energy_wn = [0.0; N];
        for i in 1..N {
            energy_wn[i] = energy_wn[i - 1] + gaps.get(i - 1).copied().unwrap_or(0.0);
        }
        Self::new(g, energy_wn)
    }

    pub fn total(&self) -> f64 {
        self.populations.iter().sum()
    }

    pub fn energy_kelvin(&self, level: usize) -> f64 {
        self.energy_wn[level] * T1CM
    }

    pub fn energy_erg(&self, level: usize) -> f64 {
        self.energy_wn[level] * ERG1CM
    }

    /// Population of `level` relative to its Boltzmann value with respect to
    /// the ground level; 0 when either is vanishing.
    pub fn departure(&self, level: usize, conditions: &PlasmaConditions) -> f64 {
        let ground = self.populations[0];
        let lte = conditions.boltzmann(self.energy_kelvin(level)) * self.g[level] / self.g[0];
        if ground > 0.0 && lte > 0.0 {
            self.populations[level] / ground / lte
        } else {
            0.0
        }
    }
}
