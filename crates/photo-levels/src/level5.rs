//! Five-level atom solved as a dense linear system.
//!
//! Rows 0..3 of the rate matrix balance the population of levels 0..3; the
//! balance of level 4 is replaced by particle conservation. Pumping acts
//! only out of the ground level.

use log::trace;
use ndarray::{Array1, Array2};
use photo_math::linalg::lu_solve;
use photo_types::config::RoundoffTolerances;
use photo_types::constants::T1CM;
use photo_types::error::{PhotoError, PhotoResult};
use photo_types::state::PlasmaConditions;
use serde::{Deserialize, Serialize};

use crate::system::LevelSystem;
use crate::transition::SolveStatus;

/// Level pairs (lower, upper) in the order collision strengths and Einstein
/// coefficients are given.
pub const PAIRS: [(usize, usize); 10] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 3),
    (2, 4),
    (3, 4),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveLevelAtom {
    /// Statistical weights, ground level first.
    pub g: [f64; 5],
    /// Energy between level i and level i+1 (cm⁻¹).
    pub energy_gaps_wn: [f64; 4],
    /// Collision strengths per pair, ordered as [`PAIRS`].
    pub collision_strengths: [f64; 10],
    /// Spontaneous decay rates upper → lower per pair, ordered as [`PAIRS`].
    pub einstein_a: [f64; 10],
    /// Radiative excitation rates out of the ground level to levels 1..4.
    #[serde(default)]
    pub pumps: [f64; 4],
    pub abundance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiveLevelSolution {
    pub system: LevelSystem<5>,
    /// Net collisional cooling (erg cm⁻³ s⁻¹).
    pub cooling: f64,
    pub cooling_derivative: f64,
    pub status: SolveStatus,
}

impl FiveLevelSolution {
    fn zero(atom: &FiveLevelAtom) -> Self {
        FiveLevelSolution {
            system: LevelSystem::from_gaps(atom.g, &atom.energy_gaps_wn),
            cooling: 0.0,
            cooling_derivative: 0.0,
            status: SolveStatus::Degenerate,
        }
    }
}

fn check_all(name: &str, values: &[f64], strictly_positive: bool) -> PhotoResult<()> {
    for (i, &v) in values.iter().enumerate() {
        let ok = v.is_finite() && if strictly_positive { v > 0.0 } else { v >= 0.0 };
        if !ok {
            let bound = if strictly_positive { "> 0" } else { ">= 0" };
            return Err(PhotoError::ConfigError(format!(
                "{name}[{i}] must be finite and {bound}, got {v}"
            )));
        }
    }
    Ok(())
}

impl FiveLevelAtom {
    pub fn validate(&self) -> PhotoResult<()> {
        check_all("g", &self.g, true)?;
        check_all("energy_gaps_wn", &self.energy_gaps_wn, true)?;
        check_all("collision_strengths", &self.collision_strengths, false)?;
        check_all("einstein_a", &self.einstein_a, false)?;
        check_all("pumps", &self.pumps, false)?;
        if !self.abundance.is_finite() || self.abundance < 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "ion abundance must be finite and >= 0, got {}",
                self.abundance
            )));
        }
        Ok(())
    }

    /// Boltzmann factor between every pair of levels, built from the
    /// adjacent factors.
    pub fn boltzmann_factors(&self, conditions: &PlasmaConditions) -> [[f64; 5]; 5] {
        let adjacent = self.energy_gaps_wn.map(|gap| conditions.boltzmann(gap * T1CM));
        let mut bf = [[1.0; 5]; 5];
        for lo in 0..5 {
            for hi in (lo + 1)..5 {
                bf[lo][hi] = bf[lo][hi - 1] * adjacent[hi - 1];
                bf[hi][lo] = bf[lo][hi];
            }
        }
        bf
    }

    /// Collision rates `col[from][to]` (s⁻¹).
    pub fn collision_rates(&self, conditions: &PlasmaConditions) -> [[f64; 5]; 5] {
        let bf = self.boltzmann_factors(conditions);
        let mut col = [[0.0; 5]; 5];
        for (&(lo, hi), &cs) in PAIRS.iter().zip(self.collision_strengths.iter()) {
            col[hi][lo] = conditions.cdsqte * cs / self.g[hi];
            col[lo][hi] = col[hi][lo] * self.g[hi] / self.g[lo] * bf[lo][hi];
        }
        col
    }

    /// Spontaneous decay rates `a[upper][lower]`.
    fn decay_rates(&self) -> [[f64; 5]; 5] {
        let mut a = [[0.0; 5]; 5];
        for (&(lo, hi), &rate) in PAIRS.iter().zip(self.einstein_a.iter()) {
            a[hi][lo] = rate;
        }
        a
    }

    /// Rate matrix and right-hand side of the balance equations.
    pub fn rate_matrix(&self, conditions: &PlasmaConditions) -> (Array2<f64>, Array1<f64>) {
        let col = self.collision_rates(conditions);
        let a = self.decay_rates();
        let pump_into = |level: usize| if level == 0 { 0.0 } else { self.pumps[level - 1] };

        let mut amat = Array2::zeros((5, 5));
        for i in 0..4 {
            for j in 0..5 {
                amat[[i, j]] = if i == j {
                    let collisions: f64 = (0..5).filter(|&k| k != i).map(|k| col[i][k]).sum();
                    let decays: f64 = (0..i).map(|k| a[i][k]).sum();
                    let pumps: f64 = if i == 0 { self.pumps.iter().sum() } else { 0.0 };
                    collisions + decays + pumps
                } else {
                    let decay = if j > i { a[j][i] } else { 0.0 };
                    let pump = if j == 0 { pump_into(i) } else { 0.0 };
                    -(col[j][i] + decay + pump)
                };
            }
        }
        amat.row_mut(4).fill(1.0);

        let mut rhs = Array1::zeros(5);
        rhs[4] = self.abundance;
        (amat, rhs)
    }

    pub fn solve(
        &self,
        conditions: &PlasmaConditions,
        tolerances: &RoundoffTolerances,
    ) -> PhotoResult<FiveLevelSolution> {
        self.validate()?;
        if self.abundance == 0.0 {
            return Ok(FiveLevelSolution::zero(self));
        }
        let bf = self.boltzmann_factors(conditions);
        if bf[0][4] + self.pumps[3] == 0.0 {
            trace!("five-level atom: top level unreachable at T={}", conditions.temperature);
            return Ok(FiveLevelSolution::zero(self));
        }

        let (amat, rhs) = self.rate_matrix(conditions);
        let x = lu_solve(&amat, &rhs)?;

        let floor = tolerances.difference_snap * self.abundance;
        let mut pops = [0.0; 5];
        for level in 1..5 {
            let p = x[level];
            pops[level] = if p >= 0.0 {
                p
            } else if p >= -floor {
                0.0
            } else {
                return Err(PhotoError::InvariantViolation(format!(
                    "five-level population of level {level} is {p:e} (abundance {:e})",
                    self.abundance
                )));
            };
        }
        pops[0] = self.abundance - pops[1..].iter().sum::<f64>();

        let mut system = LevelSystem::from_gaps(self.g, &self.energy_gaps_wn);
        system.populations = pops;

        let col = self.collision_rates(conditions);
        let mut cooling = 0.0;
        let mut cooling_derivative = 0.0;
        for &(lo, hi) in PAIRS.iter() {
            let exchange = (pops[lo] * col[lo][hi] - pops[hi] * col[hi][lo])
                * (system.energy_erg(hi) - system.energy_erg(lo));
            cooling += exchange;
            cooling_derivative += exchange * conditions.cooling_slope(system.energy_kelvin(hi));
        }

        Ok(FiveLevelSolution {
            system,
            cooling,
            cooling_derivative,
            status: SolveStatus::Solved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_math::linalg::residual;

    /// [S II]-like 4S, 2D, 2P term structure.
    fn sulphur_ii(abundance: f64) -> FiveLevelAtom {
        FiveLevelAtom {
            g: [4.0, 4.0, 6.0, 2.0, 4.0],
            energy_gaps_wn: [14852.94, 31.94, 9711.52, 172.75],
            collision_strengths: [2.76, 4.14, 0.98, 2.15, 7.47, 1.79, 2.20, 2.71, 4.97, 1.22],
            einstein_a: [8.8e-4, 2.6e-4, 0.0906, 0.225, 3.35e-7, 0.163, 0.181, 0.078, 0.179, 1.03e-6],
            pumps: [0.0; 4],
            abundance,
        }
    }

    fn tol() -> RoundoffTolerances {
        RoundoffTolerances::default()
    }

    #[test]
    fn test_populations_sum_to_abundance() {
        let cond = PlasmaConditions::new(1e4, 1e3).unwrap();
        let sol = sulphur_ii(2.0).solve(&cond, &tol()).unwrap();
        assert_eq!(sol.status, SolveStatus::Solved);
        assert!((sol.system.total() - 2.0).abs() < 1e-12);
        assert!(sol.system.populations.iter().all(|&p| p >= 0.0));
        assert!(sol.system.populations[0] > sol.system.populations[1]);
        assert!(sol.cooling > 0.0);
    }

    #[test]
    fn test_balance_residual_vanishes() {
        let cond = PlasmaConditions::new(8e3, 1e4).unwrap();
        let atom = sulphur_ii(1.0);
        let sol = atom.solve(&cond, &tol()).unwrap();
        let (amat, rhs) = atom.rate_matrix(&cond);
        let x = Array1::from_vec(sol.system.populations.to_vec());
        let r = residual(&amat, &x, &rhs);
        let scale = amat.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        for v in r.iter() {
            assert!(v.abs() < 1e-10 * scale, "residual {v}");
        }
    }

    #[test]
    fn test_zero_abundance_gives_zeros() {
        let cond = PlasmaConditions::new(1e4, 1e3).unwrap();
        let sol = sulphur_ii(0.0).solve(&cond, &tol()).unwrap();
        assert_eq!(sol.status, SolveStatus::Degenerate);
        assert_eq!(sol.system.populations, [0.0; 5]);
        assert_eq!(sol.cooling, 0.0);
        assert_eq!(sol.cooling_derivative, 0.0);
    }

    #[test]
    fn test_unreachable_top_level_gives_zeros() {
        let cond = PlasmaConditions::new(10.0, 1e3).unwrap();
        let sol = sulphur_ii(1.0).solve(&cond, &tol()).unwrap();
        assert_eq!(sol.status, SolveStatus::Degenerate);
        assert_eq!(sol.system.populations, [0.0; 5]);
    }

    #[test]
    fn test_negative_abundance_is_config_error() {
        let cond = PlasmaConditions::new(1e4, 1e3).unwrap();
        assert!(matches!(
            sulphur_ii(-1.0).solve(&cond, &tol()),
            Err(PhotoError::ConfigError(_))
        ));
    }

    #[test]
    fn test_no_coupling_is_singular() {
        let mut atom = sulphur_ii(1.0);
        atom.einstein_a = [0.0; 10];
        let cond = PlasmaConditions::new(1e4, 0.0).unwrap();
        assert!(matches!(atom.solve(&cond, &tol()), Err(PhotoError::LinAlg(_))));
    }

    #[test]
    fn test_boltzmann_factors_are_cumulative() {
        let cond = PlasmaConditions::new(1e4, 1e3).unwrap();
        let bf = sulphur_ii(1.0).boltzmann_factors(&cond);
        let direct = cond.boltzmann((14852.94 + 31.94 + 9711.52) * T1CM);
        assert!((bf[0][3] - direct).abs() < 1e-14);
        assert_eq!(bf[2][1], bf[1][2]);
        assert_eq!(bf[3][3], 1.0);
    }

    #[test]
    fn test_high_density_approaches_boltzmann() {
        let cond = PlasmaConditions::new(1e4, 1e12).unwrap();
        let sol = sulphur_ii(1.0).solve(&cond, &tol()).unwrap();
        for level in 1..5 {
            let b = sol.system.departure(level, &cond);
            assert!((b - 1.0).abs() < 1e-3, "level {level}: b = {b}");
        }
    }
}
