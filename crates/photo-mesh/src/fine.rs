// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Fine Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Uniform-resolution fine mesh that resolves thermal line widths, and its
//! mapping onto the coarse continuum mesh.

use ndarray::Array1;
use photo_types::constants::{
    AMU_GRAMS, BOLTZMANN_ERG, FINE_MESH_MAX_CELLS, FINE_MESH_TEMPERATURE, SPEED_OF_LIGHT_CM,
};
use photo_types::error::{PhotoError, PhotoResult};

use crate::mesh::EnergyMesh;

/// Constant-resolution mesh, `energy[i] = low · (1 + resolution)^(i+1)`.
#[derive(Debug, Clone)]
pub struct FineMesh {
    low: f64,
    high: f64,
    resolution: f64,
    log_step: f64, // log10(1 + resolution)
    energy: Array1<f64>,
}

impl FineMesh {
    pub fn new(low: f64, high: f64, resolution: f64) -> PhotoResult<Self> {
        if !low.is_finite() || low <= 0.0 || !high.is_finite() || high <= low {
            return Err(PhotoError::ConfigError(format!(
                "fine mesh bounds must satisfy 0 < low < high, got [{low}, {high}]"
            )));
        }
        if !resolution.is_finite() || resolution <= 0.0 || resolution >= 1.0 {
            return Err(PhotoError::ConfigError(format!(
                "fine mesh resolution must lie in (0, 1), got {resolution}"
            )));
        }
        let log_step = (1.0 + resolution).log10();
        let cells = ((high / low).log10() / log_step).floor();
        if cells < 1.0 {
            return Err(PhotoError::ConfigError(format!(
                "fine mesh [{low}, {high}] holds no cell at resolution {resolution}"
            )));
        }
        // 1 + resolution rounds to 1 for denormal resolutions, making cells infinite
        if !cells.is_finite() || cells > FINE_MESH_MAX_CELLS as f64 {
            return Err(PhotoError::ConfigError(format!(
                "fine mesh [{low}, {high}] at resolution {resolution} needs {cells} cells, \
                 more than the {FINE_MESH_MAX_CELLS} allowed"
            )));
        }
        let energy = Array1::from_iter(
            (0..cells as usize).map(|i| low * (1.0 + resolution).powi(i as i32 + 1)),
        );
        Ok(FineMesh {
            low,
            high,
            resolution,
            log_step,
            energy,
        })
    }

    /// Resolution set by the thermal speed of the lightest species of interest
    /// at 10⁴ K, split into `cells_per_width` cells.
    pub fn for_species(
        low: f64,
        high: f64,
        atomic_weight: f64,
        cells_per_width: f64,
    ) -> PhotoResult<Self> {
        if !atomic_weight.is_finite() || atomic_weight <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "atomic weight must be finite and > 0, got {atomic_weight}"
            )));
        }
        if !cells_per_width.is_finite() || cells_per_width <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "cells per line width must be finite and > 0, got {cells_per_width}"
            )));
        }
        let speed =
            (2.0 * BOLTZMANN_ERG * FINE_MESH_TEMPERATURE / (AMU_GRAMS * atomic_weight)).sqrt();
        Self::new(low, high, speed / cells_per_width / SPEED_OF_LIGHT_CM)
    }

    pub fn cell_count(&self) -> usize {
        self.energy.len()
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn energy(&self) -> &Array1<f64> {
        &self.energy
    }

    /// Fine cell of `energy`, `None` outside the fine range.
    pub fn index(&self, energy: f64) -> Option<usize> {
        if !(energy >= self.low && energy <= self.high) {
            return None;
        }
        let x = (energy * (1.0 - 0.5 * self.resolution) / self.low).log10() / self.log_step;
        Some((x.floor().max(0.0) as usize).min(self.cell_count() - 1))
    }

    /// For each coarse cell, the first fine cell whose energy is not below the
    /// coarse centre. The first coarse cell inside the fine range maps to 0;
    /// cells outside the range map to `None`.
    pub fn coarse_to_fine(&self, coarse: &EnergyMesh) -> Vec<Option<usize>> {
        let n = self.cell_count();
        let mut ipnt = 0usize;
        let mut seen = false;
        coarse
            .energy()
            .iter()
            .take(coarse.cell_count())
            .map(|&e| {
                if e < self.low || e > self.high {
                    None
                } else if !seen {
                    seen = true;
                    Some(0)
                } else {
                    while ipnt < n && self.energy[ipnt] < e {
                        ipnt += 1;
                    }
                    Some(ipnt.min(n - 1))
                }
            })
            .collect()
    }

    /// Average transmission exp(-τ) of the fine cells under each coarse cell.
    /// Coarse cells not fully covered by the fine mesh transmit 1.
    pub fn coarse_transmission(
        &self,
        map: &[Option<usize>],
        fine_optical_depth: &Array1<f64>,
    ) -> PhotoResult<Array1<f64>> {
        if fine_optical_depth.len() != self.cell_count() {
            return Err(PhotoError::ConfigError(format!(
                "fine optical depth has {} cells, fine mesh has {}",
                fine_optical_depth.len(),
                self.cell_count()
            )));
        }
        let mut trans = Array1::from_elem(map.len(), 1.0);
        for i in 0..map.len().saturating_sub(1) {
            if let (Some(lo), Some(hi)) = (map[i], map[i + 1]) {
                trans[i] = if hi > lo {
                    let sum: f64 = (lo..hi).map(|j| (-fine_optical_depth[j]).exp()).sum();
                    sum / (hi - lo) as f64
                } else {
                    // fine mesh coarser than the coarse cell here
                    (-fine_optical_depth[lo]).exp()
                };
            }
        }
        Ok(trans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{Band, BandTable};

    #[test]
    fn test_cell_count_and_energies() {
        let fine = FineMesh::new(1.0, 2.0, 0.01).unwrap();
        let expected = (2.0f64.log10() / 1.01f64.log10()).floor() as usize;
        assert_eq!(fine.cell_count(), expected);
        assert!((fine.energy()[0] - 1.01).abs() < 1e-14);
        assert!(fine.energy()[fine.cell_count() - 1] <= 2.0);
    }

    #[test]
    fn test_centres_index_to_themselves() {
        let fine = FineMesh::new(0.5, 50.0, 1e-3).unwrap();
        for i in (0..fine.cell_count()).step_by(97) {
            assert_eq!(fine.index(fine.energy()[i]), Some(i));
        }
    }

    #[test]
    fn test_out_of_range_is_none() {
        let fine = FineMesh::new(1.0, 2.0, 0.01).unwrap();
        assert_eq!(fine.index(0.99), None);
        assert_eq!(fine.index(2.01), None);
        assert_eq!(fine.index(f64::NAN), None);
        assert_eq!(fine.index(1.0), Some(0));
    }

    #[test]
    fn test_species_resolution() {
        // hydrogen at 1e4 K: v ~ 12.9 km/s
        let fine = FineMesh::for_species(1e-3, 10.0, 1.0, 1.0).unwrap();
        let v_kms = fine.resolution() * SPEED_OF_LIGHT_CM / 1e5;
        assert!((v_kms - 12.895).abs() < 0.01, "v = {v_kms}");
        assert!(FineMesh::for_species(1e-3, 10.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(FineMesh::new(0.0, 1.0, 0.01).is_err());
        assert!(FineMesh::new(1.0, 1.0, 0.01).is_err());
        assert!(FineMesh::new(1.0, 1.001, 0.01).is_err());
        assert!(FineMesh::new(1.0, 2.0, 1.5).is_err());
    }

    #[test]
    fn test_cell_budget_enforced() {
        for resolution in [1e-9, 1e-300, f64::MIN_POSITIVE / 4.0] {
            assert!(matches!(
                FineMesh::new(1e-3, 1500.0, resolution),
                Err(PhotoError::ConfigError(_))
            ));
        }
        // thermal width of iron over the full fine range still fits
        assert!(FineMesh::for_species(0.05, 1500.0, 55.845, 1.0).is_ok());
    }

    #[test]
    fn test_coarse_mapping_and_transmission() {
        let table = BandTable::new(vec![Band::new(0.1, 100.0, 0.1)], 0.1, 100.0).unwrap();
        let coarse = EnergyMesh::build(&table, 1000).unwrap();
        let fine = FineMesh::new(1.0, 10.0, 0.001).unwrap();
        let map = fine.coarse_to_fine(&coarse);
        assert_eq!(map.len(), coarse.cell_count());

        let inside: Vec<usize> = (0..map.len()).filter(|&i| map[i].is_some()).collect();
        assert!(!inside.is_empty());
        assert_eq!(map[inside[0]], Some(0));
        for w in inside.windows(2) {
            assert!(map[w[1]] >= map[w[0]]);
            let e = coarse.energy()[w[1]];
            let j = map[w[1]].unwrap();
            assert!(fine.energy()[j] >= e);
        }

        let tau = Array1::from_elem(fine.cell_count(), 0.5);
        let trans = fine.coarse_transmission(&map, &tau).unwrap();
        for i in 0..map.len() - 1 {
            if map[i].is_some() && map[i + 1].is_some() {
                assert!((trans[i] - (-0.5f64).exp()).abs() < 1e-12);
            } else {
                assert_eq!(trans[i], 1.0);
            }
        }
    }
}
