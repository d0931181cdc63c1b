// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Energy Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Piecewise-logarithmic continuum energy mesh.
//!
//! Cells are laid out band by band. Inside a band the cell centres are
//! geometric, `E_k = lower · exp(Δ(k + ½))`, and each cell is bracketed by
//! `E_k ± w_k/2`. Every bracket spans its logarithmic bin
//! `[lower · e^{Δk}, lower · e^{Δ(k+1)}]`, so the brackets cover the whole
//! band table without gaps. One sentinel cell follows the last physical cell
//! so that consumers may reference one past the end without special cases.

use std::ops::Range;

use log::{debug, trace};
use ndarray::{s, Array1};
use photo_types::config::MeshConfig;
use photo_types::constants::{BAND_CONTINUITY_TOL, LINEAR_WIDTH_STEP};
use photo_types::error::{PhotoError, PhotoResult};

use crate::band::BandTable;
use crate::validate::validate_mesh;

/// Placement of one band inside the cell arrays, fixed by the counting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    pub lower: f64,
    pub upper: f64,
    pub resolution: f64,
    pub cells: Range<usize>, // cell indices owned by this band
    pub log_step: f64,       // ln(upper/lower) / cell count
    pub width_factor: f64,   // fill-pass width / energy
}

impl BandLayout {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Centre energy of the `j`-th cell of this band.
    pub fn centre(&self, j: usize) -> f64 {
        self.lower * (self.log_step * (j as f64 + 0.5)).exp()
    }

    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.lower && energy <= self.upper
    }

    /// Lower and upper edge of the logarithmic bin of the `j`-th cell. The
    /// first bin starts at `seam`, the end of the previous band, when that lies
    /// below `lower`; the last bin ends on `upper`.
    pub fn bin(&self, j: usize, seam: f64) -> (f64, f64) {
        let low = if j == 0 {
            seam.min(self.lower)
        } else {
            self.lower * (self.log_step * j as f64).exp()
        };
        let high = if j + 1 == self.cell_count() {
            self.upper
        } else {
            self.lower * (self.log_step * (j + 1) as f64).exp()
        };
        (low, high)
    }
}

/// Width of a cell relative to its centre energy.
///
/// Small steps use the linear form Δ. Coarser steps use the symmetric bracket
/// whose upper edge lands exactly on the logarithmic bin edge, 2(e^{Δ/2} - 1).
pub fn width_factor(log_step: f64) -> f64 {
    if log_step < LINEAR_WIDTH_STEP {
        log_step
    } else {
        2.0 * (0.5 * log_step).exp_m1()
    }
}

/// Relative padding added to a bracket beyond its bin edge, so that bin edges
/// stay covered after rounding.
const BIN_EDGE_PAD: f64 = 4.0 * f64::EPSILON;

/// Widen every cell whose bracket falls short of its bin.
///
/// The linear fill width `E·Δ` of fine bands leaves gaps of order Δ²/8
/// between neighbours and at band seams; after this pass every bin edge lies
/// inside the brackets of both cells that share it.
fn cover_bins(layout: &[BandLayout], energy: &Array1<f64>, width: &mut Array1<f64>) -> usize {
    let mut widened = 0;
    let mut seam = layout[0].lower;
    for band in layout {
        for j in 0..band.cell_count() {
            let k = band.cells.start + j;
            let (low, high) = band.bin(j, seam);
            let half = (energy[k] - low).max(high - energy[k]) + BIN_EDGE_PAD * high;
            if 2.0 * half > width[k] {
                width[k] = 2.0 * half;
                widened += 1;
            }
        }
        seam = band.upper;
    }
    widened
}

/// Number of cells a band of the given span needs at the given resolution.
pub fn cells_needed(log_span: f64, resolution: f64) -> f64 {
    (log_span / resolution).ceil().max(1.0)
}

/// Built continuum energy mesh.
#[derive(Debug, Clone)]
pub struct EnergyMesh {
    table: BandTable,
    layout: Vec<BandLayout>,
    cell_count: usize,
    capacity: usize,
    energy: Array1<f64>,    // [cell_count + 1], live (may be shifted)
    width: Array1<f64>,     // [cell_count + 1]
    energy_sq: Array1<f64>, // energy², kept in step with `energy`
    pristine: Array1<f64>,  // energy as built
}

impl EnergyMesh {
    /// Build the mesh for a band table.
    ///
    /// A counting pass sizes every band and fixes its cell range, the arrays
    /// are allocated once, and a filling pass writes centres and widths. The
    /// finished mesh is validated before it is returned.
    pub fn build(table: &BandTable, capacity: usize) -> PhotoResult<Self> {
        let bands = table.bands();
        if bands.is_empty() {
            return Err(PhotoError::ConfigError(
                "energy mesh requires at least one band".to_string(),
            ));
        }

        // Counting pass
        let mut layout = Vec::with_capacity(bands.len());
        let mut total = 0usize;
        for (i, band) in bands.iter().enumerate() {
            if !band.resolution.is_finite() || band.resolution <= 0.0 {
                return Err(PhotoError::ConfigError(format!(
                    "band {i} resolution must be finite and > 0, got {}",
                    band.resolution
                )));
            }
            let needed = cells_needed(band.log_span(), band.resolution);
            if !needed.is_finite() || needed + (total as f64) + 1.0 > capacity as f64 {
                return Err(PhotoError::CapacityExceeded {
                    required: if needed.is_finite() {
                        total.saturating_add(needed as usize).saturating_add(1)
                    } else {
                        usize::MAX
                    },
                    capacity,
                });
            }
            let cells = needed as usize;
            layout.push(BandLayout {
                lower: band.lower,
                upper: band.upper,
                resolution: band.resolution,
                cells: total..total + cells,
                log_step: 0.0,
                width_factor: 0.0,
            });
            total += cells;
        }

        let cell_count = total;
        let mut energy: Array1<f64> = Array1::zeros(cell_count + 1);
        let mut width: Array1<f64> = Array1::zeros(cell_count + 1);

        // Filling pass
        let mut filled = 0usize;
        let mut previous_upper = table.global_low();
        for (i, band) in layout.iter_mut().enumerate() {
            if (1.0 - band.lower / previous_upper).abs() > BAND_CONTINUITY_TOL {
                return Err(PhotoError::BandMismatch {
                    band: i,
                    expected: previous_upper,
                    found: band.lower,
                });
            }
            let n = band.cell_count();
            band.log_step = (band.upper / band.lower).ln() / n as f64;
            band.width_factor = width_factor(band.log_step);

            for j in 0..n {
                let k = band.cells.start + j;
                energy[k] = band.centre(j);
                width[k] = energy[k] * band.width_factor;
            }
            filled += n;
            previous_upper = band.upper;

            let first = band.cells.start;
            let last = band.cells.end - 1;
            debug!(
                "fill band {i}: [{:.4e}, {:.4e}] Ryd, cells {}..{} ({n}), step {:.4e}, \
                 brackets [{:.4e}, {:.4e}], width sum {:.4e}",
                band.lower,
                band.upper,
                band.cells.start,
                band.cells.end,
                band.log_step,
                energy[first] - 0.5 * width[first],
                energy[last] + 0.5 * width[last],
                width.slice(s![first..=last]).sum()
            );
        }
        if filled != cell_count {
            return Err(PhotoError::InvariantViolation(format!(
                "energy mesh filled {filled} cells but the counting pass reserved {cell_count}"
            )));
        }

        let widened = cover_bins(&layout, &energy, &mut width);
        trace!("coverage pass widened {widened} of {cell_count} cells");

        // Sentinel
        width[cell_count] = width[cell_count - 1];
        energy[cell_count] = energy[cell_count - 1] + width[cell_count];

        if energy[0] < 0.99 * table.global_low() {
            return Err(PhotoError::InvariantViolation(format!(
                "lowest cell energy {} falls below the global low energy {}",
                energy[0],
                table.global_low()
            )));
        }
        if energy[cell_count - 1] > 1.01 * table.global_high() {
            return Err(PhotoError::InvariantViolation(format!(
                "highest cell energy {} exceeds the global high energy {}",
                energy[cell_count - 1],
                table.global_high()
            )));
        }

        let energy_sq = energy.mapv(|e| e * e);
        let mesh = EnergyMesh {
            table: table.clone(),
            layout,
            cell_count,
            capacity,
            pristine: energy.clone(),
            energy,
            width,
            energy_sq,
        };
        validate_mesh(&mesh)?;
        debug!(
            "energy mesh built: {} cells in {} bands, [{:.4e}, {:.4e}] Ryd",
            mesh.cell_count,
            mesh.layout.len(),
            mesh.low_energy(),
            mesh.high_energy()
        );
        Ok(mesh)
    }

    /// Band table and capacity from a mesh configuration.
    pub fn from_config(config: &MeshConfig) -> PhotoResult<Self> {
        let table = BandTable::from_config(config)?;
        Self::build(&table, config.cell_capacity)
    }

    /// Number of physical cells (the sentinel is not counted).
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn table(&self) -> &BandTable {
        &self.table
    }

    pub fn layout(&self) -> &[BandLayout] {
        &self.layout
    }

    /// Cell centres, sentinel included.
    pub fn energy(&self) -> &Array1<f64> {
        &self.energy
    }

    /// Cell widths, sentinel included.
    pub fn width(&self) -> &Array1<f64> {
        &self.width
    }

    pub fn energy_sq(&self) -> &Array1<f64> {
        &self.energy_sq
    }

    /// Cell centres as built, before any shift.
    pub fn pristine_energy(&self) -> &Array1<f64> {
        &self.pristine
    }

    /// Lower bound of the index domain (Ryd).
    pub fn low_energy(&self) -> f64 {
        self.layout[0].lower
    }

    /// Upper bound of the index domain (Ryd).
    pub fn high_energy(&self) -> f64 {
        self.layout[self.layout.len() - 1].upper
    }

    /// Lower edge of the half-width bracket of cell `k`.
    pub fn cell_low(&self, k: usize) -> f64 {
        self.energy[k] - 0.5 * self.width[k]
    }

    /// Upper edge of the half-width bracket of cell `k`.
    pub fn cell_high(&self, k: usize) -> f64 {
        self.energy[k] + 0.5 * self.width[k]
    }

    /// Band owning cell `k`, `None` for the sentinel or beyond.
    pub fn band_of_cell(&self, k: usize) -> Option<usize> {
        self.layout.iter().position(|b| b.cells.contains(&k))
    }

    /// Multiply every live cell energy by `factor`, e.g. a Doppler shift.
    /// Widths are left unchanged; `restore` undoes the shift.
    pub fn shift_energies(&mut self, factor: f64) -> PhotoResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "energy shift factor must be finite and > 0, got {factor}"
            )));
        }
        self.energy.mapv_inplace(|e| e * factor);
        self.energy_sq.assign(&self.energy.mapv(|e| e * e));
        Ok(())
    }

    /// Copy the as-built energies back into the live arrays.
    pub fn restore(&mut self) {
        trace!("restoring {} cell energies", self.cell_count + 1);
        self.energy.assign(&self.pristine);
        self.energy_sq.assign(&self.pristine.mapv(|e| e * e));
    }

    pub fn is_pristine(&self) -> bool {
        self.energy == self.pristine
    }
}

/// Lifecycle of the process-wide continuum mesh.
#[derive(Debug, Clone, Default)]
pub enum MeshState {
    #[default]
    Unbuilt,
    Built(EnergyMesh),
}

/// Owner of the continuum mesh. The first `create` builds it; every later
/// call restores the as-built energies instead of rebuilding.
#[derive(Debug, Clone)]
pub struct ContinuumMesh {
    capacity: usize,
    state: MeshState,
}

impl ContinuumMesh {
    pub fn new(capacity: usize) -> Self {
        ContinuumMesh {
            capacity,
            state: MeshState::Unbuilt,
        }
    }

    pub fn from_config(config: &MeshConfig) -> Self {
        Self::new(config.cell_capacity)
    }

    /// Build on first use, restore afterwards. Asking for a different band
    /// table once built is a configuration error.
    pub fn create(&mut self, table: &BandTable) -> PhotoResult<&EnergyMesh> {
        match &mut self.state {
            MeshState::Unbuilt => {
                let mesh = EnergyMesh::build(table, self.capacity)?;
                self.state = MeshState::Built(mesh);
            }
            MeshState::Built(mesh) => {
                if mesh.table() != table {
                    return Err(PhotoError::ConfigError(
                        "continuum mesh already built from a different band table".to_string(),
                    ));
                }
                mesh.restore();
            }
        }
        self.mesh()
    }

    pub fn state(&self) -> &MeshState {
        &self.state
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, MeshState::Built(_))
    }

    pub fn mesh(&self) -> PhotoResult<&EnergyMesh> {
        match &self.state {
            MeshState::Built(mesh) => Ok(mesh),
            MeshState::Unbuilt => Err(PhotoError::MeshNotBuilt),
        }
    }

    pub fn mesh_mut(&mut self) -> PhotoResult<&mut EnergyMesh> {
        match &mut self.state {
            MeshState::Built(mesh) => Ok(mesh),
            MeshState::Unbuilt => Err(PhotoError::MeshNotBuilt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Band;

    fn two_band_table() -> BandTable {
        BandTable::new(
            vec![Band::new(1.0, 10.0, 0.1), Band::new(10.0, 100.0, 0.2)],
            1.0,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn test_two_band_cell_count() {
        let mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        assert_eq!(mesh.cell_count(), 36);
        assert_eq!(mesh.energy().len(), 37);
        assert_eq!(mesh.layout()[0].cells, 0..24);
        assert_eq!(mesh.layout()[1].cells, 24..36);
    }

    #[test]
    fn test_energies_strictly_increasing() {
        let mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        let e = mesh.energy();
        for i in 1..e.len() {
            assert!(e[i] > e[i - 1], "energy not increasing at {i}");
        }
    }

    #[test]
    fn test_exact_brackets_tile_band() {
        let mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        for band in mesh.layout() {
            let first = band.cells.start;
            let last = band.cells.end - 1;
            assert!(mesh.cell_low(first) <= band.lower * (1.0 + 1e-12));
            assert!((mesh.cell_high(last) / band.upper - 1.0).abs() < 1e-12);
            for k in first..last {
                assert!(
                    mesh.cell_high(k) >= mesh.cell_low(k + 1),
                    "gap between cells {k} and {}",
                    k + 1
                );
            }
        }
    }

    #[test]
    fn test_fine_band_widened_to_cover_bins() {
        let table = BandTable::new(vec![Band::new(1.0, 2.0, 0.001)], 1.0, 2.0).unwrap();
        let mesh = EnergyMesh::build(&table, 10_000).unwrap();
        let b = &mesh.layout()[0];
        assert!(b.log_step < LINEAR_WIDTH_STEP);
        assert_eq!(b.width_factor, b.log_step);
        for k in [0, 5, b.cell_count() - 1] {
            let (low, high) = b.bin(k, 1.0);
            assert!(mesh.cell_low(k) <= low && mesh.cell_high(k) >= high, "cell {k}");
            let linear = mesh.energy()[k] * b.log_step;
            assert!(mesh.width()[k] >= linear);
            assert!(mesh.width()[k] / linear - 1.0 < b.log_step);
        }
    }

    #[test]
    fn test_fine_seam_and_top_have_no_gap() {
        let table = BandTable::new(
            vec![Band::new(1.0, 2.0, 0.009), Band::new(2.0, 4.0, 0.001)],
            1.0,
            4.0,
        )
        .unwrap();
        let mesh = EnergyMesh::build(&table, 10_000).unwrap();
        let n = mesh.cell_count();
        assert!(mesh.cell_low(0) <= 1.0);
        assert!(mesh.cell_high(n - 1) >= 4.0);
        for k in 0..n - 1 {
            assert!(
                mesh.cell_high(k) >= mesh.cell_low(k + 1),
                "gap between cells {k} and {}: {} < {}",
                k + 1,
                mesh.cell_high(k),
                mesh.cell_low(k + 1)
            );
        }
        let seam = mesh.layout()[0].cells.end - 1;
        assert!(mesh.cell_high(seam) >= 2.0 && mesh.cell_low(seam + 1) <= 2.0);
    }

    #[test]
    fn test_sentinel_cell() {
        let mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        let n = mesh.cell_count();
        assert_eq!(mesh.width()[n], mesh.width()[n - 1]);
        assert_eq!(mesh.energy()[n], mesh.energy()[n - 1] + mesh.width()[n]);
    }

    #[test]
    fn test_capacity_exceeded_reports_counts() {
        let err = EnergyMesh::build(&two_band_table(), 36).unwrap_err();
        match err {
            PhotoError::CapacityExceeded { required, capacity } => {
                assert_eq!(required, 37);
                assert_eq!(capacity, 36);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(EnergyMesh::build(&two_band_table(), 37).is_ok());
    }

    #[test]
    fn test_band_mismatch_detected() {
        let table = BandTable::new(
            vec![Band::new(1.0, 10.0, 0.1), Band::new(11.0, 100.0, 0.2)],
            1.0,
            100.0,
        )
        .unwrap();
        match EnergyMesh::build(&table, 1000).unwrap_err() {
            PhotoError::BandMismatch {
                band,
                expected,
                found,
            } => {
                assert_eq!(band, 1);
                assert_eq!(expected, 10.0);
                assert_eq!(found, 11.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_single_cell_minimum() {
        let table = BandTable::new(vec![Band::new(1.0, 1.001, 5.0)], 1.0, 1.001).unwrap();
        let mesh = EnergyMesh::build(&table, 10).unwrap();
        assert_eq!(mesh.cell_count(), 1);
    }

    #[test]
    fn test_shift_and_restore() {
        let mut mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        let built = mesh.energy().clone();
        mesh.shift_energies(1.0 + 1e-4).unwrap();
        assert!(!mesh.is_pristine());
        assert!((mesh.energy_sq()[3] - mesh.energy()[3].powi(2)).abs() < 1e-12);
        mesh.restore();
        assert!(mesh.is_pristine());
        assert_eq!(mesh.energy(), &built);
        assert!(mesh.shift_energies(0.0).is_err());
    }

    #[test]
    fn test_lifecycle_build_then_restore() {
        let table = two_band_table();
        let mut owner = ContinuumMesh::new(1000);
        assert!(!owner.is_built());
        assert!(matches!(owner.mesh(), Err(PhotoError::MeshNotBuilt)));

        let first = owner.create(&table).unwrap().energy().clone();
        owner.mesh_mut().unwrap().shift_energies(0.9).unwrap();
        let second = owner.create(&table).unwrap();
        assert_eq!(second.energy(), &first);
        assert!(owner.is_built());
    }

    #[test]
    fn test_lifecycle_rejects_other_table() {
        let mut owner = ContinuumMesh::new(1000);
        owner.create(&two_band_table()).unwrap();
        let other = BandTable::new(vec![Band::new(1.0, 100.0, 0.3)], 1.0, 100.0).unwrap();
        assert!(matches!(
            owner.create(&other),
            Err(PhotoError::ConfigError(_))
        ));
    }

    #[test]
    fn test_band_of_cell() {
        let mesh = EnergyMesh::build(&two_band_table(), 1000).unwrap();
        assert_eq!(mesh.band_of_cell(0), Some(0));
        assert_eq!(mesh.band_of_cell(23), Some(0));
        assert_eq!(mesh.band_of_cell(24), Some(1));
        assert_eq!(mesh.band_of_cell(36), None);
    }
}
