//! Energy → cell index lookup on a built mesh.
//!
//! Indices are 0-based: cell 0 is the lowest physical cell and the sentinel
//! (`cell_count`) is never returned.

use photo_types::error::{PhotoError, PhotoResult};

use crate::mesh::EnergyMesh;

/// Relative slack on the bracket check, a few ulps of the energy.
pub const BRACKET_SLACK: f64 = 4.0 * f64::EPSILON;

impl EnergyMesh {
    /// Index of the band containing `energy`. A band boundary belongs to the
    /// lower band.
    pub fn band_index(&self, energy: f64) -> Option<usize> {
        self.layout().iter().position(|b| b.contains(energy))
    }

    /// Closed-form estimate plus local correction, without the final bracket
    /// assertion.
    pub(crate) fn locate(&self, energy: f64) -> PhotoResult<usize> {
        let (low, high) = (self.low_energy(), self.high_energy());
        // NaN fails both comparisons and lands here too
        if !(energy >= low && energy <= high) {
            return Err(PhotoError::EnergyOutOfRange { energy, low, high });
        }
        let band_idx = self
            .band_index(energy)
            .ok_or(PhotoError::EnergyOutOfRange { energy, low, high })?;
        let band = &self.layout()[band_idx];

        let estimate = ((energy / band.lower).ln() / band.log_step).floor();
        let local = (estimate.max(0.0) as usize).min(band.cell_count() - 1);
        let mut k = band.cells.start + local;

        // one step either way, never onto the sentinel or below cell 0
        let n = self.cell_count();
        if energy > self.cell_high(k) && k + 1 < n {
            k += 1;
        }
        if energy < self.cell_low(k) && k > 0 {
            k -= 1;
        }
        Ok(k)
    }

    /// Index of the cell whose half-width bracket contains `energy`.
    ///
    /// Energies outside the band table are an error, never clamped. The
    /// returned cell is checked to bracket the energy, at the mesh ends too.
    pub fn cell_index(&self, energy: f64) -> PhotoResult<usize> {
        let k = self.locate(energy)?;
        let low = self.cell_low(k);
        let high = self.cell_high(k);
        let slack = BRACKET_SLACK * energy;
        if energy < low - slack || energy > high + slack {
            return Err(PhotoError::InvariantViolation(format!(
                "cell index {k} for energy {energy} Ryd lies outside its bracket [{low}, {high}]"
            )));
        }
        Ok(k)
    }

    /// Cell of a spectral line. With an ionization edge cell given, the line
    /// is forced strictly below that edge so it never shares the edge cell.
    pub fn line_cell(&self, energy: f64, ionization_edge: Option<usize>) -> PhotoResult<usize> {
        let k = self.cell_index(energy)?;
        match ionization_edge {
            None => Ok(k),
            Some(0) => Err(PhotoError::ConfigError(format!(
                "line at {energy} Ryd cannot lie below an ionization edge in cell 0"
            ))),
            Some(edge) => Ok(k.min(edge - 1)),
        }
    }
}
