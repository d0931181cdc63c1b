//! Self-check of a freshly built mesh.
//!
//! Every band is probed at its midpoint and 1 % in from either end; the cell
//! the index returns must bracket the probe, with one cell of slack on the
//! upper side at changes of resolution.

use photo_types::error::{PhotoError, PhotoResult};

use crate::mesh::EnergyMesh;

/// Fraction of the band span at which the low and high probes sit.
pub const PROBE_OFFSET: f64 = 0.01;

/// Where in a band a probe was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Low,
    Middle,
    High,
}

impl Probe {
    pub const ALL: [Probe; 3] = [Probe::Middle, Probe::Low, Probe::High];

    pub fn energy(self, lower: f64, upper: f64) -> f64 {
        match self {
            Probe::Middle => 0.5 * (lower + upper),
            Probe::Low => (1.0 - PROBE_OFFSET) * lower + PROBE_OFFSET * upper,
            Probe::High => PROBE_OFFSET * lower + (1.0 - PROBE_OFFSET) * upper,
        }
    }
}

/// Probe every band of `mesh`. The first failing probe is reported with its
/// band, the found cell and its bracket, and the band bounds.
pub fn validate_mesh(mesh: &EnergyMesh) -> PhotoResult<()> {
    for (band_idx, band) in mesh.layout().iter().enumerate() {
        for probe in Probe::ALL {
            let e = probe.energy(band.lower, band.upper);
            let k = mesh.locate(e)?;
            let cell_low = mesh.cell_low(k);
            let cell_high = mesh.cell_high(k);

            let too_low = e < cell_low;
            let too_high = match probe {
                Probe::Low => e > cell_high,
                Probe::Middle | Probe::High => e > cell_high && e > mesh.cell_low(k + 1),
            };
            if too_low || too_high {
                return Err(PhotoError::MeshCheckFailed {
                    band: band_idx,
                    probe: e,
                    cell: k,
                    cell_low,
                    cell_high,
                    band_low: band.lower,
                    band_high: band.upper,
                });
            }
        }
    }
    Ok(())
}
