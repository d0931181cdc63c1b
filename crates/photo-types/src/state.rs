// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{COLL_CONST, ELECTRONS_PER_HYDROGEN, PLASMA_FREQUENCY_RYD};
use crate::error::{PhotoError, PhotoResult};

/// Local thermal state of a zone, with the temperature factors every rate
/// equation needs precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaConditions {
    pub temperature: f64,      // electron temperature (K)
    pub electron_density: f64, // cm⁻³
    pub plasma_frequency: f64, // cutoff below which radiation cannot propagate (Ryd)
    pub cdsqte: f64,           // COLL_CONST · n_e / √T
    pub teinv: f64,            // 1/T
    pub tsq1: f64,             // 1/T²
    pub halfte: f64,           // 1/(2T)
}

impl PlasmaConditions {
    /// Conditions with no plasma cutoff.
    pub fn new(temperature: f64, electron_density: f64) -> PhotoResult<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "temperature must be finite and > 0, got {temperature}"
            )));
        }
        if !electron_density.is_finite() || electron_density < 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "electron density must be finite and >= 0, got {electron_density}"
            )));
        }
        Ok(PlasmaConditions {
            temperature,
            electron_density,
            plasma_frequency: 0.0,
            cdsqte: COLL_CONST * electron_density / temperature.sqrt(),
            teinv: 1.0 / temperature,
            tsq1: 1.0 / (temperature * temperature),
            halfte: 0.5 / temperature,
        })
    }

    /// Set the plasma-frequency cutoff (Ryd).
    pub fn with_plasma_frequency(mut self, plasma_frequency: f64) -> PhotoResult<Self> {
        if !plasma_frequency.is_finite() || plasma_frequency < 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "plasma frequency must be finite and >= 0, got {plasma_frequency}"
            )));
        }
        self.plasma_frequency = plasma_frequency;
        Ok(self)
    }

    /// Plasma frequency (Ryd) of a fully ionized gas with the given hydrogen density.
    pub fn plasma_frequency_for(hydrogen_density: f64) -> f64 {
        PLASMA_FREQUENCY_RYD * (ELECTRONS_PER_HYDROGEN * hydrogen_density.max(0.0)).sqrt()
    }

    /// exp(-T_exc/T)
    pub fn boltzmann(&self, excitation_kelvin: f64) -> f64 {
        (-excitation_kelvin * self.teinv).exp()
    }

    /// d(ln cooling)/dT factor of a line with the given excitation temperature.
    pub fn cooling_slope(&self, excitation_kelvin: f64) -> f64 {
        excitation_kelvin * self.tsq1 - self.halfte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_factors() {
        let c = PlasmaConditions::new(1.0e4, 100.0).unwrap();
        assert!((c.cdsqte - COLL_CONST).abs() < 1e-18);
        assert!((c.teinv - 1e-4).abs() < 1e-18);
        assert!((c.tsq1 - 1e-8).abs() < 1e-22);
        assert!((c.halfte - 5e-5).abs() < 1e-18);
        assert_eq!(c.plasma_frequency, 0.0);
    }

    #[test]
    fn test_rejects_bad_temperature() {
        assert!(PlasmaConditions::new(0.0, 1.0).is_err());
        assert!(PlasmaConditions::new(f64::NAN, 1.0).is_err());
        assert!(PlasmaConditions::new(1e4, -1.0).is_err());
    }

    #[test]
    fn test_plasma_frequency_scales_with_sqrt_density() {
        let f1 = PlasmaConditions::plasma_frequency_for(1e4);
        let f2 = PlasmaConditions::plasma_frequency_for(4e4);
        assert!((f2 / f1 - 2.0).abs() < 1e-12);
        // 1e10 cm^-3 gives ~3e-7 Ryd (~0.9 GHz)
        let f = PlasmaConditions::plasma_frequency_for(1e10);
        assert!(f > 2.5e-7 && f < 3.5e-7, "f = {f}");
    }

    #[test]
    fn test_cooling_slope_sign() {
        let c = PlasmaConditions::new(1e4, 1.0).unwrap();
        assert!(c.cooling_slope(1e5) > 0.0);
        assert!(c.cooling_slope(1e3) < 0.0);
    }
}
