// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Band Table
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordered energy bands, each with its own logarithmic resolution.

use photo_types::config::MeshConfig;
use photo_types::constants::BAND_CONTINUITY_TOL;
use photo_types::error::{PhotoError, PhotoResult};

/// One band of the continuum: [lower, upper] Ryd at resolution Δ(ln E).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub resolution: f64,
}

impl Band {
    pub fn new(lower: f64, upper: f64, resolution: f64) -> Self {
        Band {
            lower,
            upper,
            resolution,
        }
    }

    /// ln(upper/lower)
    pub fn log_span(&self) -> f64 {
        (self.upper / self.lower).ln()
    }
}

/// Validated band sequence plus the global energy bounds.
///
/// Bands are stored in ascending order. Adjacency of neighbouring bands is
/// checked when the mesh is filled, so a table may be assembled here that the
/// mesh builder later rejects with a band mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bands: Vec<Band>,
    global_low: f64,
    global_high: f64,
}

impl BandTable {
    /// Build from explicit bands. A last band with `upper == 0` is closed at
    /// `global_high`.
    pub fn new(mut bands: Vec<Band>, global_low: f64, global_high: f64) -> PhotoResult<Self> {
        if !global_low.is_finite() || global_low <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "global low energy must be finite and > 0, got {global_low}"
            )));
        }
        if !global_high.is_finite() || global_high <= global_low {
            return Err(PhotoError::ConfigError(format!(
                "global high energy must exceed the low energy {global_low}, got {global_high}"
            )));
        }
        let Some(last) = bands.last_mut() else {
            return Err(PhotoError::ConfigError(
                "band table requires at least one band".to_string(),
            ));
        };
        if last.upper == 0.0 {
            last.upper = global_high;
        }

        for (i, band) in bands.iter().enumerate() {
            if !band.resolution.is_finite() || band.resolution <= 0.0 {
                return Err(PhotoError::ConfigError(format!(
                    "band {i} resolution must be finite and > 0, got {}",
                    band.resolution
                )));
            }
            if !band.lower.is_finite() || !band.upper.is_finite() || band.lower <= 0.0 {
                return Err(PhotoError::ConfigError(format!(
                    "band {i} bounds must be finite and positive, got [{}, {}]",
                    band.lower, band.upper
                )));
            }
            if band.upper <= band.lower {
                return Err(PhotoError::ConfigError(format!(
                    "band {i} upper energy {} must exceed its lower energy {}",
                    band.upper, band.lower
                )));
            }
        }

        let first = bands[0].lower;
        let top = bands[bands.len() - 1].upper;
        if (1.0 - first / global_low).abs() > BAND_CONTINUITY_TOL {
            return Err(PhotoError::ConfigError(format!(
                "first band starts at {first}, expected the global low energy {global_low}"
            )));
        }
        if (1.0 - top / global_high).abs() > BAND_CONTINUITY_TOL {
            return Err(PhotoError::ConfigError(format!(
                "last band ends at {top}, expected the global high energy {global_high}"
            )));
        }

        Ok(BandTable {
            bands,
            global_low,
            global_high,
        })
    }

    /// Chain stored `(upper, value)` rows into bands: each band starts where
    /// the previous one ended, the first at `low_energy`.
    pub fn from_config(config: &MeshConfig) -> PhotoResult<Self> {
        if !config.resolution_scale.is_finite() || config.resolution_scale <= 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "resolution scale factor must be finite and > 0, got {}",
                config.resolution_scale
            )));
        }
        let n = config.bands.len();
        let mut bands = Vec::with_capacity(n);
        let mut lower = config.low_energy;
        for (i, stored) in config.bands.iter().enumerate() {
            let upper = if stored.upper_energy == 0.0 {
                if i + 1 != n {
                    return Err(PhotoError::ConfigError(format!(
                        "band {i} has zero upper energy but is not the last band"
                    )));
                }
                config.high_energy
            } else {
                stored.upper_energy
            };
            if i + 1 == n && stored.upper_energy != 0.0 {
                return Err(PhotoError::ConfigError(format!(
                    "last band upper energy must be 0, got {}",
                    stored.upper_energy
                )));
            }
            bands.push(Band::new(lower, upper, config.resolution_of(stored)));
            lower = upper;
        }
        Self::new(bands, config.low_energy, config.high_energy)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn global_low(&self) -> f64 {
        self.global_low
    }

    pub fn global_high(&self) -> f64 {
        self.global_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_types::config::{MeshFileVersion, StoredBand};

    fn config(bands: &[(f64, f64)]) -> MeshConfig {
        MeshConfig {
            version: MeshFileVersion::Resolution,
            low_energy: 1.0,
            high_energy: 100.0,
            resolution_scale: 1.0,
            cell_capacity: 1000,
            bands: bands
                .iter()
                .map(|&(upper_energy, value)| StoredBand {
                    upper_energy,
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_from_config_chains_bands() {
        let table = BandTable::from_config(&config(&[(10.0, 0.1), (0.0, 0.2)])).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.bands()[0], Band::new(1.0, 10.0, 0.1));
        assert_eq!(table.bands()[1], Band::new(10.0, 100.0, 0.2));
    }

    #[test]
    fn test_resolving_power_converted() {
        let mut cfg = config(&[(10.0, 10.0), (0.0, 5.0)]);
        cfg.version = MeshFileVersion::ResolvingPower;
        cfg.resolution_scale = 0.5;
        let table = BandTable::from_config(&cfg).unwrap();
        assert!((table.bands()[0].resolution - 0.05).abs() < 1e-15);
        assert!((table.bands()[1].resolution - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_zero_upper_closes_at_global_high() {
        let table = BandTable::new(vec![Band::new(1.0, 0.0, 0.1)], 1.0, 50.0).unwrap();
        assert_eq!(table.bands()[0].upper, 50.0);
    }

    #[test]
    fn test_rejects_non_positive_resolution() {
        let err = BandTable::new(vec![Band::new(1.0, 10.0, 0.0)], 1.0, 10.0).unwrap_err();
        assert!(matches!(err, PhotoError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(BandTable::new(Vec::new(), 1.0, 10.0).is_err());
    }

    #[test]
    fn test_rejects_bad_global_bounds() {
        assert!(BandTable::new(vec![Band::new(1.0, 10.0, 0.1)], 0.0, 10.0).is_err());
        assert!(BandTable::new(vec![Band::new(1.0, 10.0, 0.1)], 1.0, 1.0).is_err());
    }

    #[test]
    fn test_rejects_zero_upper_before_last() {
        assert!(BandTable::from_config(&config(&[(0.0, 0.1), (0.0, 0.2)])).is_err());
    }

    #[test]
    fn test_rejects_unclosed_table() {
        assert!(BandTable::from_config(&config(&[(10.0, 0.1), (100.0, 0.2)])).is_err());
    }

    #[test]
    fn test_rejects_table_not_reaching_global_bounds() {
        let bands = vec![Band::new(2.0, 10.0, 0.1)];
        assert!(BandTable::new(bands, 1.0, 10.0).is_err());
    }
}
