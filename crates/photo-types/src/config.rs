// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CELL_CAPACITY, DEFAULT_HIGH_ENERGY_RYD, DEFAULT_LOW_ENERGY_RYD};
use crate::error::{PhotoError, PhotoResult};

/// Magic version triple of a mesh file whose second column is a resolution Δ(ln E).
pub const VERSION_RESOLUTION: [u32; 3] = [1, 9, 29];
/// Magic version triple of a mesh file whose second column is a resolving power E/ΔE.
pub const VERSION_RESOLVING_POWER: [u32; 3] = [10, 8, 8];

/// Meaning of the second column of a stored band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeshFileVersion {
    #[default]
    Resolution,
    ResolvingPower,
}

impl MeshFileVersion {
    pub fn from_magic(magic: [u32; 3]) -> PhotoResult<Self> {
        if magic == VERSION_RESOLUTION {
            Ok(Self::Resolution)
        } else if magic == VERSION_RESOLVING_POWER {
            Ok(Self::ResolvingPower)
        } else {
            Err(PhotoError::ConfigError(format!(
                "continuum mesh file has unsupported version {} {} {}",
                magic[0], magic[1], magic[2]
            )))
        }
    }
}

/// One row of the band table: upper energy (Ryd) and its resolution column.
/// An upper energy of 0 closes the table at the global high bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredBand {
    pub upper_energy: f64,
    pub value: f64,
}

/// Continuum mesh configuration.
/// Maps 1:1 to mesh_config.json; the legacy continuum_mesh.ini reads into the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    #[serde(default)]
    pub version: MeshFileVersion,
    /// Lowest energy of the mesh (Ryd)
    #[serde(default = "default_low_energy")]
    pub low_energy: f64,
    /// Highest energy of the mesh (Ryd)
    #[serde(default = "default_high_energy")]
    pub high_energy: f64,
    /// Multiplies every band resolution (< 1 refines the mesh)
    #[serde(default = "default_resolution_scale")]
    pub resolution_scale: f64,
    /// Maximum number of cells, sentinel included
    #[serde(default = "default_cell_capacity")]
    pub cell_capacity: usize,
    pub bands: Vec<StoredBand>,
}

fn default_low_energy() -> f64 {
    DEFAULT_LOW_ENERGY_RYD
}
fn default_high_energy() -> f64 {
    DEFAULT_HIGH_ENERGY_RYD
}
fn default_resolution_scale() -> f64 {
    1.0
}
fn default_cell_capacity() -> usize {
    DEFAULT_CELL_CAPACITY
}

impl MeshConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> PhotoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: MeshConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load a legacy `continuum_mesh.ini` file.
    pub fn from_ini_file(path: &str) -> PhotoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ini(&contents)
    }

    /// Parse the legacy band table format.
    ///
    /// The first data line holds the version triple, every further data line an
    /// `upper_energy value` pair. Lines starting with `#` are comments. Upper
    /// energies must increase and the last one must be 0.
    pub fn parse_ini(text: &str) -> PhotoResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (line_no, magic_line) = lines.next().ok_or_else(|| {
            PhotoError::ConfigError("continuum mesh file is empty".to_string())
        })?;
        let magic = parse_numbers(magic_line, line_no)?;
        if magic.len() < 3 || magic[..3].iter().any(|v| *v < 0.0 || v.fract() != 0.0) {
            return Err(PhotoError::ConfigError(format!(
                "line {line_no}: expected a version triple, got '{magic_line}'"
            )));
        }
        let version = MeshFileVersion::from_magic([magic[0] as u32, magic[1] as u32, magic[2] as u32])?;

        let mut bands: Vec<StoredBand> = Vec::new();
        for (line_no, line) in lines {
            if let Some(last) = bands.last() {
                if last.upper_energy == 0.0 {
                    return Err(PhotoError::ConfigError(format!(
                        "line {line_no}: band table continues after the closing zero energy"
                    )));
                }
            }
            let numbers = parse_numbers(line, line_no)?;
            if numbers.len() < 2 {
                return Err(PhotoError::ConfigError(format!(
                    "line {line_no}: expected 'upper_energy value', got '{line}'"
                )));
            }
            let (upper_energy, value) = (numbers[0], numbers[1]);
            if upper_energy < 0.0 || value <= 0.0 {
                return Err(PhotoError::ConfigError(format!(
                    "line {line_no}: negative energy or non-positive resolution ({upper_energy}, {value})"
                )));
            }
            if let Some(last) = bands.last() {
                if upper_energy != 0.0 && upper_energy <= last.upper_energy {
                    return Err(PhotoError::ConfigError(format!(
                        "line {line_no}: band energies must increase, {upper_energy} follows {}",
                        last.upper_energy
                    )));
                }
            }
            bands.push(StoredBand { upper_energy, value });
        }

        match bands.last() {
            None => Err(PhotoError::ConfigError(
                "continuum mesh file holds no bands".to_string(),
            )),
            Some(last) if last.upper_energy != 0.0 => Err(PhotoError::ConfigError(format!(
                "last band energy must be 0, got {}",
                last.upper_energy
            ))),
            Some(_) => Ok(MeshConfig {
                version,
                low_energy: default_low_energy(),
                high_energy: default_high_energy(),
                resolution_scale: default_resolution_scale(),
                cell_capacity: default_cell_capacity(),
                bands,
            }),
        }
    }

    /// Resolution Δ(ln E) of a stored band, after version conversion and scaling.
    pub fn resolution_of(&self, band: &StoredBand) -> f64 {
        let base = match self.version {
            MeshFileVersion::Resolution => band.value,
            MeshFileVersion::ResolvingPower => 1.0 / band.value,
        };
        base * self.resolution_scale
    }
}

fn parse_numbers(line: &str, line_no: usize) -> PhotoResult<Vec<f64>> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .take_while(|tok| !tok.starts_with('#'))
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                PhotoError::ConfigError(format!("line {line_no}: cannot parse '{tok}' as a number"))
            })
        })
        .collect()
}

/// Snap-to-zero thresholds of the population solvers.
///
/// One instance is shared by the three- and five-level solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundoffTolerances {
    /// n2 numerator relative to its larger term below which n2 = 0
    #[serde(default = "default_alpha_snap")]
    pub alpha_snap: f64,
    /// Difference of two populations relative to its terms below which it is 0
    #[serde(default = "default_difference_snap")]
    pub difference_snap: f64,
    /// Net cooling relative to gross cooling below which all net terms are 0
    #[serde(default = "default_cooling_snap")]
    pub cooling_snap: f64,
    /// Negative population (relative to abundance) still clamped to 0
    #[serde(default = "default_negative_population_floor")]
    pub negative_population_floor: f64,
}

fn default_alpha_snap() -> f64 {
    1e-11
}
fn default_difference_snap() -> f64 {
    1e-9
}
fn default_cooling_snap() -> f64 {
    1e-10
}
fn default_negative_population_floor() -> f64 {
    1e-37
}

impl Default for RoundoffTolerances {
    fn default() -> Self {
        RoundoffTolerances {
            alpha_snap: default_alpha_snap(),
            difference_snap: default_difference_snap(),
            cooling_snap: default_cooling_snap(),
            negative_population_floor: default_negative_population_floor(),
        }
    }
}

impl RoundoffTolerances {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> PhotoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let tolerances: RoundoffTolerances = serde_json::from_str(&contents)?;
        Ok(tolerances)
    }
}
