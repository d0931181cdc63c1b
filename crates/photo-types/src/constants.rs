// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Collision-rate prefactor: q = COLL_CONST · Ω / (g · √T) (cm³ s⁻¹ K^½).
pub const COLL_CONST: f64 = 8.629e-6;

/// Kelvin per wavenumber (hc/k, K cm).
pub const T1CM: f64 = 1.438_777_0;

/// Erg per wavenumber (hc, erg cm).
pub const ERG1CM: f64 = 1.986_445_82e-16;

/// One Rydberg in erg.
pub const EN1RYD: f64 = 2.179_872_361_1e-11;

/// One Rydberg in wavenumbers (cm⁻¹).
pub const RYD_WAVENUMBER: f64 = 109_737.315_685;

/// Boltzmann constant (erg/K)
pub const BOLTZMANN_ERG: f64 = 1.380_649e-16;

/// Atomic mass unit (g)
pub const AMU_GRAMS: f64 = 1.660_539_066_6e-24;

/// Speed of light (cm/s)
pub const SPEED_OF_LIGHT_CM: f64 = 2.997_924_58e10;

/// Plasma frequency in Ryd per √(cm⁻³): e/√(π mₑ) expressed in Rydberg.
pub const PLASMA_FREQUENCY_RYD: f64 = 2.7292e-12;

/// Electrons per hydrogen nucleus assumed by the plasma cutoff (fully ionized, solar He).
pub const ELECTRONS_PER_HYDROGEN: f64 = 1.2;

/// Default number of cells the coarse continuum mesh may hold.
pub const DEFAULT_CELL_CAPACITY: usize = 130_000;

/// Default low-energy limit of the continuum (Ryd).
pub const DEFAULT_LOW_ENERGY_RYD: f64 = 1.001e-8;

/// Default high-energy limit of the continuum (Ryd), ~100 MeV.
pub const DEFAULT_HIGH_ENERGY_RYD: f64 = 7.354e6;

/// Below this logarithmic step the cell width uses the linear form E·Δ.
pub const LINEAR_WIDTH_STEP: f64 = 0.01;

/// Relative tolerance on the lower bound of a band matching the previous upper bound.
pub const BAND_CONTINUITY_TOL: f64 = 1e-4;

/// Relative tolerance on E10 + E21 = E20 for a three-level atom.
pub const ENERGY_SUM_TOL: f64 = 1e-4;

/// Abundance below which a level system is treated as empty.
pub const NEGLIGIBLE_ABUNDANCE: f64 = 1e-30;

/// Largest Boltzmann exponent (E/kT) for which excited levels are evaluated.
pub const MAX_BOLTZMANN_EXPONENT: f64 = 60.0;

/// Temperature at which the fine mesh resolves thermal line widths (K).
pub const FINE_MESH_TEMPERATURE: f64 = 1.0e4;

/// Upper energy of the fine mesh (Ryd).
pub const FINE_MESH_HIGH_RYD: f64 = 1500.0;

/// Largest number of cells a fine mesh may hold.
pub const FINE_MESH_MAX_CELLS: usize = 5_000_000;
