// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Two-Level Atom
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Two-level atom with collisional and radiative coupling.
//!
//! Balance of the upper level:
//!   n_lo (c12 + pump) = n_hi (A' + c21 + pump·g_lo/g_hi)
//! with A' the decay rate including escape, electron scattering and destruction.

use log::trace;
use photo_types::constants::NEGLIGIBLE_ABUNDANCE;
use photo_types::error::{PhotoError, PhotoResult};
use photo_types::state::PlasmaConditions;

use crate::system::LevelSystem;
use crate::transition::{LineEmission, RadiativeLine, SolveStatus};

/// Below this ratio of upward to downward rates the upper level is empty.
const NEGLIGIBLE_EXCITATION: f64 = 1e-25;

/// Departure coefficients are only formed above this population and Boltzmann factor.
const DEPARTURE_FLOOR: f64 = 1e-20;

#[derive(Debug, Clone, PartialEq)]
pub struct TwoLevelSolution {
    pub system: LevelSystem<2>,
    pub line: LineEmission,
    /// Departure coefficient of the upper level; the ground level is 1.
    pub departure: f64,
    pub cooling_derivative: f64,
    pub status: SolveStatus,
}

impl TwoLevelSolution {
    fn degenerate(line: &RadiativeLine) -> Self {
        let mut system = LevelSystem::new([line.g_lo, line.g_hi], [0.0, line.energy_wn]);
        system.populations = [line.abundance, 0.0];
        TwoLevelSolution {
            system,
            line: LineEmission {
                pop_lo: line.abundance,
                pop_opacity: line.abundance,
                ..LineEmission::default()
            },
            departure: 0.0,
            cooling_derivative: 0.0,
            status: SolveStatus::Degenerate,
        }
    }
}

/// Populations, emission and thermal exchange of a single line.
pub fn solve_two_level(
    line: &RadiativeLine,
    conditions: &PlasmaConditions,
) -> PhotoResult<TwoLevelSolution> {
    let abundance = line.abundance;
    if !abundance.is_finite() || abundance < 0.0 {
        return Err(PhotoError::ConfigError(format!(
            "ion abundance must be finite and >= 0, got {abundance}"
        )));
    }

    let excitation_k = line.energy_kelvin();
    let boltz = conditions.boltzmann(excitation_k);
    let cdsqte = conditions.cdsqte;
    let rough = (boltz * cdsqte + line.pump) / (cdsqte + line.einstein_a);
    if line.collision_strength * abundance < NEGLIGIBLE_ABUNDANCE
        || !(rough >= NEGLIGIBLE_EXCITATION)
    {
        trace!("two-level line at {} cm^-1 is unexcited", line.energy_wn);
        return Ok(TwoLevelSolution::degenerate(line));
    }

    if !(line.energy_wn > 0.0) {
        return Err(PhotoError::InvariantViolation(format!(
            "two-level line energy must be > 0, got {} cm^-1",
            line.energy_wn
        )));
    }
    let (g1, g2) = (line.g_lo, line.g_hi);
    if !(g1 > 0.0 && g2 > 0.0) {
        return Err(PhotoError::InvariantViolation(format!(
            "two-level statistical weights must be > 0, got {g1} and {g2}"
        )));
    }

    let a21 = line.effective_decay();
    let col21 = cdsqte * line.collision_strength / g2;
    let col12 = cdsqte * line.collision_strength / g1 * boltz;
    let rate12 = col12 + line.pump;
    if !(rate12 > 0.0) {
        return Ok(TwoLevelSolution::degenerate(line));
    }
    let ri21 = line.pump * g1 / g2;
    let r = (a21 + col21 + ri21) / rate12;
    let pop_hi = abundance / (r + 1.0);
    let pop_lo = pop_hi * r;

    let departure = if boltz > DEPARTURE_FLOOR && pop_hi > DEPARTURE_FLOOR {
        (pop_hi / pop_lo) / (boltz * g2 / g1)
    } else {
        0.0
    };

    let energy = line.energy_erg();
    let photons = line.escaping_decay() * pop_hi;
    let denom = a21 + col21 + ri21 + rate12;
    let cool = energy * abundance * col12 * (a21 + ri21) / denom;
    let heat = energy * abundance * col21 * line.pump / denom;

    let mut system = LevelSystem::new([g1, g2], [0.0, line.energy_wn]);
    system.populations = [pop_lo, pop_hi];

    Ok(TwoLevelSolution {
        system,
        line: LineEmission {
            pop_lo,
            pop_hi,
            pop_opacity: pop_lo - pop_hi * g1 / g2,
            photons,
            intensity: photons * energy,
            collision_fraction: col12 / rate12,
            heat,
            cool,
        },
        departure,
        cooling_derivative: cool * conditions.cooling_slope(excitation_k),
        status: SolveStatus::Solved,
    })
}
