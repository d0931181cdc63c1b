// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Transitions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radiative and collisional transitions between two levels, and the
//! per-line quantities a population solve produces.

use photo_types::constants::{ERG1CM, RYD_WAVENUMBER, T1CM};
use serde::{Deserialize, Serialize};

/// A transition with radiative decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiativeLine {
    /// Transition energy (cm⁻¹).
    pub energy_wn: f64,
    /// Spontaneous decay rate (s⁻¹).
    pub einstein_a: f64,
    /// Photon escape probability.
    #[serde(default = "default_escape")]
    pub escape: f64,
    /// Escape probability by electron scattering.
    #[serde(default)]
    pub electron_escape: f64,
    /// Photon destruction probability.
    #[serde(default)]
    pub destruction: f64,
    /// Radiative excitation rate lower → upper (s⁻¹).
    #[serde(default)]
    pub pump: f64,
    pub collision_strength: f64,
    /// Statistical weight of the lower level, 0 when not supplied.
    #[serde(default)]
    pub g_lo: f64,
    /// Statistical weight of the upper level, 0 when not supplied.
    #[serde(default)]
    pub g_hi: f64,
    /// Density of the parent ion (cm⁻³).
    pub abundance: f64,
}

fn default_escape() -> f64 {
    1.0
}

impl RadiativeLine {
    /// Optically thin line with no pumping.
    pub fn thin(
        energy_wn: f64,
        einstein_a: f64,
        collision_strength: f64,
        g_lo: f64,
        g_hi: f64,
        abundance: f64,
    ) -> Self {
        RadiativeLine {
            energy_wn,
            einstein_a,
            escape: 1.0,
            electron_escape: 0.0,
            destruction: 0.0,
            pump: 0.0,
            collision_strength,
            g_lo,
            g_hi,
            abundance,
        }
    }

    pub fn energy_kelvin(&self) -> f64 {
        self.energy_wn * T1CM
    }

    pub fn energy_erg(&self) -> f64 {
        self.energy_wn * ERG1CM
    }

    pub fn energy_ryd(&self) -> f64 {
        self.energy_wn / RYD_WAVENUMBER
    }

    /// Decay rate out of the upper level, counting escaping and destroyed photons.
    pub fn effective_decay(&self) -> f64 {
        self.einstein_a * (self.escape + self.electron_escape + self.destruction)
    }

    /// Rate at which photons leave the cloud, per upper-level ion.
    pub fn escaping_decay(&self) -> f64 {
        self.einstein_a * (self.escape + self.electron_escape)
    }
}

/// A collisional coupling with no radiative decay. Its energy follows from
/// the other two lines of the system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DummyLine {
    pub collision_strength: f64,
    #[serde(default)]
    pub g_lo: f64,
    #[serde(default)]
    pub g_hi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Real(RadiativeLine),
    Absent(DummyLine),
}

impl Transition {
    pub fn as_real(&self) -> Option<&RadiativeLine> {
        match self {
            Transition::Real(line) => Some(line),
            Transition::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Transition::Absent(_))
    }

    pub fn collision_strength(&self) -> f64 {
        match self {
            Transition::Real(line) => line.collision_strength,
            Transition::Absent(dummy) => dummy.collision_strength,
        }
    }

    pub fn g_lo(&self) -> f64 {
        match self {
            Transition::Real(line) => line.g_lo,
            Transition::Absent(dummy) => dummy.g_lo,
        }
    }

    pub fn g_hi(&self) -> f64 {
        match self {
            Transition::Real(line) => line.g_hi,
            Transition::Absent(dummy) => dummy.g_hi,
        }
    }

    pub fn einstein_a(&self) -> f64 {
        self.as_real().map_or(0.0, |l| l.einstein_a)
    }

    pub fn pump(&self) -> f64 {
        self.as_real().map_or(0.0, |l| l.pump)
    }

    pub fn effective_decay(&self) -> f64 {
        self.as_real().map_or(0.0, RadiativeLine::effective_decay)
    }

    pub fn escaping_decay(&self) -> f64 {
        self.as_real().map_or(0.0, RadiativeLine::escaping_decay)
    }
}

/// Per-line results of a population solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineEmission {
    pub pop_lo: f64,
    pub pop_hi: f64,
    /// Population difference corrected for stimulated emission, n_lo − n_hi·g_lo/g_hi.
    pub pop_opacity: f64,
    /// Escaping photons (cm⁻³ s⁻¹).
    pub photons: f64,
    /// Emitted energy (erg cm⁻³ s⁻¹).
    pub intensity: f64,
    /// Fraction of upward transitions that are collisional.
    pub collision_fraction: f64,
    pub heat: f64,
    pub cool: f64,
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Negligible abundance or excitation: everything in the ground level.
    Degenerate,
    /// Two of three lines lie below the plasma frequency; solved as a 2-level atom.
    ReducedToTwoLevel,
    Solved,
}
