// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Three-Level Atom
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-form statistical equilibrium of a three-level atom.
//!
//! Levels are 0 (ground), 1 and 2; the transitions are 1→0, 2→1 and 2→0.
//! At most one of them may be [`Transition::Absent`], in which case its
//! energy is the difference of the other two and it carries no radiation.
//!
//! Algorithm:
//! 1. Resolve statistical weights and the ion abundance from the lines.
//! 2. Hand off to the two-level solver when two lines lie below the plasma
//!    frequency.
//! 3. Eliminate n2, then n1, from the balance equations; n0 closes the sum.
//! 4. Split net collisional exchange into cooling and heating and share the
//!    totals among the lines by emitted intensity.

use log::trace;
use photo_types::config::RoundoffTolerances;
use photo_types::constants::{
    ENERGY_SUM_TOL, ERG1CM, MAX_BOLTZMANN_EXPONENT, NEGLIGIBLE_ABUNDANCE, RYD_WAVENUMBER, T1CM,
};
use photo_types::error::{PhotoError, PhotoResult};
use photo_types::state::PlasmaConditions;

use crate::level2::solve_two_level;
use crate::system::LevelSystem;
use crate::transition::{LineEmission, RadiativeLine, SolveStatus, Transition};

/// Relative agreement required between two weights or abundances given for
/// the same level.
const WEIGHT_MATCH_TOL: f64 = 1e-10;

/// Roundoff handling applied during a solve, reported in the order it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level3Event {
    /// n2 was lost in the difference of two nearly equal terms and set to 0.
    SecondLevelSnapped,
    /// The numerator of n1 was lost in roundoff and set to 0.
    FirstLevelSnapped,
    /// n1 came out slightly negative and was set to 0.
    NegativeFirstLevelClamped,
    /// Net 1→0 exchange lost in roundoff; all net heating and cooling zeroed.
    NetExchangeSnapped,
    /// No line emits, so no heating or cooling is assigned.
    NoEmission,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeLevelAtom {
    pub t10: Transition,
    pub t21: Transition,
    pub t20: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreeLevelSolution {
    pub system: LevelSystem<3>,
    /// Per-line results in the order 1→0, 2→1, 2→0.
    pub lines: [LineEmission; 3],
    pub cooling_derivative: f64,
    pub status: SolveStatus,
    pub events: Vec<Level3Event>,
}

impl ThreeLevelSolution {
    pub fn line10(&self) -> &LineEmission {
        &self.lines[0]
    }

    pub fn line21(&self) -> &LineEmission {
        &self.lines[1]
    }

    pub fn line20(&self) -> &LineEmission {
        &self.lines[2]
    }

    pub fn total_cooling(&self) -> f64 {
        self.lines.iter().map(|l| l.cool).sum()
    }

    pub fn total_heating(&self) -> f64 {
        self.lines.iter().map(|l| l.heat).sum()
    }

    pub fn total_intensity(&self) -> f64 {
        self.lines.iter().map(|l| l.intensity).sum()
    }
}

/// Which of the three lines a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pair {
    P10,
    P21,
    P20,
}

impl Pair {
    fn slot(self) -> usize {
        match self {
            Pair::P10 => 0,
            Pair::P21 => 1,
            Pair::P20 => 2,
        }
    }

    fn levels(self) -> (usize, usize) {
        match self {
            Pair::P10 => (0, 1),
            Pair::P21 => (1, 2),
            Pair::P20 => (0, 2),
        }
    }
}

fn same(a: f64, b: f64) -> bool {
    (a - b).abs() <= WEIGHT_MATCH_TOL * a.abs().max(b.abs())
}

/// Weight of a level given by two lines: the first positive wins, and two
/// positive values must agree.
fn resolve_weight(level: usize, first: f64, second: f64) -> PhotoResult<f64> {
    match (first > 0.0, second > 0.0) {
        (true, true) if !same(first, second) => Err(PhotoError::InvariantViolation(format!(
            "level {level} has conflicting statistical weights {first} and {second}"
        ))),
        (true, _) => Ok(first),
        (false, true) => Ok(second),
        (false, false) => Err(PhotoError::InvariantViolation(format!(
            "level {level} has no positive statistical weight ({first}, {second})"
        ))),
    }
}

impl ThreeLevelAtom {
    pub fn new(t10: Transition, t21: Transition, t20: Transition) -> Self {
        ThreeLevelAtom { t10, t21, t20 }
    }

    fn transition(&self, pair: Pair) -> &Transition {
        match pair {
            Pair::P10 => &self.t10,
            Pair::P21 => &self.t21,
            Pair::P20 => &self.t20,
        }
    }

    pub fn weights(&self) -> PhotoResult<[f64; 3]> {
        Ok([
            resolve_weight(0, self.t10.g_lo(), self.t20.g_lo())?,
            resolve_weight(1, self.t10.g_hi(), self.t21.g_lo())?,
            resolve_weight(2, self.t20.g_hi(), self.t21.g_hi())?,
        ])
    }

    /// Abundance of the first radiative line; every radiative line must agree.
    pub fn abundance(&self) -> PhotoResult<f64> {
        let mut real = [&self.t10, &self.t21, &self.t20]
            .into_iter()
            .filter_map(Transition::as_real);
        let first = real.next().ok_or_else(|| {
            PhotoError::InvariantViolation("three-level atom has no radiative line".into())
        })?;
        let abundance = first.abundance;
        if !abundance.is_finite() || abundance < 0.0 {
            return Err(PhotoError::ConfigError(format!(
                "ion abundance must be finite and >= 0, got {abundance}"
            )));
        }
        for line in real {
            if !same(line.abundance, abundance) {
                return Err(PhotoError::InvariantViolation(format!(
                    "lines of one ion carry abundances {abundance} and {}",
                    line.abundance
                )));
            }
        }
        Ok(abundance)
    }

    /// Transition energies 1→0, 2→1, 2→0 (cm⁻¹); an absent line's energy is
    /// derived from the other two.
    pub fn energies_wn(&self) -> PhotoResult<[f64; 3]> {
        use Transition::{Absent, Real};
        match (&self.t10, &self.t21, &self.t20) {
            (Real(a), Real(b), Real(c)) => Ok([a.energy_wn, b.energy_wn, c.energy_wn]),
            (Absent(_), Real(b), Real(c)) => Ok([c.energy_wn - b.energy_wn, b.energy_wn, c.energy_wn]),
            (Real(a), Absent(_), Real(c)) => Ok([a.energy_wn, c.energy_wn - a.energy_wn, c.energy_wn]),
            (Real(a), Real(b), Absent(_)) => Ok([a.energy_wn, b.energy_wn, a.energy_wn + b.energy_wn]),
            _ => Err(PhotoError::InvariantViolation(
                "at most one line of a three-level atom may be absent".into(),
            )),
        }
    }

    /// Boltzmann factors and excitation temperatures (K) of the pairs 0–1,
    /// 1–2 and 0–2. Factors of an absent line come from the other two.
    fn boltzmann(&self, energies_wn: &[f64; 3], conditions: &PlasmaConditions) -> ([f64; 3], [f64; 3]) {
        use Transition::{Absent, Real};
        let [k10, k21, k20] = energies_wn.map(|e| e * T1CM);
        let b = |k: f64| conditions.boltzmann(k);
        match (&self.t10, &self.t21, &self.t20) {
            (Absent(_), _, _) => {
                let (b12, b02) = (b(k21), b(k20));
                ([b02 / b12, b12, b02], [k20 - k21, k21, k20])
            }
            (_, Absent(_), _) => {
                let (b01, b02) = (b(k10), b(k20));
                ([b01, b02 / b01, b02], [k10, k20 - k10, k20])
            }
            (_, _, Absent(_)) => {
                let (b01, b12) = (b(k10), b(k21));
                ([b01, b12, b01 * b12], [k10, k21, k10 + k21])
            }
            (Real(_), Real(_), Real(_)) => {
                let (b01, b12) = (b(k10), b(k21));
                ([b01, b12, b01 * b12], [k10, k21, k20])
            }
        }
    }

    /// Two-level stand-in for `pair`, with the resolved weights and derived energy.
    fn two_level_line(&self, pair: Pair, g: &[f64; 3], energy_wn: f64, abundance: f64) -> RadiativeLine {
        let (lo, hi) = pair.levels();
        match self.transition(pair) {
            Transition::Real(line) => RadiativeLine {
                g_lo: g[lo],
                g_hi: g[hi],
                ..*line
            },
            Transition::Absent(dummy) => RadiativeLine {
                energy_wn,
                einstein_a: 0.0,
                escape: 1.0,
                electron_escape: 0.0,
                destruction: 0.0,
                pump: 0.0,
                collision_strength: dummy.collision_strength,
                g_lo: g[lo],
                g_hi: g[hi],
                abundance,
            },
        }
    }

    fn reduce_to_two_level(
        &self,
        pair: Pair,
        g: [f64; 3],
        energies_wn: [f64; 3],
        abundance: f64,
        conditions: &PlasmaConditions,
    ) -> PhotoResult<ThreeLevelSolution> {
        trace!("three-level atom reduced to its {pair:?} line below the plasma frequency");
        let line = self.two_level_line(pair, &g, energies_wn[pair.slot()], abundance);
        let two = solve_two_level(&line, conditions)?;
        let (lo, hi) = pair.levels();
        let mut system = LevelSystem::new(g, [0.0, energies_wn[0], energies_wn[2]]);
        system.populations[lo] = two.system.populations[0];
        system.populations[hi] = two.system.populations[1];
        let mut lines = [LineEmission::default(); 3];
        lines[pair.slot()] = two.line;
        Ok(ThreeLevelSolution {
            system,
            lines,
            cooling_derivative: two.cooling_derivative,
            status: SolveStatus::ReducedToTwoLevel,
            events: Vec::new(),
        })
    }

    pub fn solve(
        &self,
        conditions: &PlasmaConditions,
        tolerances: &RoundoffTolerances,
    ) -> PhotoResult<ThreeLevelSolution> {
        let g = self.weights()?;
        let abundance = self.abundance()?;
        let energies_wn = self.energies_wn()?;
        let [e10, e21, e20] = energies_wn;

        // ── Plasma cutoff ─────────────────────────────────────────────
        let below = energies_wn.map(|e| e / RYD_WAVENUMBER < conditions.plasma_frequency);
        match below {
            [true, _, true] => {
                return self.reduce_to_two_level(Pair::P21, g, energies_wn, abundance, conditions)
            }
            [true, true, false] => {
                return self.reduce_to_two_level(Pair::P20, g, energies_wn, abundance, conditions)
            }
            [false, true, true] => {
                return self.reduce_to_two_level(Pair::P10, g, energies_wn, abundance, conditions)
            }
            _ => {}
        }

        let mut system = LevelSystem::new(g, [0.0, e10, e20]);

        // ── Negligible excitation ─────────────────────────────────────
        if abundance <= NEGLIGIBLE_ABUNDANCE
            || e20 * T1CM * conditions.teinv > MAX_BOLTZMANN_EXPONENT
        {
            trace!("three-level atom unexcited, abundance {abundance}");
            system.populations = [abundance, 0.0, 0.0];
            let ground = LineEmission {
                pop_lo: abundance,
                pop_opacity: abundance,
                ..LineEmission::default()
            };
            return Ok(ThreeLevelSolution {
                system,
                lines: [ground, LineEmission::default(), ground],
                cooling_derivative: 0.0,
                status: SolveStatus::Degenerate,
                events: Vec::new(),
            });
        }

        // ── Sanity ────────────────────────────────────────────────────
        if !(e10 > 0.0 && e21 > 0.0 && e20 > 0.0 && e10 < e20 && e21 < e20) {
            return Err(PhotoError::InvariantViolation(format!(
                "three-level energies out of order: E10={e10}, E21={e21}, E20={e20} cm^-1"
            )));
        }
        if ((e10 + e21) / e20 - 1.0).abs() >= ENERGY_SUM_TOL {
            return Err(PhotoError::InvariantViolation(format!(
                "E10 + E21 = {} cm^-1 does not match E20 = {e20} cm^-1",
                e10 + e21
            )));
        }
        let [o10, o21, o20] = [&self.t10, &self.t21, &self.t20].map(Transition::collision_strength);
        if !(o10 > 0.0 && o21 > 0.0 && o20 > 0.0) {
            return Err(PhotoError::InvariantViolation(format!(
                "collision strengths must be > 0, got {o10}, {o21}, {o20}"
            )));
        }

        let ([bolt01, bolt12, bolt02], [temp01, _, temp02]) = self.boltzmann(&energies_wn, conditions);
        let [g0, g1, g2] = g;
        let [ener10, ener21, ener20] = energies_wn.map(|e| e * ERG1CM);

        // ── Rates (s⁻¹) ───────────────────────────────────────────────
        let cdsqte = conditions.cdsqte;
        let a10 = self.t10.effective_decay();
        let a21 = self.t21.effective_decay();
        let a20 = self.t20.effective_decay();
        let pump01 = self.t10.pump();
        let pump10 = pump01 * g0 / g1;
        let pump12 = self.t21.pump();
        let pump21 = pump12 * g1 / g2;
        let pump02 = self.t20.pump();
        let pump20 = pump02 * g0 / g2;

        let c01 = o10 * bolt01 * cdsqte / g0;
        let r01 = c01 + pump01;
        let c10 = o10 * cdsqte / g1;
        let r10 = c10 + a10 + pump10;
        let c20 = o20 * cdsqte / g2;
        let r20 = c20 + a20 + pump20;
        let c02 = o20 * bolt02 * cdsqte / g0;
        let r02 = c02 + pump02;
        let c12 = o21 * bolt12 * cdsqte / g1;
        let r12 = c12 + pump12;
        let c21 = o21 * cdsqte / g2;
        let r21 = c21 + a21 + pump21;

        // ── Populations ───────────────────────────────────────────────
        let mut events = Vec::new();
        let n = abundance;
        let alpha1 = n * (r01 + r02) / (r10 + r01 + r02);
        let alpha2 = n * r01 / (r10 + r12 + r01);
        let mut alpha = alpha1 - alpha2;
        let beta = (r21 - r01) / (r10 + r12 + r01) + (r20 + r01 + r02) / (r10 + r01 + r02);
        let p2 = if !(alpha / alpha1.max(alpha2) >= tolerances.alpha_snap) {
            alpha = 0.0;
            events.push(Level3Event::SecondLevelSnapped);
            0.0
        } else {
            alpha / beta
        };
        if alpha < 0.0 || beta < 0.0 {
            return Err(PhotoError::InvariantViolation(format!(
                "level 2 population diverged: alpha={alpha:e}, beta={beta:e}, T={}",
                conditions.temperature
            )));
        }

        let feed = n * (r01 + r02);
        let drain = p2 * (r20 + r01 + r02);
        let mut numerator = feed - drain;
        if !(numerator.abs() / feed.max(drain) >= tolerances.difference_snap) {
            numerator = 0.0;
            events.push(Level3Event::FirstLevelSnapped);
        }
        let mut p1 = numerator / (r10 + r01 + r02);
        if p1 < 0.0 {
            if p1 > -tolerances.negative_population_floor * n {
                p1 = 0.0;
                events.push(Level3Event::NegativeFirstLevelClamped);
            } else {
                return Err(PhotoError::InvariantViolation(format!(
                    "level 1 population {p1:e} is negative at n_e={}, T={}",
                    conditions.electron_density, conditions.temperature
                )));
            }
        }
        let p0 = n - p1 - p2;
        if !(p0 > 0.0) {
            return Err(PhotoError::InvariantViolation(format!(
                "ground population {p0:e} is not positive (n1={p1:e}, n2={p2:e}, N={n:e})"
            )));
        }
        system.populations = [p0, p1, p2];

        // ── Emission ──────────────────────────────────────────────────
        let fraction = |c: f64, r: f64| if r > 0.0 { c / r } else { 0.0 };
        let emission = |t: &Transition, lo: f64, hi: f64, g_lo: f64, g_hi: f64, energy: f64, f: f64| {
            let photons = t.escaping_decay() * hi;
            LineEmission {
                pop_lo: lo,
                pop_hi: hi,
                pop_opacity: lo - hi * g_lo / g_hi,
                photons,
                intensity: photons * energy,
                collision_fraction: f,
                heat: 0.0,
                cool: 0.0,
            }
        };
        let mut lines = [
            emission(&self.t10, p0, p1, g0, g1, ener10, fraction(c01, r01)),
            emission(&self.t21, p1, p2, g1, g2, ener21, fraction(c12, r12)),
            emission(&self.t20, p0, p2, g0, g2, ener20, fraction(c02, r02)),
        ];
        let total_intensity: f64 = lines.iter().map(|l| l.intensity).sum();

        // ── Heating and cooling ───────────────────────────────────────
        let heat20 = p2 * c20 * ener20;
        let cool02 = p0 * c02 * ener20;
        let heat21 = p2 * c21 * ener21;
        let cool12 = p1 * c12 * ener21;
        let heat10 = p1 * c10 * ener10;
        let cool01 = p0 * c01 * ener10;

        let net = |cool: f64, heat: f64, f: f64| (cool - heat * f, heat * (1.0 - f));
        let mut exchange = [
            net(cool01, heat10, lines[0].collision_fraction),
            net(cool12, heat21, lines[1].collision_fraction),
            net(cool02, heat20, lines[2].collision_fraction),
        ];
        if (exchange[0].0 / f64::MIN_POSITIVE.max(cool01)).abs() < tolerances.cooling_snap {
            exchange = [(0.0, 0.0); 3];
            events.push(Level3Event::NetExchangeSnapped);
        }
        let total_cool: f64 = exchange.iter().map(|x| x.0).sum();
        let total_heat: f64 = exchange.iter().map(|x| x.1).sum();

        if total_intensity > 0.0 {
            for line in lines.iter_mut() {
                let share = line.intensity / total_intensity;
                line.cool = total_cool * share;
                line.heat = total_heat * share;
            }
        } else {
            events.push(Level3Event::NoEmission);
        }

        // 1–2 excitation shares the 0–2 exponential
        let cooling_derivative = lines[0].cool * conditions.cooling_slope(temp01)
            + (lines[2].cool + lines[1].cool) * conditions.cooling_slope(temp02);

        if !events.is_empty() {
            trace!("three-level solve at T={} finished with {events:?}", conditions.temperature);
        }
        Ok(ThreeLevelSolution {
            system,
            lines,
            cooling_derivative,
            status: SolveStatus::Solved,
            events,
        })
    }
}
