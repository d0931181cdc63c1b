//! Level populations without radiative transfer, for atoms whose lines are
//! optically thin and whose heating and cooling are booked elsewhere.

use photo_types::error::{PhotoError, PhotoResult};
use photo_types::state::PlasmaConditions;
use serde::{Deserialize, Serialize};

/// Excitation exponent above which a 2-level upper level is empty.
const POP2_MAX_EXPONENT: f64 = 15.0;

/// Excitation exponent above which a 3-level atom is empty unless excited
/// by other processes.
const POP3_MAX_EXPONENT: f64 = 20.0;

/// Extra excitation rates below this are ignored by the cutoff test.
const NEGLIGIBLE_RATE: f64 = f32::MIN_POSITIVE as f64;

/// Upper-level population times `a21` of a two-level atom (cm⁻³ s⁻¹),
/// normalised to `n1 + n2 = abundance`.
pub fn pop2(
    omega: f64,
    g1: f64,
    g2: f64,
    a21: f64,
    excitation_k: f64,
    abundance: f64,
    conditions: &PlasmaConditions,
) -> PhotoResult<f64> {
    let exponent = excitation_k * conditions.teinv;
    if abundance == 0.0 || exponent > POP2_MAX_EXPONENT {
        return Ok(0.0);
    }
    if !(omega > 0.0 && g1 > 0.0 && g2 > 0.0) {
        return Err(PhotoError::InvariantViolation(format!(
            "pop2 needs positive collision strength and weights, got omega={omega}, g={g1}/{g2}"
        )));
    }
    let q21 = conditions.cdsqte * omega / g2;
    let q12 = conditions.cdsqte * omega / g1 * (-exponent).exp();
    if q12 == 0.0 {
        return Ok(0.0);
    }
    let r = (a21 + q21) / q12;
    Ok(abundance * a21 / (r + 1.0))
}

/// A three-level atom with all collisional and radiative couplings.
/// Levels are numbered 1..3 from the ground up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleThreeLevel {
    pub g: [f64; 3],
    pub omega12: f64,
    pub omega13: f64,
    pub omega23: f64,
    pub a21: f64,
    pub a31: f64,
    pub a32: f64,
    /// Excitation temperatures 1→2 and 2→3 (K).
    pub tex12: f64,
    pub tex23: f64,
    pub abundance: f64,
    /// Photodestruction rate of level 2 (s⁻¹).
    #[serde(default)]
    pub photodestruction: f64,
    /// Excitation rates 1→2 and 1→3 by other processes (s⁻¹). They feed the
    /// levels but are not part of the collisional energy exchange.
    #[serde(default)]
    pub extra12: f64,
    #[serde(default)]
    pub extra13: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThreeLevelPops {
    pub n2: f64,
    pub n3: f64,
}

impl SimpleThreeLevel {
    fn validate(&self) -> PhotoResult<()> {
        let weights_ok = self.g.iter().all(|&g| g > 0.0);
        let rates_ok = [
            self.omega12,
            self.omega13,
            self.omega23,
            self.a21,
            self.a31,
            self.a32,
            self.tex12,
            self.tex23,
        ]
        .iter()
        .all(|&v| v >= 0.0);
        if weights_ok && rates_ok {
            Ok(())
        } else {
            Err(PhotoError::InvariantViolation(format!(
                "pop3 inputs must be non-negative with positive weights: {self:?}"
            )))
        }
    }
}

/// Populations of levels 2 and 3 (cm⁻³), normalised to `n1 + n2 + n3 = abundance`.
pub fn pop3(atom: &SimpleThreeLevel, conditions: &PlasmaConditions) -> PhotoResult<ThreeLevelPops> {
    let ex = atom.tex12 * conditions.teinv;
    if atom.abundance <= 0.0 || (ex > POP3_MAX_EXPONENT && atom.extra12 < NEGLIGIBLE_RATE) {
        return Ok(ThreeLevelPops::default());
    }
    atom.validate()?;

    let b12 = (-ex).exp();
    let b23 = conditions.boltzmann(atom.tex23);
    let b13 = b12 * b23;
    if b13 == 0.0 && atom.extra12 < NEGLIGIBLE_RATE {
        return Ok(ThreeLevelPops::default());
    }

    let [g1, g2, g3] = atom.g;
    let cdsqte = conditions.cdsqte;
    let c12 = cdsqte * atom.omega12 / g1 * b12 + atom.extra12;
    let c13 = cdsqte * atom.omega13 / g1 * b13 + atom.extra13;
    let c23 = cdsqte * atom.omega23 / g2 * b23;
    let c32 = cdsqte * atom.omega23 / g3;
    let c31 = cdsqte * atom.omega13 / g3;
    let c21 = cdsqte * atom.omega12 / g2;

    let alf = atom.a21 + c21 + c23 + atom.photodestruction;
    let bet = atom.a31 + atom.a32 + c31 + c32;
    let feed32 = c32 + atom.a32;

    // populations relative to n1 = 1
    let n2 = (c13 / bet + c12 / feed32) / (alf / feed32 - c23 / bet);
    let n3 = (c13 + n2 * c23) / bet;
    if !(n2.is_finite() && n3.is_finite() && n2 >= 0.0 && n3 >= 0.0) {
        return Err(PhotoError::InvariantViolation(format!(
            "pop3 produced invalid relative populations n2={n2:e}, n3={n3:e}"
        )));
    }
    let norm = atom.abundance / (1.0 + n2 + n3);
    Ok(ThreeLevelPops {
        n2: n2 * norm,
        n3: n3 * norm,
    })
}
