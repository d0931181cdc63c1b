// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Property-Based Tests (proptest) for photo-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for photo-types using proptest.
//!
//! Covers: PlasmaConditions derived factors, band table text parsing,
//! configuration serialization roundtrip.

use photo_types::config::{MeshConfig, MeshFileVersion, RoundoffTolerances, StoredBand};
use photo_types::state::PlasmaConditions;
use proptest::prelude::*;

// ── PlasmaConditions Invariants ──────────────────────────────────────

proptest! {
    /// Derived temperature factors are mutually consistent.
    #[test]
    fn derived_factors_consistent(
        te in 10.0f64..1e8,
        ne in 0.0f64..1e12,
    ) {
        let c = PlasmaConditions::new(te, ne).unwrap();
        prop_assert!((c.tsq1 - c.teinv * c.teinv).abs() <= 1e-12 * c.tsq1);
        prop_assert!((2.0 * c.halfte - c.teinv).abs() <= 1e-15 * c.teinv);
        prop_assert!(c.cdsqte >= 0.0);
    }

    /// Boltzmann factor lies in (0, 1] and decreases with excitation energy.
    #[test]
    fn boltzmann_monotone(
        te in 100.0f64..1e6,
        e1 in 0.0f64..1e5,
        de in 1.0f64..1e5,
    ) {
        let c = PlasmaConditions::new(te, 1.0).unwrap();
        let b1 = c.boltzmann(e1);
        let b2 = c.boltzmann(e1 + de);
        prop_assert!(b1 > 0.0 && b1 <= 1.0);
        prop_assert!(b2 <= b1);
    }
}

// ── Band Table Parsing ───────────────────────────────────────────────

proptest! {
    /// Any increasing table written in the text format parses back unchanged.
    #[test]
    fn ini_text_roundtrip(
        steps in prop::collection::vec((1.5f64..10.0, 1.0f64..500.0), 1..12),
        last_value in 1.0f64..500.0,
    ) {
        let mut text = String::from("10 8 8\n# generated\n");
        let mut upper = 1e-3;
        let mut expected = Vec::new();
        for (factor, value) in &steps {
            upper *= factor;
            text.push_str(&format!("{upper:e} {value:e}\n"));
            expected.push(StoredBand { upper_energy: upper, value: *value });
        }
        text.push_str(&format!("0 {last_value:e}\n"));
        expected.push(StoredBand { upper_energy: 0.0, value: last_value });

        let cfg = MeshConfig::parse_ini(&text).unwrap();
        prop_assert_eq!(cfg.version, MeshFileVersion::ResolvingPower);
        prop_assert_eq!(cfg.bands, expected);
    }
}

// ── Config Serialization Roundtrip ───────────────────────────────────

#[test]
fn mesh_config_json_roundtrip() {
    let cfg = MeshConfig::parse_ini("1 9 29\n10 0.1\n0 0.2\n").unwrap();
    let json = serde_json::to_string(&cfg).unwrap();
    let back: MeshConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);
}

#[test]
fn tolerances_json_roundtrip() {
    let tol = RoundoffTolerances::default();
    let json = serde_json::to_string(&tol).unwrap();
    let back: RoundoffTolerances = serde_json::from_str(&json).unwrap();
    assert_eq!(tol, back);
}
