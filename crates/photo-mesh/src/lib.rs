// ─────────────────────────────────────────────────────────────────────
// SCPN Photoionization Core — Photo Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Continuum energy mesh: band table, piecewise-logarithmic cells,
//! frequency index lookup and self-validation.

pub mod band;
pub mod fine;
pub mod index;
pub mod mesh;
pub mod registry;
pub mod validate;
