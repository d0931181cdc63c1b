//! Mathematical primitives for SCPN Photoionization Core.

pub mod linalg;
