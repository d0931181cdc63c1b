use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Band {band} does not continue the previous band: expected lower bound {expected}, found {found}")]
    BandMismatch {
        band: usize,
        expected: f64,
        found: f64,
    },

    #[error("Energy mesh needs {required} cells but only {capacity} are available")]
    CapacityExceeded { required: usize, capacity: usize },

    #[error("Energy {energy} Ryd outside mesh range [{low}, {high}]")]
    EnergyOutOfRange { energy: f64, low: f64, high: f64 },

    #[error("Energy mesh has not been built")]
    MeshNotBuilt,

    #[error(
        "Mesh check failed in band {band} [{band_low}, {band_high}]: probe {probe} \
         mapped to cell {cell} bracketing [{cell_low}, {cell_high}]"
    )]
    MeshCheckFailed {
        band: usize,
        probe: f64,
        cell: usize,
        cell_low: f64,
        cell_high: f64,
        band_low: f64,
        band_high: f64,
    },

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PhotoResult<T> = Result<T, PhotoError>;
