//! Error taxonomy for the visualization engine
//!
//! Only structural problems are errors. An empty activation payload and an
//! unknown palette name are handled by policy (synthetic data, rainbow) and
//! never show up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Missing geometry: vertices and faces must both be non-empty")]
    MissingGeometry,

    #[error("Invalid topology: face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidTopology {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Invalid activation data: {0}")]
    InvalidActivation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    /// Faults the viewer absorbs at load time instead of propagating.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ViewerError::MissingGeometry
                | ViewerError::InvalidTopology { .. }
                | ViewerError::InvalidActivation(_)
        )
    }
}
