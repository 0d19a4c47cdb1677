use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while building or rendering a scene.
#[derive(Debug, Error)]
pub enum TracerError {
    /// A transform was assigned that has no inverse.
    #[error("transform matrix is not invertible")]
    SingularMatrix,

    /// The per-worker intersection list could not grow.
    #[error("failed to allocate intersection scratch space: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("cannot add a child to a non-group shape")]
    NotAGroup,

    /// Camera motion requested without a stored eye/target/up triple.
    #[error("camera has no stored view orientation; call `look_at` first")]
    MissingOrientation,

    #[error("render worker panicked")]
    WorkerPanicked,

    #[error("could not start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scene: {0}")]
    Scene(String),

    #[error("OBJ parse error at line {line}: {message}")]
    Obj { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, TracerError>;
