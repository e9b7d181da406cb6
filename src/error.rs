use thiserror::Error;

/// Failure reported by a `RenderDevice`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("device rejected draw: {0}")]
    Rejected(String),

    /// The C draw callback returned a nonzero status.
    #[error("draw callback failed with status {0}")]
    Callback(i32),
}

/// Failure of a surface transition.
///
/// An invalid (reclaimed) entry is not an error: the surface degrades to
/// empty content and logs a diagnostic instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}
