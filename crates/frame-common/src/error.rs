//! Error types for forecast map rendering.

use thiserror::Error;

/// Result type alias using PlotError.
pub type PlotResult<T> = Result<T, PlotError>;

/// Primary error type for the rendering pipeline.
///
/// `Config` errors are raised before any worker starts. `Render` and `Export`
/// errors abort the chunk they occur in and nothing else.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Export to '{path}' failed: {message}")]
    Export { path: String, message: String },
}

impl PlotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn export(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short machine-friendly kind, used in logs and chunk reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PlotError::Config(_) => "config",
            PlotError::Render(_) => "render",
            PlotError::Export { .. } => "export",
        }
    }

    /// Whether the error aborts the whole run rather than a single chunk.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, PlotError::Config(_))
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(err: serde_json::Error) -> Self {
        PlotError::Config(format!("JSON error: {}", err))
    }
}
