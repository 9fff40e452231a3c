//! Error types for rendering.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("palette has no colors")]
    EmptyPalette,

    #[error("invalid palette color: {0:?}")]
    InvalidColor(String),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    PixelBufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("image {width}x{height} exceeds PNG dimension limits")]
    ImageTooLarge { width: usize, height: usize },

    #[error("PNG compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("failed to read palette file {path}: {source}")]
    PaletteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid palette JSON: {0}")]
    PaletteJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
