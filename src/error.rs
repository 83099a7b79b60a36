use thiserror::Error;

/// Errors produced by the extraction stages and the shape file codec
#[derive(Debug, Error)]
pub enum ShapeError {
    /// Zero-sized, mismatched, or wrong-channel input buffers
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    /// The color sampler could not collect enough matching pixels
    #[error("color sampling found {found} of {wanted} matching pixels after {attempts} attempts")]
    SamplingExhausted {
        found: usize,
        wanted: usize,
        attempts: usize,
    },

    /// A shape file without the expected shapes/shape/points layout
    #[error("malformed shape file: {0}")]
    MalformedExportFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ShapeError>;
