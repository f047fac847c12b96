use std::path::PathBuf;

use thiserror::Error;

/// Result type for volume computations
pub type Result<T> = std::result::Result<T, VolumeError>;

#[derive(Debug, Error)]
pub enum VolumeError {
    /// A DICOM directory or mask file is missing, or holds no readable series
    #[error("{detail}: {}", path.display())]
    NotFound { path: PathBuf, detail: String },

    #[error("Unsupported source kind: {0:?}")]
    UnsupportedSourceKind(String),

    /// The aligned mask has no non-zero voxel, or no label was left to measure
    #[error("Mask contains no non-zero labels")]
    EmptyLabelSet,

    /// No voxel of the reference grid falls inside the mask
    #[error("Mask does not overlap the reference image")]
    GeometryMismatch,

    #[error("Inconsistent image dimensions: {0}")]
    InconsistentDimensions(String),

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl VolumeError {
    pub(crate) fn not_found(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        VolumeError::NotFound {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Stable name of the error kind, for transport layers mapping errors to
    /// user-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            VolumeError::NotFound { .. } => "not_found",
            VolumeError::UnsupportedSourceKind(_) => "unsupported_source_kind",
            VolumeError::EmptyLabelSet => "empty_label_set",
            VolumeError::GeometryMismatch => "geometry_mismatch",
            VolumeError::InconsistentDimensions(_)
            | VolumeError::MissingSpacing
            | VolumeError::InvalidGeometry(_) => "invalid_image",
            VolumeError::Io(_) | VolumeError::Walk(_) => "io",
            VolumeError::Dicom(_) | VolumeError::PixelData(_) => "dicom",
            VolumeError::Nifti(_) => "nifti",
            VolumeError::Shape(_) => "invalid_image",
        }
    }
}
