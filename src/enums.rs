use std::fmt;
use std::str::FromStr;

use crate::error::VolumeError;

/// Where the reference image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A directory holding one DICOM series
    Dicom,
    /// A single volumetric file (NIfTI)
    VolumeFile,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Dicom => "dicom",
            SourceKind::VolumeFile => "volume_file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = VolumeError;

    /// Case-insensitive; `nii` and `nifti` are accepted for volume files
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dicom" => Ok(SourceKind::Dicom),
            "volume_file" | "nii" | "nifti" => Ok(SourceKind::VolumeFile),
            _ => Err(VolumeError::UnsupportedSourceKind(s.to_string())),
        }
    }
}

/// Slice ordering used when assembling a DICOM series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Position along the slice normal
    #[default]
    ImagePositionPatient,
    InstanceNumber,
    /// File name order
    None,
}
