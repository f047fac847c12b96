use crate::{
    aggregator::{Aggregator, VolumeReport},
    enums::{SortBy, SourceKind},
    error::Result,
    resampler::Resampler,
    volume::{Label, Volume},
    volume_loader::VolumeLoader,
};

use log::info;
use std::path::Path;

/// Measures label volumes of a mask against a reference image
///
/// Implementations only differ in how the reference is loaded; they hold no
/// state between computations and may be shared across threads.
pub trait Volumer: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Load the reference image whose grid and spacing the mask is measured on
    fn load_reference(&self, source: &Path) -> Result<Volume>;

    /// Load the reference and the mask, align the mask to the reference grid
    /// and compute the volume of each label
    ///
    /// # Errors
    ///
    /// Propagates loading errors, `GeometryMismatch` from alignment and
    /// `EmptyLabelSet` from aggregation
    fn compute(
        &self,
        reference_source: &Path,
        mask_path: &Path,
        label_values: Option<&[Label]>,
    ) -> Result<VolumeReport> {
        info!(
            "Computing {} volumes of {} over {}",
            self.kind(),
            mask_path.display(),
            reference_source.display()
        );
        let reference = self.load_reference(reference_source)?;
        let mask = VolumeLoader::load_single_volume(mask_path)?.to_labels();
        let aligned = Resampler::align(&mask, &reference)?;
        Aggregator::aggregate(reference.geometry(), &aligned, label_values)
    }
}

/// Reference is a directory holding a DICOM series
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomVolumer {
    pub sort_by: SortBy,
}

impl Volumer for DicomVolumer {
    fn kind(&self) -> SourceKind {
        SourceKind::Dicom
    }

    fn load_reference(&self, source: &Path) -> Result<Volume> {
        VolumeLoader::load_dicom_series_with(source, self.sort_by)
    }
}

/// Reference is a single volumetric file
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeFileVolumer;

impl Volumer for VolumeFileVolumer {
    fn kind(&self) -> SourceKind {
        SourceKind::VolumeFile
    }

    fn load_reference(&self, source: &Path) -> Result<Volume> {
        VolumeLoader::load_single_volume(source)
    }
}

/// Select the volumer for a source kind name, case-insensitive
///
/// # Errors
///
/// Returns `UnsupportedSourceKind` for an unknown kind, before any file is touched
pub fn create(kind: &str) -> Result<Box<dyn Volumer>> {
    Ok(create_for(kind.parse()?))
}

pub fn create_for(kind: SourceKind) -> Box<dyn Volumer> {
    match kind {
        SourceKind::Dicom => Box::new(DicomVolumer::default()),
        SourceKind::VolumeFile => Box::new(VolumeFileVolumer),
    }
}
