//! # ROI-volume library
//!
//! This crate measures the physical volume of labelled regions of interest
//! (ROI) inside a 3D medical image.
//!
//! A reference image, either a directory holding one DICOM series or a single
//! NIfTI file, defines the voxel grid and spacing. The ROI mask is a NIfTI
//! file of integer labels. When the mask does not share the reference grid it
//! is resampled onto it with nearest-neighbour interpolation, so that label
//! values are never blended. Every non-zero label is then counted and its
//! voxel count converted to mm³, cm³ and mL using the reference spacing.
//!
//! Each computation loads its inputs fresh and keeps nothing afterwards, so a
//! [`Volumer`] can be reused and shared freely. DICOM series are assumed to
//! have the following attributes:
//!   - One series per directory (the largest is used when several are found)
//!   - No multiframe (always the first frame is used)
//!   - A shared ImageOrientationPatient across slices
//!
//! # Examples
//!
//! ## Measuring a mask against a DICOM series
//!
//! ```no_run
//! # use std::path::Path;
//! let volumer = roi_volume::volumer::create("dicom")
//!     .expect("dicom should be a supported source kind");
//! let report = volumer
//!     .compute(Path::new("patient/ct"), Path::new("patient/roi.nii.gz"), None)
//!     .expect("should have measured the mask");
//! for (label, volume) in &report {
//!     println!("label {}: {:.2} mL", label, volume.volume_ml);
//! }
//! ```
//!
//! ## Running the pipeline step by step
//!
//! ```no_run
//! # use roi_volume::{Aggregator, Resampler, VolumeLoader};
//! let reference = VolumeLoader::load_dicom_series("patient/ct")
//!     .expect("should have loaded the series");
//! let mask = VolumeLoader::load_single_volume("patient/roi.nii.gz")
//!     .expect("should have loaded the mask")
//!     .to_labels();
//! let aligned = Resampler::align(&mask, &reference).expect("mask should overlap the series");
//! let report = Aggregator::aggregate(reference.geometry(), &aligned, Some(&[1, 2][..]))
//!     .expect("mask should hold labels");
//! ```

pub mod aggregator;
pub mod cli;
pub mod enums;
pub mod error;
pub mod report;
pub mod resampler;
pub mod traverse;
pub mod volume;
pub mod volume_loader;
pub mod volumer;

pub use aggregator::{Aggregator, LabelVolume, VolumeReport};
pub use enums::{SortBy, SourceKind};
pub use error::{Result, VolumeError};
pub use report::TextReport;
pub use resampler::Resampler;
pub use volume::{Geometry, Label, Volume};
pub use volume_loader::VolumeLoader;
pub use volumer::{DicomVolumer, VolumeFileVolumer, Volumer};
