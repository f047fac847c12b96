use crate::{
    enums::SortBy,
    error::{Result, VolumeError},
    volume::{Geometry, Volume},
};

use dicom::{
    object::{DefaultDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder},
};
use dicom_dictionary_std::tags;
use glam::{DMat3, DVec3};
use log::{debug, info, warn};
use ndarray::{Array2, Array3, s};
use nifti::{InMemNiftiVolume, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

/// RAS (NIfTI) to LPS (DICOM) axis flip
const RAS_TO_LPS: DVec3 = DVec3::new(-1.0, -1.0, 1.0);

pub struct VolumeLoader;

/// Header fields of one DICOM file needed to place it in a series
struct SliceInfo {
    path: PathBuf,
    series_uid: String,
    instance_number: Option<i32>,
    position: Option<DVec3>,
    orientation: Option<(DVec3, DVec3)>,
    /// (row spacing, column spacing)
    pixel_spacing: Option<(f64, f64)>,
    slice_thickness: Option<f64>,
    spacing_between_slices: Option<f64>,
    object: DefaultDicomObject,
}

impl VolumeLoader {
    /// Load a complete volume from a single NIfTI file (`.nii` or `.nii.gz`)
    ///
    /// The affine is taken from the sform, the qform or the voxel sizes, in
    /// that order of preference, and converted to LPS so it shares a physical
    /// space with DICOM series.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist, or an error if the file
    /// is not a readable 3D (or 4D) NIfTI volume
    pub fn load_single_volume(path: impl AsRef<Path>) -> Result<Volume> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VolumeError::not_found(path, "Volume file does not exist"));
        }

        let object = ReaderOptions::new().read_file(path)?;
        let geometry = Self::nifti_geometry(object.header())?;
        let data = Self::nifti_voxels(object.into_volume(), geometry.size())?;

        info!(
            "Loaded volume {} with size {:?} and spacing {:?}",
            path.display(),
            geometry.size(),
            geometry.spacing().to_array()
        );
        Volume::new(geometry, data)
    }

    /// Load a DICOM series from a directory, ordering slices along their normal
    pub fn load_dicom_series(directory: impl AsRef<Path>) -> Result<Volume> {
        Self::load_dicom_series_with(directory, SortBy::default())
    }

    /// Load a DICOM series from a directory
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory holding the series files, not searched recursively
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming the directory if it does not exist or holds
    /// no readable DICOM file, and an error if the slices cannot be stacked
    pub fn load_dicom_series_with(directory: impl AsRef<Path>, sort_by: SortBy) -> Result<Volume> {
        let directory = std::path::absolute(directory.as_ref())?;
        if !directory.is_dir() {
            return Err(VolumeError::not_found(
                &directory,
                "DICOM directory does not exist",
            ));
        }

        let slices: Vec<_> = Self::collect_dicom_files(&directory)?
            .into_iter()
            .filter_map(|path| match open_file(&path) {
                Ok(object) => Some(Self::extract_slice_info(path, object)),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        if slices.is_empty() {
            return Err(VolumeError::not_found(
                &directory,
                "No DICOM files found in directory",
            ));
        }

        let mut slices = Self::select_series(slices);
        Self::sort_slices(&mut slices, sort_by);

        let images = slices
            .iter()
            .map(|slice| {
                debug!("Decoding {}", slice.path.display());
                Self::decode_image(&slice.object)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::validate_dimensions(&images)?;

        let (rows, columns) = images[0].dim();
        let geometry = Self::series_geometry(&slices, rows, columns)?;
        let volume_array = Self::build_volume_array(&images);

        info!(
            "Loaded DICOM series {} with {} slices, size {:?} and spacing {:?}",
            directory.display(),
            slices.len(),
            geometry.size(),
            geometry.spacing().to_array()
        );
        Volume::new(geometry, volume_array)
    }

    /// Candidate DICOM files of a directory, in file name order
    ///
    /// Files with a `.dcm` or `.dicom` extension are taken as they are, any
    /// other file (UID-named, `.IMA`, no extension) only with a DICOM preamble.
    fn collect_dicom_files(directory: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<_> = fs::read_dir(directory)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| Self::has_dicom_extension(path) || Self::has_dicom_preamble(path))
            .collect();
        files.sort();
        Ok(files)
    }

    fn has_dicom_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom")
            })
    }

    /// Checks for the "DICM" magic after the 128-byte preamble
    fn has_dicom_preamble(path: &Path) -> bool {
        let mut buffer = [0u8; 132];
        File::open(path)
            .and_then(|mut file| file.read_exact(&mut buffer))
            .is_ok_and(|_| &buffer[128..132] == b"DICM")
    }

    fn extract_slice_info(path: PathBuf, object: DefaultDicomObject) -> SliceInfo {
        let series_uid = object
            .element(tags::SERIES_INSTANCE_UID)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|uid| uid.trim_end_matches(['\0', ' ']).to_string())
            .unwrap_or_default();
        let instance_number = object
            .element(tags::INSTANCE_NUMBER)
            .ok()
            .and_then(|e| e.to_int::<i32>().ok());
        let position = Self::multi_float(&object, tags::IMAGE_POSITION_PATIENT)
            .filter(|v| v.len() >= 3)
            .map(|v| DVec3::new(v[0], v[1], v[2]));
        let orientation = Self::multi_float(&object, tags::IMAGE_ORIENTATION_PATIENT)
            .filter(|v| v.len() >= 6)
            .map(|v| (DVec3::new(v[0], v[1], v[2]), DVec3::new(v[3], v[4], v[5])));
        let pixel_spacing = Self::multi_float(&object, tags::PIXEL_SPACING)
            .filter(|v| v.len() >= 2)
            .map(|v| (v[0], v[1]));
        let slice_thickness = object
            .element(tags::SLICE_THICKNESS)
            .ok()
            .and_then(|e| e.to_float64().ok());
        let spacing_between_slices = object
            .element(tags::SPACING_BETWEEN_SLICES)
            .ok()
            .and_then(|e| e.to_float64().ok());

        SliceInfo {
            path,
            series_uid,
            instance_number,
            position,
            orientation,
            pixel_spacing,
            slice_thickness,
            spacing_between_slices,
            object,
        }
    }

    fn multi_float(object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<Vec<f64>> {
        object.element(tag).ok()?.to_multi_float64().ok()
    }

    /// Keep the series with the most slices, ties going to the smallest UID
    fn select_series(slices: Vec<SliceInfo>) -> Vec<SliceInfo> {
        let mut series: BTreeMap<String, Vec<SliceInfo>> = BTreeMap::new();
        for slice in slices {
            series.entry(slice.series_uid.clone()).or_default().push(slice);
        }

        let series_count = series.len();
        let (uid, slices) = series
            .into_iter()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(&a.0)))
            .unwrap_or_default();

        if series_count > 1 {
            warn!(
                "Found {} series, using {:?} with {} slices",
                series_count,
                uid,
                slices.len()
            );
        }
        slices
    }

    fn sort_slices(slices: &mut [SliceInfo], sort_by: SortBy) {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let normal = Self::slice_normal(&slices[0]);
                slices.sort_by(|a, b| {
                    let a = a.position.map(|p| p.dot(normal));
                    let b = b.position.map(|p| p.dot(normal));
                    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortBy::InstanceNumber => slices.sort_by_key(|slice| slice.instance_number),
            SortBy::None => {}
        }
    }

    fn slice_normal(slice: &SliceInfo) -> DVec3 {
        let (row, column) = slice.orientation.unwrap_or((DVec3::X, DVec3::Y));
        row.cross(column)
    }

    fn decode_image(dicom_object: &DefaultDicomObject) -> Result<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        let options = ConvertOptions::new();
        let frames = pixel_data.to_ndarray_with_options::<f32>(&options)?;
        Ok(frames.slice_move(s![0, .., .., 0]))
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<()> {
        let first_dim = images[0].dim();
        match images.iter().find(|img| img.dim() != first_dim) {
            Some(img) => Err(VolumeError::InconsistentDimensions(format!(
                "slice of {:?} pixels in a series of {:?}",
                img.dim(),
                first_dim
            ))),
            None => Ok(()),
        }
    }

    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }

    fn series_geometry(slices: &[SliceInfo], rows: usize, columns: usize) -> Result<Geometry> {
        let first = &slices[0];
        let (row_direction, column_direction) = first.orientation.unwrap_or((DVec3::X, DVec3::Y));
        let (row_spacing, column_spacing) = slices
            .iter()
            .find_map(|slice| slice.pixel_spacing)
            .ok_or(VolumeError::MissingSpacing)?;
        let (slice_spacing, slice_direction) =
            Self::slice_spacing(slices, row_direction.cross(column_direction));

        Geometry::new(
            [columns, rows, slices.len()],
            DVec3::new(column_spacing, row_spacing, slice_spacing),
            first.position.unwrap_or(DVec3::ZERO),
            DMat3::from_cols(row_direction, column_direction, slice_direction),
        )
    }

    /// Mean distance between consecutive slices and the direction they advance in
    fn slice_spacing(slices: &[SliceInfo], normal: DVec3) -> (f64, DVec3) {
        let positions: Vec<f64> = slices
            .iter()
            .filter_map(|slice| slice.position.map(|p| p.dot(normal)))
            .collect();

        if positions.len() == slices.len() && positions.len() > 1 {
            let span = positions[positions.len() - 1] - positions[0];
            let spacing = span.abs() / (positions.len() - 1) as f64;
            if spacing > 0.0 {
                return (spacing, normal * span.signum());
            }
        }

        let first = &slices[0];
        let spacing = first
            .spacing_between_slices
            .or(first.slice_thickness)
            .filter(|spacing| *spacing > 0.0)
            .unwrap_or(1.0);
        (spacing, normal)
    }

    fn nifti_geometry(header: &NiftiHeader) -> Result<Geometry> {
        let dim = header.dim;
        if dim[0] < 3 {
            return Err(VolumeError::InvalidGeometry(format!(
                "expected a 3D volume, found {}D",
                dim[0]
            )));
        }
        let size = [dim[1] as usize, dim[2] as usize, dim[3] as usize];
        let pixdim = DVec3::new(
            header.pixdim[1] as f64,
            header.pixdim[2] as f64,
            header.pixdim[3] as f64,
        );

        let (linear, offset) = if header.sform_code > 0 {
            let (x, y, z) = (header.srow_x, header.srow_y, header.srow_z);
            let linear = DMat3::from_cols(
                DVec3::new(x[0] as f64, y[0] as f64, z[0] as f64),
                DVec3::new(x[1] as f64, y[1] as f64, z[1] as f64),
                DVec3::new(x[2] as f64, y[2] as f64, z[2] as f64),
            );
            (linear, DVec3::new(x[3] as f64, y[3] as f64, z[3] as f64))
        } else if header.qform_code > 0 {
            let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
            let scale = DVec3::new(pixdim.x, pixdim.y, pixdim.z * qfac);
            let rotation = Self::quaternion_rotation(
                header.quatern_b as f64,
                header.quatern_c as f64,
                header.quatern_d as f64,
            );
            let offset = DVec3::new(
                header.quatern_x as f64,
                header.quatern_y as f64,
                header.quatern_z as f64,
            );
            (rotation * DMat3::from_diagonal(scale), offset)
        } else {
            (DMat3::from_diagonal(pixdim), DVec3::ZERO)
        };

        let flip = DMat3::from_diagonal(RAS_TO_LPS);
        let linear = flip * linear;
        let spacing = DVec3::new(
            linear.x_axis.length(),
            linear.y_axis.length(),
            linear.z_axis.length(),
        );
        if spacing.min_element() <= 0.0 {
            return Err(VolumeError::MissingSpacing);
        }

        Geometry::new(
            size,
            spacing,
            flip * offset,
            linear * DMat3::from_diagonal(spacing.recip()),
        )
    }

    /// Rotation matrix of a NIfTI qform quaternion (b, c, d)
    fn quaternion_rotation(b: f64, c: f64, d: f64) -> DMat3 {
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        DMat3::from_cols(
            DVec3::new(
                a * a + b * b - c * c - d * d,
                2.0 * (b * c + a * d),
                2.0 * (b * d - a * c),
            ),
            DVec3::new(
                2.0 * (b * c - a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d + a * b),
            ),
            DVec3::new(
                2.0 * (b * d + a * c),
                2.0 * (c * d - a * b),
                a * a + d * d - c * c - b * b,
            ),
        )
    }

    /// Read voxels in (z, y, x) order, taking the first volume of 4D files
    fn nifti_voxels(volume: InMemNiftiVolume, [nx, ny, nz]: [usize; 3]) -> Result<Array3<f32>> {
        // column-major storage, x varies fastest and time slowest
        let mut values = volume.into_ndarray::<f32>()?.into_raw_vec();
        values.truncate(nx * ny * nz);
        Ok(Array3::from_shape_vec((nz, ny, nx), values)?)
    }
}
