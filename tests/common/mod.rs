#![allow(dead_code)]

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use std::path::Path;

/// Write an uncompressed single-file NIfTI-1 volume of float32 voxels
///
/// `srow` holds the first three rows of the RAS affine, `data` is x-fastest.
pub fn write_nifti(path: &Path, dims: [usize; 3], srow: [[f32; 4]; 3], data: &[f32]) {
    assert_eq!(data.len(), dims.iter().product::<usize>());
    let mut header = [0u8; 348];

    header[0..4].copy_from_slice(&348i32.to_le_bytes());

    let dim: [i16; 8] = [3, dims[0] as i16, dims[1] as i16, dims[2] as i16, 1, 1, 1, 1];
    for (i, d) in dim.iter().enumerate() {
        header[40 + i * 2..42 + i * 2].copy_from_slice(&d.to_le_bytes());
    }

    // datatype FLOAT32, bitpix 32
    header[70..72].copy_from_slice(&16i16.to_le_bytes());
    header[72..74].copy_from_slice(&32i16.to_le_bytes());

    let pixdim = [
        1.0f32,
        column_length(&srow, 0),
        column_length(&srow, 1),
        column_length(&srow, 2),
        1.0,
        1.0,
        1.0,
        1.0,
    ];
    for (i, p) in pixdim.iter().enumerate() {
        header[76 + i * 4..80 + i * 4].copy_from_slice(&p.to_le_bytes());
    }

    header[108..112].copy_from_slice(&352.0f32.to_le_bytes());
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());

    // sform_code scanner anatomical
    header[254..256].copy_from_slice(&1i16.to_le_bytes());
    for (row, values) in srow.iter().enumerate() {
        for (i, v) in values.iter().enumerate() {
            let offset = 280 + row * 16 + i * 4;
            header[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
        }
    }
    header[344..348].copy_from_slice(b"n+1\0");

    let mut bytes = Vec::with_capacity(352 + data.len() * 4);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&[0u8; 4]);
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn column_length(srow: &[[f32; 4]; 3], column: usize) -> f32 {
    srow.iter()
        .map(|row| row[column] * row[column])
        .sum::<f32>()
        .sqrt()
}

/// RAS affine of an axis-aligned grid whose LPS origin is zero
pub fn lps_aligned_srow(spacing: [f32; 3]) -> [[f32; 4]; 3] {
    [
        [-spacing[0], 0.0, 0.0, 0.0],
        [0.0, -spacing[1], 0.0, 0.0],
        [0.0, 0.0, spacing[2], 0.0],
    ]
}

/// One axial CT slice with unit pixel spacing, located at `z` mm
///
/// Pixel values are `instance_number * 100 + pixel index`.
pub struct SliceSpec<'a> {
    pub series_uid: &'a str,
    pub instance_number: i32,
    pub z: f64,
    pub rows: u16,
    pub columns: u16,
}

pub fn write_dicom_slice(path: &Path, spec: &SliceSpec) {
    let sop_instance_uid = format!("{}.{}", spec.series_uid, spec.instance_number);
    let pixels: Vec<u16> = (0..spec.rows as usize * spec.columns as usize)
        .map(|i| spec.instance_number as u16 * 100 + i as u16)
        .collect();

    let object = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::CT_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid.as_str()),
        ),
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")),
        DataElement::new(
            tags::SERIES_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(spec.series_uid),
        ),
        DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(spec.instance_number.to_string()),
        ),
        DataElement::new(
            tags::IMAGE_POSITION_PATIENT,
            VR::DS,
            PrimitiveValue::from(format!("0\\0\\{}", spec.z)),
        ),
        DataElement::new(
            tags::IMAGE_ORIENTATION_PATIENT,
            VR::DS,
            PrimitiveValue::from("1\\0\\0\\0\\1\\0"),
        ),
        DataElement::new(tags::PIXEL_SPACING, VR::DS, PrimitiveValue::from("1\\1")),
        DataElement::new(tags::SLICE_THICKNESS, VR::DS, PrimitiveValue::from("2")),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(spec.rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(spec.columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(pixels.into_iter().collect()),
        ),
    ]);

    let file_object = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .unwrap();
    file_object.write_to_file(path).unwrap();
}

/// Axial series of `slices` 4x4 slices, 2mm apart starting at z = 0
pub fn write_series(directory: &Path, series_uid: &str, slices: usize) {
    for i in 0..slices {
        let spec = SliceSpec {
            series_uid,
            instance_number: i as i32 + 1,
            z: 2.0 * i as f64,
            rows: 4,
            columns: 4,
        };
        // file names in reverse order so sorting has to use the positions
        write_dicom_slice(&directory.join(format!("IM{:04}.dcm", slices - i)), &spec);
    }
}
