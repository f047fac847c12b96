use crate::error::{Result, VolumeError};

use glam::{DMat3, DVec3};
use ndarray::Array3;

/// Integer label carried by a segmentation mask, zero is background
pub type Label = i32;

/// Placement of a voxel grid in physical (LPS patient) space
///
/// A voxel index `(x, y, z)` maps to `origin + direction * (spacing * index)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    size: [usize; 3],
    spacing: DVec3,
    origin: DVec3,
    direction: DMat3,
}

impl Geometry {
    /// Create a geometry
    ///
    /// # Arguments
    ///
    /// * `size` - Voxel counts along x, y and z
    /// * `spacing` - Physical distance between voxel centers along x, y and z
    /// * `origin` - Physical position of the first voxel
    /// * `direction` - Columns are the physical directions of the x, y and z axes
    ///
    /// # Errors
    ///
    /// Returns error if the grid is empty, a spacing is not strictly positive
    /// or the direction matrix is singular
    pub fn new(size: [usize; 3], spacing: DVec3, origin: DVec3, direction: DMat3) -> Result<Self> {
        if size.contains(&0) {
            return Err(VolumeError::InvalidGeometry(format!("empty grid {:?}", size)));
        }
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(VolumeError::InvalidGeometry(format!(
                "spacing must be strictly positive, got {:?}",
                spacing.to_array()
            )));
        }
        if !origin.is_finite() || !direction.is_finite() || direction.determinant().abs() < 1e-9 {
            return Err(VolumeError::InvalidGeometry(
                "direction matrix is singular".to_string(),
            ));
        }
        Ok(Self {
            size,
            spacing,
            origin,
            direction,
        })
    }

    /// Axis-aligned grid with unit direction cosines
    pub fn axis_aligned(size: [usize; 3], spacing: DVec3, origin: DVec3) -> Result<Self> {
        Self::new(size, spacing, origin, DMat3::IDENTITY)
    }

    /// Voxel counts along (x, y, z)
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn direction(&self) -> DMat3 {
        self.direction
    }

    /// Array shape of the voxel data (depth, height, width)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.size[2], self.size[1], self.size[0])
    }

    pub fn voxel_count(&self) -> usize {
        self.size.iter().product()
    }

    /// Physical volume of a single voxel in mm³
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.x * self.spacing.y * self.spacing.z
    }

    /// Linear part of the index to physical mapping
    pub fn index_to_physical_matrix(&self) -> DMat3 {
        self.direction * DMat3::from_diagonal(self.spacing)
    }

    pub fn index_to_physical(&self, index: DVec3) -> DVec3 {
        self.origin + self.index_to_physical_matrix() * index
    }

    /// Continuous (fractional) voxel index of a physical point
    pub fn physical_to_index(&self, point: DVec3) -> DVec3 {
        self.index_to_physical_matrix().inverse() * (point - self.origin)
    }
}

/// An immutable 3D image: voxel data plus its geometry
///
/// Data is indexed in (z, y, x) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T = f32> {
    geometry: Geometry,
    data: Array3<T>,
}

impl<T> Volume<T> {
    /// # Errors
    ///
    /// Returns error if the data shape does not match the geometry size
    pub fn new(geometry: Geometry, data: Array3<T>) -> Result<Self> {
        if data.dim() != geometry.shape() {
            return Err(VolumeError::InconsistentDimensions(format!(
                "geometry expects {:?}, data has {:?}",
                geometry.shape(),
                data.dim()
            )));
        }
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    pub fn into_data(self) -> Array3<T> {
        self.data
    }

    /// Whether both volumes sample exactly the same grid
    pub fn same_grid<U>(&self, other: &Volume<U>) -> bool {
        self.geometry == other.geometry
    }
}

impl Volume<f32> {
    /// Convert intensities to labels, rounding to the nearest integer
    pub fn to_labels(&self) -> Volume<Label> {
        Volume {
            geometry: self.geometry,
            data: self.data.mapv(|value| value.round() as Label),
        }
    }
}
