use crate::{
    error::{Result, VolumeError},
    volume::{Geometry, Volume},
};

use glam::DVec3;
use log::info;
use ndarray::Array3;
use std::borrow::Cow;

pub struct Resampler;

impl Resampler {
    /// Bring `mask` onto the voxel grid of `reference`
    ///
    /// Returns the mask untouched when both grids are identical, otherwise a
    /// nearest-neighbour resampling that keeps every label value exact.
    ///
    /// # Errors
    ///
    /// Returns `GeometryMismatch` if no reference voxel lies inside the mask
    pub fn align<'a, T, R>(
        mask: &'a Volume<T>,
        reference: &Volume<R>,
    ) -> Result<Cow<'a, Volume<T>>>
    where
        T: Copy + Default,
    {
        if mask.same_grid(reference) {
            info!("Mask already shares the reference grid, no resampling needed");
            return Ok(Cow::Borrowed(mask));
        }
        Self::nearest_neighbor(mask, reference.geometry()).map(Cow::Owned)
    }

    /// Sample `source` at every voxel center of `target`
    ///
    /// Voxels falling outside the source take `T::default()`.
    pub fn nearest_neighbor<T>(source: &Volume<T>, target: &Geometry) -> Result<Volume<T>>
    where
        T: Copy + Default,
    {
        let source_geometry = source.geometry();
        let to_source = source_geometry.index_to_physical_matrix().inverse();
        // target index -> continuous source index
        let step = to_source * target.index_to_physical_matrix();
        let offset = to_source * (target.origin() - source_geometry.origin());

        let source_size = source_geometry.size();
        let source_data = source.data();
        let mut inside = 0usize;

        let resampled = Array3::from_shape_fn(target.shape(), |(z, y, x)| {
            let continuous = offset + step * DVec3::new(x as f64, y as f64, z as f64);
            match Self::nearest_index(continuous, source_size) {
                Some([sx, sy, sz]) => {
                    inside += 1;
                    source_data[[sz, sy, sx]]
                }
                None => T::default(),
            }
        });

        if inside == 0 {
            return Err(VolumeError::GeometryMismatch);
        }

        info!(
            "Resampled mask from {:?} onto {:?}, {} of {} voxels inside the mask",
            source_geometry.size(),
            target.size(),
            inside,
            target.voxel_count()
        );
        Volume::new(*target, resampled)
    }

    /// Round a continuous index half-up, `None` when outside `[0, size)`
    #[inline]
    fn nearest_index(continuous: DVec3, size: [usize; 3]) -> Option<[usize; 3]> {
        let rounded = (continuous + 0.5).floor();
        let mut index = [0usize; 3];
        for axis in 0..3 {
            let value = rounded[axis];
            if !(value >= 0.0 && value < size[axis] as f64) {
                return None;
            }
            index[axis] = value as usize;
        }
        Some(index)
    }
}
