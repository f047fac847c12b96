use crate::{
    error::{Result, VolumeError},
    volume::{Geometry, Label, Volume},
};

use log::debug;
use std::collections::BTreeMap;

/// Volume statistics of one label
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct LabelVolume {
    pub voxel_count: u64,
    pub volume_mm3: f64,
    pub volume_cm3: f64,
    /// Same as `volume_cm3`, 1 cm³ = 1 mL
    pub volume_ml: f64,
}

impl LabelVolume {
    pub fn new(voxel_count: u64, voxel_volume: f64) -> Self {
        let volume_mm3 = voxel_count as f64 * voxel_volume;
        let volume_cm3 = volume_mm3 / 1000.0;
        Self {
            voxel_count,
            volume_mm3,
            volume_cm3,
            volume_ml: volume_cm3,
        }
    }
}

/// Per-label volumes of a mask, in ascending label order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct VolumeReport {
    voxel_volume: f64,
    labels: BTreeMap<Label, LabelVolume>,
}

impl VolumeReport {
    /// Volume of one reference voxel in mm³
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_volume
    }

    pub fn get(&self, label: Label) -> Option<&LabelVolume> {
        self.labels.get(&label)
    }

    pub fn labels(&self) -> &BTreeMap<Label, LabelVolume> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &LabelVolume)> {
        self.labels.iter()
    }

    pub fn total_voxel_count(&self) -> u64 {
        self.labels.values().map(|v| v.voxel_count).sum()
    }

    pub fn into_labels(self) -> BTreeMap<Label, LabelVolume> {
        self.labels
    }
}

impl<'a> IntoIterator for &'a VolumeReport {
    type Item = (&'a Label, &'a LabelVolume);
    type IntoIter = std::collections::btree_map::Iter<'a, Label, LabelVolume>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

pub struct Aggregator;

impl Aggregator {
    /// Count the voxels of each label and convert them to physical volumes
    ///
    /// # Arguments
    ///
    /// * `reference` - Geometry whose spacing defines the voxel volume
    /// * `mask` - Label volume already aligned to `reference`
    /// * `label_values` - Labels to report, every non-zero label when `None`
    ///
    /// Requested labels are sorted and deduplicated, zero is ignored and a
    /// label missing from the mask is reported with no voxels.
    ///
    /// # Errors
    ///
    /// Returns `EmptyLabelSet` if the mask has no non-zero voxel or no label
    /// is left to report, and `InconsistentDimensions` if the mask is not on
    /// the reference grid
    pub fn aggregate(
        reference: &Geometry,
        mask: &Volume<Label>,
        label_values: Option<&[Label]>,
    ) -> Result<VolumeReport> {
        if mask.geometry().size() != reference.size() {
            return Err(VolumeError::InconsistentDimensions(format!(
                "mask of size {:?} is not aligned to reference of size {:?}",
                mask.geometry().size(),
                reference.size()
            )));
        }

        let counts = Self::count_labels(mask);
        if counts.is_empty() {
            return Err(VolumeError::EmptyLabelSet);
        }

        let candidates: Vec<Label> = match label_values {
            Some(values) => {
                let mut values: Vec<_> = values.iter().copied().filter(|&l| l != 0).collect();
                values.sort_unstable();
                values.dedup();
                values
            }
            None => counts.keys().copied().collect(),
        };
        if candidates.is_empty() {
            return Err(VolumeError::EmptyLabelSet);
        }

        let voxel_volume = reference.voxel_volume();
        let labels = candidates
            .into_iter()
            .map(|label| {
                let count = counts.get(&label).copied().unwrap_or(0);
                let volume = LabelVolume::new(count, voxel_volume);
                debug!(
                    "Label {}: {} voxels, {:.2} mm³ ({:.2} cm³)",
                    label, volume.voxel_count, volume.volume_mm3, volume.volume_cm3
                );
                (label, volume)
            })
            .collect();

        Ok(VolumeReport {
            voxel_volume,
            labels,
        })
    }

    /// Voxel count of every non-zero label
    fn count_labels(mask: &Volume<Label>) -> BTreeMap<Label, u64> {
        let mut counts = BTreeMap::new();
        for &label in mask.data().iter().filter(|&&label| label != 0) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}
