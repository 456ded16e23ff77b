use crate::volume::Volume;
use bootvol_common::part::gpt::Guid;

use alloc::vec::Vec;

/// `(is_optical, drive_index, partition_number)` -- the other lookup key, alongside GUID and
/// filesystem label, named in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeCoordinate {
    pub is_optical: bool,
    pub drive_index: u32,
    pub partition: u32,
}

/// Process-wide append-only registry of every volume discovered so far. Children store their
/// parent as an index into this same `Vec` (`Volume::backing_dev`) rather than a borrow,
/// because a registry that owns every node and also hands out long-lived references into
/// itself is the textbook self-referential-struct conflict; an index sidesteps it entirely.
#[derive(Debug, Default)]
pub struct VolumeIndex {
    volumes: Vec<Volume>,
}

impl VolumeIndex {
    pub fn new() -> Self {
        Self { volumes: Vec::new() }
    }

    /// Registers `volume`, returning the index it can be looked up at later.
    pub fn push(&mut self, volume: Volume) -> usize {
        self.volumes.push(volume);
        self.volumes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Volume> {
        self.volumes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Volume> {
        self.volumes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Looks up by filesystem UUID *or* GPT unique partition GUID, whichever is set.
    pub fn find_by_guid(&self, guid: &Guid) -> Option<&Volume> {
        self.volumes.iter().find(|v| {
            v.guid.as_ref() == Some(guid) || v.part_guid.as_ref() == Some(guid)
        })
    }

    /// Case-sensitive filesystem-label lookup.
    pub fn find_by_label(&self, label: &str) -> Option<&Volume> {
        self.volumes
            .iter()
            .find(|v| v.fslabel.as_deref() == Some(label))
    }

    pub fn find_by_coordinate(&self, coord: VolumeCoordinate) -> Option<&Volume> {
        self.volumes.iter().find(|v| {
            v.is_optical == coord.is_optical
                && v.index == coord.drive_index
                && v.partition == coord.partition
        })
    }
}
