//! Sparse per-track frame storage.
//!
//! Frames live in an arena of slots; a sorted map translates frame indices to
//! slots. Timeline edits only rewrite the map, the frame payloads never move.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::LayerFrame;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<usize, LayerFrame>", into = "BTreeMap<usize, LayerFrame>")]
pub struct FrameStore {
    slots: Vec<Option<LayerFrame>>,
    index: BTreeMap<usize, usize>,
    free: Vec<usize>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, frame_index: usize) -> bool {
        self.index.contains_key(&frame_index)
    }

    pub fn get(&self, frame_index: usize) -> Option<&LayerFrame> {
        let slot = *self.index.get(&frame_index)?;
        self.slots[slot].as_ref()
    }

    pub fn get_mut(&mut self, frame_index: usize) -> Option<&mut LayerFrame> {
        let slot = *self.index.get(&frame_index)?;
        self.slots[slot].as_mut()
    }

    /// Store `frame` at `frame_index`, returning the frame it replaced.
    pub fn insert(&mut self, frame_index: usize, frame: LayerFrame) -> Option<LayerFrame> {
        if let Some(&slot) = self.index.get(&frame_index) {
            return self.slots[slot].replace(frame);
        }
        let slot = self.alloc(frame);
        self.index.insert(frame_index, slot);
        None
    }

    /// The frame at `frame_index`, inserting `make()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, frame_index: usize, make: F) -> &mut LayerFrame
    where
        F: FnOnce() -> LayerFrame,
    {
        let slot = match self.index.get(&frame_index) {
            Some(&slot) => slot,
            None => {
                let slot = self.alloc(make());
                self.index.insert(frame_index, slot);
                slot
            }
        };
        // Mapped slots are always occupied.
        self.slots[slot].get_or_insert_with(LayerFrame::default)
    }

    pub fn remove(&mut self, frame_index: usize) -> Option<LayerFrame> {
        let slot = self.index.remove(&frame_index)?;
        self.release(slot)
    }

    /// Frame indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.index.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &LayerFrame)> + '_ {
        self.index
            .iter()
            .filter_map(|(&i, &slot)| self.slots[slot].as_ref().map(|f| (i, f)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayerFrame> + '_ {
        self.slots.iter_mut().flatten()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.index.keys().next_back().copied()
    }

    /// Rewrite every key through `f`. Keys mapped to `None` are dropped along
    /// with their frames. If two keys land on the same index the one with the
    /// higher original index wins.
    pub fn remap<F>(&mut self, f: F)
    where
        F: Fn(usize) -> Option<usize>,
    {
        let old = std::mem::take(&mut self.index);
        let mut dropped = Vec::new();
        for (key, slot) in old {
            match f(key) {
                Some(new_key) => {
                    if let Some(previous) = self.index.insert(new_key, slot) {
                        dropped.push(previous);
                    }
                }
                None => dropped.push(slot),
            }
        }
        for slot in dropped {
            self.release(slot);
        }
    }

    fn alloc(&mut self, frame: LayerFrame) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(frame);
                slot
            }
            None => {
                self.slots.push(Some(frame));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Option<LayerFrame> {
        let frame = self.slots[slot].take();
        self.free.push(slot);
        frame
    }
}

// Slot layout is an implementation detail; equality is by (index, frame) pairs.
impl PartialEq for FrameStore {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl From<BTreeMap<usize, LayerFrame>> for FrameStore {
    fn from(map: BTreeMap<usize, LayerFrame>) -> Self {
        let mut store = Self::new();
        for (i, frame) in map {
            store.insert(i, frame);
        }
        store
    }
}

impl From<FrameStore> for BTreeMap<usize, LayerFrame> {
    fn from(mut store: FrameStore) -> Self {
        let index = std::mem::take(&mut store.index);
        index
            .into_iter()
            .filter_map(|(i, slot)| store.slots[slot].take().map(|f| (i, f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgb;

    fn solid(v: u8) -> LayerFrame {
        LayerFrame::new(vec![Rgb::new(v, v, v)])
    }

    #[test]
    fn test_insert_get_remove() {
        let mut store = FrameStore::new();
        assert!(store.insert(3, solid(1)).is_none());
        assert!(store.contains(3));
        assert!(!store.contains(0));
        assert_eq!(store.get(3), Some(&solid(1)));

        let replaced = store.insert(3, solid(2));
        assert_eq!(replaced, Some(solid(1)));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(3), Some(solid(2)));
        assert!(store.is_empty());
        assert!(store.remove(3).is_none());
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut store = FrameStore::new();
        store.get_or_insert_with(2, || solid(7)).pixels[0] = Rgb::new(1, 1, 1);
        assert_eq!(store.get(2), Some(&solid(1)));
        // Existing frames are returned untouched.
        let frame = store.get_or_insert_with(2, || solid(9));
        assert_eq!(frame, &solid(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut store = FrameStore::new();
        store.insert(0, solid(1));
        store.insert(1, solid(2));
        store.remove(0);
        store.insert(7, solid(3));
        assert_eq!(store.slots.len(), 2);
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![1, 7]);
    }

    #[test]
    fn test_remap_shifts_and_drops() {
        let mut store = FrameStore::new();
        for i in 0..5 {
            store.insert(i, solid(i as u8));
        }
        // Delete [1, 3)
        store.remap(|k| match k {
            k if k < 1 => Some(k),
            k if k >= 3 => Some(k - 2),
            _ => None,
        });
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(store.get(1), Some(&solid(3)));
        assert_eq!(store.get(2), Some(&solid(4)));
        assert_eq!(store.free.len(), 2);
    }

    #[test]
    fn test_equality_ignores_slot_layout() {
        let mut a = FrameStore::new();
        a.insert(0, solid(9));
        a.insert(1, solid(8));

        let mut b = FrameStore::new();
        b.insert(5, solid(0));
        b.insert(1, solid(8));
        b.remove(5);
        b.insert(0, solid(9));

        assert_eq!(a, b);
        b.insert(2, solid(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_index_map() {
        let mut store = FrameStore::new();
        store.insert(4, solid(1));
        store.insert(2, solid(2));
        let json = serde_json::to_string(&store).unwrap();
        let back: FrameStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
        assert_eq!(back.indices().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(back.last_index(), Some(4));
    }
}
