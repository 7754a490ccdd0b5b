//! Frame renumbering for timeline edits.
//!
//! A [`TimelineEdit`] rewrites stored frame keys, track windows, automation
//! windows and legacy animation windows so they keep pointing at the same
//! content after the host inserts, deletes, duplicates or moves frames.

use serde::{Deserialize, Serialize};

use crate::pattern::Frame;
use crate::track::LayerTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TimelineEdit {
    Insert { at: usize, count: usize },
    Delete { at: usize, count: usize },
    /// Insert a copy of `src` at `dest`.
    Duplicate { src: usize, dest: usize },
    Move { src: usize, dest: usize },
}

impl TimelineEdit {
    /// The new index of a stored frame key, or `None` when the frame is dropped.
    pub fn map_key(&self, key: usize) -> Option<usize> {
        match *self {
            TimelineEdit::Insert { at, count } => Some(shift_up(key, at, count)),
            TimelineEdit::Delete { at, count } => {
                if key < at {
                    Some(key)
                } else if key >= at + count {
                    Some(key - count)
                } else {
                    None
                }
            }
            TimelineEdit::Duplicate { dest, .. } => Some(shift_up(key, dest, 1)),
            TimelineEdit::Move { src, dest } => Some(if key == src {
                dest
            } else if src < dest && key > src && key <= dest {
                key - 1
            } else if src > dest && key >= dest && key < src {
                key + 1
            } else {
                key
            }),
        }
    }

    /// Rewrite an inclusive `[start, end]` window. Moves leave windows alone.
    pub fn map_window(&self, start: usize, end: Option<usize>) -> (usize, Option<usize>) {
        match *self {
            TimelineEdit::Insert { at, count } => (
                shift_up(start, at, count),
                end.map(|e| shift_up(e, at, count)),
            ),
            TimelineEdit::Duplicate { dest, .. } => {
                (shift_up(start, dest, 1), end.map(|e| shift_up(e, dest, 1)))
            }
            TimelineEdit::Delete { at, count } => {
                let cut = at + count;
                let new_start = if start >= cut {
                    start - count
                } else if start >= at {
                    at
                } else {
                    start
                };
                let new_end = end.map(|e| {
                    if e >= cut {
                        e - count
                    } else if e >= at {
                        new_start.max(at.saturating_sub(1))
                    } else {
                        e
                    }
                });
                (new_start, new_end)
            }
            TimelineEdit::Move { .. } => (start, end),
        }
    }

    pub fn apply_to_window(&self, start: &mut usize, end: &mut Option<usize>) {
        (*start, *end) = self.map_window(*start, *end);
    }

    /// Rewrite a track window. An unset start stays unset; the end is mapped as
    /// if the window began at frame 0.
    pub fn map_track_window(
        &self,
        start: Option<usize>,
        end: Option<usize>,
    ) -> (Option<usize>, Option<usize>) {
        let (new_start, new_end) = self.map_window(start.unwrap_or(0), end);
        (start.map(|_| new_start), new_end)
    }

    /// Renumber a track's frames, its window and every automation window.
    pub fn apply_to_track(&self, track: &mut LayerTrack) {
        track.frames.remap(|key| self.map_key(key));
        if let TimelineEdit::Duplicate { src, dest } = *self {
            // The source may itself have been pushed up by the insert.
            let shifted = if src < dest { src } else { src + 1 };
            if let Some(frame) = track.frames.get(shifted).cloned() {
                track.frames.insert(dest, frame);
            }
        }
        (track.start_frame, track.end_frame) =
            self.map_track_window(track.start_frame, track.end_frame);
        for action in &mut track.automation {
            self.apply_to_window(&mut action.start_frame, &mut action.end_frame);
        }
    }

    /// Apply the same edit to the host pattern's flat frame list.
    /// Out-of-range positions are clamped. A duplicate of a missing source
    /// inserts a blank frame so the list shifts like the tracks do.
    pub fn apply_to_frames(&self, frames: &mut Vec<Frame>, pixel_count: usize) {
        let len = frames.len();
        match *self {
            TimelineEdit::Insert { at, count } => {
                let at = at.min(len);
                frames.splice(at..at, (0..count).map(|_| Frame::blank(pixel_count)));
            }
            TimelineEdit::Delete { at, count } => {
                if at < len {
                    frames.drain(at..(at + count).min(len));
                }
            }
            TimelineEdit::Duplicate { src, dest } => {
                let frame = frames
                    .get(src)
                    .cloned()
                    .unwrap_or_else(|| Frame::blank(pixel_count));
                frames.insert(dest.min(len), frame);
            }
            TimelineEdit::Move { src, dest } => {
                if src < len {
                    let frame = frames.remove(src);
                    frames.insert(dest.min(len - 1), frame);
                }
            }
        }
    }
}

fn shift_up(value: usize, at: usize, count: usize) -> usize {
    if value >= at { value + count } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{AutomationAction, Effect};
    use crate::frame::LayerFrame;
    use crate::grid::Rgb;

    fn solid(v: u8) -> LayerFrame {
        LayerFrame::new(vec![Rgb::new(v, v, v)])
    }

    fn track_with_keys(keys: &[usize]) -> LayerTrack {
        let mut track = LayerTrack::new("T", 0);
        for &k in keys {
            track.set_frame(k, solid(k as u8));
        }
        track
    }

    #[test]
    fn test_insert_shifts_keys_at_and_after() {
        let mut track = track_with_keys(&[0, 2, 5]);
        TimelineEdit::Insert { at: 2, count: 3 }.apply_to_track(&mut track);
        assert_eq!(track.frame_indices(), vec![0, 5, 8]);
        assert_eq!(track.frames.get(5), Some(&solid(2)));
    }

    #[test]
    fn test_delete_drops_range_and_shifts_tail() {
        let mut track = track_with_keys(&[0, 1, 2, 3, 4]);
        TimelineEdit::Delete { at: 1, count: 2 }.apply_to_track(&mut track);
        assert_eq!(track.frame_indices(), vec![0, 1, 2]);
        assert_eq!(track.frames.get(1), Some(&solid(3)));
    }

    #[test]
    fn test_insert_then_delete_round_trip() {
        let original = track_with_keys(&[0, 3, 4, 9]);
        let mut track = original.clone();
        TimelineEdit::Insert { at: 3, count: 2 }.apply_to_track(&mut track);
        TimelineEdit::Delete { at: 3, count: 2 }.apply_to_track(&mut track);
        assert_eq!(track.frames, original.frames);
    }

    #[test]
    fn test_delete_clamps_windows() {
        let delete = TimelineEdit::Delete { at: 4, count: 3 };
        // End inside the range.
        assert_eq!(delete.map_window(1, Some(5)), (1, Some(3)));
        // Both bounds after the range.
        assert_eq!(delete.map_window(8, Some(10)), (5, Some(7)));
        // Start inside, end after.
        assert_eq!(delete.map_window(5, Some(9)), (4, Some(6)));
        // Whole window deleted collapses onto the cut point.
        assert_eq!(delete.map_window(4, Some(6)), (4, Some(4)));
        // Open ends stay open.
        assert_eq!(delete.map_window(2, None), (2, None));
    }

    #[test]
    fn test_delete_at_zero_does_not_underflow() {
        let delete = TimelineEdit::Delete { at: 0, count: 2 };
        assert_eq!(delete.map_window(0, Some(1)), (0, Some(0)));
        assert_eq!(delete.map_key(0), None);
        assert_eq!(delete.map_key(2), Some(0));
    }

    #[test]
    fn test_windows_follow_insert() {
        let mut track = track_with_keys(&[]);
        track.start_frame = Some(2);
        track.end_frame = Some(6);
        track
            .add_automation(AutomationAction::new(Effect::Invert, 0).with_end(3))
            .unwrap();
        TimelineEdit::Insert { at: 3, count: 1 }.apply_to_track(&mut track);
        assert_eq!((track.start_frame, track.end_frame), (Some(2), Some(7)));
        let action = &track.automation[0];
        assert_eq!((action.start_frame, action.end_frame), (0, Some(4)));
    }

    #[test]
    fn test_duplicate_before_source_copies_shifted_frame() {
        let mut track = track_with_keys(&[0, 1]);
        TimelineEdit::Duplicate { src: 1, dest: 0 }.apply_to_track(&mut track);
        assert_eq!(track.frame_indices(), vec![0, 1, 2]);
        assert_eq!(track.frames.get(0), Some(&solid(1)));
        assert_eq!(track.frames.get(1), Some(&solid(0)));
        assert_eq!(track.frames.get(2), Some(&solid(1)));
    }

    #[test]
    fn test_duplicate_after_source() {
        let mut track = track_with_keys(&[0, 1]);
        TimelineEdit::Duplicate { src: 0, dest: 1 }.apply_to_track(&mut track);
        assert_eq!(track.frame_indices(), vec![0, 1, 2]);
        assert_eq!(track.frames.get(1), Some(&solid(0)));
        assert_eq!(track.frames.get(2), Some(&solid(1)));
    }

    #[test]
    fn test_duplicate_missing_source_only_shifts() {
        let mut track = track_with_keys(&[3]);
        TimelineEdit::Duplicate { src: 0, dest: 1 }.apply_to_track(&mut track);
        assert_eq!(track.frame_indices(), vec![4]);
    }

    #[test]
    fn test_unset_track_start_is_never_shifted() {
        let mut track = track_with_keys(&[0]);
        TimelineEdit::Insert { at: 0, count: 2 }.apply_to_track(&mut track);
        TimelineEdit::Duplicate { src: 2, dest: 0 }.apply_to_track(&mut track);
        TimelineEdit::Delete { at: 0, count: 1 }.apply_to_track(&mut track);
        assert_eq!((track.start_frame, track.end_frame), (None, None));
        assert!(track.is_active_at(0));

        track.end_frame = Some(4);
        TimelineEdit::Insert { at: 0, count: 1 }.apply_to_track(&mut track);
        assert_eq!((track.start_frame, track.end_frame), (None, Some(5)));
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut track = track_with_keys(&[0, 1, 2, 3]);
        TimelineEdit::Move { src: 0, dest: 2 }.apply_to_track(&mut track);
        let order: Vec<_> = track.frames.iter().map(|(_, f)| f.pixels[0].r).collect();
        assert_eq!(order, vec![1, 2, 0, 3]);

        TimelineEdit::Move { src: 3, dest: 0 }.apply_to_track(&mut track);
        let order: Vec<_> = track.frames.iter().map(|(_, f)| f.pixels[0].r).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_move_leaves_windows() {
        let mut track = track_with_keys(&[0]);
        track.start_frame = Some(1);
        track.end_frame = Some(2);
        TimelineEdit::Move { src: 0, dest: 3 }.apply_to_track(&mut track);
        assert_eq!((track.start_frame, track.end_frame), (Some(1), Some(2)));
    }

    #[test]
    fn test_apply_to_pattern_frames() {
        let mut frames: Vec<Frame> = (0..3)
            .map(|i| Frame::new(vec![Rgb::new(i, 0, 0)], 50))
            .collect();
        let reds = |frames: &[Frame]| frames.iter().map(|f| f.pixels[0].r).collect::<Vec<_>>();

        TimelineEdit::Insert { at: 1, count: 1 }.apply_to_frames(&mut frames, 1);
        assert_eq!(reds(&frames), vec![0, 0, 1, 2]);
        assert_eq!(frames[1].duration_ms, crate::pattern::DEFAULT_FRAME_DURATION_MS);

        TimelineEdit::Delete { at: 1, count: 1 }.apply_to_frames(&mut frames, 1);
        assert_eq!(reds(&frames), vec![0, 1, 2]);

        TimelineEdit::Duplicate { src: 2, dest: 0 }.apply_to_frames(&mut frames, 1);
        assert_eq!(reds(&frames), vec![2, 0, 1, 2]);

        TimelineEdit::Move { src: 0, dest: 3 }.apply_to_frames(&mut frames, 1);
        assert_eq!(reds(&frames), vec![0, 1, 2, 2]);

        // A missing source still shifts the list by one.
        TimelineEdit::Duplicate { src: 9, dest: 1 }.apply_to_frames(&mut frames, 1);
        assert_eq!(reds(&frames), vec![0, 0, 1, 2, 2]);
        assert!(frames[1].pixels[0].is_black());

        // Past-the-end deletes are ignored.
        TimelineEdit::Delete { at: 10, count: 2 }.apply_to_frames(&mut frames, 1);
        assert_eq!(frames.len(), 5);
    }
}
