use ledstudio_core::animation::LegacyAnimation;
use ledstudio_core::automation::{AutomationAction, Effect};
use ledstudio_core::events::{FrameScope, LayerEvent};
use ledstudio_core::grid::Rgb;
use ledstudio_core::reindex::TimelineEdit;
use ledstudio_core::pattern::Pattern;
use ledstudio_core::stack::LayerStack;
use ledstudio_test_harness::assertions::{assert_frame_keys, assert_pixels_eq};
use ledstudio_test_harness::builders::{PatternBuilder, TrackBuilder};
use ledstudio_test_harness::fixtures::RED;

fn shade(v: u8) -> Vec<Rgb> {
    vec![Rgb::new(v, v, v)]
}

/// Two 1x1 tracks over five frames; each stored frame's shade is its index + 1.
fn five_frame_stack() -> LayerStack {
    let mut bottom = TrackBuilder::new("bottom");
    for i in 0..5u8 {
        bottom = bottom.pixels(i as usize, shade(i + 1));
    }
    let top = TrackBuilder::new("top")
        .pixels(1, shade(100))
        .pixels(3, shade(200))
        .window(1, Some(3))
        .automation(AutomationAction::new(Effect::Invert, 2).with_end(4));
    let mut stack = PatternBuilder::new(1, 1)
        .frames(5)
        .track(bottom.build())
        .track(top.build())
        .build();
    stack.sync_all_frames();
    stack
}

fn shades(stack: &LayerStack, track: usize) -> Vec<(usize, u8)> {
    stack
        .track(track)
        .unwrap()
        .frames
        .iter()
        .map(|(i, f)| (i, f.pixels[0].r))
        .collect()
}

#[test]
fn test_insert_then_delete_restores_every_track() {
    let mut stack = five_frame_stack();
    let before = stack.snapshot();
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 2, count: 3 });
    assert_frame_keys(stack.track(0).unwrap(), &[0, 1, 5, 6, 7]);
    assert_frame_keys(stack.track(1).unwrap(), &[1, 6]);
    assert_eq!(stack.pattern().frame_count(), 8);

    stack.apply_timeline_edit(TimelineEdit::Delete { at: 2, count: 3 });
    assert_eq!(stack.snapshot(), before);
}

#[test]
fn test_insert_shifts_windows() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 2, count: 1 });
    let top = stack.track(1).unwrap();
    assert_eq!((top.start_frame, top.end_frame), (Some(1), Some(4)));
    let action = &top.get_automation()[0];
    assert_eq!((action.start_frame, action.end_frame), (3, Some(5)));
}

#[test]
fn test_delete_clamps_windows_into_range() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Delete { at: 3, count: 2 });
    assert_eq!(shades(&stack, 0), vec![(0, 1), (1, 2), (2, 3)]);
    assert_eq!(shades(&stack, 1), vec![(1, 100)]);

    let top = stack.track(1).unwrap();
    assert_eq!((top.start_frame, top.end_frame), (Some(1), Some(2)));
    let action = &top.get_automation()[0];
    assert_eq!((action.start_frame, action.end_frame), (2, Some(2)));
    assert_eq!(stack.pattern().frame_count(), 3);
}

#[test]
fn test_duplicate_copies_frame_in_every_track() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Duplicate { src: 3, dest: 1 });
    assert_eq!(
        shades(&stack, 0),
        vec![(0, 1), (1, 4), (2, 2), (3, 3), (4, 4), (5, 5)]
    );
    assert_eq!(shades(&stack, 1), vec![(1, 200), (2, 100), (4, 200)]);
    assert_eq!(stack.pattern().frame_count(), 6);
    // The pattern frame is copied along with the layers.
    assert_eq!(stack.pattern().frames[1], stack.pattern().frames[4]);
}

#[test]
fn test_move_keeps_windows_and_moves_content() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Move { src: 4, dest: 0 });
    assert_eq!(
        shades(&stack, 0),
        vec![(0, 5), (1, 1), (2, 2), (3, 3), (4, 4)]
    );
    assert_eq!(shades(&stack, 1), vec![(2, 100), (4, 200)]);
    let top = stack.track(1).unwrap();
    assert_eq!((top.start_frame, top.end_frame), (Some(1), Some(3)));
}

#[test]
fn test_legacy_animation_window_follows_edit() {
    let mut stack = five_frame_stack();
    stack
        .set_animation(0, LegacyAnimation::fade(true, 2, 2))
        .unwrap();
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 0, count: 2 });
    let animation = stack.animation(0).unwrap();
    assert_eq!((animation.start_frame, animation.end_frame), (4, Some(6)));
}

#[test]
fn test_shifting_edits_keep_pattern_in_step_with_render() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Duplicate { src: 0, dest: 5 });
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 2, count: 1 });
    stack.apply_timeline_edit(TimelineEdit::Delete { at: 0, count: 1 });
    let pattern = stack.pattern().clone();
    for (i, frame) in pattern.frames.iter().enumerate() {
        assert_pixels_eq(&stack.render_frame(i), &frame.pixels);
    }
}

#[test]
fn test_timeline_edit_notifies_all_frames() {
    let mut stack = five_frame_stack();
    stack.events().poll();
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 0, count: 1 });
    assert_eq!(
        stack.events().poll(),
        vec![LayerEvent::LayersChanged(FrameScope::All)]
    );
}

#[test]
fn test_insert_at_start_keeps_default_tracks_at_frame_zero() {
    let mut stack = LayerStack::new(Pattern::blank("p", 2, 1, 2));
    stack.apply_timeline_edit(TimelineEdit::Insert { at: 0, count: 1 });
    stack.apply_timeline_edit(TimelineEdit::Duplicate { src: 1, dest: 0 });
    assert_eq!(stack.track(0).unwrap().start_frame, None);

    stack.apply_pixel(0, 0, 0, 0, RED).unwrap();
    assert_pixels_eq(&stack.render_frame(0), &[RED, Rgb::BLACK]);
}

#[test]
fn test_duplicate_past_pattern_end_keeps_pattern_in_step() {
    let mut stack = five_frame_stack();
    stack.apply_timeline_edit(TimelineEdit::Duplicate { src: 9, dest: 2 });
    assert_eq!(stack.pattern().frame_count(), 6);
    let pattern = stack.pattern().clone();
    for (i, frame) in pattern.frames.iter().enumerate() {
        assert_pixels_eq(&stack.render_frame(i), &frame.pixels);
    }
}
