use ledstudio_core::animation::LegacyAnimation;
use ledstudio_core::automation::{
    ActionKind, AutomationAction, Effect, RotateDirection, ScrollDirection,
};
use ledstudio_core::grid::Rgb;
use ledstudio_test_harness::assertions::{assert_all_black, assert_pixels_eq};
use ledstudio_test_harness::builders::{FrameBuilder, PatternBuilder, TrackBuilder};
use ledstudio_test_harness::fixtures::{BLUE, GREEN, RED, gradient, single_pixel, solid};

const B: Rgb = Rgb::BLACK;

fn scroll_right(offset: u32) -> Effect {
    Effect::Scroll {
        direction: ScrollDirection::Right,
        offset,
    }
}

#[test]
fn test_single_track_renders_its_pixels() {
    let stack = PatternBuilder::new(2, 2)
        .track(TrackBuilder::new("base").pixels(0, vec![RED, B, B, B]).build())
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[RED, B, B, B]);
}

#[test]
fn test_scroll_moves_pixel_one_column_per_step() {
    let pixels = vec![RED, B, B, B];
    let stack = PatternBuilder::new(2, 2)
        .frames(2)
        .track(
            TrackBuilder::new("base")
                .pixels(0, pixels.clone())
                .pixels(1, pixels)
                .automation(AutomationAction::new(scroll_right(1), 0))
                .build(),
        )
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[RED, B, B, B]);
    assert_pixels_eq(&stack.render_frame(1), &[B, RED, B, B]);
}

#[test]
fn test_black_top_layer_is_transparent() {
    let grey = Rgb::new(10, 10, 10);
    let stack = PatternBuilder::new(2, 2)
        .track(TrackBuilder::new("bottom").pixels(0, solid(2, 2, grey)).build())
        .track(TrackBuilder::new("top").pixels(0, solid(2, 2, B)).build())
        .build();
    assert_pixels_eq(&stack.render_frame(0), &solid(2, 2, grey));
}

#[test]
fn test_dimmed_top_layer_overwrites_instead_of_blending() {
    let stack = PatternBuilder::new(1, 1)
        .track(TrackBuilder::new("bottom").pixels(0, vec![Rgb::new(200, 0, 0)]).build())
        .track(
            TrackBuilder::new("top")
                .pixels(0, vec![Rgb::new(0, 100, 0)])
                .opacity(0.5)
                .build(),
        )
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[Rgb::new(0, 50, 0)]);
}

#[test]
fn test_render_is_deterministic() {
    let stack = PatternBuilder::new(4, 3)
        .frames(6)
        .track(
            TrackBuilder::new("a")
                .pixels(3, gradient(4, 3))
                .automation(AutomationAction::new(Effect::new(ActionKind::Radial), 0))
                .automation(AutomationAction::new(Effect::new(ActionKind::Wipe), 1))
                .build(),
        )
        .build();
    assert_eq!(stack.render_frame(3), stack.render_frame(3));
}

#[test]
fn test_missing_frame_contributes_nothing() {
    let stack = PatternBuilder::new(3, 1)
        .frames(2)
        .track(TrackBuilder::new("bottom").pixels(1, solid(3, 1, GREEN)).build())
        .track(TrackBuilder::new("top").pixels(0, solid(3, 1, BLUE)).build())
        .build();
    assert_pixels_eq(&stack.render_frame(1), &solid(3, 1, GREEN));
}

#[test]
fn test_no_visible_tracks_renders_black() {
    let stack = PatternBuilder::new(3, 2)
        .track(TrackBuilder::new("a").pixels(0, gradient(3, 2)).hidden().build())
        .track(
            TrackBuilder::new("b")
                .frame(0, FrameBuilder::new(3, 2).fill(RED).visible(false).build())
                .build(),
        )
        .build();
    let buffer = stack.render_frame(0);
    assert_eq!(buffer.len(), 6);
    assert_all_black(&buffer);
}

#[test]
fn test_frame_past_pattern_end_renders_black() {
    let stack = PatternBuilder::new(2, 1).build();
    assert_all_black(&stack.render_frame(40));
}

#[test]
fn test_zero_opacity_never_overwrites() {
    let stack = PatternBuilder::new(2, 1)
        .track(TrackBuilder::new("bottom").pixels(0, vec![RED, B]).build())
        .track(
            TrackBuilder::new("top")
                .pixels(0, solid(2, 1, GREEN))
                .opacity(0.0)
                .build(),
        )
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[RED, B]);
}

#[test]
fn test_frame_opacity_overrides_track() {
    let stack = PatternBuilder::new(1, 1)
        .track(
            TrackBuilder::new("t")
                .frame(0, FrameBuilder::new(1, 1).fill(Rgb::new(100, 100, 100)).opacity(0.25).build())
                .opacity(1.0)
                .build(),
        )
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[Rgb::new(25, 25, 25)]);
}

#[test]
fn test_scroll_past_edge_is_black() {
    let stack = PatternBuilder::new(3, 2)
        .frames(2)
        .track(
            TrackBuilder::new("t")
                .pixels(1, gradient(3, 2))
                .automation(AutomationAction::new(scroll_right(3), 0))
                .build(),
        )
        .build();
    assert_all_black(&stack.render_frame(1));
}

#[test]
fn test_rotation_cycle_returns_original() {
    let base = gradient(3, 3);
    let mut track = TrackBuilder::new("t").automation(AutomationAction::new(
        Effect::Rotate {
            direction: RotateDirection::CounterClockwise,
        },
        0,
    ));
    for frame in [0, 4, 8] {
        track = track.pixels(frame, base.clone());
    }
    let stack = PatternBuilder::new(3, 3)
        .frames(9)
        .track(track.build())
        .build();
    for frame in [0, 4, 8] {
        assert_pixels_eq(&stack.render_frame(frame), &base);
    }
}

#[test]
fn test_automation_window_limits_effect() {
    let pixels = single_pixel(3, 1, 0, 0, RED);
    let mut track = TrackBuilder::new("t").automation(
        AutomationAction::new(scroll_right(1), 1).with_end(1),
    );
    for frame in 0..3 {
        track = track.pixels(frame, pixels.clone());
    }
    let stack = PatternBuilder::new(3, 1).frames(3).track(track.build()).build();
    assert_pixels_eq(&stack.render_frame(0), &[RED, B, B]);
    // Step 0 at the action's first frame.
    assert_pixels_eq(&stack.render_frame(1), &[RED, B, B]);
    assert_pixels_eq(&stack.render_frame(2), &[RED, B, B]);
}

#[test]
fn test_track_window_hides_track_outside() {
    let mut track = TrackBuilder::new("t").window(1, Some(1));
    for frame in 0..3 {
        track = track.pixels(frame, vec![RED]);
    }
    let stack = PatternBuilder::new(1, 1).frames(3).track(track.build()).build();
    assert_all_black(&stack.render_frame(0));
    assert_pixels_eq(&stack.render_frame(1), &[RED]);
    assert_all_black(&stack.render_frame(2));
}

#[test]
fn test_short_frames_are_padded() {
    let stack = PatternBuilder::new(3, 1)
        .track(TrackBuilder::new("t").pixels(0, vec![GREEN]).build())
        .build();
    assert_pixels_eq(&stack.render_frame(0), &[GREEN, B, B]);
}

#[test]
fn test_legacy_animation_plays_without_automation() {
    let mut stack = PatternBuilder::new(4, 1)
        .frames(4)
        .track(TrackBuilder::new("t").pixels(2, single_pixel(4, 1, 0, 0, RED)).build())
        .build();
    stack
        .set_animation(0, LegacyAnimation::scroll(ScrollDirection::Right, 1.0))
        .unwrap();
    // Halfway through the window the layer has moved half the width.
    assert_pixels_eq(&stack.render_frame(2), &single_pixel(4, 1, 2, 0, RED));

    stack
        .add_automation(0, AutomationAction::new(Effect::Invert, 5))
        .unwrap();
    // Any automation takes over, even one not active at this frame.
    assert_pixels_eq(&stack.render_frame(2), &single_pixel(4, 1, 0, 0, RED));
}

#[test]
fn test_hidden_group_hides_members() {
    let mut stack = PatternBuilder::new(1, 1)
        .track(TrackBuilder::new("bottom").pixels(0, vec![RED]).build())
        .track(TrackBuilder::new("top").pixels(0, vec![GREEN]).build())
        .build();
    let group = stack.create_group("fx");
    stack.add_to_group(1, group).unwrap();
    assert_pixels_eq(&stack.render_frame(0), &[GREEN]);

    stack.set_group_visible(group, false).unwrap();
    assert_pixels_eq(&stack.render_frame(0), &[RED]);

    // Group opacity is not applied by the compositor.
    stack.set_group_visible(group, true).unwrap();
    stack.set_group_opacity(group, 0.1).unwrap();
    assert_pixels_eq(&stack.render_frame(0), &[GREEN]);
}

#[test]
fn test_masks_do_not_affect_render() {
    let mut stack = PatternBuilder::new(2, 1)
        .track(TrackBuilder::new("t").pixels(0, vec![RED, RED]).build())
        .build();
    stack.set_mask(0, 0, &[0.0, 0.5]).unwrap();
    assert_pixels_eq(&stack.render_frame(0), &[RED, RED]);
    let frame = stack.track(0).unwrap().get_frame(0).unwrap();
    assert_eq!(frame.apply_mask(2, 1), vec![B, Rgb::new(127, 0, 0)]);
}

#[test]
fn test_parallel_render_matches_sequential() {
    let mut track = TrackBuilder::new("t")
        .automation(AutomationAction::new(scroll_right(1), 0))
        .automation(AutomationAction::new(Effect::Invert, 3));
    for frame in 0..8 {
        track = track.pixels(frame, gradient(4, 4));
    }
    let stack = PatternBuilder::new(4, 4).frames(8).track(track.build()).build();
    let parallel = stack.render_frames(0..8);
    assert_eq!(parallel.len(), 8);
    for (frame, buffer) in parallel.iter().enumerate() {
        assert_pixels_eq(buffer, &stack.render_frame(frame));
    }
    assert!(!stack.context().is_rendering());
}

#[test]
fn test_render_does_not_mutate_layers() {
    let stack = PatternBuilder::new(2, 2)
        .frames(2)
        .track(
            TrackBuilder::new("t")
                .pixels(1, gradient(2, 2))
                .automation(AutomationAction::new(scroll_right(1), 0))
                .build(),
        )
        .build();
    let before = stack.snapshot();
    stack.render_frame(1);
    assert_eq!(stack.snapshot(), before);
}
