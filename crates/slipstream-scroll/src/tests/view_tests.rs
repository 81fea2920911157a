use std::cell::RefCell;
use std::rc::Rc;

use slipstream_geometry::{Axis, Padding, Size, Vec2};
use slipstream_node::{GestureEvent, GesturePhase, NodeTree, Swipe, Wheel};

use crate::{ItemNode, Movement, ScrollController, ScrollView};

const DT: f32 = 0.016;

fn make_view(rows: usize, row_height: f32) -> ScrollView {
    let mut view = ScrollView::new(Axis::Vertical, Size::new(320.0, 400.0));
    let mut controller = ScrollController::new(Axis::Vertical);
    for _ in 0..rows {
        controller.add_item_to_end(
            Box::new(|_, tree: &mut NodeTree| Some(ItemNode::plain(tree.create()))),
            row_height,
        );
    }
    view.set_controller(Some(controller));
    view.on_scroll_position(true);
    view
}

fn swipe_end(velocity_y: f32) -> GestureEvent {
    GestureEvent::Swipe(
        GesturePhase::Ended,
        Swipe {
            velocity: Vec2::new(0.0, velocity_y),
            ..Swipe::default()
        },
    )
}

fn settle(view: &mut ScrollView, ticks: usize) {
    for _ in 0..ticks {
        view.tick(DT);
    }
}

#[test]
fn bounds_follow_content_and_viewport() {
    let view = make_view(10, 100.0);
    assert_eq!(view.scroll_min(), Some(0.0));
    assert_eq!(view.scroll_max(), Some(600.0));
    assert_eq!(view.scroll_length(), Some(1000.0));
}

#[test]
fn padding_expands_bounds() {
    let mut view = make_view(10, 100.0);
    view.set_padding(Padding::new(20.0, 0.0, 30.0, 0.0));
    view.on_scroll_position(true);
    assert_eq!(view.scroll_min(), Some(-20.0));
    // 0 + (1000 + 50) - 400 - 20.
    assert_eq!(view.scroll_max(), Some(630.0));
}

#[test]
fn delta_is_linear_in_the_interior() {
    let mut a = make_view(10, 100.0);
    let mut b = make_view(10, 100.0);
    a.set_scroll_position(100.0);
    b.set_scroll_position(100.0);

    a.on_delta(37.0);
    a.on_delta(13.0);
    b.on_delta(50.0);
    assert_eq!(a.scroll_position(), b.scroll_position());
}

#[test]
fn non_bounce_overscroll_clamps_and_reports() {
    let mut view = make_view(10, 100.0);
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();
    view.set_overscroll_callback(move |delta| sink.borrow_mut().push(delta));

    view.on_delta(-50.0);
    assert_eq!(view.scroll_position(), 0.0);
    assert_eq!(reported.borrow().as_slice(), &[-50.0]);
}

#[test]
fn bounce_compresses_past_the_boundary() {
    let mut view = make_view(10, 100.0);
    view.set_bounce(true);

    // d = 10 past min: modifier 1 / (1 + 10/5) = 1/3.
    view.on_delta(-10.0);
    let pos = view.scroll_position();
    assert!((pos - (-10.0 / 3.0)).abs() < 1e-3);
    assert!(pos > -10.0);
}

#[test]
fn nan_delta_is_discarded() {
    let mut view = make_view(10, 100.0);
    view.set_scroll_position(42.0);
    view.on_delta(f32::NAN);
    assert_eq!(view.scroll_position(), 42.0);
}

#[test]
fn momentum_rests_at_projected_position() {
    // Range 0..1000, viewport 400, v = 800, a = 5000: rest = 64.
    let mut view = make_view(10, 100.0);
    assert!(view.handle_gesture(swipe_end(800.0)));
    assert_eq!(view.movement(), Movement::Auto);

    settle(&mut view, 40);
    assert!((view.scroll_position() - 64.0).abs() < 0.1);
    assert_eq!(view.movement(), Movement::None);
}

#[test]
fn momentum_with_bounce_overshoots_and_settles_on_boundary() {
    // Content 500, viewport 400: bounds 0..100. From 50 at v = 2000
    // the leg reaches 100 with residual speed, bounces past, returns.
    let mut view = make_view(5, 100.0);
    view.set_bounce(true);
    view.set_scroll_position(50.0);

    assert!(view.handle_gesture(swipe_end(2000.0)));

    let mut max_pos = f32::MIN;
    for _ in 0..80 {
        view.tick(DT);
        max_pos = max_pos.max(view.scroll_position());
    }
    assert!(max_pos > 100.0, "no overshoot, peaked at {max_pos}");
    assert_eq!(view.scroll_position(), 100.0);
    assert_eq!(view.movement(), Movement::None);
}

#[test]
fn momentum_without_bounce_reports_residual_overscroll() {
    let mut view = make_view(5, 100.0);
    view.set_scroll_position(50.0);
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();
    view.set_overscroll_callback(move |delta| sink.borrow_mut().push(delta));

    view.handle_gesture(swipe_end(2000.0));
    settle(&mut view, 80);

    // Path = 400, travelled = 50: the indicator hears the rest.
    assert_eq!(view.scroll_position(), 100.0);
    assert_eq!(view.movement(), Movement::None);
    let total: f32 = reported.borrow().iter().sum();
    assert!((total - 350.0).abs() < 1.0);
}

#[test]
fn short_paths_snap() {
    let mut view = make_view(10, 100.0);
    view.handle_gesture(swipe_end(50.0));
    // Path = 50^2 / 10000 = 0.25 < 2: no animation.
    assert_eq!(view.movement(), Movement::None);
    assert!((view.scroll_position() - 0.25).abs() < 1e-3);
}

#[test]
fn wheel_scrolls_one_notch() {
    let mut view = make_view(10, 100.0);
    view.handle_gesture(GestureEvent::Wheel(Wheel {
        amount: Vec2::new(0.0, 1.0),
        ..Wheel::default()
    }));
    assert_eq!(view.scroll_position(), 100.0);
    assert_eq!(view.movement(), Movement::None);
}

#[test]
fn orthogonal_swipes_pass_through() {
    let mut view = make_view(10, 100.0);
    let consumed = view.handle_gesture(GestureEvent::Swipe(
        GesturePhase::Began,
        Swipe {
            delta: Vec2::new(10.0, 4.0),
            ..Swipe::default()
        },
    ));
    assert!(!consumed);
    assert_eq!(view.movement(), Movement::None);
}

#[test]
fn manual_swipe_moves_content() {
    let mut view = make_view(10, 100.0);
    assert!(view.handle_gesture(GestureEvent::Swipe(
        GesturePhase::Began,
        Swipe {
            delta: Vec2::new(0.0, 30.0),
            ..Swipe::default()
        },
    )));
    assert_eq!(view.movement(), Movement::Manual);
    assert_eq!(view.scroll_position(), 30.0);

    view.handle_gesture(GestureEvent::Swipe(
        GesturePhase::Activated,
        Swipe {
            delta: Vec2::new(0.0, 20.0),
            ..Swipe::default()
        },
    ));
    assert_eq!(view.scroll_position(), 50.0);
}

#[test]
fn scroll_filter_shapes_manual_deltas() {
    let mut view = make_view(10, 100.0);
    view.set_scroll_filter(|delta| delta * 0.5);
    view.handle_gesture(GestureEvent::Swipe(
        GesturePhase::Began,
        Swipe {
            delta: Vec2::new(0.0, 30.0),
            ..Swipe::default()
        },
    ));
    assert_eq!(view.scroll_position(), 15.0);
}

#[test]
fn press_aborts_momentum() {
    let mut view = make_view(10, 100.0);
    view.handle_gesture(swipe_end(800.0));
    assert_eq!(view.movement(), Movement::Auto);

    view.handle_gesture(GestureEvent::Press(
        GesturePhase::Began,
        slipstream_node::Press::default(),
    ));
    assert_eq!(view.movement(), Movement::None);

    view.tick(DT);
    let frozen = view.scroll_position();
    settle(&mut view, 10);
    assert_eq!(view.scroll_position(), frozen);
}

#[test]
fn disabled_view_ignores_gestures() {
    let mut view = make_view(10, 100.0);
    view.set_enabled(false);
    assert!(!view.handle_gesture(swipe_end(800.0)));
    assert_eq!(view.movement(), Movement::None);
}

#[test]
fn relative_position_defers_until_bounds_exist() {
    let mut view = ScrollView::new(Axis::Vertical, Size::new(320.0, 400.0));
    view.set_scroll_relative_position(0.5);
    assert_eq!(view.scroll_position(), 0.0);
    assert_eq!(view.scroll_relative_position(), 0.5);

    let mut controller = ScrollController::new(Axis::Vertical);
    for _ in 0..10 {
        controller.add_item_to_end(
            Box::new(|_, tree: &mut NodeTree| Some(ItemNode::plain(tree.create()))),
            100.0,
        );
    }
    view.set_controller(Some(controller));
    view.on_scroll_position(true);

    // live = 1000 - 400: half-way is 300.
    assert!((view.scroll_position() - 300.0).abs() < 1e-3);
    assert!((view.scroll_relative_position() - 0.5).abs() < 1e-3);
}

#[test]
fn relative_round_trip_once_bounds_known() {
    let mut view = make_view(10, 100.0);
    view.set_scroll_relative_position(0.25);
    let saved = view.scroll_relative_position();

    let mut other = make_view(10, 100.0);
    other.set_scroll_relative_position(saved);
    assert_eq!(view.scroll_position(), other.scroll_position());
}

#[test]
fn seek_relative_value_rebuilds_window() {
    let mut view = make_view(20, 100.0);
    view.on_scroll_position(true);
    view.set_scroll_relative_value(1.0);
    view.tick(DT);

    assert_eq!(view.scroll_position(), 1600.0);
    let controller = view.controller().unwrap();
    // Only the tail is resident after the jump.
    let residents: Vec<usize> = controller
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| item.node.is_some())
        .map(|(i, _)| i)
        .collect();
    assert!(residents.contains(&19));
    assert!(!residents.contains(&0));
}

#[test]
fn idle_position_is_clamped_into_bounds() {
    let mut view = make_view(10, 100.0);
    view.set_scroll_position(900.0);
    view.update_scroll_bounds();
    assert_eq!(view.scroll_position(), 600.0);
}

#[test]
fn momentum_seeds_animation_padding() {
    let mut view = make_view(10, 100.0);
    view.handle_gesture(swipe_end(800.0));
    let padding = view.controller().unwrap().animation_padding();
    assert!((padding - 64.0).abs() < 1e-3);

    settle(&mut view, 40);
    // Consumed displacement decays the hint away.
    assert!(view.controller().unwrap().animation_padding().abs() < 0.5);
}
