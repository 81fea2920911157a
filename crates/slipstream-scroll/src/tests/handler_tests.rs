use std::collections::BTreeMap;

use serde_json::json;
use slipstream_data::Id;
use slipstream_geometry::{Axis, Padding, Size, Vec2};

use crate::{
    DataMap, FixedLayout, GridLayout, HandlerContext, Request, SliceHandler, SliceItem,
    SliceLayout,
};

fn ctx() -> HandlerContext {
    HandlerContext {
        axis: Axis::Vertical,
        viewport: Size::new(320.0, 400.0),
        padding: Padding::default(),
        origin_front: Vec2::new(0.0, 1000.0),
        origin_back: Vec2::new(0.0, 2000.0),
    }
}

fn data(range: std::ops::Range<u64>) -> DataMap {
    range.map(|i| (Id(i), json!(i))).collect()
}

#[test]
fn fixed_layout_positions_by_id() {
    let mut handler = FixedLayout::new(ctx(), 50.0);
    let items = handler.run(Request::Reset, data(10..13));

    assert_eq!(items[&Id(10)].position.y, 500.0);
    assert_eq!(items[&Id(12)].position.y, 600.0);
    for item in items.values() {
        assert_eq!(item.size, Size::new(320.0, 50.0));
    }
}

#[test]
fn slice_layout_stacks_forward_from_origin() {
    let sizes = [30.0f32, 50.0, 20.0];
    let mut handler = SliceLayout::new(
        ctx(),
        Box::new(move |value, _origin| {
            let id = value.as_u64().unwrap() as usize;
            SliceItem::new(value, Vec2::ZERO, Size::new(320.0, sizes[id]))
        }),
    );

    let items = handler.run(Request::Reset, data(0..3));
    assert_eq!(items[&Id(0)].position.y, 0.0);
    assert_eq!(items[&Id(1)].position.y, 30.0);
    assert_eq!(items[&Id(2)].position.y, 80.0);
}

#[test]
fn slice_layout_back_continues_from_origin_back() {
    let mut handler = SliceLayout::new(
        ctx(),
        Box::new(|value, _| SliceItem::new(value, Vec2::ZERO, Size::new(320.0, 40.0))),
    );
    let items = handler.run(Request::Back, data(5..7));
    assert_eq!(items[&Id(5)].position.y, 2000.0);
    assert_eq!(items[&Id(6)].position.y, 2040.0);
}

#[test]
fn slice_layout_front_stacks_backward() {
    let mut handler = SliceLayout::new(
        ctx(),
        Box::new(|value, _| SliceItem::new(value, Vec2::ZERO, Size::new(320.0, 40.0))),
    );
    let items = handler.run(Request::Front, data(3..5));

    // Stacked backward from the front origin: the later id sits
    // directly above it, the earlier one above that.
    assert_eq!(items[&Id(4)].position.y, 960.0);
    assert_eq!(items[&Id(3)].position.y, 920.0);
}

#[test]
fn grid_layout_fills_columns_then_rows() {
    // 320 / 100 -> 3 columns of 106.67 wide.
    let mut handler = GridLayout::new(ctx(), 100.0, 1.0);
    let items = handler.run(Request::Reset, data(0..7));

    let cell = items[&Id(0)].size;
    assert!((cell.width - 320.0 / 3.0).abs() < 1e-3);
    assert_eq!(cell.width, cell.height);

    assert_eq!(items[&Id(0)].position.y, 0.0);
    assert_eq!(items[&Id(2)].position.y, 0.0);
    assert!(items[&Id(3)].position.y > 0.0);
    assert_eq!(items[&Id(3)].position.x, items[&Id(0)].position.x);
    // Second column offset.
    assert!(items[&Id(1)].position.x > items[&Id(0)].position.x);
}

#[test]
fn grid_layout_never_drops_below_one_column() {
    let narrow = HandlerContext {
        viewport: Size::new(80.0, 400.0),
        ..ctx()
    };
    let mut handler = GridLayout::new(narrow, 100.0, 1.0);
    let items = handler.run(Request::Reset, data(0..2));
    assert_eq!(items[&Id(0)].position.x, items[&Id(1)].position.x);
    assert!(items[&Id(1)].position.y > items[&Id(0)].position.y);
}

#[test]
fn empty_data_yields_empty_map() {
    let mut handler = FixedLayout::new(ctx(), 50.0);
    let items = handler.run(Request::Update, BTreeMap::new());
    assert!(items.is_empty());
}
