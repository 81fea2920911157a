use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::json;
use slipstream_core::Observable;

use crate::{DataCallback, DataSource, Id, Value};

fn numbered_source(count: usize) -> DataSource {
    DataSource::with_items(count, |id: Id, cb: DataCallback| {
        cb(json!({ "n": id.get() }))
    })
}

#[test]
fn leaf_counts() {
    let source = numbered_source(10);
    assert_eq!(source.items_count(), 10);
    assert_eq!(source.global_count(), 10);
    assert_eq!(source.count(0, false), 10);
}

#[test]
fn nested_counts_follow_lookup_level() {
    let root = numbered_source(2);
    let a = numbered_source(3);
    let b = numbered_source(4);
    root.add_subcategory(a);
    root.add_subcategory(b);

    assert_eq!(root.global_count(), 9);
    // Level 0 ignores descendants' items.
    assert_eq!(root.count(0, false), 2);
    assert_eq!(root.count(1, false), 9);
    // Category roots occupy a slot each when requested.
    assert_eq!(root.count(1, true), 11);
}

#[test]
fn get_item_walks_the_tree() {
    let root = numbered_source(2);
    let a = DataSource::with_items(3, |id, cb| cb(json!({ "a": id.get() })));
    root.add_subcategory(a);

    // Flattening visits subcategories before own items.
    let got = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    root.get_item_data_at(
        Box::new(move |v| *got2.borrow_mut() = Some(v)),
        Id(1),
        1,
        false,
    );
    assert_eq!(*got.borrow(), Some(json!({ "a": 1 })));
}

#[test]
fn slice_joins_segments_across_categories() {
    let root = DataSource::new();
    let a = DataSource::with_items(3, |id, cb| cb(json!(format!("a{}", id.get()))));
    let b = DataSource::with_items(3, |id, cb| cb(json!(format!("b{}", id.get()))));
    root.add_subcategory(a);
    root.add_subcategory(b);

    let got: Rc<RefCell<Option<BTreeMap<Id, Value>>>> = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    let requested = root.get_slice_data(
        Box::new(move |map| *got2.borrow_mut() = Some(map)),
        Id(1),
        4,
        1,
        false,
    );
    assert_eq!(requested, 4);

    let map = got.borrow().clone().expect("slice must complete");
    let keys: Vec<u64> = map.keys().map(|k| k.get()).collect();
    assert_eq!(keys, vec![1, 2, 3, 4]);
    assert_eq!(map[&Id(1)], json!("a1"));
    assert_eq!(map[&Id(3)], json!("b0"));
}

#[test]
fn slice_with_subcat_slots_serves_self() {
    let root = DataSource::new();
    let a = DataSource::with_items(2, |id, cb| cb(json!(id.get())));
    a.set_data(Some(json!("category-a")));
    root.add_subcategory(a);

    let got: Rc<RefCell<Option<BTreeMap<Id, Value>>>> = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    root.get_slice_data(
        Box::new(move |map| *got2.borrow_mut() = Some(map)),
        Id(0),
        3,
        1,
        true,
    );

    let map = got.borrow().clone().expect("slice must complete");
    assert_eq!(map[&Id(0)], json!("category-a"));
    assert_eq!(map[&Id(1)], json!(0));
    assert_eq!(map[&Id(2)], json!(1));
}

#[test]
fn batch_callback_preferred_over_item_joins() {
    let batch_calls = Rc::new(RefCell::new(0));
    let batch_calls2 = batch_calls.clone();

    let source = numbered_source(10);
    source.set_batch_callback(move |first, size, cb| {
        *batch_calls2.borrow_mut() += 1;
        let map = (first..first + size as u64)
            .map(|i| (Id(i), json!(i)))
            .collect();
        cb(map);
    });

    let got: Rc<RefCell<Option<BTreeMap<Id, Value>>>> = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    source.get_slice_data(
        Box::new(move |map| *got2.borrow_mut() = Some(map)),
        Id(2),
        4,
        0,
        false,
    );

    assert_eq!(*batch_calls.borrow(), 1);
    let map = got.borrow().clone().unwrap();
    assert_eq!(map.len(), 4);
    assert_eq!(map[&Id(5)], json!(5));
}

#[test]
fn deferred_responses_deliver_exactly_once_after_all_arrive() {
    type Pending = Rc<RefCell<Vec<(Id, DataCallback)>>>;
    let pending: Pending = Rc::new(RefCell::new(Vec::new()));

    let pending2 = pending.clone();
    let source = DataSource::with_items(4, move |id, cb| {
        pending2.borrow_mut().push((id, cb));
    });

    let deliveries = Rc::new(RefCell::new(0));
    let deliveries2 = deliveries.clone();
    source.get_slice_data(
        Box::new(move |map| {
            assert_eq!(map.len(), 3);
            *deliveries2.borrow_mut() += 1;
        }),
        Id(0),
        3,
        0,
        false,
    );

    // Answer out of order; nothing fires until the last one.
    let mut held = std::mem::take(&mut *pending.borrow_mut());
    held.reverse();
    for (id, cb) in held {
        assert_eq!(*deliveries.borrow(), 0, "partial slices must not fire");
        cb(json!(id.get()));
    }
    assert_eq!(*deliveries.borrow(), 1);
}

#[test]
fn array_responses_unwrap_first_element() {
    let source = DataSource::with_items(1, |_, cb| cb(json!(["only", "extra"])));
    let got = Rc::new(RefCell::new(None));
    let got2 = got.clone();
    source.get_slice_data(
        Box::new(move |map| *got2.borrow_mut() = Some(map[&Id(0)].clone())),
        Id(0),
        1,
        0,
        false,
    );
    assert_eq!(*got.borrow(), Some(json!("only")));
}

#[test]
fn category_bounds_snap_outward() {
    let root = DataSource::new();
    for len in [5usize, 5, 5] {
        root.add_subcategory(numbered_source(len));
    }

    // [7, 3) lies inside the second category; bounds widen to [5, 10).
    let mut first = Id(7);
    let mut count = 3usize;
    root.set_category_bounds(&mut first, &mut count, 1, false);
    assert_eq!(first, Id(5));
    assert_eq!(count, 5);
}

#[test]
fn category_bounds_on_flat_source_cover_everything() {
    let source = numbered_source(12);
    let mut first = Id(4);
    let mut count = 2usize;
    source.set_category_bounds(&mut first, &mut count, 0, false);
    assert_eq!(first, Id(0));
    assert_eq!(count, 12);
}

#[test]
fn item_category_resolution() {
    let root = numbered_source(2);
    let a = numbered_source(3);
    root.add_subcategory(a.clone());

    let (cat, is_root) = root.get_item_category(Id(1), 1, false);
    assert!(cat == a && !is_root);

    let (cat, is_root) = root.get_item_category(Id(0), 1, true);
    assert!(cat == a && is_root);

    // Past the subcategory: root's own items.
    let (cat, is_root) = root.get_item_category(Id(3), 1, false);
    assert!(cat == root && !is_root);
}

#[test]
fn remove_item_shrinks_owner_and_dirties() {
    let root = numbered_source(0);
    let a = numbered_source(3);
    root.add_subcategory(a.clone());
    root.subscription().check();

    root.remove_item(Id(1), 1, false);
    assert_eq!(a.items_count(), 2);
    assert_eq!(root.count(1, false), 2);
    assert!(root.subscription().check());
}

#[test]
fn mutations_mark_subscription_dirty() {
    let source = numbered_source(1);
    source.subscription().check();

    source.set_childs_count(5);
    assert!(source.subscription().check());

    source.add_subcategory(numbered_source(1));
    assert!(source.subscription().check());

    source.set_data(Some(json!(1)));
    assert!(source.subscription().check());
}
