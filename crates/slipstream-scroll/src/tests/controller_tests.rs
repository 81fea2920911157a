use slipstream_geometry::{Axis, Size, Vec2};
use slipstream_node::NodeTree;

use crate::{ItemFactory, ItemNode, NodeHost, ScrollController, ScrollItemHandle};

fn plain_factory() -> ItemFactory {
    Box::new(|_, tree: &mut NodeTree| Some(ItemNode::plain(tree.create())))
}

fn sized_factory(natural: f32) -> ItemFactory {
    Box::new(move |_, tree: &mut NodeTree| {
        let node = tree.create();
        tree.set_content_size(node, Size::new(300.0, natural));
        tree.take_content_size_dirty(node);
        Some(ItemNode::plain(node))
    })
}

struct Fixture {
    tree: NodeTree,
    root: slipstream_node::NodeId,
    controller: ScrollController,
}

impl Fixture {
    fn new() -> Self {
        let mut tree = NodeTree::new();
        let root = tree.create();
        tree.set_content_size(root, Size::new(320.0, 0.0));
        tree.take_content_size_dirty(root);
        Self {
            tree,
            root,
            controller: ScrollController::new(Axis::Vertical),
        }
    }

    fn add_rows(&mut self, count: usize, height: f32) {
        for _ in 0..count {
            self.controller.add_item_to_end(plain_factory(), height);
        }
    }

    fn pass(&mut self, position: f32, size: f32) {
        let mut host = NodeHost {
            tree: &mut self.tree,
            axis: Axis::Vertical,
            root: self.root,
        };
        self.controller.pass(&mut host, position, size);
    }

    fn resident_indices(&self) -> Vec<usize> {
        self.controller
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.node.is_some())
            .map(|(i, _)| i)
            .collect()
    }
}

#[test]
fn auto_positions_accumulate() {
    let mut fx = Fixture::new();
    fx.add_rows(3, 100.0);
    let items = fx.controller.items();
    assert_eq!(items[0].position.y, 0.0);
    assert_eq!(items[1].position.y, 100.0);
    assert_eq!(items[2].position.y, 200.0);
    assert_eq!(fx.controller.next_item_position(), 300.0);
}

#[test]
fn resident_set_matches_window() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.pass(0.0, 400.0);

    // Window is [-8, 416): rows 0..=4 intersect.
    assert_eq!(fx.resident_indices(), vec![0, 1, 2, 3, 4]);

    // Every resident item overlaps the window; every non-resident
    // item lies outside it.
    for (i, item) in fx.controller.items().iter().enumerate() {
        let start = item.position.y;
        let end = start + item.size.height;
        let inside = end > -8.0 && start < 416.0;
        assert_eq!(item.node.is_some(), inside, "item {i}");
    }
}

#[test]
fn scrolling_recycles_nodes() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.pass(0.0, 400.0);
    fx.pass(500.0, 400.0);

    // Window [492, 916): rows 4..=9.
    assert_eq!(fx.resident_indices(), vec![4, 5, 6, 7, 8, 9]);
    assert!(fx.controller.items()[0].node.is_none());
}

#[test]
fn force_pass_is_idempotent() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.pass(200.0, 400.0);

    let before: Vec<_> = fx
        .controller
        .items()
        .iter()
        .map(|item| (item.position, item.size, item.node))
        .collect();
    fx.pass(200.0, 400.0);
    let after: Vec<_> = fx
        .controller
        .items()
        .iter()
        .map(|item| (item.position, item.size, item.node))
        .collect();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b, a);
    }
}

#[test]
fn adjacency_is_preserved() {
    let mut fx = Fixture::new();
    fx.add_rows(8, 50.0);
    fx.pass(0.0, 400.0);

    let items = fx.controller.items();
    for pair in items.windows(2) {
        let end = pair[0].position.y + pair[0].size.height;
        assert!((end - pair[1].position.y).abs() < 1e-3);
    }
}

#[test]
fn resize_forward_shifts_following_items_only() {
    let mut fx = Fixture::new();
    fx.add_rows(5, 100.0);
    let before: Vec<f32> = fx
        .controller
        .items()
        .iter()
        .map(|item| item.position.y)
        .collect();

    let mut host = NodeHost {
        tree: &mut fx.tree,
        axis: Axis::Vertical,
        root: fx.root,
    };
    fx.controller.resize_item(2, 160.0, true, &mut host);

    let items = fx.controller.items();
    assert_eq!(items[2].size.height, 160.0);
    assert_eq!(items[2].position.y, before[2]);
    for i in 0..2 {
        assert_eq!(items[i].position.y, before[i]);
    }
    for i in 3..5 {
        assert_eq!(items[i].position.y, before[i] + 60.0);
    }
}

#[test]
fn resize_backward_shifts_item_and_preceding() {
    let mut fx = Fixture::new();
    fx.add_rows(5, 100.0);
    let before: Vec<f32> = fx
        .controller
        .items()
        .iter()
        .map(|item| item.position.y)
        .collect();

    let mut host = NodeHost {
        tree: &mut fx.tree,
        axis: Axis::Vertical,
        root: fx.root,
    };
    fx.controller.resize_item(2, 160.0, false, &mut host);

    let items = fx.controller.items();
    assert_eq!(items[2].size.height, 160.0);
    assert_eq!(items[2].position.y, before[2] - 60.0);
    for i in 0..2 {
        assert_eq!(items[i].position.y, before[i] - 60.0);
    }
    for i in 3..5 {
        assert_eq!(items[i].position.y, before[i]);
    }
}

#[test]
fn natural_size_triggers_resize_on_materialize() {
    let mut fx = Fixture::new();
    // Registered at 100, natural size 150.
    fx.controller.add_item(sized_factory(150.0), 100.0, 0.0);
    fx.controller.add_item(plain_factory(), 100.0, 100.0);
    fx.pass(0.0, 400.0);

    let items = fx.controller.items();
    assert_eq!(items[0].size.height, 150.0);
    assert_eq!(items[1].position.y, 150.0);
}

#[test]
fn animation_padding_extends_window_forward() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.controller.set_animation_padding(200.0);
    fx.pass(0.0, 400.0);

    // Window [-8, 616): rows 0..=6.
    assert_eq!(fx.resident_indices(), vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn animation_padding_extends_window_backward() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.controller.set_animation_padding(-200.0);
    fx.pass(500.0, 400.0);

    // Window [292, 916): rows 2..=9.
    assert_eq!(fx.resident_indices(), vec![2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn animation_padding_decays_and_zeroes_on_sign_flip() {
    let mut fx = Fixture::new();
    fx.controller.set_animation_padding(100.0);
    fx.controller.update_animation_padding(30.0);
    assert_eq!(fx.controller.animation_padding(), 70.0);
    fx.controller.update_animation_padding(80.0);
    assert_eq!(fx.controller.animation_padding(), 0.0);
}

#[test]
fn keep_nodes_hides_instead_of_destroying() {
    let mut tree = NodeTree::new();
    let root = tree.create();
    tree.set_content_size(root, Size::new(320.0, 0.0));
    let mut controller = ScrollController::new_keeping_nodes(Axis::Vertical);
    for _ in 0..10 {
        controller.add_item_to_end(plain_factory(), 100.0);
    }

    let mut host = NodeHost {
        tree: &mut tree,
        axis: Axis::Vertical,
        root,
    };
    controller.pass(&mut host, 0.0, 400.0);
    let first = controller.items()[0].node.unwrap();

    let mut host = NodeHost {
        tree: &mut tree,
        axis: Axis::Vertical,
        root,
    };
    controller.pass(&mut host, 600.0, 400.0);

    // The node survives eviction, hidden.
    assert_eq!(controller.items()[0].node, Some(first));
    assert!(tree.is_alive(first));
    assert!(!tree.is_visible(first));
}

#[test]
fn compute_area_spans_all_items() {
    let mut fx = Fixture::new();
    assert_eq!(fx.controller.compute_area(), None);
    fx.add_rows(10, 100.0);
    assert_eq!(fx.controller.compute_area(), Some((0.0, 1000.0)));
}

#[test]
fn clear_detaches_nodes() {
    let mut fx = Fixture::new();
    fx.add_rows(5, 100.0);
    fx.pass(0.0, 400.0);
    let nodes = fx.controller.resident_nodes();
    assert!(!nodes.is_empty());

    let mut tree = std::mem::take(&mut fx.tree);
    fx.controller.clear(&mut tree);
    assert!(fx.controller.is_empty());
    for node in nodes {
        assert!(!tree.is_alive(node));
    }
}

#[test]
fn handle_notifications_and_lookup() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let events: Rc<RefCell<Vec<(&'static str, usize)>>> = Rc::new(RefCell::new(Vec::new()));

    let mut fx = Fixture::new();
    let ev = events.clone();
    fx.controller.add_item_at(
        Box::new(move |_, tree: &mut NodeTree| {
            let handle = ScrollItemHandle::new();
            let insert_ev = ev.clone();
            handle.set_insert_callback(move |_, index| {
                insert_ev.borrow_mut().push(("insert", index));
            });
            let remove_ev = ev.clone();
            handle.set_remove_callback(move |_, index| {
                remove_ev.borrow_mut().push(("remove", index));
            });
            Some(ItemNode {
                node: tree.create(),
                handle: Some(handle),
            })
        }),
        Size::new(f32::NAN, 100.0),
        Vec2::ZERO,
        0,
        Some("first".into()),
    );
    fx.add_rows(9, 100.0);

    fx.pass(0.0, 400.0);
    assert_eq!(events.borrow().as_slice(), &[("insert", 0)]);
    assert!(fx.controller.get_item_by_name("first").is_some());

    fx.pass(700.0, 400.0);
    assert_eq!(
        events.borrow().as_slice(),
        &[("insert", 0), ("remove", 0)]
    );
    assert!(fx.controller.get_item_by_name("first").is_none());
}

#[test]
fn front_and_back_nodes() {
    let mut fx = Fixture::new();
    fx.add_rows(10, 100.0);
    fx.pass(300.0, 400.0);

    let front = fx.controller.front_node().unwrap();
    let back = fx.controller.back_node().unwrap();
    let front_index = fx.controller.item_index_by_node(front).unwrap();
    let back_index = fx.controller.item_index_by_node(back).unwrap();
    assert!(front_index < back_index);
    assert_eq!(fx.resident_indices().first(), Some(&front_index));
    assert_eq!(fx.resident_indices().last(), Some(&back_index));
}

#[test]
fn factory_returning_none_leaves_slot_reserved() {
    let mut fx = Fixture::new();
    let mut attempts = 0;
    // Refuses twice, then produces.
    fx.controller.add_item(
        Box::new(move |_, tree: &mut NodeTree| {
            attempts += 1;
            if attempts < 3 {
                None
            } else {
                Some(ItemNode::plain(tree.create()))
            }
        }),
        100.0,
        0.0,
    );

    fx.pass(0.0, 400.0);
    assert!(fx.controller.items()[0].node.is_none());
    fx.pass(0.0, 400.0);
    assert!(fx.controller.items()[0].node.is_none());
    fx.pass(0.0, 400.0);
    assert!(fx.controller.items()[0].node.is_some());
}
