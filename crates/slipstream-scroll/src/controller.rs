//! The scroll controller: an ordered placement registry.
//!
//! Items are `(factory, size, position, z, name)` records; the
//! controller materialises nodes for items intersecting the virtual
//! window and recycles them on exit. Positions are monotone along the
//! scroll axis; resizing an item shifts one side of the list to keep
//! neighbours gap- and overlap-free.

use slipstream_geometry::{Axis, Size, Vec2};
use slipstream_node::{NodeId, NodeTree};

use crate::ScrollItemHandle;

/// Slack added on both sides of the viewport when computing the live
/// window, in logical units.
const WINDOW_SLACK: f32 = 8.0;

/// A freshly produced node, optionally carrying an item handle.
pub struct ItemNode {
    pub node: NodeId,
    pub handle: Option<ScrollItemHandle>,
}

impl ItemNode {
    pub fn plain(node: NodeId) -> Self {
        Self { node, handle: None }
    }
}

/// Produces a live node for an item; invoked at most once per current
/// residency. Returning `None` leaves the slot reserved for a retry on
/// a later window pass.
pub type ItemFactory = Box<dyn FnMut(&Item, &mut NodeTree) -> Option<ItemNode>>;

pub struct Item {
    pub(crate) factory: ItemFactory,
    pub size: Size,
    pub position: Vec2,
    pub z_index: i32,
    pub name: Option<String>,
    pub node: Option<NodeId>,
    pub handle: Option<ScrollItemHandle>,
}

impl Item {
    fn new(factory: ItemFactory, size: Size, position: Vec2, z: i32, name: Option<String>) -> Self {
        Self {
            factory,
            size,
            position,
            z_index: z,
            name,
            node: None,
            handle: None,
        }
    }
}

/// Node-tree operations the controller performs on behalf of a view:
/// placing, updating and destroying scroll nodes under the root.
pub struct NodeHost<'a> {
    pub tree: &'a mut NodeTree,
    pub axis: Axis,
    pub root: NodeId,
}

impl NodeHost<'_> {
    /// NaN components mean "fill the root" on that dimension.
    fn resolve_size(&self, size: Size) -> Size {
        let root_size = self.tree.content_size(self.root);
        Size::new(
            if size.width.is_nan() {
                root_size.width
            } else {
                size.width
            },
            if size.height.is_nan() {
                root_size.height
            } else {
                size.height
            },
        )
    }

    pub fn update_scroll_node(&mut self, node: NodeId, pos: Vec2, size: Size, z: i32) {
        let parent = self.tree.parent(node);
        if parent.is_some() && parent != Some(self.root) {
            return;
        }
        let resolved = self.resolve_size(size);
        self.tree.set_content_size(node, resolved);
        self.tree.set_position(node, self.axis.node_position(pos));
        self.tree.set_anchor_point(node, self.axis.anchor_point());
        if z != 0 {
            self.tree.set_z_order(node, z);
        }
    }

    pub fn add_scroll_node(&mut self, node: NodeId, pos: Vec2, size: Size, z: i32) {
        self.update_scroll_node(node, pos, size, z);
        self.tree.add_child(self.root, node, z);
        self.tree.push_force_render(node);
    }

    pub fn remove_scroll_node(&mut self, node: NodeId) -> bool {
        if self.tree.parent(node) == Some(self.root) {
            self.tree.destroy(node);
            true
        } else {
            false
        }
    }
}

pub struct ScrollController {
    axis: Axis,
    items: Vec<Item>,
    keep_nodes: bool,
    info_dirty: bool,
    area: Option<(f32, f32)>,
    animation_padding: f32,
    window_begin: Option<f32>,
    window_end: Option<f32>,
    current_position: f32,
    current_size: f32,
}

impl ScrollController {
    pub fn new(axis: Axis) -> Self {
        Self::with_keep_nodes(axis, false)
    }

    /// Evicted nodes are hidden instead of destroyed. The mode is fixed
    /// at construction.
    pub fn new_keeping_nodes(axis: Axis) -> Self {
        Self::with_keep_nodes(axis, true)
    }

    fn with_keep_nodes(axis: Axis, keep_nodes: bool) -> Self {
        Self {
            axis,
            items: Vec::new(),
            keep_nodes,
            info_dirty: false,
            area: None,
            animation_padding: 0.0,
            window_begin: None,
            window_end: None,
            current_position: 0.0,
            current_size: 0.0,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_keep_nodes(&self) -> bool {
        self.keep_nodes
    }

    // ── item registry ────────────────────────────────────────────────

    pub fn add_item_at(
        &mut self,
        factory: ItemFactory,
        size: Size,
        position: Vec2,
        z: i32,
        name: Option<String>,
    ) -> usize {
        self.items.push(Item::new(factory, size, position, z, name));
        self.info_dirty = true;
        self.items.len() - 1
    }

    /// Adds an item by scroll-axis extent and offset; the passive axis
    /// fills the root.
    pub fn add_item(&mut self, factory: ItemFactory, main_size: f32, main_pos: f32) -> usize {
        let size = self.axis.size_for(main_size);
        let pos = self.axis.position_for(main_pos);
        self.add_item_at(factory, size, pos, 0, None)
    }

    /// Adds an item directly after the last one.
    pub fn add_item_to_end(&mut self, factory: ItemFactory, main_size: f32) -> usize {
        let pos = self.next_item_position();
        self.add_item(factory, main_size, pos)
    }

    /// A blank spacer occupying layout space.
    pub fn add_placeholder(&mut self, main_size: f32, main_pos: f32) -> usize {
        self.add_item(
            Box::new(|_, tree: &mut NodeTree| Some(ItemNode::plain(tree.create()))),
            main_size,
            main_pos,
        )
    }

    /// End of the last item on the scroll axis.
    pub fn next_item_position(&self) -> f32 {
        self.items
            .last()
            .map(|item| self.axis.main_pos(item.position) + self.axis.main_size(item.size))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get_item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Mutable access; assumes the caller changes placement.
    pub fn get_item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.info_dirty = true;
        self.items.get_mut(index)
    }

    pub fn get_item_by_node(&self, node: NodeId) -> Option<&Item> {
        self.items.iter().find(|item| item.node == Some(node))
    }

    pub fn get_item_by_name(&self, name: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|item| item.name.as_deref() == Some(name) && item.node.is_some())
    }

    pub fn item_index_by_node(&self, node: NodeId) -> Option<usize> {
        self.items.iter().position(|item| item.node == Some(node))
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.get_item_by_name(name).and_then(|item| item.node)
    }

    pub fn resident_nodes(&self) -> Vec<NodeId> {
        self.items.iter().filter_map(|item| item.node).collect()
    }

    /// The resident node nearest the front of the scroll range.
    pub fn front_node(&self) -> Option<NodeId> {
        self.items
            .iter()
            .filter(|item| item.node.is_some())
            .min_by(|a, b| {
                self.axis
                    .main_pos(a.position)
                    .total_cmp(&self.axis.main_pos(b.position))
            })
            .and_then(|item| item.node)
    }

    /// The resident node nearest the back of the scroll range.
    pub fn back_node(&self) -> Option<NodeId> {
        self.items
            .iter()
            .filter(|item| item.node.is_some())
            .max_by(|a, b| {
                let ea = self.axis.main_pos(a.position) + self.axis.main_size(a.size);
                let eb = self.axis.main_pos(b.position) + self.axis.main_size(b.size);
                ea.total_cmp(&eb)
            })
            .and_then(|item| item.node)
    }

    /// Removes every item and detaches live nodes.
    pub fn clear(&mut self, tree: &mut NodeTree) {
        for item in &mut self.items {
            if let Some(node) = item.node.take() {
                tree.destroy(node);
            }
            item.handle = None;
        }
        self.items.clear();
        self.current_size = 0.0;
        self.current_position = 0.0;
        self.area = None;
        self.info_dirty = true;
    }

    /// Destroys every live node but keeps the item registry; the next
    /// window pass re-materialises whatever is visible.
    pub fn detach_all(&mut self, tree: &mut NodeTree) {
        for item in &mut self.items {
            if let Some(node) = item.node.take() {
                tree.destroy(node);
            }
            item.handle = None;
        }
        self.info_dirty = true;
    }

    /// Removes a single entry by index, destroying its node.
    pub fn remove_item(&mut self, index: usize, tree: &mut NodeTree) {
        if index >= self.items.len() {
            return;
        }
        let mut item = self.items.remove(index);
        if let Some(node) = item.node.take() {
            tree.destroy(node);
        }
        self.info_dirty = true;
    }

    // ── scrollable area ──────────────────────────────────────────────

    /// Extent of all registered items on the scroll axis, or `None`
    /// while the controller is empty.
    pub fn compute_area(&self) -> Option<(f32, f32)> {
        let mut start: Option<f32> = None;
        let mut end: Option<f32> = None;
        for item in &self.items {
            let pos = self.axis.main_pos(item.position);
            let size = self.axis.main_size(item.size);
            start = Some(start.map_or(pos, |s| s.min(pos)));
            end = Some(end.map_or(pos + size, |e| e.max(pos + size)));
        }
        match (start, end) {
            (Some(start), Some(end)) => Some((start, end - start)),
            _ => None,
        }
    }

    pub(crate) fn publish_area(&mut self, area: Option<(f32, f32)>) {
        self.area = area;
    }

    pub fn scroll_min(&self) -> Option<f32> {
        self.area.map(|(start, _)| start)
    }

    pub fn scroll_max(&self) -> Option<f32> {
        self.area.map(|(start, size)| start + size)
    }

    pub fn is_info_dirty(&self) -> bool {
        self.info_dirty
    }

    pub fn mark_info_dirty(&mut self) {
        self.info_dirty = true;
    }

    pub(crate) fn clear_info_dirty(&mut self) {
        self.info_dirty = false;
    }

    /// The live window spanned by resident nodes after the last pass.
    pub fn window(&self) -> (Option<f32>, Option<f32>) {
        (self.window_begin, self.window_end)
    }

    // ── animation padding ────────────────────────────────────────────

    /// Expands the window in the direction of an active animation:
    /// positive values extend forward, negative backward.
    pub fn set_animation_padding(&mut self, padding: f32) {
        if self.animation_padding != padding {
            self.animation_padding = padding;
            self.info_dirty = true;
        }
    }

    pub fn drop_animation_padding(&mut self) {
        if self.animation_padding != 0.0 {
            self.animation_padding = 0.0;
            self.info_dirty = true;
        }
    }

    /// Decays the hint by consumed displacement, zeroing on sign flip.
    pub fn update_animation_padding(&mut self, consumed: f32) {
        if self.animation_padding != 0.0 {
            let remaining = self.animation_padding - consumed;
            if remaining * self.animation_padding <= 0.0 {
                self.animation_padding = 0.0;
            } else {
                self.animation_padding = remaining;
            }
            self.info_dirty = true;
        }
    }

    pub fn animation_padding(&self) -> f32 {
        self.animation_padding
    }

    // ── virtualisation ───────────────────────────────────────────────

    /// One window pass over all items at the given viewport.
    pub fn pass(&mut self, host: &mut NodeHost<'_>, orig_position: f32, orig_size: f32) {
        let mut position = orig_position - WINDOW_SLACK;
        let mut size = orig_size + 2.0 * WINDOW_SLACK;

        let padding = self.animation_padding;
        if padding > 0.0 {
            size += padding;
        } else if padding < 0.0 {
            position += padding;
            size -= padding;
        }

        let mut window_begin: Option<f32> = None;
        let mut window_end: Option<f32> = None;
        for item in &self.items {
            let pos = host.axis.main_pos(item.position);
            let len = host.axis.main_size(item.size);
            if pos + len > position && pos < position + size && item.node.is_some() {
                window_begin = Some(window_begin.map_or(pos, |b| b.min(pos)));
                window_end = Some(window_end.map_or(pos + len, |e| e.max(pos + len)));
            }
        }
        self.window_begin = window_begin;
        self.window_end = window_end;
        log::trace!(
            "window pass: [{position:.1}, {:.1}) over {} items",
            position + size,
            self.items.len()
        );

        for index in 0..self.items.len() {
            let pos = host.axis.main_pos(self.items[index].position);
            let len = host.axis.main_size(self.items[index].size);
            if pos + len <= position || pos >= position + size {
                let evict = match self.items[index].node {
                    Some(node) => !self.keep_nodes || host.tree.is_visible(node),
                    None => false,
                };
                if evict {
                    self.evict(index, host);
                }
            } else {
                self.materialize(index, pos, len, host);
            }
        }

        self.current_position = orig_position;
        self.current_size = orig_size;
    }

    fn materialize(&mut self, index: usize, pos: f32, len: f32, host: &mut NodeHost<'_>) {
        if self.items[index].node.is_none() {
            // Swap the factory out so it can inspect its own item.
            let mut factory = std::mem::replace(
                &mut self.items[index].factory,
                Box::new(|_, _| None),
            );
            let produced = factory(&self.items[index], host.tree);
            self.items[index].factory = factory;

            let Some(ItemNode { node, handle }) = produced else {
                return;
            };

            // Resizing pushes away from the current window midpoint.
            let mut forward = true;
            if let (Some(begin), Some(end)) = (self.window_begin, self.window_end) {
                let mid = (begin + end) / 2.0;
                if pos + len < mid {
                    forward = false;
                } else if pos > mid {
                    forward = true;
                }
            }

            if let Some(handle) = handle {
                let item = &self.items[index];
                host.update_scroll_node(node, item.position, item.size, item.z_index);
                handle.on_node_inserted(item, index);
                self.items[index].handle = Some(handle.clone());
                if let Some((new_size, fwd)) = handle.take_pending_resize() {
                    self.resize_item(index, new_size, fwd, host);
                }
            }

            let natural = host.axis.main_size(host.tree.content_size(node));
            if natural > 0.0 && natural != host.axis.main_size(self.items[index].size) {
                self.resize_item(index, natural, forward, host);
            }

            self.items[index].node = Some(node);
            let item = &self.items[index];
            host.add_scroll_node(node, item.position, item.size, item.z_index);
        } else {
            let item = &self.items[index];
            let Some(node) = item.node else {
                return;
            };
            host.tree.set_visible(node, true);
            host.tree.push_force_render(node);
            if let Some(handle) = item.handle.clone() {
                handle.on_node_updated(item, index);
                if let Some((new_size, forward)) = handle.take_pending_resize() {
                    self.resize_item(index, new_size, forward, host);
                }
            }
            let item = &self.items[index];
            host.update_scroll_node(node, item.position, item.size, item.z_index);
        }
    }

    fn evict(&mut self, index: usize, host: &mut NodeHost<'_>) {
        let Some(node) = self.items[index].node else {
            return;
        };
        if self.keep_nodes {
            host.tree.set_visible(node, false);
            host.tree.clear_force_render(node);
            return;
        }
        if let Some(handle) = self.items[index].handle.clone() {
            handle.on_node_removed(&self.items[index], index);
        }
        if host.remove_scroll_node(node) {
            self.items[index].node = None;
            self.items[index].handle = None;
        }
    }

    // ── resize propagation ───────────────────────────────────────────

    /// Changes an item's scroll-axis extent. With `forward`, the item
    /// keeps its position and every following item shifts by the
    /// delta; otherwise the item and every preceding item shift
    /// backward instead.
    pub fn resize_item(
        &mut self,
        index: usize,
        new_size: f32,
        forward: bool,
        host: &mut NodeHost<'_>,
    ) {
        if index >= self.items.len() {
            return;
        }
        let axis = host.axis;
        let delta = new_size - axis.main_size(self.items[index].size);
        if delta == 0.0 {
            return;
        }

        if forward {
            for (i, item) in self.items.iter_mut().enumerate() {
                if i == index {
                    item.size = match axis {
                        Axis::Vertical => Size::new(item.size.width, new_size),
                        Axis::Horizontal => Size::new(new_size, item.size.height),
                    };
                } else if i > index {
                    item.position += axis.position_for(delta);
                } else {
                    continue;
                }
                if let Some(node) = item.node {
                    host.update_scroll_node(node, item.position, item.size, item.z_index);
                }
            }
        } else {
            for (i, item) in self.items.iter_mut().enumerate() {
                if i == index {
                    item.size = match axis {
                        Axis::Vertical => Size::new(item.size.width, new_size),
                        Axis::Horizontal => Size::new(new_size, item.size.height),
                    };
                    item.position -= axis.position_for(delta);
                } else if i < index {
                    item.position -= axis.position_for(delta);
                } else {
                    continue;
                }
                if let Some(node) = item.node {
                    host.update_scroll_node(node, item.position, item.size, item.z_index);
                }
            }
        }
        self.info_dirty = true;
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
