//! Generational node arena.

use slipstream_geometry::{Size, Vec2};
use smallvec::SmallVec;

/// Handle to a node in a [`NodeTree`]. Stale handles (freed and reused
/// slots) are rejected by every accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
pub struct Node {
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 8]>,
    position: Vec2,
    anchor_point: Vec2,
    content_size: Size,
    scale: Vec2,
    z_order: i32,
    visible: bool,
    opacity: f32,
    force_render: bool,
    content_size_dirty: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            position: Vec2::ZERO,
            anchor_point: Vec2::ZERO,
            content_size: Size::ZERO,
            scale: Vec2::new(1.0, 1.0),
            z_order: 0,
            visible: true,
            opacity: 1.0,
            force_render: false,
            content_size_dirty: false,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Default)]
pub struct NodeTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(Node::default());
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(Node::default()),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Attaches `child` under `parent` with the given z order,
    /// detaching it from any previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, z: i32) {
        if !self.is_alive(parent) || !self.is_alive(child) {
            log::warn!("add_child on a dead node");
            return;
        }
        self.remove_from_parent(child);
        if let Some(node) = self.slot_mut(child) {
            node.parent = Some(parent);
            node.z_order = z;
        }
        if let Some(node) = self.slot_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detaches a node from its parent, keeping it alive.
    pub fn remove_from_parent(&mut self, id: NodeId) {
        let parent = self.slot(id).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(node) = self.slot_mut(parent) {
                node.children.retain(|c| *c != id);
            }
        }
        if let Some(node) = self.slot_mut(id) {
            node.parent = None;
        }
    }

    /// Frees a node and its whole subtree.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.remove_from_parent(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children = self
                .slot(current)
                .map(|n| n.children.to_vec())
                .unwrap_or_default();
            stack.extend(children);
            let slot = &mut self.slots[current.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|n| n.parent)
    }

    /// Children in ascending z order (stable for equal z).
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self
            .slot(id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default();
        children.sort_by_key(|c| self.slot(*c).map(|n| n.z_order).unwrap_or(0));
        children
    }

    pub fn position(&self, id: NodeId) -> Vec2 {
        self.slot(id).map(|n| n.position).unwrap_or(Vec2::ZERO)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec2) {
        if let Some(node) = self.slot_mut(id) {
            node.position = position;
        }
    }

    pub fn content_size(&self, id: NodeId) -> Size {
        self.slot(id).map(|n| n.content_size).unwrap_or(Size::ZERO)
    }

    pub fn set_content_size(&mut self, id: NodeId, size: Size) {
        if let Some(node) = self.slot_mut(id) {
            if node.content_size != size {
                node.content_size = size;
                node.content_size_dirty = true;
            }
        }
    }

    /// Reads and clears the content-size-dirty bit.
    pub fn take_content_size_dirty(&mut self, id: NodeId) -> bool {
        self.slot_mut(id)
            .map(|n| std::mem::replace(&mut n.content_size_dirty, false))
            .unwrap_or(false)
    }

    pub fn anchor_point(&self, id: NodeId) -> Vec2 {
        self.slot(id).map(|n| n.anchor_point).unwrap_or(Vec2::ZERO)
    }

    pub fn set_anchor_point(&mut self, id: NodeId, anchor: Vec2) {
        if let Some(node) = self.slot_mut(id) {
            node.anchor_point = anchor;
        }
    }

    pub fn z_order(&self, id: NodeId) -> i32 {
        self.slot(id).map(|n| n.z_order).unwrap_or(0)
    }

    pub fn set_z_order(&mut self, id: NodeId, z: i32) {
        if let Some(node) = self.slot_mut(id) {
            node.z_order = z;
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.slot(id).map(|n| n.visible).unwrap_or(false)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.slot_mut(id) {
            node.visible = visible;
        }
    }

    pub fn opacity(&self, id: NodeId) -> f32 {
        self.slot(id).map(|n| n.opacity).unwrap_or(0.0)
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        if let Some(node) = self.slot_mut(id) {
            node.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        if let Some(node) = self.slot_mut(id) {
            node.scale = scale;
        }
    }

    /// Product of this node's and all ancestors' scales.
    pub fn world_scale(&self, id: NodeId) -> Vec2 {
        let mut scale = Vec2::new(1.0, 1.0);
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.slot(node_id) {
                Some(node) => {
                    scale = Vec2::new(scale.x * node.scale.x, scale.y * node.scale.y);
                    current = node.parent;
                }
                None => break,
            }
        }
        scale
    }

    /// Marks a node to force-render its next frame (set when a node
    /// enters the live window).
    pub fn push_force_render(&mut self, id: NodeId) {
        if let Some(node) = self.slot_mut(id) {
            node.force_render = true;
        }
    }

    pub fn clear_force_render(&mut self, id: NodeId) {
        if let Some(node) = self.slot_mut(id) {
            node.force_render = false;
        }
    }

    pub fn is_force_render(&self, id: NodeId) -> bool {
        self.slot(id).map(|n| n.force_render).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy_invalidates_handle() {
        let mut tree = NodeTree::new();
        let a = tree.create();
        assert!(tree.is_alive(a));
        tree.destroy(a);
        assert!(!tree.is_alive(a));

        // Reused slot gets a fresh generation.
        let b = tree.create();
        assert!(tree.is_alive(b));
        assert!(!tree.is_alive(a));
        assert_ne!(a, b);
    }

    #[test]
    fn parenting_and_reparenting() {
        let mut tree = NodeTree::new();
        let root = tree.create();
        let other = tree.create();
        let child = tree.create();

        tree.add_child(root, child, 0);
        assert_eq!(tree.parent(child), Some(root));

        tree.add_child(other, child, 0);
        assert_eq!(tree.parent(child), Some(other));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn children_sorted_by_z() {
        let mut tree = NodeTree::new();
        let root = tree.create();
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.add_child(root, a, 5);
        tree.add_child(root, b, -1);
        tree.add_child(root, c, 0);
        assert_eq!(tree.children(root), vec![b, c, a]);
    }

    #[test]
    fn destroy_frees_subtree() {
        let mut tree = NodeTree::new();
        let root = tree.create();
        let child = tree.create();
        let grandchild = tree.create();
        tree.add_child(root, child, 0);
        tree.add_child(child, grandchild, 0);

        tree.destroy(child);
        assert!(!tree.is_alive(child));
        assert!(!tree.is_alive(grandchild));
        assert!(tree.is_alive(root));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn content_size_dirty_bit() {
        let mut tree = NodeTree::new();
        let node = tree.create();
        assert!(!tree.take_content_size_dirty(node));
        tree.set_content_size(node, Size::new(10.0, 20.0));
        assert!(tree.take_content_size_dirty(node));
        assert!(!tree.take_content_size_dirty(node));
        // Same size again: no dirt.
        tree.set_content_size(node, Size::new(10.0, 20.0));
        assert!(!tree.take_content_size_dirty(node));
    }

    #[test]
    fn world_scale_multiplies_up_the_chain() {
        let mut tree = NodeTree::new();
        let root = tree.create();
        let child = tree.create();
        tree.add_child(root, child, 0);
        tree.set_scale(root, Vec2::new(2.0, 2.0));
        tree.set_scale(child, Vec2::new(0.5, 3.0));
        assert_eq!(tree.world_scale(child), Vec2::new(1.0, 6.0));
    }
}
