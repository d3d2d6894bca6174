//! Index-based red-black tree of address ranges.
//!
//! All trees of a [`NodeArena`] share one node array. Nodes refer to each
//! other by index, and index 0 is a permanently black null node.

use crate::range::AddressRange;

/// Index of the null node.
pub const NULL_NODE: u32 = 0;

const NODE_INDEX_BITS: u32 = 21;
const NODE_INDEX_MASK: u64 = (1 << NODE_INDEX_BITS) - 1;

/// Largest node index that fits into a packed header.
pub const MAX_NODES: u32 = (1 << NODE_INDEX_BITS) - 1;

const RED_BIT: u64 = 1;
const LEFT_SHIFT: u32 = 1;
const RIGHT_SHIFT: u32 = LEFT_SHIFT + NODE_INDEX_BITS;
const PARENT_SHIFT: u32 = RIGHT_SHIFT + NODE_INDEX_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn shift(self) -> u32 {
        match self {
            Side::Left => LEFT_SHIFT,
            Side::Right => RIGHT_SHIFT,
        }
    }
}

/// Tree node.
///
/// The header packs the color and all links into one word:
///
/// | bits    | content          |
/// |---------|------------------|
/// | 0       | set if red       |
/// | 1..=21  | left child       |
/// | 22..=42 | right child      |
/// | 43..=63 | parent, 0 = root |
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeNode {
    header: u64,
    pub range: AddressRange,
}

static_assertions::assert_eq_size!(TreeNode, [u64; 3]);

impl TreeNode {
    fn new(range: AddressRange) -> Self {
        Self { header: 0, range }
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.header & RED_BIT != 0
    }

    #[inline]
    fn set_red(&mut self, red: bool) {
        self.header = (self.header & !RED_BIT) | u64::from(red);
    }

    #[inline]
    pub fn parent(&self) -> u32 {
        ((self.header >> PARENT_SHIFT) & NODE_INDEX_MASK) as u32
    }

    #[inline]
    fn set_parent(&mut self, node: u32) {
        self.set_field(PARENT_SHIFT, node);
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> u32 {
        ((self.header >> side.shift()) & NODE_INDEX_MASK) as u32
    }

    #[inline]
    fn set_child(&mut self, side: Side, node: u32) {
        self.set_field(side.shift(), node);
    }

    #[inline]
    pub fn left(&self) -> u32 {
        self.child(Side::Left)
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.child(Side::Right)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent() == NULL_NODE
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left() == NULL_NODE && self.right() == NULL_NODE
    }

    #[inline]
    fn set_field(&mut self, shift: u32, node: u32) {
        debug_assert!(node <= MAX_NODES);
        self.header &= !(NODE_INDEX_MASK << shift);
        self.header |= u64::from(node) << shift;
    }
}

/// Backing store for any number of red-black trees.
///
/// Trees are identified by their root index. Operations that may change the
/// root return the new one.
#[derive(Debug)]
pub struct NodeArena {
    nodes: Vec<TreeNode>,
    free: Vec<u32>,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::default()],
            free: Vec::new(),
        }
    }

    /// Number of live nodes across all trees.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1 - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn node(&self, index: u32) -> &TreeNode {
        &self.nodes[index as usize]
    }

    #[inline]
    fn node_mut(&mut self, index: u32) -> &mut TreeNode {
        &mut self.nodes[index as usize]
    }

    #[inline]
    fn is_red(&self, index: u32) -> bool {
        self.node(index).is_red()
    }

    #[inline]
    fn parent(&self, index: u32) -> u32 {
        self.node(index).parent()
    }

    #[inline]
    fn child(&self, index: u32, side: Side) -> u32 {
        self.node(index).child(side)
    }

    /// Returns the range stored in a node so it can be adjusted in place.
    ///
    /// The caller must not change the relative order of the node.
    pub(crate) fn range_mut(&mut self, index: u32) -> &mut AddressRange {
        debug_assert_ne!(index, NULL_NODE);
        &mut self.node_mut(index).range
    }

    /// Drops all trees at once. Capacity is retained.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = TreeNode::default();
        self.free.clear();
    }

    fn allocate_node(&mut self, range: AddressRange) -> u32 {
        if let Some(index) = self.free.pop() {
            *self.node_mut(index) = TreeNode::new(range);
            index
        } else {
            let index = self.nodes.len() as u32;
            debug_assert!(index <= MAX_NODES, "barrier tree node capacity exceeded");
            self.nodes.push(TreeNode::new(range));
            index
        }
    }

    fn free_node(&mut self, index: u32) {
        if index != NULL_NODE {
            self.node_mut(index).header = 0;
            self.free.push(index);
        }
    }

    /// Finds any node whose range overlaps `range`.
    ///
    /// The walk follows the `lt` order of range starts, so it is exact as long
    /// as the ranges stored in the tree are pairwise disjoint.
    pub fn find(&self, range: &AddressRange, root: u32) -> u32 {
        let mut index = root;

        while index != NULL_NODE {
            let node = self.node(index);

            if node.range.overlaps(range) {
                return index;
            }

            let side = if node.range.lt(range) {
                Side::Right
            } else {
                Side::Left
            };

            index = node.child(side);
        }

        NULL_NODE
    }

    /// Inserts a range and returns the new root.
    pub fn insert(&mut self, range: AddressRange, root: u32) -> u32 {
        let index = self.allocate_node(range);

        if root == NULL_NODE {
            return index;
        }

        let mut parent = root;

        let side = loop {
            let node = self.node(parent);

            let side = if node.range.lt(&range) {
                Side::Right
            } else {
                Side::Left
            };

            match node.child(side) {
                NULL_NODE => break side,
                child => parent = child,
            }
        };

        self.node_mut(parent).set_child(side, index);

        let node = self.node_mut(index);
        node.set_parent(parent);
        node.set_red(true);

        let mut root = root;
        self.rebalance_post_insert(index, &mut root);
        root
    }

    /// Removes a node from the tree and returns the new root.
    pub fn remove(&mut self, index: u32, root: u32) -> u32 {
        debug_assert_ne!(index, NULL_NODE);

        let mut root = root;
        let node = *self.node(index);

        let mut removed_black = !node.is_red();
        let fixup;

        if node.left() == NULL_NODE {
            fixup = node.right();
            self.transplant(index, fixup, &mut root);
        } else if node.right() == NULL_NODE {
            fixup = node.left();
            self.transplant(index, fixup, &mut root);
        } else {
            let successor = self.minimum(node.right());
            removed_black = !self.is_red(successor);
            fixup = self.child(successor, Side::Right);

            if self.parent(successor) == index {
                // Also sets the parent link of the null node
                self.node_mut(fixup).set_parent(successor);
            } else {
                self.transplant(successor, fixup, &mut root);

                let right = self.child(index, Side::Right);
                self.node_mut(successor).set_child(Side::Right, right);
                self.node_mut(right).set_parent(successor);
            }

            self.transplant(index, successor, &mut root);

            let left = self.child(index, Side::Left);
            self.node_mut(successor).set_child(Side::Left, left);
            self.node_mut(left).set_parent(successor);
            self.node_mut(successor).set_red(node.is_red());
        }

        if removed_black {
            self.rebalance_post_remove(fixup, &mut root);
        }

        self.nodes[NULL_NODE as usize].header = 0;
        self.free_node(index);
        root
    }

    fn minimum(&self, mut index: u32) -> u32 {
        loop {
            match self.child(index, Side::Left) {
                NULL_NODE => return index,
                left => index = left,
            }
        }
    }

    /// Replaces the subtree at `old` with the subtree at `new`.
    fn transplant(&mut self, old: u32, new: u32, root: &mut u32) {
        let parent = self.parent(old);

        if parent == NULL_NODE {
            *root = new;
        } else {
            let side = self.side_of(parent, old);
            self.node_mut(parent).set_child(side, new);
        }

        // The null node keeps a parent link while the fixup runs
        self.node_mut(new).set_parent(parent);
    }

    fn side_of(&self, parent: u32, child: u32) -> Side {
        if self.child(parent, Side::Left) == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn rebalance_post_insert(&mut self, mut index: u32, root: &mut u32) {
        loop {
            let parent = self.parent(index);

            if parent == NULL_NODE || !self.is_red(parent) {
                break;
            }

            // A red node is never the root, so the grandparent exists
            let grandparent = self.parent(parent);
            let side = self.side_of(grandparent, parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.is_red(uncle) {
                self.node_mut(parent).set_red(false);
                self.node_mut(uncle).set_red(false);
                self.node_mut(grandparent).set_red(true);
                index = grandparent;
                continue;
            }

            if self.child(parent, side.opposite()) == index {
                index = parent;
                self.rotate(index, side, root);
            }

            let parent = self.parent(index);
            let grandparent = self.parent(parent);

            self.node_mut(parent).set_red(false);
            self.node_mut(grandparent).set_red(true);
            self.rotate(grandparent, side.opposite(), root);
        }

        let root = *root;
        self.node_mut(root).set_red(false);
    }

    fn rebalance_post_remove(&mut self, mut index: u32, root: &mut u32) {
        while index != *root && !self.is_red(index) {
            let parent = self.parent(index);
            let side = self.side_of(parent, index);
            let mut sibling = self.child(parent, side.opposite());

            if self.is_red(sibling) {
                self.node_mut(sibling).set_red(false);
                self.node_mut(parent).set_red(true);
                self.rotate(parent, side, root);
                sibling = self.child(parent, side.opposite());
            }

            let near = self.child(sibling, side);
            let far = self.child(sibling, side.opposite());

            if !self.is_red(near) && !self.is_red(far) {
                self.node_mut(sibling).set_red(true);
                index = parent;
                continue;
            }

            if !self.is_red(far) {
                self.node_mut(near).set_red(false);
                self.node_mut(sibling).set_red(true);
                self.rotate(sibling, side.opposite(), root);
                sibling = self.child(parent, side.opposite());
            }

            let parent_red = self.is_red(parent);
            let far = self.child(sibling, side.opposite());

            self.node_mut(sibling).set_red(parent_red);
            self.node_mut(parent).set_red(false);
            self.node_mut(far).set_red(false);
            self.rotate(parent, side, root);
            index = *root;
        }

        self.node_mut(index).set_red(false);
    }

    /// Rotates the subtree at `index` towards `direction`, lifting the
    /// child on the opposite side into its place.
    fn rotate(&mut self, index: u32, direction: Side, root: &mut u32) {
        let pivot = self.child(index, direction.opposite());
        debug_assert_ne!(pivot, NULL_NODE);

        let inner = self.child(pivot, direction);
        self.node_mut(index).set_child(direction.opposite(), inner);

        if inner != NULL_NODE {
            self.node_mut(inner).set_parent(index);
        }

        let parent = self.parent(index);
        self.node_mut(pivot).set_parent(parent);

        if parent == NULL_NODE {
            *root = pivot;
        } else {
            let side = self.side_of(parent, index);
            self.node_mut(parent).set_child(side, pivot);
        }

        self.node_mut(pivot).set_child(direction, index);
        self.node_mut(index).set_parent(pivot);
    }

    /// Height of the tree, counting nodes.
    pub fn height(&self, root: u32) -> usize {
        if root == NULL_NODE {
            return 0;
        }

        let node = self.node(root);
        1 + self.height(node.left()).max(self.height(node.right()))
    }
}
