use crate::{
    access::Access,
    range::AddressRange,
    tree::{NULL_NODE, NodeArena},
};

/// Number of hash buckets per access type.
const HASH_TABLE_SIZE: u32 = 32;

/// Barrier tracker.
///
/// A two-part hash table of read and written resource ranges, where every
/// bucket is a red-black tree. All trees share one node arena. Ranges within a
/// bucket are kept disjoint by merging overlapping ranges on insertion.
#[derive(Debug)]
pub struct BarrierTracker {
    /// Bit `i` is set if bucket `i` holds at least one range.
    root_mask_valid: u64,
    /// Bit `i` is set if the root of bucket `i` has children.
    root_mask_subtree: u64,
    roots: [u32; 2 * HASH_TABLE_SIZE as usize],
    arena: NodeArena,
}

impl Default for BarrierTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BarrierTracker {
    pub fn new() -> Self {
        Self {
            root_mask_valid: 0,
            root_mask_subtree: 0,
            roots: [NULL_NODE; 2 * HASH_TABLE_SIZE as usize],
            arena: NodeArena::new(),
        }
    }

    /// Checks whether there is a pending access of the given type that
    /// overlaps `range`.
    pub fn find_range(&self, range: &AddressRange, access: Access) -> bool {
        let bucket = compute_bucket(range, access);
        let bit = 1u64 << bucket;

        if self.root_mask_valid & bit == 0 {
            return false;
        }

        let root = self.roots[bucket as usize];

        if self.root_mask_subtree & bit == 0 {
            return self.arena.node(root).range.overlaps(range);
        }

        self.arena.find(range, root) != NULL_NODE
    }

    /// Records an access of the given type on `range`.
    pub fn insert_range(&mut self, range: &AddressRange, access: Access) {
        let bucket = compute_bucket(range, access);
        let bit = 1u64 << bucket;

        if self.root_mask_valid & bit == 0 {
            self.roots[bucket as usize] = self.arena.insert(*range, NULL_NODE);
            self.root_mask_valid |= bit;
            self.root_mask_subtree &= !bit;
            return;
        }

        let mut root = self.roots[bucket as usize];
        let mut index = self.arena.find(range, root);

        if index == NULL_NODE {
            root = self.arena.insert(*range, root);
            self.update_root(bucket, root);
            return;
        }

        let existing = self.arena.node(index).range;

        if existing.contains(range) {
            return;
        }

        // If nothing else overlaps the parts of the new range sticking out of
        // the existing node, grow that node in place.
        let mut has_overlap = false;

        if range.range_start < existing.range_start {
            let head = AddressRange::new(range.resource, range.range_start, existing.range_start - 1);
            has_overlap = self.arena.find(&head, root) != NULL_NODE;
        }

        if range.range_end > existing.range_end && !has_overlap {
            let tail = AddressRange::new(range.resource, existing.range_end + 1, range.range_end);
            has_overlap = self.arena.find(&tail, root) != NULL_NODE;
        }

        if !has_overlap {
            *self.arena.range_mut(index) = existing.union(range);
            return;
        }

        let mut merged = *range;

        while index != NULL_NODE {
            merged = merged.union(&self.arena.node(index).range);
            root = self.arena.remove(index, root);
            index = self.arena.find(&merged, root);
        }

        root = self.arena.insert(merged, root);
        self.update_root(bucket, root);
    }

    /// Clears all buckets.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            log::trace!("clearing barrier tracker with {} ranges", self.arena.len());
        }

        self.root_mask_valid = 0;
        self.root_mask_subtree = 0;
        self.arena.clear();
    }

    /// Checks whether no ranges are tracked.
    pub fn is_empty(&self) -> bool {
        self.root_mask_valid == 0
    }

    /// Number of disjoint ranges tracked across all buckets.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    fn update_root(&mut self, bucket: u32, root: u32) {
        let bit = 1u64 << bucket;
        self.roots[bucket as usize] = root;

        if root == NULL_NODE {
            self.root_mask_valid &= !bit;
            self.root_mask_subtree &= !bit;
        } else if self.arena.node(root).is_leaf() {
            self.root_mask_subtree &= !bit;
        } else {
            self.root_mask_subtree |= bit;
        }
    }
}

pub(crate) fn hash_resource(resource: u64) -> u64 {
    let hash = resource.wrapping_mul(93887);
    hash ^ (hash >> 16)
}

/// Buckets for written ranges occupy the upper half of the table.
fn compute_bucket(range: &AddressRange, access: Access) -> u32 {
    let bucket = (hash_resource(range.resource) % u64::from(HASH_TABLE_SIZE)) as u32;

    match access {
        Access::Read => bucket,
        Access::Write => bucket + HASH_TABLE_SIZE,
    }
}
