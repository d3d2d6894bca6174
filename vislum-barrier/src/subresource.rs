use crate::{
    access::AccessFlags,
    resource::ResourceKey,
    slice::BarrierSlice,
    tracker::hash_resource,
};

/// Capacity used when the set is created without an explicit one.
pub const DEFAULT_CAPACITY: usize = 64;

const NO_ENTRY: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct ListEntry<T> {
    data: T,
    next: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct HashEntry<K, T> {
    version: u64,
    key: K,
    data: T,
    next: u32,
}

/// Resource slice set for barrier tracking.
///
/// A versioned open-addressing hash table from resource to a summary slice
/// covering every access to that resource. Where the summary alone would be
/// too coarse, the precise slices are kept in a singly linked overflow list.
///
/// Slots are never cleared explicitly. A slot is live only if its version
/// matches the set's version, so bumping the version empties the table.
#[derive(Debug)]
pub struct SubresourceSet<K, T> {
    version: u64,
    used: usize,
    initial_capacity: usize,
    index_mask: usize,
    list: Vec<ListEntry<T>>,
    hash_map: Vec<HashEntry<K, T>>,
}

impl<K: ResourceKey, T: BarrierSlice> Default for SubresourceSet<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKey, T: BarrierSlice> SubresourceSet<K, T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a set that allocates `capacity` slots on first insertion.
    ///
    /// `capacity` must be a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());

        Self {
            version: 1,
            used: 0,
            initial_capacity: capacity,
            index_mask: 0,
            list: Vec::new(),
            hash_map: Vec::new(),
        }
    }

    /// Returns the combined access flags of all known slices of `resource`
    /// that overlap `slice`.
    pub fn access(&self, resource: K, slice: &T) -> AccessFlags {
        let Some(entry) = self.find_hash_entry(resource) else {
            return AccessFlags::empty();
        };

        if !entry.data.overlaps(slice) {
            return AccessFlags::empty();
        }

        if entry.next == NO_ENTRY {
            return entry.data.access();
        }

        // Stop once nothing is left that a further entry could add
        let mut access = AccessFlags::empty();
        let mut index = entry.next;

        while index != NO_ENTRY && access != entry.data.access() {
            let list_entry = &self.list[index as usize];

            if list_entry.data.overlaps(slice) {
                access |= list_entry.data.access();
            }

            index = list_entry.next;
        }

        access
    }

    /// Checks whether a known slice of `resource` overlaps `slice` with
    /// either of them writing.
    pub fn is_dirty(&self, resource: K, slice: &T) -> bool {
        let Some(entry) = self.find_hash_entry(resource) else {
            return false;
        };

        if !entry.data.is_dirty(slice) {
            return false;
        }

        // Without a list, the summary is exact
        let mut index = entry.next;

        if index == NO_ENTRY {
            return true;
        }

        while index != NO_ENTRY {
            let list_entry = &self.list[index as usize];

            if list_entry.data.is_dirty(slice) {
                return true;
            }

            index = list_entry.next;
        }

        false
    }

    /// Records an access to `slice` of `resource`.
    ///
    /// Merges the slice into existing entries where possible so that lookups
    /// and further insertions stay fast.
    pub fn insert(&mut self, resource: K, slice: &T) {
        let Some(slot) = self.insert_hash_entry(resource, slice) else {
            return;
        };

        let head = self.hash_map[slot].next;

        if head != NO_ENTRY {
            if T::MERGE_OVERFLOW {
                let mut index = head;

                while index != NO_ENTRY {
                    let entry = &mut self.list[index as usize];

                    if entry.data.can_merge(slice) {
                        entry.data.merge(slice);
                        break;
                    }

                    index = entry.next;
                }

                if index == NO_ENTRY {
                    self.insert_list_entry(*slice, slot);
                }
            } else {
                self.insert_list_entry(*slice, slot);
            }
        } else if !self.hash_map[slot].data.can_merge(slice) {
            // Only create the list once the summary can no longer represent
            // every access precisely enough
            let summary = self.hash_map[slot].data;
            self.insert_list_entry(summary, slot);
            self.insert_list_entry(*slice, slot);
        }

        // The summary stays a superset of every list entry
        self.hash_map[slot].data.merge(slice);
    }

    /// Removes all resources from the set.
    pub fn clear(&mut self) {
        self.used = 0;
        self.version += 1;
        self.list.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Number of tracked resources.
    pub fn len(&self) -> usize {
        self.used
    }

    /// Number of allocated hash slots.
    pub fn capacity(&self) -> usize {
        if self.hash_map.is_empty() {
            0
        } else {
            self.index_mask + 1
        }
    }

    fn compute_index(&self, key: K) -> usize {
        hash_resource(key.key_bits()) as usize & self.index_mask
    }

    fn advance_index(&self, index: usize) -> usize {
        (index + 1) & self.index_mask
    }

    fn find_hash_entry(&self, key: K) -> Option<&HashEntry<K, T>> {
        if self.used == 0 {
            return None;
        }

        let mut index = self.compute_index(key);

        while self.hash_map[index].version == self.version {
            if self.hash_map[index].key == key {
                return Some(&self.hash_map[index]);
            }

            index = self.advance_index(index);
        }

        None
    }

    /// Returns the slot of an existing entry for `key`, or creates an entry
    /// holding `data` and returns `None`.
    fn insert_hash_entry(&mut self, key: K, data: &T) -> Option<usize> {
        self.grow_before_insert();

        let mut index = self.compute_index(key);

        while self.hash_map[index].version == self.version {
            if self.hash_map[index].key == key {
                return Some(index);
            }

            index = self.advance_index(index);
        }

        self.hash_map[index] = HashEntry {
            version: self.version,
            key,
            data: *data,
            next: NO_ENTRY,
        };

        self.used += 1;
        None
    }

    fn grow_before_insert(&mut self) {
        // Keep the load factor below 0.7
        let capacity = self.capacity();

        if 10 * self.used >= 7 * capacity {
            let new_capacity = if capacity == 0 {
                self.initial_capacity
            } else {
                capacity * 2
            };

            self.grow(new_capacity);
        }
    }

    /// Grows the table and relocates live entries in place.
    ///
    /// Relocated entries are tagged with the next version, so a slot
    /// holding an entry of the current version still needs to move. Moving
    /// an entry may displace another one that has not moved yet, which is
    /// then relocated in turn.
    fn grow(&mut self, new_capacity: usize) {
        let old_capacity = self.capacity();

        log::debug!("growing subresource set from {old_capacity} to {new_capacity} slots");

        self.hash_map.resize(new_capacity, HashEntry::default());
        self.index_mask = new_capacity - 1;

        let next_version = self.version + 1;

        for i in 0..old_capacity {
            if self.hash_map[i].version != self.version {
                continue;
            }

            let mut entry = self.hash_map[i];
            self.hash_map[i].version = 0;

            while entry.version == self.version {
                entry.version = next_version;

                let mut index = self.compute_index(entry.key);

                while self.hash_map[index].version == next_version {
                    index = self.advance_index(index);
                }

                std::mem::swap(&mut entry, &mut self.hash_map[index]);
            }
        }

        self.version = next_version;
    }

    fn insert_list_entry(&mut self, data: T, slot: usize) {
        let index = self.list.len() as u32;
        debug_assert!(index < NO_ENTRY);

        let head = &mut self.hash_map[slot];
        self.list.push(ListEntry {
            data,
            next: head.next,
        });
        head.next = index;
    }

    #[cfg(test)]
    fn list_len(&self, resource: K) -> usize {
        let Some(entry) = self.find_hash_entry(resource) else {
            return 0;
        };

        let mut count = 0;
        let mut index = entry.next;

        while index != NO_ENTRY {
            count += 1;
            index = self.list[index as usize].next;
        }

        count
    }
}
