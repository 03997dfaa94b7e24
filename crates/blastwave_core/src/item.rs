//! # Item Stacks
//!
//! The minimal item model explosions need: identity, metadata tag and
//! stack limits, so drops from many voxels can be merged.

use serde::{Deserialize, Serialize};

/// Unique identifier for an item type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Default maximum stack size.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// A stack of items produced by a destroyed voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item type.
    pub item: ItemId,
    /// Number of items in this stack.
    pub count: u32,
    /// Maximum stack size for this item type.
    pub max_stack: u32,
    /// Item metadata; stacks only merge when tags match.
    pub tag: u32,
}

impl ItemStack {
    /// Creates a new item stack with the default stack limit and no tag.
    #[inline]
    #[must_use]
    pub const fn new(item: ItemId, count: u32) -> Self {
        Self {
            item,
            count,
            max_stack: DEFAULT_MAX_STACK,
            tag: 0,
        }
    }

    /// Sets the metadata tag.
    #[inline]
    #[must_use]
    pub const fn with_tag(mut self, tag: u32) -> Self {
        self.tag = tag;
        self
    }

    /// Sets the stack limit.
    #[inline]
    #[must_use]
    pub const fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Returns true if this stack holds nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Same item, same tag, and both stacks still have room.
    #[inline]
    #[must_use]
    pub fn is_mergeable_with(&self, other: &Self) -> bool {
        self.item == other.item
            && self.tag == other.tag
            && self.count < self.max_stack
            && other.count < other.max_stack
            && !other.is_empty()
    }

    /// Moves items from `source` into `self`, never exceeding
    /// `min(max_stack, cap)`. Returns the number moved.
    pub fn merge_from(&mut self, source: &mut Self, cap: u32) -> u32 {
        let limit = self.max_stack.min(cap);
        let moved = limit.saturating_sub(self.count).min(source.count);
        self.count += moved;
        source.count -= moved;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_respects_cap() {
        let mut dest = ItemStack::new(ItemId(1), 10);
        let mut src = ItemStack::new(ItemId(1), 10);
        assert_eq!(dest.merge_from(&mut src, 16), 6);
        assert_eq!(dest.count, 16);
        assert_eq!(src.count, 4);
    }

    #[test]
    fn test_merge_respects_max_stack() {
        let mut dest = ItemStack::new(ItemId(1), 0).with_max_stack(1);
        let mut src = ItemStack::new(ItemId(1), 3).with_max_stack(1);
        assert_eq!(dest.merge_from(&mut src, 16), 1);
        assert_eq!(src.count, 2);
    }

    #[test]
    fn test_tags_block_merging() {
        let a = ItemStack::new(ItemId(5), 1).with_tag(1);
        let b = ItemStack::new(ItemId(5), 1).with_tag(2);
        assert!(!a.is_mergeable_with(&b));
        assert!(a.is_mergeable_with(&ItemStack::new(ItemId(5), 3).with_tag(1)));
    }
}
