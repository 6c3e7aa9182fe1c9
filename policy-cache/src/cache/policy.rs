use crate::core::{CachePolicy, OrderingList, SlotId};

/// Ordering rules of an eviction policy
///
/// The engine calls these with the state lock held; they only rearrange the
/// list and never touch the index. The victim is always the list tail.
pub trait EvictionPolicy: Send + Sync + 'static {
    /// Which policy this is
    const KIND: CachePolicy;

    /// Link a freshly allocated node; returns false if it was not linkable
    fn insert<V>(&self, list: &mut OrderingList<V>, id: SlotId) -> bool;

    /// Apply an access to a node, linked or still pending insertion
    fn promote<V>(&self, list: &mut OrderingList<V>, id: SlotId);
}
