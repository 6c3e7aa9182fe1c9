//! Ordering list: a doubly linked sequence of nodes stored in a [`SlotArena`].
//!
//! ```text
//!   head ─► [id_3] ◄──► [id_1] ◄──► [id_2] ◄── tail
//!           evicted last            evicted first
//! ```
//!
//! The arena holds every allocated node, linked or not. A node is allocated
//! as soon as its key enters the index and linked later by the insertion
//! worker, so `len()` counts linked nodes only while `allocated()` counts
//! both.
//!
//! LRU keeps the list in recency order (`push_front`, `move_to_head`). LFU
//! keeps it in non-increasing frequency order with recency as the tie-break
//! inside a frequency band (`insert_by_frequency`, `reposition`).

use super::arena::{SlotArena, SlotId};
use super::types::Node;

#[derive(Debug)]
pub struct OrderingList<V> {
    arena: SlotArena<Node<V>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<V> OrderingList<V> {
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated nodes, linked or pending
    pub fn allocated(&self) -> usize {
        self.arena.len()
    }

    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn get(&self, id: SlotId) -> Option<&Node<V>> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut Node<V>> {
        self.arena.get_mut(id)
    }

    /// Store a detached node; it takes no part in ordering until linked
    pub fn alloc(&mut self, node: Node<V>) -> SlotId {
        self.arena.insert(node)
    }

    /// Unlink (if needed) and release a node
    pub fn free(&mut self, id: SlotId) -> Option<Node<V>> {
        self.unlink(id);
        self.arena.remove(id)
    }

    /// Link a detached node at the head (LRU insertion)
    pub fn push_front(&mut self, id: SlotId) -> bool {
        if !self.is_detached(id) {
            return false;
        }
        self.link_after(None, id)
    }

    /// Link a detached node in front of the last band whose frequency is not
    /// greater than its own (LFU insertion)
    ///
    /// A fresh node has frequency 0, so it lands at the front of the lowest
    /// band, right before the older zero-frequency nodes.
    pub fn insert_by_frequency(&mut self, id: SlotId) -> bool {
        let Some(frequency) = self.detached_frequency(id) else {
            return false;
        };

        let mut anchor = self.tail;
        while let Some(current) = anchor {
            match self.arena.get(current) {
                Some(node) if node.frequency <= frequency => anchor = node.prev,
                _ => break,
            }
        }

        self.link_after(anchor, id)
    }

    /// Insert a detached node directly before `next`
    pub fn insert_before(&mut self, next: SlotId, id: SlotId) -> bool {
        if !self.is_linked(next) || !self.is_detached(id) {
            return false;
        }
        let prev = self.arena.get(next).and_then(|node| node.prev);
        self.link_after(prev, id)
    }

    /// Insert a detached node directly after `prev`
    pub fn insert_after(&mut self, prev: SlotId, id: SlotId) -> bool {
        if !self.is_linked(prev) || !self.is_detached(id) {
            return false;
        }
        self.link_after(Some(prev), id)
    }

    /// Detach a node from the chain, keeping it allocated
    pub fn unlink(&mut self, id: SlotId) -> bool {
        let (prev, next) = match self.arena.get(id) {
            Some(node) if node.linked => (node.prev, node.next),
            _ => return false,
        };

        match prev.and_then(|p| self.arena.get_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.arena.get_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
            node.linked = false;
        }
        self.len -= 1;
        true
    }

    /// Move a linked node to the head (LRU promotion)
    pub fn move_to_head(&mut self, id: SlotId) -> bool {
        if !self.is_linked(id) {
            return false;
        }
        if self.head == Some(id) {
            return true;
        }
        self.unlink(id);
        self.link_after(None, id)
    }

    /// Restore frequency order around a node whose frequency just grew
    /// (LFU promotion)
    ///
    /// Walks backward from the node's predecessor past every node whose
    /// frequency is not greater than the node's own, then splices the node
    /// right after the first node with a strictly higher frequency, or at the
    /// head if there is none. Frequency grows by one per access, so the walk
    /// normally crosses a single band.
    pub fn reposition(&mut self, id: SlotId) -> bool {
        let (frequency, prev) = match self.arena.get(id) {
            Some(node) if node.linked => (node.frequency, node.prev),
            _ => return false,
        };

        let mut anchor = prev;
        while let Some(current) = anchor {
            match self.arena.get(current) {
                Some(node) if node.frequency <= frequency => anchor = node.prev,
                _ => break,
            }
        }

        if anchor == prev {
            return true;
        }

        self.unlink(id);
        self.link_after(anchor, id)
    }

    /// Remove the tail node and release it
    pub fn evict_tail(&mut self) -> Option<Node<V>> {
        let tail = self.tail?;
        self.free(tail)
    }

    /// Iterate linked nodes from head to tail
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Iterate linked slot ids from head to tail
    pub fn iter_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        std::iter::successors(self.head, move |id| {
            self.arena.get(*id).and_then(|node| node.next)
        })
    }

    /// Keys from head to tail
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|node| node.key.clone()).collect()
    }

    /// Drop every node, linked or pending
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn is_linked(&self, id: SlotId) -> bool {
        self.arena.get(id).is_some_and(|node| node.linked)
    }

    fn is_detached(&self, id: SlotId) -> bool {
        self.arena.get(id).is_some_and(|node| !node.linked)
    }

    fn detached_frequency(&self, id: SlotId) -> Option<u64> {
        match self.arena.get(id) {
            Some(node) if !node.linked => Some(node.frequency),
            _ => None,
        }
    }

    /// Splice a detached node after `prev`, or at the head when `prev` is None
    fn link_after(&mut self, prev: Option<SlotId>, id: SlotId) -> bool {
        let next = match prev {
            Some(p) => match self.arena.get(p) {
                Some(node) => node.next,
                None => return false,
            },
            None => self.head,
        };

        match self.arena.get_mut(id) {
            Some(node) => {
                node.prev = prev;
                node.next = next;
                node.linked = true;
            }
            None => return false,
        }

        match prev.and_then(|p| self.arena.get_mut(p)) {
            Some(prev_node) => prev_node.next = Some(id),
            None => self.head = Some(id),
        }
        match next.and_then(|n| self.arena.get_mut(n)) {
            Some(next_node) => next_node.prev = Some(id),
            None => self.tail = Some(id),
        }

        self.len += 1;
        true
    }

    #[cfg(test)]
    pub fn validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len, 0);
            return;
        }

        let mut seen = std::collections::HashSet::new();
        let mut prev = None;
        let mut current = self.head;
        let mut count = 0usize;

        while let Some(id) = current {
            assert!(seen.insert(id), "cycle at {:?}", id);
            let node = self.arena.get(id).expect("linked node missing");
            assert!(node.linked);
            assert_eq!(node.prev, prev);
            if node.next.is_none() {
                assert_eq!(self.tail, Some(id));
            }
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len);
        }

        assert_eq!(count, self.len);
    }
}

impl<V> Default for OrderingList<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, V> {
    list: &'a OrderingList<V>,
    current: Option<SlotId>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Node<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.arena.get(self.current?)?;
        self.current = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc_with_frequency(list: &mut OrderingList<u32>, key: &str, frequency: u64) -> SlotId {
        let mut node = Node::new(key, 0);
        node.frequency = frequency;
        list.alloc(node)
    }

    fn frequencies(list: &OrderingList<u32>) -> Vec<u64> {
        list.iter().map(|node| node.frequency).collect()
    }

    #[test]
    fn test_push_front_and_evict_tail() {
        let mut list = OrderingList::new();
        for key in ["a", "b", "c"] {
            let id = list.alloc(Node::new(key, 0u32));
            assert!(list.push_front(id));
        }

        assert_eq!(list.keys(), vec!["c", "b", "a"]);
        assert_eq!(list.len(), 3);

        let evicted = list.evict_tail().unwrap();
        assert_eq!(evicted.key, "a");
        assert_eq!(list.keys(), vec!["c", "b"]);
        assert_eq!(list.allocated(), 2);
        list.validate_invariants();
    }

    #[test]
    fn test_evict_tail_empty() {
        let mut list: OrderingList<u32> = OrderingList::new();
        assert!(list.evict_tail().is_none());

        // A pending node is not a tail
        list.alloc(Node::new("pending", 1));
        assert!(list.evict_tail().is_none());
        assert_eq!(list.allocated(), 1);
    }

    #[test]
    fn test_push_front_rejects_linked_node() {
        let mut list = OrderingList::new();
        let id = list.alloc(Node::new("a", 0u32));
        assert!(list.push_front(id));
        assert!(!list.push_front(id));
        assert_eq!(list.len(), 1);
        list.validate_invariants();
    }

    #[test]
    fn test_move_to_head() {
        let mut list = OrderingList::new();
        let ids: Vec<SlotId> = ["a", "b", "c"]
            .iter()
            .map(|key| {
                let id = list.alloc(Node::new(*key, 0u32));
                list.push_front(id);
                id
            })
            .collect();

        // c, b, a -> a, c, b
        assert!(list.move_to_head(ids[0]));
        assert_eq!(list.keys(), vec!["a", "c", "b"]);

        // already head
        assert!(list.move_to_head(ids[0]));
        assert_eq!(list.keys(), vec!["a", "c", "b"]);

        // middle node
        assert!(list.move_to_head(ids[2]));
        assert_eq!(list.keys(), vec!["c", "a", "b"]);
        list.validate_invariants();
    }

    #[test]
    fn test_move_to_head_two_nodes() {
        let mut list = OrderingList::new();
        let a = list.alloc(Node::new("a", 0u32));
        let b = list.alloc(Node::new("b", 0u32));
        list.push_front(a);
        list.push_front(b);

        assert!(list.move_to_head(a));
        assert_eq!(list.keys(), vec!["a", "b"]);
        assert_eq!(list.tail(), Some(b));
        list.validate_invariants();
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut list = OrderingList::new();
        let a = list.alloc(Node::new("a", 0u32));
        let b = list.alloc(Node::new("b", 0u32));
        let c = list.alloc(Node::new("c", 0u32));
        let d = list.alloc(Node::new("d", 0u32));

        assert!(list.push_front(a));
        assert!(list.insert_after(a, c));
        assert!(list.insert_before(c, b));
        assert!(list.insert_before(a, d));
        assert_eq!(list.keys(), vec!["d", "a", "b", "c"]);

        // anchor must be linked, node must be detached
        let e = list.alloc(Node::new("e", 0u32));
        let f = list.alloc(Node::new("f", 0u32));
        assert!(!list.insert_after(e, f));
        assert!(!list.insert_before(a, b));
        list.validate_invariants();
    }

    #[test]
    fn test_unlink_keeps_node_allocated() {
        let mut list = OrderingList::new();
        let a = list.alloc(Node::new("a", 1u32));
        let b = list.alloc(Node::new("b", 2u32));
        list.push_front(a);
        list.push_front(b);

        assert!(list.unlink(a));
        assert!(!list.unlink(a));
        assert_eq!(list.len(), 1);
        assert_eq!(list.allocated(), 2);
        assert_eq!(list.get(a).unwrap().value, 1);
        assert_eq!(list.tail(), Some(b));
        list.validate_invariants();

        let freed = list.free(b).unwrap();
        assert_eq!(freed.key, "b");
        assert!(list.is_empty());
        list.validate_invariants();
    }

    #[test]
    fn test_insert_by_frequency_lands_before_equal_band() {
        let mut list = OrderingList::new();
        let high = alloc_with_frequency(&mut list, "high", 3);
        let mid = alloc_with_frequency(&mut list, "mid", 1);
        let old = alloc_with_frequency(&mut list, "old", 0);
        list.insert_by_frequency(high);
        list.insert_by_frequency(mid);
        list.insert_by_frequency(old);
        assert_eq!(list.keys(), vec!["high", "mid", "old"]);

        let fresh = alloc_with_frequency(&mut list, "fresh", 0);
        list.insert_by_frequency(fresh);
        assert_eq!(list.keys(), vec!["high", "mid", "fresh", "old"]);

        // all lower or equal: becomes head
        let top = alloc_with_frequency(&mut list, "top", 5);
        list.insert_by_frequency(top);
        assert_eq!(list.keys(), vec!["top", "high", "mid", "fresh", "old"]);
        list.validate_invariants();
    }

    #[test]
    fn test_reposition_crosses_one_band() {
        let mut list = OrderingList::new();
        let ids: Vec<SlotId> = ["1", "2", "3"]
            .iter()
            .map(|key| {
                let id = alloc_with_frequency(&mut list, key, 0);
                list.insert_by_frequency(id);
                id
            })
            .collect();
        assert_eq!(list.keys(), vec!["3", "2", "1"]);

        for id in [ids[0], ids[0], ids[1]] {
            list.get_mut(id).unwrap().touch();
            assert!(list.reposition(id));
            list.validate_invariants();
        }

        assert_eq!(list.keys(), vec!["1", "2", "3"]);
        assert_eq!(frequencies(&list), vec![2, 1, 0]);

        let evicted = list.evict_tail().unwrap();
        assert_eq!(evicted.key, "3");
    }

    #[test]
    fn test_reposition_in_place_and_detached() {
        let mut list = OrderingList::new();
        let a = alloc_with_frequency(&mut list, "a", 5);
        let b = alloc_with_frequency(&mut list, "b", 1);
        list.insert_by_frequency(a);
        list.insert_by_frequency(b);

        list.get_mut(b).unwrap().touch();
        assert!(list.reposition(b));
        assert_eq!(list.keys(), vec!["a", "b"]);

        let pending = alloc_with_frequency(&mut list, "pending", 9);
        assert!(!list.reposition(pending));
    }

    #[test]
    fn test_frequency_order_holds_under_mixed_access() {
        let mut list = OrderingList::new();
        let ids: Vec<SlotId> = (0..20)
            .map(|i| {
                let id = alloc_with_frequency(&mut list, &i.to_string(), 0);
                list.insert_by_frequency(id);
                id
            })
            .collect();

        for round in 0..50usize {
            let id = ids[(round * 7 + round / 3) % ids.len()];
            list.get_mut(id).unwrap().touch();
            list.reposition(id);
        }

        list.validate_invariants();
        let freqs = frequencies(&list);
        assert!(freqs.windows(2).all(|w| w[0] >= w[1]), "{:?}", freqs);
    }

    #[test]
    fn test_clear() {
        let mut list = OrderingList::with_capacity(2);
        let a = list.alloc(Node::new("a", 0u32));
        list.push_front(a);
        list.alloc(Node::new("pending", 0u32));

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.allocated(), 0);
        assert!(list.head().is_none());
        list.validate_invariants();
    }
}
