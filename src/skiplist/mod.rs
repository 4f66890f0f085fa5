//! An indexable skip list that remembers the order its elements arrived in.
//!
//! Elements are kept sorted by key, with equal keys ordered by arrival. Each
//! forward reference carries a span, the number of level-0 steps it jumps, so
//! that the element of any rank is reachable in O(log n) expected time. A
//! second, singly linked chain threads the same nodes in arrival order, which
//! lets `remove_oldest` evict the longest-resident element in O(log n)
//! regardless of its key. This is the structure behind a sliding window that
//! slides by arrival but is queried by value.
//!
//! ```text
//! L2  head --------------3--------------> [4] ---------1---------> head
//! L1  head ------2------> [1] ----1-----> [4] ----1----> [5] --0-> head
//! L0  head --1--> [1] --1--> [1] --1--> [4] --1--> [5] --0--> head
//! ```
//!
//! Nodes live in a slab and refer to each other by slab key, so the two
//! orderings never alias ownership. Node heights are decided bottom up while
//! inserting: a node is offered to level `l` only after it was linked into
//! level `l - 1`, and then a coin flip decides. The coin is injected, see
//! `coin`.
//!
//! # Examples
//!
//! ```
//! use runquant::skiplist::SkipList;
//!
//! let mut list = SkipList::new(8).unwrap();
//! assert_eq!(list.insert(3.0, "c"), 0);
//! assert_eq!(list.insert(1.0, "a"), 0);
//! assert_eq!(list.insert(2.0, "b"), 1);
//!
//! assert_eq!(list.get(2).unwrap(), (3.0, &"c"));
//! assert_eq!(list.remove_oldest().unwrap(), (3.0, "c"));
//! assert_eq!(list.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write;
use std::num::NonZeroUsize;

use slab::Slab;

use crate::error::{Error, Result};
use crate::util::Xorshift;

pub mod coin;
mod key;
mod node;

pub use self::coin::Coin;
pub use self::key::Key;

use self::node::{Link, Node, Placement, Ptr};

/// Levels allotted by `WindowedQuantile` to its largest windows, and a sane
/// upper bound for any skip list.
pub const DEFAULT_MAX_LEVELS: usize = 32;

const DEFAULT_SEED: u64 = 1972;

/// A skip list sorted by key, indexable by rank, evictable by age
///
/// See the module documentation for the layout. `C` is the coin that decides
/// node heights; by default a seeded `Xorshift`.
pub struct SkipList<K, V, C = Xorshift> {
    nodes: Slab<Node<K, V>>,
    // The sorted sentinel's links, one per level.
    head: Vec<Link>,
    // The arrival sentinel: first and last node of the arrival chain.
    first_arrival: Ptr,
    last_arrival: Ptr,
    next_seq: u64,
    len: usize,
    coin: C,
}

impl<K, V> SkipList<K, V, Xorshift>
where
    K: Key,
{
    /// Create an empty skip list with `max_levels` levels
    ///
    /// Heights are drawn from a `Xorshift` with a fixed seed, so two lists fed
    /// the same inserts end up with the same shape.
    ///
    /// # Errors
    /// Returns `Error::InvalidLevels` when `max_levels < 1`.
    pub fn new(max_levels: usize) -> Result<SkipList<K, V, Xorshift>> {
        SkipList::with_coin(max_levels, Xorshift::new(DEFAULT_SEED))
    }
}

impl<K, V, C> SkipList<K, V, C>
where
    K: Key,
    C: Coin,
{
    /// Create an empty skip list with `max_levels` levels whose node heights
    /// are decided by `coin`
    ///
    /// # Examples
    /// ```
    /// use runquant::skiplist::SkipList;
    /// use runquant::skiplist::coin::Always;
    ///
    /// let mut list = SkipList::with_coin(4, Always::tails()).unwrap();
    /// list.insert(7u32, ());
    /// assert_eq!(list.len(), 1);
    /// assert!(SkipList::<u32, (), _>::with_coin(0, Always::tails()).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `Error::InvalidLevels` when `max_levels < 1`.
    pub fn with_coin(max_levels: usize, coin: C) -> Result<SkipList<K, V, C>> {
        match NonZeroUsize::new(max_levels) {
            Some(levels) => Ok(SkipList::with_levels(levels, coin)),
            None => Err(Error::InvalidLevels(max_levels)),
        }
    }

    pub(crate) fn with_levels(max_levels: NonZeroUsize, coin: C) -> SkipList<K, V, C> {
        SkipList {
            nodes: Slab::new(),
            head: vec![Link::empty(); max_levels.get()],
            first_arrival: Ptr::Head,
            last_arrival: Ptr::Head,
            next_seq: 0,
            len: 0,
            coin,
        }
    }

    /// Insert `key` with its `payload`, returning the 0-based rank the new
    /// element holds among all stored elements
    ///
    /// An element equal in key to elements already stored is ranked after
    /// them.
    pub fn insert(&mut self, key: K, payload: V) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.nodes.insert(Node {
            key,
            value: payload,
            seq,
            links: Vec::new(),
            next_arrival: Ptr::Head,
        });

        let top = self.head.len() - 1;
        let distance = self.descend(top, Ptr::Head, id).offset();

        match self.last_arrival {
            Ptr::Head => self.first_arrival = Ptr::Node(id),
            Ptr::Node(tail) => self.nodes[tail].next_arrival = Ptr::Node(id),
        }
        self.last_arrival = Ptr::Node(id);
        self.len += 1;

        distance - 1
    }

    // Place node `id` on `level` and every level below it, starting the scan
    // at `left`. Levels are decided bottom up: this level is only offered to
    // the node if the level below linked it.
    fn descend(&mut self, level: usize, mut left: Ptr, id: usize) -> Placement {
        let (key, seq) = (self.nodes[id].key, self.nodes[id].seq);
        let mut walked = 0;
        loop {
            let link = self.link(left, level);
            match link.next {
                Ptr::Node(n) if self.compare(n, &key, seq) != Ordering::Greater => {
                    walked += link.span;
                    left = link.next;
                }
                _ => break,
            }
        }

        if level == 0 {
            self.splice(left, id, 0, 1);
            return Placement::Linked(walked + 1);
        }

        let below = self.descend(level - 1, left, id);
        let offset = below.offset();
        match below {
            Placement::Linked(_) if self.coin.flip() => {
                self.splice(left, id, level, offset);
                Placement::Linked(walked + offset)
            }
            _ => {
                self.link_mut(left, level).span += 1;
                Placement::Skipped(walked + offset)
            }
        }
    }

    // Link node `id`, which sits `offset` steps past `left`, in after `left`
    // on `level`, splitting `left`'s span.
    fn splice(&mut self, left: Ptr, id: usize, level: usize, offset: usize) {
        let old = self.link(left, level);
        debug_assert_eq!(self.nodes[id].links.len(), level);
        self.nodes[id].links.push(Link {
            next: old.next,
            span: old.span + 1 - offset,
        });
        *self.link_mut(left, level) = Link {
            next: Ptr::Node(id),
            span: offset,
        };
    }

    /// Remove the element that has been stored the longest, whatever its key,
    /// and return it
    ///
    /// # Errors
    /// Returns `Error::Empty` when there is nothing to remove.
    pub fn remove_oldest(&mut self) -> Result<(K, V)> {
        let id = match self.first_arrival {
            Ptr::Head => return Err(Error::Empty),
            Ptr::Node(id) => id,
        };
        self.first_arrival = self.nodes[id].next_arrival;
        if self.last_arrival == Ptr::Node(id) {
            self.last_arrival = Ptr::Head;
        }

        // Find the node again by key and sequence. The path taken at
        // insertion time is long gone.
        let (key, seq) = (self.nodes[id].key, self.nodes[id].seq);
        let mut left = Ptr::Head;
        for level in (0..self.head.len()).rev() {
            loop {
                let link = self.link(left, level);
                match link.next {
                    Ptr::Node(n) if self.compare(n, &key, seq) == Ordering::Less => {
                        left = link.next;
                    }
                    _ => break,
                }
            }

            let link = self.link(left, level);
            if link.next == Ptr::Node(id) {
                let unlinked = self.nodes[id].links[level];
                *self.link_mut(left, level) = Link {
                    next: unlinked.next,
                    span: link.span + unlinked.span - 1,
                };
            } else {
                self.link_mut(left, level).span -= 1;
            }
        }

        let node = self.nodes.remove(id);
        self.len -= 1;
        Ok((node.key, node.value))
    }

    /// Return the element of rank `index`, 0 being the smallest
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfBounds` when `index >= len()`.
    pub fn get(&self, index: usize) -> Result<(K, &V)> {
        let id = self.locate(index)?;
        let node = &self.nodes[id];
        Ok((node.key, &node.value))
    }

    /// Return `length` consecutive elements in rank order, starting with the
    /// element of rank `start`
    ///
    /// # Examples
    /// ```
    /// use runquant::skiplist::SkipList;
    ///
    /// let mut list = SkipList::new(4).unwrap();
    /// for k in &[5, 3, 9, 1] {
    ///     list.insert(*k, ());
    /// }
    /// let keys: Vec<i32> = list.sublist(1, 2).unwrap().iter().map(|x| x.0).collect();
    /// assert_eq!(keys, vec![3, 5]);
    /// assert!(list.sublist(3, 2).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfBounds` when the run would extend past the
    /// largest element. Nothing is clamped.
    pub fn sublist(&self, start: usize, length: usize) -> Result<Vec<(K, &V)>> {
        let mut res = Vec::with_capacity(length);
        if length == 0 {
            return Ok(res);
        }
        let mut at = Ptr::Node(self.locate(start)?);
        while res.len() < length {
            match at {
                Ptr::Head => {
                    return Err(Error::IndexOutOfBounds {
                        index: start + res.len(),
                        len: self.len,
                    });
                }
                Ptr::Node(id) => {
                    let node = &self.nodes[id];
                    res.push((node.key, &node.value));
                    at = node.links[0].next;
                }
            }
        }
        Ok(res)
    }

    // Slab key of the element of rank `index`.
    fn locate(&self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let target = index + 1;
        let mut walked = 0;
        let mut at = Ptr::Head;
        for level in (0..self.head.len()).rev() {
            loop {
                let link = self.link(at, level);
                match link.next {
                    Ptr::Node(_) if walked + link.span <= target => {
                        walked += link.span;
                        at = link.next;
                    }
                    _ => break,
                }
            }
            if walked == target {
                break;
            }
        }
        match at {
            Ptr::Node(id) => Ok(id),
            Ptr::Head => unreachable!("rank {} not found in {} elements", index, self.len),
        }
    }

    /// Render each level's chain, top level first
    ///
    /// Every hop is printed as `-span-> key`. The format is meant for people
    /// debugging the structure and may change.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for level in (0..self.head.len()).rev() {
            let _ = write!(out, "L{}: head", level);
            let mut at = Ptr::Head;
            loop {
                let link = self.link(at, level);
                match link.next {
                    Ptr::Head => {
                        let _ = writeln!(out, " -{}-> head", link.span);
                        break;
                    }
                    Ptr::Node(id) => {
                        let _ = write!(out, " -{}-> {:?}", link.span, self.nodes[id].key);
                        at = link.next;
                    }
                }
            }
        }
        out
    }

    fn compare(&self, id: usize, key: &K, seq: u64) -> Ordering {
        let node = &self.nodes[id];
        node.key.key_cmp(key).then(node.seq.cmp(&seq))
    }
}

impl<K, V, C> SkipList<K, V, C> {
    /// Number of elements stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, fixed at construction.
    pub fn max_levels(&self) -> usize {
        self.head.len()
    }

    /// The coin deciding node heights.
    pub fn coin(&self) -> &C {
        &self.coin
    }

    /// The element that `remove_oldest` would remove next.
    pub fn oldest(&self) -> Option<(K, &V)>
    where
        K: Copy,
    {
        match self.first_arrival {
            Ptr::Head => None,
            Ptr::Node(id) => Some((self.nodes[id].key, &self.nodes[id].value)),
        }
    }

    /// Iterate elements in rank order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            at: self.head[0].next,
            remaining: self.len,
        }
    }

    /// Iterate elements oldest first.
    pub fn arrivals(&self) -> Arrivals<'_, K, V> {
        Arrivals {
            nodes: &self.nodes,
            at: self.first_arrival,
            remaining: self.len,
        }
    }

    /// Remove every element. Levels and coin are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        for link in self.head.iter_mut() {
            *link = Link::empty();
        }
        self.first_arrival = Ptr::Head;
        self.last_arrival = Ptr::Head;
        self.len = 0;
    }

    fn link(&self, at: Ptr, level: usize) -> Link {
        match at {
            Ptr::Head => self.head[level],
            Ptr::Node(id) => self.nodes[id].links[level],
        }
    }

    fn link_mut(&mut self, at: Ptr, level: usize) -> &mut Link {
        match at {
            Ptr::Head => &mut self.head[level],
            Ptr::Node(id) => &mut self.nodes[id].links[level],
        }
    }
}

impl<K, V, C> fmt::Debug for SkipList<K, V, C>
where
    K: Copy + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over a `SkipList` in rank order
#[derive(Debug)]
pub struct Iter<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    nodes: &'a Slab<Node<K, V>>,
    at: Ptr,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Copy,
{
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.at {
            Ptr::Head => None,
            Ptr::Node(id) => {
                let node = &self.nodes[id];
                self.at = node.links[0].next;
                self.remaining -= 1;
                Some((node.key, &node.value))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over a `SkipList` oldest element first
#[derive(Debug)]
pub struct Arrivals<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    nodes: &'a Slab<Node<K, V>>,
    at: Ptr,
    remaining: usize,
}

impl<'a, K, V> Iterator for Arrivals<'a, K, V>
where
    K: Copy,
{
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.at {
            Ptr::Head => None,
            Ptr::Node(id) => {
                let node = &self.nodes[id];
                self.at = node.next_arrival;
                self.remaining -= 1;
                Some((node.key, &node.value))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
impl<K, V, C> SkipList<K, V, C>
where
    K: Key,
    C: Coin,
{
    /// Panic unless every structural invariant holds.
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashMap;

        assert_eq!(self.nodes.len(), self.len);

        // level 0 is the complete sorted chain
        let mut position = HashMap::new();
        let mut at = self.head[0].next;
        let mut prev: Option<usize> = None;
        while let Ptr::Node(id) = at {
            if let Some(p) = prev {
                let node = &self.nodes[id];
                assert_eq!(
                    self.compare(p, &node.key, node.seq),
                    Ordering::Less,
                    "level 0 out of order"
                );
            }
            position.insert(id, position.len() + 1);
            prev = Some(id);
            at = self.nodes[id].links[0].next;
        }
        assert_eq!(position.len(), self.len);

        let pos = |p: Ptr, end: usize| match p {
            Ptr::Head => end,
            Ptr::Node(id) => position[&id],
        };
        for level in 0..self.head.len() {
            let mut at = Ptr::Head;
            let mut members = 0;
            let mut total = 0;
            loop {
                let link = self.link(at, level);
                let expected = pos(link.next, self.len) - pos(at, 0);
                assert_eq!(link.span, expected, "bad span on level {}", level);
                total += link.span;
                match link.next {
                    Ptr::Head => break,
                    Ptr::Node(_) => {
                        members += 1;
                        at = link.next;
                    }
                }
            }
            assert_eq!(total, self.len, "spans of level {} do not sum to len", level);
            let tall_enough = self
                .nodes
                .iter()
                .filter(|&(_, n)| n.links.len() > level)
                .count();
            assert_eq!(members, tall_enough, "prefix invariant broken on level {}", level);
        }
        for (_, node) in self.nodes.iter() {
            assert!(!node.links.is_empty() && node.links.len() <= self.head.len());
        }

        // arrival chain
        let mut at = self.first_arrival;
        let mut last = Ptr::Head;
        let mut count = 0;
        let mut last_seq = None;
        while let Ptr::Node(id) = at {
            let seq = self.nodes[id].seq;
            assert!(last_seq.map_or(true, |s| s < seq), "arrival chain out of order");
            last_seq = Some(seq);
            count += 1;
            last = at;
            at = self.nodes[id].next_arrival;
        }
        assert_eq!(count, self.len);
        assert_eq!(last, self.last_arrival);
    }

    pub(crate) fn heights(&self) -> Vec<usize> {
        let mut res = Vec::with_capacity(self.len);
        let mut at = self.head[0].next;
        while let Ptr::Node(id) = at {
            res.push(self.nodes[id].links.len());
            at = self.nodes[id].links[0].next;
        }
        res
    }
}
