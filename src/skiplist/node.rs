/// Where a link points: at the sentinel or at a node in the arena.
///
/// The sentinel closes every chain, so an empty level is the sentinel
/// pointing at itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ptr {
    Head,
    Node(usize),
}

/// One forward reference in a level chain.
///
/// `span` counts the level-0 steps from the owner of this link to `next`.
/// A link back to the sentinel counts only the elements still ahead of its
/// owner, so the spans of the top level sum to the element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub next: Ptr,
    pub span: usize,
}

impl Link {
    pub fn empty() -> Link {
        Link {
            next: Ptr::Head,
            span: 0,
        }
    }
}

#[derive(Debug)]
pub struct Node<K, V> {
    pub key: K,
    pub value: V,
    // Tie breaker among equal keys. Strictly increasing in arrival order.
    pub seq: u64,
    // links[l] is this node's reference on level l; the height is the length.
    pub links: Vec<Link>,
    pub next_arrival: Ptr,
}

/// Outcome of placing a node on one level during insertion.
///
/// Both variants carry the distance, in level-0 steps, from the cursor the
/// level started at to the new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Linked(usize),
    Skipped(usize),
}

impl Placement {
    pub fn offset(self) -> usize {
        match self {
            Placement::Linked(d) | Placement::Skipped(d) => d,
        }
    }
}
