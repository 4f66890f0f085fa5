//! Sources of the fair coin flips that decide node heights.
//!
//! The skip list never reaches for a global random generator. Whatever
//! implements `Coin` is handed to it at construction, which lets tests force
//! exact structures with `Always` or `Scripted`.

use std::fmt;

use crate::util::Xorshift;

/// A source of fair coin flips
pub trait Coin {
    /// `true` promotes the node being inserted one level further up.
    fn flip(&mut self) -> bool;
}

impl Coin for Xorshift {
    fn flip(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}

impl<C: Coin + ?Sized> Coin for Box<C> {
    fn flip(&mut self) -> bool {
        (**self).flip()
    }
}

impl<'a, C: Coin + ?Sized> Coin for &'a mut C {
    fn flip(&mut self) -> bool {
        (**self).flip()
    }
}

/// A coin that always lands the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Always(bool);

impl Always {
    /// Every node is promoted to the top level.
    pub fn heads() -> Always {
        Always(true)
    }

    /// Every node stays on level 0.
    pub fn tails() -> Always {
        Always(false)
    }
}

impl Coin for Always {
    fn flip(&mut self) -> bool {
        self.0
    }
}

/// A coin that replays a fixed script of flips, then lands tails
///
/// The number of flips consumed is recorded, which makes it possible to
/// assert exactly when the skip list asked for a flip.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    script: Vec<bool>,
    flips: usize,
}

impl Scripted {
    /// Replay `script` in order.
    pub fn new(script: Vec<bool>) -> Scripted {
        Scripted { script, flips: 0 }
    }

    /// How many flips have been asked for so far.
    pub fn flips(&self) -> usize {
        self.flips
    }
}

impl Coin for Scripted {
    fn flip(&mut self) -> bool {
        let res = self.script.get(self.flips).cloned().unwrap_or(false);
        self.flips += 1;
        res
    }
}

/// Adapts any `FnMut() -> bool` into a `Coin`
pub struct FnCoin<F>(pub F);

impl<F> fmt::Debug for FnCoin<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FnCoin")
    }
}

impl<F> Coin for FnCoin<F>
where
    F: FnMut() -> bool,
{
    fn flip(&mut self) -> bool {
        (self.0)()
    }
}
