// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity ring buffers used for conversion samples and label history.

/// Position inside a ring of `N` slots. Always within \[0, `N` - 1\].
#[derive(Default, Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone)]
pub struct RingIndex<const N: usize>(usize);

impl<const N: usize> RingIndex<N> {
    /// Rejects rings without slots at compile time
    const NON_EMPTY: () = assert!(N > 0, "ring buffers need at least one slot");

    /// Index of the first slot
    pub const ZERO: Self = Self(0);

    /// Create an index, or `None` if `index >= N`
    pub fn new(index: usize) -> Option<Self> {
        (index < N).then_some(Self(index))
    }

    /// Get current index value
    pub fn get(&self) -> usize {
        self.0
    }

    /// Advance by one slot, wrapping to 0 after `N` - 1
    pub fn next(self) -> Self {
        if self.0 + 1 >= N {
            Self(0)
        } else {
            Self(self.0 + 1)
        }
    }

    /// Step `rhs` slots back with defined wrapping. Result will be within range \[0, `N` - 1\].
    pub fn wrapping_sub(self, rhs: usize) -> Self {
        let rhs = rhs % N;
        if rhs > self.0 {
            Self(N - (rhs - self.0))
        } else {
            Self(self.0 - rhs)
        }
    }
}

/// A ring of `N` slots with a single head pointer.
///
/// [`push`](Ring::push) advances the head first and then writes, so the head always names the
/// most recently written slot. Reads walk backwards from the head.
#[derive(Debug, Clone)]
pub struct Ring<T: Copy, const N: usize> {
    /// Storage, never resized
    slots: [T; N],
    /// Most recently written slot
    head: RingIndex<N>,
}

impl<T: Copy, const N: usize> Ring<T, N> {
    /// Create a ring with every slot set to `fill` and the head at slot 0
    pub const fn new(fill: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = RingIndex::<N>::NON_EMPTY;
        Self {
            slots: [fill; N],
            head: RingIndex::ZERO,
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current head position
    pub fn head(&self) -> RingIndex<N> {
        self.head
    }

    /// Advance the head by one slot and store `value` there, overwriting the oldest entry
    pub fn push(&mut self, value: T) {
        self.head = self.head.next();
        self.slots[self.head.get()] = value;
    }

    /// Most recently written value
    pub fn latest(&self) -> T {
        self.slots[self.head.get()]
    }

    /// Value written `steps` pushes ago. `back(0)` is [`latest`](Ring::latest).
    pub fn back(&self, steps: usize) -> T {
        self.slots[self.head.wrapping_sub(steps).get()]
    }

    /// Overwrite the most recent value without moving the head
    pub fn replace_latest(&mut self, value: T) {
        self.slots[self.head.get()] = value;
    }

    /// The `count` most recent values, newest first. `count` is capped at `N`.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = T> + '_ {
        (0..count.min(N)).map(move |steps| self.back(steps))
    }
}
