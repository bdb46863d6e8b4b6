use std::fmt::{self, Debug, Formatter};

type BitBlock = u64;

const BLOCK_NBITS: usize = std::mem::size_of::<BitBlock>() * 8;

/// Fixed-capacity set of token ids.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct TokenSet {
  slice: Box<[BitBlock]>,
}

impl TokenSet {
  pub(crate) fn new(num_tokens: usize) -> Self {
    let len = (num_tokens + BLOCK_NBITS - 1) / BLOCK_NBITS;
    Self {
      slice: vec![0; len].into_boxed_slice(),
    }
  }

  pub(crate) fn from_token(num_tokens: usize, token: u32) -> Self {
    let mut s = Self::new(num_tokens);
    s.insert(token);
    s
  }

  pub(crate) fn insert(&mut self, token: u32) {
    self.slice[token as usize / BLOCK_NBITS] |= 1 << (token as usize % BLOCK_NBITS);
  }

  pub(crate) fn remove(&mut self, token: u32) {
    self.slice[token as usize / BLOCK_NBITS] &= !(1 << (token as usize % BLOCK_NBITS));
  }

  pub(crate) fn contains(&self, token: u32) -> bool {
    self.slice[token as usize / BLOCK_NBITS] & (1 << (token as usize % BLOCK_NBITS)) != 0
  }

  /// Returns whether the set has changed.
  pub(crate) fn union_with(&mut self, other: &TokenSet) -> bool {
    let mut changed = false;
    for (x, y) in self.slice.iter_mut().zip(other.slice.iter()) {
      let old = *x;
      *x |= *y;
      changed |= old != *x;
    }
    changed
  }

  pub(crate) fn iter(&self) -> Iter<'_> {
    Iter {
      slice: &self.slice,
      index: 0,
      current: 0,
    }
  }
}

/// Yields token ids in ascending order.
pub(crate) struct Iter<'a> {
  slice: &'a [BitBlock],
  /// index of the next block to load
  index: usize,
  /// unvisited bits of the block before `index`
  current: BitBlock,
}

impl<'a> Iterator for Iter<'a> {
  type Item = u32;

  fn next(&mut self) -> Option<u32> {
    while self.current == 0 {
      self.current = *self.slice.get(self.index)?;
      self.index += 1;
    }
    let bit = self.current.trailing_zeros() as usize;
    self.current &= self.current - 1;
    Some(((self.index - 1) * BLOCK_NBITS + bit) as u32)
  }
}

impl Debug for TokenSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}
