use std::mem;

use crate::arena::{Arena, WORD};

/// Tag stamped into every allocation header.
pub const MAGIC: usize = 0xFACE_B00C;

/// Encodes "no next node" in a free node's link word.
const NIL: usize = usize::MAX;

/// On-arena layout of a free node: `{size, next}` followed by `size` usable bytes.
#[allow(dead_code)]
#[repr(C)]
struct RawNode {
  size: usize,
  next: usize,
}

/// On-arena layout of an allocation header: `{size, magic}` followed by the caller's
/// bytes.
#[allow(dead_code)]
#[repr(C)]
struct RawHeader {
  size: usize,
  magic: usize,
}

/// Footprint of a free node header.
pub const NODE_SIZE: usize = mem::size_of::<RawNode>();

/// Footprint of an allocation header.
pub const HEADER_SIZE: usize = mem::size_of::<RawHeader>();

/// A decoded free-list node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeNode {
  /// Arena offset of the node header.
  pub offset: usize,
  /// Usable bytes after the node header.
  pub size: usize,
  pub next: Option<usize>,
}

impl FreeNode {
  pub(crate) fn read(
    arena: &Arena,
    offset: usize,
  ) -> Self {
    let next = arena.read_word(offset + WORD);
    Self {
      offset,
      size: arena.read_word(offset),
      next: (next != NIL).then_some(next),
    }
  }

  pub(crate) fn write(
    &self,
    arena: &mut Arena,
  ) {
    arena.write_word(self.offset, self.size);
    arena.write_word(self.offset + WORD, self.next.unwrap_or(NIL));
  }

  /// Node header plus usable bytes.
  pub fn actual_size(&self) -> usize {
    self.size + NODE_SIZE
  }

  /// First offset past this node's region.
  pub fn end(&self) -> usize {
    self.offset + self.actual_size()
  }
}

/// A decoded allocation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AllocHeader {
  pub size: usize,
  pub magic: usize,
}

impl AllocHeader {
  pub fn new(size: usize) -> Self {
    Self { size, magic: MAGIC }
  }

  pub fn read(
    arena: &Arena,
    offset: usize,
  ) -> Self {
    Self {
      size: arena.read_word(offset),
      magic: arena.read_word(offset + WORD),
    }
  }

  pub fn write(
    &self,
    arena: &mut Arena,
    offset: usize,
  ) {
    arena.write_word(offset, self.size);
    arena.write_word(offset + WORD, self.magic);
  }

  pub fn is_valid(&self) -> bool {
    self.magic == MAGIC
  }
}
