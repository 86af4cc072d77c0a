use log::{debug, warn};

use crate::{
  arena::Arena,
  block::{AllocHeader, FreeNode, HEADER_SIZE, NODE_SIZE},
  config::{Config, PlacementPolicy},
  error::{AllocError, Result},
};

/// Offset of the first caller-visible byte of a live block.
///
/// The offset is relative to the arena base. A `BlockPtr` that does not come from
/// [`FirstFit::allocate`] is never dereferenced blindly: it is bounds-checked and its
/// header tag is checked before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPtr(usize);

impl BlockPtr {
  pub fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub fn offset(&self) -> usize {
    self.0
  }
}

/// Base address and length of a set up arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaHandle {
  base: usize,
  len: usize,
}

impl ArenaHandle {
  pub fn base(&self) -> *const u8 {
    self.base as *const u8
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Absolute address of a block inside this arena.
  pub fn address_of(
    &self,
    ptr: BlockPtr,
  ) -> *const u8 {
    self.base().wrapping_add(ptr.offset())
  }
}

/// Free-list summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeStats {
  pub nodes: usize,
  /// Sum of usable bytes over all free nodes.
  pub free_bytes: usize,
  /// Usable bytes of the biggest free node.
  pub largest: usize,
}

/// First-fit allocator over a single arena with an address-ordered free list.
///
/// ```text
///   arena:  ┌──────┬────────┬───────────┬──────┬────────────────────┐
///           │ node │ header │ user data │ node │     free bytes     │
///           └──────┴────────┴───────────┴──────┴────────────────────┘
///                           ▲           ▲
///                       BlockPtr    next free node
/// ```
///
/// The instance is only usable between a successful [`setup`](Self::setup) and
/// [`teardown`](Self::teardown). The validity check is a liveness check on the
/// instance, not a defense against a caller forging pointers.
#[derive(Default)]
pub struct FirstFit {
  arena: Option<Arena>,
  head: Option<usize>,
}

impl FirstFit {
  /// An instance that has not been set up yet. Every operation but `setup` fails
  /// with [`AllocError::InvalidInstance`].
  pub fn new() -> Self {
    Self {
      arena: None,
      head: None,
    }
  }

  pub fn with_config(config: &Config) -> Result<Self> {
    let mut allocator = Self::new();
    allocator.setup(config.size, config.policy)?;
    Ok(allocator)
  }

  pub fn setup(
    &mut self,
    size: usize,
    policy: PlacementPolicy,
  ) -> Result<ArenaHandle> {
    if policy != PlacementPolicy::FirstFit {
      warn!("refusing arena setup with placement policy {}", policy);
      return Err(AllocError::UnsupportedPolicy(policy));
    }

    if self.arena.is_some() {
      warn!("arena setup called on an allocator that is already set up");
      return Err(AllocError::AlreadyInitialized);
    }

    if size < NODE_SIZE {
      return Err(AllocError::ArenaTooSmall {
        size,
        min: NODE_SIZE,
      });
    }

    let mut arena = Arena::reserve(size)?;

    FreeNode {
      offset: 0,
      size: size - NODE_SIZE,
      next: None,
    }
    .write(&mut arena);

    let handle = ArenaHandle {
      base: arena.base() as usize,
      len: arena.len(),
    };

    debug!("arena ready: {} bytes, {} usable", size, size - NODE_SIZE);

    self.arena = Some(arena);
    self.head = Some(0);

    Ok(handle)
  }

  pub fn is_valid(&self) -> bool {
    self.arena.is_some()
  }

  pub fn handle(&self) -> Option<ArenaHandle> {
    self.arena.as_ref().map(|arena| ArenaHandle {
      base: arena.base() as usize,
      len: arena.len(),
    })
  }

  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<BlockPtr> {
    let Some(arena) = self.arena.as_mut() else {
      warn!("allocate({}) on an invalid allocator", size);
      return Err(AllocError::InvalidInstance);
    };

    let Some(needed) = size.checked_add(HEADER_SIZE) else {
      return Err(AllocError::OutOfMemory {
        requested: size,
        largest: largest_free(arena, self.head),
      });
    };

    let mut prev: Option<usize> = None;
    let mut current = self.head;

    while let Some(offset) = current {
      let node = FreeNode::read(arena, offset);

      if node.size >= needed {
        let leftover = node.size - needed;

        let (span, replacement) = if leftover >= NODE_SIZE {
          let split = FreeNode {
            offset: offset + NODE_SIZE + needed,
            size: leftover - NODE_SIZE,
            next: node.next,
          };
          split.write(arena);
          debug!(
            "split node {:#x}: {} bytes stay free at {:#x}",
            offset, split.size, split.offset
          );
          (needed, Some(split.offset))
        } else {
          debug!(
            "node {:#x} consumed whole, {} bytes of slack",
            offset, leftover
          );
          (node.size, node.next)
        };

        // The node slot of a live block keeps its span, slack included.
        FreeNode {
          offset,
          size: span,
          next: None,
        }
        .write(arena);
        AllocHeader::new(size).write(arena, offset + NODE_SIZE);
        relink(arena, &mut self.head, prev, replacement);

        let ptr = BlockPtr(offset + NODE_SIZE + HEADER_SIZE);
        debug!("allocated {} bytes at {:#x}", size, ptr.0);
        return Ok(ptr);
      }

      prev = current;
      current = node.next;
    }

    let largest = largest_free(arena, self.head);
    debug!("allocate({}) failed, largest free region {}", size, largest);

    Err(AllocError::OutOfMemory {
      requested: size,
      largest,
    })
  }

  /// Returns a block to the free list, merging it with adjacent free regions.
  ///
  /// `None`, out of bounds pointers and pointers whose header tag does not match are
  /// ignored, mirroring `free(NULL)`.
  pub fn release(
    &mut self,
    ptr: Option<BlockPtr>,
  ) -> Result<()> {
    let Some(arena) = self.arena.as_mut() else {
      warn!("release({:?}) on an invalid allocator: validation failed", ptr);
      return Err(AllocError::InvalidInstance);
    };

    let Some(ptr) = ptr else {
      return Ok(());
    };

    let Some((offset, header, span)) = locate(arena, ptr) else {
      warn!("release ignored pointer {:#x}: not a live block", ptr.0);
      return Ok(());
    };

    // Cleared so a second release of the same pointer is rejected.
    AllocHeader { magic: 0, ..header }.write(arena, offset + NODE_SIZE);

    let mut freed = FreeNode {
      offset,
      size: span,
      next: None,
    };

    let mut prev: Option<FreeNode> = None;
    let mut current = self.head;

    while let Some(at) = current {
      if at >= offset {
        break;
      }
      let node = FreeNode::read(arena, at);
      current = node.next;
      prev = Some(node);
    }

    freed.next = current;
    if let Some(at) = current {
      if freed.end() == at {
        let successor = FreeNode::read(arena, at);
        debug!("merging {:#x} with following node {:#x}", offset, at);
        freed.size += successor.actual_size();
        freed.next = successor.next;
      }
    }

    freed.write(arena);

    match prev {
      Some(mut before) if before.end() == freed.offset => {
        debug!(
          "merging {:#x} into preceding node {:#x}",
          offset, before.offset
        );
        before.size += freed.actual_size();
        before.next = freed.next;
        before.write(arena);
      }
      Some(mut before) => {
        before.next = Some(freed.offset);
        before.write(arena);
      }
      None => self.head = Some(freed.offset),
    }

    debug!("released {} bytes at {:#x}", header.size, ptr.0);

    Ok(())
  }

  /// Hands the arena back to the host. Blocks still live become unreachable.
  pub fn teardown(&mut self) -> Result<()> {
    let Some(arena) = self.arena.take() else {
      warn!("teardown on an invalid allocator: validation failed");
      return Err(AllocError::InvalidInstance);
    };

    self.head = None;
    debug!("tearing down arena of {} bytes", arena.len());
    drop(arena);

    Ok(())
  }

  /// The caller bytes of a live block, exactly as many as were requested.
  pub fn block(
    &self,
    ptr: BlockPtr,
  ) -> Option<&[u8]> {
    let arena = self.arena.as_ref()?;
    let (_, header, _) = locate(arena, ptr)?;
    Some(&arena.bytes()[ptr.0..ptr.0 + header.size])
  }

  pub fn block_mut(
    &mut self,
    ptr: BlockPtr,
  ) -> Option<&mut [u8]> {
    let arena = self.arena.as_mut()?;
    let (_, header, _) = locate(arena, ptr)?;
    Some(&mut arena.bytes_mut()[ptr.0..ptr.0 + header.size])
  }

  /// Walks the free list from its head, in address order.
  pub fn free_list(&self) -> FreeNodes<'_> {
    FreeNodes {
      arena: self.arena.as_ref(),
      next: self.head,
    }
  }

  pub fn stats(&self) -> FreeStats {
    self
      .free_list()
      .fold(FreeStats::default(), |mut stats, node| {
        stats.nodes += 1;
        stats.free_bytes += node.size;
        stats.largest = stats.largest.max(node.size);
        stats
      })
  }
}

/// Iterator over the free list, see [`FirstFit::free_list`].
pub struct FreeNodes<'a> {
  arena: Option<&'a Arena>,
  next: Option<usize>,
}

impl Iterator for FreeNodes<'_> {
  type Item = FreeNode;

  fn next(&mut self) -> Option<Self::Item> {
    let arena = self.arena?;
    let node = FreeNode::read(arena, self.next?);
    self.next = node.next;
    Some(node)
  }
}

/// Node offset, header and span of the live block behind `ptr`, if it is one.
///
/// The span is the usable size the block will have once freed: the request plus its
/// header, plus any slack left by a whole-node allocation.
fn locate(
  arena: &Arena,
  ptr: BlockPtr,
) -> Option<(usize, AllocHeader, usize)> {
  let offset = ptr.0.checked_sub(NODE_SIZE + HEADER_SIZE)?;
  if ptr.0 > arena.len() {
    return None;
  }

  let header = AllocHeader::read(arena, ptr.0 - HEADER_SIZE);
  if !header.is_valid() {
    return None;
  }

  let exact = header.size.checked_add(HEADER_SIZE)?;
  let slot = FreeNode::read(arena, offset).size;
  let span = if slot >= exact && slot - exact < NODE_SIZE {
    slot
  } else {
    exact
  };

  let end = (offset + NODE_SIZE).checked_add(span)?;
  (end <= arena.len()).then_some((offset, header, span))
}

/// Points `prev` (or the head when there is none) at `next`.
fn relink(
  arena: &mut Arena,
  head: &mut Option<usize>,
  prev: Option<usize>,
  next: Option<usize>,
) {
  match prev {
    Some(offset) => {
      let mut node = FreeNode::read(arena, offset);
      node.next = next;
      node.write(arena);
    }
    None => *head = next,
  }
}

fn largest_free(
  arena: &Arena,
  head: Option<usize>,
) -> usize {
  FreeNodes {
    arena: Some(arena),
    next: head,
  }
  .map(|node| node.size)
  .max()
  .unwrap_or(0)
}
