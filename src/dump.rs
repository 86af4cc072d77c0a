use std::io::{self, Write};

use crate::first_fit::{BlockPtr, FreeNodes};

/// Writes one tab separated line per free node:
/// `<addr>\t<stored-size>\t<actual-size>\t<next-addr>`.
///
/// Addresses are arena offsets in hex; the last node's successor prints as `none`.
pub fn dump_free_list<W: Write>(
  out: &mut W,
  nodes: FreeNodes<'_>,
) -> io::Result<()> {
  writeln!(out, "About to dump the free list:")?;

  for node in nodes {
    let next = match node.next {
      Some(offset) => format!("{:#x}", offset),
      None => "none".to_string(),
    };

    writeln!(
      out,
      "{:#x}\t{}\t{}\t{}",
      node.offset,
      node.size,
      node.actual_size(),
      next
    )?;
  }

  Ok(())
}

/// Prints an allocation the way the demo reports it.
pub fn print_alloc(
  size: usize,
  ptr: BlockPtr,
) {
  println!("Allocated {} bytes, offset = {:#x}", size, ptr.offset());
}
