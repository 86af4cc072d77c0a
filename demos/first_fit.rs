use std::io;

use ffallocator::{Config, FirstFit, dump_free_list, print_alloc};

/// Prints the free list to stdout.
fn show_free_list(
  label: &str,
  allocator: &FirstFit,
) {
  println!("\n[{}] {:?}", label, allocator.stats());
  let _ = dump_free_list(&mut io::stdout().lock(), allocator.free_list());
}

fn main() {
  // FFALLOC_ARENA_SIZE / FFALLOC_POLICY override the 1 KiB first-fit default.
  let config = match Config::from_env() {
    Ok(config) => config,
    Err(err) => {
      eprintln!("bad configuration: {}", err);
      std::process::exit(2);
    }
  };

  let mut allocator = match FirstFit::with_config(&config) {
    Ok(allocator) => allocator,
    Err(err) => {
      eprintln!("setup failed: {}", err);
      std::process::exit(1);
    }
  };

  if let Some(handle) = allocator.handle() {
    println!(
      "Arena of {} bytes mapped at {:?}",
      handle.len(),
      handle.base()
    );
  }
  show_free_list("start", &allocator);

  // --------------------------------------------------------------------
  // 1) Three allocations carve the single free node from the front.
  // --------------------------------------------------------------------
  let mut blocks = Vec::new();
  for size in [100, 24, 64] {
    match allocator.allocate(size) {
      Ok(ptr) => {
        print_alloc(size, ptr);
        blocks.push(ptr);
      }
      Err(err) => println!("allocate({}) failed: {}", size, err),
    }
  }
  show_free_list("after three allocations", &allocator);

  // --------------------------------------------------------------------
  // 2) Write into the middle block to show it's usable.
  // --------------------------------------------------------------------
  if let Some(&ptr) = blocks.get(1) {
    if let Some(bytes) = allocator.block_mut(ptr) {
      bytes.fill(0xAB);
      println!("\n[2] Filled second block with 0xAB");
    }
  }

  // --------------------------------------------------------------------
  // 3) Free the first and third blocks. They are not adjacent, so the
  //    free list now has a hole at the front.
  // --------------------------------------------------------------------
  for index in [0, 2] {
    if let Some(&ptr) = blocks.get(index) {
      let _ = allocator.release(Some(ptr));
    }
  }
  show_free_list("after freeing first and third", &allocator);

  // --------------------------------------------------------------------
  // 4) Freeing the middle block merges everything back into one node.
  // --------------------------------------------------------------------
  if let Some(&ptr) = blocks.get(1) {
    let _ = allocator.release(Some(ptr));
  }
  show_free_list("after freeing the middle block", &allocator);

  // --------------------------------------------------------------------
  // 5) Ask for more than the arena holds.
  // --------------------------------------------------------------------
  if let Err(err) = allocator.allocate(config.size) {
    println!("\n[5] {}", err);
  }

  let _ = allocator.teardown();
  println!("\n[6] Arena released. Further calls fail: {:?}", allocator.allocate(1));
}
