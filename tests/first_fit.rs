use ffallocator::{
  AllocError, BlockPtr, Config, FirstFit, HEADER_SIZE, NODE_SIZE, PlacementPolicy,
};
use proptest::prelude::*;

const H: usize = NODE_SIZE;
const A: usize = HEADER_SIZE;
const ARENA: usize = 1024;

fn arena(size: usize) -> FirstFit {
  FirstFit::with_config(&Config::new(size, PlacementPolicy::FirstFit)).unwrap()
}

/// Free regions and live blocks must tile without overlap, the free list must be
/// strictly ascending and never hold two touching nodes.
fn check_invariants(
  allocator: &FirstFit,
  live: &[(BlockPtr, usize)],
) {
  let len = allocator.handle().unwrap().len();
  let free: Vec<_> = allocator.free_list().collect();

  for pair in free.windows(2) {
    assert!(pair[0].offset < pair[1].offset, "free list not ascending");
    assert!(pair[0].end() < pair[1].offset, "adjacent free nodes left unmerged");
    assert_eq!(pair[0].next, Some(pair[1].offset));
  }
  if let Some(last) = free.last() {
    assert_eq!(last.next, None);
  }

  let mut spans: Vec<(usize, usize)> = free.iter().map(|n| (n.offset, n.end())).collect();
  spans.extend(
    live
      .iter()
      .map(|(ptr, size)| (ptr.offset() - A - H, ptr.offset() + size)),
  );
  spans.sort();

  for pair in spans.windows(2) {
    assert!(pair[0].1 <= pair[1].0, "overlap between {:?} and {:?}", pair[0], pair[1]);
  }
  if let Some(last) = spans.last() {
    assert!(last.1 <= len);
  }
}

#[test]
fn test_documented_scenario() {
  let mut allocator = arena(ARENA);
  let nodes = |a: &FirstFit| a.free_list().map(|n| n.size).collect::<Vec<_>>();

  assert_eq!(nodes(&allocator), vec![ARENA - H]);

  let ptr = allocator.allocate(100).unwrap();
  assert_eq!(nodes(&allocator), vec![ARENA - H - (100 + A) - H]);

  allocator.release(Some(ptr)).unwrap();
  assert_eq!(nodes(&allocator), vec![ARENA - H]);

  allocator.teardown().unwrap();
}

#[test]
fn test_largest_request_after_setup() {
  for size in [0, 1, 100, ARENA - H - A] {
    let mut allocator = arena(ARENA);
    assert!(allocator.allocate(size).is_ok(), "allocate({}) failed", size);
  }
}

#[test]
fn test_exhaustion_leaves_list_untouched() {
  let mut allocator = arena(ARENA);
  let _a = allocator.allocate(200).unwrap();
  let before: Vec<_> = allocator.free_list().collect();

  let err = allocator.allocate(ARENA).unwrap_err();

  assert_eq!(
    err,
    AllocError::OutOfMemory {
      requested: ARENA,
      largest: before[0].size,
    }
  );
  assert_eq!(allocator.free_list().collect::<Vec<_>>(), before);
}

#[test]
fn test_retry_after_release() {
  let mut allocator = arena(256);
  let a = allocator.allocate(100).unwrap();
  let _b = allocator.allocate(60).unwrap();

  assert!(matches!(
    allocator.allocate(100),
    Err(AllocError::OutOfMemory { .. })
  ));

  allocator.release(Some(a)).unwrap();
  assert_eq!(allocator.allocate(100).unwrap(), a);
}

#[test]
fn test_blocks_keep_their_contents() {
  let mut allocator = arena(ARENA);
  let ptrs: Vec<_> = (0..8u8)
    .map(|i| {
      let ptr = allocator.allocate(16 + i as usize).unwrap();
      allocator.block_mut(ptr).unwrap().fill(i);
      ptr
    })
    .collect();

  for &ptr in ptrs.iter().step_by(2) {
    allocator.release(Some(ptr)).unwrap();
  }

  for (i, &ptr) in ptrs.iter().enumerate().skip(1).step_by(2) {
    let bytes = allocator.block(ptr).unwrap();
    assert_eq!(bytes.len(), 16 + i);
    assert!(bytes.iter().all(|&b| b == i as u8));
  }
}

#[test]
fn test_unsupported_policy_from_config() {
  let config = Config::new(ARENA, PlacementPolicy::WorstFit);
  assert_eq!(
    FirstFit::with_config(&config).err(),
    Some(AllocError::UnsupportedPolicy(PlacementPolicy::WorstFit))
  );
}

#[test]
fn test_host_failure() {
  let config = Config::new(1 << 62, PlacementPolicy::FirstFit);
  assert!(matches!(
    FirstFit::with_config(&config),
    Err(AllocError::HostAllocationFailed { .. })
  ));
}

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    (0usize..160).prop_map(Op::Allocate),
    any::<usize>().prop_map(Op::Release),
  ]
}

proptest! {
  #[test]
  fn prop_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
    let mut allocator = arena(ARENA);
    let mut live: Vec<(BlockPtr, usize)> = Vec::new();

    for op in ops {
      match op {
        Op::Allocate(size) => {
          let before: Vec<_> = allocator.free_list().collect();
          match allocator.allocate(size) {
            Ok(ptr) => live.push((ptr, size)),
            Err(AllocError::OutOfMemory { .. }) => {
              prop_assert!(before.iter().all(|n| n.size < size + A));
              prop_assert_eq!(allocator.free_list().collect::<Vec<_>>(), before);
            }
            Err(err) => prop_assert!(false, "unexpected error {}", err),
          }
        }
        Op::Release(index) if !live.is_empty() => {
          let (ptr, _) = live.swap_remove(index % live.len());
          allocator.release(Some(ptr)).unwrap();
        }
        Op::Release(_) => {}
      }
      check_invariants(&allocator, &live);
    }

    for (ptr, _) in live.drain(..) {
      allocator.release(Some(ptr)).unwrap();
    }

    let free: Vec<_> = allocator.free_list().map(|n| (n.offset, n.size)).collect();
    prop_assert_eq!(free, vec![(0, ARENA - H)]);
  }

  #[test]
  fn prop_round_trip_conserves(
    warmup in prop::collection::vec(0usize..120, 0..6),
    size in 0usize..400,
  ) {
    let mut allocator = arena(ARENA);
    for s in warmup {
      let _ = allocator.allocate(s);
    }

    let before: Vec<_> = allocator.free_list().collect();
    if let Ok(ptr) = allocator.allocate(size) {
      allocator.release(Some(ptr)).unwrap();
      prop_assert_eq!(allocator.free_list().collect::<Vec<_>>(), before);
    }
  }
}
