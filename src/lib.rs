//! # ffallocator - A First-Fit Arena Allocator
//!
//! This crate provides a **first-fit allocator** that manages one pre-reserved arena
//! of raw memory through an address-ordered free list.
//!
//! ## Overview
//!
//! The arena is mapped once with `mmap(2)` and never grows. Free space is tracked by
//! nodes written into the arena itself, each one pointing at the next free region:
//!
//! ```text
//!   First-Fit Free List:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌──────┬───────┬──────┬──────────┬──────┬────────┬──────────────┐  │
//!   │   │ free │ A1    │ free │ A2       │ A3   │ free   │ A4           │  │
//!   │   └──────┴───────┴──────┴──────────┴──────┴────────┴──────────────┘  │
//!   │      │            ▲  │                     ▲                         │
//!   │      └────────────┘  └─────────────────────┘                         │
//!   │         next            next                                         │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation takes the first free region that is big enough.
//!   Release puts the region back in address order and merges neighbours.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   ffallocator
//!   ├── arena      - mmap-backed arena with bounds-checked word access (internal)
//!   ├── block      - Free node and allocation header layout
//!   ├── config     - Config and PlacementPolicy
//!   ├── dump       - Free list diagnostics
//!   ├── error      - AllocError
//!   └── first_fit  - FirstFit implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ffallocator::{FirstFit, PlacementPolicy};
//!
//! let mut allocator = FirstFit::new();
//! allocator.setup(1024, PlacementPolicy::FirstFit).unwrap();
//!
//! let ptr = allocator.allocate(5).unwrap();
//! allocator.block_mut(ptr).unwrap().copy_from_slice(b"hello");
//! assert_eq!(allocator.block(ptr).unwrap(), b"hello");
//!
//! allocator.release(Some(ptr)).unwrap();
//! allocator.teardown().unwrap();
//! ```
//!
//! ## How It Works
//!
//! Every region starts with a node-sized slot. While the region is free the slot holds
//! the node; once allocated, it keeps the span of the block and the allocation header
//! follows it:
//!
//! ```text
//!   Free Region:
//!   ┌───────────────────────┬────────────────────────────────────────────┐
//!   │  size  │  next        │            size usable bytes               │
//!   └───────────────────────┴────────────────────────────────────────────┘
//!
//!   Live Block:
//!   ┌───────────────────────┬──────────────────┬─────────────────────────┐
//!   │  span  │  (unused)    │  size  │  magic  │     N bytes usable      │
//!   └───────────────────────┴──────────────────┴─────────────────────────┘
//!                                              ▲
//!                                              └── BlockPtr returned to user
//! ```
//!
//! A request for `N` bytes needs `N` plus one header from a free node's usable bytes.
//! If what is left can still hold a node it stays on the free list, otherwise the
//! whole region goes to the caller.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `FirstFit` is neither `Send` nor `Sync`
//! - **Fixed arena**: no growth after setup
//! - **First-fit only**: other placement policies are rejected at setup
//! - **No alignment guarantees** beyond the header sizes
//! - **Unix-only**: requires `libc` and `mmap`

mod arena;
pub mod block;
pub mod config;
pub mod dump;
pub mod error;
mod first_fit;

pub use block::{FreeNode, HEADER_SIZE, NODE_SIZE};
pub use config::{Config, ConfigError, PlacementPolicy};
pub use dump::{dump_free_list, print_alloc};
pub use error::{AllocError, Result};
pub use first_fit::{ArenaHandle, BlockPtr, FirstFit, FreeNodes, FreeStats};
