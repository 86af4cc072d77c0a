use thiserror::Error;

use crate::config::PlacementPolicy;

/// Errors reported by [`FirstFit`](crate::FirstFit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("placement policy `{0}` is not supported, only first-fit is implemented")]
  UnsupportedPolicy(PlacementPolicy),

  #[error("host could not reserve an arena of {size} bytes (errno {errno})")]
  HostAllocationFailed { size: usize, errno: i32 },

  #[error("arena of {size} bytes cannot hold a free node header ({min} bytes)")]
  ArenaTooSmall { size: usize, min: usize },

  #[error("allocator is already set up")]
  AlreadyInitialized,

  #[error("validation failed: allocator is not set up or was torn down")]
  InvalidInstance,

  #[error("out of memory: requested {requested} bytes, largest free region is {largest} bytes")]
  OutOfMemory { requested: usize, largest: usize },
}

pub type Result<T> = std::result::Result<T, AllocError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    let err = AllocError::UnsupportedPolicy(PlacementPolicy::BestFit);
    assert_eq!(
      err.to_string(),
      "placement policy `best-fit` is not supported, only first-fit is implemented"
    );

    let err = AllocError::OutOfMemory {
      requested: 64,
      largest: 32,
    };
    assert!(err.to_string().contains("requested 64 bytes"));
  }
}
