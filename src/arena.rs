use std::{io, mem, ptr::NonNull, slice};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void};
use log::debug;

use crate::error::{AllocError, Result};

pub(crate) const WORD: usize = mem::size_of::<usize>();

/// One anonymous private mapping, unmapped on drop.
///
/// Every access goes through a bounds-checked slice, so an offset past the end of the
/// mapping panics instead of touching foreign memory.
pub(crate) struct Arena {
  base: NonNull<u8>,
  len: usize,
}

impl Arena {
  pub fn reserve(len: usize) -> Result<Self> {
    let address = unsafe {
      libc::mmap(
        std::ptr::null_mut(),
        len,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
      return Err(AllocError::HostAllocationFailed { size: len, errno });
    }

    let base = NonNull::new(address as *mut u8).ok_or(AllocError::HostAllocationFailed {
      size: len,
      errno: 0,
    })?;

    debug!("mapped arena of {} bytes at {:?}", len, base);

    Ok(Self { base, len })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn base(&self) -> *const u8 {
    self.base.as_ptr()
  }

  pub fn bytes(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.len) }
  }

  pub fn bytes_mut(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
  }

  pub fn read_word(
    &self,
    offset: usize,
  ) -> usize {
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(&self.bytes()[offset..offset + WORD]);
    usize::from_ne_bytes(raw)
  }

  pub fn write_word(
    &mut self,
    offset: usize,
    value: usize,
  ) {
    self.bytes_mut()[offset..offset + WORD].copy_from_slice(&value.to_ne_bytes());
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    debug!("unmapping arena of {} bytes at {:?}", self.len, self.base);
    unsafe {
      libc::munmap(self.base.as_ptr() as *mut c_void, self.len);
    }
  }
}
