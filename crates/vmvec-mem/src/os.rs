//! `VirtualMemory` backed by anonymous `mmap` + `mprotect`.
//!
//! Reservations are private anonymous mappings created `PROT_NONE` with
//! `MAP_NORESERVE` where the platform has it, so they cost address space but
//! no commit charge until a prefix is made accessible and touched.

use std::io;
use std::ptr::{self, NonNull};

use once_cell::sync::Lazy;
use vmvec_core::memory::{Protection, VirtualMemory};

#[cfg(any(target_os = "linux", target_os = "android"))]
const MAP_NORESERVE: libc::c_int = libc::MAP_NORESERVE;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MAP_NORESERVE: libc::c_int = 0;

// Used when sysconf cannot answer; every supported target has at least 4 KiB pages.
const FALLBACK_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: Lazy<usize> = Lazy::new(|| {
    // SAFETY: sysconf has no memory-safety preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 {
        raw as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
});

/// OS page size, queried once per process.
pub fn page_size() -> usize {
    *PAGE_SIZE
}

fn prot_flags(mode: Protection) -> libc::c_int {
    match mode {
        Protection::None => libc::PROT_NONE,
        Protection::ReadOnly => libc::PROT_READ,
        Protection::ReadWrite => libc::PROT_READ | libc::PROT_WRITE,
    }
}

/// The host operating system's virtual memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsMemory;

impl VirtualMemory for OsMemory {
    fn page_size(&self) -> usize {
        page_size()
    }

    fn reserve(&self, bytes: usize) -> io::Result<NonNull<u8>> {
        if bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot reserve an empty range",
            ));
        }
        // SAFETY: a fresh anonymous mapping with a null hint does not alias
        // anything we own.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                bytes,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | MAP_NORESERVE,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| io::Error::other("mmap returned a null mapping"))
    }

    unsafe fn protect(&self, addr: NonNull<u8>, bytes: usize, mode: Protection) -> io::Result<()> {
        // SAFETY: caller guarantees `addr..addr+bytes` lies in one live reservation.
        let rc = unsafe { libc::mprotect(addr.as_ptr().cast(), bytes, prot_flags(mode)) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    unsafe fn release(&self, addr: NonNull<u8>, bytes: usize) {
        // SAFETY: caller guarantees this is the whole reservation and it is
        // never touched again.
        let rc = unsafe { libc::munmap(addr.as_ptr().cast(), bytes) };
        if rc != 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                bytes,
                error = %io::Error::last_os_error(),
                "munmap failed; reservation leaked"
            );
        }
    }
}
