//! RAII ownership of one raw memory region
//!
//! [`NativeBuffer`] marshals variable-length data handed back by low-level
//! filesystem queries. The region is allocated once, validated on every
//! access, and freed exactly once no matter how the owning scope exits.

use bytes::Bytes;
use fsporter_types::{Result, TransferError};
use std::alloc::{self, Layout};
use std::ptr::NonNull;

struct Region {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

/// An exclusively owned, fixed-length raw memory region
///
/// The type is deliberately not `Clone`: one region has one owner.
/// Dropping the buffer releases the region unless [`NativeBuffer::release`]
/// already did; the two paths together free the allocation exactly once.
pub struct NativeBuffer {
    region: Option<Region>,
}

// SAFETY: the buffer is the sole owner of its region; no aliasing pointers
// escape, and shared references only permit reads.
unsafe impl Send for NativeBuffer {}
unsafe impl Sync for NativeBuffer {}

impl NativeBuffer {
    /// Allocate a zero-initialized region of exactly `length` bytes
    ///
    /// A zero-length buffer allocates nothing but behaves like any other
    /// buffer. Fails with `InvalidArgument` when `length` cannot be
    /// expressed as an allocation on this platform.
    pub fn allocate(length: usize) -> Result<Self> {
        if length == 0 {
            return Ok(Self {
                region: Some(Region {
                    ptr: NonNull::dangling(),
                    len: 0,
                    layout: Layout::new::<u8>(),
                }),
            });
        }

        let layout = Layout::array::<u8>(length).map_err(|_| {
            TransferError::invalid_argument(format!("buffer length {length} overflows"))
        })?;
        // SAFETY: the layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        Ok(Self {
            region: Some(Region {
                ptr,
                len: length,
                layout,
            }),
        })
    }

    /// Length of the region in bytes; zero once released
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, |region| region.len)
    }

    /// Check if the region is zero-length or released
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the region has been released
    pub fn is_released(&self) -> bool {
        self.region.is_none()
    }

    fn live_region(&self) -> Result<&Region> {
        self.region
            .as_ref()
            .ok_or_else(|| TransferError::invalid_argument("buffer has been released"))
    }

    fn check_range(region: &Region, offset: usize, length: usize) -> Result<()> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| TransferError::invalid_argument("buffer range overflows"))?;
        if end > region.len {
            return Err(TransferError::invalid_argument(format!(
                "range {offset}..{end} exceeds buffer length {}",
                region.len
            )));
        }
        Ok(())
    }

    /// Write `source` into the region starting at `offset`
    ///
    /// Fails with `InvalidArgument`, before touching memory, when the range
    /// does not fit or the buffer was released.
    pub fn copy_in(&mut self, source: &[u8], offset: usize) -> Result<()> {
        let region = self.live_region()?;
        Self::check_range(region, offset, source.len())?;
        if source.is_empty() {
            return Ok(());
        }
        // SAFETY: the range was validated against the region length, and the
        // region cannot overlap a caller-provided slice.
        unsafe {
            std::ptr::copy_nonoverlapping(
                source.as_ptr(),
                region.ptr.as_ptr().add(offset),
                source.len(),
            );
        }
        Ok(())
    }

    /// Read `length` bytes starting at `offset` into `destination`
    ///
    /// Fails with `InvalidArgument`, before touching memory, when
    /// `destination` is too small, the range does not fit, or the buffer was
    /// released. A failed call never partially writes `destination`.
    pub fn copy_out(&self, destination: &mut [u8], offset: usize, length: usize) -> Result<()> {
        let region = self.live_region()?;
        if destination.len() < length {
            return Err(TransferError::invalid_argument(format!(
                "destination holds {} bytes, {length} requested",
                destination.len()
            )));
        }
        Self::check_range(region, offset, length)?;
        if length == 0 {
            return Ok(());
        }
        // SAFETY: both the region range and the destination length were
        // validated above.
        unsafe {
            std::ptr::copy_nonoverlapping(
                region.ptr.as_ptr().add(offset),
                destination.as_mut_ptr(),
                length,
            );
        }
        Ok(())
    }

    /// Materialize `length` bytes starting at `offset`
    ///
    /// On an already-released buffer this returns an empty sequence instead
    /// of touching freed memory. Out-of-range requests on a live buffer fail
    /// with `InvalidArgument`.
    pub fn to_byte_sequence(&self, offset: usize, length: usize) -> Result<Bytes> {
        let Some(region) = self.region.as_ref() else {
            return Ok(Bytes::new());
        };
        Self::check_range(region, offset, length)?;
        if length == 0 {
            return Ok(Bytes::new());
        }
        let mut out = vec![0u8; length];
        // SAFETY: the range was validated against the region length.
        unsafe {
            std::ptr::copy_nonoverlapping(
                region.ptr.as_ptr().add(offset),
                out.as_mut_ptr(),
                length,
            );
        }
        Ok(Bytes::from(out))
    }

    /// Release the region now instead of waiting for drop
    ///
    /// Idempotent; the eventual drop of a released buffer frees nothing.
    pub fn release(&mut self) {
        if let Some(region) = self.region.take() {
            if region.len > 0 {
                // SAFETY: the pointer came from `alloc_zeroed` with exactly
                // this layout, and `take` guarantees a single deallocation.
                unsafe { alloc::dealloc(region.ptr.as_ptr(), region.layout) }
            }
        }
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("len", &self.len())
            .field("released", &self.is_released())
            .finish()
    }
}
