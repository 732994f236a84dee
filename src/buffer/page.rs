use std::sync::atomic::AtomicI32;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

pub type PageId = i32;
pub type AtomicPageId = AtomicI32;
pub type FrameId = usize;

pub const INVALID_PAGE_ID: PageId = -1;
pub const PAGE_SIZE: usize = 4096;

/// Hint describing why a page is being accessed. Forwarded to the replacer
/// so scan-resistant policies can be plugged in; LRU-K ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Lookup,
    Scan,
    Index,
}

/// A fixed-size frame buffer behind its reader/writer latch.
///
/// The latch guards only the bytes. Frame metadata (page id, pin count,
/// dirty flag) lives with the buffer pool manager under the pool mutex and
/// is updated without touching the latch, so unpinning a page never waits
/// on readers of another page.
#[derive(Debug)]
pub struct Page {
    data: RwLock<Box<[u8; PAGE_SIZE]>>,
}

impl Page {
    pub(crate) fn new() -> Self {
        Self {
            data: RwLock::new(Box::new([0; PAGE_SIZE])),
        }
    }

    /// Shared view of the page bytes. Holds the latch for the borrow.
    pub fn data(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.data.read(), |data| &data[..])
    }

    /// Mutable view of the page bytes. Holds the exclusive latch for the
    /// borrow; callers are expected to report the page dirty on unpin.
    pub fn data_mut(&self) -> MappedRwLockWriteGuard<'_, [u8]> {
        RwLockWriteGuard::map(self.data.write(), |data| &mut data[..])
    }

    pub(crate) fn latch(&self) -> &RwLock<Box<[u8; PAGE_SIZE]>> {
        &self.data
    }

    pub(crate) fn reset(&self) {
        self.data.write().fill(0);
    }
}
