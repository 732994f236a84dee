use std::mem::{self, ManuallyDrop};
use std::sync::Arc;

use log::error;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard,
};

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::buffer::page::{AccessType, Page, PageId, PAGE_SIZE};

/// Scoped pin on a buffered page. Dropping the guard unpins the page,
/// reporting it dirty when a mutable view was handed out at any point.
#[derive(Debug)]
pub struct BasicPageGuard {
    bpm: Arc<BufferPoolManager>,
    page: Arc<Page>,
    page_id: PageId,
    dirty_hint: bool,
}

impl BasicPageGuard {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Shared view of the page bytes, latched for the borrow.
    pub fn data(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        self.page.data()
    }

    /// Mutable view of the page bytes, exclusively latched for the borrow.
    /// The page will be unpinned dirty.
    pub fn data_mut(&mut self) -> MappedRwLockWriteGuard<'_, [u8]> {
        self.dirty_hint = true;
        self.page.data_mut()
    }

    pub fn pin_count(&self) -> u32 {
        self.bpm.page_pin_count(self.page_id).unwrap_or(0)
    }

    pub fn is_dirty(&self) -> bool {
        self.bpm
            .page_meta(self.page_id)
            .map(|meta| meta.is_dirty)
            .unwrap_or(false)
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        if !self
            .bpm
            .unpin_page(self.page_id, self.dirty_hint, AccessType::Unknown)
        {
            error!("failed to unpin page {} on guard drop", self.page_id);
        }
    }
}

/// Scoped pin plus the shared latch, both held until drop.
#[derive(Debug)]
pub struct ReadPageGuard {
    // Dropped by hand before `inner` releases the pin.
    latch: ManuallyDrop<RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>>>,
    inner: BasicPageGuard,
}

impl ReadPageGuard {
    pub fn page_id(&self) -> PageId {
        self.inner.page_id()
    }

    pub fn data(&self) -> &[u8] {
        &self.latch[..]
    }

    pub fn pin_count(&self) -> u32 {
        self.inner.pin_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        // The latch goes first; `inner` then unpins, making the frame
        // evictable only once it is unlatched.
        unsafe { ManuallyDrop::drop(&mut self.latch) };
    }
}

/// Scoped pin plus the exclusive latch, both held until drop. Always
/// unpins dirty.
#[derive(Debug)]
pub struct WritePageGuard {
    // Dropped by hand before `inner` releases the pin.
    latch: ManuallyDrop<RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>>>,
    inner: BasicPageGuard,
}

impl WritePageGuard {
    pub fn page_id(&self) -> PageId {
        self.inner.page_id()
    }

    pub fn data(&self) -> &[u8] {
        &self.latch[..]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.latch[..]
    }

    pub fn pin_count(&self) -> u32 {
        self.inner.pin_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        unsafe { ManuallyDrop::drop(&mut self.latch) };
    }
}

pub(crate) fn new_basic_guard(
    bpm: Arc<BufferPoolManager>,
    page_id: PageId,
    page: Arc<Page>,
) -> BasicPageGuard {
    BasicPageGuard {
        bpm,
        page,
        page_id,
        dirty_hint: false,
    }
}

pub(crate) fn new_read_guard(inner: BasicPageGuard) -> ReadPageGuard {
    let guard = inner.page.latch().read();
    // The Arc in `inner` keeps the lock alive for the guard's lifetime.
    let latch = unsafe {
        mem::transmute::<
            RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>>,
            RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>>,
        >(guard)
    };
    ReadPageGuard {
        latch: ManuallyDrop::new(latch),
        inner,
    }
}

pub(crate) fn new_write_guard(mut inner: BasicPageGuard) -> WritePageGuard {
    inner.dirty_hint = true;
    let guard = inner.page.latch().write();
    // The Arc in `inner` keeps the lock alive for the guard's lifetime.
    let latch = unsafe {
        mem::transmute::<
            RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>>,
            RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>>,
        >(guard)
    };
    WritePageGuard {
        latch: ManuallyDrop::new(latch),
        inner,
    }
}
