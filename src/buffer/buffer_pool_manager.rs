//! Buffer pool manager: admits pages into a fixed set of frames, tracks
//! pins and dirtiness, and evicts through the LRU-K replacer.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::page::{
    AccessType, AtomicPageId, FrameId, Page, PageId, INVALID_PAGE_ID,
};
use crate::buffer::page_guard::{
    self, BasicPageGuard, ReadPageGuard, WritePageGuard,
};
use crate::config::BufferPoolConfig;
use crate::error::{FolioError, FolioResult};
use crate::storage::disk_manager::DiskManager;
use crate::utils::cache::lru_k::LRUKReplacer;
use crate::utils::cache::Replacer;

/// Per-frame bookkeeping, protected by the pool mutex.
#[derive(Debug, Clone)]
pub struct FrameMeta {
    pub page_id: PageId,
    pub pin_count: u32,
    pub is_dirty: bool,
}

impl Default for FrameMeta {
    fn default() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            is_dirty: false,
        }
    }
}

#[derive(Debug)]
struct PoolState {
    page_table: HashMap<PageId, FrameId>,
    // frames holding no page, consumed from the front, returned to the back
    free_list: VecDeque<FrameId>,
    metas: Vec<FrameMeta>,
    replacer: LRUKReplacer,
}

#[derive(Debug)]
pub struct BufferPoolManager {
    frames: Vec<Arc<Page>>,
    state: Mutex<PoolState>,
    next_page_id: AtomicPageId,
    disk_manager: Arc<dyn DiskManager>,
}

impl BufferPoolManager {
    pub fn new(num_pages: usize, replacer_k: usize, disk_manager: Arc<dyn DiskManager>) -> Self {
        Self::new_with_config(
            BufferPoolConfig {
                buffer_pool_size: num_pages,
                lru_k_k: replacer_k,
            },
            disk_manager,
        )
    }

    pub fn new_with_config(config: BufferPoolConfig, disk_manager: Arc<dyn DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(config.buffer_pool_size);
        let mut free_list = VecDeque::with_capacity(config.buffer_pool_size);
        for frame_id in 0..config.buffer_pool_size {
            frames.push(Arc::new(Page::new()));
            free_list.push_back(frame_id);
        }

        Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                metas: vec![FrameMeta::default(); config.buffer_pool_size],
                replacer: LRUKReplacer::new(config.buffer_pool_size, config.lru_k_k),
            }),
            next_page_id: AtomicPageId::new(0),
            disk_manager,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    pub fn disk_manager(&self) -> Arc<dyn DiskManager> {
        self.disk_manager.clone()
    }

    /// Allocate a fresh page id, bind it to a frame and return the frame
    /// pinned once. Fails when every frame is pinned.
    pub fn new_page(&self) -> FolioResult<(PageId, Arc<Page>)> {
        let mut state = self.state.lock();
        let frame_id = self.allocate_frame(&mut state)?;
        let page_id = self.next_page_id.fetch_add(1, Ordering::SeqCst);

        self.frames[frame_id].reset();
        let meta = &mut state.metas[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;
        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id, AccessType::Unknown)?;
        state.replacer.set_evictable(frame_id, false);

        Ok((page_id, self.frames[frame_id].clone()))
    }

    /// Pin the page, reading it from disk if it is not resident. Fails for
    /// the invalid page id and when no frame can be freed.
    pub fn fetch_page(&self, page_id: PageId, access_type: AccessType) -> FolioResult<Arc<Page>> {
        if page_id == INVALID_PAGE_ID {
            return Err(FolioError::Buffer("fetch_page: invalid page id".to_string()));
        }

        let mut state = self.state.lock();
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.metas[frame_id].pin_count += 1;
            state.replacer.record_access(frame_id, access_type)?;
            state.replacer.set_evictable(frame_id, false);
            return Ok(self.frames[frame_id].clone());
        }

        let frame_id = self.allocate_frame(&mut state)?;
        {
            let mut data = self.frames[frame_id].latch().write();
            self.disk_manager.read_page(page_id, &mut data[..])?;
        }
        let meta = &mut state.metas[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;
        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id, access_type)?;
        state.replacer.set_evictable(frame_id, false);

        Ok(self.frames[frame_id].clone())
    }

    /// Drop one pin on the page. The dirty flag is sticky: once a caller
    /// reports the page dirty it stays dirty until flushed. Returns false
    /// when the page is not resident or its pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let meta = &mut state.metas[frame_id];
        if meta.pin_count == 0 {
            return false;
        }
        meta.is_dirty |= is_dirty;
        meta.pin_count -= 1;
        if meta.pin_count == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Write the page to disk and clear its dirty flag, pinned or not.
    /// Returns false when the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> FolioResult<bool> {
        if page_id == INVALID_PAGE_ID {
            return Ok(false);
        }
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };
        {
            let data = self.frames[frame_id].data();
            self.disk_manager.write_page(page_id, &data[..])?;
        }
        state.metas[frame_id].is_dirty = false;
        Ok(true)
    }

    /// Write every resident dirty page to disk.
    pub fn flush_all_pages(&self) -> FolioResult<()> {
        let mut state = self.state.lock();
        for frame_id in 0..self.frames.len() {
            let meta = &state.metas[frame_id];
            if meta.page_id == INVALID_PAGE_ID || !meta.is_dirty {
                continue;
            }
            let page_id = meta.page_id;
            {
                let data = self.frames[frame_id].data();
                self.disk_manager.write_page(page_id, &data[..])?;
            }
            state.metas[frame_id].is_dirty = false;
        }
        Ok(())
    }

    /// Evict the page from memory and retire its id. Succeeds trivially for
    /// non-resident pages; fails while the page is pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };
        if state.metas[frame_id].pin_count > 0 {
            return false;
        }
        state.page_table.remove(&page_id);
        state.metas[frame_id] = FrameMeta::default();
        self.frames[frame_id].reset();
        // Stale history must not skew future evictions.
        state.replacer.remove(frame_id);
        state.free_list.push_back(frame_id);
        true
    }

    pub fn new_page_guarded(self: &Arc<Self>) -> FolioResult<BasicPageGuard> {
        let (page_id, page) = self.new_page()?;
        Ok(page_guard::new_basic_guard(Arc::clone(self), page_id, page))
    }

    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> FolioResult<BasicPageGuard> {
        let page = self.fetch_page(page_id, AccessType::Unknown)?;
        Ok(page_guard::new_basic_guard(Arc::clone(self), page_id, page))
    }

    /// Fetch and take the shared latch. The latch is acquired after the
    /// pool mutex is released, so a blocked latch never stalls the pool.
    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> FolioResult<ReadPageGuard> {
        let basic = self.fetch_page_basic(page_id)?;
        Ok(page_guard::new_read_guard(basic))
    }

    /// Fetch and take the exclusive latch, as `fetch_page_read`.
    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> FolioResult<WritePageGuard> {
        let basic = self.fetch_page_basic(page_id)?;
        Ok(page_guard::new_write_guard(basic))
    }

    /// Snapshot of the frame metadata for a resident page.
    pub fn page_meta(&self, page_id: PageId) -> Option<FrameMeta> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(state.metas[frame_id].clone())
    }

    pub fn page_pin_count(&self, page_id: PageId) -> Option<u32> {
        self.page_meta(page_id).map(|meta| meta.pin_count)
    }

    pub fn evictable_count(&self) -> usize {
        self.state.lock().replacer.size()
    }

    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Pop a free frame, or evict one, writing the victim back first when it
    /// is dirty. The returned frame is unmapped with default metadata.
    fn allocate_frame(&self, state: &mut PoolState) -> FolioResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }
        let Some(frame_id) = state.replacer.evict() else {
            return Err(FolioError::Buffer(
                "buffer pool is full and no frame is evictable".to_string(),
            ));
        };
        let meta = state.metas[frame_id].clone();
        if meta.page_id != INVALID_PAGE_ID {
            if meta.is_dirty {
                let data = self.frames[frame_id].data();
                self.disk_manager.write_page(meta.page_id, &data[..])?;
            }
            state.page_table.remove(&meta.page_id);
        }
        state.metas[frame_id] = FrameMeta::default();
        Ok(frame_id)
    }
}
