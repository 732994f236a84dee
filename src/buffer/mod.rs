mod buffer_pool_manager;
mod page;
mod page_guard;

pub use buffer_pool_manager::{BufferPoolManager, FrameMeta};
pub use page::{AccessType, AtomicPageId, FrameId, Page, PageId, INVALID_PAGE_ID, PAGE_SIZE};
pub use page_guard::{BasicPageGuard, ReadPageGuard, WritePageGuard};
