use dashmap::DashMap;

use crate::buffer::{PageId, PAGE_SIZE};
use crate::error::{FolioError, FolioResult};
use crate::storage::disk_manager::DiskManager;

/// Disk manager backed by an in-memory page map that grows to fit any page
/// id it sees. Pages never written read as zeroes.
#[derive(Debug, Default)]
pub struct MemoryDiskManager {
    pages: DashMap<PageId, Box<[u8; PAGE_SIZE]>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> FolioResult<()> {
        if page_id < 0 {
            return Err(FolioError::Storage(format!("invalid page id {}", page_id)));
        }
        if buf.len() != PAGE_SIZE {
            return Err(FolioError::Internal(format!(
                "read buffer is {} bytes, expected {}",
                buf.len(),
                PAGE_SIZE
            )));
        }
        match self.pages.get(&page_id) {
            Some(page) => buf.copy_from_slice(&page[..]),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> FolioResult<()> {
        if page_id < 0 {
            return Err(FolioError::Storage(format!("invalid page id {}", page_id)));
        }
        if data.len() != PAGE_SIZE {
            return Err(FolioError::Internal(format!(
                "write buffer is {} bytes, expected {}",
                data.len(),
                PAGE_SIZE
            )));
        }
        let mut page = self
            .pages
            .entry(page_id)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]));
        page.copy_from_slice(data);
        Ok(())
    }

    fn shut_down(&self) -> FolioResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_expands_per_written_page() {
        let disk_manager = MemoryDiskManager::new();
        assert_eq!(disk_manager.page_count(), 0);

        let data = [7u8; PAGE_SIZE];
        disk_manager.write_page(0, &data).unwrap();
        disk_manager.write_page(100, &data).unwrap();
        assert_eq!(disk_manager.page_count(), 2);

        let mut buf = [0u8; PAGE_SIZE];
        disk_manager.read_page(100, &mut buf).unwrap();
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn unknown_pages_read_as_zeroes() {
        let disk_manager = MemoryDiskManager::new();
        let mut buf = [9u8; PAGE_SIZE];
        disk_manager.read_page(12, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }
}
