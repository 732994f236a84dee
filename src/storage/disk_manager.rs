use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{PageId, PAGE_SIZE};
use crate::error::{FolioError, FolioResult};

/// Synchronous page I/O consumed by the buffer pool.
pub trait DiskManager: Send + Sync + std::fmt::Debug {
    /// Fill `buf` with the `PAGE_SIZE` bytes stored for `page_id`. Pages
    /// that were never written read as zeroes.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> FolioResult<()>;

    /// Persist `data` (`PAGE_SIZE` bytes) for `page_id`.
    fn write_page(&self, page_id: PageId, data: &[u8]) -> FolioResult<()>;

    /// Flush and close the backing storage. Further I/O is an error.
    fn shut_down(&self) -> FolioResult<()>;
}

/// Disk manager backed by a single database file, one page per
/// `PAGE_SIZE`-aligned slot.
#[derive(Debug)]
pub struct FileDiskManager {
    db_file: Mutex<File>,
    is_shut_down: AtomicBool,
}

impl FileDiskManager {
    pub fn try_new(db_path: impl AsRef<Path>) -> FolioResult<Self> {
        let db_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_path.as_ref())?;
        debug!("opened db file {:?}", db_path.as_ref());
        Ok(Self {
            db_file: Mutex::new(db_file),
            is_shut_down: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> FolioResult<()> {
        if self.is_shut_down.load(Ordering::SeqCst) {
            return Err(FolioError::Storage("disk manager is shut down".to_string()));
        }
        Ok(())
    }

    fn page_offset(page_id: PageId) -> FolioResult<u64> {
        if page_id < 0 {
            return Err(FolioError::Storage(format!("invalid page id {}", page_id)));
        }
        Ok(page_id as u64 * PAGE_SIZE as u64)
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> FolioResult<()> {
        self.check_open()?;
        if buf.len() != PAGE_SIZE {
            return Err(FolioError::Internal(format!(
                "read buffer is {} bytes, expected {}",
                buf.len(),
                PAGE_SIZE
            )));
        }
        let offset = Self::page_offset(page_id)?;
        let mut file = self.db_file.lock();
        if offset >= file.metadata()?.len() {
            buf.fill(0);
            return Ok(());
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        // The last page on disk may be partial.
        buf[filled..].fill(0);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> FolioResult<()> {
        self.check_open()?;
        if data.len() != PAGE_SIZE {
            return Err(FolioError::Internal(format!(
                "write buffer is {} bytes, expected {}",
                data.len(),
                PAGE_SIZE
            )));
        }
        let offset = Self::page_offset(page_id)?;
        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn shut_down(&self) -> FolioResult<()> {
        if self.is_shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let file = self.db_file.lock();
        file.sync_all()?;
        debug!("disk manager shut down");
        Ok(())
    }
}
