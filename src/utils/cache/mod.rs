use crate::buffer::{AccessType, FrameId};
use crate::error::FolioResult;

pub mod lru_k;

/// Replacement policy seam: tracks per-frame access history and picks
/// eviction victims among the frames marked evictable.
pub trait Replacer {
    /// Record an access to `frame_id` at the current timestamp, creating
    /// the tracking node on first access. Does not change evictability.
    fn record_access(&mut self, frame_id: FrameId, access_type: AccessType) -> FolioResult<()>;

    /// Remove and return the evictable frame with the largest backward
    /// distance, or `None` when nothing is evictable.
    fn evict(&mut self) -> Option<FrameId>;

    /// Flip the evictable flag. Untracked frames are ignored.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Drop a frame from the tracker entirely. Untracked frames are ignored.
    fn remove(&mut self, frame_id: FrameId);

    /// Number of evictable frames currently tracked.
    fn size(&self) -> usize;
}
