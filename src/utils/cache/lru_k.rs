use std::collections::{HashMap, LinkedList};

use super::Replacer;
use crate::buffer::{AccessType, FrameId};
use crate::error::{FolioError, FolioResult};

#[derive(Debug)]
struct LRUKNode {
    k: usize,
    // most recent k access timestamps, oldest first
    history: LinkedList<u64>,
    is_evictable: bool,
}

impl LRUKNode {
    fn new(k: usize) -> Self {
        Self {
            k,
            history: LinkedList::new(),
            is_evictable: false,
        }
    }

    fn record_access(&mut self, timestamp: u64) {
        self.history.push_back(timestamp);
        if self.history.len() > self.k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance at time `now`. Frames with fewer than k recorded
    /// accesses sort as +infinity, oldest first access winning; encoding the
    /// infinite class as `u64::MAX - first_access` gives both rules with a
    /// single max scan.
    fn k_distance(&self, now: u64) -> u64 {
        match self.history.front() {
            Some(&first) if self.history.len() >= self.k => now - first,
            Some(&first) => u64::MAX - first,
            None => 0,
        }
    }
}

#[derive(Debug)]
pub struct LRUKReplacer {
    // number of frames currently evictable
    current_size: usize,
    // upper bound on tracked frames
    replacer_size: usize,
    k: usize,
    node_store: HashMap<FrameId, LRUKNode>,
    // logical clock, incremented per recorded access
    current_timestamp: u64,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            current_size: 0,
            replacer_size: num_frames,
            k,
            node_store: HashMap::with_capacity(num_frames),
            current_timestamp: 0,
        }
    }
}

impl Replacer for LRUKReplacer {
    fn record_access(&mut self, frame_id: FrameId, _access_type: AccessType) -> FolioResult<()> {
        if let Some(node) = self.node_store.get_mut(&frame_id) {
            node.record_access(self.current_timestamp);
        } else {
            if frame_id >= self.replacer_size {
                return Err(FolioError::Internal(format!(
                    "frame id {} out of range for replacer of {} frames",
                    frame_id, self.replacer_size
                )));
            }
            let mut node = LRUKNode::new(self.k);
            node.record_access(self.current_timestamp);
            self.node_store.insert(frame_id, node);
        }
        self.current_timestamp += 1;
        Ok(())
    }

    fn evict(&mut self) -> Option<FrameId> {
        let now = self.current_timestamp;
        let mut victim: Option<(FrameId, u64)> = None;
        for (&frame_id, node) in self.node_store.iter() {
            if !node.is_evictable {
                continue;
            }
            let distance = node.k_distance(now);
            match victim {
                Some((_, best)) if distance <= best => {}
                _ => victim = Some((frame_id, distance)),
            }
        }
        let (frame_id, _) = victim?;
        self.remove(frame_id);
        Some(frame_id)
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(node) = self.node_store.get_mut(&frame_id) else {
            return;
        };
        if node.is_evictable != evictable {
            node.is_evictable = evictable;
            if evictable {
                self.current_size += 1;
            } else {
                self.current_size -= 1;
            }
        }
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(node) = self.node_store.remove(&frame_id) {
            if node.is_evictable {
                self.current_size -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.current_size
    }
}
