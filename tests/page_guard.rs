use std::sync::{Arc, Barrier};
use std::thread;

use folio::buffer::{AccessType, BufferPoolManager};
use folio::storage::MemoryDiskManager;

fn setup(pool_size: usize, k: usize) -> Arc<BufferPoolManager> {
    let disk_manager = Arc::new(MemoryDiskManager::new());
    Arc::new(BufferPoolManager::new(pool_size, k, disk_manager))
}

#[test]
fn guard_move_transfers_the_pin() {
    let bpm = setup(5, 2);

    let (page_id, page0) = bpm.new_page().unwrap();
    assert_eq!(page_id, 0);
    assert_eq!(bpm.page_pin_count(0), Some(1));
    assert!(bpm.unpin_page(0, false, AccessType::Unknown));

    let guard = bpm.fetch_page_basic(0).unwrap();
    assert_eq!(bpm.page_pin_count(0), Some(1));

    let moved = guard;
    assert_eq!(bpm.page_pin_count(0), Some(1));
    assert_eq!(moved.page_id(), 0);
    assert_eq!(&page0.data()[..], &moved.data()[..]);

    drop(moved);
    assert_eq!(bpm.page_pin_count(0), Some(0));
}

#[test]
fn reassigning_a_guard_releases_the_old_binding() {
    let bpm = setup(5, 2);
    let (first_id, _first) = bpm.new_page().unwrap();
    let (second_id, _second) = bpm.new_page().unwrap();
    bpm.unpin_page(first_id, false, AccessType::Unknown);
    bpm.unpin_page(second_id, false, AccessType::Unknown);

    let mut guard = bpm.fetch_page_basic(first_id).unwrap();
    assert_eq!(guard.page_id(), first_id);
    assert_eq!(bpm.page_pin_count(first_id), Some(1));

    guard = bpm.fetch_page_basic(second_id).unwrap();
    assert_eq!(bpm.page_pin_count(first_id), Some(0));
    assert_eq!(bpm.page_pin_count(second_id), Some(1));
    assert_eq!(guard.page_id(), second_id);
}

#[test]
fn ten_read_guards_share_the_page() {
    let bpm = setup(5, 2);
    let (page_id, _page) = bpm.new_page().unwrap();
    bpm.unpin_page(page_id, false, AccessType::Unknown);

    {
        let mut guards = Vec::new();
        for _ in 0..10 {
            guards.push(bpm.fetch_page_read(page_id).unwrap());
        }
        assert_eq!(bpm.page_pin_count(page_id), Some(10));

        guards.pop();
        assert_eq!(bpm.page_pin_count(page_id), Some(9));
    }
    assert_eq!(bpm.page_pin_count(page_id), Some(0));
}

#[test]
fn write_survives_eviction_and_rereads() {
    let bpm = setup(5, 2);

    {
        let mut guard = bpm.new_page_guarded().unwrap();
        assert_eq!(guard.page_id(), 0);
        guard.data_mut()[..5].copy_from_slice(b"World");
    }
    assert_eq!(bpm.page_pin_count(0), Some(0));

    // Fill every frame; these stay pinned, evicting page 0 along the way.
    let mut pinned = Vec::new();
    for _ in 0..5 {
        pinned.push(bpm.new_page().unwrap());
    }
    assert!(bpm.page_meta(0).is_none());
    assert!(bpm.unpin_page(1, false, AccessType::Unknown));

    {
        let mut write_guard = bpm.fetch_page_write(0).unwrap();
        assert_eq!(&write_guard.data()[..5], b"World");
        write_guard.data_mut()[..11].copy_from_slice(b"ChangedData");
    }
    {
        let read_guard = bpm.fetch_page_read(0).unwrap();
        assert_eq!(&read_guard.data()[..11], b"ChangedData");
    }
}

#[test]
fn concurrent_readers_do_not_leak_pins() {
    const THREADS: usize = 6;
    const ROUNDS: usize = 32;
    let bpm = setup(3, 2);

    // Two pages so readers contend on more than one frame.
    let mut page_ids = Vec::new();
    for marker in [b'x', b'y'] {
        let mut guard = bpm.new_page_guarded().unwrap();
        guard.data_mut()[7] = marker;
        page_ids.push(guard.page_id());
    }

    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = Vec::with_capacity(THREADS);
    for thread_id in 0..THREADS {
        let bpm = bpm.clone();
        let barrier = barrier.clone();
        let page_ids = page_ids.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for round in 0..ROUNDS {
                let which = (thread_id + round) % page_ids.len();
                let guard = bpm.fetch_page_read(page_ids[which]).expect("read page");
                let expected = if which == 0 { b'x' } else { b'y' };
                assert_eq!(guard.data()[7], expected);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for page_id in page_ids {
        assert_eq!(bpm.page_pin_count(page_id), Some(0));
    }
}

#[test]
fn write_latch_is_exclusive() {
    const THREADS: usize = 4;
    const ROUNDS: usize = 100;
    let bpm = setup(4, 2);
    let page_id = {
        let guard = bpm.new_page_guarded().unwrap();
        guard.page_id()
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = Vec::with_capacity(THREADS);
    for _ in 0..THREADS {
        let bpm = bpm.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..ROUNDS {
                let mut guard = bpm.fetch_page_write(page_id).expect("write page");
                let mut counter = [0u8; 4];
                counter.copy_from_slice(&guard.data()[..4]);
                let next = u32::from_le_bytes(counter) + 1;
                guard.data_mut()[..4].copy_from_slice(&next.to_le_bytes());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let guard = bpm.fetch_page_read(page_id).unwrap();
    let mut counter = [0u8; 4];
    counter.copy_from_slice(&guard.data()[..4]);
    assert_eq!(u32::from_le_bytes(counter), (THREADS * ROUNDS) as u32);
    assert_eq!(guard.pin_count(), 1);
}
