// Copyright 2025-2026 CEMAXECUTER LLC

//! Single-producer/single-consumer byte ring.
//!
//! The producer is the hardware RX callback: it must never block or
//! allocate, so a full ring overwrites its oldest unread bytes instead of
//! waiting. `head` and `tail` are monotonically increasing byte counters;
//! the arena index is the counter modulo capacity.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::RingError;

struct Shared {
    arena: Box<[UnsafeCell<u8>]>,
    capacity: usize,
    /// Bytes consumed. Advanced by the consumer, or by the producer on overwrite.
    head: AtomicUsize,
    /// Bytes produced. Written only by the producer.
    tail: AtomicUsize,
    /// Writes that had to discard unread bytes.
    dropped: AtomicUsize,
    accepting: AtomicBool,
}

// SAFETY: arena bytes are written only by the single producer in
// [tail, tail + n) and read only by the single consumer in [head, head + n).
// Ranges overlap only when the producer laps the consumer, which the
// consumer detects through the head exchange and reports as an overrun.
unsafe impl Sync for Shared {}

impl Shared {
    fn base(&self) -> *mut u8 {
        // UnsafeCell<u8> is repr(transparent) over u8
        self.arena.as_ptr() as *mut u8
    }

    fn available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.saturating_sub(head).min(self.capacity)
    }
}

/// Consumer side of the ring, owned by the acquisition controller.
pub struct RingBuffer {
    shared: Arc<Shared>,
}

/// Producer capability handed to the hardware driver: it can only write.
pub struct RingWriter {
    shared: Arc<Shared>,
}

impl RingBuffer {
    /// Allocate a zeroed arena of `capacity` bytes with `head == tail == 0`.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::Allocation(0));
        }
        let mut arena = Vec::new();
        arena
            .try_reserve_exact(capacity)
            .map_err(|_| RingError::Allocation(capacity))?;
        arena.resize_with(capacity, || UnsafeCell::new(0u8));

        Ok(Self {
            shared: Arc::new(Shared {
                arena: arena.into_boxed_slice(),
                capacity,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
                accepting: AtomicBool::new(true),
            }),
        })
    }

    /// Create the write capability for the producer.
    pub fn writer(&self) -> RingWriter {
        RingWriter {
            shared: self.shared.clone(),
        }
    }

    /// Bytes ready to read. Safe to call while the producer is writing.
    pub fn available(&self) -> usize {
        self.shared.available()
    }

    pub fn dropped(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Tell the producer to stop; subsequent writes are refused.
    pub fn close_writer(&self) {
        self.shared.accepting.store(false, Ordering::Release);
    }

    /// Copy exactly `dest.len()` bytes starting at `head` and advance `head`.
    ///
    /// Callers check `available()` first; a short ring is an error, not a
    /// partial read.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<(), RingError> {
        let shared = &*self.shared;
        let n = dest.len();
        let head = shared.head.load(Ordering::Acquire);
        let tail = shared.tail.load(Ordering::Acquire);
        let available = tail.saturating_sub(head).min(shared.capacity);
        if n > available {
            return Err(RingError::Insufficient {
                requested: n,
                available,
            });
        }

        let cap = shared.capacity;
        let start = head % cap;
        let first = n.min(cap - start);
        // SAFETY: both ranges lie inside the arena; see the Sync impl for aliasing.
        unsafe {
            ptr::copy_nonoverlapping(shared.base().add(start), dest.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(shared.base(), dest.as_mut_ptr().add(first), n - first);
        }

        shared
            .head
            .compare_exchange(head, head + n, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| RingError::Overrun)
    }

    /// Release the arena. The memory is returned once any producer still
    /// holding a `RingWriter` has let go of it.
    pub fn free(self) {
        self.close_writer();
    }
}

impl RingWriter {
    /// Whether the consumer still wants data.
    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::Acquire)
    }

    /// Append `bytes`, overwriting the oldest unread data if the ring is full.
    ///
    /// Never blocks and never allocates. Returns the number of bytes stored,
    /// which is less than `bytes.len()` only when one chunk exceeds capacity.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let shared = &*self.shared;
        let cap = shared.capacity;

        // Only the newest `cap` bytes of an oversized chunk can survive
        let bytes = if bytes.len() > cap {
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            &bytes[bytes.len() - cap..]
        } else {
            bytes
        };
        let n = bytes.len();
        if n == 0 {
            return 0;
        }

        let tail = shared.tail.load(Ordering::Relaxed);
        let new_tail = tail + n;

        let mut head = shared.head.load(Ordering::Acquire);
        while new_tail - head > cap {
            match shared.head.compare_exchange_weak(
                head,
                new_tail - cap,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    shared.dropped.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                Err(current) => head = current,
            }
        }

        let start = tail % cap;
        let first = n.min(cap - start);
        // SAFETY: both ranges lie inside the arena; only this producer writes.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), shared.base().add(start), first);
            ptr::copy_nonoverlapping(bytes.as_ptr().add(first), shared.base(), n - first);
        }

        shared.tail.store(new_tail, Ordering::Release);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_write_then_read_in_order() {
        let mut rb = RingBuffer::new(64).unwrap();
        let w = rb.writer();
        let data: Vec<u8> = (0..50).collect();
        assert_eq!(w.write(&data[..20]), 20);
        assert_eq!(w.write(&data[20..]), 30);
        assert_eq!(rb.available(), 50);

        let mut out = vec![0u8; 50];
        rb.read(&mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(rb.available(), 0);
        assert_eq!(rb.dropped(), 0);
    }

    #[test]
    fn test_wraparound() {
        let mut rb = RingBuffer::new(16).unwrap();
        let w = rb.writer();
        let mut out = vec![0u8; 12];
        w.write(&[1; 12]);
        rb.read(&mut out).unwrap();

        // Straddles the end of the arena
        let data: Vec<u8> = (100..114).collect();
        w.write(&data);
        let mut out = vec![0u8; 14];
        rb.read(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_full_ring_reads_exactly_capacity() {
        let mut rb = RingBuffer::new(8).unwrap();
        let w = rb.writer();
        w.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(rb.available(), 8);
        let mut out = [0u8; 8];
        rb.read(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_overwrite_oldest_counts_drop() {
        let mut rb = RingBuffer::new(8).unwrap();
        let w = rb.writer();
        w.write(&[1, 2, 3, 4, 5, 6]);
        w.write(&[7, 8, 9, 10]);
        assert_eq!(rb.available(), 8);
        assert_eq!(rb.dropped(), 1);

        let mut out = [0u8; 8];
        rb.read(&mut out).unwrap();
        assert_eq!(out, [3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_oversized_chunk_keeps_newest() {
        let mut rb = RingBuffer::new(4).unwrap();
        let w = rb.writer();
        assert_eq!(w.write(&[1, 2, 3, 4, 5, 6]), 4);
        let mut out = [0u8; 4];
        rb.read(&mut out).unwrap();
        assert_eq!(out, [3, 4, 5, 6]);
        assert!(rb.dropped() >= 1);
    }

    #[test]
    fn test_read_more_than_available() {
        let mut rb = RingBuffer::new(16).unwrap();
        rb.writer().write(&[0; 5]);
        let mut out = [0u8; 6];
        assert_eq!(
            rb.read(&mut out),
            Err(RingError::Insufficient {
                requested: 6,
                available: 5
            })
        );
        // Nothing consumed by the failed read
        assert_eq!(rb.available(), 5);
    }

    #[test]
    fn test_close_writer() {
        let rb = RingBuffer::new(16).unwrap();
        let w = rb.writer();
        assert!(w.is_accepting());
        rb.close_writer();
        assert!(!w.is_accepting());
        rb.free();
        // Writer keeps the arena alive after the consumer is gone
        assert_eq!(w.write(&[1, 2, 3]), 3);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(RingBuffer::new(0), Err(RingError::Allocation(0))));
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const TOTAL: usize = 1 << 20;
        let mut rb = RingBuffer::new(TOTAL).unwrap();
        let w = rb.writer();

        let producer = thread::spawn(move || {
            let chunk: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();
            let mut sent = 0;
            while sent < TOTAL {
                sent += w.write(&chunk);
            }
        });

        let mut received = Vec::with_capacity(TOTAL);
        let mut buf = vec![0u8; 1000];
        while received.len() < TOTAL {
            let want = buf.len().min(TOTAL - received.len());
            if rb.available() >= want {
                rb.read(&mut buf[..want]).unwrap();
                received.extend_from_slice(&buf[..want]);
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();

        for (i, b) in received.iter().enumerate() {
            assert_eq!(*b, ((i % 4096) % 251) as u8, "mismatch at byte {}", i);
        }
        assert_eq!(rb.dropped(), 0);
    }
}
