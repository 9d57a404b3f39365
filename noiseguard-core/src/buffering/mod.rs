//! Lock-free SPSC ring buffer for audio samples.
//!
//! One thread writes (the capture side), one thread reads (the processing
//! side). Neither side ever blocks, locks or allocates after construction.
//!
//! ## Cursor discipline
//!
//! Both cursors increase monotonically and are masked into the slot array, so
//! the capacity is always a power of two. `write_idx` is stored only by the
//! producer and `read_idx` only by the consumer. Each side loads the other's
//! cursor with `Acquire` and publishes its own with `Release`, which makes a
//! slot write visible before the cursor advance that exposes it.
//!
//! One slot is never filled: with only two cursors, `write == read` must mean
//! empty, so at most `capacity - 1` samples are ever buffered.
//!
//! Samples live in `AtomicF32` slots (`atomic_float`). Slot accesses are
//! `Relaxed`; ordering comes from the cursors alone.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF32;

/// Fixed-capacity sample queue shared by exactly one producer and one consumer.
///
/// Construct with [`RingBuffer::new`] and [`split`](RingBuffer::split) it: the
/// halves are the only way to move data, which pins each cursor to one owner.
#[derive(Debug)]
pub struct RingBuffer {
    slots: Box<[AtomicF32]>,
    capacity: usize,
    mask: usize,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
}

impl RingBuffer {
    /// Allocate a ring holding at least `capacity` slots.
    ///
    /// The capacity is rounded up to the next power of two; `0` becomes `1`.
    /// This is the only allocation the ring ever performs.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let slots: Box<[AtomicF32]> = (0..capacity).map(|_| AtomicF32::new(0.0)).collect();

        Self {
            slots,
            capacity,
            mask: capacity - 1,
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        }
    }

    /// Total slot count (a power of two). Usable space is `capacity() - 1`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Split into the producer and consumer halves.
    pub fn split(self) -> (RingProducer, RingConsumer) {
        let shared = Arc::new(self);
        (
            RingProducer {
                ring: Arc::clone(&shared),
            },
            RingConsumer { ring: shared },
        )
    }

    #[inline]
    fn used(&self, write: usize, read: usize) -> usize {
        write.wrapping_sub(read)
    }

    fn available_read(&self) -> usize {
        // Read cursor first: the write cursor can only be ahead of it. A third
        // observer can still see the pair straddle a consume, hence the clamp.
        let r = self.read_idx.load(Ordering::Acquire);
        let w = self.write_idx.load(Ordering::Acquire);
        self.used(w, r).min(self.capacity - 1)
    }

    fn available_write(&self) -> usize {
        self.capacity - 1 - self.available_read()
    }
}

/// Create a matched producer/consumer pair of at least `capacity` slots.
pub fn create_audio_ring(capacity: usize) -> (RingProducer, RingConsumer) {
    RingBuffer::new(capacity).split()
}

/// Writing half — held by the capture thread.
///
/// Not `Clone`: a second producer would break the single-writer cursor rule.
#[derive(Debug)]
pub struct RingProducer {
    ring: Arc<RingBuffer>,
}

impl RingProducer {
    /// Enqueue as many of `samples` as fit; returns the number written.
    ///
    /// A short count means the ring is near full. That is back-pressure, not
    /// an error: the caller retries later or drops the rest.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let ring = &*self.ring;
        let w = ring.write_idx.load(Ordering::Relaxed);
        let r = ring.read_idx.load(Ordering::Acquire);
        let free = ring.capacity - 1 - ring.used(w, r);

        let count = samples.len().min(free);
        if count == 0 {
            return 0;
        }

        for (i, &sample) in samples[..count].iter().enumerate() {
            let slot = &ring.slots[w.wrapping_add(i) & ring.mask];
            slot.store(sample, Ordering::Relaxed);
        }

        ring.write_idx.store(w.wrapping_add(count), Ordering::Release);
        count
    }

    /// Racy snapshot of buffered samples.
    pub fn available_read(&self) -> usize {
        self.ring.available_read()
    }

    /// Racy snapshot of free slots.
    pub fn available_write(&self) -> usize {
        self.ring.available_write()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

/// Reading half — held by the processing thread.
#[derive(Debug)]
pub struct RingConsumer {
    ring: Arc<RingBuffer>,
}

impl RingConsumer {
    /// Dequeue up to `buffer.len()` samples; returns the number read.
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        let ring = &*self.ring;
        let r = ring.read_idx.load(Ordering::Relaxed);
        let w = ring.write_idx.load(Ordering::Acquire);

        let count = buffer.len().min(ring.used(w, r));
        if count == 0 {
            return 0;
        }

        for (i, out) in buffer[..count].iter_mut().enumerate() {
            *out = ring.slots[r.wrapping_add(i) & ring.mask].load(Ordering::Relaxed);
        }

        ring.read_idx.store(r.wrapping_add(count), Ordering::Release);
        count
    }

    /// Racy snapshot of buffered samples.
    pub fn available_read(&self) -> usize {
        self.ring.available_read()
    }

    /// Racy snapshot of free slots.
    pub fn available_write(&self) -> usize {
        self.ring.available_write()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}
