use std::thread;
use std::time::{Duration, Instant};

use noiseguard_core::buffering::create_audio_ring;

const TOTAL: usize = 200_000;

#[test]
fn cross_thread_sequence_arrives_in_order() {
    let (mut producer, mut consumer) = create_audio_ring(1000);
    assert_eq!(producer.capacity(), 1024);

    let writer = thread::spawn(move || {
        let mut next = 0usize;
        let mut block = [0.0f32; 97];
        let mut size = 1usize;
        while next < TOTAL {
            let n = size.min(TOTAL - next);
            for (i, slot) in block[..n].iter_mut().enumerate() {
                *slot = (next + i) as f32;
            }
            let written = producer.write(&block[..n]);
            assert!(written <= n);
            next += written;
            size = size % 97 + 1;
            if written == 0 {
                thread::yield_now();
            }
        }
    });

    let deadline = Instant::now() + Duration::from_secs(20);
    let mut expected = 0usize;
    let mut buf = [0.0f32; 61];
    while expected < TOTAL {
        let read = consumer.read(&mut buf);
        for &sample in &buf[..read] {
            assert_eq!(sample, expected as f32, "out of order at {expected}");
            expected += 1;
        }
        if read == 0 {
            assert!(Instant::now() < deadline, "consumer starved");
            thread::yield_now();
        }
    }

    writer.join().expect("producer panicked");
    assert_eq!(consumer.available_read(), 0);
    assert_eq!(consumer.available_write(), consumer.capacity() - 1);
}

#[test]
fn available_counts_never_exceed_usable_space_under_contention() {
    let (mut producer, mut consumer) = create_audio_ring(256);
    let usable = producer.capacity() - 1;

    let writer = thread::spawn(move || {
        let data = [0.5f32; 40];
        for _ in 0..20_000 {
            producer.write(&data);
            let free = producer.available_write();
            assert!(free <= usable);
        }
    });

    let mut buf = [0.0f32; 33];
    for _ in 0..20_000 {
        consumer.read(&mut buf);
        assert!(consumer.available_read() <= usable);
    }

    writer.join().expect("producer panicked");
}
