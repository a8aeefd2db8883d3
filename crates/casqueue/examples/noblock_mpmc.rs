//! Two producers and two consumers hammer a non-blocking MPMC queue,
//! retrying every rejected attempt until its quota is done.
//!
//! Run with: cargo run --release --example noblock_mpmc

use casqueue_rs::{NonBlockingMpmc, QueueEmpty, QueueFull};
use std::thread;
use std::time::Instant;

const PER_THREAD: usize = 2_500_000;

fn main() {
    let queue = NonBlockingMpmc::<String>::new();
    let start = Instant::now();

    let mut handles = Vec::new();

    for id in 0..2 {
        let producer = queue.producer().unwrap();
        handles.push(thread::spawn(move || {
            let mut sent = 0;
            while sent < PER_THREAD {
                match producer.try_produce("hello world".to_string()) {
                    Ok(()) => sent += 1,
                    Err(QueueFull(_)) => thread::yield_now(),
                }
            }
            println!("producer {} sent {}", id, sent);
        }));
    }

    for id in 0..2 {
        let consumer = queue.consumer().unwrap();
        handles.push(thread::spawn(move || {
            let mut received = 0;
            while received < PER_THREAD {
                match consumer.try_consume() {
                    Ok(msg) => {
                        debug_assert_eq!(msg, "hello world");
                        received += 1;
                    }
                    Err(QueueEmpty) => thread::yield_now(),
                }
            }
            println!("consumer {} received {}", id, received);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let elapsed = start.elapsed();
    println!("time used: {:.3}s", elapsed.as_secs_f64());
    println!(
        "throughput: {:.2} M msg/s",
        (2 * PER_THREAD) as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
}
