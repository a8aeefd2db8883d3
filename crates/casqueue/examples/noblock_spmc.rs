//! One producer feeds three consumers through a non-blocking SPMC queue.
//!
//! Run with: cargo run --release --example noblock_spmc

use casqueue_rs::{NonBlockingSpmc, QueueEmpty, QueueFull};
use std::thread;
use std::time::Instant;

const CONSUMERS: usize = 3;
const PER_CONSUMER: usize = 1_670_000;
const TOTAL: usize = CONSUMERS * PER_CONSUMER;

fn main() {
    let queue = NonBlockingSpmc::<String>::new();
    let start = Instant::now();

    let producer = queue.producer().unwrap();
    let producer_handle = thread::spawn(move || {
        let mut sent = 0;
        while sent < TOTAL {
            match producer.try_produce("hello world".to_string()) {
                Ok(()) => sent += 1,
                Err(QueueFull(_)) => thread::yield_now(),
            }
        }
        println!("producer sent {}", sent);
    });

    let consumer_handles: Vec<_> = (0..CONSUMERS)
        .map(|id| {
            let consumer = queue.consumer().unwrap();
            thread::spawn(move || {
                let mut received = 0;
                while received < PER_CONSUMER {
                    match consumer.try_consume() {
                        Ok(_) => received += 1,
                        Err(QueueEmpty) => thread::yield_now(),
                    }
                }
                println!("consumer {} received {}", id, received);
            })
        })
        .collect();

    producer_handle.join().unwrap();
    for handle in consumer_handles {
        handle.join().unwrap();
    }

    println!("time used: {:.3}s", start.elapsed().as_secs_f64());
}
