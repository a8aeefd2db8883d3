//! Loom-based concurrency tests for the slot protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom explores every interleaving of a reduced model: a single slot with
//! its four-state CAS machine and the wait/ignore parking handshake. The
//! model mirrors the crate's slot steps one for one, using loom's atomics,
//! mutex and condvar so that a lost wakeup shows up as a deadlock.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU8, Ordering};
use loom::sync::{Arc, Condvar, Mutex};
use loom::thread;

const EMPTY: u8 = 0;
const FILLING: u8 = 1;
const FULL: u8 = 2;
const DRAINING: u8 = 3;

const INIT: u8 = 0;
const WAITING: u8 = 1;
const IGNORE: u8 = 2;

struct LoomParker {
    flag: AtomicU8,
    proceed: Mutex<bool>,
    signal: Condvar,
}

impl LoomParker {
    fn new() -> Self {
        Self {
            flag: AtomicU8::new(INIT),
            proceed: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    fn register(&self) -> bool {
        self.flag
            .compare_exchange(INIT, WAITING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn park(&self) {
        let mut proceed = self.proceed.lock().unwrap();
        while !*proceed {
            proceed = self.signal.wait(proceed).unwrap();
        }
        *proceed = false;
    }

    fn reset(&self) {
        self.flag.store(INIT, Ordering::Release);
    }

    fn release(&self, publish: impl FnOnce()) {
        if self
            .flag
            .compare_exchange(INIT, IGNORE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            publish();
            return;
        }
        publish();
        *self.proceed.lock().unwrap() = true;
        self.signal.notify_one();
    }
}

/// One slot of a blocking single-producer single-consumer queue.
struct LoomSlot {
    state: AtomicU8,
    value: UnsafeCell<u64>,
    producer: LoomParker,
    consumer: LoomParker,
}

unsafe impl Send for LoomSlot {}
unsafe impl Sync for LoomSlot {}

impl LoomSlot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(0),
            producer: LoomParker::new(),
            consumer: LoomParker::new(),
        }
    }

    fn try_begin(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn begin(&self, from: u8, to: u8, parker: &LoomParker) {
        if self.try_begin(from, to) {
            return;
        }
        if parker.register() {
            parker.park();
        }
        while !self.try_begin(from, to) {
            thread::yield_now();
        }
    }

    fn produce(&self, value: u64) {
        self.begin(EMPTY, FILLING, &self.producer);
        self.value.with_mut(|v| unsafe { *v = value });
        self.producer.reset();
        self.consumer
            .release(|| self.state.store(FULL, Ordering::Release));
    }

    fn consume(&self) -> u64 {
        self.begin(FULL, DRAINING, &self.consumer);
        let value = self.value.with(|v| unsafe { *v });
        self.consumer.reset();
        self.producer
            .release(|| self.state.store(EMPTY, Ordering::Release));
        value
    }
}

#[test]
fn loom_consumer_waits_for_producer() {
    loom::model(|| {
        let slot = Arc::new(LoomSlot::new());

        let consumer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.consume())
        };

        slot.produce(42);
        assert_eq!(consumer.join().unwrap(), 42);
        assert_eq!(slot.state.load(Ordering::Acquire), EMPTY);
    });
}

#[test]
fn loom_producer_waits_for_drain() {
    loom::model(|| {
        let slot = Arc::new(LoomSlot::new());
        slot.produce(1);

        // The slot is full, so this producer must wait for the consume.
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.produce(2))
        };

        assert_eq!(slot.consume(), 1);
        producer.join().unwrap();
        assert_eq!(slot.consume(), 2);
    });
}

#[test]
fn loom_two_laps_in_order() {
    loom::model(|| {
        let slot = Arc::new(LoomSlot::new());

        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                slot.produce(10);
                slot.produce(20);
            })
        };

        let first = slot.consume();
        let second = slot.consume();
        producer.join().unwrap();

        assert_eq!((first, second), (10, 20));
    });
}

#[test]
fn loom_nonblocking_rejects_without_corruption() {
    loom::model(|| {
        let slot = Arc::new(LoomSlot::new());

        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                if slot.try_begin(EMPTY, FILLING) {
                    slot.value.with_mut(|v| unsafe { *v = 7 });
                    slot.state.store(FULL, Ordering::Release);
                    true
                } else {
                    false
                }
            })
        };

        let taken = if slot.try_begin(FULL, DRAINING) {
            let v = slot.value.with(|v| unsafe { *v });
            slot.state.store(EMPTY, Ordering::Release);
            Some(v)
        } else {
            None
        };

        assert!(producer.join().unwrap());
        match taken {
            // The consume ran after the publish.
            Some(v) => {
                assert_eq!(v, 7);
                assert_eq!(slot.state.load(Ordering::Acquire), EMPTY);
            }
            None => assert_ne!(slot.state.load(Ordering::Acquire), DRAINING),
        }
    });
}
