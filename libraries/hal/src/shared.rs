/// Shared ownership of the single physical bus
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bus::BusAdapter;

/// Owned, cloneable handle to the one physical bus.
///
/// Every sampling loop gets its own clone. All of them contend on the same
/// lock, so a caller that holds the guard from [`SharedBus::lock`] has the bus
/// to itself: nobody else can change the multiplexer selection in between.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Exclusive access to the bus for the lifetime of the guard
pub type BusGuard<'a, B> = MutexGuard<'a, B>;

impl<B: BusAdapter> SharedBus<B> {
    /// Take ownership of a bus adapter
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    /// Enter the bus critical section.
    ///
    /// A panic in another holder poisons the mutex; the adapter itself is
    /// stateless, so the guard is recovered instead of propagating the panic.
    pub fn lock(&self) -> BusGuard<'_, B> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the bus
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Number of live handles to this bus
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusResult;
    use std::thread;

    #[derive(Default)]
    struct RecordingBus {
        writes: Vec<u8>,
    }

    impl BusAdapter for RecordingBus {
        fn write_byte(&mut self, _address: u8, value: u8) -> BusResult<()> {
            self.writes.push(value);
            thread::yield_now();
            Ok(())
        }

        fn write_register(&mut self, address: u8, _register: u8, value: u8) -> BusResult<()> {
            self.write_byte(address, value)
        }

        fn read_register(&mut self, _address: u8, _register: u8) -> BusResult<u8> {
            Ok(0)
        }
    }

    #[test]
    fn test_clones_share_one_bus() {
        let bus = SharedBus::new(RecordingBus::default());
        let other = bus.clone();
        assert_eq!(bus.handle_count(), 2);

        other.with(|b| b.write_byte(0x70, 0x01)).unwrap();
        assert_eq!(bus.lock().writes, vec![0x01], "write through a clone must reach the same bus");
    }

    #[test]
    fn test_guard_spans_are_not_interleaved() {
        let bus = SharedBus::new(RecordingBus::default());
        let workers: Vec<_> = (0..4u8)
            .map(|worker| {
                let bus = bus.clone();
                thread::spawn(move || {
                    let mask = 1 << worker;
                    for _ in 0..100 {
                        let mut guard = bus.lock();
                        guard.write_byte(0x70, mask).unwrap();
                        guard.write_byte(0x70, 0x00).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let guard = bus.lock();
        assert_eq!(guard.writes.len(), 800);
        for pair in guard.writes.chunks(2) {
            assert_ne!(pair[0], 0x00, "each span must start with a selection");
            assert_eq!(pair[1], 0x00, "each selection must be released before another span");
        }
    }
}
