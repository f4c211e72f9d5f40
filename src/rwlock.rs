use std::any::type_name;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::warn;

// Acquisitions slower than this are logged, they usually point at a writer
// holding the snapshot store across an await point
const SLOW_ACQUIRE_SECS: u64 = 5;

#[derive(Debug, Default)]
pub struct CustomRwLock<T> {
    name: String,
    lock: RwLock<T>,
    write_locked: AtomicBool,
    read_waiting_count: AtomicUsize,
}

impl<T> CustomRwLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            name: type_name::<T>().to_string(),
            lock: RwLock::new(data),
            write_locked: AtomicBool::new(false),
            read_waiting_count: AtomicUsize::new(0),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, T> {
        let start = Instant::now();
        let waiting = self.write_locked.load(Ordering::SeqCst);
        if waiting {
            self.read_waiting_count.fetch_add(1, Ordering::SeqCst);
        }
        let guard = self.lock.read().await;
        if waiting {
            self.read_waiting_count.fetch_sub(1, Ordering::SeqCst);
        }
        let duration = start.elapsed();
        if duration.as_secs() > SLOW_ACQUIRE_SECS {
            warn!(
                "Read lock '{}' took {:?} to acquire ({} readers waiting)",
                self.name,
                duration,
                self.read_waiting_count.load(Ordering::SeqCst)
            );
        }
        guard
    }

    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, T> {
        let start = Instant::now();
        self.write_locked.store(true, Ordering::SeqCst);
        let guard = self.lock.write().await;
        self.write_locked.store(false, Ordering::SeqCst);
        let duration = start.elapsed();
        if duration.as_secs() > SLOW_ACQUIRE_SECS {
            warn!(
                "Write lock '{}' took {:?} to acquire",
                self.name, duration
            );
        }
        guard
    }

    pub fn read_waiting(&self) -> usize {
        self.read_waiting_count.load(Ordering::SeqCst)
    }
}
