//! Worker pool for background node construction.
//!
//! A thin wrapper over a rayon pool. [`ThreadPool::spawn`] returns a
//! [`TaskHandle`] that can be polled without blocking, which is how the
//! single consuming thread checks on loader jobs.
//!
//! ```
//! use variant_tree_core::threadpool::{ThreadPool, ThreadPoolConfig};
//!
//! let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
//! let handle = pool.spawn(|| 6 * 7);
//! assert_eq!(handle.wait(), Some(42));
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool as RayonThreadPool, ThreadPoolBuilder};

use crate::error::ThreadPoolError;
use crate::logging::targets;

static GLOBAL_POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct TaskWakeup {
    ready: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl TaskWakeup {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    fn wake(&self) {
        // Set under the lock so a waiter cannot miss the notification.
        let _guard = self.mutex.lock();
        self.ready.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    fn wait(&self) {
        let mut guard = self.mutex.lock();
        while !self.ready.load(Ordering::Acquire) {
            self.condvar.wait(&mut guard);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.mutex.lock();
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        let result = self.condvar.wait_for(&mut guard, timeout);
        self.ready.load(Ordering::Acquire) || !result.timed_out()
    }
}

/// Handle to a spawned task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    receiver: Receiver<T>,
    wakeup: Arc<TaskWakeup>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the task has produced its result.
    pub fn is_finished(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Take the result if it is ready.
    pub fn try_get(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the task completes. `None` if it panicked.
    pub fn wait(self) -> Option<T> {
        self.wakeup.wait();
        self.receiver.recv().ok()
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> Option<T> {
        if self.wakeup.wait_timeout(timeout) {
            self.receiver.recv().ok()
        } else {
            None
        }
    }
}

/// Configuration for a loader pool.
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads. `None` means one per CPU core.
    pub num_threads: Option<usize>,
    /// Name prefix for worker threads.
    pub thread_name: String,
    /// Stack size for worker threads in bytes.
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name: "variant-loader".to_string(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
            ..Default::default()
        }
    }
}

/// A bounded pool of worker threads.
pub struct ThreadPool {
    pool: RayonThreadPool,
    active_tasks: Arc<AtomicUsize>,
}

impl ThreadPool {
    /// The shared pool, created with default settings on first use.
    pub fn global() -> Result<Arc<ThreadPool>, ThreadPoolError> {
        if let Some(pool) = GLOBAL_POOL.get() {
            return Ok(pool.clone());
        }
        let pool = Arc::new(ThreadPool::new(ThreadPoolConfig::default())?);
        // Another thread may have won the race; either pool is fine.
        Ok(GLOBAL_POOL.get_or_init(|| pool).clone())
    }

    /// Install a configured pool as the shared pool.
    pub fn init_global(config: ThreadPoolConfig) -> Result<Arc<ThreadPool>, ThreadPoolError> {
        let pool = Arc::new(ThreadPool::new(config)?);
        GLOBAL_POOL
            .set(pool.clone())
            .map_err(|_| ThreadPoolError::AlreadyInitialized)?;
        Ok(pool)
    }

    /// Create a pool.
    pub fn new(config: ThreadPoolConfig) -> Result<Self, ThreadPoolError> {
        let name = config.thread_name;
        let mut builder = ThreadPoolBuilder::new().thread_name(move |index| format!("{}-{}", name, index));

        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }

        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = builder
            .build()
            .map_err(|e| ThreadPoolError::CreationFailed(e.to_string()))?;

        tracing::debug!(target: targets::LOADER, threads = pool.current_num_threads(), "loader pool created");
        Ok(Self {
            pool,
            active_tasks: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of tasks spawned and not yet finished.
    pub fn active_tasks(&self) -> usize {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Run `task` on a worker thread.
    pub fn spawn<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = bounded(1);
        let wakeup = Arc::new(TaskWakeup::new());
        let wakeup_clone = wakeup.clone();

        self.active_tasks.fetch_add(1, Ordering::AcqRel);
        let active_tasks = self.active_tasks.clone();

        self.pool.spawn(move || {
            let result = task();
            // The handle may already be gone; the result is then dropped.
            let _ = sender.send(result);
            active_tasks.fetch_sub(1, Ordering::AcqRel);
            wakeup_clone.wake();
        });

        TaskHandle {
            id,
            receiver,
            wakeup,
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads())
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_wait() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
        let handle = pool.spawn(|| "done");
        assert_eq!(handle.wait(), Some("done"));
    }

    #[test]
    fn test_try_get_after_finish() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
        let handle = pool.spawn(|| 7);
        while !handle.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(handle.try_get(), Some(7));
        assert_eq!(handle.try_get(), None);
    }

    #[test]
    fn test_wait_timeout() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
        let handle = pool.spawn(|| {
            std::thread::sleep(Duration::from_millis(200));
            1
        });
        assert_eq!(handle.wait_timeout(Duration::from_millis(5)), None);
    }

    #[test]
    fn test_global_pool_is_shared() {
        let a = ThreadPool::global().unwrap();
        let b = ThreadPool::global().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.num_threads() >= 1);
    }
}
