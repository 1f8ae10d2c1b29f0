use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A global execution lock shared by every worker of one address space.
///
/// Task code only runs while holding the lock, so compute is serialized
/// across all threads that share it. A task may give the lock up for the
/// duration of a blocking call with [`Execution::blocking`], which lets
/// other tasks compute while it waits.
///
/// Thread pools share one lock between all their workers. Every worker
/// process creates its own, so process workers never contend.
#[derive(Clone, Default)]
pub struct ExecutionLock {
    inner: Arc<Mutex<()>>,
}

impl ExecutionLock {
    /// Creates a fresh, unshared lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock is free and returns the right to execute.
    pub fn acquire(&self) -> Execution<'_> {
        Execution {
            lock: &self.inner,
            guard: Some(lock(&self.inner)),
        }
    }
}

/// Proof that the current thread holds its [`ExecutionLock`].
///
/// Dropping it releases the lock.
pub struct Execution<'a> {
    lock: &'a Mutex<()>,
    guard: Option<MutexGuard<'a, ()>>,
}

impl Execution<'_> {
    /// Runs `f` with the lock released, then takes it back.
    pub fn blocking<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.guard = None;
        let out = f();
        self.guard = Some(lock(self.lock));
        out
    }
}

// A task that panicked while holding the lock leaves nothing to repair.
fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn holders_are_serialized() {
        let lock = ExecutionLock::new();
        let start = Instant::now();
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let lock = lock.clone();
                thread::spawn(move || {
                    let _exec = lock.acquire();
                    thread::sleep(Duration::from_millis(50));
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn blocking_sections_overlap() {
        let lock = ExecutionLock::new();
        let start = Instant::now();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let lock = lock.clone();
                thread::spawn(move || {
                    let mut exec = lock.acquire();
                    exec.blocking(|| thread::sleep(Duration::from_millis(200)));
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(800));
    }

    #[test]
    fn poisoned_lock_is_still_usable() {
        let lock = ExecutionLock::new();
        let poisoner = lock.clone();
        let _ = thread::spawn(move || {
            let _exec = poisoner.acquire();
            panic!("task failed while executing");
        })
        .join();
        let mut exec = lock.acquire();
        assert_eq!(exec.blocking(|| 7), 7);
    }
}
