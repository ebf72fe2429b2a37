//! Fixed-size worker pool with idle tracking
//!
//! Workers pull jobs from a shared queue under a mutex; a second condition
//! variable lets the submitting thread block in [`WorkerPool::wait_idle`]
//! until the queue is empty *and* no job is in flight. A panicking job is
//! contained and logged; the worker carries on.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    active: usize,
    stop: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    jobs_cv: Condvar,
    idle_cv: Condvar,
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                active: 0,
                stop: false,
            }),
            jobs_cv: Condvar::new(),
            idle_cv: Condvar::new(),
        });

        let workers = (0..workers)
            .map(|i| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("tankwar-worker-{i}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    /// Queue a job; a no-op after shutdown
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        {
            let mut state = self.lock_state();
            if state.stop {
                return;
            }
            state.jobs.push_back(Box::new(job));
        }
        self.shared.jobs_cv.notify_one();
    }

    /// Block until the queue is empty and no job is running
    pub fn wait_idle(&self) {
        let mut state = self.lock_state();
        while !(state.jobs.is_empty() && state.active == 0) {
            state = self
                .shared
                .idle_cv
                .wait(state)
                .unwrap_or_else(|poison| poison.into_inner());
        }
    }

    /// Stop accepting jobs, drain the queue and join all workers
    pub fn shutdown(&mut self) {
        {
            let mut state = self.lock_state();
            if state.stop {
                return;
            }
            state.stop = true;
        }
        self.shared.jobs_cv.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PoolState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut state = shared
                .state
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    state.active += 1;
                    break job;
                }
                if state.stop {
                    return;
                }
                state = shared
                    .jobs_cv
                    .wait(state)
                    .unwrap_or_else(|poison| poison.into_inner());
            }
        };

        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("worker job panicked; continuing with remaining jobs");
        }

        let mut state = shared
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        state.active -= 1;
        if state.jobs.is_empty() && state.active == 0 {
            shared.idle_cv.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_all_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(4);
        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        pool.shutdown();
    }

    #[test]
    fn test_wait_idle_waits_for_in_flight_jobs() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(2);
        for _ in 0..8 {
            let done = done.clone();
            pool.submit(move || {
                std::thread::sleep(std::time::Duration::from_millis(10));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(done.load(Ordering::SeqCst), 8);
        pool.shutdown();
    }

    #[test]
    fn test_panicking_job_does_not_kill_pool() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(1);
        pool.submit(|| panic!("boom"));
        for _ in 0..5 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        pool.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_is_noop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(1);
        pool.shutdown();
        let c = counter.clone();
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wait_idle_on_fresh_pool_returns() {
        let mut pool = WorkerPool::new(3);
        pool.wait_idle();
        pool.shutdown();
    }
}
