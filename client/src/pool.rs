//! Fixed-size pool of worker threads fed from a bounded job queue

use log::{debug, error};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Returned when a job is submitted after shutdown began
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolClosed;

impl fmt::Display for PoolClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("worker pool is shutting down")
    }
}

impl std::error::Error for PoolClosed {}

struct Queue {
    jobs: VecDeque<Job>,
    stopping: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    job_ready: Condvar,
    space_ready: Condvar,
    capacity: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` threads (at least one) sharing a queue of at most `capacity` jobs
    pub fn new(workers: usize, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                stopping: false,
            }),
            job_ready: Condvar::new(),
            space_ready: Condvar::new(),
            capacity: capacity.max(1),
        });

        let workers = (0..workers.max(1))
            .map(|index| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || work(index, &shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// One worker per available core
    pub fn with_available_parallelism(capacity: usize) -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(workers, capacity)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job, waiting while the queue is full
    pub fn execute<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.lock();
        while queue.jobs.len() >= self.shared.capacity && !queue.stopping {
            queue = self
                .shared
                .space_ready
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if queue.stopping {
            return Err(PoolClosed);
        }

        queue.jobs.push_back(Box::new(job));
        drop(queue);
        self.shared.job_ready.notify_one();
        Ok(())
    }

    /// Runs `f` over `items` in chunks of `chunk_size` on the workers and
    /// returns the items in their original order. Chunks whose job panicked
    /// are missing from the result.
    pub fn map_chunks<T, F>(&self, items: Vec<T>, chunk_size: usize, f: F) -> Result<Vec<T>, PoolClosed>
    where
        T: Send + 'static,
        F: Fn(&mut [T]) + Send + Sync + 'static,
    {
        let chunk_size = chunk_size.max(1);
        let f = Arc::new(f);
        let (tx, rx) = mpsc::channel();

        let mut items = items.into_iter().peekable();
        let mut chunks = 0;
        while items.peek().is_some() {
            let mut chunk: Vec<T> = items.by_ref().take(chunk_size).collect();
            let f = Arc::clone(&f);
            let tx = tx.clone();
            let index = chunks;
            self.execute(move || {
                f(&mut chunk);
                let _ = tx.send((index, chunk));
            })?;
            chunks += 1;
        }
        drop(tx);

        let mut done: Vec<(usize, Vec<T>)> = rx.iter().collect();
        done.sort_by_key(|(index, _)| *index);
        Ok(done.into_iter().flat_map(|(_, chunk)| chunk).collect())
    }

    /// Stops accepting jobs, lets workers finish what is queued and joins them
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shared.lock().stopping = true;
        self.shared.job_ready.notify_all();
        self.shared.space_ready.notify_all();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn work(index: usize, shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    break job;
                }
                if queue.stopping {
                    debug!("Worker {} exiting", index);
                    return;
                }
                queue = shared
                    .job_ready
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        shared.space_ready.notify_one();
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("Job panicked on worker {}", index);
        }
    }
}
