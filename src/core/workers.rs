//! Background thread pool for blocking I/O (metadata requests, image downloads)
//!
//! Uses crossbeam work-stealing deques:
//! - Jobs pushed to the global injector
//! - Idle workers steal from each other
//!
//! Generation check allows dropping jobs queued for an image set that has
//! since been replaced (rapid date switching).

use crossbeam::deque::{Injector, Stealer, Worker};
use log::trace;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::generation::Generation;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size worker pool.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(4, generation.clone());
/// let g = generation.advance();
/// workers.execute_with_generation(g, move || {
///     let result = backend.image_set(&date);
///     tx.send(SessionEvent::ImageSet { generation: g, date, result }).ok();
/// });
/// ```
pub struct Workers {
    injector: Arc<Injector<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
    generation: Generation,
    shutdown: Arc<AtomicBool>,
}

impl Workers {
    /// Create pool with `num_threads` workers sharing `generation`.
    ///
    /// Recommended: `num_cpus::get() * 3 / 4` (leave room for the UI thread).
    pub fn new(num_threads: usize, generation: Generation) -> Self {
        let num_threads = num_threads.max(1);
        let injector: Arc<Injector<Job>> = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let locals: Vec<Worker<Job>> = (0..num_threads).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<Job>> = locals.iter().map(|w| w.stealer()).collect();
        let mut handles = Vec::with_capacity(num_threads);

        for (worker_id, local) in locals.into_iter().enumerate() {
            let injector = Arc::clone(&injector);
            let shutdown = Arc::clone(&shutdown);
            let stealers = stealers.clone();

            let spawned = thread::Builder::new()
                .name(format!("epic-worker-{}", worker_id))
                .spawn(move || {
                    trace!("Worker {} started", worker_id);
                    loop {
                        if let Some(job) = local.pop() {
                            job();
                            continue;
                        }

                        // Move a batch from the injector into our queue, run one
                        if let Some(job) = injector.steal_batch_and_pop(&local).success() {
                            job();
                            continue;
                        }

                        if let Some(job) = stealers.iter().find_map(|s| s.steal().success()) {
                            job();
                            continue;
                        }

                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }

                        thread::sleep(Duration::from_millis(1));
                    }
                    trace!("Worker {} stopped", worker_id);
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => log::error!("Failed to spawn worker thread {}: {}", worker_id, e),
            }
        }

        trace!("Workers initialized: {} threads", handles.len());

        Self {
            injector,
            handles,
            generation,
            shutdown,
        }
    }

    /// Number of live worker threads
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Shared generation counter
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Run closure on a worker thread.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector.push(Box::new(f));
    }

    /// Run closure only if `generation` is still current when a worker picks it up.
    ///
    /// The check happens at execution time, so a job queued just before a
    /// date switch is skipped without touching the network.
    pub fn execute_with_generation<F>(&self, generation: u64, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let counter = self.generation.clone();
        self.injector.push(Box::new(move || {
            if counter.is_current(generation) {
                f();
            } else {
                trace!("Skipping stale job (generation {} != {})", generation, counter.current());
            }
        }));
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        use std::time::Instant;

        let num_threads = self.handles.len();
        trace!("Workers shutting down ({} threads)...", num_threads);
        self.shutdown.store(true, Ordering::SeqCst);

        // Jobs may be blocked on a slow HTTP request; don't hang the UI on exit
        let deadline = Instant::now() + Duration::from_millis(500);
        for handle in std::mem::take(&mut self.handles) {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Shutdown timeout reached, exiting anyway");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
        trace!("All {} workers stopped", num_threads);
    }
}
