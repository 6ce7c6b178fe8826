use std::error::Error;
use std::fmt;
use std::io;
use std::panic;
use std::thread::{self, Scope, ScopedJoinHandle};

use parking_lot::Mutex;

use crate::builder::{ExecutorBuilder, ThreadName};
use crate::queue::WorkQueue;

/// Describes the shape of a single run before any worker is started.
///
/// The worker count is resolved once from the queue length and the requested cap and never
/// changes during the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunDescriptor {
    queue_len: usize,
    max_workers: Option<usize>,
    worker_count: usize,
}

impl RunDescriptor {
    /// Resolves the number of workers for a queue of `queue_len` items.
    ///
    /// Without a cap, every item gets its own worker. With a cap of `k`, `min(queue_len, k)`
    /// workers are used. A cap of zero counts as no cap.
    pub fn new(queue_len: usize, max_workers: Option<usize>) -> Self {
        let worker_count = match max_workers {
            Some(max) if max > 0 => queue_len.min(max),
            _ => queue_len,
        };

        Self {
            queue_len,
            max_workers,
            worker_count,
        }
    }

    /// Returns the number of items in the queue when the run was described.
    pub fn queue_len(&self) -> usize {
        self.queue_len
    }

    /// Returns the requested upper bound of workers.
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Returns the number of workers that will be spawned.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

/// The state a worker reports back to the coordinator once it has finished.
#[derive(Debug, PartialEq, Eq)]
pub enum WorkerOutcome<E> {
    /// The worker drained the queue without a failure.
    Completed {
        /// Number of items this worker processed successfully.
        processed: usize,
    },
    /// The worker stopped at the first error returned by the function.
    Failed(E),
}

/// Error returned by [`Executor::execute`] and [`Executor::dispatch`].
#[derive(Debug)]
pub enum ExecuteError<E> {
    /// The operating system refused to create a worker thread.
    Spawn(io::Error),
    /// The executed function returned an error.
    ///
    /// The error is passed through unchanged: it displays and chains exactly like the inner
    /// error.
    Worker(E),
}

impl<E> ExecuteError<E> {
    /// Returns the error of the executed function, if this is a worker failure.
    pub fn worker_error(&self) -> Option<&E> {
        match self {
            Self::Worker(error) => Some(error),
            Self::Spawn(_) => None,
        }
    }

    /// Converts into the error of the executed function, if this is a worker failure.
    pub fn into_worker_error(self) -> Option<E> {
        match self {
            Self::Worker(error) => Some(error),
            Self::Spawn(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for ExecuteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(_) => f.write_str("failed to spawn worker thread"),
            Self::Worker(error) => error.fmt(f),
        }
    }
}

impl<E: Error + 'static> Error for ExecuteError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(error) => Some(error),
            Self::Worker(error) => error.source(),
        }
    }
}

/// A single worker of a run.
///
/// The worker takes items from the shared queue until it is empty, or until the function fails.
struct Worker<'a, A, F, R> {
    index: usize,
    queue: &'a WorkQueue<A>,
    function: &'a F,
    results: &'a Mutex<Vec<R>>,
}

impl<A, F, R> Worker<'_, A, F, R> {
    fn run<E>(self) -> WorkerOutcome<E>
    where
        F: Fn(A) -> Result<R, E>,
    {
        let mut processed = 0;

        while let Some(item) = self.queue.try_take() {
            match (self.function)(item) {
                Ok(result) => {
                    self.results.lock().push(result);
                    processed += 1;
                }
                Err(error) => return WorkerOutcome::Failed(error),
            }
        }

        scatter_log::trace!("worker {} completed {processed} items", self.index);
        WorkerOutcome::Completed { processed }
    }
}

/// Runs one function over a queue of work items on a bounded number of threads.
///
/// Every call to [`execute`](Self::execute) is a self-contained run: workers are spawned for the
/// run, drain the queue and are joined before the call returns. No threads are kept between runs.
pub struct Executor {
    thread_name: Option<Box<ThreadName>>,
    stack_size: Option<usize>,
    max_workers: Option<usize>,
}

impl Executor {
    /// Constructs a new [`Executor`] using the configuration specified by [`ExecutorBuilder`].
    pub fn new(builder: ExecutorBuilder) -> Self {
        Self {
            thread_name: builder.thread_name,
            stack_size: builder.stack_size,
            max_workers: builder.max_workers,
        }
    }

    /// Returns the configured upper bound of concurrent workers.
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Describes a run of this executor over the given queue.
    pub fn describe<A>(&self, queue: &WorkQueue<A>) -> RunDescriptor {
        RunDescriptor::new(queue.len(), self.max_workers)
    }

    /// Calls `function` once for every item in `queue` and returns all results.
    ///
    /// The order of the results is unspecified. An empty queue returns an empty list without
    /// spawning any thread.
    ///
    /// `function` is called concurrently from multiple threads. If it touches shared state, it
    /// must synchronize access itself.
    ///
    /// # Errors
    ///
    /// A worker stops at the first error returned by `function` and does not take any further
    /// items. Other workers keep running until the queue is empty or they fail themselves. All
    /// workers are joined before this method returns. Workers are inspected in the order they were
    /// started, and the error of the first failed worker is returned as
    /// [`ExecuteError::Worker`]. Results of successful calls are discarded in that case, and
    /// items still in the queue are left there.
    ///
    /// # Panics
    ///
    /// A panic inside `function` is resumed on the calling thread after all workers have been
    /// joined, subject to the same start order as errors.
    pub fn execute<A, R, E, F>(
        &mut self,
        function: F,
        queue: &WorkQueue<A>,
    ) -> Result<Vec<R>, ExecuteError<E>>
    where
        A: Send,
        R: Send,
        E: Send,
        F: Fn(A) -> Result<R, E> + Sync,
    {
        let run = self.describe(queue);
        if run.worker_count() == 0 {
            return Ok(Vec::new());
        }

        scatter_log::debug!(
            "executing {} work items on {} workers",
            run.queue_len(),
            run.worker_count()
        );

        let results = Mutex::new(Vec::with_capacity(run.queue_len()));

        let (outcomes, spawn_error) = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(run.worker_count());
            let mut spawn_error = None;

            for index in 0..run.worker_count() {
                let worker = Worker {
                    index,
                    queue,
                    function: &function,
                    results: &results,
                };

                match self.spawn(scope, index, move || worker.run()) {
                    Ok(handle) => handles.push(handle),
                    Err(error) => {
                        spawn_error = Some(error);
                        break;
                    }
                }
            }

            let outcomes: Vec<_> = handles.into_iter().map(ScopedJoinHandle::join).collect();
            (outcomes, spawn_error)
        });

        for outcome in outcomes {
            match outcome {
                Ok(WorkerOutcome::Completed { .. }) => {}
                Ok(WorkerOutcome::Failed(error)) => return Err(ExecuteError::Worker(error)),
                Err(payload) => panic::resume_unwind(payload),
            }
        }

        if let Some(error) = spawn_error {
            return Err(ExecuteError::Spawn(error));
        }

        Ok(results.into_inner())
    }

    fn spawn<'scope, T, F>(
        &mut self,
        scope: &'scope Scope<'scope, '_>,
        index: usize,
        f: F,
    ) -> io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let mut b = thread::Builder::new();
        if let Some(name) = self.thread_name.as_mut().map(|thread_name| thread_name(index)) {
            b = b.name(name);
        }
        if let Some(stack_size) = self.stack_size {
            b = b.stack_size(stack_size);
        }
        b.spawn_scoped(scope, f)
    }
}

impl Default for Executor {
    fn default() -> Self {
        ExecutorBuilder::new().build()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("stack_size", &self.stack_size)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

/// Calls `function` once for every item in `queue` on at most `max_workers` threads.
///
/// This is a shorthand for an [`Executor`] with default thread settings. See
/// [`Executor::execute`] for details.
pub fn execute<A, R, E, F>(
    function: F,
    queue: &WorkQueue<A>,
    max_workers: Option<usize>,
) -> Result<Vec<R>, ExecuteError<E>>
where
    A: Send,
    R: Send,
    E: Send,
    F: Fn(A) -> Result<R, E> + Sync,
{
    ExecutorBuilder::new()
        .max_workers(max_workers)
        .build()
        .execute(function, queue)
}
