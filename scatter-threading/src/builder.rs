use crate::pool::Executor;

/// Type alias for the closure used to name worker threads.
pub(crate) type ThreadName = dyn FnMut(usize) -> String;

/// [`ExecutorBuilder`] provides a flexible way to configure and build an [`Executor`] that fans
/// work items out to worker threads.
///
/// This builder enables you to cap the number of concurrent workers and to customize how worker
/// threads are created.
pub struct ExecutorBuilder {
    pub(crate) thread_name: Option<Box<ThreadName>>,
    pub(crate) stack_size: Option<usize>,
    pub(crate) max_workers: Option<usize>,
}

impl ExecutorBuilder {
    /// Initializes a new [`ExecutorBuilder`] with default settings.
    ///
    /// By default, there is no limit on the number of workers: every run spawns one worker per
    /// work item. Threads are created with the system defaults for names and stack size.
    pub fn new() -> Self {
        Self {
            thread_name: None,
            stack_size: None,
            max_workers: None,
        }
    }

    /// Specifies a custom naming convention for worker threads.
    ///
    /// The provided closure receives the worker's index within a run and returns a name. It is
    /// invoked exactly once for every worker thread that is spawned.
    pub fn thread_name<F>(mut self, thread_name: F) -> Self
    where
        F: FnMut(usize) -> String + 'static,
    {
        self.thread_name = Some(Box::new(thread_name));
        self
    }

    /// Sets the stack size in bytes for worker threads.
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Sets the upper bound of concurrent workers per run.
    ///
    /// `None` or `Some(0)` remove the limit, which spawns one worker per work item.
    pub fn max_workers(mut self, max_workers: impl Into<Option<usize>>) -> Self {
        self.max_workers = max_workers.into();
        self
    }

    /// Constructs an [`Executor`] based on the configured settings.
    pub fn build(self) -> Executor {
        Executor::new(self)
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
