use crate::builder::ExecutorBuilder;
use crate::pool::{ExecuteError, Executor};
use crate::queue::WorkQueue;

impl Executor {
    /// Calls `function` once per resource and returns all results in unspecified order.
    ///
    /// `function` receives the resource identifier, such as a shard alias, as its first argument
    /// and a reference to the shared `args` as its second. `resources` is consumed exactly once.
    ///
    ///  - Without resources, `function` is never called and the result is empty.
    ///  - With a single resource, `function` is called synchronously on the current thread.
    ///  - Otherwise, one work item per resource is executed via [`Executor::execute`], honoring
    ///    the configured worker limit.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed call for a single resource, or the first worker error as
    /// described in [`Executor::execute`].
    ///
    /// # Example
    ///
    /// ```
    /// use scatter_threading::ExecutorBuilder;
    ///
    /// let mut executor = ExecutorBuilder::new().max_workers(2).build();
    ///
    /// let mut sizes = executor
    ///     .dispatch(
    ///         |alias: &str, suffix: &str| Ok::<_, std::io::Error>(format!("{alias}{suffix}").len()),
    ///         ["default", "replica", "eu"],
    ///         "_events",
    ///     )
    ///     .unwrap();
    ///
    /// sizes.sort();
    /// assert_eq!(sizes, [9, 14, 14]);
    /// ```
    pub fn dispatch<Res, S, R, E, F, I>(
        &mut self,
        function: F,
        resources: I,
        args: &S,
    ) -> Result<Vec<R>, ExecuteError<E>>
    where
        I: IntoIterator<Item = Res>,
        Res: Send,
        S: Sync + ?Sized,
        R: Send,
        E: Send,
        F: Fn(Res, &S) -> Result<R, E> + Sync,
    {
        let resources: Vec<Res> = resources.into_iter().collect();

        if resources.len() <= 1 {
            return resources
                .into_iter()
                .map(|resource| function(resource, args))
                .collect::<Result<Vec<_>, _>>()
                .map_err(ExecuteError::Worker);
        }

        let queue = WorkQueue::new(resources.into_iter().map(|resource| (resource, args)));
        self.execute(|(resource, args)| function(resource, args), &queue)
    }
}

/// Calls `function` once per resource on at most `max_workers` threads.
///
/// This is a shorthand for an [`Executor`] with default thread settings. See
/// [`Executor::dispatch`] for details.
pub fn dispatch<Res, S, R, E, F, I>(
    function: F,
    resources: I,
    args: &S,
    max_workers: Option<usize>,
) -> Result<Vec<R>, ExecuteError<E>>
where
    I: IntoIterator<Item = Res>,
    Res: Send,
    S: Sync + ?Sized,
    R: Send,
    E: Send,
    F: Fn(Res, &S) -> Result<R, E> + Sync,
{
    ExecutorBuilder::new()
        .max_workers(max_workers)
        .build()
        .dispatch(function, resources, args)
}
