use scatter_config::Config;
use scatter_threading::{ExecuteError, Executor, ExecutorBuilder};

/// The registry of shards that functions are fanned out to.
///
/// Shards are identified by their alias. The registry also carries the executor settings from the
/// configuration, so every fan-out through it honors the configured worker limit.
#[derive(Clone, Debug, Default)]
pub struct Shards {
    aliases: Vec<String>,
    max_workers: Option<usize>,
    thread_name: Option<String>,
    stack_size: Option<usize>,
}

impl Shards {
    /// Creates a registry of the given shard aliases without a worker limit.
    pub fn new<I>(aliases: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates the registry from the shards and executor settings of a config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            aliases: config.shard_aliases().to_vec(),
            max_workers: config.max_workers(),
            thread_name: config.thread_name().map(str::to_owned),
            stack_size: config.stack_size(),
        }
    }

    /// Sets the maximum number of concurrent workers per fan-out.
    pub fn with_max_workers(mut self, max_workers: impl Into<Option<usize>>) -> Self {
        self.max_workers = max_workers.into();
        self
    }

    /// Returns the aliases of all shards, in configuration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the number of shards.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` if there are no shards.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Returns `true` if a shard with the given alias is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }

    /// Returns the maximum number of concurrent workers per fan-out.
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Builds an [`Executor`] with the settings of this registry.
    ///
    /// If a thread name is configured, workers are named `{thread_name}-{index}`.
    pub fn executor(&self) -> Executor {
        let mut builder = ExecutorBuilder::new().max_workers(self.max_workers);

        if let Some(prefix) = self.thread_name.clone() {
            builder = builder.thread_name(move |index| format!("{prefix}-{index}"));
        }
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        builder.build()
    }

    /// Calls `function` once for every shard and returns all results in unspecified order.
    ///
    /// See [`Executor::dispatch`] for how calls are distributed and how errors are reported.
    pub fn dispatch<S, R, E, F>(&self, function: F, args: &S) -> Result<Vec<R>, ExecuteError<E>>
    where
        S: Sync + ?Sized,
        R: Send,
        E: Send,
        F: Fn(&str, &S) -> Result<R, E> + Sync,
    {
        self.dispatch_using(&self.aliases, function, args)
    }

    /// Calls `function` once for every alias in `using`.
    ///
    /// The aliases are passed to `function` as they are, whether or not they are registered in
    /// this registry.
    pub fn dispatch_using<I, S, R, E, F>(
        &self,
        using: I,
        function: F,
        args: &S,
    ) -> Result<Vec<R>, ExecuteError<E>>
    where
        I: IntoIterator,
        I::Item: AsRef<str> + Send,
        S: Sync + ?Sized,
        R: Send,
        E: Send,
        F: Fn(&str, &S) -> Result<R, E> + Sync,
    {
        scatter_log::trace!("fanning out to shards");

        self.executor().dispatch(
            |alias: I::Item, args: &S| function(alias.as_ref(), args),
            using,
            args,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fmt;
    use std::thread;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct QueryError(String);

    impl fmt::Display for QueryError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query failed on {}", self.0)
        }
    }

    impl std::error::Error for QueryError {}

    fn config(value: serde_json::Value) -> Config {
        Config::from_json_value(value).unwrap()
    }

    #[test]
    fn test_from_config() {
        let shards = Shards::from_config(&config(json!({
            "shards": {"aliases": ["default", "replica"]},
            "executor": {"max_workers": 0},
        })));

        assert_eq!(shards.aliases(), ["default", "replica"]);
        assert_eq!(shards.len(), 2);
        assert!(shards.contains("replica"));
        assert!(!shards.contains("archive"));
        assert_eq!(shards.max_workers(), None);
    }

    #[test]
    fn test_dispatch_all_shards() {
        scatter_log::init_test!();

        let shards = Shards::new(["s1", "s2", "s3"]);
        let mut results = shards
            .dispatch(
                |alias, table: &str| Ok::<_, QueryError>(format!("SELECT * FROM {alias}.{table}")),
                "events",
            )
            .unwrap();

        results.sort();
        similar_asserts::assert_eq!(
            results,
            vec![
                "SELECT * FROM s1.events".to_owned(),
                "SELECT * FROM s2.events".to_owned(),
                "SELECT * FROM s3.events".to_owned(),
            ]
        );
    }

    #[test]
    fn test_dispatch_names_worker_threads() {
        let shards = Shards::from_config(&config(json!({
            "shards": {"aliases": ["a", "b", "c", "d"]},
            "executor": {"max_workers": 2, "thread_name": "shard"},
        })));

        let names = Mutex::new(BTreeSet::new());
        shards
            .dispatch(
                |_, _: &()| {
                    let name = thread::current().name().unwrap_or_default().to_owned();
                    names.lock().insert(name);
                    Ok::<_, QueryError>(())
                },
                &(),
            )
            .unwrap();

        let names = names.into_inner();
        assert!(!names.is_empty());
        let expected = BTreeSet::from(["shard-0".to_owned(), "shard-1".to_owned()]);
        assert!(names.is_subset(&expected));
    }

    #[test]
    fn test_dispatch_using_subset() {
        let shards = Shards::new(["default", "replica", "archive"]);
        let visited = Mutex::new(Vec::new());

        shards
            .dispatch_using(
                ["replica", "archive"],
                |alias, _: &()| {
                    visited.lock().push(alias.to_owned());
                    Ok::<_, QueryError>(())
                },
                &(),
            )
            .unwrap();

        let mut visited = visited.into_inner();
        visited.sort();
        assert_eq!(visited, ["archive", "replica"]);
    }

    #[test]
    fn test_dispatch_single_shard_runs_inline() {
        let shards = Shards::new(["default"]);
        let caller = thread::current().id();

        let results = shards
            .dispatch(|_, _: &()| Ok::<_, QueryError>(thread::current().id()), &())
            .unwrap();

        assert_eq!(results, [caller]);
    }

    #[test]
    fn test_dispatch_error() {
        let shards = Shards::new(["default", "replica"]).with_max_workers(1);

        let error = shards
            .dispatch(
                |alias, _: &()| match alias {
                    "replica" => Err(QueryError(alias.to_owned())),
                    _ => Ok(()),
                },
                &(),
            )
            .unwrap_err();

        assert_eq!(error.to_string(), "query failed on replica");
        assert_eq!(
            error.into_worker_error(),
            Some(QueryError("replica".to_owned()))
        );
    }

    #[test]
    fn test_dispatch_without_shards() {
        let shards = Shards::new(Vec::<String>::new());
        assert!(shards.is_empty());

        let results = shards
            .dispatch(
                |_, _: &()| -> Result<(), QueryError> { panic!("must not be called") },
                &(),
            )
            .unwrap();

        assert!(results.is_empty());
    }
}
