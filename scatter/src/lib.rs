//! Scatter runs one function against many shards at once.
//!
//! A function whose first argument is a shard alias is called once per configured shard. The
//! calls run on a bounded number of worker threads, and their results are returned as a single
//! list. The first failure is returned to the caller unchanged, as if the function had been
//! called directly.
//!
//! ```
//! use scatter::{Config, Shards};
//!
//! let config = Config::from_json_value(serde_json::json!({
//!     "shards": {"aliases": ["default", "replica"]},
//!     "executor": {"max_workers": 2},
//! }))
//! .unwrap();
//!
//! let shards = Shards::from_config(&config);
//! let mut tables = shards
//!     .dispatch(|alias, table: &str| Ok::<_, std::io::Error>(format!("{alias}.{table}")), "events")
//!     .unwrap();
//!
//! tables.sort();
//! assert_eq!(tables, ["default.events", "replica.events"]);
//! ```
//!
//! # Workspace Crates
//!
//! Scatter is split into the following workspace crates:
//!
//!  - `scatter`: Main entry point, shard registry and setup.
//!  - [`scatter-config`]: Static configuration for shards, the executor and logging.
//!  - [`scatter-log`]: Logging facade and setup.
//!  - [`scatter-threading`]: Bounded fan-out executor.
//!
//! [`scatter-config`]: ../scatter_config/index.html
//! [`scatter-log`]: ../scatter_log/index.html
//! [`scatter-threading`]: ../scatter_threading/index.html

#![warn(missing_docs)]

mod setup;
mod shards;

pub use self::setup::*;
pub use self::shards::*;

pub use scatter_config::{Config, ConfigError, ConfigErrorKind, OverridableConfig};
pub use scatter_threading::{
    ExecuteError, Executor, ExecutorBuilder, RunDescriptor, WorkQueue, WorkerOutcome, dispatch,
    execute,
};
