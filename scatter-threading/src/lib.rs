//! # Scatter Threading
//!
//! This crate provides a bounded fan-out executor that runs one function over a fixed set of
//! independent work items on a capped number of worker threads and returns the aggregated
//! results. It offers:
//!
//! - **Bounded Concurrency**: The number of workers per run is limited by a configurable cap and
//!   never exceeds the number of work items.
//! - **Resource Fan-Out**: [`Executor::dispatch`] calls a function once per resource identifier,
//!   such as a shard alias, running trivial cases on the calling thread.
//! - **Error Propagation**: The first failure of a worker is returned to the caller unchanged,
//!   as if the function had been called directly.
//! - **Flexible Configuration**: Thread names, stack sizes and worker limits are configured
//!   through a builder.
//!
//! ## Concurrency Model
//!
//! Every run works on a [`WorkQueue`] that is fully populated before the first worker starts.
//! Workers take items from the queue without blocking and stop as soon as it is empty, so there
//! is no polling and no waiting for more work. Results are collected in a single
//! mutex-protected list, which is why their order carries no meaning.
//!
//! Workers are scoped threads. All workers of a run are joined before the run returns, even when
//! one of them failed early. There is no timeout or cancellation: a function that blocks forever
//! blocks the run forever.
//!
//! ## Usage Example
//!
//! ```rust
//! use scatter_threading::{ExecutorBuilder, WorkQueue};
//!
//! // Build an executor that uses at most 4 threads per run.
//! let mut executor = ExecutorBuilder::new()
//!     .max_workers(4)
//!     .thread_name(|index| format!("fanout-{index}"))
//!     .build();
//!
//! let queue = WorkQueue::new((1..=10).map(|i| (i, 2)));
//! let results = executor
//!     .execute(|(a, b): (u32, u32)| Ok::<_, std::io::Error>(a * b), &queue)
//!     .expect("no work item fails");
//!
//! assert_eq!(results.iter().sum::<u32>(), 110);
//! ```
//!
//! ## Error Handling
//!
//! A worker stops at the first error returned by the function and leaves the remaining items to
//! other workers. After all workers have been joined, the error of the first failed worker in
//! start order is returned as [`ExecuteError::Worker`]. Panics are resumed on the calling thread
//! in the same order.

mod builder;
mod dispatch;
mod pool;
mod queue;

pub use self::builder::*;
pub use self::dispatch::*;
pub use self::pool::*;
pub use self::queue::*;
