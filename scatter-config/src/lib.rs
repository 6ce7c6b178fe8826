//! Configuration for Scatter.
//!
//! Scatter reads its static configuration from a folder containing a `config.yml` file. The file
//! lists the shards that functions are fanned out to, the limits of the executor, and logging
//! settings:
//!
//! ```yaml
//! shards:
//!   aliases: [default, replica]
//! executor:
//!   max_workers: 4
//!   thread_name: shard
//! logging:
//!   level: info
//! ```
//!
//! Every section and field is optional. Values can be overridden from the environment or the
//! command line through [`OverridableConfig`].

#![warn(missing_docs)]

mod config;

pub use self::config::*;
