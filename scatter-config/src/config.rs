use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scatter_log::{Level, LogConfig};
use serde::{Deserialize, Serialize};

/// The alias of the shard used when no shards are configured.
pub const DEFAULT_SHARD: &str = "default";

/// The name of the configuration file inside the config folder.
const CONFIG_FILE: &str = "config.yml";

/// Defines the source of a config error
#[derive(Debug)]
enum ConfigErrorSource {
    /// An error occurring independently.
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field, either in the file or in an override.
    Field(&'static str),
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    source: ConfigErrorSource,
    kind: ConfigErrorKind,
    cause: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    #[inline]
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            source: ConfigErrorSource::None,
            kind,
            cause: None,
        }
    }

    #[inline]
    fn wrap<E>(cause: E, kind: ConfigErrorKind) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            cause: Some(Box::new(cause)),
            ..Self::new(kind)
        }
    }

    #[inline]
    fn for_field<E>(cause: E, field: &'static str) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap(cause, ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn file<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.source = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    #[inline]
    fn field(mut self, name: &'static str) -> Self {
        self.source = ConfigErrorSource::Field(name);
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ConfigErrorSource::None => write!(f, "{}", self.kind),
            ConfigErrorSource::File(file_name) => {
                write!(f, "{} (file {})", self.kind, file_name.display())
            }
            ConfigErrorSource::Field(name) => write!(f, "{} (field {})", self.kind, name),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Indicates config related errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Failed to save a file.
    #[error("could not write config file")]
    CouldNotWriteFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson,
    /// Invalid config value
    #[error("invalid config value")]
    InvalidValue,
    /// A shard alias is empty.
    #[error("shard alias must not be empty")]
    EmptyShardAlias,
    /// The same shard alias is listed more than once.
    #[error("duplicate shard alias")]
    DuplicateShardAlias,
}

/// Structure used to hold information about configuration overrides via
/// CLI parameters or environment variables
#[derive(Debug, Default)]
pub struct OverridableConfig {
    /// Comma separated list of shard aliases.
    pub shards: Option<String>,
    /// Maximum number of concurrent workers per run.
    pub max_workers: Option<String>,
    /// The log level for Scatter's crates.
    pub log_level: Option<String>,
}

impl OverridableConfig {
    /// Reads overrides from `SCATTER_SHARDS`, `SCATTER_MAX_WORKERS` and `SCATTER_LOG_LEVEL`.
    pub fn from_env() -> Self {
        Self {
            shards: env::var("SCATTER_SHARDS").ok(),
            max_workers: env::var("SCATTER_MAX_WORKERS").ok(),
            log_level: env::var("SCATTER_LOG_LEVEL").ok(),
        }
    }
}

fn default_aliases() -> Vec<String> {
    vec![DEFAULT_SHARD.to_owned()]
}

/// The registry of shards that functions are fanned out to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShardConfig {
    /// Aliases of all configured shards, in configuration order.
    pub aliases: Vec<String>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
        }
    }
}

/// Controls the fan-out executor.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of concurrent workers per run.
    ///
    /// Unset or `0` spawn one worker per shard.
    pub max_workers: Option<usize>,
    /// Name prefix for worker threads. Workers are named `{thread_name}-{index}`.
    pub thread_name: Option<String>,
    /// Stack size of worker threads in bytes.
    pub stack_size: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
struct ConfigValues {
    shards: ShardConfig,
    executor: ExecutorConfig,
    logging: LogConfig,
}

impl ConfigValues {
    /// Loads the config file from the given directory location.
    fn load(base: &Path) -> Result<Self, ConfigError> {
        let path = base.join(CONFIG_FILE);

        let f = fs::File::open(&path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(&path))?;

        serde_yaml::from_reader(io::BufReader::new(f))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(&path))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for alias in &self.shards.aliases {
            if alias.trim().is_empty() {
                return Err(
                    ConfigError::new(ConfigErrorKind::EmptyShardAlias).field("shards.aliases")
                );
            }

            if !seen.insert(alias.as_str()) {
                return Err(ConfigError::new(ConfigErrorKind::DuplicateShardAlias)
                    .field("shards.aliases"));
            }
        }

        Ok(())
    }
}

/// Config struct.
#[derive(Clone, Default)]
pub struct Config {
    values: ConfigValues,
    path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

impl Config {
    /// Loads a config from a given config folder.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = env::current_dir()
            .map(|x| x.join(path.as_ref()))
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        let values = ConfigValues::load(&path)?;
        values.validate()?;

        Ok(Config { values, path })
    }

    /// Creates a config from a JSON value.
    ///
    /// This is mostly useful for tests.
    pub fn from_json_value(value: serde_json::Value) -> Result<Config, ConfigError> {
        let values: ConfigValues = serde_json::from_value(value)
            .map_err(|err| ConfigError::wrap(err, ConfigErrorKind::BadJson))?;
        values.validate()?;

        Ok(Config {
            values,
            path: PathBuf::new(),
        })
    }

    /// Override configuration with values coming from other sources (e.g. env variables or
    /// command line parameters)
    pub fn apply_override(
        &mut self,
        overrides: OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        let mut values = self.values.clone();

        if let Some(shards) = overrides.shards {
            values.shards.aliases = shards
                .split(',')
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Some(max_workers) = overrides.max_workers {
            let max_workers = max_workers
                .trim()
                .parse::<usize>()
                .map_err(|err| ConfigError::for_field(err, "max_workers"))?;
            values.executor.max_workers = Some(max_workers);
        }

        if let Some(log_level) = overrides.log_level {
            values.logging.level = log_level
                .parse::<Level>()
                .map_err(|err| ConfigError::for_field(err, "log_level"))?;
        }

        // Overrides are applied all at once or not at all.
        values.validate()?;
        self.values = values;

        Ok(self)
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.values)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// Returns the filename of the config folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the shard registry.
    pub fn shards(&self) -> &ShardConfig {
        &self.values.shards
    }

    /// Returns the aliases of all configured shards.
    pub fn shard_aliases(&self) -> &[String] {
        &self.values.shards.aliases
    }

    /// Returns the executor configuration.
    pub fn executor(&self) -> &ExecutorConfig {
        &self.values.executor
    }

    /// Returns the maximum number of concurrent workers, or `None` if there is no limit.
    pub fn max_workers(&self) -> Option<usize> {
        self.values.executor.max_workers.filter(|&max| max > 0)
    }

    /// Returns the name prefix for worker threads.
    pub fn thread_name(&self) -> Option<&str> {
        self.values.executor.thread_name.as_deref()
    }

    /// Returns the stack size of worker threads in bytes.
    pub fn stack_size(&self) -> Option<usize> {
        self.values.executor.stack_size
    }

    /// Returns logging configuration.
    pub fn logging(&self) -> &LogConfig {
        &self.values.logging
    }
}
