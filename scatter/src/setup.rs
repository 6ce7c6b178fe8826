use scatter_config::Config;

/// Initializes logging from the logging section of the config.
pub fn init(config: &Config) {
    scatter_log::init(config.logging());
}

/// Print the loaded shard registry and executor limits to the log.
pub fn dump_config_infos(config: &Config) {
    if config.path().as_os_str().is_empty() {
        scatter_log::info!("running scatter without config folder");
    } else {
        scatter_log::info!(
            "running scatter from config folder {}",
            config.path().display()
        );
    }

    scatter_log::info!("  shards: {}", config.shard_aliases().join(", "));

    match config.max_workers() {
        Some(max_workers) => scatter_log::info!("  max workers: {max_workers}"),
        None => scatter_log::info!("  max workers: one per shard"),
    }

    if let Some(thread_name) = config.thread_name() {
        scatter_log::debug!("  worker thread name: {thread_name}");
    }
    if let Some(stack_size) = config.stack_size() {
        scatter_log::debug!("  worker stack size: {stack_size}");
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .finish();

        {
            let _guard = subscriber.set_default();
            f();
        }

        String::from_utf8_lossy(&capture.0.lock()).into_owned()
    }

    #[test]
    fn test_dump_config_infos() {
        let config = Config::from_json_value(json!({
            "shards": {"aliases": ["default", "replica"]},
            "executor": {"max_workers": 2, "thread_name": "shard", "stack_size": 65536},
        }))
        .unwrap();

        let logs = capture_logs(|| dump_config_infos(&config));
        assert!(logs.contains("running scatter without config folder"));
        assert!(logs.contains("shards: default, replica"));
        assert!(logs.contains("max workers: 2"));
        assert!(logs.contains("worker thread name: shard"));
        assert!(logs.contains("worker stack size: 65536"));
    }

    #[test]
    fn test_dump_config_infos_defaults() {
        let logs = capture_logs(|| dump_config_infos(&Config::default()));
        assert!(logs.contains("shards: default"));
        assert!(logs.contains("max workers: one per shard"));
        assert!(!logs.contains("worker thread name"));
        assert!(!logs.contains("worker stack size"));
    }
}
